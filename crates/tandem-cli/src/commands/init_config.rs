//! Write a starter chain configuration.

use std::path::PathBuf;

use clap::Args;
use tandem_config::{ChainConfig, UnitConfig, default_config_path};

#[derive(Args)]
pub struct InitConfigArgs {
    /// Destination (defaults to the user config directory)
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

/// The configuration written by `tandem init-config`.
pub fn starter_config() -> ChainConfig {
    ChainConfig::default()
        .with_unit(UnitConfig::new("builtin:gain").with_param("gain_db", -3.0))
        .with_unit(UnitConfig::new("builtin:lookahead"))
        .with_unit(UnitConfig::new("builtin:echo").with_bypass(true))
}

pub fn run(args: InitConfigArgs) -> anyhow::Result<()> {
    let path = args.path.unwrap_or_else(default_config_path);
    if path.exists() && !args.force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    starter_config().save(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
