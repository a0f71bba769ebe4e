//! Tandem CLI - list units and render configured chains offline.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tandem")]
#[command(author, version, about = "Tandem processing chain CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available units, or show one unit's parameters
    Units(commands::units::UnitsArgs),

    /// Build a chain and render a test tone through it
    Render(commands::render::RenderArgs),

    /// Write a starter chain configuration
    InitConfig(commands::init_config::InitConfigArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so listings on stdout stay machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Units(args) => commands::units::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::InitConfig(args) => commands::init_config::run(args),
    }
}
