//! Unit listing and information command.

use clap::Args;
use tandem_config::IdScheme;
use tandem_core::ProcessingUnit;
use tandem_registry::{UnitCatalog, UnitSource};

use super::common::SchemeArg;

#[derive(Args)]
pub struct UnitsArgs {
    /// Show parameters for one unit (id, identifier, or file)
    #[arg(value_name = "UNIT")]
    unit: Option<String>,

    /// One JSON object per line instead of a table
    #[arg(long)]
    json: bool,

    /// Id scheme used for listed ids and lookups
    #[arg(long, value_enum, default_value = "native")]
    id_scheme: SchemeArg,
}

pub fn run(args: UnitsArgs) -> anyhow::Result<()> {
    let catalog = UnitCatalog::with_builtins();
    let scheme = IdScheme::from(args.id_scheme);

    if let Some(id) = &args.unit {
        return show_unit(&catalog, id, scheme);
    }

    if args.json {
        for desc in catalog.iter() {
            print!("{}", desc.to_json_line(scheme));
        }
        return Ok(());
    }

    println!("Available Units");
    println!("===============");
    println!();
    println!("  {:32}  {:12}  {:10}  {}", "Id", "Name", "Category", "File");
    println!("  {:32}  {:12}  {:10}  {}", "--", "----", "--------", "----");
    for desc in catalog.iter() {
        println!(
            "  {:32}  {:12}  {:10}  {}",
            desc.plugin_id(scheme),
            desc.name,
            desc.category,
            desc.file_or_identifier
        );
    }
    println!();
    println!("{} unit(s)", catalog.len());
    Ok(())
}

fn show_unit(catalog: &UnitCatalog, id: &str, scheme: IdScheme) -> anyhow::Result<()> {
    let desc = catalog
        .find_descriptor(id, scheme)
        .ok_or_else(|| anyhow::anyhow!("Unknown unit: {id}"))?;
    let unit = catalog
        .instantiate(&desc, 48000.0, 512)
        .map_err(|e| anyhow::anyhow!("failed loading unit {}: {e}", desc.file_or_identifier))?;

    println!("{}", desc.name);
    println!("{}", "=".repeat(desc.name.len()));
    println!();
    println!("Id:         {}", desc.plugin_id(scheme));
    println!("Identifier: {}", desc.identifier_string());
    println!("File:       {}", desc.file_or_identifier);
    println!("Latency:    {} samples at 48 kHz", unit.latency_samples());
    println!("Tail:       {:.3} s", unit.tail_seconds());
    println!(
        "Precision:  {}",
        if unit.supports_double_precision() {
            "f32, f64"
        } else {
            "f32"
        }
    );
    println!();
    println!("Preferred layout:");
    print!("{}", unit.buses_layout());
    println!();

    println!("Parameters:");
    println!();
    for index in 0..unit.param_count() {
        match unit.param_info(index) {
            Some(info) => println!("  {:14}  {info}", info.key),
            None => println!("  #{index}"),
        }
    }
    Ok(())
}
