//! Shared CLI helpers used across multiple commands.

use std::sync::Arc;

use clap::ValueEnum;
use tandem_config::IdScheme;
use tandem_registry::{LoaderThread, UnitCatalog, UnitSource};

/// Id scheme as a command-line value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SchemeArg {
    /// `format-name-uid`
    Native,
    /// `format-name-filehash-uid`
    Identifier,
}

impl From<SchemeArg> for IdScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Native => IdScheme::Native,
            SchemeArg::Identifier => IdScheme::Identifier,
        }
    }
}

/// A parameter override: `UNIT:KEY=VALUE`, with `UNIT` a zero-based index.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamArg {
    pub unit: usize,
    pub key: String,
    pub value: f32,
}

/// Parse a `UNIT:KEY=VALUE` string for clap's `value_parser`.
pub fn parse_param(s: &str) -> Result<ParamArg, String> {
    let invalid = || format!("Invalid parameter format: '{s}' (expected UNIT:KEY=VALUE)");
    let (target, value) = s.split_once('=').ok_or_else(invalid)?;
    let (unit, key) = target.split_once(':').ok_or_else(invalid)?;
    let unit = unit
        .parse()
        .map_err(|_| format!("Invalid unit index '{unit}' in '{s}'"))?;
    let value = value
        .parse()
        .map_err(|_| format!("Invalid value '{value}' in '{s}'"))?;
    if key.is_empty() {
        return Err(invalid());
    }
    Ok(ParamArg {
        unit,
        key: key.to_owned(),
        value,
    })
}

/// Split a leading `!` (load bypassed) from a unit id.
pub fn parse_unit(spec: &str) -> (&str, bool) {
    match spec.strip_prefix('!') {
        Some(id) => (id, true),
        None => (spec, false),
    }
}

/// The built-in catalog, optionally served from a dedicated loader thread.
pub fn unit_source(loader_thread: bool) -> anyhow::Result<Arc<dyn UnitSource>> {
    let catalog: Arc<dyn UnitSource> = Arc::new(UnitCatalog::with_builtins());
    if loader_thread {
        let loader = LoaderThread::spawn(catalog)?;
        tracing::debug!("instantiating units on the loader thread");
        Ok(Arc::new(loader))
    } else {
        Ok(catalog)
    }
}
