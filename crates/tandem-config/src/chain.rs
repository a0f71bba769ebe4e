//! Building a live chain from a configuration, and capturing one back.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tandem_config::{ChainConfig, UnitConfig, build_chain};
//! use tandem_registry::UnitCatalog;
//!
//! let config = ChainConfig::default()
//!     .with_unit(UnitConfig::new("builtin:gain").with_param("gain_db", -6.0))
//!     .with_unit(UnitConfig::new("builtin:echo").with_bypass(true));
//!
//! let chain = build_chain(&config, Arc::new(UnitCatalog::with_builtins())).unwrap();
//! assert_eq!(chain.to_string(), "Gain > <bypassed>");
//! assert_eq!(chain.get_parameter_value(0, 0), -6.0);
//! ```

use std::sync::Arc;

use tandem_chain::{ProcessorChain, UnitProcessor};
use tandem_registry::UnitSource;

use crate::chain_config::{ChainConfig, UnitConfig};
use crate::error::ConfigError;

/// Create a chain with `config`'s settings and load its units in order.
///
/// Host flags and channel counts are applied before any unit loads, so every
/// unit is negotiated and warmed up once against the final settings.
///
/// # Errors
///
/// Fails on the first unit that cannot be loaded or whose parameters do not
/// match its descriptors. Units are not rolled back; the partially built
/// chain is dropped.
pub fn build_chain(config: &ChainConfig, source: Arc<dyn UnitSource>) -> Result<ProcessorChain, ConfigError> {
    config.validate()?;

    let chain = ProcessorChain::with_layout(source, config.channels_in == 0);
    chain.set_id_scheme(config.id_scheme);
    chain.set_double_precision(config.double_precision);
    chain.set_slow_block_threshold(config.slow_block_threshold());
    if !chain.update_channels(config.channels_in, config.channels_out) {
        return Err(ConfigError::channel_layout(config.channels_in, config.channels_out));
    }
    chain.prepare_to_play(f64::from(config.sample_rate), config.block_size);

    for (index, unit) in config.units.iter().enumerate() {
        chain
            .add_plugin_processor(&unit.id)
            .map_err(|source| ConfigError::Unit { index, source })?;
        let Some(processor) = chain.get_processor(index) else {
            continue;
        };
        apply_params(&processor, unit)?;
        if unit.bypassed {
            chain.set_suspended(index, true);
        }
    }

    tracing::info!("built chain: {chain}");
    Ok(chain)
}

fn apply_params(processor: &UnitProcessor, unit: &UnitConfig) -> Result<(), ConfigError> {
    for (key, &value) in &unit.params {
        let index = processor
            .param_index(key)
            .ok_or_else(|| ConfigError::invalid_parameter(&unit.id, key, "unknown parameter"))?;
        if let Some(info) = processor.param_info(index)
            && !(info.min..=info.max).contains(&value)
        {
            return Err(ConfigError::invalid_parameter(
                &unit.id,
                key,
                format!("{value} out of range [{}, {}]", info.min, info.max),
            ));
        }
        processor.set_param(index, value);
    }
    Ok(())
}

/// Capture a live chain's settings, units, bypass flags and described
/// parameters.
pub fn capture_chain(chain: &ProcessorChain) -> ChainConfig {
    let shared = chain.shared();
    let layout = chain.layout();
    let units = (0..chain.len())
        .filter_map(|i| chain.get_processor(i))
        .map(|processor| {
            let params = (0..processor.param_count())
                .filter_map(|i| {
                    let info = processor.param_info(i)?;
                    Some((info.key.to_owned(), processor.get_param(i)?))
                })
                .collect();
            UnitConfig {
                id: processor.id().to_owned(),
                bypassed: processor.is_suspended(),
                params,
            }
        })
        .collect();

    ChainConfig {
        sample_rate: shared.sample_rate().round() as u32,
        block_size: shared.block_size(),
        channels_in: layout.main_input_channels(),
        channels_out: layout.main_output_channels(),
        double_precision: shared.double_precision(),
        id_scheme: shared.id_scheme(),
        slow_block_ms: shared.slow_block_threshold().as_secs_f64() * 1000.0,
        units,
    }
}
