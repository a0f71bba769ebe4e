//! Structural validation of chain configurations.
//!
//! Checks that do not need a unit catalog: render settings in range, channel
//! counts the chain can express, non-empty unit ids and finite parameter
//! values. Parameter ranges are checked against unit descriptors when the
//! chain is built.
//!
//! # Example
//!
//! ```rust
//! use tandem_config::{ChainConfig, validate_config};
//!
//! let mut config = ChainConfig::default();
//! assert!(validate_config(&config).is_ok());
//!
//! config.block_size = 0;
//! assert!(validate_config(&config).is_err());
//! ```

use thiserror::Error;

use crate::chain_config::ChainConfig;

/// Accepted sample rates in Hz.
pub const SAMPLE_RATE_RANGE: (u32, u32) = (8_000, 384_000);

/// Accepted block sizes in samples.
pub const BLOCK_SIZE_RANGE: (usize, usize) = (1, 8192);

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A numeric setting is out of range.
    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the setting.
        field: &'static str,
        /// The value that was out of range.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// A channel count other than mono or stereo.
    #[error("{field} = {value}: only 1 or 2 channels are supported")]
    UnsupportedChannels {
        /// `channels_in` or `channels_out`.
        field: &'static str,
        /// Requested count.
        value: usize,
    },

    /// A unit entry without an id.
    #[error("unit {0} has an empty id")]
    EmptyUnitId(usize),

    /// A parameter that is NaN or infinite.
    #[error("parameter '{param}' of unit {index} is not finite")]
    NonFiniteParam {
        /// Position of the unit in the configuration.
        index: usize,
        /// Parameter key.
        param: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate every field of `config`, collecting all errors.
///
/// `channels_in` may be 0 for an instrument chain (no input bus).
pub fn validate_config(config: &ChainConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();

    let (min, max) = SAMPLE_RATE_RANGE;
    if !(min..=max).contains(&config.sample_rate) {
        errors.push(ValidationError::OutOfRange {
            field: "sample_rate",
            value: f64::from(config.sample_rate),
            min: f64::from(min),
            max: f64::from(max),
        });
    }

    let (min, max) = BLOCK_SIZE_RANGE;
    if !(min..=max).contains(&config.block_size) {
        errors.push(ValidationError::OutOfRange {
            field: "block_size",
            value: config.block_size as f64,
            min: min as f64,
            max: max as f64,
        });
    }

    if config.channels_in > 2 {
        errors.push(ValidationError::UnsupportedChannels {
            field: "channels_in",
            value: config.channels_in,
        });
    }
    if !(1..=2).contains(&config.channels_out) {
        errors.push(ValidationError::UnsupportedChannels {
            field: "channels_out",
            value: config.channels_out,
        });
    }

    if !config.slow_block_ms.is_finite() || config.slow_block_ms <= 0.0 {
        errors.push(ValidationError::OutOfRange {
            field: "slow_block_ms",
            value: config.slow_block_ms,
            min: f64::MIN_POSITIVE,
            max: f64::MAX,
        });
    }

    for (index, unit) in config.units.iter().enumerate() {
        if unit.id.trim().is_empty() {
            errors.push(ValidationError::EmptyUnitId(index));
        }
        for (param, value) in &unit.params {
            if !value.is_finite() {
                errors.push(ValidationError::NonFiniteParam {
                    index,
                    param: param.clone(),
                });
            }
        }
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.swap_remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
