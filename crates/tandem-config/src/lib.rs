//! Configuration for tandem chains.
//!
//! A [`ChainConfig`] describes host settings (sample rate, block size,
//! channel counts, precision, id scheme) and an ordered list of units with
//! bypass flags and parameter values. It is stored as TOML.
//!
//! # Features
//!
//! - **Chain files**: load, save and validate [`ChainConfig`] TOML
//! - **Building**: [`build_chain`] turns a config into a live
//!   [`ProcessorChain`](tandem_chain::ProcessorChain); [`capture_chain`]
//!   goes the other way
//! - **Paths**: platform-specific config directory
//!
//! # Example
//!
//! ```rust,no_run
//! use tandem_config::{ChainConfig, UnitConfig, default_config_path};
//!
//! let config = ChainConfig::default()
//!     .with_unit(UnitConfig::new("builtin:lookahead").with_param("lookahead_ms", 10.0))
//!     .with_unit(UnitConfig::new("builtin:echo"));
//! config.save(default_config_path()).unwrap();
//!
//! let loaded = ChainConfig::load(default_config_path()).unwrap();
//! assert_eq!(loaded, config);
//! ```

mod chain;
mod chain_config;
mod error;

/// Platform-specific configuration paths.
pub mod paths;

/// Structural validation.
pub mod validation;

pub use chain::{build_chain, capture_chain};
pub use chain_config::{ChainConfig, UnitConfig};
pub use error::ConfigError;
pub use paths::{DEFAULT_CONFIG_FILE, default_config_path, ensure_user_config_dir, user_config_dir};
pub use validation::{ValidationError, ValidationResult, validate_config};

/// Re-export the id scheme used in configuration files.
pub use tandem_registry::IdScheme;
