//! Chain configuration file format and operations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use tandem_registry::IdScheme;

use crate::error::ConfigError;
use crate::validation::validate_config;

/// One unit entry in a chain configuration.
///
/// # Example
///
/// ```rust
/// use tandem_config::UnitConfig;
///
/// let unit = UnitConfig::new("builtin:echo")
///     .with_param("time_ms", 375.0)
///     .with_bypass(true);
/// assert_eq!(unit.params["time_ms"], 375.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitConfig {
    /// Unit id, identifier string, or file path.
    pub id: String,

    /// Load the unit suspended.
    #[serde(default)]
    pub bypassed: bool,

    /// Parameter values keyed by parameter key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, f32>,
}

impl UnitConfig {
    /// Create an active unit entry with no parameter overrides.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            bypassed: false,
            params: BTreeMap::new(),
        }
    }

    /// Set a parameter value.
    pub fn with_param(mut self, key: impl Into<String>, value: f32) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Set whether the unit is bypassed.
    pub fn with_bypass(mut self, bypassed: bool) -> Self {
        self.bypassed = bypassed;
        self
    }
}

/// A processing chain and the host settings it runs with.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000
/// block_size = 512
/// channels_in = 2
/// channels_out = 2
/// double_precision = false
/// id_scheme = "native"
/// slow_block_ms = 20.0
///
/// [[units]]
/// id = "builtin:gain"
/// [units.params]
/// gain_db = -6.0
///
/// [[units]]
/// id = "Builtin-Echo-1003"
/// bypassed = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChainConfig {
    /// Render sample rate in Hz.
    pub sample_rate: u32,
    /// Render block size in samples.
    pub block_size: usize,
    /// Main input channels; 0 for an instrument chain.
    pub channels_in: usize,
    /// Main output channels.
    pub channels_out: usize,
    /// Render at double precision where every unit allows it.
    pub double_precision: bool,
    /// Id scheme used to resolve `units[].id`.
    pub id_scheme: IdScheme,
    /// Blocks slower than this are logged.
    pub slow_block_ms: f64,
    /// Units in chain order.
    pub units: Vec<UnitConfig>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            block_size: 512,
            channels_in: 2,
            channels_out: 2,
            double_precision: false,
            id_scheme: IdScheme::Native,
            slow_block_ms: 20.0,
            units: Vec::new(),
        }
    }
}

impl ChainConfig {
    /// Append a unit.
    pub fn with_unit(mut self, unit: UnitConfig) -> Self {
        self.units.push(unit);
        self
    }

    /// Slow-block threshold as a duration.
    pub fn slow_block_threshold(&self) -> Duration {
        Duration::from_secs_f64(self.slow_block_ms.max(0.0) / 1000.0)
    }

    /// Load and validate a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("loaded chain config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: ChainConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every field; see [`validate_config`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_config(self)?;
        Ok(())
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true if no units are configured.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = ChainConfig::from_toml_str("block_size = 64").unwrap();
        assert_eq!(config.block_size, 64);
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.id_scheme, IdScheme::Native);
        assert!(config.is_empty());
    }

    #[test]
    fn test_parse_units() {
        let toml_str = r#"
            id_scheme = "identifier"
            double_precision = true

            [[units]]
            id = "builtin:gain"
            [units.params]
            gain_db = -6.0

            [[units]]
            id = "builtin:echo"
            bypassed = true
        "#;
        let config = ChainConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.id_scheme, IdScheme::Identifier);
        assert!(config.double_precision);
        assert_eq!(config.len(), 2);
        assert_eq!(config.units[0].params["gain_db"], -6.0);
        assert!(config.units[1].bypassed);
        assert!(config.units[1].params.is_empty());
    }

    #[test]
    fn test_invalid_values_rejected_on_parse() {
        let err = ChainConfig::from_toml_str("channels_out = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)), "{err}");
    }

    #[test]
    fn test_malformed_toml() {
        let err = ChainConfig::from_toml_str("units = 3").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)), "{err}");
    }

    #[test]
    fn test_toml_string_round_trip() {
        let config = ChainConfig::default()
            .with_unit(UnitConfig::new("builtin:lookahead").with_param("lookahead_ms", 2.5))
            .with_unit(UnitConfig::new("builtin:gain").with_bypass(true));
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("[[units]]"));
        assert_eq!(ChainConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_slow_block_threshold() {
        let config = ChainConfig {
            slow_block_ms: 5.0,
            ..ChainConfig::default()
        };
        assert_eq!(config.slow_block_threshold().as_micros(), 5000);
    }
}
