//! Error types for configuration operations.

use std::path::PathBuf;
use tandem_chain::ChainError;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Validation errors
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),

    /// A unit named in the configuration could not be added
    #[error("unit {index}: {source}")]
    Unit {
        /// Position of the unit in the configuration.
        index: usize,
        /// Why the chain refused it.
        #[source]
        source: ChainError,
    },

    /// The chain refused the configured channel counts
    #[error("chain rejected channel layout {channels_in}x{channels_out}")]
    ChannelLayout {
        /// Configured main input channels.
        channels_in: usize,
        /// Configured main output channels.
        channels_out: usize,
    },

    /// Invalid parameter
    #[error("invalid parameter '{param}' for unit '{unit}': {reason}")]
    InvalidParameter {
        /// Id of the unit containing the invalid parameter.
        unit: String,
        /// Key of the invalid parameter.
        param: String,
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Create a channel layout error.
    pub fn channel_layout(channels_in: usize, channels_out: usize) -> Self {
        ConfigError::ChannelLayout {
            channels_in,
            channels_out,
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(
        unit: impl Into<String>,
        param: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidParameter {
            unit: unit.into(),
            param: param.into(),
            reason: reason.into(),
        }
    }
}
