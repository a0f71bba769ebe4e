//! Error types for chain operations.

use thiserror::Error;

/// Errors reported by load and initialization paths.
///
/// Structural no-ops (out-of-range indices) and precision downgrades are not
/// errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// No descriptor matched the id under any resolution step
    #[error("failed to find unit descriptor for '{id}'")]
    NotFound {
        /// Id that failed to resolve.
        id: String,
    },

    /// The unit source could not create an instance
    #[error("failed loading unit {unit}: {reason}")]
    Instantiation {
        /// File or identifier of the unit.
        unit: String,
        /// Reason reported by the source.
        reason: String,
    },

    /// Negotiation could not find a layout the unit accepts
    #[error("I/O layout ({inputs},{outputs} +{extra}) not supported by unit: {unit}")]
    LayoutNotSupported {
        /// Chain main input channels.
        inputs: usize,
        /// Chain main output channels.
        outputs: usize,
        /// Chain extra channels at the time of the failure.
        extra: usize,
        /// Unit name.
        unit: String,
    },
}

impl ChainError {
    /// Create a not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        ChainError::NotFound { id: id.into() }
    }

    /// Create an instantiation error.
    pub fn instantiation(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        ChainError::Instantiation {
            unit: unit.into(),
            reason: reason.into(),
        }
    }
}
