//! Error types for the Monte Carlo kernels.
//!
//! Parameter validation happens in constructors, before any random draw, so a
//! simulation either produces every requested sample and path or fails
//! outright.

use thiserror::Error;

/// Error raised by the simulation kernels.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SimError {
    /// A simulation parameter is outside its valid domain.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        value: String,
    },

    /// The worker pool for a parallel simulation could not be created.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    /// The simulation was cancelled through its [`CancellationToken`](super::CancellationToken).
    #[error("Simulation cancelled")]
    Cancelled,
}

impl SimError {
    /// Shorthand for [`SimError::InvalidParameter`].
    pub(crate) fn invalid(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
        }
    }
}
