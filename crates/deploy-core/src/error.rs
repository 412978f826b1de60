//! Errors reported by chain-facing collaborators.

use thiserror::Error;

/// Result type alias using [`ChainError`].
pub type ChainResult<T> = Result<T, ChainError>;

/// Failures surfaced by factories, contract handles and transports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The transaction was mined but reverted.
    #[error("execution reverted: {reason}")]
    Reverted {
        /// Revert reason.
        reason: String,
    },

    /// The sender cannot cover gas and value.
    #[error("insufficient funds for gas * price + value")]
    InsufficientFunds,

    /// No factory is known for this artifact name.
    #[error("unknown artifact: {0}")]
    UnknownArtifact(String),

    /// The contract does not expose the requested method.
    #[error("{artifact} has no method {method}")]
    UnknownMethod {
        /// Artifact the call targeted.
        artifact: String,
        /// Requested method.
        method: String,
    },

    /// Network or node failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ChainError {
    /// Create a revert error.
    #[must_use]
    pub fn reverted(reason: impl Into<String>) -> Self {
        Self::Reverted {
            reason: reason.into(),
        }
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}
