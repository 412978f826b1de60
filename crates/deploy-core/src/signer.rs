//! Signing identity used to send deployment transactions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// The account that signs and pays for deployments.
///
/// Key material lives with the transport; this only identifies the sender.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigningIdentity {
    /// Sender address.
    pub address: Address,

    /// Human-readable name for logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SigningIdentity {
    /// Create an identity for an address.
    #[must_use]
    pub const fn new(address: Address) -> Self {
        Self {
            address,
            label: None,
        }
    }

    /// Attach a label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{label} ({})", self.address),
            None => write!(f, "{}", self.address),
        }
    }
}
