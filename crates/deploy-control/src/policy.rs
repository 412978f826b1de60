//! What a run does when registering a freshly deployed artifact fails.
//!
//! Deployment failures are always recorded and skipped, and hook failures
//! always end the run. The `setAddress` call sits between the two: the
//! artifact exists on chain but the address manager does not know about it.
//! [`RegistrationFailurePolicy`] makes that choice explicit.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handling of a failed `setAddress` call after a successful deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationFailurePolicy {
    /// End the run with an error.
    ///
    /// Artifacts processed so far stay deployed and registered; the failing
    /// artifact stays deployed but unregistered. No result is returned.
    ///
    /// **Use when:** a registry that is out of step with the chain must stop
    /// everything until someone looks at it.
    #[default]
    Abort,

    /// Treat the artifact as failed and carry on.
    ///
    /// The artifact is removed from the deployed set and its name appended to
    /// the failure list, exactly as if its deployment had failed. The orphaned
    /// on-chain instance is left behind.
    ///
    /// **Use when:** a partial run that can be retried for the failed names is
    /// preferable to stopping.
    Record,
}

impl RegistrationFailurePolicy {
    /// Get the policy name as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::Record => "record",
        }
    }
}

impl fmt::Display for RegistrationFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RegistrationFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(Self::Abort),
            "record" => Ok(Self::Record),
            _ => Err(format!("unknown registration failure policy: {s}")),
        }
    }
}
