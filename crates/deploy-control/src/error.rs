//! Error types for deploy-control.

use deploy_core::{ChainError, OverridesError};

/// Result type alias using [`DeployError`].
pub type DeployResult<T> = Result<T, DeployError>;

/// Errors that terminate a deployment run.
///
/// A per-artifact deployment failure is not one of these: it is recorded in
/// the run's result and the run carries on.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Configured transaction overrides are inconsistent.
    #[error("invalid deploy overrides: {0}")]
    InvalidOverrides(#[from] OverridesError),

    /// The address manager could not be attached or deployed.
    #[error("failed to resolve address manager: {0}")]
    RegistryResolution(#[source] ChainError),

    /// The deployment plan could not be built.
    #[error("failed to build deployment plan: {0}")]
    Plan(#[from] PlanError),

    /// An artifact deployed but its `setAddress` registration failed.
    #[error("failed to register {artifact} with the address manager: {source}")]
    Registration {
        /// Artifact that was deployed.
        artifact: String,
        /// Underlying failure.
        #[source]
        source: ChainError,
    },

    /// An after-deploy hook failed.
    #[error("after-deploy hook for {artifact} failed: {source}")]
    Hook {
        /// Artifact that declared the hook.
        artifact: String,
        /// Underlying failure.
        #[source]
        source: HookError,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DeployError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Name of the artifact the failure is attributed to, if any.
    #[must_use]
    pub fn artifact(&self) -> Option<&str> {
        match self {
            Self::Registration { artifact, .. } | Self::Hook { artifact, .. } => Some(artifact),
            _ => None,
        }
    }
}

/// Errors raised while building a deployment plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Two entries share a name.
    #[error("artifact {0} appears more than once in the plan")]
    DuplicateArtifact(String),

    /// No factory could be resolved for an entry.
    #[error("no factory for {artifact}: {source}")]
    Factory {
        /// Plan entry name.
        artifact: String,
        /// Resolver failure.
        #[source]
        source: ChainError,
    },

    /// A constructor argument refers to something the plan cannot supply.
    #[error("{artifact} refers to unknown value {reference:?}")]
    UnknownReference {
        /// Plan entry name.
        artifact: String,
        /// The unresolvable reference.
        reference: String,
    },
}

/// Errors raised by after-deploy hooks.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// The hook needs a contract that was not deployed in this run.
    #[error("contract {0} was not deployed")]
    MissingContract(String),

    /// A call made by the hook failed.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Any other hook failure.
    #[error("{0}")]
    Failed(String),
}

impl HookError {
    /// Create a generic hook failure.
    #[must_use]
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}
