//! Deployment plans.
//!
//! A [`DeploymentPlan`] is an ordered set of named [`DeploymentDescriptor`]s.
//! Its insertion order is the deployment order. Plans are produced by a
//! [`PlanBuilder`] once the run's address manager is known, so descriptors can
//! embed its address in constructor arguments.

mod declarative;

pub use declarative::{CallHook, ConfigPlanBuilder};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use deploy_core::ConstructorArg;
use indexmap::IndexMap;

use crate::chain::ContractFactory;
use crate::config::DeployConfig;
use crate::error::{HookError, PlanError};
use crate::registry::Registry;
use crate::types::DeployedContracts;

/// Callback run after every eligible plan entry has gone through deployment.
///
/// Receives every contract deployed by the run, including entries that come
/// later in plan order than the hook's own entry.
#[async_trait]
pub trait AfterDeploy: Send + Sync {
    /// Run the hook.
    ///
    /// # Errors
    ///
    /// Any [`HookError`] ends the run.
    async fn run(&self, contracts: &DeployedContracts) -> Result<(), HookError>;
}

/// Produces the ordered plan for a run.
#[async_trait]
pub trait PlanBuilder: Send + Sync {
    /// Build the plan for `config`, with `registry` already resolved.
    ///
    /// # Errors
    ///
    /// Returns a [`PlanError`] if an entry cannot be turned into a descriptor.
    async fn build(
        &self,
        config: &DeployConfig,
        registry: &Registry,
    ) -> Result<DeploymentPlan, PlanError>;
}

/// How to deploy one plan entry.
#[derive(Clone)]
pub struct DeploymentDescriptor {
    /// Factory that deploys the entry.
    pub factory: Arc<dyn ContractFactory>,
    /// Constructor arguments, possibly empty.
    pub constructor_args: Vec<ConstructorArg>,
    /// Optional post-deployment hook.
    pub after_deploy: Option<Arc<dyn AfterDeploy>>,
}

impl DeploymentDescriptor {
    /// Create a descriptor with no arguments and no hook.
    #[must_use]
    pub fn new(factory: Arc<dyn ContractFactory>) -> Self {
        Self {
            factory,
            constructor_args: Vec::new(),
            after_deploy: None,
        }
    }

    /// Set constructor arguments.
    #[must_use]
    pub fn with_args(mut self, args: Vec<ConstructorArg>) -> Self {
        self.constructor_args = args;
        self
    }

    /// Set the post-deployment hook.
    #[must_use]
    pub fn with_after_deploy(mut self, hook: Arc<dyn AfterDeploy>) -> Self {
        self.after_deploy = Some(hook);
        self
    }
}

impl fmt::Debug for DeploymentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentDescriptor")
            .field("factory", &self.factory.artifact())
            .field("constructor_args", &self.constructor_args)
            .field("after_deploy", &self.after_deploy.is_some())
            .finish()
    }
}

/// Ordered mapping from entry name to descriptor.
#[derive(Debug, Clone, Default)]
pub struct DeploymentPlan {
    entries: IndexMap<String, DeploymentDescriptor>,
}

impl DeploymentPlan {
    /// Create an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::DuplicateArtifact`] if `name` is already planned.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        descriptor: DeploymentDescriptor,
    ) -> Result<(), PlanError> {
        use indexmap::map::Entry;

        match self.entries.entry(name.into()) {
            Entry::Occupied(entry) => Err(PlanError::DuplicateArtifact(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(descriptor);
                Ok(())
            }
        }
    }

    /// Descriptor for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DeploymentDescriptor> {
        self.entries.get(name)
    }

    /// Whether `name` is planned.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entries in deployment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeploymentDescriptor)> {
        self.entries
            .iter()
            .map(|(name, descriptor)| (name.as_str(), descriptor))
    }

    /// Names in deployment order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the plan has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
