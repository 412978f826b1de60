//! Test fixtures for orchestration integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use deploy_control::{
    AfterDeploy, DeployConfig, DeployedContracts, DeploymentPlan, HookError, PlanBuilder,
    PlanError, Registry,
};

/// Plan builder that hands out a prebuilt plan.
pub struct StaticPlanBuilder {
    plan: DeploymentPlan,
}

impl StaticPlanBuilder {
    pub fn new(plan: DeploymentPlan) -> Self {
        Self { plan }
    }
}

#[async_trait]
impl PlanBuilder for StaticPlanBuilder {
    async fn build(
        &self,
        _config: &DeployConfig,
        _registry: &Registry,
    ) -> Result<DeploymentPlan, PlanError> {
        Ok(self.plan.clone())
    }
}

/// Shared log of hook invocations.
#[derive(Clone, Default)]
pub struct HookLog {
    entries: Arc<Mutex<Vec<HookInvocation>>>,
}

/// What a hook saw when it ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookInvocation {
    pub owner: String,
    pub visible: Vec<String>,
}

impl HookLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owners of the hooks that ran, in order.
    pub fn owners(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|entry| entry.owner.clone())
            .collect()
    }

    pub fn invocations(&self) -> Vec<HookInvocation> {
        self.entries.lock().unwrap().clone()
    }

    fn record(&self, owner: &str, contracts: &DeployedContracts) {
        self.entries.lock().unwrap().push(HookInvocation {
            owner: owner.to_owned(),
            visible: contracts.names().map(str::to_owned).collect(),
        });
    }
}

/// Builder for hooks that record themselves and optionally fail.
pub struct HookBuilder {
    owner: String,
    log: HookLog,
    requires: Vec<String>,
    fail_with: Option<String>,
}

impl HookBuilder {
    pub fn new(owner: &str, log: &HookLog) -> Self {
        Self {
            owner: owner.to_owned(),
            log: log.clone(),
            requires: Vec::new(),
            fail_with: None,
        }
    }

    /// Fail with `MissingContract` unless `name` was deployed.
    pub fn requires(mut self, name: &str) -> Self {
        self.requires.push(name.to_owned());
        self
    }

    /// Always fail with `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_owned());
        self
    }

    pub fn build(self) -> Arc<dyn AfterDeploy> {
        Arc::new(RecordingHook {
            owner: self.owner,
            log: self.log,
            requires: self.requires,
            fail_with: self.fail_with,
        })
    }
}

struct RecordingHook {
    owner: String,
    log: HookLog,
    requires: Vec<String>,
    fail_with: Option<String>,
}

#[async_trait]
impl AfterDeploy for RecordingHook {
    async fn run(&self, contracts: &DeployedContracts) -> Result<(), HookError> {
        self.log.record(&self.owner, contracts);

        if let Some(missing) = self.requires.iter().find(|name| !contracts.contains(name)) {
            return Err(HookError::MissingContract(missing.clone()));
        }

        match &self.fail_with {
            Some(message) => Err(HookError::failed(message.clone())),
            None => Ok(()),
        }
    }
}
