//! Common test utilities for orchestration integration tests.

#![allow(dead_code, clippy::unwrap_used)]

pub mod fixtures;

use std::sync::Arc;

use deploy_control::{
    DeployConfig, DeployResult, Deployer, DeploymentDescriptor, DeploymentPlan, DeploymentResult,
    FactoryResolver, SimulatedChain,
};
use deploy_core::{Address, SigningIdentity};

use fixtures::StaticPlanBuilder;

/// A simulated chain plus the plan a test wants to run against it.
pub struct TestNetwork {
    pub chain: SimulatedChain,
    pub signer: SigningIdentity,
    plan: DeploymentPlan,
}

impl TestNetwork {
    /// Creates a network with an empty plan.
    pub fn new() -> Self {
        Self {
            chain: SimulatedChain::new(),
            signer: SigningIdentity::new(Address::new([0xde; 20])).with_label("deployer"),
            plan: DeploymentPlan::new(),
        }
    }

    /// Descriptor for `artifact`, resolved with the test signer.
    pub fn descriptor(&self, artifact: &str) -> DeploymentDescriptor {
        DeploymentDescriptor::new(self.chain.resolve(artifact, &self.signer).unwrap())
    }

    /// Appends a plan entry named after its artifact.
    pub fn with_entry(mut self, name: &str) -> Self {
        let descriptor = self.descriptor(name);
        self.plan.insert(name, descriptor).unwrap();
        self
    }

    /// Appends a plan entry with a custom descriptor.
    pub fn with_descriptor(mut self, name: &str, descriptor: DeploymentDescriptor) -> Self {
        self.plan.insert(name, descriptor).unwrap();
        self
    }

    /// Run configuration for the test signer.
    pub fn config(&self) -> DeployConfig {
        DeployConfig::new(self.signer.clone())
    }

    /// Runs the plan with `config`.
    pub async fn deploy(&self, config: &DeployConfig) -> DeployResult<DeploymentResult> {
        let deployer = Deployer::new(
            Arc::new(self.chain.clone()),
            Arc::new(StaticPlanBuilder::new(self.plan.clone())),
        );
        deployer.deploy(config).await
    }

    /// Names passed to `setAddress`, in mining order.
    pub fn registered_names(&self) -> Vec<String> {
        self.chain
            .calls_to("setAddress")
            .iter()
            .filter_map(|args| args.first().and_then(|arg| arg.as_str()).map(str::to_owned))
            .collect()
    }
}

impl Default for TestNetwork {
    fn default() -> Self {
        Self::new()
    }
}
