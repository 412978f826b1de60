//! Plans built from configuration.

use std::sync::Arc;

use async_trait::async_trait;
use deploy_core::ConstructorArg;
use tracing::debug;

use super::{AfterDeploy, DeploymentDescriptor, DeploymentPlan, PlanBuilder};
use crate::chain::FactoryResolver;
use crate::config::{ArtifactSpec, DeployConfig, HookArg, HookCall, PlanArg, PlanConfig};
use crate::error::{HookError, PlanError};
use crate::registry::Registry;
use crate::types::DeployedContracts;

/// Reference name that resolves to the run's address manager.
const REGISTRY_REF: &str = "registry";

/// Builds a [`DeploymentPlan`] from a [`PlanConfig`].
///
/// Factories are resolved with the run's signer. `{ ref = "registry" }`
/// arguments become the address manager's address, and configured
/// `after_deploy` calls become a [`CallHook`].
pub struct ConfigPlanBuilder {
    resolver: Arc<dyn FactoryResolver>,
    config: PlanConfig,
}

impl ConfigPlanBuilder {
    /// Create a builder for `config`.
    pub fn new(resolver: Arc<dyn FactoryResolver>, config: PlanConfig) -> Self {
        Self { resolver, config }
    }

    fn descriptor(
        &self,
        spec: &ArtifactSpec,
        config: &DeployConfig,
        registry: &Registry,
    ) -> Result<DeploymentDescriptor, PlanError> {
        let factory = self
            .resolver
            .resolve(spec.factory_name(), &config.signer)
            .map_err(|source| PlanError::Factory {
                artifact: spec.name.clone(),
                source,
            })?;

        let args = spec
            .args
            .iter()
            .map(|arg| match arg {
                PlanArg::Literal(value) => Ok(value.clone()),
                PlanArg::Reference { reference } if reference == REGISTRY_REF => {
                    Ok(ConstructorArg::Address(registry.address()))
                }
                PlanArg::Reference { reference } => Err(PlanError::UnknownReference {
                    artifact: spec.name.clone(),
                    reference: reference.clone(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut descriptor = DeploymentDescriptor::new(factory).with_args(args);
        if !spec.after_deploy.is_empty() {
            descriptor = descriptor.with_after_deploy(Arc::new(CallHook::new(
                spec.name.clone(),
                spec.after_deploy.clone(),
            )));
        }

        Ok(descriptor)
    }
}

impl std::fmt::Debug for ConfigPlanBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigPlanBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PlanBuilder for ConfigPlanBuilder {
    async fn build(
        &self,
        config: &DeployConfig,
        registry: &Registry,
    ) -> Result<DeploymentPlan, PlanError> {
        let mut plan = DeploymentPlan::new();
        for spec in &self.config.artifacts {
            plan.insert(spec.name.clone(), self.descriptor(spec, config, registry)?)?;
        }

        debug!(entries = plan.len(), "deployment plan built");
        Ok(plan)
    }
}

/// Hook that makes a fixed list of calls once deployment is done.
///
/// Calls run in order and stop at the first failure. A call without an
/// explicit target goes to the entry that owns the hook.
#[derive(Debug, Clone)]
pub struct CallHook {
    owner: String,
    calls: Vec<HookCall>,
}

impl CallHook {
    /// Create a hook owned by the plan entry `owner`.
    #[must_use]
    pub fn new(owner: impl Into<String>, calls: Vec<HookCall>) -> Self {
        Self {
            owner: owner.into(),
            calls,
        }
    }

    fn resolve_args(
        contracts: &DeployedContracts,
        args: &[HookArg],
    ) -> Result<Vec<ConstructorArg>, HookError> {
        args.iter()
            .map(|arg| match arg {
                HookArg::Literal(value) => Ok(value.clone()),
                HookArg::Contract { contract } => contracts
                    .address_of(contract)
                    .map(ConstructorArg::Address)
                    .ok_or_else(|| HookError::MissingContract(contract.clone())),
            })
            .collect()
    }
}

#[async_trait]
impl AfterDeploy for CallHook {
    async fn run(&self, contracts: &DeployedContracts) -> Result<(), HookError> {
        for call in &self.calls {
            let target_name = call.contract.as_deref().unwrap_or(&self.owner);
            let target = contracts
                .get(target_name)
                .ok_or_else(|| HookError::MissingContract(target_name.to_owned()))?;
            let args = Self::resolve_args(contracts, &call.args)?;

            let receipt = target.call(&call.method, &args).await?;
            debug!(
                owner = %self.owner,
                target = %target_name,
                method = %call.method,
                tx = %receipt.hash,
                "after-deploy call mined"
            );
        }

        Ok(())
    }
}
