//! Core deployment orchestration logic.

use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::chain::FactoryResolver;
use crate::config::DeployConfig;
use crate::deployment::DependencyFilter;
use crate::error::{DeployError, DeployResult};
use crate::plan::{DeploymentPlan, PlanBuilder};
use crate::policy::RegistrationFailurePolicy;
use crate::registry::Registry;
use crate::types::{DeployedContracts, DeploymentResult};

/// Contracts and failures accumulated by the deploy pass.
#[derive(Debug, Default)]
struct DeployPassOutcome {
    contracts: DeployedContracts,
    failed: Vec<String>,
}

/// Orchestrates a deployment run.
///
/// Every remote operation is awaited before the next one is issued, so
/// deployments, registrations and hooks happen in a strict total order.
pub struct Deployer {
    resolver: Arc<dyn FactoryResolver>,
    planner: Arc<dyn PlanBuilder>,
}

impl Deployer {
    /// Create a deployer.
    pub fn new(resolver: Arc<dyn FactoryResolver>, planner: Arc<dyn PlanBuilder>) -> Self {
        Self { resolver, planner }
    }

    /// Run a deployment.
    ///
    /// This orchestrates the full run:
    /// 1. Validate transaction overrides
    /// 2. Attach to or deploy the address manager
    /// 3. Build the plan
    /// 4. Deploy and register every eligible entry, recording failures
    /// 5. Run every eligible entry's after-deploy hook
    ///
    /// An artifact that fails to deploy is recorded in
    /// [`DeploymentResult::failed_deployments`] and does not stop the run.
    ///
    /// # Errors
    ///
    /// Fails without a result if the overrides are invalid, the address
    /// manager or plan cannot be resolved, a hook fails, or a registration
    /// fails under [`RegistrationFailurePolicy::Abort`].
    pub async fn deploy(&self, config: &DeployConfig) -> DeployResult<DeploymentResult> {
        let run_id = ulid::Ulid::new().to_string().to_lowercase();
        let span = info_span!("deploy", run_id = %run_id);
        self.run(config).instrument(span).await
    }

    async fn run(&self, config: &DeployConfig) -> DeployResult<DeploymentResult> {
        config.overrides.validate()?;

        info!(
            signer = %config.signer,
            registration_failure = %config.registration_failure,
            "starting deployment"
        );

        let registry = Registry::resolve(self.resolver.as_ref(), config).await?;
        let plan = self.planner.build(config, &registry).await?;

        let filter = DependencyFilter::new(config.dependencies.as_deref());
        for name in filter.unmatched(&plan) {
            warn!(artifact = %name, "dependency is not part of the deployment plan");
        }

        let DeployPassOutcome { contracts, failed } =
            Self::deploy_pass(&plan, &filter, &registry, config).await?;
        Self::hook_pass(&plan, &filter, &contracts).await?;

        info!(
            deployed = contracts.len(),
            failed = failed.len(),
            registry = %registry.address(),
            "deployment finished"
        );

        Ok(DeploymentResult {
            registry,
            failed_deployments: failed,
            contracts,
        })
    }

    async fn deploy_pass(
        plan: &DeploymentPlan,
        filter: &DependencyFilter<'_>,
        registry: &Registry,
        config: &DeployConfig,
    ) -> DeployResult<DeployPassOutcome> {
        let mut outcome = DeployPassOutcome::default();

        for (name, descriptor) in plan.iter() {
            if !filter.allows(name) {
                debug!(artifact = %name, "skipping artifact outside dependency list");
                continue;
            }

            debug!(
                artifact = %name,
                factory = %descriptor.factory.artifact(),
                args = descriptor.constructor_args.len(),
                "deploying artifact"
            );

            let handle = match descriptor
                .factory
                .deploy(&descriptor.constructor_args, &config.overrides)
                .await
            {
                Ok(handle) => handle,
                Err(e) => {
                    error!(artifact = %name, error = %e, "error deploying artifact");
                    outcome.failed.push(name.to_owned());
                    continue;
                }
            };

            let address = handle.address();
            outcome.contracts.insert(name, handle);

            match registry.set_address(name, address).await {
                Ok(receipt) => {
                    info!(
                        artifact = %name,
                        address = %address,
                        tx = %receipt.hash,
                        "artifact deployed and registered"
                    );
                }
                Err(source) => match config.registration_failure {
                    RegistrationFailurePolicy::Abort => {
                        error!(
                            artifact = %name,
                            address = %address,
                            error = %source,
                            "registration failed, aborting deployment"
                        );
                        return Err(DeployError::Registration {
                            artifact: name.to_owned(),
                            source,
                        });
                    }
                    RegistrationFailurePolicy::Record => {
                        error!(
                            artifact = %name,
                            address = %address,
                            error = %source,
                            "error registering artifact"
                        );
                        outcome.contracts.remove(name);
                        outcome.failed.push(name.to_owned());
                    }
                },
            }
        }

        Ok(outcome)
    }

    async fn hook_pass(
        plan: &DeploymentPlan,
        filter: &DependencyFilter<'_>,
        contracts: &DeployedContracts,
    ) -> DeployResult<()> {
        for (name, descriptor) in plan.iter() {
            if !filter.allows(name) {
                continue;
            }
            let Some(hook) = &descriptor.after_deploy else {
                continue;
            };

            debug!(artifact = %name, "running after-deploy hook");
            hook.run(contracts).await.map_err(|source| {
                error!(artifact = %name, error = %source, "after-deploy hook failed");
                DeployError::Hook {
                    artifact: name.to_owned(),
                    source,
                }
            })?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for Deployer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployer").finish_non_exhaustive()
    }
}
