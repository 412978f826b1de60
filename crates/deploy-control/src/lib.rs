//! Contract deployment control.
//!
//! This crate deploys a fixed, ordered set of named contracts and records each
//! one in an on-chain address manager so the contracts can find each other.
//!
//! # Architecture
//!
//! A run is driven by [`Deployer::deploy`]:
//!
//! - **Registry resolution**: attach to the configured address manager, or
//!   deploy a fresh one when none is given
//! - **Planning**: a [`PlanBuilder`] turns configuration into an ordered
//!   [`DeploymentPlan`]
//! - **Deploy pass**: every eligible entry is deployed in plan order and
//!   registered with `setAddress`; a failed deployment is recorded and skipped
//! - **Hook pass**: every eligible entry's [`AfterDeploy`] hook runs with the
//!   full set of deployed contracts; a failed hook ends the run
//!
//! ```text
//! config ──▶ Registry ──▶ PlanBuilder ──▶ deploy pass ──▶ hook pass ──▶ DeploymentResult
//!                                            │
//!                                            ▼
//!                                    setAddress(name, address)
//! ```
//!
//! Nothing runs concurrently. Each transaction is mined before the next one is
//! sent, so the registry's contents and the failure list are deterministic for
//! a deterministic plan and chain.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use deploy_control::{
//!     chain::SimulatedChain, ConfigPlanBuilder, DeployConfig, Deployer, DeployerConfig,
//! };
//!
//! let config = DeployerConfig::load()?;
//! let chain = Arc::new(SimulatedChain::new());
//! let planner = Arc::new(ConfigPlanBuilder::new(chain.clone(), config.plan.clone()));
//!
//! let result = Deployer::new(chain, planner).deploy(&config.deploy).await?;
//! if !result.is_complete() {
//!     eprintln!("failed: {:?}", result.failed_deployments);
//! }
//! ```

#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

pub mod chain;
pub mod config;
pub mod deployment;
pub mod error;
pub mod plan;
pub mod policy;
pub mod registry;
pub mod types;

// Re-export commonly used types at the crate root
pub use chain::{ContractFactory, ContractHandle, FactoryResolver, SimulatedChain};
pub use config::{DeployConfig, DeployerConfig, PlanConfig, SimulationConfig};
pub use deployment::{DependencyFilter, Deployer};
pub use error::{DeployError, DeployResult, HookError, PlanError};
pub use plan::{
    AfterDeploy, CallHook, ConfigPlanBuilder, DeploymentDescriptor, DeploymentPlan, PlanBuilder,
};
pub use policy::RegistrationFailurePolicy;
pub use registry::{Registry, RegistryOrigin};
pub use types::{DeployedContracts, DeploymentResult, DeploymentSummary};
