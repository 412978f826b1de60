//! Deployment orchestration.
//!
//! This module runs a plan against an address manager: one pass deploying and
//! registering every eligible entry, then one pass running after-deploy hooks.

mod filter;
mod manager;

pub use filter::DependencyFilter;
pub use manager::Deployer;
