//! Core types for deploy-control.

use std::sync::Arc;

use deploy_core::Address;
use indexmap::IndexMap;
use serde::Serialize;

use crate::chain::ContractHandle;
use crate::registry::{Registry, RegistryOrigin};

/// Contracts deployed by a run, keyed by plan entry name in deployment order.
#[derive(Debug, Clone, Default)]
pub struct DeployedContracts {
    contracts: IndexMap<String, Arc<dyn ContractHandle>>,
}

impl DeployedContracts {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a deployed contract under `name`.
    pub fn insert(&mut self, name: impl Into<String>, handle: Arc<dyn ContractHandle>) {
        self.contracts.insert(name.into(), handle);
    }

    /// Forget the contract recorded under `name`, keeping the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn ContractHandle>> {
        self.contracts.shift_remove(name)
    }

    /// Handle of the contract recorded under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ContractHandle>> {
        self.contracts.get(name)
    }

    /// Address of the contract recorded under `name`.
    #[must_use]
    pub fn address_of(&self, name: &str) -> Option<Address> {
        self.contracts.get(name).map(|handle| handle.address())
    }

    /// Whether a contract is recorded under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    /// Names in deployment order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.contracts.keys().map(String::as_str)
    }

    /// Entries in deployment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn ContractHandle>)> {
        self.contracts.iter().map(|(name, handle)| (name.as_str(), handle))
    }

    /// Number of deployed contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Whether nothing was deployed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Name-to-address mapping in deployment order.
    #[must_use]
    pub fn addresses(&self) -> IndexMap<String, Address> {
        self.contracts
            .iter()
            .map(|(name, handle)| (name.clone(), handle.address()))
            .collect()
    }
}

/// Outcome of a run that was not aborted.
///
/// A run with per-artifact failures still produces a result; check
/// [`DeploymentResult::failed_deployments`] or [`DeploymentResult::is_complete`].
#[derive(Debug, Clone)]
pub struct DeploymentResult {
    /// Address manager the run registered into.
    pub registry: Registry,
    /// Names whose deployment failed, in failure order.
    pub failed_deployments: Vec<String>,
    /// Successfully deployed contracts.
    pub contracts: DeployedContracts,
}

impl DeploymentResult {
    /// Whether every eligible artifact was deployed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_deployments.is_empty()
    }

    /// Plain-data view of the result for printing or persisting.
    #[must_use]
    pub fn summary(&self) -> DeploymentSummary {
        DeploymentSummary {
            registry: self.registry.address(),
            registry_origin: self.registry.origin(),
            contracts: self.contracts.addresses(),
            failed_deployments: self.failed_deployments.clone(),
        }
    }
}

/// Serialisable summary of a [`DeploymentResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentSummary {
    /// Address manager address.
    pub registry: Address,
    /// Whether the address manager was attached or deployed.
    pub registry_origin: RegistryOrigin,
    /// Deployed contract addresses in deployment order.
    pub contracts: IndexMap<String, Address>,
    /// Names whose deployment failed.
    pub failed_deployments: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use deploy_core::{DeployOverrides, SigningIdentity};

    use super::*;
    use crate::chain::{FactoryResolver, SimulatedChain};

    async fn handle(chain: &SimulatedChain, artifact: &str) -> Arc<dyn ContractHandle> {
        chain
            .resolve(artifact, &SigningIdentity::default())
            .unwrap()
            .deploy(&[], &DeployOverrides::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn remove_keeps_order() {
        let chain = SimulatedChain::new();
        let mut contracts = DeployedContracts::new();
        contracts.insert("a", handle(&chain, "A").await);
        contracts.insert("b", handle(&chain, "B").await);
        contracts.insert("c", handle(&chain, "C").await);

        assert!(contracts.remove("b").is_some());

        assert_eq!(contracts.names().collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(!contracts.contains("b"));
        assert_eq!(contracts.len(), 2);
    }

    #[tokio::test]
    async fn summary_serialises_addresses_in_order() {
        let chain = SimulatedChain::new();
        let registry_handle = handle(&chain, "AddressManager").await;
        let registry = Registry::new(registry_handle, RegistryOrigin::Deployed);

        let mut contracts = DeployedContracts::new();
        let token = handle(&chain, "Token").await;
        let token_address = token.address();
        contracts.insert("Token", token);

        let result = DeploymentResult {
            registry: registry.clone(),
            failed_deployments: vec!["Vault".to_owned()],
            contracts,
        };

        assert!(!result.is_complete());

        let json = serde_json::to_value(result.summary()).unwrap();
        assert_eq!(json["registry"], registry.address().to_string());
        assert_eq!(json["registry_origin"], "deployed");
        assert_eq!(json["contracts"]["Token"], token_address.to_string());
        assert_eq!(json["failed_deployments"][0], "Vault");
    }
}
