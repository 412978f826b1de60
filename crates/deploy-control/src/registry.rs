//! Address manager resolution.
//!
//! Every run writes to exactly one address manager: either an existing
//! instance named in configuration or a fresh deployment.

use std::fmt;
use std::sync::Arc;

use deploy_core::{Address, ChainResult, ConstructorArg, DeployOverrides, TxReceipt};
use serde::Serialize;
use tracing::info;

use crate::chain::{ContractHandle, FactoryResolver};
use crate::config::DeployConfig;
use crate::error::{DeployError, DeployResult};

/// Registry method that records a name-to-address mapping.
pub const SET_ADDRESS: &str = "setAddress";

/// How the address manager of a run was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryOrigin {
    /// Bound to an existing address; no transaction was sent.
    Attached,
    /// Deployed by this run.
    Deployed,
}

impl fmt::Display for RegistryOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attached => write!(f, "attached"),
            Self::Deployed => write!(f, "deployed"),
        }
    }
}

/// Live handle to the address manager used by a run.
#[derive(Debug, Clone)]
pub struct Registry {
    handle: Arc<dyn ContractHandle>,
    origin: RegistryOrigin,
}

impl Registry {
    /// Wrap an existing handle.
    #[must_use]
    pub fn new(handle: Arc<dyn ContractHandle>, origin: RegistryOrigin) -> Self {
        Self { handle, origin }
    }

    /// Attach to `config.registry` if set, otherwise deploy a new instance
    /// with no constructor arguments.
    ///
    /// Attaching does not check that the address actually holds an address
    /// manager; a wrong address only shows up later as registrations that go
    /// nowhere.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::RegistryResolution`] if the factory cannot be
    /// resolved or the deployment fails.
    pub async fn resolve(
        resolver: &dyn FactoryResolver,
        config: &DeployConfig,
    ) -> DeployResult<Self> {
        let factory = resolver
            .resolve(&config.registry_artifact, &config.signer)
            .map_err(DeployError::RegistryResolution)?;

        match config.registry {
            Some(address) => {
                info!(address = %address, "connecting to existing address manager");
                Ok(Self::new(factory.attach(address), RegistryOrigin::Attached))
            }
            None => {
                info!(
                    signer = %config.signer,
                    "address manager not provided, deploying a new one"
                );
                let handle = factory
                    .deploy(&[], &DeployOverrides::default())
                    .await
                    .map_err(DeployError::RegistryResolution)?;
                info!(address = %handle.address(), "address manager deployed");
                Ok(Self::new(handle, RegistryOrigin::Deployed))
            }
        }
    }

    /// Address of the address manager.
    #[must_use]
    pub fn address(&self) -> Address {
        self.handle.address()
    }

    /// How this address manager was obtained.
    #[must_use]
    pub const fn origin(&self) -> RegistryOrigin {
        self.origin
    }

    /// Underlying contract handle.
    #[must_use]
    pub fn handle(&self) -> &Arc<dyn ContractHandle> {
        &self.handle
    }

    /// Record `address` under `name` and wait for the transaction to be mined.
    ///
    /// # Errors
    ///
    /// Returns the [`ChainError`](deploy_core::ChainError) raised by the
    /// `setAddress` call.
    pub async fn set_address(&self, name: &str, address: Address) -> ChainResult<TxReceipt> {
        self.handle
            .call(
                SET_ADDRESS,
                &[
                    ConstructorArg::String(name.to_owned()),
                    ConstructorArg::Address(address),
                ],
            )
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use deploy_core::{ChainError, SigningIdentity};
    use tracing_test::traced_test;

    use super::*;
    use crate::chain::SimulatedChain;

    fn config() -> DeployConfig {
        DeployConfig::new(SigningIdentity::new(Address::new([0xaa; 20])))
    }

    #[tokio::test]
    #[traced_test]
    async fn deploys_when_no_address_given() {
        let chain = SimulatedChain::new();

        let registry = Registry::resolve(&chain, &config()).await.unwrap();

        assert_eq!(registry.origin(), RegistryOrigin::Deployed);
        assert_eq!(chain.deploy_count("AddressManager"), 1);
        assert_eq!(
            chain.code_at(registry.address()).as_deref(),
            Some("AddressManager")
        );
        assert!(logs_contain("address manager not provided, deploying a new one"));
    }

    #[tokio::test]
    #[traced_test]
    async fn attaches_without_a_transaction() {
        let chain = SimulatedChain::new();
        let existing = Address::new([0x11; 20]);

        let registry = Registry::resolve(&chain, &config().with_registry(existing))
            .await
            .unwrap();

        assert_eq!(registry.origin(), RegistryOrigin::Attached);
        assert_eq!(registry.address(), existing);
        assert!(chain.events().is_empty());
        assert!(logs_contain("connecting to existing address manager"));
    }

    #[tokio::test]
    async fn deploy_failure_is_a_resolution_error() {
        let chain = SimulatedChain::new();
        chain.fail_deploy("AddressManager", ChainError::InsufficientFunds);

        let err = Registry::resolve(&chain, &config()).await.unwrap_err();

        assert!(matches!(
            err,
            DeployError::RegistryResolution(ChainError::InsufficientFunds)
        ));
    }

    #[tokio::test]
    async fn unknown_registry_artifact_is_a_resolution_error() {
        let chain = SimulatedChain::strict(["Token"]);
        let mut config = config();
        config.registry_artifact = "Lib_AddressManager".to_owned();

        let err = Registry::resolve(&chain, &config).await.unwrap_err();

        assert!(matches!(
            err,
            DeployError::RegistryResolution(ChainError::UnknownArtifact(_))
        ));
    }

    #[tokio::test]
    async fn set_address_writes_mapping() {
        let chain = SimulatedChain::new();
        let registry = Registry::resolve(&chain, &config()).await.unwrap();
        let target = Address::new([0x22; 20]);

        let receipt = registry.set_address("Bridge", target).await.unwrap();

        assert_eq!(receipt.block, 2);
        assert_eq!(
            chain.registered_address(registry.address(), "Bridge"),
            Some(target)
        );
    }
}
