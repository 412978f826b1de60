//! Chain-facing collaborators.
//!
//! The orchestrator never talks to a node directly. It resolves a
//! [`ContractFactory`] per artifact name through a [`FactoryResolver`], deploys
//! or attaches with it, and receives [`ContractHandle`]s back. Transports,
//! signing and bytecode live behind these traits.
//!
//! [`SimulatedChain`] is an in-memory implementation used for rehearsals and
//! tests.

mod simulated;

pub use simulated::{ChainEvent, SimulatedChain};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use deploy_core::{Address, ChainResult, ConstructorArg, DeployOverrides, SigningIdentity, TxReceipt};

/// A live deployed contract.
#[async_trait]
pub trait ContractHandle: Send + Sync + fmt::Debug {
    /// Artifact this instance was created from.
    fn artifact(&self) -> &str;

    /// On-chain address.
    fn address(&self) -> Address;

    /// Send a state-changing call and wait for it to be mined.
    ///
    /// # Errors
    ///
    /// Returns a [`ChainError`](deploy_core::ChainError) if the call reverts
    /// or the transport fails.
    async fn call(&self, method: &str, args: &[ConstructorArg]) -> ChainResult<TxReceipt>;
}

/// Knows how to create or attach to instances of one artifact.
#[async_trait]
pub trait ContractFactory: Send + Sync + fmt::Debug {
    /// Artifact name.
    fn artifact(&self) -> &str;

    /// Bind to an existing instance. Sends no transaction and performs no
    /// check that the address really holds this artifact.
    fn attach(&self, address: Address) -> Arc<dyn ContractHandle>;

    /// Deploy a new instance and wait for the deployment to be mined.
    ///
    /// # Errors
    ///
    /// Returns a [`ChainError`](deploy_core::ChainError) if the deployment
    /// reverts, the sender cannot pay, or the transport fails.
    async fn deploy(
        &self,
        args: &[ConstructorArg],
        overrides: &DeployOverrides,
    ) -> ChainResult<Arc<dyn ContractHandle>>;
}

/// Maps artifact names to factories bound to a signer.
pub trait FactoryResolver: Send + Sync {
    /// Resolve the factory for `artifact`, signing as `signer`.
    ///
    /// # Errors
    ///
    /// Returns [`deploy_core::ChainError::UnknownArtifact`] if the artifact
    /// has no factory.
    fn resolve(
        &self,
        artifact: &str,
        signer: &SigningIdentity,
    ) -> ChainResult<Arc<dyn ContractFactory>>;
}
