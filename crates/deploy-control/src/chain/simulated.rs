//! In-memory chain for rehearsals and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use deploy_core::{
    Address, ChainError, ChainResult, ConstructorArg, DeployOverrides, SigningIdentity, TxHash,
    TxReceipt,
};
use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{ContractFactory, ContractHandle, FactoryResolver};
use crate::config::{SimulationConfig, DEFAULT_REGISTRY_ARTIFACT};
use crate::registry::SET_ADDRESS;

/// Lowest gas limit the simulated chain accepts for any transaction.
const INTRINSIC_GAS: u64 = 21_000;

/// Something that happened on the simulated chain, in mining order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    /// A contract was created.
    Deployed {
        /// Artifact name.
        artifact: String,
        /// New contract address.
        address: Address,
        /// Deploying account.
        sender: Address,
        /// Constructor arguments.
        args: Vec<ConstructorArg>,
        /// Overrides the transaction was sent with.
        overrides: DeployOverrides,
    },
    /// A method was called.
    Called {
        /// Artifact the caller believed it was calling.
        artifact: String,
        /// Target address.
        address: Address,
        /// Calling account.
        sender: Address,
        /// Method name.
        method: String,
        /// Call arguments.
        args: Vec<ConstructorArg>,
    },
}

#[derive(Debug, Default)]
struct Ledger {
    code: HashMap<Address, String>,
    nonces: HashMap<Address, u64>,
    registries: HashMap<Address, IndexMap<String, Address>>,
    block: u64,
    events: Vec<ChainEvent>,
}

impl Ledger {
    /// Consume the sender's next nonce and mine a block.
    fn transact(
        &mut self,
        sender: Address,
        overrides: &DeployOverrides,
    ) -> ChainResult<(u64, TxReceipt)> {
        let nonce = self.nonces.get(&sender).copied().unwrap_or(0);

        if let Some(requested) = overrides.nonce {
            if requested < nonce {
                return Err(ChainError::transport(format!(
                    "nonce too low: next nonce {nonce}, tx nonce {requested}"
                )));
            }
            if requested > nonce {
                return Err(ChainError::transport(format!(
                    "nonce too high: next nonce {nonce}, tx nonce {requested}"
                )));
            }
        }

        if let Some(gas_limit) = overrides.gas_limit {
            if gas_limit < INTRINSIC_GAS {
                return Err(ChainError::transport(format!(
                    "intrinsic gas too low: have {gas_limit}, want {INTRINSIC_GAS}"
                )));
            }
        }

        self.nonces.insert(sender, nonce + 1);
        self.block += 1;

        let receipt = TxReceipt {
            hash: TxHash::new(digest(b"tx", sender, nonce)),
            block: self.block,
        };
        Ok((nonce, receipt))
    }
}

fn digest(domain: &[u8], sender: Address, nonce: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(sender.as_bytes());
    hasher.update(nonce.to_be_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

#[derive(Debug, Default)]
struct ChainState {
    ledger: Mutex<Ledger>,
    registry_artifacts: DashSet<String>,
    known_artifacts: DashSet<String>,
    strict: AtomicBool,
    failing_deploys: DashMap<String, ChainError>,
    failing_calls: DashMap<(String, String), ChainError>,
}

/// Deterministic in-memory chain.
///
/// Contract addresses derive from the sender and its nonce, so the same
/// sequence of transactions always yields the same addresses. Instances of a
/// registry artifact keep a real name-to-address mapping that survives across
/// runs sharing this chain. Calls to addresses holding no code succeed without
/// effect, matching what a real chain does.
///
/// Clones share state.
#[derive(Debug, Clone)]
pub struct SimulatedChain {
    state: Arc<ChainState>,
}

impl Default for SimulatedChain {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedChain {
    /// Create a chain that treats `AddressManager` as the registry artifact
    /// and accepts any other artifact name.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry_artifact(DEFAULT_REGISTRY_ARTIFACT)
    }

    /// Create a chain with a custom registry artifact name.
    #[must_use]
    pub fn with_registry_artifact(name: impl Into<String>) -> Self {
        let state = ChainState::default();
        state.registry_artifacts.insert(name.into());
        Self {
            state: Arc::new(state),
        }
    }

    /// Create a chain that only resolves the listed artifacts (plus the
    /// default registry artifact).
    #[must_use]
    pub fn strict<I, S>(artifacts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chain = Self::new();
        chain.state.strict.store(true, Ordering::SeqCst);
        for artifact in artifacts {
            chain.state.known_artifacts.insert(artifact.into());
        }
        chain
    }

    /// Create a chain with failure injection from configuration.
    #[must_use]
    pub fn from_config(config: &SimulationConfig, registry_artifact: &str) -> Self {
        let chain = Self::with_registry_artifact(registry_artifact);
        for artifact in &config.failing_artifacts {
            chain.fail_deploy(artifact, ChainError::reverted("simulated deployment failure"));
        }
        for call in &config.failing_calls {
            chain.fail_call(
                &call.artifact,
                &call.method,
                ChainError::reverted(call.reason.clone()),
            );
        }
        chain
    }

    /// Make every deployment of `artifact` fail with `error`.
    pub fn fail_deploy(&self, artifact: &str, error: ChainError) {
        self.state
            .failing_deploys
            .insert(artifact.to_owned(), error);
    }

    /// Make every call of `method` on `artifact` fail with `error`.
    pub fn fail_call(&self, artifact: &str, method: &str, error: ChainError) {
        self.state
            .failing_calls
            .insert((artifact.to_owned(), method.to_owned()), error);
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.state.failing_deploys.clear();
        self.state.failing_calls.clear();
    }

    /// All events so far, in mining order.
    #[must_use]
    pub fn events(&self) -> Vec<ChainEvent> {
        self.ledger().events.clone()
    }

    /// Artifacts deployed so far, in mining order.
    #[must_use]
    pub fn deployments(&self) -> Vec<(String, Address)> {
        self.ledger()
            .events
            .iter()
            .filter_map(|event| match event {
                ChainEvent::Deployed {
                    artifact, address, ..
                } => Some((artifact.clone(), *address)),
                ChainEvent::Called { .. } => None,
            })
            .collect()
    }

    /// Number of deployments of `artifact` so far.
    #[must_use]
    pub fn deploy_count(&self, artifact: &str) -> usize {
        self.deployments()
            .iter()
            .filter(|(name, _)| name == artifact)
            .count()
    }

    /// Arguments of every call to `method`, in mining order.
    #[must_use]
    pub fn calls_to(&self, method: &str) -> Vec<Vec<ConstructorArg>> {
        self.ledger()
            .events
            .iter()
            .filter_map(|event| match event {
                ChainEvent::Called {
                    method: called,
                    args,
                    ..
                } if called == method => Some(args.clone()),
                _ => None,
            })
            .collect()
    }

    /// Artifact deployed at `address`, if any.
    #[must_use]
    pub fn code_at(&self, address: Address) -> Option<String> {
        self.ledger().code.get(&address).cloned()
    }

    /// Name-to-address mapping held by the registry at `registry`.
    #[must_use]
    pub fn registry_entries(&self, registry: Address) -> Vec<(String, Address)> {
        self.ledger()
            .registries
            .get(&registry)
            .map(|entries| entries.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default()
    }

    /// Address registered under `name` in the registry at `registry`.
    #[must_use]
    pub fn registered_address(&self, registry: Address, name: &str) -> Option<Address> {
        self.ledger()
            .registries
            .get(&registry)
            .and_then(|entries| entries.get(name).copied())
    }

    /// Next nonce of `account`.
    #[must_use]
    pub fn nonce(&self, account: Address) -> u64 {
        self.ledger().nonces.get(&account).copied().unwrap_or(0)
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.state
            .ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn is_registry_artifact(&self, artifact: &str) -> bool {
        self.state.registry_artifacts.contains(artifact)
    }

    fn deploy_artifact(
        &self,
        artifact: &str,
        sender: Address,
        args: &[ConstructorArg],
        overrides: &DeployOverrides,
    ) -> ChainResult<Address> {
        if let Some(error) = self.state.failing_deploys.get(artifact) {
            return Err(error.value().clone());
        }

        let mut ledger = self.ledger();
        let (nonce, receipt) = ledger.transact(sender, overrides)?;
        let address = Address::from_digest(&digest(b"create", sender, nonce));

        ledger.code.insert(address, artifact.to_owned());
        if self.is_registry_artifact(artifact) {
            ledger.registries.insert(address, IndexMap::new());
        }
        ledger.events.push(ChainEvent::Deployed {
            artifact: artifact.to_owned(),
            address,
            sender,
            args: args.to_vec(),
            overrides: *overrides,
        });

        debug!(
            artifact = %artifact,
            address = %address,
            tx = %receipt.hash,
            block = receipt.block,
            "simulated deployment mined"
        );

        Ok(address)
    }

    fn call_contract(
        &self,
        artifact: &str,
        address: Address,
        sender: Address,
        method: &str,
        args: &[ConstructorArg],
    ) -> ChainResult<TxReceipt> {
        if let Some(error) = self
            .state
            .failing_calls
            .get(&(artifact.to_owned(), method.to_owned()))
        {
            return Err(error.value().clone());
        }

        let mut ledger = self.ledger();

        let registry_write = match ledger.code.get(&address) {
            Some(code) if self.is_registry_artifact(code) => {
                if method != SET_ADDRESS {
                    return Err(ChainError::UnknownMethod {
                        artifact: code.clone(),
                        method: method.to_owned(),
                    });
                }
                match args {
                    [ConstructorArg::String(name), ConstructorArg::Address(target)] => {
                        Some((name.clone(), *target))
                    }
                    _ => return Err(ChainError::reverted("invalid setAddress arguments")),
                }
            }
            _ => None,
        };

        let (_, receipt) = ledger.transact(sender, &DeployOverrides::default())?;

        if let Some((name, target)) = registry_write {
            ledger
                .registries
                .entry(address)
                .or_default()
                .insert(name, target);
        }
        ledger.events.push(ChainEvent::Called {
            artifact: artifact.to_owned(),
            address,
            sender,
            method: method.to_owned(),
            args: args.to_vec(),
        });

        Ok(receipt)
    }
}

impl FactoryResolver for SimulatedChain {
    fn resolve(
        &self,
        artifact: &str,
        signer: &SigningIdentity,
    ) -> ChainResult<Arc<dyn ContractFactory>> {
        if self.state.strict.load(Ordering::SeqCst)
            && !self.state.known_artifacts.contains(artifact)
            && !self.is_registry_artifact(artifact)
        {
            return Err(ChainError::UnknownArtifact(artifact.to_owned()));
        }

        Ok(Arc::new(SimulatedFactory {
            artifact: artifact.to_owned(),
            signer: signer.address,
            chain: self.clone(),
        }))
    }
}

#[derive(Debug)]
struct SimulatedFactory {
    artifact: String,
    signer: Address,
    chain: SimulatedChain,
}

#[async_trait]
impl ContractFactory for SimulatedFactory {
    fn artifact(&self) -> &str {
        &self.artifact
    }

    fn attach(&self, address: Address) -> Arc<dyn ContractHandle> {
        Arc::new(SimulatedContract {
            artifact: self.artifact.clone(),
            address,
            signer: self.signer,
            chain: self.chain.clone(),
        })
    }

    async fn deploy(
        &self,
        args: &[ConstructorArg],
        overrides: &DeployOverrides,
    ) -> ChainResult<Arc<dyn ContractHandle>> {
        let address = self
            .chain
            .deploy_artifact(&self.artifact, self.signer, args, overrides)?;
        Ok(self.attach(address))
    }
}

#[derive(Debug)]
struct SimulatedContract {
    artifact: String,
    address: Address,
    signer: Address,
    chain: SimulatedChain,
}

#[async_trait]
impl ContractHandle for SimulatedContract {
    fn artifact(&self) -> &str {
        &self.artifact
    }

    fn address(&self) -> Address {
        self.address
    }

    async fn call(&self, method: &str, args: &[ConstructorArg]) -> ChainResult<TxReceipt> {
        self.chain
            .call_contract(&self.artifact, self.address, self.signer, method, args)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::FailingCall;

    fn signer() -> SigningIdentity {
        SigningIdentity::new(Address::new([0xaa; 20]))
    }

    #[tokio::test]
    async fn addresses_are_deterministic() {
        let first = SimulatedChain::new();
        let second = SimulatedChain::new();

        let a = first.resolve("Token", &signer()).unwrap();
        let b = second.resolve("Token", &signer()).unwrap();

        let a = a.deploy(&[], &DeployOverrides::default()).await.unwrap();
        let b = b.deploy(&[], &DeployOverrides::default()).await.unwrap();

        assert_eq!(a.address(), b.address());
        assert_eq!(first.nonce(signer().address), 1);
    }

    #[tokio::test]
    async fn successive_deployments_get_distinct_addresses() {
        let chain = SimulatedChain::new();
        let factory = chain.resolve("Token", &signer()).unwrap();

        let a = factory.deploy(&[], &DeployOverrides::default()).await.unwrap();
        let b = factory.deploy(&[], &DeployOverrides::default()).await.unwrap();

        assert_ne!(a.address(), b.address());
        assert_eq!(chain.deploy_count("Token"), 2);
        assert_eq!(chain.code_at(a.address()).as_deref(), Some("Token"));
    }

    #[tokio::test]
    async fn registry_stores_set_address() {
        let chain = SimulatedChain::new();
        let registry = chain
            .resolve("AddressManager", &signer())
            .unwrap()
            .deploy(&[], &DeployOverrides::default())
            .await
            .unwrap();
        let target = Address::new([3; 20]);

        registry
            .call(SET_ADDRESS, &["Bridge".into(), target.into()])
            .await
            .unwrap();

        assert_eq!(
            chain.registered_address(registry.address(), "Bridge"),
            Some(target)
        );
        assert_eq!(
            chain.registry_entries(registry.address()),
            vec![("Bridge".to_owned(), target)]
        );
    }

    #[tokio::test]
    async fn registry_rejects_malformed_calls() {
        let chain = SimulatedChain::new();
        let registry = chain
            .resolve("AddressManager", &signer())
            .unwrap()
            .deploy(&[], &DeployOverrides::default())
            .await
            .unwrap();

        let err = registry.call(SET_ADDRESS, &["Bridge".into()]).await.unwrap_err();
        assert!(matches!(err, ChainError::Reverted { .. }));

        let err = registry.call("getAddress", &[]).await.unwrap_err();
        assert!(matches!(err, ChainError::UnknownMethod { .. }));
    }

    #[tokio::test]
    async fn call_to_empty_address_succeeds_without_effect() {
        let chain = SimulatedChain::new();
        let nowhere = Address::new([9; 20]);
        let registry = chain
            .resolve("AddressManager", &signer())
            .unwrap()
            .attach(nowhere);

        registry
            .call(SET_ADDRESS, &["Bridge".into(), Address::new([1; 20]).into()])
            .await
            .unwrap();

        assert!(chain.registry_entries(nowhere).is_empty());
        assert_eq!(chain.calls_to(SET_ADDRESS).len(), 1);
    }

    #[tokio::test]
    async fn injected_failures() {
        let chain = SimulatedChain::from_config(
            &SimulationConfig {
                failing_artifacts: vec!["Token".to_owned()],
                failing_calls: vec![FailingCall {
                    artifact: "Vault".to_owned(),
                    method: "init".to_owned(),
                    reason: "paused".to_owned(),
                }],
            },
            "AddressManager",
        );

        let err = chain
            .resolve("Token", &signer())
            .unwrap()
            .deploy(&[], &DeployOverrides::default())
            .await
            .unwrap_err();
        assert_eq!(err, ChainError::reverted("simulated deployment failure"));

        let vault = chain
            .resolve("Vault", &signer())
            .unwrap()
            .deploy(&[], &DeployOverrides::default())
            .await
            .unwrap();
        assert_eq!(
            vault.call("init", &[]).await.unwrap_err(),
            ChainError::reverted("paused")
        );

        chain.clear_failures();
        vault.call("init", &[]).await.unwrap();
    }

    #[tokio::test]
    async fn nonce_and_gas_overrides_are_checked() {
        let chain = SimulatedChain::new();
        let factory = chain.resolve("Token", &signer()).unwrap();

        factory
            .deploy(&[], &DeployOverrides::new().with_nonce(0))
            .await
            .unwrap();

        let err = factory
            .deploy(&[], &DeployOverrides::new().with_nonce(0))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nonce too low"));

        let err = factory
            .deploy(&[], &DeployOverrides::new().with_gas_limit(100))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("intrinsic gas too low"));
    }

    #[test]
    fn strict_chain_rejects_unknown_artifacts() {
        let chain = SimulatedChain::strict(["Token"]);

        assert!(chain.resolve("Token", &signer()).is_ok());
        assert!(chain.resolve("AddressManager", &signer()).is_ok());
        assert!(matches!(
            chain.resolve("Vault", &signer()).unwrap_err(),
            ChainError::UnknownArtifact(name) if name == "Vault"
        ));
    }
}
