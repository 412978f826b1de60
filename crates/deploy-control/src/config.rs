//! Configuration for deploy-control.

use std::path::Path;

use deploy_core::{Address, ConstructorArg, DeployOverrides, SigningIdentity};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::error::{DeployError, DeployResult};
use crate::policy::RegistrationFailurePolicy;

/// Artifact name the address manager is resolved under by default.
pub const DEFAULT_REGISTRY_ARTIFACT: &str = "AddressManager";

/// Top-level configuration file layout.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DeployerConfig {
    /// Settings for a single orchestration run.
    #[serde(default)]
    pub deploy: DeployConfig,

    /// Declarative deployment plan.
    #[serde(default)]
    pub plan: PlanConfig,

    /// Failure injection for the simulated chain.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl DeployerConfig {
    /// Load configuration from the default sources.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `deploy.toml` in the current directory (if present)
    /// 3. Environment variables with `DEPLOYER_` prefix
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Config`] if a source holds an unknown key or a
    /// value of the wrong type.
    pub fn load() -> DeployResult<Self> {
        Self::from_figment(Figment::new().merge(Toml::file("deploy.toml")))
    }

    /// Load configuration from a specific TOML file.
    ///
    /// `DEPLOYER_` environment variables still override the file.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Config`] if the file or the environment holds an
    /// unknown key or a value of the wrong type.
    pub fn from_file(path: impl AsRef<Path>) -> DeployResult<Self> {
        Self::from_figment(Figment::new().merge(Toml::file(path.as_ref())))
    }

    fn from_figment(figment: Figment) -> DeployResult<Self> {
        figment
            .merge(Env::prefixed("DEPLOYER_").split("__"))
            .extract()
            .map_err(|e| DeployError::config(e.to_string()))
    }
}

/// Inputs of one orchestration run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployConfig {
    /// Existing address manager to attach to. A new one is deployed when absent.
    #[serde(default)]
    pub registry: Option<Address>,

    /// Account that signs every transaction of the run.
    #[serde(default)]
    pub signer: SigningIdentity,

    /// Allow-list of plan entries. Every entry is processed when absent.
    #[serde(default)]
    pub dependencies: Option<Vec<String>>,

    /// Transaction overrides passed to every artifact deployment.
    #[serde(default)]
    pub overrides: DeployOverrides,

    /// Artifact name of the address manager.
    #[serde(default = "default_registry_artifact")]
    pub registry_artifact: String,

    /// Handling of `setAddress` failures.
    #[serde(default)]
    pub registration_failure: RegistrationFailurePolicy,
}

fn default_registry_artifact() -> String {
    DEFAULT_REGISTRY_ARTIFACT.to_owned()
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self::new(SigningIdentity::default())
    }
}

impl DeployConfig {
    /// Create a run configuration for a signer with every other setting at its default.
    #[must_use]
    pub fn new(signer: SigningIdentity) -> Self {
        Self {
            registry: None,
            signer,
            dependencies: None,
            overrides: DeployOverrides::default(),
            registry_artifact: default_registry_artifact(),
            registration_failure: RegistrationFailurePolicy::default(),
        }
    }

    /// Attach to an existing address manager.
    #[must_use]
    pub const fn with_registry(mut self, registry: Address) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Restrict the run to the named entries.
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Set transaction overrides.
    #[must_use]
    pub const fn with_overrides(mut self, overrides: DeployOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Set the registration failure policy.
    #[must_use]
    pub const fn with_registration_failure(mut self, policy: RegistrationFailurePolicy) -> Self {
        self.registration_failure = policy;
        self
    }
}

/// Ordered list of artifacts to deploy.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PlanConfig {
    /// Entries in deployment order.
    #[serde(default)]
    pub artifacts: Vec<ArtifactSpec>,
}

/// One entry of a declarative plan.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactSpec {
    /// Name the deployed instance is registered under.
    pub name: String,

    /// Factory to deploy with. Defaults to `name`.
    #[serde(default)]
    pub artifact: Option<String>,

    /// Constructor arguments.
    #[serde(default)]
    pub args: Vec<PlanArg>,

    /// Calls made once every entry has been deployed.
    #[serde(default)]
    pub after_deploy: Vec<HookCall>,
}

impl ArtifactSpec {
    /// Factory name this entry deploys with.
    #[must_use]
    pub fn factory_name(&self) -> &str {
        self.artifact.as_deref().unwrap_or(&self.name)
    }
}

/// A constructor argument as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PlanArg {
    /// A value supplied by the run, e.g. `{ ref = "registry" }`.
    Reference {
        /// Name of the referenced value.
        #[serde(rename = "ref")]
        reference: String,
    },
    /// A literal value.
    Literal(ConstructorArg),
}

/// A method call made by an after-deploy hook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookCall {
    /// Contract to call. Defaults to the entry that declares the hook.
    #[serde(default)]
    pub contract: Option<String>,

    /// Method name.
    pub method: String,

    /// Call arguments.
    #[serde(default)]
    pub args: Vec<HookArg>,
}

/// A hook call argument as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum HookArg {
    /// Address of a contract deployed in this run, e.g. `{ contract = "Bridge" }`.
    Contract {
        /// Plan entry name.
        contract: String,
    },
    /// A literal value.
    Literal(ConstructorArg),
}

/// Failure injection for rehearsal runs.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Artifacts whose deployment reverts.
    #[serde(default)]
    pub failing_artifacts: Vec<String>,

    /// Calls that revert.
    #[serde(default)]
    pub failing_calls: Vec<FailingCall>,
}

/// A call the simulated chain reverts.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FailingCall {
    /// Artifact the call targets.
    pub artifact: String,

    /// Method name.
    pub method: String,

    /// Revert reason.
    #[serde(default = "default_revert_reason")]
    pub reason: String,
}

fn default_revert_reason() -> String {
    "simulated revert".to_owned()
}
