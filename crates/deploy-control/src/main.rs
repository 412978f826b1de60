//! Deployment rehearsal binary.
//!
//! Runs a configured plan against the simulated chain and prints the result.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use deploy_control::{ConfigPlanBuilder, DeployConfig, Deployer, DeployerConfig, SimulatedChain};

#[derive(Parser)]
#[command(name = "deploy-control")]
#[command(about = "Rehearse a contract deployment plan against a simulated chain")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to deploy.toml in the current directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only process these plan entries (repeatable, overrides the configured list)
    #[arg(long = "only", value_name = "NAME")]
    only: Vec<String>,
}

impl Cli {
    /// Run configuration with `--only` applied. A non-empty `--only` replaces
    /// the configured allow-list.
    fn deploy_config(&self, config: &DeployerConfig) -> DeployConfig {
        let mut deploy = config.deploy.clone();
        if !self.only.is_empty() {
            deploy.dependencies = Some(self.only.clone());
        }
        deploy
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("deploy_control=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DeployerConfig::from_file(path)?,
        None => DeployerConfig::load()?,
    };

    let deploy = cli.deploy_config(&config);

    info!(
        entries = config.plan.artifacts.len(),
        registry = ?deploy.registry,
        "configuration loaded"
    );

    let chain = Arc::new(SimulatedChain::from_config(
        &config.simulation,
        &deploy.registry_artifact,
    ));
    let planner = Arc::new(ConfigPlanBuilder::new(chain.clone(), config.plan));
    let deployer = Deployer::new(chain, planner);

    let result = deployer.deploy(&deploy).await?;
    if !result.is_complete() {
        warn!(
            failed = ?result.failed_deployments,
            "some artifacts failed to deploy"
        );
    }

    println!("{}", serde_json::to_string_pretty(&result.summary())?);

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn configured() -> DeployerConfig {
        let mut config = DeployerConfig::default();
        config.deploy.dependencies = Some(vec!["Lib_AddressResolver".to_owned()]);
        config
    }

    #[test]
    fn only_replaces_configured_allow_list() {
        let cli = Cli::try_parse_from([
            "deploy-control",
            "--only",
            "OVM_StateCommitmentChain",
            "--only",
            "OVM_ChainStorageContainer",
        ])
        .unwrap();

        let deploy = cli.deploy_config(&configured());

        assert_eq!(
            deploy.dependencies,
            Some(vec![
                "OVM_StateCommitmentChain".to_owned(),
                "OVM_ChainStorageContainer".to_owned()
            ])
        );
    }

    #[test]
    fn configured_allow_list_kept_without_only() {
        let cli = Cli::try_parse_from(["deploy-control", "--config", "demos/deploy.toml"]).unwrap();

        let deploy = cli.deploy_config(&configured());

        assert_eq!(
            cli.config.as_deref(),
            Some(std::path::Path::new("demos/deploy.toml"))
        );
        assert_eq!(
            deploy.dependencies,
            Some(vec!["Lib_AddressResolver".to_owned()])
        );
    }

    #[test]
    fn no_allow_list_anywhere_means_whole_plan() {
        let cli = Cli::try_parse_from(["deploy-control"]).unwrap();

        let deploy = cli.deploy_config(&DeployerConfig::default());

        assert_eq!(deploy.dependencies, None);
    }
}
