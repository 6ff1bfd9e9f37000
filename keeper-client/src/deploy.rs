//! Tagged deployment steps.
//!
//! A step publishes one contract whose constructor takes the addresses of
//! earlier deployments, in the order listed in [`DeployScript::dependencies`].
//! Dependencies are resolved from the registry before anything is sent; a
//! missing one aborts the run.

use crate::{
    artifacts::ArtifactStore,
    contracts::{COUNTER, KEEPER_SIMULATION},
    deployments::{DeploymentRecord, DeploymentRegistry},
    error::Result,
    networks,
    types::DeployedContract,
};
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolValue;
use serde::Serialize;
use std::future::Future;
use tracing::{info, warn};

/// The ledger side of a deployment.
pub trait ContractDeployer {
    fn chain_id(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Account that signs deployment transactions.
    fn deployer_address(&self) -> Result<Address>;

    /// Submit a contract creation transaction and wait until the new address is known.
    fn deploy(&self, init_code: Bytes) -> impl Future<Output = Result<DeployedContract>> + Send;
}

/// Command to suggest once a contract is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowUp {
    pub description: &'static str,
    pub command: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployScript {
    /// Registry record written by this step.
    pub name: &'static str,
    pub artifact: &'static str,
    pub tags: &'static [&'static str],
    /// Records whose addresses are passed to the constructor.
    pub dependencies: &'static [&'static str],
    pub follow_up: Option<FollowUp>,
}

impl DeployScript {
    /// An empty tag list selects every script.
    #[must_use]
    pub fn matches(&self, tags: &[String]) -> bool {
        tags.is_empty() || tags.iter().any(|tag| self.tags.contains(&tag.as_str()))
    }
}

pub const KEEPER_SIMULATION_SCRIPT: DeployScript = DeployScript {
    name: KEEPER_SIMULATION,
    artifact: KEEPER_SIMULATION,
    tags: &["all", "keepers"],
    dependencies: &[COUNTER],
    follow_up: Some(FollowUp {
        description: "Keeper simulation",
        command: "keeper-test",
    }),
};

pub const SCRIPTS: &[DeployScript] = &[KEEPER_SIMULATION_SCRIPT];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployOutcome {
    pub name: String,
    pub record: DeploymentRecord,
    /// `false` when an identical earlier deployment was reused.
    pub newly_deployed: bool,
    /// Network table name for the node's chain id, or the configured name when
    /// the chain is not in the table. A `hardhat` network (31337) therefore
    /// shows as `localhost` here while its records live under `hardhat/`.
    pub network: String,
    #[serde(skip)]
    pub follow_up: Option<FollowUp>,
}

impl DeployOutcome {
    /// Instructions for exercising the deployed contract, if the step has any.
    #[must_use]
    pub fn usage_hint(&self) -> Option<String> {
        self.follow_up.map(|follow_up| {
            format!(
                "Run {} contract with following command:\nkeeper {} --contract {} --network {}",
                follow_up.description, follow_up.command, self.record.address, self.network
            )
        })
    }
}

/// Constructor bytecode followed by the ABI-encoded address arguments.
#[must_use]
pub fn init_code(bytecode: &Bytes, args: &[Address]) -> Bytes {
    let mut code = bytecode.to_vec();
    for arg in args {
        code.extend_from_slice(&arg.abi_encode());
    }
    Bytes::from(code)
}

pub struct Deployer<'a, D> {
    ledger: &'a D,
    registry: &'a DeploymentRegistry,
    artifacts: &'a ArtifactStore,
    scripts: &'a [DeployScript],
}

impl<'a, D: ContractDeployer> Deployer<'a, D> {
    pub fn new(
        ledger: &'a D,
        registry: &'a DeploymentRegistry,
        artifacts: &'a ArtifactStore,
    ) -> Self {
        Self {
            ledger,
            registry,
            artifacts,
            scripts: SCRIPTS,
        }
    }

    #[must_use]
    pub fn with_scripts(mut self, scripts: &'a [DeployScript]) -> Self {
        self.scripts = scripts;
        self
    }

    /// Run every script matching `tags`, in declaration order.
    pub async fn run(&self, tags: &[String]) -> Result<Vec<DeployOutcome>> {
        let selected: Vec<&DeployScript> = self
            .scripts
            .iter()
            .filter(|script| script.matches(tags))
            .collect();

        if selected.is_empty() {
            warn!("No deploy scripts match tags {:?}", tags);
            return Ok(Vec::new());
        }

        let chain_id = self.ledger.chain_id().await?;
        let network = networks::network_name(chain_id)
            .map_or_else(|| self.registry.network().to_string(), str::to_string);
        info!("Deploying to {} (chain {})", network, chain_id);

        let mut outcomes = Vec::with_capacity(selected.len());
        for script in selected {
            outcomes.push(self.run_script(script, &network).await?);
        }
        Ok(outcomes)
    }

    async fn run_script(&self, script: &DeployScript, network: &str) -> Result<DeployOutcome> {
        let args = script
            .dependencies
            .iter()
            .map(|dependency| self.registry.get(dependency).map(|record| record.address))
            .collect::<Result<Vec<_>>>()?;

        let artifact = self.artifacts.load(script.artifact)?;
        let bytecode_hash = artifact.bytecode_hash();

        if let Some(existing) = self.registry.find(script.name)? {
            if existing.args == args && existing.bytecode_hash == Some(bytecode_hash) {
                info!("reusing \"{}\" at {}", script.name, existing.address);
                return Ok(outcome(script, existing, false, network));
            }
        }

        let deployer = self.ledger.deployer_address()?;
        info!(
            "deploying \"{}\" from {} with args {:?}",
            script.name, deployer, args
        );

        let deployed = self
            .ledger
            .deploy(init_code(&artifact.bytecode, &args))
            .await?;
        info!(
            "deployed \"{}\" at {} (tx: {})",
            script.name, deployed.address, deployed.transaction_hash
        );

        let record = DeploymentRecord {
            address: deployed.address,
            transaction_hash: Some(deployed.transaction_hash),
            args,
            deployer: Some(deployer),
            block_number: deployed.block_number,
            bytecode_hash: Some(bytecode_hash),
            abi: artifact.abi,
        };
        self.registry.save(script.name, &record)?;

        Ok(outcome(script, record, true, network))
    }
}

fn outcome(
    script: &DeployScript,
    record: DeploymentRecord,
    newly_deployed: bool,
    network: &str,
) -> DeployOutcome {
    DeployOutcome {
        name: script.name.to_string(),
        record,
        newly_deployed,
        network: network.to_string(),
        follow_up: script.follow_up,
    }
}
