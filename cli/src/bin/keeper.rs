//! Task runner for the keeper simulation contracts.
//!
//! Usage examples:
//! ```shell
//! # Record an existing Counter deployment, then deploy KeeperSimulation against it
//! keeper deployments register --name Counter --address 0x5FbDB2315678afecb367f032d93F642f64180aa3
//! keeper deploy --tags keepers
//!
//! # Act as a keeper against the Counter contract
//! keeper keeper-simulation --contract 0x5FbDB2315678afecb367f032d93F642f64180aa3 --network localhost
//!
//! # Drive the KeeperSimulation wrapper
//! keeper keeper-test --contract 0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512 --network localhost
//! ```

use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use keeper_client::{
    current_timestamp, run_keeper_simulation, run_keeper_test, ArtifactStore, Config, Deployer,
    DeploymentRegistry, KeeperClient,
};
use std::{collections::HashMap, env, str::FromStr};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "keeper")]
#[command(about = "Deploy and exercise keeper simulation contracts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Network name; selects the deployments directory and the default RPC endpoint
    #[arg(long, global = true)]
    network: Option<String>,

    /// JSON-RPC endpoint of the node
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Wait for receipts instead of reporting transactions as soon as they are submitted
    #[arg(long, global = true)]
    wait_for_confirmation: bool,

    /// Seconds to wait for a receipt
    #[arg(long, global = true)]
    confirmation_timeout: Option<u64>,

    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the deployment scripts matching the given tags
    Deploy {
        /// Comma-separated tags; all scripts run when omitted
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Keeper simulator calls checkUpkeep on a Counter contract and performs upkeep when due
    KeeperSimulation {
        /// Address of the Counter contract
        #[arg(long)]
        contract: Address,
    },
    /// Call checkUpkeep on a KeeperSimulation contract and print its upkeep status
    KeeperTest {
        /// Address of the KeeperSimulation contract
        #[arg(long)]
        contract: Address,
    },
    /// Inspect or seed the deployment registry
    Deployments {
        #[command(subcommand)]
        command: DeploymentsCommand,
    },
}

#[derive(Subcommand)]
enum DeploymentsCommand {
    /// List deployments recorded for the network
    List,
    /// Record a contract deployed outside this tool
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: Address,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = Cli::parse();

    let log_level = LevelFilter::from_str(&cli.log_level).unwrap_or(LevelFilter::INFO);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(&cli)?;
    info!("Loaded configuration for network: {}", config.network.name);

    match cli.command {
        Commands::Deploy { tags } => deploy(config, &tags).await?,
        Commands::KeeperSimulation { contract } => keeper_simulation(config, contract).await?,
        Commands::KeeperTest { contract } => keeper_test(config, contract).await?,
        Commands::Deployments { command } => deployments(&config, command)?,
    }

    Ok(())
}

/// Command-line flags take precedence over the environment.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut overrides: HashMap<&str, String> = HashMap::new();
    if let Some(network) = &cli.network {
        overrides.insert("ETHEREUM_NETWORK", network.clone());
    }
    if let Some(rpc_url) = &cli.rpc_url {
        overrides.insert("ETHEREUM_RPC_URL", rpc_url.clone());
    }
    if cli.wait_for_confirmation {
        overrides.insert("WAIT_FOR_CONFIRMATION", "true".to_string());
    }
    if let Some(timeout) = cli.confirmation_timeout {
        overrides.insert("CONFIRMATION_TIMEOUT_SECONDS", timeout.to_string());
    }

    if overrides.is_empty() {
        return Ok(Config::from_env()?);
    }

    Ok(Config::from_lookup(|key| {
        overrides.get(key).cloned().or_else(|| env::var(key).ok())
    })?)
}

fn registry(config: &Config) -> DeploymentRegistry {
    DeploymentRegistry::new(
        config.paths.deployments_dir.clone(),
        config.network.name.clone(),
        config.network.chain_id,
    )
}

async fn deploy(config: Config, tags: &[String]) -> Result<()> {
    let registry = registry(&config);
    let artifacts = ArtifactStore::new(config.paths.artifacts_dir.clone());
    let client = KeeperClient::new(config)?;

    let outcomes = Deployer::new(&client, &registry, &artifacts).run(tags).await?;
    if outcomes.is_empty() {
        println!("No deploy scripts matched tags {tags:?}");
    }

    for outcome in outcomes {
        if outcome.newly_deployed {
            println!(
                "deployed \"{}\" at {} (tx: {})",
                outcome.name,
                outcome.record.address,
                outcome
                    .record
                    .transaction_hash
                    .map_or_else(|| "unknown".to_string(), |hash| hash.to_string())
            );
        } else {
            println!("reusing \"{}\" at {}", outcome.name, outcome.record.address);
        }

        if let Some(hint) = outcome.usage_hint() {
            println!("{hint}");
        }
        println!("----------------------------------------------------");
    }

    Ok(())
}

async fn keeper_simulation(config: Config, contract: Address) -> Result<()> {
    let network = config.network.name.clone();
    let client = KeeperClient::new(config)?;

    println!("Calling Counter contract simulating a Keeper call {contract} on network {network}");
    run_keeper_simulation(&client.counter(contract), current_timestamp(), |line| {
        println!("{line}");
    })
    .await?;

    Ok(())
}

async fn keeper_test(config: Config, contract: Address) -> Result<()> {
    let network = config.network.name.clone();
    let client = KeeperClient::new(config)?;

    println!("Calling Keeper simulator contract {contract} on network {network}");
    run_keeper_test(&client.keeper_simulation(contract), |line| println!("{line}")).await?;

    Ok(())
}

fn deployments(config: &Config, command: DeploymentsCommand) -> Result<()> {
    let registry = registry(config);

    match command {
        DeploymentsCommand::List => {
            let records = registry.list()?;
            if records.is_empty() {
                println!("No deployments recorded for network {}", registry.network());
            }
            for (name, record) in records {
                println!("{name}: {}", record.address);
                if let Some(hash) = record.transaction_hash {
                    println!("  Transaction hash: {hash}");
                }
                if !record.args.is_empty() {
                    println!("  Args: {:?}", record.args);
                }
            }
        }
        DeploymentsCommand::Register { name, address } => {
            registry.register(&name, address)?;
            println!("Registered {name} at {address} on network {}", registry.network());
        }
    }

    Ok(())
}
