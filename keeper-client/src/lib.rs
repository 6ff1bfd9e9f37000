#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

pub mod artifacts;
pub mod client;
pub mod config;
pub mod contracts;
pub mod deploy;
pub mod deployments;
pub mod error;
pub mod keeper;
pub mod networks;
pub mod types;

pub use artifacts::{ArtifactStore, ContractArtifact};
pub use client::{CounterContract, KeeperClient, SimulationContract};
pub use config::{Config, ConfirmationConfig, NetworkConfig, PathsConfig, SignerConfig};
pub use deploy::{ContractDeployer, DeployOutcome, DeployScript, Deployer};
pub use deployments::{DeploymentRecord, DeploymentRegistry};
pub use error::{KeeperError, Result};
pub use keeper::{
    current_timestamp, encode_timestamp, run_keeper_simulation, run_keeper_test, SimulationTarget,
    UpkeepTarget,
};
pub use types::*;
