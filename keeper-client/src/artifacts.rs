//! Compiled contract artifacts in Hardhat's JSON format.

use crate::error::{KeeperError, Result};
use alloy_primitives::{keccak256, Bytes, B256};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    #[serde(default)]
    pub abi: serde_json::Value,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    #[must_use]
    pub fn bytecode_hash(&self) -> B256 {
        keccak256(&self.bytecode)
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Load `<root>/<name>.json`, falling back to Hardhat's
    /// `<root>/contracts/<name>.sol/<name>.json` layout.
    pub fn load(&self, name: &str) -> Result<ContractArtifact> {
        let candidates = [
            self.root.join(format!("{name}.json")),
            self.root
                .join("contracts")
                .join(format!("{name}.sol"))
                .join(format!("{name}.json")),
        ];

        let path = candidates
            .iter()
            .find(|path| path.is_file())
            .ok_or_else(|| {
                KeeperError::Artifact(format!(
                    "No artifact for {name} under {}",
                    self.root.display()
                ))
            })?;

        debug!("Loading artifact {} from {}", name, path.display());
        let artifact: ContractArtifact = serde_json::from_slice(&std::fs::read(path)?)?;

        if artifact.bytecode.is_empty() {
            return Err(KeeperError::Artifact(format!(
                "{} has no bytecode; it cannot be deployed",
                artifact.contract_name
            )));
        }

        Ok(artifact)
    }
}
