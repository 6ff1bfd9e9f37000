//! Named deployment records, one JSON file per contract and network:
//! `<root>/<network>/<Name>.json`.

use crate::error::{KeeperError, Result};
use alloy_primitives::{Address, TxHash, B256};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<TxHash>,
    /// Constructor arguments, in order.
    #[serde(default)]
    pub args: Vec<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployer: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub abi: serde_json::Value,
}

impl DeploymentRecord {
    /// A record for a contract published outside this tool.
    #[must_use]
    pub fn external(address: Address) -> Self {
        Self {
            address,
            transaction_hash: None,
            args: Vec::new(),
            deployer: None,
            block_number: None,
            bytecode_hash: None,
            abi: serde_json::Value::Null,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeploymentRegistry {
    root: PathBuf,
    network: String,
    chain_id: Option<u64>,
}

impl DeploymentRegistry {
    pub fn new(root: impl Into<PathBuf>, network: impl Into<String>, chain_id: Option<u64>) -> Self {
        Self {
            root: root.into(),
            network: network.into(),
            chain_id,
        }
    }

    #[must_use]
    pub fn network(&self) -> &str {
        &self.network
    }

    #[must_use]
    pub fn network_dir(&self) -> PathBuf {
        self.root.join(&self.network)
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.network_dir().join(format!("{name}.json"))
    }

    /// Look up a record; `Ok(None)` when it has never been saved.
    pub fn find(&self, name: &str) -> Result<Option<DeploymentRecord>> {
        let path = self.record_path(name);
        if !path.is_file() {
            return Ok(None);
        }

        debug!("Reading deployment {} from {}", name, path.display());
        Ok(Some(serde_json::from_slice(&fs::read(&path)?)?))
    }

    pub fn get(&self, name: &str) -> Result<DeploymentRecord> {
        self.find(name)?
            .ok_or_else(|| KeeperError::DeploymentNotFound {
                name: name.to_string(),
                network: self.network.clone(),
            })
    }

    pub fn save(&self, name: &str, record: &DeploymentRecord) -> Result<()> {
        let dir = self.network_dir();
        fs::create_dir_all(&dir)?;

        if let Some(chain_id) = self.chain_id {
            write_if_changed(&dir.join(".chainId"), &chain_id.to_string())?;
        }

        let path = self.record_path(name);
        fs::write(&path, serde_json::to_string_pretty(record)?)?;
        info!("Saved deployment {} at {} to {}", name, record.address, path.display());
        Ok(())
    }

    /// Record a contract that was deployed by other means.
    pub fn register(&self, name: &str, address: Address) -> Result<DeploymentRecord> {
        let record = DeploymentRecord::external(address);
        self.save(name, &record)?;
        Ok(record)
    }

    /// All records for this network, sorted by name.
    pub fn list(&self) -> Result<Vec<(String, DeploymentRecord)>> {
        let dir = self.network_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            records.push((name.to_string(), serde_json::from_slice(&fs::read(&path)?)?));
        }

        records.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(records)
    }
}

fn write_if_changed(path: &Path, contents: &str) -> Result<()> {
    if fs::read_to_string(path).ok().as_deref() != Some(contents) {
        fs::write(path, contents)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let registry = DeploymentRegistry::new(dir.path(), "localhost", Some(31_337));

        let counter = Address::repeat_byte(0x11);
        let record = DeploymentRecord {
            args: vec![counter],
            transaction_hash: Some(TxHash::repeat_byte(0xaa)),
            block_number: Some(7),
            ..DeploymentRecord::external(Address::repeat_byte(0x22))
        };
        registry.save("KeeperSimulation", &record).unwrap();

        assert!(dir.path().join("localhost/KeeperSimulation.json").is_file());
        assert_eq!(
            fs::read_to_string(dir.path().join("localhost/.chainId")).unwrap(),
            "31337"
        );
        assert_eq!(registry.get("KeeperSimulation").unwrap(), record);
    }

    #[test]
    fn test_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let registry = DeploymentRegistry::new(dir.path(), "sepolia", None);

        assert!(registry.find("Counter").unwrap().is_none());
        match registry.get("Counter").unwrap_err() {
            KeeperError::DeploymentNotFound { name, network } => {
                assert_eq!(name, "Counter");
                assert_eq!(network, "sepolia");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_records_are_per_network() {
        let dir = tempfile::tempdir().unwrap();
        let local = DeploymentRegistry::new(dir.path(), "localhost", None);
        let sepolia = DeploymentRegistry::new(dir.path(), "sepolia", None);

        local.register("Counter", Address::repeat_byte(0x01)).unwrap();

        assert!(local.find("Counter").unwrap().is_some());
        assert!(sepolia.find("Counter").unwrap().is_none());
        assert!(!dir.path().join("localhost/.chainId").exists());
    }

    #[test]
    fn test_list_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let registry = DeploymentRegistry::new(dir.path(), "localhost", Some(31_337));
        assert!(registry.list().unwrap().is_empty());

        registry.register("KeeperSimulation", Address::repeat_byte(0x02)).unwrap();
        registry.register("Counter", Address::repeat_byte(0x01)).unwrap();

        let names: Vec<_> = registry.list().unwrap().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["Counter", "KeeperSimulation"]);
    }

    #[test]
    fn test_external_record_json_is_minimal() {
        let record = DeploymentRecord::external(Address::repeat_byte(0x01));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "address": "0x0101010101010101010101010101010101010101",
                "args": [],
            })
        );
    }
}
