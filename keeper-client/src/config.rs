use crate::{
    error::{KeeperError, Result},
    networks,
    types::ConfirmationPolicy,
};
use alloy_primitives::{Address, B256};
use alloy_signer_local::PrivateKeySigner;
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, time::Duration};
use url::Url;

pub const DEFAULT_NETWORK: &str = "localhost";
pub const DEFAULT_LOCAL_RPC_URL: &str = "http://127.0.0.1:8545";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub signer: Option<SignerConfig>,
    pub paths: PathsConfig,
    pub confirmation: ConfirmationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: Option<u64>,
    pub rpc_url: Url,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    #[serde(skip_serializing)]
    pub private_key: String,
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub deployments_dir: PathBuf,
    pub artifacts_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    pub wait: bool,
    pub confirmations: u64,
    pub timeout_seconds: u64,
}

impl ConfirmationConfig {
    #[must_use]
    pub const fn policy(&self) -> ConfirmationPolicy {
        if self.wait {
            ConfirmationPolicy::Await {
                confirmations: self.confirmations,
                timeout: Duration::from_secs(self.timeout_seconds),
            }
        } else {
            ConfirmationPolicy::FireAndForget
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from any key/value source, using the same keys
    /// as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network_name = lookup("ETHEREUM_NETWORK").unwrap_or_else(|| DEFAULT_NETWORK.to_string());

        let chain_id = match lookup("CHAIN_ID") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|e| KeeperError::Config(format!("Invalid chain ID: {e}")))?,
            ),
            None => networks::network_id_from_name(&network_name),
        };

        let rpc_url = match lookup("ETHEREUM_RPC_URL") {
            Some(raw) => Url::parse(raw.trim())
                .map_err(|e| KeeperError::Config(format!("Invalid ETHEREUM_RPC_URL: {e}")))?,
            None if networks::is_local(&network_name) => Url::parse(DEFAULT_LOCAL_RPC_URL)
                .map_err(|e| KeeperError::Config(format!("Invalid default RPC URL: {e}")))?,
            None => {
                return Err(KeeperError::Config(format!(
                    "ETHEREUM_RPC_URL is required for network {network_name}"
                )))
            }
        };

        let signer = match lookup("ETHEREUM_WALLET_PRIVATE_KEY") {
            Some(private_key) => {
                let signer = parse_private_key(&private_key)?;

                // Optional guard against running with the wrong key
                if let Some(expected) = lookup("ETHEREUM_DEPLOYER_ADDRESS") {
                    let expected = expected.trim().parse::<Address>().map_err(|e| {
                        KeeperError::InvalidAddress(format!("Invalid deployer address: {e}"))
                    })?;
                    if signer.address() != expected {
                        return Err(KeeperError::Config(format!(
                            "Private key address ({}) does not match ETHEREUM_DEPLOYER_ADDRESS ({expected})",
                            signer.address()
                        )));
                    }
                }

                Some(SignerConfig {
                    address: signer.address(),
                    private_key,
                })
            }
            None => None,
        };

        let config = Self {
            network: NetworkConfig {
                name: network_name,
                chain_id,
                rpc_url,
            },
            signer,
            paths: PathsConfig {
                deployments_dir: lookup("DEPLOYMENTS_DIR")
                    .map_or_else(|| PathBuf::from("deployments"), PathBuf::from),
                artifacts_dir: lookup("ARTIFACTS_DIR")
                    .map_or_else(|| PathBuf::from("artifacts"), PathBuf::from),
            },
            confirmation: ConfirmationConfig {
                wait: parse_flag(lookup("WAIT_FOR_CONFIRMATION"), "WAIT_FOR_CONFIRMATION")?,
                confirmations: parse_number(lookup("CONFIRMATIONS"), "CONFIRMATIONS", 1)?,
                timeout_seconds: parse_number(
                    lookup("CONFIRMATION_TIMEOUT_SECONDS"),
                    "CONFIRMATION_TIMEOUT_SECONDS",
                    120,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let name = self.network.name.trim();
        if name.is_empty() {
            return Err(KeeperError::Config("Network name is required".to_string()));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(KeeperError::Config(format!(
                "Network name {name:?} cannot be used as a deployments directory"
            )));
        }

        if self.confirmation.wait {
            if self.confirmation.confirmations == 0 {
                return Err(KeeperError::Config(
                    "CONFIRMATIONS must be greater than 0".to_string(),
                ));
            }
            if self.confirmation.timeout_seconds == 0 {
                return Err(KeeperError::Config(
                    "CONFIRMATION_TIMEOUT_SECONDS must be greater than 0".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// The operator signer, if one is configured.
    pub fn local_signer(&self) -> Result<Option<PrivateKeySigner>> {
        self.signer
            .as_ref()
            .map(|signer| parse_private_key(&signer.private_key))
            .transpose()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                name: DEFAULT_NETWORK.to_string(),
                chain_id: Some(networks::LOCAL_CHAIN_ID),
                rpc_url: Url::parse(DEFAULT_LOCAL_RPC_URL).expect("static URL is valid"),
            },
            signer: None,
            paths: PathsConfig {
                deployments_dir: PathBuf::from("deployments"),
                artifacts_dir: PathBuf::from("artifacts"),
            },
            confirmation: ConfirmationConfig {
                wait: false,
                confirmations: 1,
                timeout_seconds: 120,
            },
        }
    }
}

fn parse_private_key(private_key: &str) -> Result<PrivateKeySigner> {
    let private_key = private_key.trim();
    let private_key = private_key.strip_prefix("0x").unwrap_or(private_key);

    PrivateKeySigner::from_bytes(&B256::try_from(hex::decode(private_key)?.as_slice())?)
        .map_err(|e| KeeperError::Signer(e.to_string()))
}

fn parse_flag(raw: Option<String>, key: &str) -> Result<bool> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(KeeperError::Config(format!("Invalid {key}: {value}"))),
        },
    }
}

fn parse_number(raw: Option<String>, key: &str, default: u64) -> Result<u64> {
    raw.map_or(Ok(default), |value| {
        value
            .trim()
            .parse()
            .map_err(|e| KeeperError::Config(format!("Invalid {key}: {e}")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // Hardhat's first well-known development account
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_to_local_node() {
        let config = load(&[]).unwrap();

        assert_eq!(config.network.name, "localhost");
        assert_eq!(config.network.chain_id, Some(31_337));
        assert_eq!(config.network.rpc_url.as_str(), "http://127.0.0.1:8545/");
        assert!(config.signer.is_none());
        assert_eq!(config.paths.deployments_dir, PathBuf::from("deployments"));
        assert_eq!(config.confirmation.policy(), ConfirmationPolicy::FireAndForget);
    }

    #[test]
    fn test_remote_network_requires_rpc_url() {
        let err = load(&[("ETHEREUM_NETWORK", "sepolia")]).unwrap_err();
        assert!(matches!(err, KeeperError::Config(_)));

        let config = load(&[
            ("ETHEREUM_NETWORK", "sepolia"),
            ("ETHEREUM_RPC_URL", "https://rpc.sepolia.org"),
        ])
        .unwrap();
        assert_eq!(config.network.chain_id, Some(11_155_111));
    }

    #[test]
    fn test_unknown_network_has_no_chain_id_unless_given() {
        let config = load(&[
            ("ETHEREUM_NETWORK", "devnet"),
            ("ETHEREUM_RPC_URL", "http://10.0.0.5:8545"),
        ])
        .unwrap();
        assert_eq!(config.network.chain_id, None);

        let config = load(&[
            ("ETHEREUM_NETWORK", "devnet"),
            ("ETHEREUM_RPC_URL", "http://10.0.0.5:8545"),
            ("CHAIN_ID", "1337"),
        ])
        .unwrap();
        assert_eq!(config.network.chain_id, Some(1337));
    }

    #[test]
    fn test_signer_from_private_key() {
        let config = load(&[("ETHEREUM_WALLET_PRIVATE_KEY", DEV_KEY)]).unwrap();
        let expected: Address = DEV_ADDRESS.parse().unwrap();

        assert_eq!(config.signer.as_ref().unwrap().address, expected);
        assert_eq!(config.local_signer().unwrap().unwrap().address(), expected);
    }

    #[test]
    fn test_signer_address_mismatch() {
        let err = load(&[
            ("ETHEREUM_WALLET_PRIVATE_KEY", DEV_KEY),
            (
                "ETHEREUM_DEPLOYER_ADDRESS",
                "0x0000000000000000000000000000000000000001",
            ),
        ])
        .unwrap_err();
        assert!(matches!(err, KeeperError::Config(_)));
    }

    #[test]
    fn test_malformed_private_key() {
        let err = load(&[("ETHEREUM_WALLET_PRIVATE_KEY", "0xnothex")]).unwrap_err();
        assert!(matches!(err, KeeperError::HexDecode(_)));

        let err = load(&[("ETHEREUM_WALLET_PRIVATE_KEY", "0xabcd")]).unwrap_err();
        assert!(matches!(err, KeeperError::ArrayConversion(_)));
    }

    #[test]
    fn test_confirmation_policy() {
        let config = load(&[
            ("WAIT_FOR_CONFIRMATION", "true"),
            ("CONFIRMATIONS", "2"),
            ("CONFIRMATION_TIMEOUT_SECONDS", "30"),
        ])
        .unwrap();
        assert_eq!(
            config.confirmation.policy(),
            ConfirmationPolicy::Await {
                confirmations: 2,
                timeout: Duration::from_secs(30),
            }
        );

        let err = load(&[("WAIT_FOR_CONFIRMATION", "true"), ("CONFIRMATIONS", "0")]).unwrap_err();
        assert!(matches!(err, KeeperError::Config(_)));

        let err = load(&[("WAIT_FOR_CONFIRMATION", "sometimes")]).unwrap_err();
        assert!(matches!(err, KeeperError::Config(_)));
    }

    #[test]
    fn test_network_name_must_be_a_directory_name() {
        let err = load(&[("ETHEREUM_NETWORK", "../mainnet"), ("ETHEREUM_RPC_URL", "http://x")])
            .unwrap_err();
        assert!(matches!(err, KeeperError::Config(_)));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }
}
