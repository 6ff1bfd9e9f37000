//! Chain id / network name table.
//!
//! Only used to label output and to default the chain id of a configured
//! network. Nothing here decides whether an operation runs.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    pub name: &'static str,
    pub chain_id: u64,
}

pub const LOCAL_CHAIN_ID: u64 = 31_337;

pub const NETWORKS: &[NetworkInfo] = &[
    NetworkInfo { name: "localhost", chain_id: LOCAL_CHAIN_ID },
    NetworkInfo { name: "hardhat", chain_id: LOCAL_CHAIN_ID },
    NetworkInfo { name: "mainnet", chain_id: 1 },
    NetworkInfo { name: "goerli", chain_id: 5 },
    NetworkInfo { name: "sepolia", chain_id: 11_155_111 },
    NetworkInfo { name: "polygon", chain_id: 137 },
    NetworkInfo { name: "mumbai", chain_id: 80_001 },
    NetworkInfo { name: "arbitrum", chain_id: 42_161 },
    NetworkInfo { name: "optimism", chain_id: 10 },
    NetworkInfo { name: "base", chain_id: 8453 },
    NetworkInfo { name: "base-sepolia", chain_id: 84_532 },
];

/// Display name for a chain id. Local chains resolve to `localhost`.
#[must_use]
pub fn network_name(chain_id: u64) -> Option<&'static str> {
    NETWORKS
        .iter()
        .find(|network| network.chain_id == chain_id)
        .map(|network| network.name)
}

#[must_use]
pub fn network_id_from_name(name: &str) -> Option<u64> {
    NETWORKS
        .iter()
        .find(|network| network.name.eq_ignore_ascii_case(name))
        .map(|network| network.chain_id)
}

/// Networks served by a node on the operator's machine.
#[must_use]
pub fn is_local(name: &str) -> bool {
    network_id_from_name(name) == Some(LOCAL_CHAIN_ID)
}
