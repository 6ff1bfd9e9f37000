use thiserror::Error;

pub type Result<T> = std::result::Result<T, KeeperError>;

#[derive(Error, Debug)]
pub enum KeeperError {
    #[error("Provider error: {0}")]
    Provider(#[from] alloy_transport::TransportError),

    #[error("Contract error: {0}")]
    Contract(#[from] alloy_contract::Error),

    #[error("Pending transaction error: {0}")]
    PendingTransaction(#[from] alloy_provider::PendingTransactionError),

    #[error("Signer error: {0}")]
    Signer(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("No deployment found for {name} on network {network}")]
    DeploymentNotFound { name: String, network: String },

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Array conversion error: {0}")]
    ArrayConversion(#[from] std::array::TryFromSliceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("General error: {0}")]
    General(#[from] eyre::Error),
}
