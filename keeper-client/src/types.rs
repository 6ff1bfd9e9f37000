use alloy_primitives::{Address, Bytes, TxHash};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

/// What to do after a state-changing transaction has been accepted by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationPolicy {
    /// Report the hash as soon as the node accepts the transaction.
    #[default]
    FireAndForget,
    /// Wait for the receipt before reporting.
    Await {
        confirmations: u64,
        timeout: Duration,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedTransaction {
    pub hash: TxHash,
    /// Block the transaction was mined in, only known when the receipt was awaited.
    pub block_number: Option<u64>,
    pub confirmed: bool,
}

impl SubmittedTransaction {
    #[must_use]
    pub const fn submitted(hash: TxHash) -> Self {
        Self {
            hash,
            block_number: None,
            confirmed: false,
        }
    }

    #[must_use]
    pub const fn confirmed(hash: TxHash, block_number: Option<u64>) -> Self {
        Self {
            hash,
            block_number,
            confirmed: true,
        }
    }
}

/// Decoded result of a simulated `checkUpkeep(bytes)` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpkeepCheck {
    pub upkeep_needed: bool,
    pub perform_data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpkeepReport {
    pub contract: Address,
    pub timestamp: u64,
    pub check: UpkeepCheck,
    pub perform: Option<SubmittedTransaction>,
}

impl UpkeepReport {
    #[must_use]
    pub fn check_line(contract: Address, upkeep_needed: bool) -> String {
        format!("Contract {contract} checkUpkeep: {upkeep_needed}")
    }

    #[must_use]
    pub fn perform_line(contract: Address, hash: TxHash) -> String {
        format!("Contract {contract} performUpkeep was called. Transaction Hash: {hash}")
    }
}

impl fmt::Display for UpkeepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::check_line(self.contract, self.check.upkeep_needed))?;
        if let Some(perform) = &self.perform {
            write!(f, "\n{}", Self::perform_line(self.contract, perform.hash))?;
        }
        Ok(())
    }
}

/// Outcome of one `keeper-test` run.
///
/// `upkeep_needed` is read right after `transaction` was submitted. Unless the
/// receipt was awaited it can still reflect the state before that transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub contract: Address,
    pub transaction: SubmittedTransaction,
    pub upkeep_needed: bool,
}

impl SimulationReport {
    #[must_use]
    pub fn request_line(contract: Address, hash: TxHash) -> String {
        format!(
            "Contract {contract} external data request successfully called. Transaction Hash: {hash}"
        )
    }

    #[must_use]
    pub fn status_line(upkeep_needed: bool) -> String {
        format!("The status of this upkeep is currently: {upkeep_needed}")
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", Self::request_line(self.contract, self.transaction.hash))?;
        f.write_str(&Self::status_line(self.upkeep_needed))
    }
}

/// A contract created by a deployment transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContract {
    pub address: Address,
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
}
