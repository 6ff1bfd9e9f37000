//! Keeper check/perform cycles.
//!
//! Both flows run their remote calls strictly in sequence and never retry.
//! Whatever the node returns, success or error, goes straight back to the
//! caller.

use crate::{
    error::Result,
    types::{SimulationReport, SubmittedTransaction, UpkeepCheck, UpkeepReport},
};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolValue;
use chrono::Utc;
use std::future::Future;
use tracing::{debug, info};

/// Argument passed to `performUpkeep`: a single zero byte.
pub const PERFORM_DATA: [u8; 1] = [0x00];

/// A Counter-style contract exposing `checkUpkeep(bytes)`/`performUpkeep(bytes)`.
pub trait UpkeepTarget {
    fn address(&self) -> Address;

    /// Simulated call: no transaction, no state change.
    fn check_upkeep(&self, check_data: Bytes) -> impl Future<Output = Result<UpkeepCheck>> + Send;

    fn perform_upkeep(
        &self,
        perform_data: Bytes,
    ) -> impl Future<Output = Result<SubmittedTransaction>> + Send;
}

/// A KeeperSimulation contract.
pub trait SimulationTarget {
    fn address(&self) -> Address;

    /// Sends `checkUpkeep()` as a transaction. Always costs gas.
    fn request_check(&self) -> impl Future<Output = Result<SubmittedTransaction>> + Send;

    /// Reads `getUpkeepNeeded()`.
    fn upkeep_needed(&self) -> impl Future<Output = Result<bool>> + Send;
}

/// ABI-encode a Unix timestamp as a single `uint256` word.
#[must_use]
pub fn encode_timestamp(seconds: u64) -> Bytes {
    Bytes::from(U256::from(seconds).abi_encode())
}

/// Current wall-clock time in Unix seconds.
#[must_use]
pub fn current_timestamp() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}

/// Ask `target` whether upkeep is due at `timestamp` and, if it is, submit
/// `performUpkeep` once.
///
/// Each console line is handed to `emit` as soon as its step completes, so a
/// later failure never hides what already happened on chain.
pub async fn run_keeper_simulation<T, F>(
    target: &T,
    timestamp: u64,
    mut emit: F,
) -> Result<UpkeepReport>
where
    T: UpkeepTarget,
    F: FnMut(&str),
{
    let contract = target.address();

    let check = target.check_upkeep(encode_timestamp(timestamp)).await?;
    info!(
        "Contract {} checkUpkeep at {}: {}",
        contract, timestamp, check.upkeep_needed
    );
    emit(&UpkeepReport::check_line(contract, check.upkeep_needed));

    let perform = if check.upkeep_needed {
        let transaction = target
            .perform_upkeep(Bytes::from_static(&PERFORM_DATA))
            .await?;
        info!(
            "performUpkeep submitted to {}: {}",
            contract, transaction.hash
        );
        emit(&UpkeepReport::perform_line(contract, transaction.hash));
        Some(transaction)
    } else {
        debug!("No upkeep needed for {}", contract);
        None
    };

    Ok(UpkeepReport {
        contract,
        timestamp,
        check,
        perform,
    })
}

/// Submit `checkUpkeep()` on a KeeperSimulation contract, then read its status.
///
/// The hash line goes to `emit` before the status is read. The read is
/// issued right after submission; with
/// [`ConfirmationPolicy::FireAndForget`](crate::types::ConfirmationPolicy)
/// it may observe the state from before the transaction is mined.
pub async fn run_keeper_test<T, F>(target: &T, mut emit: F) -> Result<SimulationReport>
where
    T: SimulationTarget,
    F: FnMut(&str),
{
    let contract = target.address();

    let transaction = target.request_check().await?;
    info!("checkUpkeep submitted to {}: {}", contract, transaction.hash);
    emit(&SimulationReport::request_line(contract, transaction.hash));

    let upkeep_needed = target.upkeep_needed().await?;
    debug!(
        "getUpkeepNeeded on {} (confirmed: {}): {}",
        contract, transaction.confirmed, upkeep_needed
    );
    emit(&SimulationReport::status_line(upkeep_needed));

    Ok(SimulationReport {
        contract,
        transaction,
        upkeep_needed,
    })
}
