use crate::{
    config::Config,
    contracts::{ICounter, ICounterInstance, KeeperSimulation, KeeperSimulationInstance},
    deploy::ContractDeployer,
    error::{KeeperError, Result},
    keeper::{SimulationTarget, UpkeepTarget},
    types::{ConfirmationPolicy, DeployedContract, SubmittedTransaction, UpkeepCheck},
};
use alloy_network::{Ethereum, EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy_primitives::{Address, Bytes, TxHash};
use alloy_provider::{
    DynProvider, PendingTransactionBuilder, PendingTransactionError, Provider, ProviderBuilder,
    WatchTxError,
};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use std::time::Duration;
use tracing::{debug, info};

/// Connection to the configured network, optionally signing as the operator.
pub struct KeeperClient {
    config: Config,
    provider: DynProvider,
    signer: Option<PrivateKeySigner>,
}

impl KeeperClient {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let signer = config.local_signer()?;
        let rpc_url = config.network.rpc_url.clone();

        let provider = match &signer {
            Some(signer) => ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer.clone()))
                .connect_http(rpc_url)
                .erased(),
            None => ProviderBuilder::new().connect_http(rpc_url).erased(),
        };

        debug!(
            "Connected to {} at {} (signer: {:?})",
            config.network.name,
            config.network.rpc_url,
            signer.as_ref().map(PrivateKeySigner::address)
        );

        Ok(Self {
            config,
            provider,
            signer,
        })
    }

    #[must_use]
    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    pub fn signer_address(&self) -> Result<Address> {
        self.signer
            .as_ref()
            .map(PrivateKeySigner::address)
            .ok_or_else(|| {
                KeeperError::Config(
                    "ETHEREUM_WALLET_PRIVATE_KEY is required to send transactions".to_string(),
                )
            })
    }

    pub async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    #[must_use]
    pub fn counter(&self, address: Address) -> CounterContract {
        CounterContract::new(
            address,
            self.provider.clone(),
            self.signer.as_ref().map(PrivateKeySigner::address),
            self.config.confirmation.policy(),
        )
    }

    #[must_use]
    pub fn keeper_simulation(&self, address: Address) -> SimulationContract {
        SimulationContract::new(
            address,
            self.provider.clone(),
            self.signer.as_ref().map(PrivateKeySigner::address),
            self.config.confirmation.policy(),
        )
    }
}

impl ContractDeployer for KeeperClient {
    async fn chain_id(&self) -> Result<u64> {
        Self::chain_id(self).await
    }

    fn deployer_address(&self) -> Result<Address> {
        self.signer_address()
    }

    async fn deploy(&self, init_code: Bytes) -> Result<DeployedContract> {
        let from = self.signer_address()?;
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_deploy_code(init_code);

        let pending = self.provider.send_transaction(tx).await?;
        let transaction_hash = *pending.tx_hash();
        info!("Deployment transaction submitted: {}", transaction_hash);

        // The new address is only known from the receipt, so deployments always wait.
        let timeout = Duration::from_secs(self.config.confirmation.timeout_seconds);
        let receipt = pending
            .with_timeout(Some(timeout))
            .get_receipt()
            .await
            .map_err(|e| receipt_error(e, transaction_hash, timeout))?;

        deployed_contract(transaction_hash, &receipt)
    }
}

/// Typed binding to a Counter contract.
pub struct CounterContract {
    instance: ICounterInstance<DynProvider>,
    sender: Option<Address>,
    policy: ConfirmationPolicy,
}

impl CounterContract {
    pub fn new(
        address: Address,
        provider: DynProvider,
        sender: Option<Address>,
        policy: ConfirmationPolicy,
    ) -> Self {
        Self {
            instance: ICounter::new(address, provider),
            sender,
            policy,
        }
    }
}

impl UpkeepTarget for CounterContract {
    fn address(&self) -> Address {
        *self.instance.address()
    }

    async fn check_upkeep(&self, check_data: Bytes) -> Result<UpkeepCheck> {
        let mut call = self.instance.checkUpkeep(check_data);
        if let Some(sender) = self.sender {
            call = call.from(sender);
        }

        let result = call.call().await?;
        Ok(UpkeepCheck {
            upkeep_needed: result.upkeepNeeded,
            perform_data: result.performData,
        })
    }

    async fn perform_upkeep(&self, perform_data: Bytes) -> Result<SubmittedTransaction> {
        let sender = require_sender(self.sender, "performUpkeep")?;
        let pending = self
            .instance
            .performUpkeep(perform_data)
            .from(sender)
            .send()
            .await?;
        settle(pending, self.policy).await
    }
}

/// Typed binding to a KeeperSimulation contract.
pub struct SimulationContract {
    instance: KeeperSimulationInstance<DynProvider>,
    sender: Option<Address>,
    policy: ConfirmationPolicy,
}

impl SimulationContract {
    pub fn new(
        address: Address,
        provider: DynProvider,
        sender: Option<Address>,
        policy: ConfirmationPolicy,
    ) -> Self {
        Self {
            instance: KeeperSimulation::new(address, provider),
            sender,
            policy,
        }
    }
}

impl SimulationTarget for SimulationContract {
    fn address(&self) -> Address {
        *self.instance.address()
    }

    async fn request_check(&self) -> Result<SubmittedTransaction> {
        let sender = require_sender(self.sender, "checkUpkeep")?;
        let pending = self.instance.checkUpkeep().from(sender).send().await?;
        settle(pending, self.policy).await
    }

    async fn upkeep_needed(&self) -> Result<bool> {
        let mut call = self.instance.getUpkeepNeeded();
        if let Some(sender) = self.sender {
            call = call.from(sender);
        }
        Ok(call.call().await?)
    }
}

fn require_sender(sender: Option<Address>, method: &str) -> Result<Address> {
    sender.ok_or_else(|| {
        KeeperError::Config(format!(
            "ETHEREUM_WALLET_PRIVATE_KEY is required to send {method}"
        ))
    })
}

async fn settle(
    pending: PendingTransactionBuilder<Ethereum>,
    policy: ConfirmationPolicy,
) -> Result<SubmittedTransaction> {
    let hash = *pending.tx_hash();

    match policy {
        ConfirmationPolicy::FireAndForget => Ok(SubmittedTransaction::submitted(hash)),
        ConfirmationPolicy::Await {
            confirmations,
            timeout,
        } => {
            debug!("Waiting for {} confirmation(s) of {}", confirmations, hash);
            let receipt = pending
                .with_required_confirmations(confirmations)
                .with_timeout(Some(timeout))
                .get_receipt()
                .await
                .map_err(|e| receipt_error(e, hash, timeout))?;

            confirmed_transaction(hash, &receipt)
        }
    }
}

fn confirmed_transaction<R: ReceiptResponse>(
    hash: TxHash,
    receipt: &R,
) -> Result<SubmittedTransaction> {
    if !receipt.status() {
        return Err(KeeperError::TransactionFailed(format!("{hash} reverted")));
    }
    Ok(SubmittedTransaction::confirmed(hash, receipt.block_number()))
}

fn deployed_contract<R: ReceiptResponse>(hash: TxHash, receipt: &R) -> Result<DeployedContract> {
    if !receipt.status() {
        return Err(KeeperError::TransactionFailed(format!(
            "Deployment {hash} reverted"
        )));
    }

    let address = receipt.contract_address().ok_or_else(|| {
        KeeperError::TransactionFailed(format!("Receipt for {hash} has no contract address"))
    })?;

    Ok(DeployedContract {
        address,
        transaction_hash: hash,
        block_number: receipt.block_number(),
    })
}

fn receipt_error(
    error: PendingTransactionError,
    hash: TxHash,
    timeout: Duration,
) -> KeeperError {
    match error {
        PendingTransactionError::TxWatcher(WatchTxError::Timeout) => KeeperError::Timeout(format!(
            "No receipt for {hash} after {}s",
            timeout.as_secs()
        )),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_rpc_types_eth::TransactionReceipt;
    use alloy_transport::mock::Asserter;
    use serde_json::json;

    const SENDER: Address = Address::repeat_byte(0xf3);
    const TX: TxHash = TxHash::repeat_byte(0xaa);

    fn mocked_provider(asserter: &Asserter) -> DynProvider {
        ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(asserter.clone())
            .erased()
    }

    fn receipt(success: bool, contract_address: Option<Address>) -> TransactionReceipt {
        let status = if success { "0x1" } else { "0x0" };
        serde_json::from_value(json!({
            "type": "0x2",
            "status": status,
            "cumulativeGasUsed": "0x5208",
            "logs": [],
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "transactionHash": TX,
            "transactionIndex": "0x0",
            "blockHash": alloy_primitives::B256::repeat_byte(0xbb),
            "blockNumber": "0x7",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "from": SENDER,
            "to": null,
            "contractAddress": contract_address,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_perform_upkeep_returns_hash_without_waiting() {
        let asserter = Asserter::new();
        let counter = CounterContract::new(
            Address::repeat_byte(0xc0),
            mocked_provider(&asserter),
            Some(SENDER),
            ConfirmationPolicy::FireAndForget,
        );

        asserter.push_success(&TX);
        let transaction = counter.perform_upkeep(Bytes::from_static(&[0x00])).await.unwrap();

        assert_eq!(transaction, SubmittedTransaction::submitted(TX));
    }

    #[tokio::test]
    async fn test_request_check_returns_hash_without_waiting() {
        let asserter = Asserter::new();
        let simulation = SimulationContract::new(
            Address::repeat_byte(0x51),
            mocked_provider(&asserter),
            Some(SENDER),
            ConfirmationPolicy::FireAndForget,
        );

        asserter.push_success(&TX);
        let transaction = simulation.request_check().await.unwrap();

        assert_eq!(transaction.hash, TX);
        assert!(!transaction.confirmed);
    }

    #[tokio::test]
    async fn test_rejected_send_is_propagated() {
        let asserter = Asserter::new();
        let simulation = SimulationContract::new(
            Address::repeat_byte(0x51),
            mocked_provider(&asserter),
            Some(SENDER),
            ConfirmationPolicy::FireAndForget,
        );

        asserter.push_failure_msg("insufficient funds for gas");
        let err = simulation.request_check().await.unwrap_err();

        assert!(matches!(err, KeeperError::Contract(_)));
    }

    #[test]
    fn test_mined_transaction_is_confirmed() {
        let transaction = confirmed_transaction(TX, &receipt(true, None)).unwrap();
        assert_eq!(transaction, SubmittedTransaction::confirmed(TX, Some(7)));
    }

    #[test]
    fn test_reverted_receipt_is_transaction_failed() {
        let err = confirmed_transaction(TX, &receipt(false, None)).unwrap_err();
        assert!(matches!(err, KeeperError::TransactionFailed(ref msg) if msg.contains("reverted")));
    }

    #[test]
    fn test_deployment_reads_contract_address() {
        let created = Address::repeat_byte(0x5f);
        let deployed = deployed_contract(TX, &receipt(true, Some(created))).unwrap();

        assert_eq!(
            deployed,
            DeployedContract {
                address: created,
                transaction_hash: TX,
                block_number: Some(7),
            }
        );
    }

    #[test]
    fn test_deployment_without_contract_address_fails() {
        let err = deployed_contract(TX, &receipt(true, None)).unwrap_err();
        assert!(matches!(err, KeeperError::TransactionFailed(_)));

        let err = deployed_contract(TX, &receipt(false, Some(Address::repeat_byte(0x5f))))
            .unwrap_err();
        assert!(matches!(err, KeeperError::TransactionFailed(ref msg) if msg.contains("reverted")));
    }

    #[test]
    fn test_receipt_timeout_maps_to_timeout() {
        let err = receipt_error(
            PendingTransactionError::TxWatcher(WatchTxError::Timeout),
            TX,
            Duration::from_secs(30),
        );
        assert!(matches!(err, KeeperError::Timeout(ref msg) if msg.ends_with("after 30s")));

        let err = receipt_error(
            PendingTransactionError::FailedToRegister,
            TX,
            Duration::from_secs(30),
        );
        assert!(matches!(err, KeeperError::PendingTransaction(_)));
    }
}
