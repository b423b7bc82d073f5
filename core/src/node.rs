use crate::rpc_provider::RpcError;
use alloy::network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use serde::Serialize;

/// The fields of a transaction receipt the client acts on.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub status: bool,
    pub gas_used: u64,
}

impl ReceiptSummary {
    pub fn succeeded(&self) -> bool {
        self.status
    }
}

impl From<&TransactionReceipt> for ReceiptSummary {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            status: receipt.status(),
            gas_used: receipt.gas_used,
        }
    }
}

/// Read/submit access to the remote node through an alloy provider.
pub struct NodeClient<P> {
    provider: P,
}

impl<P: Provider + Clone> NodeClient<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub async fn chain_id(&self) -> Result<u64, RpcError> {
        Ok(self.provider.get_chain_id().await?)
    }

    /// `eth_call` against the latest block.
    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        let request = TransactionRequest::default().with_to(to).with_input(data);
        Ok(self.provider.call(request).latest().await?)
    }

    /// Confirmed nonce of `address`.
    pub async fn account_nonce(&self, address: Address) -> Result<u64, RpcError> {
        Ok(self.provider.get_transaction_count(address).latest().await?)
    }

    /// Fill, sign with `wallet`, and broadcast `request`. Nonce (pending),
    /// gas limit and EIP-1559 fees come from the node; the chain id is
    /// only fetched when the request leaves it unset.
    pub async fn send_with_wallet(
        &self,
        wallet: EthereumWallet,
        request: TransactionRequest,
    ) -> Result<B256, RpcError> {
        let signing = ProviderBuilder::new()
            .wallet(wallet)
            .connect_provider(self.provider.clone());
        let pending = signing.send_transaction(request).await?;
        tracing::debug!(tx = %pending.tx_hash(), "Transaction broadcast");
        Ok(*pending.tx_hash())
    }

    /// Wait until the transaction is included. Errors from the node abort
    /// the wait; there is no deadline beyond the transport's own timeout.
    pub async fn wait_for_receipt(&self, hash: B256) -> Result<ReceiptSummary, RpcError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), hash)
            .get_receipt()
            .await?;
        let summary = ReceiptSummary::from(&receipt);
        tracing::debug!(
            tx = %hash,
            block = ?summary.block_number,
            success = summary.succeeded(),
            "Transaction included"
        );
        Ok(summary)
    }
}
