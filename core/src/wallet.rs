use crate::errors::ClientError;
use crate::network_config::NetworkConfig;
use crate::rpc_provider::{request_as, RpcError, Transport};
use alloy::primitives::{Address, Bytes, B256, U64};
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How often the account watcher polls `eth_accounts`.
pub const DEFAULT_ACCOUNT_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// Buffered `accountsChanged` notifications before the watcher waits.
const ACCOUNT_EVENT_BUFFER: usize = 16;

/// The user's wallet provider. It holds the keys; the client only asks it to
/// expose accounts and to sign and send transactions.
pub struct InjectedWallet<T> {
    transport: T,
}

impl<T: Transport> InjectedWallet<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Accounts already exposed to this client, without prompting.
    pub async fn accounts(&self) -> Result<Vec<Address>, RpcError> {
        request_as(&self.transport, "eth_accounts", json!([])).await
    }

    /// Ask the wallet to expose accounts, prompting the user if needed.
    pub async fn request_accounts(&self) -> Result<Vec<Address>, RpcError> {
        request_as(&self.transport, "eth_requestAccounts", json!([])).await
    }

    pub async fn chain_id(&self) -> Result<u64, RpcError> {
        let id: U64 = request_as(&self.transport, "eth_chainId", json!([])).await?;
        Ok(id.to())
    }

    /// Register `chain` with the wallet (EIP-3085).
    pub async fn add_chain(&self, chain: &NetworkConfig) -> Result<(), RpcError> {
        self.transport
            .request("wallet_addEthereumChain", chain.add_chain_params())
            .await?;
        Ok(())
    }

    /// Have the wallet sign and broadcast a zero-value call from `from`.
    pub async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<B256, RpcError> {
        request_as(
            &self.transport,
            "eth_sendTransaction",
            json!([{ "from": from, "to": to, "data": data }]),
        )
        .await
    }
}

/// Handle to a running account watcher.
pub struct AccountWatcher {
    pub handle: JoinHandle<()>,
    pub events: mpsc::Receiver<Vec<Address>>,
}

/// Poll `eth_accounts` on `transport` and publish every change of the
/// account list, mirroring the provider's `accountsChanged` event. The first
/// successful poll sets the baseline and is not published. The task ends
/// when the receiver is dropped.
pub fn spawn_account_watcher<T>(transport: T, interval: Duration) -> AccountWatcher
where
    T: Transport + 'static,
{
    let (tx, events) = mpsc::channel(ACCOUNT_EVENT_BUFFER);
    let handle = tokio::spawn(async move {
        let wallet = InjectedWallet::new(transport);
        let mut last: Option<Vec<Address>> = None;
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let accounts = match wallet.accounts().await {
                Ok(accounts) => accounts,
                Err(e) => {
                    tracing::warn!(error = %e, "Account poll FAILED");
                    continue;
                }
            };
            if last.as_ref() == Some(&accounts) {
                continue;
            }
            let previous = last.replace(accounts.clone());
            if previous.is_none() {
                tracing::debug!(accounts = accounts.len(), "Account watcher baseline");
                continue;
            }
            tracing::info!(accounts = ?accounts, "accountsChanged");
            if tx.send(accounts).await.is_err() {
                break;
            }
        }
    });
    AccountWatcher { handle, events }
}

/// Parse an `accountsChanged` payload as delivered by a wallet bridge.
pub fn parse_accounts(raw: &[String]) -> Result<Vec<Address>, ClientError> {
    raw.iter()
        .map(|s| {
            s.parse::<Address>()
                .map_err(|e| ClientError::InvalidAccounts(format!("{s}: {e}")))
        })
        .collect()
}
