use crate::amount::{format_amount, parse_amount, SPONSORED_DEPOSIT_AMOUNT};
use crate::contracts::{decode_total_value, execute_calldata, ContractBook};
use crate::display::{shorten_address, shorten_hash, Element, StatusBoard, NOT_CONNECTED};
use crate::errors::ClientError;
use crate::network_config::NetworkConfig;
use crate::node::{NodeClient, ReceiptSummary};
use crate::rpc_provider::Transport;
use crate::sponsor::{SponsorAccount, SponsorError};
use crate::wallet::InjectedWallet;
use alloy::eips::eip7702::SignedAuthorization;
use alloy::network::{TransactionBuilder, TransactionBuilder7702};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;

/// Result of a completed direct deposit.
#[derive(Debug, Clone)]
pub struct DepositOutcome {
    pub amount: U256,
    pub approve: ReceiptSummary,
    pub deposit: ReceiptSummary,
    /// Total value read after the deposit, if that read succeeded.
    pub total_value: Option<U256>,
}

/// Result of a completed sponsored deposit.
#[derive(Debug, Clone)]
pub struct SponsoredOutcome {
    pub amount: U256,
    pub sponsor: Address,
    /// Temporary account that delegated to the batch contract.
    pub authority: Address,
    pub receipt: ReceiptSummary,
}

/// Everything fixed before the authorization is signed.
struct SponsoredPlan {
    chain_id: u64,
    authority_nonce: u64,
    calldata: Bytes,
}

/// Session context: wallet and node handles, the optional sponsor, the
/// connected account, and the status board every operation reports to.
///
/// Every operation takes `&mut self`, so flows on one session never overlap.
pub struct Session<W, P> {
    chain: NetworkConfig,
    contracts: ContractBook,
    wallet: Option<InjectedWallet<W>>,
    node: NodeClient<P>,
    sponsor: Option<SponsorAccount>,
    user: Option<Address>,
    board: StatusBoard,
}

impl<W: Transport, P: Provider + Clone> Session<W, P> {
    pub fn new(
        chain: NetworkConfig,
        contracts: ContractBook,
        node: NodeClient<P>,
        wallet: Option<InjectedWallet<W>>,
        sponsor: Option<SponsorAccount>,
    ) -> Self {
        Self {
            chain,
            contracts,
            wallet,
            node,
            sponsor,
            user: None,
            board: StatusBoard::default(),
        }
    }

    pub fn board(&self) -> &StatusBoard {
        &self.board
    }

    pub fn user(&self) -> Option<Address> {
        self.user
    }

    pub fn chain(&self) -> &NetworkConfig {
        &self.chain
    }

    /// Startup: verify the chain, report a missing sponsor or wallet, and
    /// re-attach an account the wallet already exposes.
    pub async fn init(&mut self) {
        self.verify_chain().await;

        if self.sponsor.is_none() {
            tracing::error!("Private key not found in environment variables");
            self.board
                .status(format!("Error: {}", SponsorError::MissingKey));
        }

        let Some(wallet) = self.wallet.as_ref() else {
            self.board.status(ClientError::WalletUnavailable.to_string());
            return;
        };

        match wallet.accounts().await {
            Ok(accounts) => {
                if let Some(first) = accounts.first().copied() {
                    self.setup_wallet(first).await;
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to auto-connect"),
        }
    }

    /// Compare the node's (and wallet's, when present) chain id with the
    /// configured chain. Only logs; never fails the caller.
    pub async fn verify_chain(&self) -> bool {
        let node_ok = match self.node.chain_id().await {
            Ok(id) if self.chain.is_chain(id) => {
                tracing::info!("Successfully connected to {}", self.chain.name);
                true
            }
            Ok(id) => {
                tracing::error!(
                    expected = self.chain.chain_id,
                    actual = id,
                    "Not connected to {}",
                    self.chain.name
                );
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Error verifying chain connection");
                false
            }
        };

        let wallet_ok = match self.wallet.as_ref() {
            None => true,
            Some(wallet) => match wallet.chain_id().await {
                Ok(id) if self.chain.is_chain(id) => true,
                Ok(id) => {
                    tracing::warn!(
                        expected = self.chain.chain_id,
                        actual = id,
                        "Wallet is on a different chain"
                    );
                    false
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Could not read wallet chain");
                    false
                }
            },
        };

        node_ok && wallet_ok
    }

    /// Ask the wallet for an account and attach the first one.
    pub async fn connect_wallet(&mut self) -> Result<Address, ClientError> {
        self.board.status("Connecting wallet...");
        match self.try_connect_wallet().await {
            Ok(address) => {
                self.board.status("Wallet connected!");
                Ok(address)
            }
            Err(e) => self.fail("Failed to connect wallet", e),
        }
    }

    async fn try_connect_wallet(&mut self) -> Result<Address, ClientError> {
        let wallet = self.wallet.as_ref().ok_or(ClientError::WalletUnavailable)?;
        let accounts = wallet.request_accounts().await?;
        let first = accounts.first().copied().ok_or(ClientError::NoAccounts)?;
        self.setup_wallet(first).await;
        Ok(first)
    }

    /// Attach `address` as the session's user and refresh its total value.
    pub async fn setup_wallet(&mut self, address: Address) {
        self.user = Some(address);
        self.board
            .set(Element::AccountDisplay, shorten_address(&address.to_string()));
        tracing::info!(account = %address, "Signed in account");
        // Failures are already on the status board.
        let _ = self.total_value().await;
    }

    /// Apply a wallet `accountsChanged` notification.
    pub async fn accounts_changed(&mut self, accounts: &[Address]) {
        match accounts.first() {
            Some(first) => self.setup_wallet(*first).await,
            None => {
                self.user = None;
                self.board.set(Element::AccountDisplay, NOT_CONNECTED);
                self.board.status("Wallet disconnected.");
            }
        }
    }

    /// Register the configured chain with the wallet.
    pub async fn add_chain_to_wallet(&mut self) -> Result<(), ClientError> {
        let result = match self.wallet.as_ref() {
            None => Err(ClientError::WalletUnavailable),
            Some(wallet) => wallet.add_chain(&self.chain).await.map_err(ClientError::from),
        };
        match result {
            Ok(()) => {
                self.board
                    .status(format!("{} added to wallet.", self.chain.name));
                Ok(())
            }
            Err(e) => self.fail(&format!("Failed to add {}", self.chain.name), e),
        }
    }

    // ── Direct deposit ────────────────────────────────────────────────────

    /// Approve then deposit `input` tokens from the connected account. The
    /// deposit is only submitted once the approval's receipt is in. A failed
    /// deposit leaves a confirmed approval in place.
    pub async fn direct_deposit(&mut self, input: &str) -> Result<DepositOutcome, ClientError> {
        match self.try_direct_deposit(input).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => self.fail("Deposit failed", e),
        }
    }

    async fn try_direct_deposit(&mut self, input: &str) -> Result<DepositOutcome, ClientError> {
        let user = self.user.ok_or(ClientError::NotConnected)?;
        let wallet = self.wallet.as_ref().ok_or(ClientError::WalletUnavailable)?;

        self.board.status("Processing direct deposit...");
        let amount = parse_amount(input)?;

        let approve_hash = wallet
            .send_transaction(
                user,
                self.contracts.yield_token,
                self.contracts.approve_calldata(amount),
            )
            .await?;
        self.board.status(format!(
            "Approving tokens... Transaction: {}",
            shorten_hash(&approve_hash.to_string())
        ));
        let approve = confirm(&self.node, approve_hash).await?;

        let deposit_hash = wallet
            .send_transaction(
                user,
                self.contracts.alchemist,
                self.contracts.deposit_calldata(amount, user),
            )
            .await?;
        self.board.status(format!(
            "Depositing tokens... Transaction: {}",
            shorten_hash(&deposit_hash.to_string())
        ));
        let deposit = confirm(&self.node, deposit_hash).await?;

        self.board.status("Deposit successful!");
        let total_value = self.total_value().await.ok();

        Ok(DepositOutcome {
            amount,
            approve,
            deposit,
            total_value,
        })
    }

    // ── Sponsored deposit ─────────────────────────────────────────────────

    /// Deposit a fixed [`SPONSORED_DEPOSIT_AMOUNT`] for the connected account
    /// through one EIP-7702 transaction paid for by the sponsor. The
    /// temporary account delegates to the batch contract, which runs
    /// approve and deposit atomically.
    pub async fn sponsor_deposit(&mut self) -> Result<SponsoredOutcome, ClientError> {
        self.board.status("Preparing sponsored deposit...");

        let plan = match self.plan_sponsored().await {
            Ok(plan) => plan,
            Err(e) => return self.fail("Failed to generate authorization", e),
        };

        let authorization = match self.sign_sponsored(&plan) {
            Ok(authorization) => authorization,
            Err(e) => return self.fail("Signature failed", e),
        };

        match self.submit_sponsored(plan, authorization).await {
            Ok(outcome) => {
                self.board.status(format!(
                    "Sponsored deposit confirmed! Transaction: {}",
                    shorten_hash(&outcome.receipt.transaction_hash.to_string())
                ));
                Ok(outcome)
            }
            Err(e) => self.fail("Sponsored deposit failed", e),
        }
    }

    async fn plan_sponsored(&self) -> Result<SponsoredPlan, ClientError> {
        let sponsor = self.sponsor.as_ref().ok_or(ClientError::SponsorUnavailable)?;
        let user = self.user.ok_or(ClientError::NotConnected)?;

        let calls = self.contracts.deposit_batch(SPONSORED_DEPOSIT_AMOUNT, user);
        let calldata = execute_calldata(calls);

        let chain_id = self.node.chain_id().await?;
        let authority_nonce = self.node.account_nonce(sponsor.delegate_address()).await?;

        Ok(SponsoredPlan {
            chain_id,
            authority_nonce,
            calldata,
        })
    }

    fn sign_sponsored(&self, plan: &SponsoredPlan) -> Result<SignedAuthorization, ClientError> {
        let sponsor = self.sponsor.as_ref().ok_or(ClientError::SponsorUnavailable)?;
        let authorization = sponsor.sign_authorization(
            plan.chain_id,
            self.contracts.batch_call,
            plan.authority_nonce,
        )?;
        tracing::info!(
            authority = %sponsor.delegate_address(),
            contract = %self.contracts.batch_call,
            nonce = plan.authority_nonce,
            "Authorization signed"
        );
        Ok(authorization)
    }

    async fn submit_sponsored(
        &mut self,
        plan: SponsoredPlan,
        authorization: SignedAuthorization,
    ) -> Result<SponsoredOutcome, ClientError> {
        let sponsor = self.sponsor.as_ref().ok_or(ClientError::SponsorUnavailable)?;
        let from = sponsor.sponsor_address();
        let authority = sponsor.delegate_address();

        // Nonce, gas limit and fees are filled from the node at send time.
        let request = TransactionRequest::default()
            .with_from(from)
            .with_to(authority)
            .with_chain_id(plan.chain_id)
            .with_input(plan.calldata)
            .with_authorization_list(vec![authorization]);
        let hash = self.node.send_with_wallet(sponsor.wallet(), request).await?;

        self.board.status(format!(
            "Sponsored deposit submitted... Transaction: {}",
            shorten_hash(&hash.to_string())
        ));
        let receipt = confirm(&self.node, hash).await?;

        Ok(SponsoredOutcome {
            amount: SPONSORED_DEPOSIT_AMOUNT,
            sponsor: from,
            authority,
            receipt,
        })
    }

    // ── Balance ───────────────────────────────────────────────────────────

    /// Read the connected account's total value from the vault and show it.
    pub async fn total_value(&mut self) -> Result<U256, ClientError> {
        match self.try_total_value().await {
            Ok(value) => {
                self.board.set(Element::BalanceDisplay, format_amount(value));
                self.board.status("Total value updated.");
                Ok(value)
            }
            Err(e) => self.fail("Failed to get total value", e),
        }
    }

    async fn try_total_value(&self) -> Result<U256, ClientError> {
        let user = self.user.ok_or(ClientError::NotConnected)?;
        let data = self
            .node
            .call(
                self.contracts.alchemist,
                self.contracts.total_value_calldata(user),
            )
            .await?;
        decode_total_value(&data).map_err(|e| ClientError::Decode {
            what: "totalValue",
            details: e.to_string(),
        })
    }

    fn fail<T>(&mut self, operation: &str, error: ClientError) -> Result<T, ClientError> {
        tracing::error!(error = %error, kind = error.error_type(), "{}", operation);
        self.board.status(error.status_line(operation));
        Err(error)
    }
}

/// Wait for `hash` and treat a reverted receipt as a failure.
async fn confirm<P: Provider + Clone>(
    node: &NodeClient<P>,
    hash: B256,
) -> Result<ReceiptSummary, ClientError> {
    let receipt = node.wait_for_receipt(hash).await?;
    if !receipt.succeeded() {
        return Err(ClientError::Reverted(hash));
    }
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::AmountError;
    use crate::contracts::{IAlchemist, IBatchCallAndSponsor, IERC20, ALCHEMIST_ADDRESS, YIELD_TOKEN_ADDRESS};
    use crate::network_config::hoodi_testnet;
    use crate::rpc_provider::mock::{
        fee_history_json, methods, node_provider, receipt_json, CallLog, MockTransport,
    };
    use alloy::consensus::TxEnvelope;
    use alloy::eips::eip2718::Decodable2718;
    use alloy::primitives::address;
    use alloy::providers::RootProvider;
    use alloy::sol_types::{SolCall, SolValue};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    const ALICE: Address = address!("1111111111111111111111111111111111111111");
    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    type TestSession = Session<Arc<MockTransport>, RootProvider>;

    struct Harness {
        session: TestSession,
        wallet: Arc<MockTransport>,
        node: MockTransport,
        log: CallLog,
    }

    fn harness(with_wallet: bool, with_sponsor: bool) -> Harness {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let wallet = Arc::new(MockTransport::new("wallet", log.clone()));
        let node = MockTransport::new("node", log.clone());
        let sponsor = with_sponsor.then(|| SponsorAccount::from_private_key(DEV_KEY).unwrap());
        let session = Session::new(
            hoodi_testnet(),
            ContractBook::default(),
            NodeClient::new(node_provider(&node)),
            with_wallet.then(|| InjectedWallet::new(wallet.clone())),
            sponsor,
        );
        Harness {
            session,
            wallet,
            node,
            log,
        }
    }

    fn encoded_value(value: U256) -> Value {
        json!(Bytes::from(value.abi_encode()))
    }

    async fn connected(with_sponsor: bool) -> Harness {
        let mut h = harness(true, with_sponsor);
        h.wallet.respond("eth_requestAccounts", json!([ALICE]));
        h.node.respond("eth_call", encoded_value(U256::ZERO));
        h.session.connect_wallet().await.unwrap();
        h.log.lock().unwrap().clear();
        h
    }

    fn tokens(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
    }

    #[tokio::test]
    async fn test_connect_wallet_sets_account_and_balance() {
        let mut h = harness(true, false);
        h.wallet.respond("eth_requestAccounts", json!([ALICE]));
        h.node.respond("eth_call", encoded_value(U256::from(1_500_000_000_000_000_000u64)));

        let address = h.session.connect_wallet().await.unwrap();
        assert_eq!(address, ALICE);
        assert_eq!(h.session.user(), Some(ALICE));
        let board = h.session.board();
        assert_eq!(board.account_display, "0x1111...1111");
        assert_eq!(board.balance_display, "1.5");
        assert_eq!(board.tx_status, "Wallet connected!");
    }

    #[tokio::test]
    async fn test_connect_wallet_failure_is_reported() {
        let mut h = harness(true, false);
        h.wallet.fail("eth_requestAccounts", "User rejected the request.");

        let err = h.session.connect_wallet().await.unwrap_err();
        assert!(matches!(err, ClientError::Rpc(_)));
        assert_eq!(
            h.session.board().tx_status,
            "Failed to connect wallet: User rejected the request."
        );
        assert_eq!(h.session.user(), None);
    }

    #[tokio::test]
    async fn test_direct_deposit_waits_for_approval_receipt() {
        let mut h = connected(false).await;
        let approve_hash = B256::repeat_byte(0xaa);
        let deposit_hash = B256::repeat_byte(0xdd);
        h.wallet
            .respond("eth_sendTransaction", json!(approve_hash))
            .respond("eth_sendTransaction", json!(deposit_hash));
        h.node
            .respond("eth_getTransactionReceipt", Value::Null)
            .respond("eth_getTransactionReceipt", receipt_json(approve_hash, true))
            .respond("eth_getTransactionReceipt", receipt_json(deposit_hash, true));

        let outcome = h.session.direct_deposit("2").await.unwrap();
        assert_eq!(outcome.amount, tokens(2));
        assert_eq!(outcome.approve.transaction_hash, approve_hash);
        assert_eq!(outcome.deposit.transaction_hash, deposit_hash);
        assert_eq!(outcome.total_value, Some(U256::ZERO));

        assert_eq!(
            methods(&h.log),
            vec![
                "wallet:eth_sendTransaction",
                "node:eth_getTransactionReceipt",
                "node:eth_getTransactionReceipt",
                "wallet:eth_sendTransaction",
                "node:eth_getTransactionReceipt",
                "node:eth_call",
            ]
        );

        let log = h.log.lock().unwrap();
        let sent: Vec<&Value> = log
            .iter()
            .filter(|(m, _)| m == "wallet:eth_sendTransaction")
            .map(|(_, params)| params)
            .collect();
        let approve_data: Bytes = serde_json::from_value(sent[0][0]["data"].clone()).unwrap();
        let approve = IERC20::approveCall::abi_decode(&approve_data).unwrap();
        assert_eq!(approve.spender, ALCHEMIST_ADDRESS);
        assert_eq!(approve.amount, tokens(2));

        let deposit_data: Bytes = serde_json::from_value(sent[1][0]["data"].clone()).unwrap();
        let deposit = IAlchemist::depositCall::abi_decode(&deposit_data).unwrap();
        assert_eq!(deposit.recipient, ALICE);
        assert_eq!(deposit.yieldToken, YIELD_TOKEN_ADDRESS);
    }

    #[tokio::test]
    async fn test_direct_deposit_requires_connection() {
        let mut h = harness(true, false);
        let err = h.session.direct_deposit("1").await.unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));
        assert_eq!(h.session.board().tx_status, "Please connect your wallet first.");
        assert!(methods(&h.log).is_empty());
    }

    #[tokio::test]
    async fn test_direct_deposit_rejects_invalid_amounts_without_submitting() {
        let mut h = connected(false).await;
        for input in ["", "abc", "0", "-3"] {
            let err = h.session.direct_deposit(input).await.unwrap_err();
            assert!(matches!(err, ClientError::InvalidAmount(AmountError::Invalid)));
            assert_eq!(h.session.board().tx_status, "Please enter a valid amount.");
        }
        assert!(methods(&h.log).is_empty());
    }

    #[tokio::test]
    async fn test_deposit_failure_after_approval_leaves_approval() {
        let mut h = connected(false).await;
        let approve_hash = B256::repeat_byte(0xaa);
        h.wallet
            .respond("eth_sendTransaction", json!(approve_hash))
            .fail("eth_sendTransaction", "execution reverted");
        h.node
            .respond("eth_getTransactionReceipt", receipt_json(approve_hash, true));

        let err = h.session.direct_deposit("1").await.unwrap_err();
        assert!(matches!(err, ClientError::Rpc(_)));
        assert_eq!(h.session.board().tx_status, "Deposit failed: execution reverted");
        assert_eq!(
            methods(&h.log),
            vec![
                "wallet:eth_sendTransaction",
                "node:eth_getTransactionReceipt",
                "wallet:eth_sendTransaction",
            ]
        );
    }

    #[tokio::test]
    async fn test_reverted_approval_stops_the_flow() {
        let mut h = connected(false).await;
        let approve_hash = B256::repeat_byte(0xaa);
        h.wallet.respond("eth_sendTransaction", json!(approve_hash));
        h.node
            .respond("eth_getTransactionReceipt", receipt_json(approve_hash, false));

        let err = h.session.direct_deposit("1").await.unwrap_err();
        assert!(matches!(err, ClientError::Reverted(hash) if hash == approve_hash));
        assert!(h.session.board().tx_status.starts_with("Deposit failed: Transaction"));
        assert_eq!(
            methods(&h.log)
                .iter()
                .filter(|m| m.as_str() == "wallet:eth_sendTransaction")
                .count(),
            1
        );
    }

    fn script_sponsored_node(node: &MockTransport, tx_hash: B256) {
        node.respond("eth_chainId", json!("0x88bb0"))
            .respond("eth_getTransactionCount", json!("0x0"))
            .respond("eth_estimateGas", json!("0x30d40"))
            .respond("eth_feeHistory", fee_history_json())
            .respond("eth_sendRawTransaction", json!(tx_hash))
            .respond("eth_getTransactionReceipt", receipt_json(tx_hash, true));
    }

    #[tokio::test]
    async fn test_sponsored_deposit_batches_approve_then_deposit() {
        let mut h = connected(true).await;
        let tx_hash = B256::repeat_byte(0x77);
        script_sponsored_node(&h.node, tx_hash);

        let outcome = h.session.sponsor_deposit().await.unwrap();
        assert_eq!(outcome.amount, tokens(10));
        assert_eq!(outcome.receipt.transaction_hash, tx_hash);
        assert!(h.session.board().tx_status.starts_with("Sponsored deposit confirmed!"));

        let log = h.log.lock().unwrap();
        let (_, params) = log
            .iter()
            .find(|(m, _)| m == "node:eth_sendRawTransaction")
            .unwrap();
        let raw: Bytes = serde_json::from_value(params[0].clone()).unwrap();
        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap();
        let tx = envelope.as_eip7702().unwrap().tx();

        assert_eq!(tx.to, outcome.authority);
        assert_eq!(tx.chain_id, 560_048);
        assert_eq!(tx.nonce, 0);
        assert_eq!(tx.gas_limit, 200_000);
        assert_eq!(tx.max_fee_per_gas, 3_000_000_000);
        assert_eq!(tx.authorization_list.len(), 1);
        assert_eq!(
            tx.authorization_list[0].recover_authority().unwrap(),
            outcome.authority
        );

        let batch = IBatchCallAndSponsor::executeCall::abi_decode(&tx.input).unwrap();
        assert_eq!(batch.calls.len(), 2);
        let approve = IERC20::approveCall::abi_decode(&batch.calls[0].data).unwrap();
        assert_eq!(approve.amount, tokens(10));
        let deposit = IAlchemist::depositCall::abi_decode(&batch.calls[1].data).unwrap();
        assert_eq!(deposit.amount, tokens(10));
        assert_eq!(deposit.recipient, ALICE);

        // The wallet never signs anything in the sponsored path.
        assert!(!log.iter().any(|(m, _)| m.starts_with("wallet:")));
    }

    #[tokio::test]
    async fn test_sponsored_deposit_without_sponsor() {
        let mut h = connected(false).await;
        let err = h.session.sponsor_deposit().await.unwrap_err();
        assert!(matches!(err, ClientError::SponsorUnavailable));
        assert_eq!(h.session.board().tx_status, "Sponsor account not configured.");
        assert!(methods(&h.log).is_empty());
    }

    #[tokio::test]
    async fn test_sponsored_deposit_preparation_failure() {
        let mut h = connected(true).await;
        h.node.fail("eth_chainId", "connection refused");
        let err = h.session.sponsor_deposit().await.unwrap_err();
        assert!(matches!(err, ClientError::Rpc(_)));
        assert_eq!(
            h.session.board().tx_status,
            "Failed to generate authorization: connection refused"
        );
    }

    #[tokio::test]
    async fn test_sponsored_deposit_submission_failure() {
        let mut h = connected(true).await;
        h.node
            .respond("eth_chainId", json!("0x88bb0"))
            .respond("eth_getTransactionCount", json!("0x0"))
            .respond("eth_estimateGas", json!("0x30d40"))
            .respond("eth_feeHistory", fee_history_json())
            .fail("eth_sendRawTransaction", "insufficient funds for gas");

        let err = h.session.sponsor_deposit().await.unwrap_err();
        assert!(matches!(err, ClientError::Rpc(_)));
        assert_eq!(
            h.session.board().tx_status,
            "Sponsored deposit failed: insufficient funds for gas"
        );
        assert!(!methods(&h.log).contains(&"node:eth_getTransactionReceipt".to_string()));
    }

    #[tokio::test]
    async fn test_accounts_changed_to_empty_disconnects() {
        let mut h = connected(false).await;
        h.session.accounts_changed(&[]).await;
        assert_eq!(h.session.user(), None);
        assert_eq!(h.session.board().account_display, NOT_CONNECTED);
        assert_eq!(h.session.board().tx_status, "Wallet disconnected.");
    }

    #[tokio::test]
    async fn test_accounts_changed_switches_account() {
        let mut h = connected(false).await;
        let bob = address!("2222222222222222222222222222222222222222");
        h.session.accounts_changed(&[bob]).await;
        assert_eq!(h.session.user(), Some(bob));
        assert_eq!(h.session.board().account_display, "0x2222...2222");
    }

    #[tokio::test]
    async fn test_total_value_requires_connection() {
        let mut h = harness(true, false);
        let err = h.session.total_value().await.unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));
        assert!(methods(&h.log).is_empty());
    }

    #[tokio::test]
    async fn test_total_value_read_failure() {
        let mut h = connected(false).await;
        h.node.clear("eth_call").fail("eth_call", "execution reverted");
        let err = h.session.total_value().await.unwrap_err();
        assert!(matches!(err, ClientError::Rpc(_)));
        assert_eq!(
            h.session.board().tx_status,
            "Failed to get total value: execution reverted"
        );
    }

    #[tokio::test]
    async fn test_init_without_wallet_reports_missing_provider() {
        let mut h = harness(false, true);
        h.node.respond("eth_chainId", json!("0x88bb0"));
        h.session.init().await;
        assert_eq!(
            h.session.board().tx_status,
            "Ethereum wallet not installed. Please install MetaMask or similar."
        );
    }

    #[tokio::test]
    async fn test_init_auto_connects_existing_account() {
        let mut h = harness(true, true);
        h.node.respond("eth_chainId", json!("0x88bb0"));
        h.wallet
            .respond("eth_chainId", json!("0x88bb0"))
            .respond("eth_accounts", json!([ALICE]));
        h.node.respond("eth_call", encoded_value(tokens(3)));

        h.session.init().await;
        assert_eq!(h.session.user(), Some(ALICE));
        assert_eq!(h.session.board().balance_display, "3");
    }

    #[tokio::test]
    async fn test_init_reports_missing_sponsor_key() {
        let mut h = harness(true, false);
        h.node.respond("eth_chainId", json!("0x88bb0"));
        h.wallet
            .respond("eth_chainId", json!("0x88bb0"))
            .respond("eth_accounts", json!([]));
        h.session.init().await;
        assert_eq!(
            h.session.board().tx_status,
            "Error: Private key not configured. Please check your .env file."
        );
    }

    #[tokio::test]
    async fn test_verify_chain_mismatch() {
        let h = harness(false, false);
        h.node.respond("eth_chainId", json!("0x1"));
        assert!(!h.session.verify_chain().await);
    }

    #[tokio::test]
    async fn test_add_chain_to_wallet() {
        let mut h = harness(true, false);
        h.wallet.respond("wallet_addEthereumChain", Value::Null);
        h.session.add_chain_to_wallet().await.unwrap();
        assert_eq!(h.session.board().tx_status, "Hoodi Testnet added to wallet.");
    }
}
