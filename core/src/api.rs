use crate::amount::format_amount;
use crate::display::StatusBoard;
use crate::errors::ClientError;
use crate::rpc_provider::Transport;
use crate::session::Session;
use crate::wallet::parse_accounts;
use alloy::providers::Provider;
use axum::{
    extract::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use utoipa::{OpenApi, ToSchema};

/// One session shared by all handlers. The mutex admits one flow at a time.
pub type SharedSession<W, P> = Arc<Mutex<Session<W, P>>>;

#[derive(Deserialize, ToSchema)]
pub struct DepositRequest {
    /// Decimal token amount, e.g. "1.5".
    #[schema(example = "1.5")]
    pub amount: String,
}

#[derive(Serialize, ToSchema)]
pub struct DepositResponse {
    #[schema(example = "1.5")]
    pub amount: String,
    pub approve_tx: String,
    pub deposit_tx: String,
    /// Block explorer page of the deposit transaction.
    pub explorer_url: String,
    /// Vault total value after the deposit, when it could be read.
    pub total_value: Option<String>,
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct SponsoredDepositResponse {
    #[schema(example = "10")]
    pub amount: String,
    pub sponsor: String,
    pub authority: String,
    pub transaction: String,
    pub explorer_url: String,
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct ConnectResponse {
    pub address: String,
    pub account_display: String,
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct BalanceResponse {
    pub address: Option<String>,
    #[schema(example = "12.5")]
    pub total_value: String,
    pub status: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AccountsChangedRequest {
    /// Accounts now exposed by the wallet; empty means disconnected.
    pub accounts: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/connect",
    responses(
        (status = 200, description = "Wallet connected", body = ConnectResponse),
        (status = 502, description = "Wallet unreachable or rejected the request")
    ),
    tag = "Wallet"
)]
pub async fn connect_wallet<W, P>(
    Extension(session): Extension<SharedSession<W, P>>,
) -> Result<Json<ConnectResponse>, ClientError>
where
    W: Transport + 'static,
    P: Provider + Clone + 'static,
{
    let mut session = session.lock().await;
    let address = session.connect_wallet().await?;
    let board = session.board();
    Ok(Json(ConnectResponse {
        address: address.to_string(),
        account_display: board.account_display.clone(),
        status: board.tx_status.clone(),
    }))
}

#[utoipa::path(
    post,
    path = "/deposit",
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Approve and deposit confirmed", body = DepositResponse),
        (status = 400, description = "Invalid amount"),
        (status = 409, description = "No wallet account connected")
    ),
    tag = "Deposit"
)]
pub async fn deposit<W, P>(
    Extension(session): Extension<SharedSession<W, P>>,
    Json(payload): Json<DepositRequest>,
) -> Result<Json<DepositResponse>, ClientError>
where
    W: Transport + 'static,
    P: Provider + Clone + 'static,
{
    tracing::info!(amount = %payload.amount, "Direct deposit requested");
    let mut session = session.lock().await;
    let outcome = session.direct_deposit(&payload.amount).await?;
    let deposit_tx = outcome.deposit.transaction_hash.to_string();
    Ok(Json(DepositResponse {
        amount: format_amount(outcome.amount),
        approve_tx: outcome.approve.transaction_hash.to_string(),
        explorer_url: session.chain().tx_url(&deposit_tx),
        deposit_tx,
        total_value: outcome.total_value.map(format_amount),
        status: session.board().tx_status.clone(),
    }))
}

#[utoipa::path(
    post,
    path = "/sponsor-deposit",
    responses(
        (status = 200, description = "Sponsored batch confirmed", body = SponsoredDepositResponse),
        (status = 503, description = "Sponsor key not configured")
    ),
    tag = "Deposit"
)]
pub async fn sponsor_deposit<W, P>(
    Extension(session): Extension<SharedSession<W, P>>,
) -> Result<Json<SponsoredDepositResponse>, ClientError>
where
    W: Transport + 'static,
    P: Provider + Clone + 'static,
{
    let mut session = session.lock().await;
    let outcome = session.sponsor_deposit().await?;
    let transaction = outcome.receipt.transaction_hash.to_string();
    Ok(Json(SponsoredDepositResponse {
        amount: format_amount(outcome.amount),
        sponsor: outcome.sponsor.to_string(),
        authority: outcome.authority.to_string(),
        explorer_url: session.chain().tx_url(&transaction),
        transaction,
        status: session.board().tx_status.clone(),
    }))
}

#[utoipa::path(
    get,
    path = "/balance",
    responses(
        (status = 200, description = "Total value read from the vault", body = BalanceResponse),
        (status = 409, description = "No wallet account connected")
    ),
    tag = "Deposit"
)]
pub async fn view_balance<W, P>(
    Extension(session): Extension<SharedSession<W, P>>,
) -> Result<Json<BalanceResponse>, ClientError>
where
    W: Transport + 'static,
    P: Provider + Clone + 'static,
{
    let mut session = session.lock().await;
    let value = session.total_value().await?;
    Ok(Json(BalanceResponse {
        address: session.user().map(|a| a.to_string()),
        total_value: format_amount(value),
        status: session.board().tx_status.clone(),
    }))
}

#[utoipa::path(
    post,
    path = "/accounts-changed",
    request_body = AccountsChangedRequest,
    responses(
        (status = 200, description = "Session updated", body = StatusBoard),
        (status = 400, description = "Malformed account list")
    ),
    tag = "Wallet"
)]
pub async fn accounts_changed<W, P>(
    Extension(session): Extension<SharedSession<W, P>>,
    Json(payload): Json<AccountsChangedRequest>,
) -> Result<Json<StatusBoard>, ClientError>
where
    W: Transport + 'static,
    P: Provider + Clone + 'static,
{
    let accounts = parse_accounts(&payload.accounts)?;
    let mut session = session.lock().await;
    session.accounts_changed(&accounts).await;
    Ok(Json(session.board().clone()))
}

#[utoipa::path(
    post,
    path = "/chain/add",
    responses(
        (status = 200, description = "Chain registered with the wallet", body = StatusBoard)
    ),
    tag = "Wallet"
)]
pub async fn add_chain<W, P>(
    Extension(session): Extension<SharedSession<W, P>>,
) -> Result<Json<StatusBoard>, ClientError>
where
    W: Transport + 'static,
    P: Provider + Clone + 'static,
{
    let mut session = session.lock().await;
    session.add_chain_to_wallet().await?;
    Ok(Json(session.board().clone()))
}

#[utoipa::path(
    get,
    path = "/status",
    responses(
        (status = 200, description = "Current display elements", body = StatusBoard)
    ),
    tag = "Wallet"
)]
pub async fn status<W, P>(Extension(session): Extension<SharedSession<W, P>>) -> Json<StatusBoard>
where
    W: Transport + 'static,
    P: Provider + Clone + 'static,
{
    Json(session.lock().await.board().clone())
}

async fn health_check() -> &'static str {
    "OK"
}

#[derive(OpenApi)]
#[openapi(
    paths(connect_wallet, deposit, sponsor_deposit, view_balance, accounts_changed, add_chain, status),
    components(schemas(
        DepositRequest, DepositResponse, SponsoredDepositResponse,
        ConnectResponse, BalanceResponse, AccountsChangedRequest, StatusBoard
    )),
    tags(
        (name = "Wallet", description = "Wallet session and status"),
        (name = "Deposit", description = "Alchemist deposits and total value")
    ),
    info(
        title = "Alchemist Deposit API",
        version = "0.1.0",
        description = "Direct and sponsored deposits into the Alchemist vault"
    )
)]
pub struct ApiDoc;

/// Routes for the deposit actions and the status board.
pub fn router<W, P>(session: SharedSession<W, P>) -> Router
where
    W: Transport + 'static,
    P: Provider + Clone + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(status::<W, P>))
        .route("/connect", post(connect_wallet::<W, P>))
        .route("/deposit", post(deposit::<W, P>))
        .route("/sponsor-deposit", post(sponsor_deposit::<W, P>))
        .route("/balance", get(view_balance::<W, P>))
        .route("/accounts-changed", post(accounts_changed::<W, P>))
        .route("/chain/add", post(add_chain::<W, P>))
        .layer(Extension(session))
}
