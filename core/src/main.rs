use alchemist_core::api::{self, ApiDoc, SharedSession};
use alchemist_core::contracts::ContractBook;
use alchemist_core::network_config::{hoodi_testnet, resolve_preset, NetworkConfig};
use alchemist_core::node::NodeClient;
use alchemist_core::rpc_provider::{HttpTransport, RpcProvider};
use alchemist_core::sponsor::SponsorAccount;
use alchemist_core::wallet::{spawn_account_watcher, InjectedWallet};
use alchemist_core::Session;
use alloy::primitives::Address;
use alloy::providers::RootProvider;
use axum::{routing::get, Router};
use config::{Config, ConfigError};
use serde::Deserialize;
use std::env;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

type LiveSession = Session<Arc<HttpTransport>, RootProvider>;

const USAGE: &str = "Usage: alchemist-core [serve | connect | deposit <amount> | sponsor-deposit | balance | add-chain | verify-chain | watch]";

#[derive(Deserialize)]
struct AppConfig {
    server_port: u16,
    rust_log: String,
    chain: String,
    rpc_url: Option<String>,
    rpc_auth_header: Option<String>,
    rpc_auth_value: Option<String>,
    wallet_rpc_url: Option<String>,
    sponsor_private_key: Option<String>,
    rpc_timeout_secs: u64,
    receipt_poll_ms: u64,
    account_poll_ms: u64,
    alchemist_address: Option<String>,
    batch_call_address: Option<String>,
    yield_token_address: Option<String>,
}

fn load_config() -> Result<AppConfig, ConfigError> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let settings = Config::builder()
        .add_source(config::Environment::default())
        .set_default("server_port", 8080)?
        .set_default("rust_log", "info")?
        .set_default("chain", "hoodi")?
        .set_default("rpc_timeout_secs", 30)?
        .set_default("receipt_poll_ms", 2000)?
        .set_default("account_poll_ms", 4000)?
        .build()?;

    settings.try_deserialize()
}

fn resolve_chain(config: &AppConfig) -> NetworkConfig {
    let chain = resolve_preset(&config.chain).unwrap_or_else(|| {
        tracing::warn!(chain = %config.chain, "Unknown chain preset, using Hoodi");
        hoodi_testnet()
    });
    match &config.rpc_url {
        Some(url) if !url.is_empty() => chain.with_rpc_http(url.clone()),
        _ => chain,
    }
}

fn resolve_contracts(config: &AppConfig) -> Result<ContractBook, Box<dyn Error>> {
    let mut book = ContractBook::default();
    if let Some(addr) = &config.alchemist_address {
        book.alchemist = addr.parse::<Address>()?;
    }
    if let Some(addr) = &config.batch_call_address {
        book.batch_call = addr.parse::<Address>()?;
    }
    if let Some(addr) = &config.yield_token_address {
        book.yield_token = addr.parse::<Address>()?;
    }
    Ok(book)
}

fn load_sponsor(config: &AppConfig) -> Option<SponsorAccount> {
    let key = config.sponsor_private_key.as_deref().filter(|k| !k.trim().is_empty())?;
    match SponsorAccount::from_private_key(key) {
        Ok(account) => Some(account),
        Err(e) => {
            tracing::error!(error = %e, "Sponsor key rejected; sponsored deposits disabled");
            None
        }
    }
}

/// Build the session plus a second handle on the wallet transport for the
/// account watcher.
fn build_session(
    config: &AppConfig,
) -> Result<(LiveSession, Option<Arc<HttpTransport>>), Box<dyn Error>> {
    let chain = resolve_chain(config);
    let contracts = resolve_contracts(config)?;
    let timeout = Duration::from_secs(config.rpc_timeout_secs);

    let node_provider = RpcProvider::new(chain.network.clone(), chain.rpc_http.clone()).with_auth(
        config.rpc_auth_header.clone(),
        config.rpc_auth_value.clone(),
    );
    let node = NodeClient::new(
        node_provider.connect_node(timeout, Duration::from_millis(config.receipt_poll_ms))?,
    );

    let wallet_transport = config
        .wallet_rpc_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .map(|url| Arc::new(HttpTransport::new(RpcProvider::new("wallet", url)).with_timeout(timeout)));

    let session = Session::new(
        chain,
        contracts,
        node,
        wallet_transport.clone().map(InjectedWallet::new),
        load_sponsor(config),
    );
    Ok((session, wallet_transport))
}

/// Forward wallet account changes into the shared session.
fn spawn_account_forwarder(
    session: SharedSession<Arc<HttpTransport>, RootProvider>,
    transport: Arc<HttpTransport>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    let mut watcher = spawn_account_watcher(transport, interval);
    tokio::spawn(async move {
        while let Some(accounts) = watcher.events.recv().await {
            session.lock().await.accounts_changed(&accounts).await;
        }
    })
}

fn print_board(session: &LiveSession) {
    match serde_json::to_string_pretty(session.board()) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!("Failed to render status: {}", e),
    }
}

async fn run_command(command: &str, args: &[String], session: &mut LiveSession) -> bool {
    match command {
        "connect" => session.connect_wallet().await.is_ok(),
        "deposit" => match args.get(2) {
            Some(amount) => session.direct_deposit(amount).await.is_ok(),
            None => {
                eprintln!("{USAGE}");
                false
            }
        },
        "sponsor-deposit" => session.sponsor_deposit().await.is_ok(),
        "balance" => session.total_value().await.is_ok(),
        "add-chain" => session.add_chain_to_wallet().await.is_ok(),
        "verify-chain" => session.verify_chain().await,
        _ => {
            eprintln!("{USAGE}");
            false
        }
    }
}

async fn serve(config: &AppConfig, session: LiveSession, wallet: Option<Arc<HttpTransport>>) {
    tracing::info!("Starting Alchemist deposit API server...");

    let shared: SharedSession<_, _> = Arc::new(Mutex::new(session));
    if let Some(transport) = wallet {
        spawn_account_forwarder(
            shared.clone(),
            transport,
            Duration::from_millis(config.account_poll_ms),
        );
    }

    let cors = CorsLayer::new().allow_origin(Any);

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(|| async { "Alchemist deposit client. See /swagger-ui." }))
        .merge(api::router(shared))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let bind_addr = format!("0.0.0.0:{}", config.server_port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on http://{}", bind_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server failed: {}", e);
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() {
    // -------------------------------
    // Load configuration
    // -------------------------------
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // -------------------------------
    // Initialize Tracing / Logging
    // -------------------------------
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.rust_log));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        chain = %config.chain,
        wallet = config.wallet_rpc_url.is_some(),
        sponsor = config.sponsor_private_key.is_some(),
        "Alchemist client starting..."
    );

    let (mut session, wallet) = match build_session(&config) {
        Ok(built) => built,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    session.init().await;

    // -------------------------------
    // CLI Argument Handling
    // -------------------------------
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("serve");

    match command {
        "serve" => serve(&config, session, wallet).await,
        "watch" => {
            let Some(transport) = wallet else {
                print_board(&session);
                std::process::exit(1);
            };
            let mut watcher =
                spawn_account_watcher(transport, Duration::from_millis(config.account_poll_ms));
            print_board(&session);
            while let Some(accounts) = watcher.events.recv().await {
                session.accounts_changed(&accounts).await;
                print_board(&session);
            }
        }
        other => {
            let ok = run_command(other, &args, &mut session).await;
            print_board(&session);
            if !ok {
                std::process::exit(1);
            }
        }
    }
}
