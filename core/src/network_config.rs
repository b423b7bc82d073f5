use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ── Chain descriptor ──────────────────────────────────────────────────────────

/// Native currency of a chain, as wallets expect it in `wallet_addEthereumChain`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Static description of the target network. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// Human-readable label for this chain.
    pub name: String,
    /// Short network slug (e.g. "hoodi-testnet").
    pub network: String,
    /// EIP-155 chain id.
    pub chain_id: u64,
    pub native_currency: NativeCurrency,

    // ── Endpoints ─────────────────────────────────────────────────────────
    /// JSON-RPC over HTTP.
    pub rpc_http: String,
    /// JSON-RPC over websocket, if the chain publishes one.
    pub rpc_ws: Option<String>,

    // ── Explorer ──────────────────────────────────────────────────────────
    pub explorer_name: String,
    pub explorer_url: String,

    pub testnet: bool,
}

impl NetworkConfig {
    /// Chain id as the `0x`-prefixed hex quantity wallets expect.
    pub fn chain_id_hex(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }

    /// Replace the HTTP RPC endpoint, keeping everything else.
    pub fn with_rpc_http(mut self, url: impl Into<String>) -> Self {
        self.rpc_http = url.into();
        self
    }

    /// Explorer link for a transaction hash.
    pub fn tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), hash)
    }

    /// Params for `wallet_addEthereumChain` (EIP-3085).
    pub fn add_chain_params(&self) -> Value {
        json!([{
            "chainId": self.chain_id_hex(),
            "chainName": self.name,
            "nativeCurrency": {
                "name": self.native_currency.name,
                "symbol": self.native_currency.symbol,
                "decimals": self.native_currency.decimals,
            },
            "rpcUrls": [self.rpc_http],
            "blockExplorerUrls": [self.explorer_url],
        }])
    }

    /// Whether a chain id reported by a node or wallet is this chain.
    pub fn is_chain(&self, chain_id: u64) -> bool {
        self.chain_id == chain_id
    }
}

// ── Pre-set chains ────────────────────────────────────────────────────────────

/// Hoodi public testnet.
pub fn hoodi_testnet() -> NetworkConfig {
    NetworkConfig {
        name: "Hoodi Testnet".to_string(),
        network: "hoodi-testnet".to_string(),
        chain_id: 560_048,
        native_currency: NativeCurrency {
            name: "Hoodi Ether".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        },
        rpc_http: "https://ethereum-hoodi-rpc.publicnode.com".to_string(),
        rpc_ws: Some("wss://ws.testnet.hoodi.xyz".to_string()),
        explorer_name: "HoodiScan".to_string(),
        explorer_url: "https://hoodi.etherscan.io/".to_string(),
        testnet: true,
    }
}

/// Local development node (anvil / hardhat defaults).
pub fn local_devnet() -> NetworkConfig {
    NetworkConfig {
        name: "Local Devnet".to_string(),
        network: "localhost".to_string(),
        chain_id: 31_337,
        native_currency: NativeCurrency {
            name: "Ether".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        },
        rpc_http: "http://127.0.0.1:8545".to_string(),
        rpc_ws: Some("ws://127.0.0.1:8545".to_string()),
        explorer_name: "None".to_string(),
        explorer_url: "http://127.0.0.1:8545".to_string(),
        testnet: true,
    }
}

/// Resolve a preset name to the corresponding `NetworkConfig`.
///
/// Recognised names (case-insensitive):
/// - `"hoodi"` / `"hoodi-testnet"` / `"560048"`
/// - `"local"` / `"localhost"` / `"anvil"` / `"31337"`
pub fn resolve_preset(name: &str) -> Option<NetworkConfig> {
    match name.trim().to_lowercase().as_str() {
        "hoodi" | "hoodi-testnet" | "560048" => Some(hoodi_testnet()),
        "local" | "localhost" | "anvil" | "31337" => Some(local_devnet()),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
