use serde::Serialize;
use utoipa::ToSchema;

/// Shown in the account element while no wallet account is attached.
pub const NOT_CONNECTED: &str = "Not connected";

/// Maximum number of status messages retained in the history.
const HISTORY_LIMIT: usize = 64;

/// Display elements updated by the client, keyed by their page ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    TxStatus,
    AccountDisplay,
    BalanceDisplay,
}

impl Element {
    pub fn id(self) -> &'static str {
        match self {
            Self::TxStatus => "txStatus",
            Self::AccountDisplay => "accountDisplay",
            Self::BalanceDisplay => "balanceDisplay",
        }
    }
}

/// Text currently shown by each display element, plus recent status lines.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusBoard {
    #[schema(example = "Deposit successful!")]
    pub tx_status: String,
    #[schema(example = "0x1234...abcd")]
    pub account_display: String,
    #[schema(example = "12.5")]
    pub balance_display: String,
    pub history: Vec<String>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self {
            tx_status: String::new(),
            account_display: NOT_CONNECTED.to_string(),
            balance_display: "0".to_string(),
            history: Vec::new(),
        }
    }
}

impl StatusBoard {
    pub fn set(&mut self, element: Element, text: impl Into<String>) {
        let text = text.into();
        tracing::info!(element = element.id(), "{}", text);
        match element {
            Element::TxStatus => {
                if self.history.len() == HISTORY_LIMIT {
                    self.history.remove(0);
                }
                self.history.push(text.clone());
                self.tx_status = text;
            }
            Element::AccountDisplay => self.account_display = text,
            Element::BalanceDisplay => self.balance_display = text,
        }
    }

    pub fn status(&mut self, message: impl Into<String>) {
        self.set(Element::TxStatus, message);
    }
}

/// `0x1234...abcd`: first 6 and last 4 characters.
pub fn shorten_address(address: &str) -> String {
    shorten(address, 6, 4)
}

/// `0x12345678...abcdef`: first 10 and last 6 characters.
pub fn shorten_hash(hash: &str) -> String {
    shorten(hash, 10, 6)
}

fn shorten(value: &str, head: usize, tail: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= head + tail {
        return value.to_string();
    }
    let start: String = chars[..head].iter().collect();
    let end: String = chars[chars.len() - tail..].iter().collect();
    format!("{start}...{end}")
}
