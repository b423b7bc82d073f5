use crate::amount::AmountError;
use crate::rpc_provider::RpcError;
use crate::sponsor::SponsorError;
use alloy::primitives::B256;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Please connect your wallet first.")]
    NotConnected,

    #[error("Ethereum wallet not installed. Please install MetaMask or similar.")]
    WalletUnavailable,

    #[error("Sponsor account not configured.")]
    SponsorUnavailable,

    #[error("Wallet returned no accounts")]
    NoAccounts,

    #[error(transparent)]
    InvalidAmount(#[from] AmountError),

    #[error("Invalid account list: {0}")]
    InvalidAccounts(String),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Sponsor(#[from] SponsorError),

    #[error("Transaction {0} reverted")]
    Reverted(B256),

    #[error("Could not decode {what}: {details}")]
    Decode { what: &'static str, details: String },
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ClientError {
    /// Precondition and validation failures are shown as-is; anything else
    /// is prefixed with the failing operation.
    pub fn status_line(&self, operation: &str) -> String {
        match self {
            Self::NotConnected
            | Self::WalletUnavailable
            | Self::SponsorUnavailable
            | Self::InvalidAmount(_)
            | Self::InvalidAccounts(_) => self.to_string(),
            _ => format!("{operation}: {self}"),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotConnected => StatusCode::CONFLICT,
            Self::WalletUnavailable | Self::SponsorUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidAmount(_) | Self::InvalidAccounts(_) => StatusCode::BAD_REQUEST,
            Self::Rpc(_) | Self::NoAccounts | Self::Decode { .. } => StatusCode::BAD_GATEWAY,
            Self::Sponsor(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Reverted(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn error_type(&self) -> &str {
        match self {
            Self::NotConnected | Self::InvalidAmount(_) | Self::InvalidAccounts(_) => {
                "VALIDATION_ERROR"
            }
            Self::WalletUnavailable | Self::NoAccounts | Self::Rpc(_) => "CONNECTION_ERROR",
            Self::SponsorUnavailable => "NOT_CONFIGURED",
            Self::Sponsor(_) => "SIGNATURE_ERROR",
            Self::Reverted(_) | Self::Decode { .. } => "TRANSACTION_FAILED",
        }
    }
}

impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.error_type().to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}
