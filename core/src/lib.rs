//! Client for depositing into the Alchemist vault, either directly from the
//! user's wallet or through a sponsor-paid EIP-7702 batch.

pub mod amount;
pub mod api;
pub mod contracts;
pub mod display;
pub mod errors;
pub mod network_config;
pub mod node;
pub mod rpc_provider;
pub mod session;
pub mod sponsor;
pub mod wallet;

pub use errors::ClientError;
pub use session::{DepositOutcome, Session, SponsoredOutcome};
