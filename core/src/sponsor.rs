use alloy::eips::eip7702::{Authorization, SignedAuthorization};
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, U256};
use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use alloy::signers::SignerSync;
use thiserror::Error;

/// Mnemonic of the temporary account that delegates to the batch contract.
/// It only ever holds a delegation, never funds of its own.
pub const TEMP_ACCOUNT_MNEMONIC: &str =
    "legal winner thank year wave sausage worth useful legal winner thank yellow";

#[derive(Error, Debug)]
pub enum SponsorError {
    #[error("Private key not configured. Please check your .env file.")]
    MissingKey,

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("{0}")]
    Signing(#[from] alloy::signers::Error),
}

/// The funded sponsor key plus the temporary account whose code is
/// delegated to the batch contract for the duration of a submission.
pub struct SponsorAccount {
    sponsor: PrivateKeySigner,
    delegate: PrivateKeySigner,
}

impl SponsorAccount {
    pub fn new(sponsor: PrivateKeySigner, delegate: PrivateKeySigner) -> Self {
        Self { sponsor, delegate }
    }

    /// Sponsor from a hex private key (the `0x` prefix is optional), with the
    /// temporary account derived from [`TEMP_ACCOUNT_MNEMONIC`].
    pub fn from_private_key(key: &str) -> Result<Self, SponsorError> {
        let sponsor = signer_from_hex(key)?;
        let delegate = signer_from_mnemonic(TEMP_ACCOUNT_MNEMONIC)?;
        tracing::info!(
            sponsor = %sponsor.address(),
            delegate = %delegate.address(),
            "Sponsor account loaded (sponsor must be funded)"
        );
        Ok(Self::new(sponsor, delegate))
    }

    pub fn sponsor_address(&self) -> Address {
        self.sponsor.address()
    }

    pub fn delegate_address(&self) -> Address {
        self.delegate.address()
    }

    /// EIP-7702 authorization from the temporary account delegating its code
    /// to `contract`. `nonce` must be the temporary account's current nonce.
    pub fn sign_authorization(
        &self,
        chain_id: u64,
        contract: Address,
        nonce: u64,
    ) -> Result<SignedAuthorization, SponsorError> {
        let authorization = Authorization {
            chain_id: U256::from(chain_id),
            address: contract,
            nonce,
        };
        let signature = self.delegate.sign_hash_sync(&authorization.signature_hash())?;
        Ok(authorization.into_signed(signature))
    }

    /// Wallet holding only the sponsor key. It pays for and signs the
    /// type-4 transaction.
    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.sponsor.clone())
    }
}

/// Parse a hex private key, tolerating surrounding whitespace and a missing
/// `0x` prefix.
pub fn signer_from_hex(key: &str) -> Result<PrivateKeySigner, SponsorError> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(SponsorError::MissingKey);
    }
    let bytes = hex::decode(trimmed.trim_start_matches("0x"))
        .map_err(|e| SponsorError::InvalidKey(e.to_string()))?;
    PrivateKeySigner::from_slice(&bytes).map_err(|e| SponsorError::InvalidKey(e.to_string()))
}

/// First account (`m/44'/60'/0'/0/0`) of a BIP-39 mnemonic.
pub fn signer_from_mnemonic(phrase: &str) -> Result<PrivateKeySigner, SponsorError> {
    MnemonicBuilder::<English>::default()
        .phrase(phrase)
        .index(0)
        .and_then(|builder| builder.build())
        .map_err(|e| SponsorError::InvalidMnemonic(e.to_string()))
}
