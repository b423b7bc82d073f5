//! ABI bindings and calldata builders for the vault, its yield token, and the
//! batch executor the sponsor delegates to.

use alloy::primitives::{address, Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use serde::{Deserialize, Serialize};

sol! {
    /// ERC-20 subset used for deposits.
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Alchemist vault.
    interface IAlchemist {
        function deposit(address yieldToken, uint256 amount, address recipient) external returns (uint256);
        function totalValue(address owner) external view returns (uint256);
    }

    /// Batch executor installed on a delegating account via EIP-7702.
    interface IBatchCallAndSponsor {
        struct Call {
            address to;
            uint256 value;
            bytes data;
        }

        function execute(Call[] calldata calls) external payable;
    }
}

pub use IBatchCallAndSponsor::Call;

pub const ALCHEMIST_ADDRESS: Address = address!("8b8d2eFB5Fc6B016A67B94c89493545D5271C992");
pub const BATCH_CALL_SPONSOR_ADDRESS: Address =
    address!("68545eceD4C6552cDc5AEc36177068D2BE12A101");
pub const YIELD_TOKEN_ADDRESS: Address = address!("703bD932493Ad379075fA8aaC36518A3D6330B88");

/// Addresses of the deployed contracts a session talks to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContractBook {
    pub alchemist: Address,
    pub batch_call: Address,
    pub yield_token: Address,
}

impl Default for ContractBook {
    fn default() -> Self {
        Self {
            alchemist: ALCHEMIST_ADDRESS,
            batch_call: BATCH_CALL_SPONSOR_ADDRESS,
            yield_token: YIELD_TOKEN_ADDRESS,
        }
    }
}

impl ContractBook {
    /// `approve(alchemist, amount)` on the yield token.
    pub fn approve_calldata(&self, amount: U256) -> Bytes {
        IERC20::approveCall {
            spender: self.alchemist,
            amount,
        }
        .abi_encode()
        .into()
    }

    /// `deposit(yieldToken, amount, recipient)` on the vault.
    pub fn deposit_calldata(&self, amount: U256, recipient: Address) -> Bytes {
        IAlchemist::depositCall {
            yieldToken: self.yield_token,
            amount,
            recipient,
        }
        .abi_encode()
        .into()
    }

    /// `totalValue(owner)` on the vault.
    pub fn total_value_calldata(&self, owner: Address) -> Bytes {
        IAlchemist::totalValueCall { owner }.abi_encode().into()
    }

    /// The approve-then-deposit pair executed atomically by the batch
    /// contract. Order matters: the deposit pulls the approved allowance.
    pub fn deposit_batch(&self, amount: U256, recipient: Address) -> Vec<Call> {
        vec![
            Call {
                to: self.yield_token,
                value: U256::ZERO,
                data: self.approve_calldata(amount),
            },
            Call {
                to: self.alchemist,
                value: U256::ZERO,
                data: self.deposit_calldata(amount, recipient),
            },
        ]
    }
}

/// `execute(calls)` calldata for the batch executor.
pub fn execute_calldata(calls: Vec<Call>) -> Bytes {
    IBatchCallAndSponsor::executeCall { calls }.abi_encode().into()
}

/// Decode the return data of `totalValue`.
pub fn decode_total_value(data: &[u8]) -> Result<U256, alloy::sol_types::Error> {
    IAlchemist::totalValueCall::abi_decode_returns(data)
}
