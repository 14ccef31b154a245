//! Error types for wallet transitions, commitments and circuit inputs.
//!
//! Every variant is a local, recoverable rejection. Nothing here is retried
//! internally and no partially mutated state is ever returned alongside an
//! error.

use num_bigint::BigUint;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, WalletError>;

/// Errors raised by the wallet engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WalletError {
    /// A numeric value does not fit in the BN254 scalar field
    #[error("Invalid field element: {0}")]
    InvalidFieldElement(String),

    #[error("Invalid token index {index}: must be below {total}")]
    InvalidTokenIndex { index: usize, total: usize },

    #[error("Invalid transfer direction {0}: expected 0 (deposit) or 1 (withdraw)")]
    InvalidDirection(u64),

    #[error("Invalid amount: must be greater than zero")]
    InvalidAmount,

    #[error("Invalid order index {index}: must be below {max}")]
    InvalidOrderIndex { index: usize, max: usize },

    #[error("Invalid order operation {0}: expected 0 (create) or 1 (cancel)")]
    InvalidOperationType(u64),

    #[error("Order data is required to create an order")]
    MissingOrderData,

    #[error("Order slot {0} is already occupied")]
    OrderSlotOccupied(usize),

    #[error("No order at index {0}")]
    NoOrderAtIndex(usize),

    #[error("Invalid price: must be greater than zero")]
    InvalidPrice,

    #[error("Invalid quantity: must be greater than zero")]
    InvalidQty,

    #[error("Invalid token pair: token_in and token_out are both {0}")]
    InvalidTokenPair(usize),

    #[error("Invalid order side {0}: expected 0 (buy) or 1 (sell)")]
    InvalidSide(u64),

    /// Available balance is too small for a withdrawal or reservation
    #[error("Insufficient balance for token {token_index}: required {required}, available {available}")]
    InsufficientBalance {
        token_index: usize,
        required: BigUint,
        available: BigUint,
    },

    /// Reserved balance does not cover the order being cancelled
    #[error("Insufficient reserved balance for token {token_index}: required {required}, reserved {reserved}")]
    InsufficientReserved {
        token_index: usize,
        required: BigUint,
        reserved: BigUint,
    },

    #[error("Fees must be zero before withdrawing")]
    FeesMustBeZeroForWithdraw,

    #[error("Malformed Merkle path: {0}")]
    MalformedMerklePath(String),

    /// Recomputed root differs from the root claimed by the caller
    #[error("Merkle verification failed: expected root {expected}, computed {computed}")]
    MerkleVerificationFailed { expected: String, computed: String },

    #[error("Invalid wallet state shape: {0}")]
    InvalidStateShape(String),

    #[error("Missing circuit input: {0}")]
    MissingCircuitInput(String),

    #[error("Circuit input {name} has arity {actual}, expected {expected}")]
    CircuitInputArity {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
}

impl WalletError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFieldElement(_) => "InvalidFieldElement",
            Self::InvalidTokenIndex { .. } => "InvalidTokenIndex",
            Self::InvalidDirection(_) => "InvalidDirection",
            Self::InvalidAmount => "InvalidAmount",
            Self::InvalidOrderIndex { .. } => "InvalidOrderIndex",
            Self::InvalidOperationType(_) => "InvalidOperationType",
            Self::MissingOrderData => "MissingOrderData",
            Self::OrderSlotOccupied(_) => "OrderSlotOccupied",
            Self::NoOrderAtIndex(_) => "NoOrderAtIndex",
            Self::InvalidPrice => "InvalidPrice",
            Self::InvalidQty => "InvalidQty",
            Self::InvalidTokenPair(_) => "InvalidTokenPair",
            Self::InvalidSide(_) => "InvalidSide",
            Self::InsufficientBalance { .. } => "InsufficientBalance",
            Self::InsufficientReserved { .. } => "InsufficientReserved",
            Self::FeesMustBeZeroForWithdraw => "FeesMustBeZeroForWithdraw",
            Self::MalformedMerklePath(_) => "MalformedMerklePath",
            Self::MerkleVerificationFailed { .. } => "MerkleVerificationFailed",
            Self::InvalidStateShape(_) => "InvalidStateShape",
            Self::MissingCircuitInput(_) => "MissingCircuitInput",
            Self::CircuitInputArity { .. } => "CircuitInputArity",
            Self::InvalidSignature(_) => "InvalidSignature",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_message_carries_amounts() {
        let err = WalletError::InsufficientBalance {
            token_index: 1,
            required: BigUint::from(50u32),
            available: BigUint::from(10u32),
        };
        let msg = err.to_string();
        assert!(msg.contains("required 50"));
        assert!(msg.contains("available 10"));
        assert_eq!(err.code(), "InsufficientBalance");
    }
}
