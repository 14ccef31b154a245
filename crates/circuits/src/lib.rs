//! Shielded wallet state transitions, commitments and circuits.
//!
//! This crate provides:
//! - `FieldHasher` / `PoseidonHasher`: the hash every commitment and tree node uses
//! - `WalletState` and `StateTransitionEngine`: deposits, withdrawals and orders
//! - `compute_commitment` / `compute_nullifier`: binding a state to its owner
//! - `MerklePath` / `CommitmentTree`: authenticating a commitment in the global tree
//! - `ProofInputBuilder` and `prepare_update`: the inputs an external prover consumes
//! - `WalletKeys` and `WalletInitCircuit`: key derivation and the init proof

pub mod commitment;
pub mod constants;
pub mod error;
pub mod field;
pub mod hasher;
pub mod inputs;
pub mod keys;
pub mod merkle;
pub mod poseidon;
pub mod state;
pub mod transition;
pub mod update;
pub mod wallet_init;

#[cfg(test)]
mod tests;

pub use commitment::{
    compute_commitment, compute_commitment_from_order_hashes, compute_nullifier,
    compute_randomness, order_hash, order_hashes, signing_payload,
};
pub use constants::{MAX_PENDING_ORDER, MERKLE_DEPTH, TOTAL_TOKEN};
pub use error::{Result, WalletError};
pub use field::{field_to_decimal, parse_field};
pub use hasher::FieldHasher;
pub use inputs::{CircuitInputs, InputLayout, InputValue, ProofInputBuilder, UpdateWitness};
pub use keys::WalletKeys;
pub use merkle::{compute_root, verify_root, CommitmentTree, MerklePath};
pub use poseidon::PoseidonHasher;
pub use state::{Order, Side, WalletParams, WalletState};
pub use transition::{
    apply_action, Action, OrderAction, OrderData, Operations, Permit2, StateTransitionEngine,
    Transfer,
};
pub use update::{prepare_update, prepare_update_with_rng, PreparedUpdate, UpdateRequest};
pub use wallet_init::{initial_commitment, WalletInitCircuit};
