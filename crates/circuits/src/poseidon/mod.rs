//! Poseidon hashing over the BN254 scalar field.
//!
//! The native hasher and the R1CS gadget share one [`PoseidonConfig`] and
//! absorb the input length before the inputs, so both sides agree on every
//! sequence length.
//!
//! [`PoseidonConfig`]: ark_crypto_primitives::sponge::poseidon::PoseidonConfig

mod config;
mod gadgets;
mod native;


pub use config::{poseidon_config, ALPHA, CAPACITY, FULL_ROUNDS, PARTIAL_ROUNDS, RATE, WIDTH};
pub use gadgets::poseidon_hash_var;
pub use native::PoseidonHasher;
