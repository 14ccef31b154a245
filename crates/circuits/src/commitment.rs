//! Wallet commitments, randomness and nullifiers.
//!
//! The commitment binds the full wallet state to the owner's keys and a
//! per-nonce blinder:
//!
//! ```text
//! available_hash = H(available_balances)
//! reserved_hash  = H(reserved_balances)
//! orders_root    = H([order_hash(slot) for slot in orders_list])
//! keys_hash      = H([pk_root, pk_match, nonce])
//! commitment     = H([available_hash, reserved_hash, orders_root, keys_hash, fees, blinder])
//! ```
//!
//! An empty order slot hashes to zero. Order ids never enter the hash.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField, Zero};
use num_bigint::BigUint;
use rayon::prelude::*;

use crate::error::{Result, WalletError};
use crate::field::{biguint_to_field, truncated_sha256};
use crate::hasher::FieldHasher;
use crate::state::{Order, WalletState};

/// Hash of one order slot; zero when the slot is empty.
pub fn order_hash(hasher: &dyn FieldHasher, order: Option<&Order>) -> Result<Fr> {
    let Some(order) = order else {
        return Ok(Fr::zero());
    };
    hasher.hash_integers(&[
        order.price.clone(),
        order.qty.clone(),
        BigUint::from(order.side.code()),
        BigUint::from(order.token_in),
        BigUint::from(order.token_out),
    ])
}

/// Per-slot order hashes, in slot order.
pub fn order_hashes(hasher: &dyn FieldHasher, orders: &[Option<Order>]) -> Result<Vec<Fr>> {
    orders
        .par_iter()
        .map(|order| order_hash(hasher, order.as_ref()))
        .collect()
}

/// Hash over all order slot hashes.
pub fn orders_root(hasher: &dyn FieldHasher, orders: &[Option<Order>]) -> Result<Fr> {
    Ok(hasher.hash(&order_hashes(hasher, orders)?))
}

/// Binds the owner's public keys to the wallet nonce.
pub fn keys_hash(hasher: &dyn FieldHasher, pk_root: Fr, pk_match: Fr, nonce: u64) -> Fr {
    hasher.hash(&[pk_root, pk_match, Fr::from(nonce)])
}

/// Commit to a wallet state under the owner's keys and a blinder.
///
/// The state nonce is the one committed to; callers committing to a
/// successor state bump the nonce first.
pub fn compute_commitment(
    hasher: &dyn FieldHasher,
    state: &WalletState,
    pk_root: Fr,
    pk_match: Fr,
    blinder: Fr,
) -> Result<Fr> {
    let hashes = order_hashes(hasher, &state.orders_list)?;
    compute_commitment_from_order_hashes(hasher, state, &hashes, pk_root, pk_match, blinder)
}

/// [`compute_commitment`] with the per-slot order hashes already at hand.
///
/// `order_hashes` must be the [`order_hashes`] of `state.orders_list`.
pub fn compute_commitment_from_order_hashes(
    hasher: &dyn FieldHasher,
    state: &WalletState,
    order_hashes: &[Fr],
    pk_root: Fr,
    pk_match: Fr,
    blinder: Fr,
) -> Result<Fr> {
    if order_hashes.len() != state.orders_list.len() {
        return Err(WalletError::InvalidStateShape(format!(
            "expected {} order hashes, got {}",
            state.orders_list.len(),
            order_hashes.len()
        )));
    }

    let ((available, reserved), keys) = rayon::join(
        || {
            rayon::join(
                || hasher.hash_integers(&state.available_balances),
                || hasher.hash_integers(&state.reserved_balances),
            )
        },
        || keys_hash(hasher, pk_root, pk_match, state.nonce),
    );
    let orders = hasher.hash(order_hashes);
    let fees = biguint_to_field(&state.fees)?;

    Ok(hasher.hash(&[available?, reserved?, orders, keys, fees, blinder]))
}

/// Per-nonce randomness derived from the user secret.
pub fn compute_randomness(hasher: &dyn FieldHasher, user_secret: &str, nonce: u64) -> Fr {
    hasher.hash(&[truncated_sha256(user_secret), Fr::from(nonce)])
}

/// Nullifier spending `old_commitment`.
pub fn compute_nullifier(hasher: &dyn FieldHasher, user_secret: &str, old_commitment: Fr) -> Fr {
    hasher.hash(&[truncated_sha256(user_secret), old_commitment])
}

/// The 32 big-endian bytes of a commitment that the owner signs.
pub fn signing_payload(commitment: &Fr) -> [u8; 32] {
    let bytes = commitment.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    let start = out.len().saturating_sub(bytes.len());
    out[start..].copy_from_slice(&bytes[bytes.len().saturating_sub(32)..]);
    out
}
