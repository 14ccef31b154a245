//! End-to-end preparation of a wallet update for proving.
//!
//! Apply the action, commit to the old and new states, authenticate the old
//! commitment against the claimed tree root, derive the nullifier and fill
//! the circuit inputs. Nothing is produced unless every step succeeds.

use ark_bn254::Fr;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::commitment::{
    compute_commitment_from_order_hashes, compute_nullifier, order_hashes, signing_payload,
};
use crate::error::{Result, WalletError};
use crate::field::field_decimal;
use crate::hasher::FieldHasher;
use crate::inputs::{CircuitInputs, ProofInputBuilder, UpdateWitness};
use crate::keys::derive_blinder;
use crate::merkle::{verify_root, MerklePath};
use crate::state::WalletState;
use crate::transition::{Action, Operations, StateTransitionEngine};

/// A requested update of one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub user_secret: String,
    #[serde(with = "field_decimal")]
    pub pk_root: Fr,
    #[serde(with = "field_decimal")]
    pub pk_match: Fr,
    #[serde(with = "field_decimal")]
    pub blinder_seed: Fr,
    pub old_state: WalletState,
    pub action: Action,
    /// Root the caller claims contains the old commitment
    #[serde(with = "field_decimal")]
    pub old_root: Fr,
    pub path: MerklePath,
}

/// Result of a successful [`prepare_update`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedUpdate {
    /// Successor state with the nonce advanced
    pub new_state: WalletState,
    #[serde(with = "field_decimal")]
    pub old_commitment: Fr,
    #[serde(with = "field_decimal")]
    pub new_commitment: Fr,
    #[serde(with = "field_decimal")]
    pub old_root: Fr,
    #[serde(with = "field_decimal")]
    pub nullifier: Fr,
    pub operations: Operations,
    /// `0x`-prefixed hex of the bytes the owner signs
    pub signing_payload: String,
    pub inputs: CircuitInputs,
}

/// Prepare an update, drawing order ids from the thread RNG.
pub fn prepare_update(
    hasher: &dyn FieldHasher,
    engine: &StateTransitionEngine,
    request: &UpdateRequest,
) -> Result<PreparedUpdate> {
    prepare_update_with_rng(hasher, engine, request, &mut rand::thread_rng())
}

pub fn prepare_update_with_rng<R: Rng>(
    hasher: &dyn FieldHasher,
    engine: &StateTransitionEngine,
    request: &UpdateRequest,
    rng: &mut R,
) -> Result<PreparedUpdate> {
    let old_state = &request.old_state;
    let (mut new_state, operations) =
        engine.apply_action_with_rng(old_state, &request.action, rng)?;
    new_state.nonce = old_state
        .nonce
        .checked_add(1)
        .ok_or_else(|| WalletError::InvalidStateShape("nonce is exhausted".to_string()))?;

    let old_blinder = derive_blinder(hasher, request.blinder_seed, old_state.nonce);
    let new_blinder = derive_blinder(hasher, request.blinder_seed, new_state.nonce);

    let (old_order_hashes, new_order_hashes) = rayon::join(
        || order_hashes(hasher, &old_state.orders_list),
        || order_hashes(hasher, &new_state.orders_list),
    );
    let (old_order_hashes, new_order_hashes) = (old_order_hashes?, new_order_hashes?);

    let (old_commitment, new_commitment) = rayon::join(
        || {
            compute_commitment_from_order_hashes(
                hasher,
                old_state,
                &old_order_hashes,
                request.pk_root,
                request.pk_match,
                old_blinder,
            )
        },
        || {
            compute_commitment_from_order_hashes(
                hasher,
                &new_state,
                &new_order_hashes,
                request.pk_root,
                request.pk_match,
                new_blinder,
            )
        },
    );
    let (old_commitment, new_commitment) = (old_commitment?, new_commitment?);

    let (old_root, nullifier) = rayon::join(
        || verify_root(hasher, old_commitment, &request.path, request.old_root),
        || compute_nullifier(hasher, &request.user_secret, old_commitment),
    );
    let old_root = old_root?;

    let builder = ProofInputBuilder::new(*engine.params());
    let inputs = builder.build(&UpdateWitness {
        user_secret: &request.user_secret,
        pk_root: request.pk_root,
        pk_match: request.pk_match,
        old_state,
        new_state: &new_state,
        operations: &operations,
        old_commitment,
        new_commitment,
        old_root,
        nullifier,
        old_blinder,
        new_blinder,
        path: &request.path,
        old_order_hashes: &old_order_hashes,
        new_order_hashes: &new_order_hashes,
    })?;

    Ok(PreparedUpdate {
        new_state,
        old_commitment,
        new_commitment,
        old_root,
        nullifier,
        operations,
        signing_payload: format!("0x{}", hex::encode(signing_payload(&new_commitment))),
        inputs,
    })
}
