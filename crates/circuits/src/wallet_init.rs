//! Wallet Initialisation Circuit.
//!
//! Proves that a freshly registered commitment opens to the empty wallet at
//! nonce 0 and is bound to keys the prover controls.
//!
//! Public inputs:
//! - initial_commitment: the commitment inserted into the global tree
//!
//! Witnesses:
//! - pk_root: root public key
//! - sk_match: matching secret key (pk_match = H([sk_match]))
//! - initial_blinder: blinder for nonce 0

use ark_bn254::Fr;
use ark_ff::Zero;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::commitment::compute_commitment;
use crate::error;
use crate::hasher::FieldHasher;
use crate::keys::WalletKeys;
use crate::poseidon::{poseidon_hash_var, PoseidonHasher};
use crate::state::{WalletParams, WalletState};

/// Sub-hashes of the empty wallet, fixed for a given shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyWalletDigests {
    pub available_hash: Fr,
    pub reserved_hash: Fr,
    pub orders_root: Fr,
}

impl EmptyWalletDigests {
    pub fn compute(hasher: &dyn FieldHasher, params: &WalletParams) -> Self {
        let balances = hasher.hash(&vec![Fr::zero(); params.total_tokens]);
        Self {
            available_hash: balances,
            reserved_hash: balances,
            orders_root: hasher.hash(&vec![Fr::zero(); params.max_pending_orders]),
        }
    }
}

/// Commitment to the empty wallet at nonce 0 under `keys`.
pub fn initial_commitment(
    hasher: &dyn FieldHasher,
    params: WalletParams,
    keys: &WalletKeys,
) -> error::Result<Fr> {
    compute_commitment(
        hasher,
        &WalletState::empty(params),
        keys.pk_root,
        keys.pk_match,
        keys.blinder(hasher, 0),
    )
}

/// Wallet Initialisation Circuit.
#[derive(Clone)]
pub struct WalletInitCircuit {
    /// Hasher whose configuration the gadgets reuse
    pub hasher: PoseidonHasher,
    pub params: WalletParams,

    // Public inputs
    pub initial_commitment: Option<Fr>,

    // Witnesses
    pub pk_root: Option<Fr>,
    pub sk_match: Option<Fr>,
    pub initial_blinder: Option<Fr>,
}

impl WalletInitCircuit {
    /// Create an empty circuit for setup.
    pub fn empty(hasher: PoseidonHasher, params: WalletParams) -> Self {
        Self {
            hasher,
            params,
            initial_commitment: Some(Fr::zero()),
            pk_root: Some(Fr::zero()),
            sk_match: Some(Fr::zero()),
            initial_blinder: Some(Fr::zero()),
        }
    }

    /// Create a circuit with all witnesses for `keys`.
    pub fn new(hasher: PoseidonHasher, params: WalletParams, keys: &WalletKeys) -> error::Result<Self> {
        let commitment = initial_commitment(&hasher, params, keys)?;
        let blinder = keys.blinder(&hasher, 0);
        Ok(Self {
            hasher,
            params,
            initial_commitment: Some(commitment),
            pk_root: Some(keys.pk_root),
            sk_match: Some(keys.sk_match),
            initial_blinder: Some(blinder),
        })
    }

    /// Public inputs in allocation order.
    pub fn public_inputs(&self) -> Vec<Fr> {
        self.initial_commitment.into_iter().collect()
    }
}

impl ConstraintSynthesizer<Fr> for WalletInitCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let config = self.hasher.config();

        // === Allocate public inputs ===
        let commitment_var = FpVar::new_input(cs.clone(), || {
            self.initial_commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // === Allocate witnesses ===
        let pk_root_var = FpVar::new_witness(cs.clone(), || {
            self.pk_root.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let sk_match_var = FpVar::new_witness(cs.clone(), || {
            self.sk_match.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let blinder_var = FpVar::new_witness(cs.clone(), || {
            self.initial_blinder.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // === Constraint 1: pk_match = H([sk_match]) ===
        let pk_match_var = poseidon_hash_var(cs.clone(), config, &[sk_match_var])?;

        // === Constraint 2: keys_hash = H([pk_root, pk_match, 0]) ===
        let keys_hash_var = poseidon_hash_var(
            cs.clone(),
            config,
            &[pk_root_var, pk_match_var, FpVar::Constant(Fr::zero())],
        )?;

        // === Constraint 3: commitment opens to the empty wallet ===
        // Balance and order digests of the empty wallet are constants.
        let empty = EmptyWalletDigests::compute(&self.hasher, &self.params);
        let computed = poseidon_hash_var(
            cs,
            config,
            &[
                FpVar::Constant(empty.available_hash),
                FpVar::Constant(empty.reserved_hash),
                FpVar::Constant(empty.orders_root),
                keys_hash_var,
                FpVar::Constant(Fr::zero()),
                blinder_var,
            ],
        )?;
        computed.enforce_equal(&commitment_var)?;

        Ok(())
    }
}
