//! Proof generation library for shielded wallets.
//!
//! This crate provides:
//! - The [`Prover`] interface the update pipeline hands circuit inputs to
//! - Trusted setup (generating proving and verifying keys)
//! - Groth16 proving and verification for the wallet initialisation circuit

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use zenigma_circuits::{CircuitInputs, InputLayout};

pub mod prove;
pub mod setup;
pub mod verify;

pub use prove::{
    prove_update, prove_wallet_init, serialize_proof, wallet_init_inputs, Groth16WalletInitProver,
    ProofWithInputs, ProveError,
};
pub use setup::{setup_all_circuits, setup_wallet_init, CircuitKeyPair, CircuitKeys, SetupError};
pub use verify::{verify_wallet_init, VerifyError};

/// A proof with its public inputs by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOutput {
    pub proof: Vec<u8>,
    pub public_inputs: BTreeMap<String, String>,
}

impl ProofOutput {
    /// `0x`-prefixed hex of the proof bytes.
    pub fn proof_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.proof))
    }
}

/// A proving backend for one circuit.
///
/// The update circuit's backend lives outside this workspace and plugs in
/// here; [`Groth16WalletInitProver`] is the in-tree implementation.
pub trait Prover: Send + Sync {
    /// Input contract the backend expects.
    fn layout(&self) -> InputLayout;

    fn generate_proof(&self, inputs: &CircuitInputs) -> Result<ProofOutput, ProveError>;

    fn verify_proof(
        &self,
        proof: &[u8],
        public_inputs: &BTreeMap<String, String>,
    ) -> Result<bool, VerifyError>;
}
