//! Local proof verification for the wallet initialisation circuit.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, Proof, VerifyingKey};
use ark_snark::SNARK;
use thiserror::Error;

/// Errors during verification
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Verification failed: {0}")]
    Verification(String),
    #[error("Invalid public inputs")]
    InvalidInputs,
}

/// Verify a WalletInit proof (uses the initial commitment as single public input)
pub fn verify_wallet_init(
    vk: &VerifyingKey<Bn254>,
    proof: &Proof<Bn254>,
    initial_commitment: Fr,
) -> Result<bool, VerifyError> {
    let public_inputs = vec![initial_commitment];

    Groth16::<Bn254>::verify(vk, &public_inputs, proof)
        .map_err(|e| VerifyError::Verification(e.to_string()))
}
