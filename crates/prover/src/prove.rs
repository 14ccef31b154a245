//! Proof generation for wallet circuits.

use std::collections::BTreeMap;

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, Proof, ProvingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info};

use zenigma_circuits::{
    compute_commitment, initial_commitment, parse_field, CircuitInputs, FieldHasher, InputLayout,
    PoseidonHasher, PreparedUpdate, ProofInputBuilder, WalletError, WalletInitCircuit, WalletKeys,
    WalletParams, WalletState,
};

use crate::setup::CircuitKeyPair;
use crate::verify::{verify_wallet_init, VerifyError};
use crate::{ProofOutput, Prover};

/// Errors during proof generation
#[derive(Error, Debug)]
pub enum ProveError {
    #[error("Proof generation failed: {0}")]
    ProofGeneration(String),
    #[error("Invalid wallet state: {0}")]
    InvalidState(String),
    #[error("Invalid circuit inputs: {0}")]
    InvalidInputs(#[from] WalletError),
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// A proof with its public inputs
#[derive(Clone)]
pub struct ProofWithInputs {
    pub proof: Proof<Bn254>,
    pub public_inputs: Vec<Fr>,
}

impl ProofWithInputs {
    /// Serialize proof to bytes
    pub fn serialize_proof(&self) -> Result<Vec<u8>, ProveError> {
        serialize_proof(&self.proof)
    }

    /// Deserialize proof from bytes
    pub fn deserialize_proof(bytes: &[u8]) -> Result<Proof<Bn254>, ProveError> {
        Proof::deserialize_compressed(bytes).map_err(|e| ProveError::Serialization(e.to_string()))
    }
}

/// Compressed encoding of a Groth16 proof.
pub fn serialize_proof(proof: &Proof<Bn254>) -> Result<Vec<u8>, ProveError> {
    let mut bytes = Vec::new();
    proof
        .serialize_compressed(&mut bytes)
        .map_err(|e| ProveError::Serialization(e.to_string()))?;
    Ok(bytes)
}

/// Generate a proof for WalletInitCircuit from derived keys.
pub fn prove_wallet_init(
    pk: &ProvingKey<Bn254>,
    hasher: &PoseidonHasher,
    params: WalletParams,
    keys: &WalletKeys,
) -> Result<ProofWithInputs, ProveError> {
    let circuit = WalletInitCircuit::new(hasher.clone(), params, keys)?;
    let public_inputs = circuit.public_inputs();

    let mut rng = StdRng::from_entropy();
    let proof = Groth16::<Bn254>::prove(pk, circuit, &mut rng)
        .map_err(|e| ProveError::ProofGeneration(e.to_string()))?;

    Ok(ProofWithInputs {
        proof,
        public_inputs,
    })
}

/// Hand a prepared update to a proving backend.
///
/// The inputs are checked against the backend's layout first, so a backend
/// never sees a map with missing or misshapen entries.
pub fn prove_update<P: Prover + ?Sized>(
    prover: &P,
    prepared: &PreparedUpdate,
) -> Result<ProofOutput, ProveError> {
    prepared.inputs.validate(&prover.layout())?;
    debug!(nullifier = %prepared.nullifier, "proving wallet update");
    prover.generate_proof(&prepared.inputs)
}

/// Groth16 backend for the wallet initialisation circuit.
pub struct Groth16WalletInitProver {
    keys: CircuitKeyPair,
    hasher: PoseidonHasher,
    params: WalletParams,
}

impl Groth16WalletInitProver {
    pub fn new(keys: CircuitKeyPair, hasher: PoseidonHasher, params: WalletParams) -> Self {
        Self {
            keys,
            hasher,
            params,
        }
    }

    pub fn keys(&self) -> &CircuitKeyPair {
        &self.keys
    }

    fn circuit_from_inputs(&self, inputs: &CircuitInputs) -> Result<WalletInitCircuit, ProveError> {
        inputs.validate(&InputLayout::wallet_init())?;

        let commitment = inputs.field("initial_commitment")?;
        let pk_root = inputs.field("pk_root")?;
        let sk_match = inputs.field("sk_match")?;
        let blinder = inputs.field("initial_blinder")?;

        // The witness must open to the empty wallet under these keys.
        let pk_match = self.hasher.hash(&[sk_match]);
        let expected = compute_commitment(
            &self.hasher,
            &WalletState::empty(self.params),
            pk_root,
            pk_match,
            blinder,
        )?;
        if expected != commitment {
            return Err(ProveError::InvalidState(
                "initial_commitment does not open to the empty wallet".to_string(),
            ));
        }

        Ok(WalletInitCircuit {
            hasher: self.hasher.clone(),
            params: self.params,
            initial_commitment: Some(commitment),
            pk_root: Some(pk_root),
            sk_match: Some(sk_match),
            initial_blinder: Some(blinder),
        })
    }
}

impl Prover for Groth16WalletInitProver {
    fn layout(&self) -> InputLayout {
        InputLayout::wallet_init()
    }

    fn generate_proof(&self, inputs: &CircuitInputs) -> Result<ProofOutput, ProveError> {
        let circuit = self.circuit_from_inputs(inputs)?;

        let mut rng = StdRng::from_entropy();
        let proof = Groth16::<Bn254>::prove(&self.keys.proving_key, circuit, &mut rng)
            .map_err(|e| ProveError::ProofGeneration(e.to_string()))?;

        let proof = serialize_proof(&proof)?;
        info!(bytes = proof.len(), "generated wallet init proof");

        Ok(ProofOutput {
            proof,
            public_inputs: inputs.public_inputs(&self.layout())?,
        })
    }

    fn verify_proof(
        &self,
        proof: &[u8],
        public_inputs: &BTreeMap<String, String>,
    ) -> Result<bool, VerifyError> {
        let proof = ProofWithInputs::deserialize_proof(proof)
            .map_err(|e| VerifyError::Verification(e.to_string()))?;
        let commitment = public_inputs
            .get("initial_commitment")
            .ok_or(VerifyError::InvalidInputs)
            .and_then(|value| parse_field(value).map_err(|_| VerifyError::InvalidInputs))?;

        verify_wallet_init(&self.keys.verifying_key, &proof, commitment)
    }
}

/// Inputs of the wallet initialisation circuit for `keys`.
pub fn wallet_init_inputs(
    hasher: &PoseidonHasher,
    params: WalletParams,
    keys: &WalletKeys,
) -> Result<CircuitInputs, ProveError> {
    let commitment = initial_commitment(hasher, params, keys)?;
    let builder = ProofInputBuilder::new(params);
    Ok(builder.build_init(keys.pk_root, keys.sk_match, keys.blinder(hasher, 0), commitment)?)
}
