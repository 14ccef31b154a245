//! Trusted setup utilities for generating proving and verifying keys.

use std::path::Path;

use ark_bn254::Bn254;
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;
use tracing::info;

use zenigma_circuits::{PoseidonHasher, WalletInitCircuit, WalletParams};

/// Errors that can occur during setup
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Circuit setup failed: {0}")]
    CircuitSetup(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("Deserialization failed: {0}")]
    Deserialization(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Keys for a single circuit
#[derive(Clone)]
pub struct CircuitKeyPair {
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
}

impl CircuitKeyPair {
    /// Serialize proving key to bytes
    pub fn serialize_pk(&self) -> Result<Vec<u8>, SetupError> {
        let mut bytes = Vec::new();
        self.proving_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Serialize verifying key to bytes
    pub fn serialize_vk(&self) -> Result<Vec<u8>, SetupError> {
        let mut bytes = Vec::new();
        self.verifying_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    pub fn deserialize_pk(bytes: &[u8]) -> Result<ProvingKey<Bn254>, SetupError> {
        ProvingKey::deserialize_compressed(bytes)
            .map_err(|e| SetupError::Deserialization(e.to_string()))
    }

    pub fn deserialize_vk(bytes: &[u8]) -> Result<VerifyingKey<Bn254>, SetupError> {
        VerifyingKey::deserialize_compressed(bytes)
            .map_err(|e| SetupError::Deserialization(e.to_string()))
    }

    fn save(&self, dir: &Path, name: &str) -> Result<(), SetupError> {
        std::fs::write(dir.join(format!("{}.pk", name)), self.serialize_pk()?)?;
        std::fs::write(dir.join(format!("{}.vk", name)), self.serialize_vk()?)?;
        Ok(())
    }

    fn load(dir: &Path, name: &str) -> Result<Self, SetupError> {
        Ok(Self {
            proving_key: Self::deserialize_pk(&std::fs::read(dir.join(format!("{}.pk", name)))?)?,
            verifying_key: Self::deserialize_vk(&std::fs::read(dir.join(format!("{}.vk", name)))?)?,
        })
    }
}

/// All circuit keys held by this workspace
#[derive(Clone)]
pub struct CircuitKeys {
    pub wallet_init: CircuitKeyPair,
}

impl CircuitKeys {
    /// Save all keys to a directory
    pub fn save_to_directory(&self, dir: &Path) -> Result<(), SetupError> {
        std::fs::create_dir_all(dir)?;
        self.wallet_init.save(dir, "wallet_init")?;
        info!(dir = %dir.display(), "saved circuit keys");
        Ok(())
    }

    /// Load all keys from a directory
    pub fn load_from_directory(dir: &Path) -> Result<Self, SetupError> {
        let wallet_init = CircuitKeyPair::load(dir, "wallet_init")?;
        info!(dir = %dir.display(), "loaded circuit keys");
        Ok(Self { wallet_init })
    }
}

/// Run setup for every circuit with fresh randomness.
pub fn setup_all_circuits(
    hasher: &PoseidonHasher,
    params: WalletParams,
) -> Result<CircuitKeys, SetupError> {
    let mut rng = StdRng::from_entropy();

    info!("setting up WalletInitCircuit");
    let wallet_init = setup_wallet_init(&mut rng, hasher, params)?;

    Ok(CircuitKeys { wallet_init })
}

/// Setup for WalletInitCircuit
pub fn setup_wallet_init(
    rng: &mut StdRng,
    hasher: &PoseidonHasher,
    params: WalletParams,
) -> Result<CircuitKeyPair, SetupError> {
    let circuit = WalletInitCircuit::empty(hasher.clone(), params);
    let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(circuit, rng)
        .map_err(|e| SetupError::CircuitSetup(e.to_string()))?;

    Ok(CircuitKeyPair {
        proving_key: pk,
        verifying_key: vk,
    })
}
