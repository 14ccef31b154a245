//! Native Poseidon hasher (outside circuits).

use std::fmt;
use std::sync::Arc;

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::{PoseidonConfig, PoseidonSponge};
use ark_crypto_primitives::sponge::CryptographicSponge;

use super::config::poseidon_config;
use crate::hasher::FieldHasher;

/// Length-prefixed Poseidon sponge hash over BN254 `Fr`.
///
/// Cloning is cheap: clones share the same configuration.
#[derive(Clone)]
pub struct PoseidonHasher {
    config: Arc<PoseidonConfig<Fr>>,
}

impl PoseidonHasher {
    pub fn new() -> Self {
        Self::with_config(poseidon_config())
    }

    pub fn with_config(config: PoseidonConfig<Fr>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &PoseidonConfig<Fr> {
        &self.config
    }
}

impl Default for PoseidonHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PoseidonHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoseidonHasher")
            .field("rate", &self.config.rate)
            .field("full_rounds", &self.config.full_rounds)
            .field("partial_rounds", &self.config.partial_rounds)
            .finish()
    }
}

impl FieldHasher for PoseidonHasher {
    fn hash(&self, inputs: &[Fr]) -> Fr {
        let mut sponge = PoseidonSponge::<Fr>::new(&self.config);
        sponge.absorb(&Fr::from(inputs.len() as u64));
        for input in inputs {
            sponge.absorb(input);
        }
        let out: Vec<Fr> = sponge.squeeze_field_elements(1);
        out[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::{One, Zero};

    #[test]
    fn test_hash_deterministic() {
        let hasher = PoseidonHasher::new();
        let a = Fr::from(42u64);
        let b = Fr::from(123u64);
        assert_eq!(hasher.hash(&[a, b]), hasher.hash(&[a, b]));
    }

    #[test]
    fn test_hash_different_inputs() {
        let hasher = PoseidonHasher::new();
        let h1 = hasher.hash(&[Fr::from(1u64), Fr::from(2u64)]);
        let h2 = hasher.hash(&[Fr::from(1u64), Fr::from(3u64)]);
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_order_matters() {
        let hasher = PoseidonHasher::new();
        let h1 = hasher.hash(&[Fr::from(1u64), Fr::from(2u64)]);
        let h2 = hasher.hash(&[Fr::from(2u64), Fr::from(1u64)]);
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_trailing_zero_changes_hash() {
        let hasher = PoseidonHasher::new();
        let a = Fr::one();
        assert_ne!(hasher.hash(&[a]), hasher.hash(&[a, Fr::zero()]));
        assert_ne!(hasher.hash(&[]), hasher.hash(&[Fr::zero()]));
    }

    #[test]
    fn test_clones_share_config() {
        let hasher = PoseidonHasher::new();
        let clone = hasher.clone();
        assert!(Arc::ptr_eq(&hasher.config, &clone.config));
        let inputs = [Fr::from(5u64); 7];
        assert_eq!(hasher.hash(&inputs), clone.hash(&inputs));
    }
}
