//! Poseidon parameters for BN254 at width 5.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_ff::{batch_inversion, PrimeField};
use sha2::{Digest, Sha256};

/// Number of full rounds (beginning + end)
pub const FULL_ROUNDS: usize = 8;

/// Number of partial rounds
pub const PARTIAL_ROUNDS: usize = 60;

/// S-box exponent
pub const ALPHA: u64 = 5;

/// Field elements absorbed per permutation
pub const RATE: usize = 4;

pub const CAPACITY: usize = 1;

/// State width (rate + capacity)
pub const WIDTH: usize = RATE + CAPACITY;

const DOMAIN_TAG: &[u8] = b"zenigma/poseidon/bn254/t5";

/// Build the Poseidon configuration for the BN254 scalar field.
///
/// Parameters:
/// - Rate: 4, capacity: 1
/// - Full rounds: 8 (4 at start, 4 at end)
/// - Partial rounds: 60
/// - Alpha: 5 (x^5 S-box)
///
/// Build it once and share it; every hasher instance holds an `Arc` to it.
pub fn poseidon_config() -> PoseidonConfig<Fr> {
    PoseidonConfig {
        full_rounds: FULL_ROUNDS,
        partial_rounds: PARTIAL_ROUNDS,
        alpha: ALPHA,
        ark: round_constants(),
        mds: cauchy_mds(),
        rate: RATE,
        capacity: CAPACITY,
    }
}

/// Cauchy matrix `M[i][j] = 1 / (i + WIDTH + j)`.
///
/// The row and column points are disjoint and distinct, so the matrix is MDS.
fn cauchy_mds() -> Vec<Vec<Fr>> {
    let mut entries: Vec<Fr> = (0..WIDTH)
        .flat_map(|i| (0..WIDTH).map(move |j| Fr::from((i + WIDTH + j) as u64)))
        .collect();
    batch_inversion(&mut entries);
    entries.chunks(WIDTH).map(|row| row.to_vec()).collect()
}

/// Round constants: SHA-256 of (tag, round, position) reduced into the field.
fn round_constants() -> Vec<Vec<Fr>> {
    (0..FULL_ROUNDS + PARTIAL_ROUNDS)
        .map(|round| {
            (0..WIDTH)
                .map(|position| {
                    let digest = Sha256::new()
                        .chain_update(DOMAIN_TAG)
                        .chain_update((round as u32).to_be_bytes())
                        .chain_update((position as u32).to_be_bytes())
                        .finalize();
                    Fr::from_be_bytes_mod_order(&digest)
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::{One, Zero};

    #[test]
    fn test_config_valid() {
        let config = poseidon_config();
        assert_eq!(config.full_rounds, FULL_ROUNDS);
        assert_eq!(config.partial_rounds, PARTIAL_ROUNDS);
        assert_eq!(config.rate, RATE);
        assert_eq!(config.capacity, CAPACITY);
        assert_eq!(config.mds.len(), WIDTH);
        assert!(config.mds.iter().all(|row| row.len() == WIDTH));
        assert_eq!(config.ark.len(), FULL_ROUNDS + PARTIAL_ROUNDS);
        assert!(config.ark.iter().all(|row| row.len() == WIDTH));
    }

    #[test]
    fn test_mds_entries_are_inverses() {
        let mds = cauchy_mds();
        for (i, row) in mds.iter().enumerate() {
            for (j, entry) in row.iter().enumerate() {
                assert!(!entry.is_zero());
                assert_eq!(*entry * Fr::from((i + WIDTH + j) as u64), Fr::one());
            }
        }
    }

    #[test]
    fn test_round_constants_are_stable() {
        assert_eq!(round_constants(), round_constants());
        let ark = round_constants();
        assert_ne!(ark[0][0], ark[0][1]);
        assert_ne!(ark[0][0], ark[1][0]);
    }
}
