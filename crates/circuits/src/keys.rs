//! Wallet key derivation from an authentication signature.
//!
//! ```text
//! sk_root       = be(keccak256(signature) || keccak256(signature)) mod p
//! pk_root       = H([sk_root])
//! sk_match      = H([sk_root, chain_id])
//! pk_match      = H([sk_match])
//! blinder_seed  = H([sk_root, "BLINDER"])
//! symmetric_key = keccak256(be32(sk_root))
//! blinder(n)    = H([blinder_seed, n])
//! ```

use std::fmt;

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use sha3::{Digest, Keccak256};

use crate::constants::BLINDER_DOMAIN;
use crate::error::{Result, WalletError};
use crate::hasher::FieldHasher;

/// Secret and public key material of one wallet.
#[derive(Clone, PartialEq, Eq)]
pub struct WalletKeys {
    pub sk_root: Fr,
    pub pk_root: Fr,
    pub sk_match: Fr,
    pub pk_match: Fr,
    pub blinder_seed: Fr,
    pub symmetric_key: [u8; 32],
}

impl WalletKeys {
    /// Derive keys from raw signature bytes.
    pub fn derive(hasher: &dyn FieldHasher, signature: &[u8], chain_id: u64) -> Result<Self> {
        if signature.is_empty() {
            return Err(WalletError::InvalidSignature("signature is empty".to_string()));
        }
        let digest = Keccak256::digest(signature);
        let mut extended = [0u8; 64];
        extended[..32].copy_from_slice(&digest);
        extended[32..].copy_from_slice(&digest);
        let sk_root = Fr::from_be_bytes_mod_order(&extended);
        Ok(Self::from_sk_root(hasher, sk_root, chain_id))
    }

    /// Derive keys from a hex signature, with or without `0x`.
    pub fn derive_from_hex(hasher: &dyn FieldHasher, signature: &str, chain_id: u64) -> Result<Self> {
        let trimmed = signature.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|e| WalletError::InvalidSignature(e.to_string()))?;
        Self::derive(hasher, &bytes, chain_id)
    }

    pub fn from_sk_root(hasher: &dyn FieldHasher, sk_root: Fr, chain_id: u64) -> Self {
        let (pk_root, sk_match, blinder_seed) = (
            hasher.hash(&[sk_root]),
            hasher.hash(&[sk_root, Fr::from(chain_id)]),
            hasher.hash(&[sk_root, Fr::from(BLINDER_DOMAIN)]),
        );
        let pk_match = hasher.hash(&[sk_match]);

        let mut sk_bytes = [0u8; 32];
        let be = sk_root.into_bigint().to_bytes_be();
        sk_bytes[32 - be.len().min(32)..].copy_from_slice(&be[be.len().saturating_sub(32)..]);
        let symmetric_key: [u8; 32] = Keccak256::digest(sk_bytes).into();

        Self {
            sk_root,
            pk_root,
            sk_match,
            pk_match,
            blinder_seed,
            symmetric_key,
        }
    }

    /// Blinder for the commitment at `nonce`.
    pub fn blinder(&self, hasher: &dyn FieldHasher, nonce: u64) -> Fr {
        derive_blinder(hasher, self.blinder_seed, nonce)
    }
}

impl fmt::Debug for WalletKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletKeys")
            .field("pk_root", &self.pk_root)
            .field("pk_match", &self.pk_match)
            .finish_non_exhaustive()
    }
}

/// `H([blinder_seed, nonce])`
pub fn derive_blinder(hasher: &dyn FieldHasher, blinder_seed: Fr, nonce: u64) -> Fr {
    hasher.hash(&[blinder_seed, Fr::from(nonce)])
}
