//! The hash interface every commitment, nullifier and Merkle node goes through.

use ark_bn254::Fr;
use num_bigint::BigUint;

use crate::error::Result;
use crate::field::biguint_to_field;

/// A hash from a sequence of field elements to one field element.
///
/// Implementations must be deterministic and must distinguish sequences of
/// different lengths. Commitments are only comparable between parties that
/// use the same backend.
pub trait FieldHasher: Send + Sync {
    fn hash(&self, inputs: &[Fr]) -> Fr;

    /// Hash unbounded integers, rejecting any value outside the field.
    fn hash_integers(&self, inputs: &[BigUint]) -> Result<Fr> {
        let elements = inputs
            .iter()
            .map(biguint_to_field)
            .collect::<Result<Vec<_>>>()?;
        Ok(self.hash(&elements))
    }
}

impl<H: FieldHasher + ?Sized> FieldHasher for std::sync::Arc<H> {
    fn hash(&self, inputs: &[Fr]) -> Fr {
        (**self).hash(inputs)
    }
}
