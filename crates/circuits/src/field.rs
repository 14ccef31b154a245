//! Conversions between boundary integers and BN254 field elements.
//!
//! Integers cross the API boundary as decimal strings (a `0x` prefix selects
//! hexadecimal). Values are checked against the field modulus instead of
//! being silently reduced.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::error::{Result, WalletError};

/// The BN254 scalar field modulus as an unbounded integer.
pub fn modulus() -> BigUint {
    BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le())
}

/// Convert an integer to a field element, rejecting values `>= p`.
pub fn biguint_to_field(value: &BigUint) -> Result<Fr> {
    if *value >= modulus() {
        return Err(WalletError::InvalidFieldElement(format!(
            "{} is not below the field modulus",
            value
        )));
    }
    Ok(Fr::from_le_bytes_mod_order(&value.to_bytes_le()))
}

/// Canonical integer representative of a field element.
pub fn field_to_biguint(value: &Fr) -> BigUint {
    BigUint::from_bytes_le(&value.into_bigint().to_bytes_le())
}

/// Decimal string of a field element ("0" for zero).
pub fn field_to_decimal(value: &Fr) -> String {
    field_to_biguint(value).to_str_radix(10)
}

/// Parse an unsigned integer literal (decimal, or hex with `0x`).
pub fn parse_biguint(raw: &str) -> Result<BigUint> {
    let trimmed = raw.trim();
    let parsed = match trimmed.strip_prefix("0x") {
        Some(hex_digits) if !hex_digits.is_empty() => {
            BigUint::parse_bytes(hex_digits.as_bytes(), 16)
        }
        Some(_) => None,
        None if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) => {
            BigUint::parse_bytes(trimmed.as_bytes(), 10)
        }
        None => None,
    };
    parsed.ok_or_else(|| WalletError::InvalidFieldElement(format!("not an unsigned integer: {:?}", raw)))
}

/// Parse a field element literal.
pub fn parse_field(raw: &str) -> Result<Fr> {
    biguint_to_field(&parse_biguint(raw)?)
}

/// SHA-256 of a secret truncated to its top 252 bits.
///
/// Matches taking the first 63 hex digits of the digest, so the result is
/// always below the field modulus.
pub fn truncated_sha256(secret: &str) -> Fr {
    let digest = Sha256::digest(secret.as_bytes());
    let truncated = BigUint::from_bytes_be(&digest) >> 4u32;
    Fr::from_le_bytes_mod_order(&truncated.to_bytes_le())
}

/// Boundary value that may arrive as a JSON number or a string.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum NumOrStr {
    Num(u64),
    Str(String),
}

impl NumOrStr {
    fn into_biguint(self) -> Result<BigUint> {
        match self {
            Self::Num(n) => Ok(BigUint::from(n)),
            Self::Str(s) => parse_biguint(&s),
        }
    }
}

/// Serde adapter: `BigUint` as a decimal string.
pub mod decimal {
    use num_bigint::BigUint;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use super::NumOrStr;

    pub fn serialize<S: Serializer>(value: &BigUint, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigUint, D::Error> {
        NumOrStr::deserialize(d)?
            .into_biguint()
            .map_err(D::Error::custom)
    }
}

/// Serde adapter: `Vec<BigUint>` as an array of decimal strings.
pub mod decimal_vec {
    use num_bigint::BigUint;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use super::NumOrStr;

    pub fn serialize<S: Serializer>(values: &[BigUint], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(values.iter().map(|v| v.to_str_radix(10)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<BigUint>, D::Error> {
        Vec::<NumOrStr>::deserialize(d)?
            .into_iter()
            .map(|v| v.into_biguint().map_err(D::Error::custom))
            .collect()
    }
}

/// Serde adapter: `u64` as a decimal string, accepting numbers on input.
pub mod decimal_u64 {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use super::NumOrStr;

    pub fn serialize<S: Serializer>(value: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        match NumOrStr::deserialize(d)? {
            NumOrStr::Num(n) => Ok(n),
            NumOrStr::Str(s) => s.trim().parse().map_err(D::Error::custom),
        }
    }
}

/// Serde adapter: `Fr` as a decimal string.
pub mod field_decimal {
    use ark_bn254::Fr;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use super::{biguint_to_field, field_to_decimal, NumOrStr};

    pub fn serialize<S: Serializer>(value: &Fr, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&field_to_decimal(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Fr, D::Error> {
        let value = NumOrStr::deserialize(d)?
            .into_biguint()
            .map_err(D::Error::custom)?;
        biguint_to_field(&value).map_err(D::Error::custom)
    }
}

/// Serde adapter: `Vec<Fr>` as an array of decimal strings.
pub mod field_decimal_vec {
    use ark_bn254::Fr;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use super::{biguint_to_field, field_to_decimal, NumOrStr};

    pub fn serialize<S: Serializer>(values: &[Fr], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(values.iter().map(field_to_decimal))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Fr>, D::Error> {
        Vec::<NumOrStr>::deserialize(d)?
            .into_iter()
            .map(|v| {
                let n = v.into_biguint().map_err(D::Error::custom)?;
                biguint_to_field(&n).map_err(D::Error::custom)
            })
            .collect()
    }
}
