//! Named circuit inputs handed to a prover.
//!
//! Every value is a decimal string or an array of decimal strings. The
//! [`InputLayout`] of a circuit lists every name with its arity and
//! visibility; [`CircuitInputs::validate`] checks a map against it before
//! anything reaches a prover.

use std::collections::BTreeMap;

use ark_bn254::Fr;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::constants::MERKLE_DEPTH;
use crate::error::{Result, WalletError};
use crate::field::{field_to_decimal, parse_field, truncated_sha256};
use crate::merkle::MerklePath;
use crate::state::{WalletParams, WalletState};
use crate::transition::Operations;

/// One circuit input value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Scalar(String),
    Array(Vec<String>),
}

/// Expected shape of one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Scalar,
    Array(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub name: &'static str,
    pub arity: Arity,
    pub public: bool,
}

/// The full input contract of one circuit, public inputs first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLayout {
    entries: Vec<InputSpec>,
}

impl InputLayout {
    /// Inputs of the wallet update circuit.
    pub fn wallet_update(params: &WalletParams) -> Self {
        let tokens = Arity::Array(params.total_tokens);
        let orders = Arity::Array(params.max_pending_orders);
        let public = |name| InputSpec {
            name,
            arity: Arity::Scalar,
            public: true,
        };
        let private = |name, arity| InputSpec {
            name,
            arity,
            public: false,
        };

        Self {
            entries: vec![
                public("old_wallet_commitment"),
                public("new_wallet_commitment"),
                public("old_merkle_root"),
                public("nullifier"),
                public("transfer_direction"),
                public("transfer_mint"),
                public("transfer_amount"),
                public("operation_type"),
                private("user_secret", Arity::Scalar),
                private("nonce", Arity::Scalar),
                private("pk_root", Arity::Scalar),
                private("pk_match", Arity::Scalar),
                private("old_blinder", Arity::Scalar),
                private("new_blinder", Arity::Scalar),
                private("old_available_balances", tokens),
                private("old_reserved_balances", tokens),
                private("old_orders_list", orders),
                private("old_fees", Arity::Scalar),
                private("old_index", Arity::Scalar),
                private("old_hash_path", Arity::Array(MERKLE_DEPTH)),
                private("new_available_balances", tokens),
                private("new_reserved_balances", tokens),
                private("new_orders_list", orders),
                private("new_fees", Arity::Scalar),
                private("transfer_index", Arity::Scalar),
                private("order_index", Arity::Scalar),
                private("order_direction", Arity::Scalar),
                private("order_price", Arity::Scalar),
                private("order_quantity", Arity::Scalar),
                private("order_token_in", Arity::Scalar),
                private("order_token_out", Arity::Scalar),
                private("order_operation_type", Arity::Scalar),
            ],
        }
    }

    /// Inputs of the wallet initialisation circuit.
    pub fn wallet_init() -> Self {
        let entry = |name, public| InputSpec {
            name,
            arity: Arity::Scalar,
            public,
        };
        Self {
            entries: vec![
                entry("initial_commitment", true),
                entry("pk_root", false),
                entry("sk_match", false),
                entry("initial_blinder", false),
            ],
        }
    }

    pub fn entries(&self) -> &[InputSpec] {
        &self.entries
    }

    pub fn public_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().filter(|e| e.public).map(|e| e.name)
    }
}

/// Named input map, serialised as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CircuitInputs {
    values: BTreeMap<String, InputValue>,
}

impl CircuitInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_scalar(&mut self, name: &str, value: impl ToString) {
        self.values
            .insert(name.to_string(), InputValue::Scalar(value.to_string()));
    }

    pub fn insert_field(&mut self, name: &str, value: &Fr) {
        self.insert_scalar(name, field_to_decimal(value));
    }

    pub fn insert_array<I, T>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        let values = values.into_iter().map(|v| v.to_string()).collect();
        self.values.insert(name.to_string(), InputValue::Array(values));
    }

    pub fn get(&self, name: &str) -> Option<&InputValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InputValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A scalar input; missing or array-valued names are errors.
    pub fn scalar(&self, name: &str) -> Result<&str> {
        match self.values.get(name) {
            Some(InputValue::Scalar(s)) => Ok(s),
            Some(InputValue::Array(values)) => Err(WalletError::CircuitInputArity {
                name: name.to_string(),
                expected: 1,
                actual: values.len(),
            }),
            None => Err(WalletError::MissingCircuitInput(name.to_string())),
        }
    }

    /// A scalar input parsed as a field element.
    pub fn field(&self, name: &str) -> Result<Fr> {
        parse_field(self.scalar(name)?)
    }

    /// Check every name of `layout` is present with the right arity and
    /// parses as a field element.
    pub fn validate(&self, layout: &InputLayout) -> Result<()> {
        for spec in layout.entries() {
            let value = self
                .values
                .get(spec.name)
                .ok_or_else(|| WalletError::MissingCircuitInput(spec.name.to_string()))?;
            match (spec.arity, value) {
                (Arity::Scalar, InputValue::Scalar(s)) => {
                    parse_field(s)?;
                }
                (Arity::Array(expected), InputValue::Array(values)) if values.len() == expected => {
                    for v in values {
                        parse_field(v)?;
                    }
                }
                (arity, value) => {
                    return Err(WalletError::CircuitInputArity {
                        name: spec.name.to_string(),
                        expected: match arity {
                            Arity::Scalar => 1,
                            Arity::Array(n) => n,
                        },
                        actual: match value {
                            InputValue::Scalar(_) => 1,
                            InputValue::Array(values) => values.len(),
                        },
                    });
                }
            }
        }
        Ok(())
    }

    /// The public inputs of `layout`, by name.
    pub fn public_inputs(&self, layout: &InputLayout) -> Result<BTreeMap<String, String>> {
        layout
            .public_names()
            .map(|name| Ok((name.to_string(), self.scalar(name)?.to_string())))
            .collect()
    }
}

/// Everything needed to fill the wallet update circuit.
#[derive(Debug, Clone, Copy)]
pub struct UpdateWitness<'a> {
    pub user_secret: &'a str,
    pub pk_root: Fr,
    pub pk_match: Fr,
    pub old_state: &'a WalletState,
    pub new_state: &'a WalletState,
    pub operations: &'a Operations,
    pub old_commitment: Fr,
    pub new_commitment: Fr,
    pub old_root: Fr,
    pub nullifier: Fr,
    pub old_blinder: Fr,
    pub new_blinder: Fr,
    pub path: &'a MerklePath,
    /// Per-slot order hashes of `old_state`
    pub old_order_hashes: &'a [Fr],
    /// Per-slot order hashes of `new_state`
    pub new_order_hashes: &'a [Fr],
}

/// Maps wallet states and derived values onto circuit input names.
pub struct ProofInputBuilder {
    params: WalletParams,
}

impl ProofInputBuilder {
    pub fn new(params: WalletParams) -> Self {
        Self { params }
    }

    /// Inputs of the wallet update circuit. Absent operations fill with `"0"`.
    pub fn build(&self, w: &UpdateWitness<'_>) -> Result<CircuitInputs> {
        let mut inputs = CircuitInputs::new();

        // Public inputs
        inputs.insert_field("old_wallet_commitment", &w.old_commitment);
        inputs.insert_field("new_wallet_commitment", &w.new_commitment);
        inputs.insert_field("old_merkle_root", &w.old_root);
        inputs.insert_field("nullifier", &w.nullifier);
        inputs.insert_scalar("operation_type", w.operations.operation_type);

        let zero = BigUint::default();
        match &w.operations.transfer {
            Some(t) => {
                inputs.insert_scalar("transfer_direction", t.direction);
                inputs.insert_scalar("transfer_mint", t.token_index);
                inputs.insert_scalar("transfer_amount", &t.amount);
                inputs.insert_scalar("transfer_index", t.token_index);
            }
            None => {
                for name in ["transfer_direction", "transfer_mint", "transfer_amount", "transfer_index"] {
                    inputs.insert_scalar(name, &zero);
                }
            }
        }

        // Keys and secrets
        inputs.insert_field("user_secret", &truncated_sha256(w.user_secret));
        inputs.insert_scalar("nonce", w.old_state.nonce);
        inputs.insert_field("pk_root", &w.pk_root);
        inputs.insert_field("pk_match", &w.pk_match);
        inputs.insert_field("old_blinder", &w.old_blinder);
        inputs.insert_field("new_blinder", &w.new_blinder);

        // Old state
        inputs.insert_array("old_available_balances", &w.old_state.available_balances);
        inputs.insert_array("old_reserved_balances", &w.old_state.reserved_balances);
        inputs.insert_array("old_orders_list", w.old_order_hashes.iter().map(field_to_decimal));
        inputs.insert_scalar("old_fees", &w.old_state.fees);
        inputs.insert_scalar("old_index", w.path.leaf_index);
        inputs.insert_array("old_hash_path", w.path.siblings.iter().map(field_to_decimal));

        // New state
        inputs.insert_array("new_available_balances", &w.new_state.available_balances);
        inputs.insert_array("new_reserved_balances", &w.new_state.reserved_balances);
        inputs.insert_array("new_orders_list", w.new_order_hashes.iter().map(field_to_decimal));
        inputs.insert_scalar("new_fees", &w.new_state.fees);

        // Order operation
        match &w.operations.order {
            Some(o) => {
                inputs.insert_scalar("order_index", o.order_index);
                inputs.insert_scalar("order_direction", o.order_data.side.code());
                inputs.insert_scalar("order_price", &o.order_data.price);
                inputs.insert_scalar("order_quantity", &o.order_data.qty);
                inputs.insert_scalar("order_token_in", o.order_data.token_in);
                inputs.insert_scalar("order_token_out", o.order_data.token_out);
                inputs.insert_scalar("order_operation_type", o.operation_type);
            }
            None => {
                for name in [
                    "order_index",
                    "order_direction",
                    "order_price",
                    "order_quantity",
                    "order_token_in",
                    "order_token_out",
                    "order_operation_type",
                ] {
                    inputs.insert_scalar(name, &zero);
                }
            }
        }

        inputs.validate(&InputLayout::wallet_update(&self.params))?;
        Ok(inputs)
    }

    /// Inputs of the wallet initialisation circuit.
    pub fn build_init(
        &self,
        pk_root: Fr,
        sk_match: Fr,
        initial_blinder: Fr,
        initial_commitment: Fr,
    ) -> Result<CircuitInputs> {
        let mut inputs = CircuitInputs::new();
        inputs.insert_field("initial_commitment", &initial_commitment);
        inputs.insert_field("pk_root", &pk_root);
        inputs.insert_field("sk_match", &sk_match);
        inputs.insert_field("initial_blinder", &initial_blinder);
        inputs.validate(&InputLayout::wallet_init())?;
        Ok(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_inputs() -> CircuitInputs {
        let mut inputs = CircuitInputs::new();
        inputs.insert_scalar("initial_commitment", 1);
        inputs.insert_scalar("pk_root", 2);
        inputs.insert_scalar("sk_match", 3);
        inputs.insert_scalar("initial_blinder", 4);
        inputs
    }

    #[test]
    fn test_layout_counts() {
        let layout = InputLayout::wallet_update(&WalletParams::default());
        assert_eq!(layout.entries().len(), 32);
        assert_eq!(layout.public_names().count(), 8);
        assert_eq!(InputLayout::wallet_init().public_names().collect::<Vec<_>>(), ["initial_commitment"]);
    }

    #[test]
    fn test_validate_missing_name() {
        let mut inputs = init_inputs();
        inputs.values.remove("sk_match");
        assert_eq!(
            inputs.validate(&InputLayout::wallet_init()),
            Err(WalletError::MissingCircuitInput("sk_match".into()))
        );
    }

    #[test]
    fn test_validate_wrong_arity() {
        let mut inputs = init_inputs();
        inputs.insert_array("pk_root", ["1", "2"]);
        assert_eq!(
            inputs.validate(&InputLayout::wallet_init()),
            Err(WalletError::CircuitInputArity {
                name: "pk_root".into(),
                expected: 1,
                actual: 2,
            })
        );
    }

    #[test]
    fn test_validate_rejects_non_numeric() {
        let mut inputs = init_inputs();
        inputs.insert_scalar("initial_blinder", "abc");
        assert!(matches!(
            inputs.validate(&InputLayout::wallet_init()),
            Err(WalletError::InvalidFieldElement(_))
        ));
    }

    #[test]
    fn test_public_inputs_extracted() {
        let public = init_inputs().public_inputs(&InputLayout::wallet_init()).unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public["initial_commitment"], "1");
    }

    #[test]
    fn test_json_is_flat_object() {
        let mut inputs = init_inputs();
        inputs.insert_array("path", ["5", "6"]);
        let json = serde_json::to_value(&inputs).unwrap();
        assert_eq!(json["pk_root"], "2");
        assert_eq!(json["path"][1], "6");
        let back: CircuitInputs = serde_json::from_value(json).unwrap();
        assert_eq!(back, inputs);
    }
}
