//! HTTP request handlers.
//!
//! Numbers cross the wire as decimal strings. Hex appears only for
//! signatures, symmetric keys and proof bytes.

use std::collections::BTreeMap;
use std::sync::Arc;

use ark_bn254::Fr;
use ark_std::rand::Rng;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use zenigma_circuits::{
    compute_commitment, field::decimal_u64, field::field_decimal, field::parse_biguint,
    field_to_decimal,
    initial_commitment, keys::derive_blinder, prepare_update, Action, FieldHasher, Operations,
    PreparedUpdate, UpdateRequest, WalletError, WalletKeys, WalletState,
};
use zenigma_prover::{wallet_init_inputs, ProveError, Prover, VerifyError};

use crate::AppState;

type SharedState = State<Arc<RwLock<AppState>>>;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// A failed request: validation problems are 400, prover faults 500.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, error: impl ToString) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.to_string(),
                code: code.to_string(),
            },
        }
    }
}

impl From<WalletError> for ApiError {
    fn from(e: WalletError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, e.code(), &e)
    }
}

impl From<ProveError> for ApiError {
    fn from(e: ProveError) -> Self {
        match e {
            ProveError::InvalidInputs(inner) => inner.into(),
            ProveError::InvalidState(_) => Self::new(StatusCode::BAD_REQUEST, "InvalidState", &e),
            ProveError::ProofGeneration(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "ProofGeneration", &e)
            }
            ProveError::Serialization(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Serialization", &e)
            }
        }
    }
}

impl From<VerifyError> for ApiError {
    fn from(e: VerifyError) -> Self {
        let code = match e {
            VerifyError::Verification(_) => "VerificationFailed",
            VerifyError::InvalidInputs => "InvalidPublicInputs",
        };
        Self::new(StatusCode::BAD_REQUEST, code, &e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(code = %self.body.code, error = %self.body.error, "request failed");
        } else {
            debug!(code = %self.body.code, error = %self.body.error, "request rejected");
        }
        (self.status, Json(self.body)).into_response()
    }
}

// ============ Utilities ============

#[derive(Deserialize)]
pub struct PoseidonHashRequest {
    pub inputs: Vec<String>,
}

#[derive(Serialize)]
pub struct PoseidonHashResponse {
    pub hash: String,
}

/// Length-prefixed Poseidon hash of decimal (or `0x` hex) integers.
pub async fn poseidon_hash(
    State(state): SharedState,
    Json(req): Json<PoseidonHashRequest>,
) -> Result<Json<PoseidonHashResponse>, ApiError> {
    let values = req
        .inputs
        .iter()
        .map(|raw| parse_biguint(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let state = state.read().await;
    let hash = state.hasher.hash_integers(&values)?;

    Ok(Json(PoseidonHashResponse {
        hash: field_to_decimal(&hash),
    }))
}

#[derive(Deserialize)]
pub struct CreateCommitmentRequest {
    pub state: WalletState,
    #[serde(with = "field_decimal")]
    pub pk_root: Fr,
    #[serde(with = "field_decimal")]
    pub pk_match: Fr,
    #[serde(with = "field_decimal")]
    pub blinder: Fr,
}

#[derive(Serialize)]
pub struct CreateCommitmentResponse {
    pub commitment: String,
}

pub async fn create_commitment(
    State(state): SharedState,
    Json(req): Json<CreateCommitmentRequest>,
) -> Result<Json<CreateCommitmentResponse>, ApiError> {
    let state = state.read().await;
    req.state.validate_shape(state.engine.params())?;

    let commitment = compute_commitment(&state.hasher, &req.state, req.pk_root, req.pk_match, req.blinder)?;

    Ok(Json(CreateCommitmentResponse {
        commitment: field_to_decimal(&commitment),
    }))
}

#[derive(Deserialize)]
pub struct DeriveKeysRequest {
    /// Hex signature over the wallet authentication message
    pub signature: String,
    #[serde(deserialize_with = "decimal_u64::deserialize")]
    pub chain_id: u64,
}

#[derive(Serialize)]
pub struct DeriveKeysResponse {
    pub sk_root: String,
    pub pk_root: String,
    pub sk_match: String,
    pub pk_match: String,
    pub blinder_seed: String,
    pub symmetric_key: String,
    pub initial_commitment: String,
}

pub async fn derive_keys(
    State(state): SharedState,
    Json(req): Json<DeriveKeysRequest>,
) -> Result<Json<DeriveKeysResponse>, ApiError> {
    let state = state.read().await;
    let keys = WalletKeys::derive_from_hex(&state.hasher, &req.signature, req.chain_id)?;
    let commitment = initial_commitment(&state.hasher, *state.engine.params(), &keys)?;

    Ok(Json(DeriveKeysResponse {
        sk_root: field_to_decimal(&keys.sk_root),
        pk_root: field_to_decimal(&keys.pk_root),
        sk_match: field_to_decimal(&keys.sk_match),
        pk_match: field_to_decimal(&keys.pk_match),
        blinder_seed: field_to_decimal(&keys.blinder_seed),
        symmetric_key: format!("0x{}", hex::encode(keys.symmetric_key)),
        initial_commitment: field_to_decimal(&commitment),
    }))
}

/// Derives from a seed when one is given, otherwise draws a random blinder.
#[derive(Deserialize, Default)]
pub struct GenerateBlindingRequest {
    #[serde(default, with = "optional_field")]
    pub blinder_seed: Option<Fr>,
    #[serde(default, deserialize_with = "decimal_u64::deserialize")]
    pub nonce: u64,
}

#[derive(Serialize)]
pub struct GenerateBlindingResponse {
    pub blinder: String,
}

pub async fn generate_blinding(
    State(state): SharedState,
    Json(req): Json<GenerateBlindingRequest>,
) -> Json<GenerateBlindingResponse> {
    let blinder = match req.blinder_seed {
        Some(seed) => derive_blinder(&state.read().await.hasher, seed, req.nonce),
        None => random_blinder(),
    };

    Json(GenerateBlindingResponse {
        blinder: field_to_decimal(&blinder),
    })
}

fn random_blinder() -> Fr {
    ark_std::rand::thread_rng().gen()
}

mod optional_field {
    use ark_bn254::Fr;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Fr>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|raw| zenigma_circuits::parse_field(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}

// ============ Wallet transitions ============

#[derive(Deserialize)]
pub struct ApplyActionRequest {
    pub state: WalletState,
    pub action: Action,
}

#[derive(Serialize)]
pub struct ApplyActionResponse {
    pub new_state: WalletState,
    pub operations: Operations,
}

/// Apply an action without committing; the nonce is left as given.
pub async fn apply_action(
    State(state): SharedState,
    Json(req): Json<ApplyActionRequest>,
) -> Result<Json<ApplyActionResponse>, ApiError> {
    let state = state.read().await;
    let (new_state, operations) = state.engine.apply_action(&req.state, &req.action)?;

    Ok(Json(ApplyActionResponse {
        new_state,
        operations,
    }))
}

pub async fn wallet_update_inputs(
    State(state): SharedState,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<PreparedUpdate>, ApiError> {
    let state = state.read().await;
    let prepared = prepare_update(&state.hasher, &state.engine, &req)?;
    info!(
        nullifier = %field_to_decimal(&prepared.nullifier),
        operation_type = prepared.operations.operation_type,
        "prepared wallet update"
    );
    Ok(Json(prepared))
}

// ============ Wallet initialisation ============

#[derive(Deserialize)]
pub struct WalletInitProofRequest {
    pub signature: String,
    #[serde(deserialize_with = "decimal_u64::deserialize")]
    pub chain_id: u64,
}

#[derive(Serialize)]
pub struct ProofResponse {
    pub proof: String,
    pub public_inputs: BTreeMap<String, String>,
}

pub async fn prove_wallet_init(
    State(state): SharedState,
    Json(req): Json<WalletInitProofRequest>,
) -> Result<Json<ProofResponse>, ApiError> {
    let state = state.read().await;
    let keys = WalletKeys::derive_from_hex(&state.hasher, &req.signature, req.chain_id)?;
    let inputs = wallet_init_inputs(&state.hasher, *state.engine.params(), &keys)?;

    // Proving is fast enough to run on the request task.
    let output = state.init_prover.generate_proof(&inputs)?;

    Ok(Json(ProofResponse {
        proof: output.proof_hex(),
        public_inputs: output.public_inputs,
    }))
}

#[derive(Deserialize)]
pub struct VerifyProofRequest {
    pub proof: String,
    pub public_inputs: BTreeMap<String, String>,
}

#[derive(Serialize)]
pub struct VerifyProofResponse {
    pub valid: bool,
}

pub async fn verify_wallet_init(
    State(state): SharedState,
    Json(req): Json<VerifyProofRequest>,
) -> Result<Json<VerifyProofResponse>, ApiError> {
    let proof = hex::decode(req.proof.trim_start_matches("0x"))
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, "InvalidProofEncoding", e))?;

    let state = state.read().await;
    let valid = state.init_prover.verify_proof(&proof, &req.public_inputs)?;

    Ok(Json(VerifyProofResponse { valid }))
}
