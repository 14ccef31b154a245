//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::OnceLock;

use ark_bn254::Fr;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use zenigma_circuits::{
    compute_commitment, field_to_decimal, initial_commitment, keys::derive_blinder, Action,
    CommitmentTree, FieldHasher, PoseidonHasher, Transfer, UpdateRequest, WalletKeys,
    WalletParams, WalletState,
};
use zenigma_prover::setup::{setup_wallet_init, CircuitKeys};

use crate::{app, AppState};

const SIGNATURE: &str = "0x9c1e4b2a7f3d8e6c5b4a39281706f5e4d3c2b1a09f8e7d6c5b4a392817065f2a\
                         1bd3a44e4c7f0a0b6f1d9c3e2b8a7d6c5b4a392817065f2a1bd3a44e4c7f0a1c";

fn circuit_keys() -> CircuitKeys {
    static KEYS: OnceLock<CircuitKeys> = OnceLock::new();
    KEYS.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(42);
        let wallet_init =
            setup_wallet_init(&mut rng, &PoseidonHasher::new(), WalletParams::default()).unwrap();
        CircuitKeys { wallet_init }
    })
    .clone()
}

fn test_app() -> Router {
    app(AppState::new(
        PoseidonHasher::new(),
        WalletParams::default(),
        circuit_keys(),
    ))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = test_app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post(uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

fn decimal(value: &Fr) -> Value {
    Value::String(field_to_decimal(value))
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_poseidon_hash() {
    let hasher = PoseidonHasher::new();
    let (status, body) = post("/api/utils/poseidon-hash", json!({ "inputs": ["1", "0x2"] })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hash"], decimal(&hasher.hash(&[Fr::from(1u64), Fr::from(2u64)])));
}

#[tokio::test]
async fn test_poseidon_hash_rejects_out_of_field() {
    let modulus = zenigma_circuits::field::modulus().to_string();
    let (status, body) = post("/api/utils/poseidon-hash", json!({ "inputs": [modulus] })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "InvalidFieldElement");
}

#[tokio::test]
async fn test_derive_keys() {
    let hasher = PoseidonHasher::new();
    let keys = WalletKeys::derive_from_hex(&hasher, SIGNATURE, 1).unwrap();
    let commitment = initial_commitment(&hasher, WalletParams::default(), &keys).unwrap();

    let (status, body) = post("/api/keys/derive", json!({ "signature": SIGNATURE, "chain_id": 1 })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pk_root"], decimal(&keys.pk_root));
    assert_eq!(body["pk_match"], decimal(&keys.pk_match));
    assert_eq!(body["initial_commitment"], decimal(&commitment));
    assert_eq!(body["symmetric_key"], format!("0x{}", hex::encode(keys.symmetric_key)));
}

#[tokio::test]
async fn test_derive_keys_accepts_string_chain_id() {
    let (_, as_number) = post("/api/keys/derive", json!({ "signature": SIGNATURE, "chain_id": 1 })).await;
    let (status, as_string) =
        post("/api/keys/derive", json!({ "signature": SIGNATURE, "chain_id": "1" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_string["pk_root"], as_number["pk_root"]);
    assert_eq!(as_string["symmetric_key"], as_number["symmetric_key"]);
}

#[tokio::test]
async fn test_derive_keys_rejects_bad_signature() {
    let (status, body) = post("/api/keys/derive", json!({ "signature": "0xnothex", "chain_id": 1 })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "InvalidSignature");
}

#[tokio::test]
async fn test_create_commitment_matches_initial_commitment() {
    let hasher = PoseidonHasher::new();
    let params = WalletParams::default();
    let keys = WalletKeys::from_sk_root(&hasher, Fr::from(31337u64), 1);

    let (status, body) = post(
        "/api/commitment/create",
        json!({
            "state": WalletState::empty(params),
            "pk_root": decimal(&keys.pk_root),
            "pk_match": decimal(&keys.pk_match),
            "blinder": decimal(&keys.blinder(&hasher, 0)),
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["commitment"],
        decimal(&initial_commitment(&hasher, params, &keys).unwrap())
    );
}

#[tokio::test]
async fn test_create_commitment_rejects_wrong_shape() {
    let state = WalletState::empty(WalletParams {
        total_tokens: 3,
        max_pending_orders: 4,
    });
    let (status, body) = post(
        "/api/commitment/create",
        json!({ "state": state, "pk_root": "1", "pk_match": "2", "blinder": "3" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "InvalidStateShape");
}

#[tokio::test]
async fn test_generate_blinding() {
    let hasher = PoseidonHasher::new();
    let (status, body) = post(
        "/api/blinding/generate",
        json!({ "blinder_seed": "99", "nonce": 4 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blinder"], decimal(&derive_blinder(&hasher, Fr::from(99u64), 4)));

    let (status, body) = post(
        "/api/blinding/generate",
        json!({ "blinder_seed": "99", "nonce": "4" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blinder"], decimal(&derive_blinder(&hasher, Fr::from(99u64), 4)));

    let (status, body) = post("/api/blinding/generate", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let random = body["blinder"].as_str().unwrap();
    assert!(zenigma_circuits::parse_field(random).is_ok());
}

#[tokio::test]
async fn test_apply_action() {
    let state = WalletState::empty(WalletParams::default());
    let action = Action::Transfer(Transfer::deposit(0, 100u32));

    let (status, body) = post("/api/wallet/apply-action", json!({ "state": state, "action": action })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_state"]["available_balances"][0], "100");
    assert_eq!(body["new_state"]["nonce"], "0");
    assert_eq!(body["operations"]["operation_type"], 0);
}

#[tokio::test]
async fn test_apply_action_rejects_overdraw() {
    let state = WalletState::empty(WalletParams::default());
    let action = Action::Transfer(Transfer::withdraw(0, 1u32));

    let (status, body) = post("/api/wallet/apply-action", json!({ "state": state, "action": action })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "InsufficientBalance");
}

fn update_request() -> UpdateRequest {
    let hasher = PoseidonHasher::new();
    let keys = WalletKeys::from_sk_root(&hasher, Fr::from(8u64), 1);
    let mut old_state = WalletState::empty(WalletParams::default());
    old_state.available_balances[4] = 50u32.into();
    old_state.nonce = 5;
    let commitment = compute_commitment(
        &hasher,
        &old_state,
        keys.pk_root,
        keys.pk_match,
        keys.blinder(&hasher, 5),
    )
    .unwrap();

    let mut tree = CommitmentTree::new(hasher.clone());
    tree.insert(11, commitment).unwrap();

    UpdateRequest {
        user_secret: "correct horse".to_string(),
        pk_root: keys.pk_root,
        pk_match: keys.pk_match,
        blinder_seed: keys.blinder_seed,
        old_state,
        action: Action::Transfer(Transfer::withdraw(4, 20u32)),
        old_root: tree.root(),
        path: tree.path(11).unwrap(),
    }
}

#[tokio::test]
async fn test_wallet_update_inputs() {
    let request = update_request();
    let (status, body) = post("/api/proof/wallet-update-inputs", json!(request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_state"]["available_balances"][4], "30");
    assert_eq!(body["new_state"]["nonce"], "6");
    assert_eq!(body["inputs"]["old_merkle_root"], decimal(&request.old_root));
    assert!(body["signing_payload"].as_str().unwrap().starts_with("0x"));
}

#[tokio::test]
async fn test_wallet_update_inputs_rejects_wrong_root() {
    let mut request = update_request();
    request.old_root = Fr::from(1u64);
    let (status, body) = post("/api/proof/wallet-update-inputs", json!(request)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MerkleVerificationFailed");
}

#[tokio::test]
async fn test_wallet_init_prove_and_verify() {
    let (status, proof) = post("/api/proof/wallet-init", json!({ "signature": SIGNATURE, "chain_id": 1 })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post("/api/proof/verify-wallet-init", proof.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);

    let mut tampered = proof;
    tampered["public_inputs"]["initial_commitment"] = json!("42");
    let (status, body) = post("/api/proof/verify-wallet-init", tampered).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn test_verify_rejects_bad_hex() {
    let (status, body) = post(
        "/api/proof/verify-wallet-init",
        json!({ "proof": "0xzz", "public_inputs": { "initial_commitment": "1" } }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "InvalidProofEncoding");
}
