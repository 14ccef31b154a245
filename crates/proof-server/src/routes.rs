//! API route definitions.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::RwLock;

use crate::handlers;
use crate::AppState;

/// Create API routes
pub fn api_routes() -> Router<Arc<RwLock<AppState>>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Utility endpoints
        .route("/api/utils/poseidon-hash", post(handlers::poseidon_hash))
        .route("/api/commitment/create", post(handlers::create_commitment))
        .route("/api/keys/derive", post(handlers::derive_keys))
        .route("/api/blinding/generate", post(handlers::generate_blinding))
        // Wallet transitions
        .route("/api/wallet/apply-action", post(handlers::apply_action))
        .route("/api/proof/wallet-update-inputs", post(handlers::wallet_update_inputs))
        // Wallet initialisation proofs
        .route("/api/proof/wallet-init", post(handlers::prove_wallet_init))
        .route("/api/proof/verify-wallet-init", post(handlers::verify_wallet_init))
}
