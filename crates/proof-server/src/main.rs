//! HTTP API server for shielded wallet commitments, transitions and proofs.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod handlers;
mod routes;

#[cfg(test)]
mod tests;

use config::ServerConfig;
use zenigma_circuits::{PoseidonHasher, StateTransitionEngine, WalletParams};
use zenigma_prover::setup::{setup_all_circuits, CircuitKeys, SetupError};
use zenigma_prover::Groth16WalletInitProver;

/// Application state shared across handlers
pub struct AppState {
    pub hasher: PoseidonHasher,
    pub engine: StateTransitionEngine,
    pub init_prover: Arc<Groth16WalletInitProver>,
}

impl AppState {
    pub fn new(hasher: PoseidonHasher, params: WalletParams, keys: CircuitKeys) -> Self {
        let init_prover = Groth16WalletInitProver::new(keys.wallet_init, hasher.clone(), params);
        Self {
            hasher,
            engine: StateTransitionEngine::new(params),
            init_prover: Arc::new(init_prover),
        }
    }
}

/// Build the router with CORS and request tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(Arc::new(RwLock::new(state)))
}

/// Load circuit keys from `dir`, or run setup and save them there.
fn load_or_setup_keys(
    dir: &Path,
    hasher: &PoseidonHasher,
    params: WalletParams,
) -> Result<CircuitKeys, SetupError> {
    if dir.exists() {
        info!(dir = %dir.display(), "loading existing circuit keys");
        return CircuitKeys::load_from_directory(dir);
    }

    info!("running trusted setup (this may take a while)");
    let keys = setup_all_circuits(hasher, params)?;
    keys.save_to_directory(dir)?;
    Ok(keys)
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    info!(?config, "starting proof server");

    let hasher = PoseidonHasher::new();
    let params = WalletParams::default();
    let keys = load_or_setup_keys(&config.keys_dir, &hasher, params)?;

    let app = app(AppState::new(hasher, params, keys));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
