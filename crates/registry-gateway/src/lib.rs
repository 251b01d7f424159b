//! Registry Gateway
//!
//! Registers proof of ownership of digital content: files are submitted to a
//! content-addressed storage daemon for their CID, checked against a local
//! duplicate cache and the authoritative ledger, and recorded on the content
//! registry contract through the connected wallet.

pub mod config;
pub mod dedupe;
pub mod gallery;
pub mod handlers;
pub mod known;
pub mod ledger;
pub mod storage_node;
pub mod wallet;
pub mod workflow;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use dedupe::DuplicateCache;
pub use gallery::Gallery;
pub use handlers::AppState;
pub use ledger::{HttpLedger, Ledger, TxReceipt};
pub use storage_node::{IdentifierSource, StorageNodeClient};
pub use wallet::{ConfiguredWallet, WalletProvider};
pub use workflow::{
    DuplicateStatus, RegistrationOutcome, RegistrationRequest, RegistrationWorkflow, WorkflowState,
};

/// Largest upload the register endpoint accepts
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/api/contents",
            post(handlers::register_content_handler),
        )
        .route(
            "/api/contents/:cid",
            get(handlers::get_content_handler),
        )
        .route(
            "/api/contents/:cid/status",
            get(handlers::content_status_handler),
        )
        .route(
            "/api/accounts/:account/contents",
            get(handlers::gallery_handler),
        )
        .with_state(shared_state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
