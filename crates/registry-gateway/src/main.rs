//! Registry Gateway Service
//!
//! REST API for registering proof of ownership of digital content against
//! the content registry contract.

use anyhow::{Context, Result};
use provenance_common::Account;
use registry_gateway::{
    create_router, AppState, Config, ConfiguredWallet, DuplicateCache, Gallery, HttpLedger,
    RegistrationWorkflow, StorageNodeClient, WalletProvider,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "registry_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Starting Registry Gateway Service");
    info!("Storage daemon API: {}", config.storage_api_url);
    info!("Ledger gateway: {}", config.ledger_url);
    info!("Contract: {}", config.contract_address);

    let storage = Arc::new(StorageNodeClient::new(config.storage_api_url.clone()));

    // The daemon may come up later; registration surfaces the condition
    // per-request, so a failed probe is not fatal.
    match storage.check_connection().await {
        Ok(node_id) => info!("Storage daemon node ID: {}", node_id),
        Err(e) => warn!("Storage daemon probe failed: {}", e),
    }

    let ledger = Arc::new(HttpLedger::new(
        config.ledger_url.clone(),
        config.contract_address.clone(),
    ));

    let wallet = Arc::new(ConfiguredWallet::new(
        config.account.clone().map(Account::new),
    ));
    match wallet.account() {
        Some(account) => info!("Signing account: {}", account.abbreviated()),
        None => warn!("No signing account configured; running read-only"),
    }

    let cache = DuplicateCache::open(&config.dedupe_cache_path)
        .context("Failed to open duplicate cache")?;

    let workflow = Arc::new(RegistrationWorkflow::new(
        storage,
        ledger.clone(),
        wallet,
        cache,
    ));
    workflow.spawn_account_watcher();

    let state = AppState {
        workflow,
        gallery: Gallery::new(ledger.clone()),
        ledger,
    };

    let app = create_router(state);

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    info!("Registry Gateway Service running on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
