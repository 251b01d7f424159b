//! Configuration management for the registry gateway
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub host: String,

    /// HTTP server port
    pub port: u16,

    /// Storage daemon API base, e.g. "http://127.0.0.1:5001/api/v0"
    pub storage_api_url: String,

    /// Ledger gateway base URL
    pub ledger_url: String,

    /// Address of the deployed content registry contract
    pub contract_address: String,

    /// Account the gateway signs registrations with; None runs read-only
    pub account: Option<String>,

    /// File holding the persisted duplicate cache
    pub dedupe_cache_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            port: env::var("GATEWAY_PORT")
                .unwrap_or_else(|_| "8086".to_string())
                .parse()
                .context("Invalid GATEWAY_PORT")?,

            storage_api_url: env::var("STORAGE_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:5001/api/v0".to_string()),

            ledger_url: env::var("LEDGER_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8545".to_string()),

            contract_address: env::var("CONTRACT_ADDRESS")
                .unwrap_or_else(|_| "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512".to_string()),

            account: env::var("GATEWAY_ACCOUNT").ok(),

            dedupe_cache_path: env::var("DEDUPE_CACHE_PATH")
                .unwrap_or_else(|_| "./registered_cids.json".to_string())
                .into(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("GATEWAY_PORT must be greater than 0");
        }

        if self.contract_address.is_empty() {
            anyhow::bail!("CONTRACT_ADDRESS must not be empty");
        }

        Ok(())
    }

    /// Get the HTTP server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
