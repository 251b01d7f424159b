//! Client for the content-addressed storage daemon
//!
//! The daemon derives the content identifier and, as a byproduct, persists
//! the bytes so they stay retrievable by CID.

use async_trait::async_trait;
use provenance_common::{Cid, Error, Result};
use serde::Deserialize;
use tracing::{debug, info};

/// Anything that can turn file bytes into a content identifier.
///
/// Deterministic: the same bytes always yield the same CID.
#[async_trait]
pub trait IdentifierSource: Send + Sync {
    async fn compute_identifier(&self, bytes: Vec<u8>, name: &str) -> Result<Cid>;
}

/// Client for the storage daemon's HTTP API
pub struct StorageNodeClient {
    api_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    #[serde(rename = "ID")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

impl StorageNodeClient {
    /// Create a new client against a daemon API base like
    /// "http://127.0.0.1:5001/api/v0"
    pub fn new(api_url: String) -> Self {
        Self {
            api_url,
            client: reqwest::Client::new(),
        }
    }

    /// Liveness check against the daemon, returns the node ID.
    ///
    /// An `Err` here is always `StorageUnavailable`; retrying after the
    /// daemon comes back retracts the condition.
    pub async fn check_connection(&self) -> Result<String> {
        let url = format!("{}/id", self.api_url);

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::StorageUnavailable(format!(
                "daemon answered {} on {}",
                response.status(),
                url
            )));
        }

        let body: IdResponse = response
            .json()
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?;

        info!("Storage daemon reachable, node ID: {}", body.id);

        Ok(body.id)
    }
}

#[async_trait]
impl IdentifierSource for StorageNodeClient {
    /// Submit content and return its CID.
    ///
    /// Daemon-unreachable surfaces as `StorageUnavailable`; a daemon that
    /// answers but refuses the content surfaces as `ContentRejected`.
    async fn compute_identifier(&self, bytes: Vec<u8>, name: &str) -> Result<Cid> {
        let url = format!("{}/add", self.api_url);

        debug!("Submitting {} bytes to storage daemon as {}", bytes.len(), name);

        let part = reqwest::multipart::Part::bytes(bytes).file_name(name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::ContentRejected(format!(
                "daemon answered {}",
                response.status()
            )));
        }

        let body: AddResponse = response
            .json()
            .await
            .map_err(|e| Error::ContentRejected(format!("malformed add response: {}", e)))?;

        let cid = Cid::new(body.hash)?;

        debug!("Storage daemon derived CID {}", cid);

        Ok(cid)
    }
}
