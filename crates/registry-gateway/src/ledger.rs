//! Ledger client
//!
//! Thin request/response wrapper over the contract gateway. The ledger is
//! the sole arbiter of CID uniqueness; everything this module returns is a
//! projection of its state, never a substitute for it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use provenance_common::{Account, Cid, ContentRecord, ContentType, Error, RecordQuery, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Error code the gateway attaches when the contract call returned bytes
/// that do not decode into a record at all.
pub const CODE_NO_DATA: &str = "no data";

/// Outcome of an accepted registration transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
}

/// Narrow query/command interface to the registration ledger
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Look up the record for a CID.
    ///
    /// Three outcomes, kept distinct: a registered record, the ledger's
    /// well-formed empty record, or a call that failed to decode/transport.
    async fn get_content(&self, cid: &Cid) -> RecordQuery;

    /// CIDs the ledger currently attributes to `account`, in ledger order.
    ///
    /// Transport failures are swallowed into an empty list; the listing is
    /// read-only and a miss only costs a redundant lookup later.
    async fn owned_cids(&self, account: &Account) -> Vec<Cid>;

    /// Submit a registration transaction.
    ///
    /// The ledger rejects an already-registered CID; that rejection is the
    /// enforcement point for global uniqueness.
    async fn register(
        &self,
        account: &Account,
        cid: &Cid,
        title: &str,
        description: &str,
        content_type: ContentType,
    ) -> Result<TxReceipt>;
}

/// Record shape on the wire: the contract's
/// `(title, description, contentType, owner, timestamp, exists)` tuple as
/// the gateway serializes it.
#[derive(Debug, Serialize, Deserialize)]
pub struct WireRecord {
    pub cid: String,
    pub title: String,
    pub description: String,
    pub content_type: String,
    pub owner: String,
    /// Unix seconds, assigned at transaction execution
    pub timestamp: i64,
    pub exists: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwnedCidsResponse {
    cids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    account: &'a str,
    cid: &'a str,
    title: &'a str,
    description: &'a str,
    content_type: &'a str,
}

/// Turn a wire record into a query outcome.
///
/// A record with the presence flag down, a zero owner, or a blank key is the
/// ledger's default record for an unknown CID: `NotFound`, not `Found`.
pub fn query_from_wire(wire: WireRecord) -> RecordQuery {
    let cid = match Cid::new(wire.cid) {
        Ok(cid) => cid,
        Err(_) => return RecordQuery::NotFound,
    };

    let content_type = match wire.content_type.parse::<ContentType>() {
        Ok(ct) => ct,
        Err(e) => return RecordQuery::QueryFailed(e.to_string()),
    };

    let timestamp = match DateTime::<Utc>::from_timestamp(wire.timestamp, 0) {
        Some(ts) => ts,
        None => return RecordQuery::QueryFailed(format!("bad timestamp {}", wire.timestamp)),
    };

    let record = ContentRecord {
        cid,
        title: wire.title,
        description: wire.description,
        content_type,
        owner: Account::new(wire.owner),
        timestamp,
        exists: wire.exists,
    };

    if record.is_unregistered() {
        RecordQuery::NotFound
    } else {
        RecordQuery::Found(record)
    }
}

/// Ledger client over the contract gateway's REST surface
pub struct HttpLedger {
    base_url: String,
    contract_address: String,
    client: reqwest::Client,
}

impl HttpLedger {
    pub fn new(base_url: String, contract_address: String) -> Self {
        Self {
            base_url,
            contract_address,
            client: reqwest::Client::new(),
        }
    }

    fn contract_url(&self, tail: &str) -> String {
        format!(
            "{}/contract/{}/{}",
            self.base_url, self.contract_address, tail
        )
    }
}

#[async_trait]
impl Ledger for HttpLedger {
    async fn get_content(&self, cid: &Cid) -> RecordQuery {
        let url = self.contract_url(&format!("content/{}", cid));

        debug!("Querying ledger record: {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => return RecordQuery::QueryFailed(e.to_string()),
        };

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return RecordQuery::NotFound;
        }

        if !response.status().is_success() {
            let status = response.status();
            // The gateway reports undecodable contract returns with a
            // distinct error code; keep that reason visible to callers.
            if let Ok(body) = response.json::<ErrorBody>().await {
                if body.code.as_deref() == Some(CODE_NO_DATA) {
                    return RecordQuery::QueryFailed(CODE_NO_DATA.to_string());
                }
                return RecordQuery::QueryFailed(body.error);
            }
            return RecordQuery::QueryFailed(format!("ledger answered {}", status));
        }

        match response.json::<WireRecord>().await {
            Ok(wire) => query_from_wire(wire),
            Err(e) => RecordQuery::QueryFailed(e.to_string()),
        }
    }

    async fn owned_cids(&self, account: &Account) -> Vec<Cid> {
        let url = self.contract_url(&format!("accounts/{}/contents", account));

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Owned-CID listing failed for {}: {}", account, e);
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!(
                "Owned-CID listing for {} answered {}",
                account,
                response.status()
            );
            return Vec::new();
        }

        let body: OwnedCidsResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!("Owned-CID listing undecodable for {}: {}", account, e);
                return Vec::new();
            }
        };

        body.cids
            .into_iter()
            .filter_map(|s| Cid::new(s).ok())
            .collect()
    }

    async fn register(
        &self,
        account: &Account,
        cid: &Cid,
        title: &str,
        description: &str,
        content_type: ContentType,
    ) -> Result<TxReceipt> {
        let url = self.contract_url("register");

        debug!("Submitting registration for {} by {}", cid, account);

        let request = RegisterRequest {
            account: account.as_str(),
            cid: cid.as_str(),
            title,
            description,
            content_type: content_type.as_str(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Ledger(e.to_string()))?;

        // The contract reverts on an already-registered CID; the gateway
        // relays that as a conflict.
        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(Error::DuplicateCid(
                provenance_common::DuplicateScope::OtherAccount,
            ));
        }

        if !response.status().is_success() {
            let status = response.status();
            if let Ok(body) = response.json::<ErrorBody>().await {
                if body.error.contains("execution reverted") {
                    return Err(Error::DuplicateCid(
                        provenance_common::DuplicateScope::OtherAccount,
                    ));
                }
                return Err(Error::Ledger(body.error));
            }
            return Err(Error::Ledger(format!("ledger answered {}", status)));
        }

        let receipt: TxReceipt = response
            .json()
            .await
            .map_err(|e| Error::Ledger(format!("malformed receipt: {}", e)))?;

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provenance_common::account::ZERO_ADDRESS;

    fn wire(owner: &str, exists: bool) -> WireRecord {
        WireRecord {
            cid: "Qm123".to_string(),
            title: "Photo".to_string(),
            description: "Beach".to_string(),
            content_type: "Image".to_string(),
            owner: owner.to_string(),
            timestamp: 1_724_000_000,
            exists,
        }
    }

    #[test]
    fn test_wire_record_becomes_found() {
        let query = query_from_wire(wire("0xabc0000000000000000000000000000000000001", true));
        match query {
            RecordQuery::Found(record) => {
                assert_eq!(record.cid.as_str(), "Qm123");
                assert_eq!(record.content_type, ContentType::Image);
                assert!(record.exists);
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_default_record_becomes_not_found() {
        assert!(matches!(
            query_from_wire(wire(ZERO_ADDRESS, true)),
            RecordQuery::NotFound
        ));
        assert!(matches!(
            query_from_wire(wire("0xabc0000000000000000000000000000000000001", false)),
            RecordQuery::NotFound
        ));
    }

    #[test]
    fn test_unknown_content_type_is_query_failure() {
        let mut bad = wire("0xabc0000000000000000000000000000000000001", true);
        bad.content_type = "Hologram".to_string();
        assert!(matches!(
            query_from_wire(bad),
            RecordQuery::QueryFailed(_)
        ));
    }
}
