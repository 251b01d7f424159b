//! Gallery reader
//!
//! Read-only projection of an account's registered content: the owned-CID
//! list resolved record by record, with absent or failed lookups dropped.
//! No caching beyond the call.

use crate::ledger::Ledger;
use provenance_common::{Account, ContentRecord, RecordQuery};
use std::sync::Arc;
use tracing::debug;

pub struct Gallery {
    ledger: Arc<dyn Ledger>,
}

impl Gallery {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Records the ledger attributes to `account`, in the order the ledger
    /// listed them, keyed by CID. Entries that resolve to the default record
    /// or fail to resolve are filtered out.
    pub async fn contents_of(&self, account: &Account) -> Vec<ContentRecord> {
        let cids = self.ledger.owned_cids(account).await;

        let mut records = Vec::with_capacity(cids.len());
        for cid in &cids {
            match self.ledger.get_content(cid).await {
                RecordQuery::Found(record) if record.exists => records.push(record),
                RecordQuery::Found(_) | RecordQuery::NotFound => {
                    debug!("Skipping stale gallery entry {}", cid);
                }
                RecordQuery::QueryFailed(reason) => {
                    debug!("Skipping unresolvable gallery entry {}: {}", cid, reason);
                }
            }
        }

        records
    }
}
