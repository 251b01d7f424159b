//! Per-account known CIDs
//!
//! In-memory set of CIDs the ledger attributes to the currently connected
//! account. Rebuilt from the ledger on every account change, never
//! persisted.

use provenance_common::{Account, Cid};
use std::collections::HashSet;

#[derive(Default)]
pub struct KnownCids {
    account: Option<Account>,
    cids: HashSet<Cid>,
}

impl KnownCids {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set with the ledger's view for a freshly connected account.
    pub fn rebuild(&mut self, account: Account, cids: Vec<Cid>) {
        self.account = Some(account);
        self.cids = cids.into_iter().collect();
    }

    /// Forget everything on disconnect.
    pub fn clear(&mut self) {
        self.account = None;
        self.cids.clear();
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    pub fn contains(&self, cid: &Cid) -> bool {
        self.cids.contains(cid)
    }

    pub fn insert(&mut self, cid: Cid) {
        self.cids.insert(cid);
    }

    pub fn len(&self) -> usize {
        self.cids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cids.is_empty()
    }
}
