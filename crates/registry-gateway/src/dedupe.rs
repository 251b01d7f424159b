//! Local duplicate cache
//!
//! Persistent set of every CID this installation has registered under any
//! account, used as a fast pre-check before contacting the ledger. The set
//! is advisory only; the ledger remains authoritative. Growth is monotonic:
//! nothing is ever evicted by normal operation.

use provenance_common::{Cid, Error, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File-backed duplicate cache: one named JSON entry holding the CID list.
pub struct DuplicateCache {
    path: PathBuf,
    cids: BTreeSet<Cid>,
}

impl DuplicateCache {
    /// Open the cache, loading the persisted entry if one exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let cids = if path.exists() {
            let data = fs::read_to_string(&path)
                .map_err(|e| Error::Cache(format!("read {}: {}", path.display(), e)))?;
            let entries: Vec<String> = serde_json::from_str(&data)
                .map_err(|e| Error::Cache(format!("parse {}: {}", path.display(), e)))?;
            entries
                .into_iter()
                .filter_map(|s| Cid::new(s).ok())
                .collect()
        } else {
            BTreeSet::new()
        };

        info!(
            "Duplicate cache opened at {} with {} entries",
            path.display(),
            cids.len()
        );

        Ok(Self { path, cids })
    }

    pub fn contains(&self, cid: &Cid) -> bool {
        self.cids.contains(cid)
    }

    /// Record a CID as registered. Idempotent; persists immediately so the
    /// entry survives process restart.
    pub fn add(&mut self, cid: &Cid) -> Result<()> {
        if !self.cids.insert(cid.clone()) {
            debug!("Duplicate cache already held {}", cid);
            return Ok(());
        }
        self.persist()?;
        debug!("Duplicate cache recorded {}", cid);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cids.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let entries: Vec<&str> = self.cids.iter().map(|c| c.as_str()).collect();
        let json = serde_json::to_string(&entries)?;
        fs::write(&self.path, json)
            .map_err(|e| Error::Cache(format!("write {}: {}", self.path.display(), e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(s: &str) -> Cid {
        Cid::new(s).unwrap()
    }

    #[test]
    fn test_add_then_contains() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cids.json");

        let mut cache = DuplicateCache::open(&path).unwrap();
        assert!(!cache.contains(&cid("Qm123")));

        cache.add(&cid("Qm123")).unwrap();
        assert!(cache.contains(&cid("Qm123")));

        // Idempotent
        cache.add(&cid("Qm123")).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cids.json");

        {
            let mut cache = DuplicateCache::open(&path).unwrap();
            cache.add(&cid("Qm123")).unwrap();
            cache.add(&cid("QmXYZ")).unwrap();
        }

        let reopened = DuplicateCache::open(&path).unwrap();
        assert!(reopened.contains(&cid("Qm123")));
        assert!(reopened.contains(&cid("QmXYZ")));
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_persisted_entry_is_a_cid_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cids.json");

        let mut cache = DuplicateCache::open(&path).unwrap();
        cache.add(&cid("Qm123")).unwrap();

        let data = fs::read_to_string(&path).unwrap();
        let entries: Vec<String> = serde_json::from_str(&data).unwrap();
        assert_eq!(entries, vec!["Qm123".to_string()]);
    }
}
