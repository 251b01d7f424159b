//! In-memory doubles for the external collaborators: identifier source,
//! ledger, and wallet.

use async_trait::async_trait;
use chrono::Utc;
use provenance_common::{
    Account, Cid, ContentRecord, ContentType, DuplicateScope, Error, RecordQuery, Result,
};
use registry_gateway::ledger::{Ledger, TxReceipt};
use registry_gateway::storage_node::IdentifierSource;
use registry_gateway::wallet::{TxSummary, WalletProvider};
use registry_gateway::{AppState, DuplicateCache, Gallery, RegistrationRequest, RegistrationWorkflow};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

pub const ALICE: &str = "0xa11ce00000000000000000000000000000000001";
pub const BOB: &str = "0xb0b0000000000000000000000000000000000002";

/// Deterministic identifier source: hashes the bytes, unless a CID has been
/// pinned for them.
pub struct MockIdentifier {
    pub unavailable: AtomicBool,
    pub compute_calls: AtomicUsize,
    pinned: Mutex<HashMap<Vec<u8>, Cid>>,
}

impl MockIdentifier {
    pub fn new() -> Self {
        Self {
            unavailable: AtomicBool::new(false),
            compute_calls: AtomicUsize::new(0),
            pinned: Mutex::new(HashMap::new()),
        }
    }

    pub fn pin(&self, bytes: &[u8], cid: &str) {
        self.pinned
            .lock()
            .unwrap()
            .insert(bytes.to_vec(), Cid::new(cid).unwrap());
    }
}

#[async_trait]
impl IdentifierSource for MockIdentifier {
    async fn compute_identifier(&self, bytes: Vec<u8>, _name: &str) -> Result<Cid> {
        self.compute_calls.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::StorageUnavailable("connection refused".to_string()));
        }

        if let Some(cid) = self.pinned.lock().unwrap().get(&bytes) {
            return Ok(cid.clone());
        }

        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Cid::new(format!("Qm{:016x}", hasher.finish()))
    }
}

/// In-memory ledger enforcing CID uniqueness the way the contract does.
pub struct MockLedger {
    pub records: Mutex<HashMap<Cid, ContentRecord>>,
    pub owned: Mutex<HashMap<Account, Vec<Cid>>>,
    pub get_calls: AtomicUsize,
    /// When set, every read answers `QueryFailed("no data")`
    pub fail_reads: AtomicBool,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            owned: Mutex::new(HashMap::new()),
            get_calls: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Insert a record as if it had been registered earlier.
    pub fn seed(&self, cid: &str, owner: &str, title: &str, exists: bool) {
        let cid = Cid::new(cid).unwrap();
        let owner = Account::new(owner);
        let record = ContentRecord {
            cid: cid.clone(),
            title: title.to_string(),
            description: format!("{} description", title),
            content_type: ContentType::Image,
            owner: owner.clone(),
            timestamp: Utc::now(),
            exists,
        };
        self.records.lock().unwrap().insert(cid.clone(), record);
        self.owned.lock().unwrap().entry(owner).or_default().push(cid);
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn get_content(&self, cid: &Cid) -> RecordQuery {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_reads.load(Ordering::SeqCst) {
            return RecordQuery::QueryFailed("no data".to_string());
        }

        match self.records.lock().unwrap().get(cid) {
            Some(record) => RecordQuery::Found(record.clone()),
            None => RecordQuery::NotFound,
        }
    }

    async fn owned_cids(&self, account: &Account) -> Vec<Cid> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Vec::new();
        }
        self.owned
            .lock()
            .unwrap()
            .get(account)
            .cloned()
            .unwrap_or_default()
    }

    async fn register(
        &self,
        account: &Account,
        cid: &Cid,
        title: &str,
        description: &str,
        content_type: ContentType,
    ) -> Result<TxReceipt> {
        let mut records = self.records.lock().unwrap();

        if records.contains_key(cid) {
            return Err(Error::DuplicateCid(DuplicateScope::OtherAccount));
        }

        let record = ContentRecord {
            cid: cid.clone(),
            title: title.to_string(),
            description: description.to_string(),
            content_type,
            owner: account.clone(),
            timestamp: Utc::now(),
            exists: true,
        };
        records.insert(cid.clone(), record);
        self.owned
            .lock()
            .unwrap()
            .entry(account.clone())
            .or_default()
            .push(cid.clone());

        Ok(TxReceipt {
            tx_hash: format!("0xtx{:04}", records.len()),
            block_number: Some(records.len() as u64),
        })
    }
}

/// Wallet double with a switchable account, optional rejection, and an
/// optional approval delay for overlap tests.
pub struct MockWallet {
    tx: watch::Sender<Option<Account>>,
    pub approvals: AtomicUsize,
    pub reject: AtomicBool,
    pub approve_delay_ms: AtomicU64,
}

impl MockWallet {
    pub fn new(account: Option<&str>) -> Self {
        let (tx, _) = watch::channel(account.map(Account::new));
        Self {
            tx,
            approvals: AtomicUsize::new(0),
            reject: AtomicBool::new(false),
            approve_delay_ms: AtomicU64::new(0),
        }
    }

    pub fn connect(&self, account: &str) {
        self.tx.send_replace(Some(Account::new(account)));
    }

    pub fn disconnect(&self) {
        self.tx.send_replace(None);
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    fn account(&self) -> Option<Account> {
        self.tx.borrow().clone()
    }

    async fn approve(&self, _summary: &TxSummary) -> Result<()> {
        self.approvals.fetch_add(1, Ordering::SeqCst);

        let delay = self.approve_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }

        if self.reject.load(Ordering::SeqCst) {
            return Err(Error::WalletRejected);
        }
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Account>> {
        self.tx.subscribe()
    }
}

/// A workflow wired to the doubles, with its duplicate cache on a tempdir.
pub struct Harness {
    pub identifier: Arc<MockIdentifier>,
    pub ledger: Arc<MockLedger>,
    pub wallet: Arc<MockWallet>,
    pub workflow: Arc<RegistrationWorkflow>,
    pub cache_path: PathBuf,
    _dir: tempfile::TempDir,
}

impl Harness {
    /// Workflow connected as ALICE with an empty cache.
    pub fn new() -> Self {
        Self::with_account(Some(ALICE))
    }

    pub fn with_account(account: Option<&str>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("registered_cids.json");
        let cache = DuplicateCache::open(&cache_path).unwrap();

        let identifier = Arc::new(MockIdentifier::new());
        let ledger = Arc::new(MockLedger::new());
        let wallet = Arc::new(MockWallet::new(account));

        let workflow = Arc::new(RegistrationWorkflow::new(
            identifier.clone(),
            ledger.clone(),
            wallet.clone(),
            cache,
        ));

        Self {
            identifier,
            ledger,
            wallet,
            workflow,
            cache_path,
            _dir: dir,
        }
    }

    /// Application state for router tests, sharing the doubles.
    pub fn app_state(&self) -> AppState {
        let ledger: Arc<dyn Ledger> = self.ledger.clone();
        AppState {
            workflow: self.workflow.clone(),
            gallery: Gallery::new(ledger.clone()),
            ledger,
        }
    }
}

/// A filled-in form for a beach photo.
pub fn photo_request() -> RegistrationRequest {
    RegistrationRequest {
        file_name: "beach.png".to_string(),
        bytes: b"beach photo bytes".to_vec(),
        title: "Photo".to_string(),
        description: "Beach".to_string(),
        content_type: ContentType::Image,
    }
}
