//! Registration workflow
//!
//! Orchestrates CID computation, duplicate checking (local cache, then
//! per-account known set, then the ledger record), wallet approval,
//! transaction submission, and result reconciliation. One attempt may be in
//! flight per workflow instance; every error path returns to `Idle` and the
//! caller keeps its form state.

use crate::dedupe::DuplicateCache;
use crate::known::KnownCids;
use crate::ledger::{Ledger, TxReceipt};
use crate::storage_node::IdentifierSource;
use crate::wallet::{TxSummary, WalletProvider};
use provenance_common::{Account, Cid, ContentType, DuplicateScope, Error, RecordQuery, Result};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    ComputingIdentifier,
    CheckingDuplicates,
    AwaitingSignature,
    Submitting,
    Confirmed,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Idle => "idle",
            WorkflowState::ComputingIdentifier => "computing_identifier",
            WorkflowState::CheckingDuplicates => "checking_duplicates",
            WorkflowState::AwaitingSignature => "awaiting_signature",
            WorkflowState::Submitting => "submitting",
            WorkflowState::Confirmed => "confirmed",
        };
        f.write_str(name)
    }
}

/// A filled-in registration form
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub title: String,
    pub description: String,
    pub content_type: ContentType,
}

/// Result of a confirmed registration
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub cid: Cid,
    pub receipt: TxReceipt,
}

/// Outcome of the pre-submission duplicate check on a selected file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateStatus {
    New,
    AlreadyRegisteredByYou,
    AlreadyRegisteredByOther,
}

pub struct RegistrationWorkflow {
    identifier: Arc<dyn IdentifierSource>,
    ledger: Arc<dyn Ledger>,
    wallet: Arc<dyn WalletProvider>,
    cache: Mutex<DuplicateCache>,
    known: Mutex<KnownCids>,
    state: StdMutex<WorkflowState>,
    in_flight: AtomicBool,
}

/// Resets the workflow to `Idle` on every exit from `submit`, success or
/// error alike.
struct Flight<'a> {
    workflow: &'a RegistrationWorkflow,
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.workflow.set_state(WorkflowState::Idle);
        self.workflow.in_flight.store(false, Ordering::SeqCst);
    }
}

impl RegistrationWorkflow {
    pub fn new(
        identifier: Arc<dyn IdentifierSource>,
        ledger: Arc<dyn Ledger>,
        wallet: Arc<dyn WalletProvider>,
        cache: DuplicateCache,
    ) -> Self {
        Self {
            identifier,
            ledger,
            wallet,
            cache: Mutex::new(cache),
            known: Mutex::new(KnownCids::new()),
            state: StdMutex::new(WorkflowState::Idle),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> WorkflowState {
        *self.state.lock().expect("state lock poisoned")
    }

    fn set_state(&self, next: WorkflowState) {
        let mut state = self.state.lock().expect("state lock poisoned");
        if *state != next {
            debug!("Workflow state: {} -> {}", state, next);
            *state = next;
        }
    }

    fn begin(&self) -> Result<Flight<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::Busy);
        }
        Ok(Flight { workflow: self })
    }

    fn validate(&self, request: &RegistrationRequest) -> Result<Account> {
        let account = self.wallet.account().ok_or(Error::Validation("account"))?;
        if request.bytes.is_empty() {
            return Err(Error::Validation("file"));
        }
        if request.title.trim().is_empty() {
            return Err(Error::Validation("title"));
        }
        if request.description.trim().is_empty() {
            return Err(Error::Validation("description"));
        }
        Ok(account)
    }

    /// Run one registration attempt end to end.
    pub async fn submit(&self, request: RegistrationRequest) -> Result<RegistrationOutcome> {
        let _flight = self.begin()?;
        let account = self.validate(&request)?;

        self.set_state(WorkflowState::ComputingIdentifier);
        let cid = self
            .identifier
            .compute_identifier(request.bytes, &request.file_name)
            .await?;

        self.set_state(WorkflowState::CheckingDuplicates);
        self.check_duplicates(&cid, &account).await?;

        self.set_state(WorkflowState::AwaitingSignature);
        let summary = TxSummary {
            account: account.clone(),
            cid: cid.clone(),
            title: request.title.clone(),
            content_type: request.content_type,
        };
        self.wallet.approve(&summary).await?;

        self.set_state(WorkflowState::Submitting);
        let receipt = self
            .ledger
            .register(
                &account,
                &cid,
                &request.title,
                &request.description,
                request.content_type,
            )
            .await?;

        self.set_state(WorkflowState::Confirmed);
        {
            // Both sets move together so a restart or an account switch in
            // between cannot observe the registration in only one of them.
            let mut cache = self.cache.lock().await;
            let mut known = self.known.lock().await;
            cache.add(&cid)?;
            known.insert(cid.clone());
        }

        info!(
            "Registration confirmed: {} by {} (tx {})",
            cid,
            account.abbreviated(),
            receipt.tx_hash
        );

        Ok(RegistrationOutcome { cid, receipt })
    }

    /// Ordered duplicate checks: local cache (no ledger call on a hit), the
    /// connected account's known set, then the authoritative record.
    async fn check_duplicates(&self, cid: &Cid, account: &Account) -> Result<()> {
        if self.cache.lock().await.contains(cid) {
            return Err(Error::DuplicateCid(DuplicateScope::OtherAccount));
        }

        if self.known.lock().await.contains(cid) {
            return Err(Error::DuplicateCid(DuplicateScope::SameAccount));
        }

        match self.ledger.get_content(cid).await {
            RecordQuery::Found(record) => {
                let scope = if &record.owner == account {
                    DuplicateScope::SameAccount
                } else {
                    DuplicateScope::OtherAccount
                };
                Err(Error::DuplicateCid(scope))
            }
            RecordQuery::NotFound => Ok(()),
            RecordQuery::QueryFailed(reason) => {
                // Conservative allow: a lookup that failed to decode does
                // not block submission. The ledger still rejects a true
                // duplicate at transaction time.
                warn!(
                    "Ledger lookup for {} failed ({}); proceeding as unregistered",
                    cid, reason
                );
                Ok(())
            }
        }
    }

    /// Duplicate pre-check for a selected file, before the form is ever
    /// submitted. Computes the CID (the daemon persists the bytes as a
    /// byproduct) and classifies it without submitting anything.
    pub async fn check_file(&self, bytes: Vec<u8>, name: &str) -> Result<DuplicateStatus> {
        let cid = self.identifier.compute_identifier(bytes, name).await?;
        Ok(self.cid_status(&cid).await)
    }

    /// Classify a CID against the caches and the ledger record.
    pub async fn cid_status(&self, cid: &Cid) -> DuplicateStatus {
        if self.cache.lock().await.contains(cid) {
            return DuplicateStatus::AlreadyRegisteredByOther;
        }

        if self.known.lock().await.contains(cid) {
            return DuplicateStatus::AlreadyRegisteredByYou;
        }

        match self.ledger.get_content(cid).await {
            RecordQuery::Found(record) => {
                if self.wallet.account().as_ref() == Some(&record.owner) {
                    DuplicateStatus::AlreadyRegisteredByYou
                } else {
                    DuplicateStatus::AlreadyRegisteredByOther
                }
            }
            RecordQuery::NotFound => DuplicateStatus::New,
            RecordQuery::QueryFailed(reason) => {
                warn!("Ledger lookup for {} failed ({})", cid, reason);
                DuplicateStatus::New
            }
        }
    }

    /// Rebuild the per-account known set from the ledger for the wallet's
    /// current account, or clear it on disconnect.
    pub async fn refresh_known_cids(&self) {
        match self.wallet.account() {
            Some(account) => {
                let cids = self.ledger.owned_cids(&account).await;
                debug!(
                    "Known set rebuilt for {}: {} CIDs",
                    account.abbreviated(),
                    cids.len()
                );
                self.known.lock().await.rebuild(account, cids);
            }
            None => {
                self.known.lock().await.clear();
            }
        }
    }

    /// Consume wallet account-change events, rebuilding the known set on
    /// each. The task ends when the wallet side of the channel is dropped.
    pub fn spawn_account_watcher(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let workflow = Arc::clone(self);
        let mut rx = workflow.wallet.subscribe();
        tokio::spawn(async move {
            loop {
                workflow.refresh_known_cids().await;
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// Whether the local duplicate cache holds a CID.
    pub async fn is_cached(&self, cid: &Cid) -> bool {
        self.cache.lock().await.contains(cid)
    }
}
