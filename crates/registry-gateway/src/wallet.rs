//! Wallet provider seam
//!
//! Account enumeration, account-change notifications, and transaction
//! approval. Account changes arrive as discrete messages over a watch
//! channel; dropping the receiver is the deregistration.

use async_trait::async_trait;
use provenance_common::{Account, Cid, ContentType, Error, Result};
use tokio::sync::watch;
use tracing::info;

/// What the wallet shows the user before signing
#[derive(Debug, Clone)]
pub struct TxSummary {
    pub account: Account,
    pub cid: Cid,
    pub title: String,
    pub content_type: ContentType,
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Currently connected account, if any
    fn account(&self) -> Option<Account>;

    /// Ask the wallet to approve the registration transaction.
    ///
    /// `Err(WalletRejected)` when the user declines; the caller keeps its
    /// form state in that case.
    async fn approve(&self, summary: &TxSummary) -> Result<()>;

    /// Subscribe to account changes. The current account is the channel's
    /// initial value.
    fn subscribe(&self) -> watch::Receiver<Option<Account>>;
}

/// Headless wallet for gateway deployments: a single operator account from
/// configuration, approving every transaction it is asked to sign.
pub struct ConfiguredWallet {
    tx: watch::Sender<Option<Account>>,
}

impl ConfiguredWallet {
    pub fn new(account: Option<Account>) -> Self {
        let (tx, _) = watch::channel(account);
        Self { tx }
    }

    /// Switch the connected account, notifying subscribers.
    pub fn connect(&self, account: Account) {
        info!("Wallet account connected: {}", account.abbreviated());
        self.tx.send_replace(Some(account));
    }

    /// Disconnect the current account, notifying subscribers.
    pub fn disconnect(&self) {
        info!("Wallet account disconnected");
        self.tx.send_replace(None);
    }
}

#[async_trait]
impl WalletProvider for ConfiguredWallet {
    fn account(&self) -> Option<Account> {
        self.tx.borrow().clone()
    }

    async fn approve(&self, summary: &TxSummary) -> Result<()> {
        if self.account().as_ref() != Some(&summary.account) {
            return Err(Error::WalletRejected);
        }
        info!(
            "Approving registration of {} ({}) for {}",
            summary.cid,
            summary.content_type,
            summary.account.abbreviated()
        );
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Account>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_notifies_subscribers() {
        let wallet = ConfiguredWallet::new(None);
        let mut rx = wallet.subscribe();
        assert!(rx.borrow_and_update().is_none());

        wallet.connect(Account::new("0xabc0000000000000000000000000000000000001"));
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow().as_ref().map(|a| a.as_str().to_string()),
            Some("0xabc0000000000000000000000000000000000001".to_string())
        );
    }

    #[tokio::test]
    async fn test_approve_requires_matching_account() {
        let account = Account::new("0xabc0000000000000000000000000000000000001");
        let wallet = ConfiguredWallet::new(Some(account.clone()));

        let summary = TxSummary {
            account: account.clone(),
            cid: Cid::new("Qm123").unwrap(),
            title: "Photo".to_string(),
            content_type: ContentType::Image,
        };
        assert!(wallet.approve(&summary).await.is_ok());

        wallet.disconnect();
        assert!(matches!(
            wallet.approve(&summary).await,
            Err(Error::WalletRejected)
        ));
    }
}
