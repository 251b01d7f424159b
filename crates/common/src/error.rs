use thiserror::Error;

/// Whether a duplicate CID was registered by the connected account or by
/// someone else. Both render as the same user-facing category, only the
/// message text differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateScope {
    SameAccount,
    OtherAccount,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing required field: {0}")]
    Validation(&'static str),

    #[error("Cannot reach the storage daemon: {0}")]
    StorageUnavailable(String),

    #[error("Storage daemon rejected the content: {0}")]
    ContentRejected(String),

    #[error("{}", duplicate_message(.0))]
    DuplicateCid(DuplicateScope),

    #[error("Transaction was rejected in the wallet")]
    WalletRejected,

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("A registration is already in flight")]
    Busy,

    #[error("Duplicate cache error: {0}")]
    Cache(String),

    #[error("Invalid content identifier: {0}")]
    InvalidCid(String),

    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn duplicate_message(scope: &DuplicateScope) -> &'static str {
    match scope {
        DuplicateScope::SameAccount => "You have already registered this exact file",
        DuplicateScope::OtherAccount => "This file has already been registered by another wallet",
    }
}

pub type Result<T> = std::result::Result<T, Error>;
