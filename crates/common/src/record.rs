//! Registration records as the ledger reports them

use crate::account::Account;
use crate::cid::Cid;
use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category tag supplied by the uploading user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    Document,
    Image,
    Video,
    Audio,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Document => "Document",
            ContentType::Image => "Image",
            ContentType::Video => "Video",
            ContentType::Audio => "Audio",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Document" => Ok(ContentType::Document),
            "Image" => Ok(ContentType::Image),
            "Video" => Ok(ContentType::Video),
            "Audio" => Ok(ContentType::Audio),
            other => Err(Error::InvalidContentType(other.to_string())),
        }
    }
}

/// A registered piece of content.
///
/// Created exactly once, when the ledger accepts the registration
/// transaction; `owner` and `timestamp` are assigned by the ledger and never
/// change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Content identifier, globally unique once registered
    pub cid: Cid,

    /// User-supplied title
    pub title: String,

    /// User-supplied description
    pub description: String,

    /// Category tag
    pub content_type: ContentType,

    /// Account that registered the content
    pub owner: Account,

    /// Registration time, assigned by the ledger at transaction execution
    pub timestamp: DateTime<Utc>,

    /// Distinguishes a registered record from the ledger's default record
    /// for an unknown key
    pub exists: bool,
}

impl ContentRecord {
    /// True when the ledger returned a well-formed but empty record: the
    /// presence flag is down, the owner is the zero address, or the key is
    /// blank.
    pub fn is_unregistered(&self) -> bool {
        !self.exists || self.owner.is_zero() || self.cid.as_str().is_empty()
    }
}

/// Outcome of a ledger content lookup.
///
/// `NotFound` and `QueryFailed` are collapsed only at presentation
/// boundaries; duplicate-check logic matches them separately so a decode
/// failure stays distinguishable from a genuine miss.
#[derive(Debug, Clone)]
pub enum RecordQuery {
    /// The ledger holds a record for this CID
    Found(ContentRecord),
    /// The ledger answered with its default/empty record
    NotFound,
    /// The call failed to decode or the transport failed
    QueryFailed(String),
}

impl RecordQuery {
    pub fn is_found(&self) -> bool {
        matches!(self, RecordQuery::Found(_))
    }
}
