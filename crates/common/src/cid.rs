use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A content identifier as produced by the storage daemon.
///
/// The CID is the registration key: the ledger enforces that at most one
/// record ever exists for a given CID. The gateway treats it as an opaque
/// non-empty token and never re-derives it locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cid(String);

impl Cid {
    /// Create a CID from a string produced by the storage daemon.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        if s.is_empty() {
            return Err(Error::InvalidCid("empty identifier".to_string()));
        }
        if s.chars().any(|c| c.is_whitespace()) {
            return Err(Error::InvalidCid(format!("contains whitespace: {:?}", s)));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Cid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
