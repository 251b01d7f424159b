use serde::{Deserialize, Serialize};
use std::fmt;

/// The all-zero address the ledger reports as the owner of a record that was
/// never registered.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// A wallet account address, kept as the checksummed text form the wallet
/// provider hands out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(String);

impl Account {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the ledger's default owner, meaning "no one".
    pub fn is_zero(&self) -> bool {
        self.0.eq_ignore_ascii_case(ZERO_ADDRESS)
    }

    /// Short display form, `0x1234...abcd`.
    pub fn abbreviated(&self) -> String {
        if self.0.len() <= 10 {
            return self.0.clone();
        }
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
