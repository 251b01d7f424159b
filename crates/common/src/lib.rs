pub mod account;
pub mod cid;
pub mod error;
pub mod record;

pub use account::Account;
pub use cid::Cid;
pub use error::{DuplicateScope, Error, Result};
pub use record::{ContentRecord, ContentType, RecordQuery};
