//! Fatal error taxonomy.
//!
//! Only conditions that abort a whole run live here. Per-candidate problems
//! (timeouts, bad status codes, non-image responses) are reported as
//! [`SkipReason`](crate::models::SkipReason) values instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("API credential not set: export {var}=<your key>")]
    MissingCredential { var: String },

    #[error("hash ledger at {} is corrupt: {reason}", path.display())]
    LedgerCorrupt { path: PathBuf, reason: String },

    #[error("hash ledger at {} could not be accessed: {source}", path.display())]
    LedgerIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("search failed: {0}")]
    Search(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
