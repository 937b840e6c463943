//! Core data types that flow through the harvest pipeline.
//!
//! A [`Candidate`] comes out of the search stage, becomes an [`Asset`] once
//! downloaded, and ends as a [`StoreOutcome`] after deduplication.

use std::fmt;
use std::path::PathBuf;

/// A URL returned by the search stage, not yet verified as a usable image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
}

impl Candidate {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Raw bytes of a downloaded image plus the `Content-Type` the host declared.
#[derive(Debug, Clone)]
pub struct Asset {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// SHA-256 digest of an asset's bytes, as 64 lowercase hex characters.
///
/// This is the only deduplication key: URLs and file names play no part in
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already-computed hex digest, rejecting anything that is not
    /// exactly 64 lowercase hex characters.
    pub fn parse(hex_digest: &str) -> Option<Self> {
        let valid = hex_digest.len() == 64
            && hex_digest
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(hex_digest.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading `len` characters, used in file names.
    pub fn prefix(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    pub(crate) fn from_hex_unchecked(hex_digest: String) -> Self {
        Self(hex_digest)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a candidate was abandoned without producing an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Timeout, connection failure, or body read error.
    Network(String),
    /// Non-2xx response.
    Status(u16),
    /// Response declared a content type that is not an image.
    NotImage(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Network(msg) => write!(f, "network error: {}", msg),
            SkipReason::Status(code) => write!(f, "HTTP status {}", code),
            SkipReason::NotImage(ct) if ct.is_empty() => f.write_str("no content type"),
            SkipReason::NotImage(ct) => write!(f, "not an image ({})", ct),
        }
    }
}

/// Result of the download stage for one candidate.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Fetched(Asset),
    Skipped(SkipReason),
}

/// Result of the dedupe & persist stage for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    Saved(PathBuf),
    Duplicate,
}

/// What happened to a single candidate, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    Saved(String),
    Duplicate,
    Skipped(SkipReason),
}

impl From<&StoreOutcome> for CandidateOutcome {
    fn from(outcome: &StoreOutcome) -> Self {
        match outcome {
            StoreOutcome::Saved(path) => CandidateOutcome::Saved(path.display().to_string()),
            StoreOutcome::Duplicate => CandidateOutcome::Duplicate,
        }
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Fingerprints in the ledger before the run started.
    pub known_before: usize,
    /// Candidate URLs the search stage returned.
    pub candidates: usize,
    /// Candidates actually attempted before the run stopped.
    pub considered: usize,
    pub saved: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub saved_paths: Vec<PathBuf>,
}
