//! Persistent hash ledger.
//!
//! The ledger is the durable record of every fingerprint ever saved. It is
//! stored as a pretty-printed, sorted JSON array of hex strings:
//!
//! ```json
//! [
//!   "0b1f…",
//!   "e3b0…"
//! ]
//! ```
//!
//! A missing file means "nothing saved yet". A file that exists but cannot be
//! parsed is fatal: resetting it silently would let duplicates through.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{HarvestError, Result};
use crate::models::Fingerprint;

#[derive(Debug, Clone)]
pub struct HashLedger {
    path: PathBuf,
    hashes: HashSet<Fingerprint>,
}

impl HashLedger {
    /// An empty ledger that will be saved to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            hashes: HashSet::new(),
        }
    }

    /// Read the ledger at `path`, or start empty if the file does not exist.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::empty(path)),
            Err(source) => return Err(HarvestError::LedgerIo { path, source }),
        };

        let entries: Vec<String> =
            serde_json::from_str(&content).map_err(|e| HarvestError::LedgerCorrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let mut hashes = HashSet::with_capacity(entries.len());
        for entry in entries {
            let fp = Fingerprint::parse(&entry).ok_or_else(|| HarvestError::LedgerCorrupt {
                path: path.clone(),
                reason: format!("'{}' is not a SHA-256 hex digest", entry),
            })?;
            hashes.insert(fp);
        }

        Ok(Self { path, hashes })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, fp: &Fingerprint) -> bool {
        self.hashes.contains(fp)
    }

    /// Insert a fingerprint. Returns `false` if it was already present.
    pub fn add(&mut self, fp: Fingerprint) -> bool {
        self.hashes.insert(fp)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Fingerprints in sorted order, as they are written to disk.
    pub fn sorted(&self) -> Vec<&Fingerprint> {
        let mut all: Vec<&Fingerprint> = self.hashes.iter().collect();
        all.sort();
        all
    }

    /// Overwrite the ledger file with the full set.
    ///
    /// Writes to a sibling temp file first and renames it into place, so an
    /// interrupted save leaves the previous ledger intact.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| HarvestError::LedgerIo {
                path: self.path.clone(),
                source,
            })?;
        }

        let entries: Vec<&str> = self.sorted().into_iter().map(|fp| fp.as_str()).collect();
        let io_err = |source: std::io::Error| HarvestError::LedgerIo {
            path: self.path.clone(),
            source,
        };
        let mut json = serde_json::to_string_pretty(&entries)
            .map_err(|e| io_err(std::io::Error::from(e)))?;
        json.push('\n');

        let tmp = self.tmp_path();
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
