//! Dedupe & persist stage.
//!
//! Fingerprints each downloaded asset, drops anything the ledger already
//! knows, and writes the rest to the output directory as
//! `{query}_{index:03}_{fingerprint[..10]}.{ext}`.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fingerprint::fingerprint;
use crate::ledger::HashLedger;
use crate::models::{Asset, StoreOutcome};

/// Length of the fingerprint prefix embedded in file names.
const NAME_HASH_LEN: usize = 10;

pub struct ImageStore {
    output_dir: PathBuf,
    label: String,
    saved: usize,
}

impl ImageStore {
    /// Create the output directory if needed. `query` becomes the file name
    /// prefix after [`slugify`].
    pub fn create(output_dir: impl Into<PathBuf>, query: &str) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            label: slugify(query),
            saved: 0,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Number of files written through this store.
    pub fn saved(&self) -> usize {
        self.saved
    }

    /// Save `asset` unless its fingerprint is already in `ledger`.
    ///
    /// The fingerprint is only registered after the file is on disk.
    pub fn process(&mut self, ledger: &mut HashLedger, asset: &Asset) -> Result<StoreOutcome> {
        let fp = fingerprint(&asset.bytes);
        if ledger.contains(&fp) {
            return Ok(StoreOutcome::Duplicate);
        }

        let filename = format!(
            "{}_{:03}_{}.{}",
            self.label,
            self.saved,
            fp.prefix(NAME_HASH_LEN),
            extension_for(&asset.content_type)
        );
        let path = self.output_dir.join(filename);
        std::fs::write(&path, &asset.bytes)?;

        ledger.add(fp);
        self.saved += 1;
        Ok(StoreOutcome::Saved(path))
    }
}

/// Best-effort extension from a `Content-Type` value; `bin` when unknown.
pub fn extension_for(content_type: &str) -> &'static str {
    let ct = content_type.to_ascii_lowercase();
    if ct.contains("jpeg") || ct.contains("jpg") {
        "jpg"
    } else if ct.contains("png") {
        "png"
    } else if ct.contains("webp") {
        "webp"
    } else if ct.contains("gif") {
        "gif"
    } else {
        "bin"
    }
}

/// Make a query safe to use as a file name prefix.
pub fn slugify(query: &str) -> String {
    let slug: String = query
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if slug.is_empty() {
        "image".to_string()
    } else {
        slug
    }
}
