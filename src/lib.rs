//! # Image Harvest
//!
//! Search-driven image downloader with content-hash deduplication.
//!
//! A run asks an image search API (Serper) for candidate URLs, downloads
//! them one at a time, fingerprints the bytes with SHA-256, and saves only
//! content it has never saved before. The set of saved fingerprints is kept
//! in a JSON ledger so duplicates are skipped across runs too.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────────┐   ┌──────────┐
//! │  Search  │──▶│ Download │──▶│ Dedupe+Store │──▶│  images/ │
//! │ (Serper) │   │  (HTTP)  │   │  (SHA-256)   │   └──────────┘
//! └──────────┘   └──────────┘   └──────┬───────┘
//!                                      ▼
//!                               ┌──────────────┐
//!                               │ hashes.json  │
//!                               └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export SERPER_KEY=...
//! harvest run --query "red pandas" --max-new 5
//! harvest search cats --num 20
//! harvest fetch https://example.com/cat.jpg
//! harvest ledger
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`fingerprint`] | Content fingerprints |
//! | [`ledger`] | Persistent fingerprint ledger |
//! | [`credentials`] | API key providers |
//! | [`search`] | Search stage |
//! | [`download`] | Download stage |
//! | [`store`] | Dedupe & persist stage |
//! | [`harvest`] | Run orchestration |
//! | [`progress`] | Progress reporting |
//! | [`error`] | Fatal error types |

pub mod config;
pub mod credentials;
pub mod download;
pub mod error;
pub mod fingerprint;
pub mod harvest;
pub mod ledger;
pub mod models;
pub mod progress;
pub mod search;
pub mod store;
