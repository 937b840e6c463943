//! Harvest orchestration.
//!
//! Drives one run: load the ledger, search once, then walk the candidates
//! in order (download → dedupe → save) until enough new images are saved or
//! the candidates run out. Finally the ledger is written back.
//!
//! Execution is strictly sequential. Each candidate is fully handled before
//! the next one is fetched, so ledger check-and-insert needs no locking.
//! There are no retries: a failed or duplicate candidate is dropped and the
//! over-fetched search results make up the difference.

use crate::config::Config;
use crate::download::ImageFetcher;
use crate::error::Result;
use crate::ledger::HashLedger;
use crate::models::{Candidate, CandidateOutcome, FetchOutcome, HarvestSummary, StoreOutcome};
use crate::progress::{HarvestEvent, NoProgress, ProgressReporter};
use crate::search::ImageSearch;
use crate::store::ImageStore;

static NO_PROGRESS: NoProgress = NoProgress;

/// File name prefix used by [`fetch_one`].
pub const FETCH_LABEL: &str = "fetch";

pub struct Harvester<'a> {
    config: &'a Config,
    search: &'a dyn ImageSearch,
    fetcher: &'a dyn ImageFetcher,
    progress: &'a dyn ProgressReporter,
}

impl<'a> Harvester<'a> {
    pub fn new(
        config: &'a Config,
        search: &'a dyn ImageSearch,
        fetcher: &'a dyn ImageFetcher,
    ) -> Self {
        Self {
            config,
            search,
            fetcher,
            progress: &NO_PROGRESS,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Run the full pipeline.
    ///
    /// Fatal errors (missing credential, search failure, corrupt ledger)
    /// return before the ledger file is touched. A missing credential also
    /// returns before the output directory is created.
    pub async fn run(&self) -> Result<HarvestSummary> {
        let query = &self.config.harvest.query;

        self.search.preflight()?;
        let mut ledger = HashLedger::load(&self.config.paths.ledger)?;
        let mut store = ImageStore::create(&self.config.paths.output_dir, query)?;

        let requested = self.config.search_count();
        self.progress.report(HarvestEvent::Searching {
            query: query.clone(),
            requested,
        });
        let candidates = self.search.search(query, requested).await?;
        self.progress.report(HarvestEvent::Candidates {
            found: candidates.len(),
        });

        let mut summary = HarvestSummary {
            known_before: ledger.len(),
            candidates: candidates.len(),
            ..HarvestSummary::default()
        };

        let iterated = self
            .iterate(&candidates, &mut ledger, &mut store, &mut summary)
            .await;
        // Files written before a mid-run write failure are still recorded.
        let persisted = ledger.save();
        iterated?;
        persisted?;

        self.progress.report(HarvestEvent::Done {
            saved: summary.saved,
            considered: summary.considered,
        });
        Ok(summary)
    }

    async fn iterate(
        &self,
        candidates: &[Candidate],
        ledger: &mut HashLedger,
        store: &mut ImageStore,
        summary: &mut HarvestSummary,
    ) -> Result<()> {
        let target = self.config.harvest.max_new;
        let delay = self.config.delay();
        let total = candidates.len();

        for (i, candidate) in candidates.iter().enumerate() {
            if summary.saved >= target {
                break;
            }
            summary.considered += 1;

            let outcome = match self.fetcher.fetch(&candidate.url).await {
                FetchOutcome::Skipped(reason) => {
                    summary.skipped += 1;
                    CandidateOutcome::Skipped(reason)
                }
                FetchOutcome::Fetched(asset) => {
                    let stored = store.process(ledger, &asset)?;
                    match &stored {
                        StoreOutcome::Saved(path) => {
                            summary.saved += 1;
                            summary.saved_paths.push(path.clone());
                        }
                        StoreOutcome::Duplicate => summary.duplicates += 1,
                    }
                    CandidateOutcome::from(&stored)
                }
            };

            let saved_now = matches!(outcome, CandidateOutcome::Saved(_));
            self.progress.report(HarvestEvent::Candidate {
                index: i + 1,
                total,
                url: candidate.url.clone(),
                outcome,
            });

            if saved_now && summary.saved < target && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        Ok(())
    }
}

/// Download a single URL through the same dedupe & persist path as a run.
///
/// The ledger is loaded first and saved afterwards, so a one-off fetch still
/// respects and extends the duplicate history.
pub async fn fetch_one(
    config: &Config,
    fetcher: &dyn ImageFetcher,
    url: &str,
) -> Result<CandidateOutcome> {
    let mut ledger = HashLedger::load(&config.paths.ledger)?;
    let mut store = ImageStore::create(&config.paths.output_dir, FETCH_LABEL)?;

    let outcome = match fetcher.fetch(url).await {
        FetchOutcome::Skipped(reason) => return Ok(CandidateOutcome::Skipped(reason)),
        FetchOutcome::Fetched(asset) => store.process(&mut ledger, &asset)?,
    };

    if let StoreOutcome::Saved(_) = outcome {
        ledger.save()?;
    }
    Ok(CandidateOutcome::from(&outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarvestError;
    use crate::models::{Asset, SkipReason};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FakeSearch {
        urls: Vec<&'static str>,
        requested: Mutex<Option<usize>>,
    }

    impl FakeSearch {
        fn new(urls: Vec<&'static str>) -> Self {
            Self {
                urls,
                requested: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ImageSearch for FakeSearch {
        async fn search(&self, _query: &str, count: usize) -> Result<Vec<Candidate>> {
            *self.requested.lock().unwrap() = Some(count);
            Ok(self.urls.iter().map(|u| Candidate::new(*u)).collect())
        }
    }

    struct FailingSearch;

    #[async_trait]
    impl ImageSearch for FailingSearch {
        async fn search(&self, _query: &str, _count: usize) -> Result<Vec<Candidate>> {
            Err(HarvestError::Search("503 Service Unavailable".into()))
        }
    }

    struct NoKeySearch;

    #[async_trait]
    impl ImageSearch for NoKeySearch {
        async fn search(&self, _query: &str, _count: usize) -> Result<Vec<Candidate>> {
            panic!("search must not run without a credential");
        }

        fn preflight(&self) -> Result<()> {
            Err(HarvestError::MissingCredential {
                var: "SERPER_KEY".into(),
            })
        }
    }

    /// Serves canned bytes per URL; unknown URLs are treated as 404.
    struct FakeFetcher {
        responses: HashMap<&'static str, (&'static [u8], &'static str)>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn new(responses: Vec<(&'static str, &'static [u8], &'static str)>) -> Self {
            Self {
                responses: responses
                    .into_iter()
                    .map(|(url, bytes, ct)| (url, (bytes, ct)))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ImageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> FetchOutcome {
            self.calls.lock().unwrap().push(url.to_string());
            match self.responses.get(url) {
                Some((_, ct)) if !ct.contains("image") => {
                    FetchOutcome::Skipped(SkipReason::NotImage(ct.to_string()))
                }
                Some((bytes, ct)) => FetchOutcome::Fetched(Asset {
                    bytes: bytes.to_vec(),
                    content_type: ct.to_string(),
                }),
                None => FetchOutcome::Skipped(SkipReason::Status(404)),
            }
        }
    }

    fn test_config(tmp: &TempDir, max_new: usize) -> Config {
        let mut config = Config::default();
        config.harvest.max_new = max_new;
        config.harvest.delay_ms = 0;
        config.paths.output_dir = tmp.path().join("images");
        config.paths.ledger = tmp.path().join("hashes.json");
        config
    }

    #[tokio::test]
    async fn test_duplicate_in_same_run() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp, 2);
        let search = FakeSearch::new(vec!["u1", "u2", "u3"]);
        let fetcher = FakeFetcher::new(vec![
            ("u1", &b"AAAA"[..], "image/jpeg"),
            ("u2", &b"AAAA"[..], "image/jpeg"),
            ("u3", &b"BBBB"[..], "image/png"),
        ]);

        let summary = Harvester::new(&config, &search, &fetcher).run().await.unwrap();
        assert_eq!(summary.saved, 2);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.considered, 3);
        assert_eq!(summary.saved_paths.len(), 2);
        assert!(summary.saved_paths.iter().all(|p| p.exists()));

        let ledger = HashLedger::load(&config.paths.ledger).unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains(&crate::fingerprint::fingerprint(b"AAAA")));
        assert!(ledger.contains(&crate::fingerprint::fingerprint(b"BBBB")));
    }

    #[tokio::test]
    async fn test_stops_at_target() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp, 1);
        let search = FakeSearch::new(vec!["u1", "u2"]);
        let fetcher = FakeFetcher::new(vec![
            ("u1", &b"one"[..], "image/png"),
            ("u2", &b"two"[..], "image/png"),
        ]);

        let summary = Harvester::new(&config, &search, &fetcher).run().await.unwrap();
        assert_eq!(summary.saved, 1);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(*search.requested.lock().unwrap(), Some(10));
    }

    #[tokio::test]
    async fn test_zero_target_searches_but_saves_nothing() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp, 0);
        let search = FakeSearch::new(vec!["u1"]);
        let fetcher = FakeFetcher::new(vec![("u1", &b"one"[..], "image/png")]);

        let summary = Harvester::new(&config, &search, &fetcher).run().await.unwrap();
        assert!(search.requested.lock().unwrap().is_some());
        assert_eq!(summary.saved, 0);
        assert_eq!(summary.considered, 0);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_candidates_fail() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp, 5);
        let search = FakeSearch::new(vec!["html", "missing"]);
        let fetcher = FakeFetcher::new(vec![("html", &b"<html>"[..], "text/html")]);

        let summary = Harvester::new(&config, &search, &fetcher).run().await.unwrap();
        assert_eq!(summary.saved, 0);
        assert_eq!(summary.skipped, 2);
        assert!(config.paths.ledger.exists(), "ledger is persisted even when unchanged");
        assert!(HashLedger::load(&config.paths.ledger).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_failure_leaves_ledger_untouched() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp, 5);
        let fetcher = FakeFetcher::new(vec![]);

        let err = Harvester::new(&config, &FailingSearch, &fetcher)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::Search(_)));
        assert!(!config.paths.ledger.exists());
    }

    #[tokio::test]
    async fn test_missing_credential_has_no_side_effects() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp, 5);
        let fetcher = FakeFetcher::new(vec![]);

        let err = Harvester::new(&config, &NoKeySearch, &fetcher)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::MissingCredential { .. }));
        assert!(!config.paths.output_dir.exists());
        assert!(!config.paths.ledger.exists());
    }

    #[tokio::test]
    async fn test_delay_only_between_saves() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(&tmp, 3);
        config.harvest.delay_ms = 150;
        let search = FakeSearch::new(vec!["u1", "u2", "u3", "u4"]);
        let fetcher = FakeFetcher::new(vec![
            ("u1", &b"AAAA"[..], "image/png"),
            ("u2", &b"AAAA"[..], "image/png"),
            ("u3", &b"BBBB"[..], "image/png"),
            ("u4", &b"CCCC"[..], "image/png"),
        ]);

        let started = std::time::Instant::now();
        let summary = Harvester::new(&config, &search, &fetcher).run().await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(summary.saved, 3);
        assert_eq!(summary.duplicates, 1);
        // Sleeps after the first two saves; none after the duplicate or the
        // save that reaches the target.
        assert!(elapsed >= std::time::Duration::from_millis(300), "{:?}", elapsed);
        assert!(elapsed < std::time::Duration::from_millis(450), "{:?}", elapsed);
    }

    #[tokio::test]
    async fn test_fetch_one_respects_ledger() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp, 1);
        let fetcher = FakeFetcher::new(vec![("u1", &b"one"[..], "image/webp")]);

        let first = fetch_one(&config, &fetcher, "u1").await.unwrap();
        match first {
            CandidateOutcome::Saved(path) => assert!(path.ends_with(".webp")),
            other => panic!("expected Saved, got {:?}", other),
        }
        let second = fetch_one(&config, &fetcher, "u1").await.unwrap();
        assert_eq!(second, CandidateOutcome::Duplicate);
        let missing = fetch_one(&config, &fetcher, "nope").await.unwrap();
        assert_eq!(missing, CandidateOutcome::Skipped(SkipReason::Status(404)));
    }
}
