//! Harvest progress reporting.
//!
//! Reports what happens to each candidate during `harvest run` so users can
//! see saves, duplicates and skips as they happen. Progress is emitted on
//! **stderr** so stdout stays parseable for scripts.

use std::io::Write;

use crate::models::CandidateOutcome;

/// A single progress event.
#[derive(Clone, Debug)]
pub enum HarvestEvent {
    /// About to call the search API.
    Searching { query: String, requested: usize },
    /// Search returned this many candidates.
    Candidates { found: usize },
    /// Candidate `index` (1-based) out of `total` has been handled.
    Candidate {
        index: usize,
        total: usize,
        url: String,
        outcome: CandidateOutcome,
    },
    /// Iteration finished.
    Done { saved: usize, considered: usize },
}

/// Reports harvest progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: HarvestEvent);
}

/// Human-friendly progress on stderr: "[3/40] saved images/cats_001_ab12cd34ef.jpg".
pub struct HumanProgress;

impl ProgressReporter for HumanProgress {
    fn report(&self, event: HarvestEvent) {
        let line = match &event {
            HarvestEvent::Searching { query, requested } => {
                format!("searching '{}' (up to {} results)...\n", query, requested)
            }
            HarvestEvent::Candidates { found } => format!("found {} candidate URLs\n", found),
            HarvestEvent::Candidate {
                index,
                total,
                url,
                outcome,
            } => match outcome {
                CandidateOutcome::Saved(path) => format!("[{}/{}] saved {}\n", index, total, path),
                CandidateOutcome::Duplicate => {
                    format!("[{}/{}] duplicate {}\n", index, total, url)
                }
                CandidateOutcome::Skipped(reason) => {
                    format!("[{}/{}] skipped {} ({})\n", index, total, url, reason)
                }
            },
            HarvestEvent::Done { saved, considered } => {
                format!("done: {} saved from {} considered\n", saved, considered)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: HarvestEvent) {
        let line = event_json(&event);
        if let Ok(line) = serde_json::to_string(&line) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

fn event_json(event: &HarvestEvent) -> serde_json::Value {
    match event {
        HarvestEvent::Searching { query, requested } => serde_json::json!({
            "event": "searching",
            "query": query,
            "requested": requested
        }),
        HarvestEvent::Candidates { found } => serde_json::json!({
            "event": "candidates",
            "found": found
        }),
        HarvestEvent::Candidate {
            index,
            total,
            url,
            outcome,
        } => {
            let mut obj = serde_json::json!({
                "event": "candidate",
                "index": index,
                "total": total,
                "url": url,
            });
            match outcome {
                CandidateOutcome::Saved(path) => {
                    obj["outcome"] = "saved".into();
                    obj["path"] = path.as_str().into();
                }
                CandidateOutcome::Duplicate => obj["outcome"] = "duplicate".into(),
                CandidateOutcome::Skipped(reason) => {
                    obj["outcome"] = "skipped".into();
                    obj["reason"] = reason.to_string().into();
                }
            }
            obj
        }
        HarvestEvent::Done { saved, considered } => serde_json::json!({
            "event": "done",
            "saved": saved,
            "considered": considered
        }),
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: HarvestEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(HumanProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
