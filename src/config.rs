use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{HarvestError, Result};

/// Serper caps a single images request at 100 results.
pub const MAX_SEARCH_RESULTS: usize = 100;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct HarvestConfig {
    #[serde(default = "default_query")]
    pub query: String,
    /// Number of new, non-duplicate images to save per run.
    #[serde(default = "default_max_new")]
    pub max_new: usize,
    /// Pause after each saved image.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Search asks for `max_new * overfetch` results to absorb attrition.
    #[serde(default = "default_overfetch")]
    pub overfetch: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            query: default_query(),
            max_new: default_max_new(),
            delay_ms: default_delay_ms(),
            overfetch: default_overfetch(),
        }
    }
}

fn default_query() -> String {
    "cats".to_string()
}
fn default_max_new() -> usize {
    10
}
fn default_delay_ms() -> u64 {
    250
}
fn default_overfetch() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_ledger")]
    pub ledger: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            ledger: default_ledger(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("images")
}
fn default_ledger() -> PathBuf {
    PathBuf::from("hashes.json")
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://google.serper.dev/images".to_string()
}
fn default_api_key_env() -> String {
    "SERPER_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    20
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DownloadConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Some image hosts refuse requests without a browser-like agent.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

impl Config {
    /// Number of search results to request for the configured target.
    ///
    /// A target of zero still sizes the request as if one image were wanted,
    /// so the search stage is exercised.
    pub fn search_count(&self) -> usize {
        self.harvest
            .max_new
            .max(1)
            .saturating_mul(self.harvest.overfetch)
            .clamp(1, MAX_SEARCH_RESULTS)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.harvest.delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.harvest.overfetch == 0 {
            return Err(HarvestError::Config("harvest.overfetch must be >= 1".into()));
        }
        if self.search.endpoint.trim().is_empty() {
            return Err(HarvestError::Config("search.endpoint must not be empty".into()));
        }
        if self.search.api_key_env.trim().is_empty() {
            return Err(HarvestError::Config(
                "search.api_key_env must name an environment variable".into(),
            ));
        }
        if self.search.timeout_secs == 0 {
            return Err(HarvestError::Config("search.timeout_secs must be > 0".into()));
        }
        if self.download.timeout_secs == 0 {
            return Err(HarvestError::Config("download.timeout_secs must be > 0".into()));
        }
        Ok(())
    }
}

/// Load configuration from `path`.
///
/// A missing file yields the defaults. A file that exists but does not parse
/// or validate is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => {
            return Err(HarvestError::Config(format!(
                "failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)
        .map_err(|e| HarvestError::Config(format!("failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}
