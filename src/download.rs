//! Download stage: fetch bytes for one candidate URL.
//!
//! Failures here never abort a run. Timeouts, connection errors, non-2xx
//! statuses and non-image responses all become
//! [`FetchOutcome::Skipped`] so the orchestrator can move on.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::DownloadConfig;
use crate::error::Result;
use crate::models::{Asset, FetchOutcome, SkipReason};

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Skipped(SkipReason::Network(e.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::Skipped(SkipReason::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_image_content_type(&content_type) {
            return FetchOutcome::Skipped(SkipReason::NotImage(content_type));
        }

        match response.bytes().await {
            Ok(bytes) => FetchOutcome::Fetched(Asset {
                bytes: bytes.to_vec(),
                content_type,
            }),
            Err(e) => FetchOutcome::Skipped(SkipReason::Network(e.to_string())),
        }
    }
}

/// Loose check: any declared type mentioning `image`.
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("image")
}
