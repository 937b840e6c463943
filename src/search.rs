//! Search stage: turn a text query into candidate image URLs.
//!
//! [`SerperSearch`] posts `{"q": query, "num": count}` to the Serper images
//! endpoint and collects each result's `imageUrl`. Candidates are returned
//! in API order with no filtering; downloads and dedup happen later.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::credentials::CredentialProvider;
use crate::error::{HarvestError, Result};
use crate::models::Candidate;

#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Return up to `count` candidate URLs for `query`.
    ///
    /// Any error here is fatal to the run.
    async fn search(&self, query: &str, count: usize) -> Result<Vec<Candidate>>;

    /// Fail fast on configuration problems, before a run touches the
    /// filesystem or the network.
    fn preflight(&self) -> Result<()> {
        Ok(())
    }
}

pub struct SerperSearch {
    client: reqwest::Client,
    endpoint: String,
    credentials: Box<dyn CredentialProvider>,
}

impl SerperSearch {
    pub fn new(config: &SearchConfig, credentials: Box<dyn CredentialProvider>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            credentials,
        })
    }
}

#[async_trait]
impl ImageSearch for SerperSearch {
    fn preflight(&self) -> Result<()> {
        self.credentials.api_key().map(|_| ())
    }

    async fn search(&self, query: &str, count: usize) -> Result<Vec<Candidate>> {
        // Checked before any request goes out.
        let api_key = self.credentials.api_key()?;

        let body = serde_json::json!({
            "q": query,
            "num": count,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                HarvestError::Search(format!("request to {} failed: {}", self.endpoint, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(HarvestError::Search(format!(
                "{} returned {}: {}",
                self.endpoint, status, body_text
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| HarvestError::Search(format!("failed to read response: {}", e)))?;
        parse_images_response(&text)
    }
}

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    images: Vec<ImageEntry>,
}

#[derive(Deserialize)]
struct ImageEntry {
    #[serde(rename = "imageUrl", default)]
    image_url: Option<String>,
}

/// Extract `images[].imageUrl` from a Serper response body.
///
/// A missing `images` array yields no candidates. Entries without a URL are
/// skipped.
pub fn parse_images_response(body: &str) -> Result<Vec<Candidate>> {
    let parsed: ImagesResponse = serde_json::from_str(body)
        .map_err(|e| HarvestError::Search(format!("invalid response body: {}", e)))?;

    Ok(parsed
        .images
        .into_iter()
        .filter_map(|entry| entry.image_url)
        .filter(|url| !url.trim().is_empty())
        .map(Candidate::new)
        .collect())
}
