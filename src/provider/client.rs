use std::env;
use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::types::{ScrapeData, ScrapeRequest, ScrapeResponse, SearchRequest, SearchResponse};
use crate::config::ConfigError;
use crate::websearch::CandidatePage;

const API_BASE: &str = "https://api.firecrawl.dev/v1";
const SCRAPE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider responded with status {0}")]
    Status(u16),

    #[error("malformed provider response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// External search/scrape service.
/// Implemented by `FirecrawlClient` for production; mock implementations used in tests.
pub trait SearchProvider {
    fn search(
        &self,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<Vec<CandidatePage>, ProviderError>> + Send;

    fn scrape(
        &self,
        request: &ScrapeRequest,
    ) -> impl Future<Output = Result<ScrapeData, ProviderError>> + Send;
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, Clone)]
pub struct FirecrawlClient {
    http: Client,
    api_key: ApiKey,
    base_url: String,
}

impl FirecrawlClient {
    /// Reads `FIRECRAWL_API_KEY` (required) and `FIRECRAWL_BASE_URL`.
    pub fn from_env(http: Client) -> Result<Self, ConfigError> {
        let api_key = env::var("FIRECRAWL_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingVar("FIRECRAWL_API_KEY"))?;
        let base_url = env::var("FIRECRAWL_BASE_URL")
            .ok()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| API_BASE.to_string());
        Ok(Self {
            http,
            api_key: ApiKey(api_key),
            base_url,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey("test-key".to_string()),
            base_url: base_url.to_string(),
        }
    }

    /// POSTs `body` and decodes a 2xx JSON response. Error bodies are not parsed.
    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{endpoint}", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key.0)
            .header("User-Agent", crate::USER_AGENT)
            .json(body)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint, status = %status, "provider request failed");
            return Err(ProviderError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl SearchProvider for FirecrawlClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<CandidatePage>, ProviderError> {
        let timeout = Duration::from_millis(request.timeout);
        let body: SearchResponse = self.post_json("search", request, timeout).await?;
        debug!(query = %request.query, results = body.data.len(), "search complete");
        Ok(body.data)
    }

    async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeData, ProviderError> {
        let body: ScrapeResponse = self.post_json("scrape", request, SCRAPE_TIMEOUT).await?;
        debug!(url = %request.url, "scrape complete");
        Ok(body.data)
    }
}
