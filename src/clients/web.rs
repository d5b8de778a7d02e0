use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{WebResult, WebSearchClient};
use crate::config::{RequestConfig, SearchConfig};
use crate::error::SearchError;

/// HTTP client for the Exa web document-search provider.
///
/// Fallback tier only: the arbiter calls it when the curated store was
/// insufficient, and its results are never authoritative.
#[derive(Clone)]
pub struct ExaSearchClient {
    client: Client,
    base_url: String,
    api_key: String,
    max_results: usize,
    timeout_ms: u64,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    #[serde(rename = "numResults")]
    num_results: usize,
    #[serde(rename = "type")]
    search_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<DocumentEntry>,
}

#[derive(Debug, Deserialize)]
struct DocumentEntry {
    #[serde(default)]
    title: Option<String>,
    url: String,
    #[serde(default)]
    text: Option<String>,
}

impl ExaSearchClient {
    /// Create a new web search client
    pub fn new(config: &SearchConfig, request_config: &RequestConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(SearchError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_results: config.max_results,
            timeout_ms: request_config.timeout_ms,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl WebSearchClient for ExaSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<WebResult>, SearchError> {
        let url = format!("{}/search", self.base_url);
        let body = SearchRequest {
            query,
            num_results: self.max_results,
            search_type: "auto",
        };

        debug!(query_len = query.len(), "Calling web search provider");
        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    SearchError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let search_response: SearchResponse =
            response
                .json()
                .await
                .map_err(|e| SearchError::InvalidResponse {
                    message: format!("Failed to parse response: {}", e),
                })?;

        let results: Vec<WebResult> = search_response
            .results
            .into_iter()
            .map(|d| WebResult {
                title: d.title.unwrap_or_else(|| d.url.clone()),
                url: d.url,
                snippet: d.text.unwrap_or_default(),
            })
            .collect();

        info!(
            documents = results.len(),
            latency_ms = start.elapsed().as_millis(),
            "Web search succeeded"
        );

        Ok(results)
    }
}
