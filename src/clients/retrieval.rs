use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::{RetrievalClient, RetrievalResult};
use crate::config::{RequestConfig, RetrievalConfig};
use crate::error::RetrievalError;

/// HTTP client for the curated vector knowledge store.
///
/// Posts a natural-language query to the store's query endpoint and maps the
/// ranked matches into [`RetrievalResult`]s. The store computes embeddings
/// server-side; index construction and ingestion are not this client's
/// concern.
#[derive(Clone)]
pub struct VectorStoreClient {
    client: Client,
    base_url: String,
    api_key: String,
    top_k: usize,
    request_config: RequestConfig,
}

/// Query request body for the vector store.
#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    #[serde(rename = "topK")]
    top_k: usize,
}

/// Query response body from the vector store.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    matches: Vec<MatchEntry>,
}

#[derive(Debug, Deserialize)]
struct MatchEntry {
    id: String,
    score: f64,
    #[serde(default)]
    metadata: MatchMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct MatchMetadata {
    #[serde(default)]
    text: String,
    #[serde(rename = "sourceId")]
    source_id: Option<String>,
    #[serde(rename = "mediaUrl")]
    media_url: Option<String>,
}

impl VectorStoreClient {
    /// Create a new vector store client
    pub fn new(config: &RetrievalConfig, request_config: RequestConfig) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(RetrievalError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            top_k: config.top_k,
            request_config,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a single query request (internal)
    async fn execute_query(&self, url: &str, query: &str) -> Result<Vec<RetrievalResult>, RetrievalError> {
        debug!(query_len = query.len(), top_k = self.top_k, "Querying vector store");

        let body = QueryRequest {
            query,
            top_k: self.top_k,
        };

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RetrievalError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    RetrievalError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let query_response: QueryResponse =
            response
                .json()
                .await
                .map_err(|e| RetrievalError::InvalidResponse {
                    message: format!("Failed to parse response: {}", e),
                })?;

        let mut results: Vec<RetrievalResult> = query_response
            .matches
            .into_iter()
            .map(|m| RetrievalResult {
                text: m.metadata.text,
                source_id: m.metadata.source_id.unwrap_or(m.id),
                similarity_score: m.score,
                media_ref: m.metadata.media_url,
            })
            .collect();

        // The store is expected to rank matches, but the descending-score
        // ordering is an invariant downstream code relies on.
        results.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(results)
    }
}

#[async_trait]
impl RetrievalClient for VectorStoreClient {
    async fn search(&self, query: &str) -> Result<Vec<RetrievalResult>, RetrievalError> {
        let url = format!("{}/query", self.base_url);

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.request_config.max_retries {
            if retries > 0 {
                let delay = Duration::from_millis(
                    self.request_config.retry_delay_ms * (2_u64.pow(retries - 1)),
                );
                warn!(
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying vector store query"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute_query(&url, query).await {
                Ok(results) => {
                    let latency = start.elapsed();
                    info!(
                        matches = results.len(),
                        latency_ms = latency.as_millis(),
                        "Vector store query succeeded"
                    );
                    return Ok(results);
                }
                Err(e) => {
                    let latency = start.elapsed();
                    error!(
                        error = %e,
                        latency_ms = latency.as_millis(),
                        retry = retries,
                        "Vector store query failed"
                    );
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(RetrievalError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries,
        })
    }
}
