use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{GenerateOptions, GenerativeArtifact, GenerativeClient};
use crate::config::{GenerativeConfig, RequestConfig};
use crate::error::GenerativeError;

/// HTTP client for the image-generation tool.
///
/// Last-resort tier: only invoked when the query explicitly asks for a
/// generative artifact and both higher tiers were insufficient. A 200 response
/// without an artifact URL is an error, never an empty success.
#[derive(Clone)]
pub struct ImageGenClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_ms: u64,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageEntry>,
}

#[derive(Debug, Deserialize)]
struct ImageEntry {
    url: Option<String>,
}

impl ImageGenClient {
    /// Create a new image generation client
    pub fn new(
        config: &GenerativeConfig,
        request_config: &RequestConfig,
    ) -> Result<Self, GenerativeError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(GenerativeError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            timeout_ms: request_config.timeout_ms,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl GenerativeClient for ImageGenClient {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<GenerativeArtifact, GenerativeError> {
        let url = format!("{}/v1/images/generations", self.base_url);
        let body = ImageRequest {
            model: &self.model,
            prompt,
            size: &options.size,
            n: 1,
        };

        debug!(model = %self.model, size = %options.size, "Generating image");
        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerativeError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    GenerativeError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(GenerativeError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let image_response: ImageResponse =
            response
                .json()
                .await
                .map_err(|e| GenerativeError::InvalidResponse {
                    message: format!("Failed to parse response: {}", e),
                })?;

        let artifact_url = image_response
            .data
            .into_iter()
            .next()
            .and_then(|entry| entry.url)
            .ok_or_else(|| GenerativeError::MissingArtifact {
                message: "response contained no image URL".to_string(),
            })?;

        info!(
            latency_ms = start.elapsed().as_millis(),
            "Image generation succeeded"
        );

        Ok(GenerativeArtifact {
            artifact_url,
            prompt: prompt.to_string(),
        })
    }
}
