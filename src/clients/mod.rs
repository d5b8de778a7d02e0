//! Tool client boundaries.
//!
//! The arbiter only ever sees these traits; the HTTP implementations
//! ([`VectorStoreClient`], [`ExaSearchClient`], [`ImageGenClient`]) are
//! swappable. Each client is an independent network operation with its own
//! timeout; a failed or timed-out call is absorbed by the arbiter as an
//! insufficient tier, never a fatal error.

mod generative;
mod retrieval;
mod web;

pub use generative::ImageGenClient;
pub use retrieval::VectorStoreClient;
pub use web::ExaSearchClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{GenerativeError, RetrievalError, SearchError};

/// A ranked match from the curated knowledge store.
///
/// Results are ordered by descending similarity score. A match is sufficient
/// when its score clears the configured threshold (or, in loose mode, when it
/// carries any non-trivial text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// The curated entry text.
    pub text: String,
    /// Identifier of the curated source entry.
    pub source_id: String,
    /// Similarity score in `[0, 1]`.
    pub similarity_score: f64,
    /// Optional media URL attached to the entry.
    pub media_ref: Option<String>,
}

/// A ranked document from the web search provider.
///
/// Carries no score; sufficiency is judged qualitatively by topical match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    /// Document title.
    pub title: String,
    /// Document URL.
    pub url: String,
    /// Snippet of the document text.
    pub snippet: String,
}

/// An artifact produced by the generative tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerativeArtifact {
    /// URL of the produced artifact.
    pub artifact_url: String,
    /// The prompt that produced it.
    pub prompt: String,
}

/// Options for a generative tool invocation.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Image size, e.g. `1024x1024`.
    pub size: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            size: "1024x1024".to_string(),
        }
    }
}

/// Boundary to the curated vector knowledge store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RetrievalClient: Send + Sync {
    /// Search the store, returning matches ordered by descending score.
    async fn search(&self, query: &str) -> Result<Vec<RetrievalResult>, RetrievalError>;
}

/// Boundary to the external web document-search provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebSearchClient: Send + Sync {
    /// Search the web, returning ranked documents.
    async fn search(&self, query: &str) -> Result<Vec<WebResult>, SearchError>;
}

/// Boundary to the general-purpose generative tool.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Generate an artifact for the prompt.
    ///
    /// Must fail with a described error when no artifact is produced; a
    /// response with a missing artifact reference is never a success.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<GenerativeArtifact, GenerativeError>;
}
