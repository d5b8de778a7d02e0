use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Curated vector store settings
    pub retrieval: RetrievalConfig,
    /// Web search provider settings
    pub search: SearchConfig,
    /// Generative tool settings
    pub generative: GenerativeConfig,
    /// Database settings
    pub database: DatabaseConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// HTTP request settings
    pub request: RequestConfig,
    /// Tool arbitration policy settings
    pub policy: PolicyConfig,
}

/// Curated vector knowledge store configuration
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// API key for the vector store
    pub api_key: String,
    /// Base URL for the vector store API
    pub base_url: String,
    /// Number of ranked matches to request per query.
    pub top_k: usize,
    /// Base URL used to resolve a curated source id into a citable URL.
    pub catalog_base_url: String,
}

/// Web search provider configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// API key for the search provider
    pub api_key: String,
    /// Base URL for the search API
    pub base_url: String,
    /// Number of documents to request per search
    pub max_results: usize,
}

/// Generative tool (image generation) configuration
#[derive(Debug, Clone)]
pub struct GenerativeConfig {
    /// API key for the generative provider
    pub api_key: String,
    /// Base URL for the generative API
    pub base_url: String,
    /// Image model identifier
    pub model: String,
    /// Requested image dimensions, e.g. "1024x1024"
    pub image_size: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
    /// Maximum pool connections
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug")
    pub level: String,
    /// Log output format
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// Human-readable output
    Pretty,
    /// Structured JSON output
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum retry attempts for retryable failures
    pub max_retries: u32,
    /// Base delay between retries, doubled per attempt
    pub retry_delay_ms: u64,
}

/// Tool arbitration policy configuration.
///
/// The sufficiency policy is exclusive: strict score-threshold mode by
/// default, or the loose "any non-trivial match" mode when
/// `accept_weak_matches` is set. Never both.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Minimum similarity score for a curated match to count as sufficient.
    pub sufficiency_threshold: f64,
    /// Loose mode: any non-trivial curated match halts the fallback chain.
    pub accept_weak_matches: bool,
    /// Rewrite queries into hypothetical-answer form before vector search.
    pub expand_queries: bool,
    /// Minimum text length for a match to be non-trivial in loose mode.
    pub min_result_chars: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let retrieval = RetrievalConfig {
            api_key: env::var("VECTOR_STORE_API_KEY").map_err(|_| AppError::Config {
                message: "VECTOR_STORE_API_KEY is required".to_string(),
            })?,
            base_url: env::var("VECTOR_STORE_BASE_URL")
                .unwrap_or_else(|_| "https://api.pinecone.io".to_string()),
            top_k: env::var("VECTOR_STORE_TOP_K")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            catalog_base_url: env::var("CATALOG_BASE_URL")
                .unwrap_or_else(|_| "https://catalog.aurelian.travel/entries".to_string()),
        };

        let search = SearchConfig {
            api_key: env::var("EXA_API_KEY").map_err(|_| AppError::Config {
                message: "EXA_API_KEY is required".to_string(),
            })?,
            base_url: env::var("EXA_BASE_URL").unwrap_or_else(|_| "https://api.exa.ai".to_string()),
            max_results: env::var("SEARCH_MAX_RESULTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        };

        let generative = GenerativeConfig {
            api_key: env::var("OPENAI_API_KEY").map_err(|_| AppError::Config {
                message: "OPENAI_API_KEY is required".to_string(),
            })?,
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            model: env::var("IMAGE_MODEL").unwrap_or_else(|_| "gpt-image-1".to_string()),
            image_size: env::var("IMAGE_SIZE").unwrap_or_else(|_| "1024x1024".to_string()),
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/concierge.db".to_string()),
            ),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30000),
            max_retries: env::var("MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            retry_delay_ms: env::var("RETRY_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
        };

        let policy = PolicyConfig {
            sufficiency_threshold: env::var("SUFFICIENCY_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.70),
            accept_weak_matches: env::var("ACCEPT_WEAK_MATCHES")
                .ok()
                .map(|s| s == "true" || s == "1")
                .unwrap_or(false),
            expand_queries: env::var("EXPAND_QUERIES")
                .ok()
                .map(|s| s == "true" || s == "1")
                .unwrap_or(true),
            min_result_chars: env::var("MIN_RESULT_CHARS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
        };

        Ok(Config {
            retrieval,
            search,
            generative,
            database,
            logging,
            request,
            policy,
        })
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            sufficiency_threshold: 0.70,
            accept_weak_matches: false,
            expand_queries: true,
            min_result_chars: 20,
        }
    }
}
