//! # Aurelian Concierge
//!
//! Retrieval-first tool orchestration core for a quiet-luxury travel and
//! lifestyle concierge agent.
//!
//! ## Features
//!
//! - **Intent Classification**: Per-turn routing; meta, conceptual, and
//!   casual turns never invoke a tool
//! - **Tiered Arbitration**: Curated vector retrieval → web search →
//!   generative tools, as an explicit ordered tier list with early exit
//! - **Curated-Source-Wins**: Retrieval outcomes are authoritative and can
//!   never be overridden by a lower tier
//! - **Citation Discipline**: Every externally sourced claim carries an
//!   inline `[n](url)` citation; bare labels are rejected before delivery
//! - **Session State Machine**: `ready → submitted → streaming →
//!   (ready | error)` with an append-only turn-part log and keep-partial
//!   cancellation
//! - **Lossless Persistence**: The whole session round-trips through SQLite
//!   after every mutation; corrupt stores load as empty sessions
//!
//! ## Architecture
//!
//! ```text
//! Submission Surface → Engine → Arbiter → Retrieval / Web / Generative (HTTP)
//!                         ↓         ↓
//!                     Composer   SQLite (session)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use aurelian_concierge::{Arbiter, Composer, ConciergeEngine, Config};
//! use aurelian_concierge::clients::{ExaSearchClient, ImageGenClient, VectorStoreClient};
//! use aurelian_concierge::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let storage = Arc::new(SqliteStorage::new(&config.database).await?);
//!     let arbiter = Arbiter::new(
//!         Arc::new(VectorStoreClient::new(&config.retrieval, config.request.clone())?),
//!         Arc::new(ExaSearchClient::new(&config.search, &config.request)?),
//!         Arc::new(ImageGenClient::new(&config.generative, &config.request)?),
//!         config.policy.clone(),
//!         Duration::from_millis(config.request.timeout_ms),
//!     );
//!     let composer = Composer::new(&config.retrieval.catalog_base_url);
//!     let mut engine = ConciergeEngine::new(storage, arbiter, composer).await;
//!     let draft = engine.handle_turn("Recommend a quiet rooftop restaurant").await?;
//!     println!("{}", draft.text);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Tool arbitration: intent classification and the tiered fallback policy.
pub mod arbiter;
/// Tool client boundaries and HTTP implementations.
pub mod clients;
/// Answer composition and citation discipline.
pub mod composer;
/// Configuration management.
pub mod config;
/// The per-turn orchestration engine.
pub mod engine;
/// Error types and result aliases for the application.
pub mod error;
/// Static self-description and disclosure text.
pub mod prompts;
/// Conversation session state machine and turn types.
pub mod session;
/// SQLite storage layer for session persistence.
pub mod storage;

pub use arbiter::{Arbiter, Intent, Query, ToolOutcome, ToolPlan, ToolTier};
pub use composer::{AnswerDraft, Citation, Composer};
pub use config::Config;
pub use engine::ConciergeEngine;
pub use error::{AppError, AppResult};
pub use session::{ChatSession, SessionRecord, SessionStatus};
