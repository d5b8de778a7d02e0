//! Persistence of the conversation session.
//!
//! The whole session (turns + duration map) persists as a single serialized
//! record under a fixed storage key, saved after every mutating transition.
//! A missing or corrupt record loads as an empty session rather than failing
//! startup.

mod sqlite;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::session::SessionRecord;

/// Fixed key the session record is stored under.
pub const STORAGE_KEY: &str = "chat-messages";

/// Session persistence boundary.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Load the persisted session record.
    ///
    /// A missing or unparseable record yields an empty record, never an
    /// error: persistence problems must not block the conversation surface.
    async fn load(&self) -> StorageResult<SessionRecord>;

    /// Persist the full session record, replacing any previous one.
    async fn save(&self, record: &SessionRecord) -> StorageResult<()>;

    /// Delete the persisted record entirely.
    async fn clear(&self) -> StorageResult<()>;
}
