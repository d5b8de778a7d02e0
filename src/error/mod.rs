use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Web search error: {0}")]
    Search(#[from] SearchError),

    #[error("Generative tool error: {0}")]
    Generative(#[from] GenerativeError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Composition error: {0}")]
    Compose(#[from] ComposeError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("Serialization failed: {message}")]
    Serialization { message: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Curated knowledge store (vector search) errors
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Vector store unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Web search provider errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Generative tool errors
#[derive(Debug, Error)]
pub enum GenerativeError {
    #[error("No artifact produced: {message}")]
    MissingArtifact { message: String },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Conversation session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Message is {len} characters, maximum is {max}")]
    MessageTooLong { len: usize, max: usize },

    #[error("A turn is already in flight")]
    TurnInFlight,

    #[error("No turn is in flight")]
    NoTurnInFlight,

    #[error("Turn part not found at index {index}")]
    PartNotFound { index: usize },
}

/// Answer composition errors
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Citation label [{label}] has no resolvable URL")]
    MissingCitationUrl { label: u32 },

    #[error("Bare citation label [{label}] in draft")]
    BareCitation { label: u32 },

    #[error("Nothing to compose: {message}")]
    EmptyEvidence { message: String },
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type alias for composition operations
pub type ComposeResult<T> = Result<T, ComposeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config {
            message: "missing key".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: missing key");

        let err = AppError::Internal {
            message: "unexpected".to_string(),
        };
        assert_eq!(err.to_string(), "Internal error: unexpected");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Connection {
            message: "failed to connect".to_string(),
        };
        assert_eq!(err.to_string(), "Database connection failed: failed to connect");

        let err = StorageError::Serialization {
            message: "bad json".to_string(),
        };
        assert_eq!(err.to_string(), "Serialization failed: bad json");
    }

    #[test]
    fn test_retrieval_error_display() {
        let err = RetrievalError::Unavailable {
            message: "server down".to_string(),
            retries: 3,
        };
        assert_eq!(
            err.to_string(),
            "Vector store unavailable: server down (retries: 3)"
        );

        let err = RetrievalError::Timeout { timeout_ms: 5000 };
        assert_eq!(err.to_string(), "Request timeout after 5000ms");
    }

    #[test]
    fn test_generative_error_display() {
        let err = GenerativeError::MissingArtifact {
            message: "empty data array".to_string(),
        };
        assert_eq!(err.to_string(), "No artifact produced: empty data array");
    }

    #[test]
    fn test_session_error_display() {
        assert_eq!(
            SessionError::EmptyMessage.to_string(),
            "Message cannot be empty"
        );
        assert_eq!(
            SessionError::MessageTooLong { len: 2500, max: 2000 }.to_string(),
            "Message is 2500 characters, maximum is 2000"
        );
        assert_eq!(
            SessionError::TurnInFlight.to_string(),
            "A turn is already in flight"
        );
    }

    #[test]
    fn test_compose_error_display() {
        let err = ComposeError::BareCitation { label: 2 };
        assert_eq!(err.to_string(), "Bare citation label [2] in draft");

        let err = ComposeError::MissingCitationUrl { label: 1 };
        assert_eq!(err.to_string(), "Citation label [1] has no resolvable URL");
    }

    #[test]
    fn test_error_conversions_to_app_error() {
        let err: AppError = StorageError::Query {
            message: "syntax".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::Storage(_)));

        let err: AppError = RetrievalError::Timeout { timeout_ms: 100 }.into();
        assert!(matches!(err, AppError::Retrieval(_)));

        let err: AppError = SessionError::EmptyMessage.into();
        assert!(matches!(err, AppError::Session(_)));

        let err: AppError = ComposeError::BareCitation { label: 1 }.into();
        assert!(matches!(err, AppError::Compose(_)));
    }
}
