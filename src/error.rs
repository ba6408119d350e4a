use crate::ports::document_store::StoreError;
use thiserror::Error;

/// Error type shared by the services, the HTTP layer and the CLI
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (permanent failures)
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors (usually permanent)
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    // Network errors from the remote store client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Client errors
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Backing store errors
    #[error("Document store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Document store error: {status} - {message}")]
    Backend { status: u16, message: String },

    // General service error
    #[error("Service error: {0}")]
    Service(String),
}

impl Error {
    /// Shorthand for a missing entity
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether the failure is caused by the caller rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::NotFound { .. }
                | Self::Conflict(_)
                | Self::Unauthorized(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => Self::NotFound {
                entity: collection,
                id,
            },
            StoreError::Conflict { collection, id } => {
                Self::Conflict(format!("document {id} already exists in {collection}"))
            }
            StoreError::Unauthorized(msg) => Self::Unauthorized(msg),
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
            StoreError::Backend { status, message } => Self::Backend { status, message },
            StoreError::InvalidDocument(msg) => Self::InvalidInput {
                field: "document".to_string(),
                reason: msg,
            },
            StoreError::Serialization(msg) => Self::Service(format!("Serialization error: {msg}")),
        }
    }
}
