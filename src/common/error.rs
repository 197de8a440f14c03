//! Error types for minivote

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Submission Errors ===
    #[error("Missing or malformed parameters: {0}")]
    Validation(String),

    #[error("Voter {0} has already voted")]
    AlreadyVoted(u64),

    // === Store Errors ===
    #[error("Duplicate vote for voter {voter} in shard {shard}")]
    Duplicate { shard: u16, voter: u64 },

    #[error("Write log unavailable: {0}")]
    Storage(String),

    // === Routing Errors ===
    #[error("No live replica accepted the write")]
    Unavailable,

    #[error("Shard {shard} had no reachable replica")]
    InsufficientReplicas { shard: u16 },

    // === Wire Errors ===
    #[error("Corrupted request body: {0}")]
    Corrupted(String),

    #[error("HTTP error: {0}")]
    Http(String),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Is this a retryable error?
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Unavailable | Error::InsufficientReplicas { .. } | Error::Http(_)
        )
    }

    /// Convert to HTTP status code
    pub fn to_http_status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Error::Validation(_) | Error::Corrupted(_) | Error::InvalidConfig(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Duplicate { .. } => StatusCode::BAD_REQUEST,
            Error::AlreadyVoted(_) => StatusCode::FORBIDDEN,
            Error::Unavailable | Error::InsufficientReplicas { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Error::Storage(_) => StatusCode::INSUFFICIENT_STORAGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e.to_string())
    }
}
