//! Error types for the annoflag worker.

use thiserror::Error;

/// Result type alias using annoflag's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for annoflag operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input (empty user id, unknown intent, malformed document ref)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transport or query failure while scanning the index
    #[error("Scan error: {0}")]
    Scan(String),

    /// Transport-level failure to submit a bulk batch at all
    #[error("Bulk submit error: {0}")]
    BulkSubmit(String),

    /// Queue message payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Queue/broker operation failed
    #[error("Queue error: {0}")]
    Queue(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
