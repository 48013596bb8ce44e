//! Error taxonomy shared by the ingestion and query paths.

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the assistant.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid secrets, paths, or tuning parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The PDF yielded no usable text.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// The vector index never became ready.
    #[error("provisioning error: {0}")]
    Provisioning(String),

    /// A remote service (embeddings, vector store, LLM) rejected a request.
    #[error("provider error: {0}")]
    Provider(String),

    /// Provider response that is worth retrying (rate limits, 5xx).
    #[error("provider error (retryable): {0}")]
    TransientProvider(String),

    /// The profile metadata document is malformed.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// A chat session action arrived in the wrong state.
    #[error("session error: {0}")]
    Session(String),

    /// Transport-level HTTP failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether a failed call may succeed if repeated unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::TransientProvider(_) => true,
            Error::Http(err) => {
                err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
            }
            _ => false,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }
}
