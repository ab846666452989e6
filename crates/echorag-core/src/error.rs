use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a whole document ingestion. Partial index state is rolled back
/// before any of these is returned.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("embedding failed after {attempts} attempts: {message}")]
    EmbeddingExhausted { attempts: u32, message: String },

    #[error("index write failed: {0}")]
    Index(String),

    #[error("store write failed: {0}")]
    Store(String),

    #[error("document not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    /// A required external call (question embedding) failed or timed out.
    #[error("retrieval unavailable: {0}")]
    Unavailable(String),

    #[error("index lookup failed: {0}")]
    Index(String),

    #[error("store lookup failed: {0}")]
    Store(String),
}
