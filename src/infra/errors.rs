// src/infra/errors.rs — Error types for aftersales

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AftersalesError {
    // Input errors (fail fast, no side effects)
    #[error("Product reference is empty or contains no usable terms: {query:?}")]
    InvalidQuery { query: String },

    // Document faults (fatal for that request only)
    #[error("Document '{path}' is encrypted and could not be decrypted")]
    EncryptedDocument { path: String },

    #[error("Failed to open document '{path}': {message}")]
    DocumentOpen { path: String, message: String },

    // Extraction ran past the caller-side deadline (recoverable)
    #[error("Extraction of '{path}' exceeded {timeout_secs}s, try again")]
    ExtractionTimeout { path: String, timeout_secs: u64 },

    // Infra
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Session document error: {0}")]
    SessionDocument(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AftersalesError {
    /// Whether the caller may simply retry the same request.
    pub fn is_retriable(&self) -> bool {
        matches!(self, AftersalesError::ExtractionTimeout { .. })
    }
}
