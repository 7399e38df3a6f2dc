//! Error types for Synheart Proctor

use thiserror::Error;

/// Errors that can occur while monitoring a session
#[derive(Debug, Error)]
pub enum ProctorError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to parse observation: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Session already open: {0}")]
    DuplicateSession(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Evidence capture failed: {0}")]
    EvidenceError(String),
}
