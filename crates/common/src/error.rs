//! Error types for httpscan
//!
//! Failures while loading definitions or synthesizing one are local to
//! that file. Only configuration errors are meant to stop a run.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpScanError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid definition {name}: {reason}")]
    Definition { name: String, reason: String },

    #[error("Invalid pattern {pattern:?} in definition {definition}: {reason}")]
    Pattern {
        definition: String,
        pattern: String,
        reason: String,
    },

    #[error("Definition {0} already exists")]
    AlreadyExists(String),

    #[error("Unable to derive an identity from {0}")]
    Unidentifiable(String),
}

/// Result type alias for httpscan operations
pub type HttpScanResult<T> = Result<T, HttpScanError>;
