//! Error types for sessionlens-core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the sessionlens-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Parse error for a conversation log
    #[error("parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Active-duration computation failed
    #[error("duration error: {0}")]
    Duration(String),

    /// Knowledge graph load/persist error
    #[error("knowledge graph error: {0}")]
    KnowledgeGraph(String),

    /// A whole batch produced no analyzable sessions
    #[error("no sessions found in {files} file(s)")]
    NoSessionsFound { files: usize },
}

/// Result type alias for sessionlens-core
pub type Result<T> = std::result::Result<T, Error>;
