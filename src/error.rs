//! Error types for the solver
//!
//! Every variant is fatal: any of them aborts the whole run.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using SolveError
pub type Result<T> = std::result::Result<T, SolveError>;

/// Unified error type for a solver run
#[derive(Debug, Error)]
pub enum SolveError {
    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    #[error("cannot access input {}: {source}", .path.display())]
    InputAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Chunking / Parsing Errors
    // -------------------------------------------------------------------------
    #[error("chunk of {chunk_size} bytes at offset {offset} holds no complete record")]
    ChunkTooSmall { offset: u64, chunk_size: usize },

    #[error("malformed record at offset {offset} ({reason}): {line:?}")]
    MalformedRecord {
        offset: u64,
        line: String,
        reason: &'static str,
    },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Worker Pool Errors
    // -------------------------------------------------------------------------
    #[error("worker {worker} stopped without reporting")]
    WorkerPanicked { worker: usize },

    #[error("run cancelled")]
    Cancelled,
}
