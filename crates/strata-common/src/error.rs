//! Error types for Strata.

use thiserror::Error;

use crate::coords::ChunkPos;

/// Top-level error type for Strata operations.
#[derive(Debug, Error)]
pub enum StrataError {
    /// World/chunk errors
    #[error("World error: {0}")]
    World(#[from] WorldError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version found
        actual: String,
    },
}

/// World and chunk errors.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Chunk not found
    #[error("Chunk not found at {pos:?}")]
    ChunkNotFound {
        /// Position of the missing chunk
        pos: ChunkPos,
    },

    /// Chunk load failed
    #[error("Failed to load chunk: {0}")]
    LoadFailed(String),

    /// Chunk save failed
    #[error("Failed to save chunk: {0}")]
    SaveFailed(String),

    /// Invalid chunk data
    #[error("Invalid chunk data: {0}")]
    InvalidData(String),
}

/// Result type alias for Strata operations.
pub type StrataResult<T> = Result<T, StrataError>;
