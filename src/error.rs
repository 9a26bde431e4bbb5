//! Error types for walkv
//!
//! Provides a unified error type for all fallible operations. Malformed log
//! lines are not errors of this type: they are described by
//! [`DecodeError`](crate::wal::DecodeError) and collected, not propagated.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for walkv operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("failed to open WAL at {}: {source}", path.display())]
    WalOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("WAL write failed for sequence {sequence}: {source}")]
    WalWrite {
        sequence: u64,
        #[source]
        source: std::io::Error,
    },

    /// The record may be on disk but durability could not be confirmed.
    #[error("WAL sync failed for sequence {sequence}: {source}")]
    WalSync {
        sequence: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("WAL file lock failed: {0}")]
    WalLock(#[source] std::io::Error),

    /// The log already holds the largest representable sequence number
    #[error("WAL sequence numbers exhausted after {last}")]
    SequenceExhausted { last: u64 },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
