//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append a record durably before any mutation is applied
//! - Sequence numbers for ordering, unique across every handle on a path
//! - Tolerate malformed lines on read-back
//! - Crash recovery and replay
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ {"sequence_number":1,...,"timestamp":1700000000.1}\n      │
//! ├──────────────────────────────────────────────────────────┤
//! │ {"sequence_number":2,...,"timestamp":1700000000.2}\n      │
//! ├──────────────────────────────────────────────────────────┤
//! │ ...                                                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//! One JSON record per line; see [`codec`] for the fields.

pub mod codec;
mod entry;
mod reader;
mod recovery;
mod writer;

pub use codec::DecodeError;
pub use entry::{LogRecord, OperationKind};
pub use reader::{LogScan, ScanItem, SkippedLine, WalReader};
pub use recovery::{ApplyError, RecoveryStats, SequenceGap, VerifyReport, WalRecovery};
pub use writer::WalWriter;
