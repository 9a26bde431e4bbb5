//! # walkv
//!
//! A key-value store made durable by a write-ahead log:
//! - Every mutation is appended and fsynced before it touches memory
//! - Sequence numbers stay unique across threads, handles and processes
//! - Crash recovery rebuilds the map by replaying the log, skipping
//!   malformed lines
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   TransactionalStore                        │
//! │          put / delete (serialized)   get / size             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │ 1. append               │ 2. apply
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  WalWriter  │          │  MemTable   │
//!   │ (fsync'd)   │          │  (RwLock)   │
//!   └──────┬──────┘          └──────▲──────┘
//!          │ scan                   │ install
//!          ▼                        │
//!   ┌─────────────────────────────────────┐
//!   │      WalRecovery (sort + replay)    │
//!   └─────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod value;

pub mod wal;
pub mod memtable;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::{Config, SyncMode, WalOptions};
pub use value::Value;
pub use wal::{LogRecord, OperationKind, RecoveryStats, WalRecovery, WalWriter};
pub use store::TransactionalStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of walkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
