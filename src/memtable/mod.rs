//! MemTable Module
//!
//! In-memory map from key to current value.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Single-writer/multi-reader access pattern
//! - Whole-table replacement when recovery installs a rebuilt map
//!
//! The MemTable carries no durability obligations: every mutation reaching
//! it has already been logged by the store, and it can be rebuilt from the
//! WAL at any time.

mod table;

pub use table::MemTable;
