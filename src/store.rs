//! Store Module
//!
//! The transactional data store: the only writer of the in-memory map.
//!
//! ## Responsibilities
//! - Log every mutation to the WAL before applying it to the MemTable
//! - Classify writes as inserts or updates and capture the previous value
//! - Serve reads from memory without touching the log
//! - Rebuild the MemTable from the WAL on demand

use std::fs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::memtable::MemTable;
use crate::value::Value;
use crate::wal::{OperationKind, RecoveryStats, WalRecovery, WalWriter};

/// A key-value store whose mutations are write-ahead logged
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/delete): serialized by `write_lock`, which spans
///   classify → WAL append → MemTable apply. The map therefore applies
///   operations in the same order as their sequence numbers.
/// - **Reads** (get/size): MemTable read lock only.
/// - **Recovery**: callers must quiesce writers first. The rebuilt map is
///   installed under `write_lock`.
///
/// Each operation gets its own transaction id; there is no grouping of
/// several operations into one atomic unit.
#[derive(Debug)]
pub struct TransactionalStore {
    /// Shared WAL engine
    wal: Arc<WalWriter>,

    /// Current key -> value map
    memtable: MemTable,

    /// Serializes write operations (put/delete/recover)
    write_lock: Mutex<()>,

    txn_ids: TxnIdGenerator,
}

impl TransactionalStore {
    /// Create a store over `wal` with an empty map.
    ///
    /// Existing log contents are not loaded; call [`recover`](Self::recover)
    /// for that.
    pub fn new(wal: Arc<WalWriter>) -> Self {
        Self {
            wal,
            memtable: MemTable::new(),
            write_lock: Mutex::new(()),
            txn_ids: TxnIdGenerator::default(),
        }
    }

    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Open/create the WAL
    /// 3. Replay the WAL if `recover_on_open` is set
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let wal = WalWriter::open_with(config.wal_path(), config.wal_options())?;
        let store = Self::new(Arc::new(wal));

        if config.recover_on_open {
            store.recover()?;
        }

        Ok(store)
    }

    /// Put a key-value pair, returning the record's sequence number
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Read the current value (Insert if absent, else Update)
    /// 3. Write to WAL (durability)
    /// 4. Write to MemTable
    ///
    /// If the WAL append fails the MemTable is left unchanged.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<u64> {
        let key = key.into();
        let value = value.into();
        let txn_id = self.txn_ids.next();

        let _write_guard = self.write_lock.lock();

        let old_value = self.memtable.get(&key);
        let kind = if old_value.is_some() {
            OperationKind::Update
        } else {
            OperationKind::Insert
        };

        let sequence = self
            .wal
            .append(txn_id, kind, key.as_str(), old_value, Some(value.clone()))?;

        self.memtable.put(key, value);
        Ok(sequence)
    }

    /// Delete a key, returning whether it was present
    ///
    /// Deleting an absent key logs nothing and returns `false`.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let _write_guard = self.write_lock.lock();

        let Some(old_value) = self.memtable.get(key) else {
            debug!(key, "Delete of absent key, nothing logged");
            return Ok(false);
        };

        let txn_id = self.txn_ids.next();
        self.wal
            .append(txn_id, OperationKind::Delete, key, Some(old_value), None)?;

        self.memtable.delete(key);
        Ok(true)
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<Value> {
        self.memtable.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.memtable.contains_key(key)
    }

    /// Number of keys currently held
    pub fn size(&self) -> usize {
        self.memtable.len()
    }

    /// Discard the current map and rebuild it from the WAL
    pub fn recover(&self) -> Result<RecoveryStats> {
        let _write_guard = self.write_lock.lock();

        let (table, stats) = WalRecovery::replay(&self.wal)?;
        self.memtable.replace_with(table);

        info!(
            keys = self.memtable.len(),
            operations_applied = stats.operations_applied,
            "Store recovered from WAL"
        );
        Ok(stats)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The WAL engine this store logs to
    pub fn wal(&self) -> &Arc<WalWriter> {
        &self.wal
    }

    /// Copy of the current map, ordered by key
    pub fn snapshot(&self) -> std::collections::BTreeMap<String, Value> {
        self.memtable.snapshot()
    }
}

/// Issues `txn_{counter}_{unix_seconds}` identifiers
#[derive(Debug, Default)]
struct TxnIdGenerator {
    counter: AtomicU64,
}

impl TxnIdGenerator {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        format!("txn_{}_{}", n, secs)
    }
}
