//! WAL Writer
//!
//! The WAL engine: owns the log path, assigns sequence numbers and appends
//! records durably. Also the entry point for reading the log back.
//!
//! ## Append Exclusivity
//!
//! One append is one critical section guarded by two layers of the same lock:
//!
//! 1. `state` mutex: callers sharing this `WalWriter` (threads)
//! 2. exclusive advisory file lock: every handle on the path (other
//!    `WalWriter`s, other processes)
//!
//! Under both locks the writer compares the file length with the length it
//! last wrote. If another handle appended in between, the new tail is scanned
//! and `last_sequence` moves past whatever it contains before a number is
//! reserved.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::codec;
use super::entry::{LogRecord, OperationKind};
use super::reader::{LogScan, WalReader};
use crate::config::{SyncMode, WalOptions};
use crate::error::{KvError, Result};
use crate::value::Value;

/// Writes entries to the WAL file
#[derive(Debug)]
pub struct WalWriter {
    path: PathBuf,
    options: WalOptions,
    state: Mutex<WriterState>,
}

#[derive(Debug)]
struct WriterState {
    /// Highest sequence number known to be in the file (0 for none)
    last_sequence: u64,

    /// File length as of the last scan or successful append
    known_len: u64,

    /// False when `known_len` ends inside an unterminated line
    on_boundary: bool,
}

impl WalWriter {
    /// Open or create a WAL file with default options
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, WalOptions::default())
    }

    /// Open or create a WAL file
    ///
    /// Steps:
    /// 1. Create the file if it does not exist (idempotent)
    /// 2. Scan it to find the highest valid sequence number
    /// 3. Resume numbering after that number
    pub fn open_with(path: impl AsRef<Path>, options: WalOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_log_file(&path)?;

        let state = match WalReader::open_at(&path, 0, options.file_lock).and_then(WalReader::scan)
        {
            Ok(scan) => WriterState {
                last_sequence: scan.max_sequence().unwrap_or(0),
                known_len: scan.end_offset,
                on_boundary: scan.ends_on_boundary,
            },
            // The file exists but cannot be read through; numbering starts
            // over and the next append rescans.
            Err(KvError::Io(e)) => {
                warn!(path = %path.display(), error = %e, "WAL unreadable, starting sequence at 0");
                WriterState {
                    last_sequence: 0,
                    known_len: 0,
                    on_boundary: true,
                }
            }
            Err(e) => return Err(e),
        };

        info!(
            path = %path.display(),
            last_sequence = state.last_sequence,
            bytes = state.known_len,
            "WAL opened"
        );

        Ok(Self {
            path,
            options,
            state: Mutex::new(state),
        })
    }

    /// Append a record and make it durable
    ///
    /// Steps (all under the append lock):
    /// 1. Catch up with appends made through other handles
    /// 2. Reserve the next sequence number
    /// 3. Encode the record with the current timestamp
    /// 4. Write the line in one call
    /// 5. Sync to stable storage
    ///
    /// The sequence number is returned only once the sync has succeeded. A
    /// failed write or sync consumes no number.
    pub fn append(
        &self,
        transaction_id: impl Into<String>,
        operation_kind: OperationKind,
        key: impl Into<String>,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) -> Result<u64> {
        let mut state = self.state.lock();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| KvError::WalOpen {
                path: self.path.clone(),
                source,
            })?;
        let _file_lock = if self.options.file_lock {
            Some(ExclusiveLock::acquire(&file)?)
        } else {
            None
        };

        let len_before = self.catch_up(&mut state, &file)?;

        let sequence = state
            .last_sequence
            .checked_add(1)
            .ok_or(KvError::SequenceExhausted {
                last: state.last_sequence,
            })?;
        let record = LogRecord::new(
            sequence,
            transaction_id,
            operation_kind,
            key,
            old_value,
            new_value,
        );

        let mut line = String::new();
        if !state.on_boundary {
            // Keep the new record off the end of a torn line
            line.push('\n');
        }
        line.push_str(&codec::encode(&record)?);
        line.push('\n');

        // State is untouched on failure; bytes that did reach the file change
        // its length and force a rescan on the next append.
        (&file)
            .write_all(line.as_bytes())
            .map_err(|source| KvError::WalWrite { sequence, source })?;

        let synced = match self.options.sync_mode {
            SyncMode::Full => file.sync_all(),
            SyncMode::Data => file.sync_data(),
        };
        synced.map_err(|source| KvError::WalSync { sequence, source })?;

        state.last_sequence = sequence;
        state.known_len = len_before + line.len() as u64;
        state.on_boundary = true;

        debug!(
            sequence,
            kind = %record.operation_kind,
            key = %record.key,
            "WAL append"
        );

        Ok(sequence)
    }

    /// Bring `state` up to date with the file, returning its current length.
    ///
    /// Called with the append lock held.
    fn catch_up(&self, state: &mut WriterState, file: &File) -> Result<u64> {
        let len = file.metadata()?.len();
        if len == state.known_len {
            return Ok(len);
        }

        // A shorter file was replaced or truncated underneath us: rescan it
        // whole. Numbering still never goes backwards.
        let start = if len > state.known_len { state.known_len } else { 0 };
        let tail = WalReader::open_at(&self.path, start, false)?.scan()?;

        let before = state.last_sequence;
        if let Some(max) = tail.max_sequence() {
            state.last_sequence = state.last_sequence.max(max);
        }
        if tail.end_offset > start {
            state.on_boundary = tail.ends_on_boundary;
        }
        state.known_len = tail.end_offset;

        debug!(
            from = start,
            to = tail.end_offset,
            skipped = tail.skipped.len(),
            last_sequence = state.last_sequence,
            advanced_by = state.last_sequence - before,
            "WAL caught up with external appends"
        );

        Ok(tail.end_offset)
    }

    /// Read every valid record in file order, skipping malformed lines
    pub fn read_all(&self) -> Result<Vec<LogRecord>> {
        Ok(self.scan()?.records)
    }

    /// Full scan of the log, including the malformed lines that were skipped.
    ///
    /// Takes a shared file lock when file locking is enabled, so a thread
    /// must not hold a scan open while appending through another handle.
    pub fn scan(&self) -> Result<LogScan> {
        WalReader::open_at(&self.path, 0, self.options.file_lock)?.scan()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> WalOptions {
        self.options
    }

    /// Highest sequence number this handle has written or observed
    pub fn last_sequence(&self) -> u64 {
        self.state.lock().last_sequence
    }

    /// Sequence number the next append will use, unless another handle
    /// appends first. `None` once the numbering is exhausted.
    pub fn next_sequence(&self) -> Option<u64> {
        self.last_sequence().checked_add(1)
    }
}

// =============================================================================
// File Helpers
// =============================================================================

/// Exclusive advisory lock, released on drop
struct ExclusiveLock<'a>(&'a File);

impl<'a> ExclusiveLock<'a> {
    fn acquire(file: &'a File) -> Result<Self> {
        FileExt::lock_exclusive(file).map_err(KvError::WalLock)?;
        Ok(Self(file))
    }
}

impl Drop for ExclusiveLock<'_> {
    fn drop(&mut self) {
        let _ = FileExt::unlock(self.0);
    }
}

/// Create the log file if absent. A newly created file has its directory
/// entry synced as well.
fn ensure_log_file(path: &Path) -> Result<()> {
    let existed = path.exists();

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| KvError::WalOpen {
            path: path.to_path_buf(),
            source,
        })?;

    if !existed {
        sync_parent_dir(path)?;
        debug!(path = %path.display(), "Created WAL file");
    }
    Ok(())
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}
