//! WAL Reader
//!
//! Forward-only scan over the lines of a WAL file. Each line becomes either a
//! decoded record or a skipped-line report; malformed content never aborts a
//! scan, only I/O failures do.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use fs2::FileExt;
use serde::Serialize;
use tracing::warn;

use super::codec::{self, DecodeError};
use super::entry::LogRecord;
use crate::error::{KvError, Result};

/// A line that was excluded from a scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedLine {
    /// 1-based line number within the file
    pub line_number: usize,

    /// Byte offset of the start of the line
    pub offset: u64,

    pub error: DecodeError,
}

/// One step of a scan
#[derive(Debug, Clone, PartialEq)]
pub enum ScanItem {
    Record(LogRecord),
    Skipped(SkippedLine),
}

/// Everything a full scan found
#[derive(Debug, Clone, Default)]
pub struct LogScan {
    /// Valid records in file order
    pub records: Vec<LogRecord>,

    /// Malformed lines, in file order
    pub skipped: Vec<SkippedLine>,

    /// Offset just past the last byte read
    pub end_offset: u64,

    /// False when the file ends with an unterminated line
    pub ends_on_boundary: bool,
}

impl LogScan {
    /// Highest sequence number among the valid records
    pub fn max_sequence(&self) -> Option<u64> {
        self.records.iter().map(|r| r.sequence_number).max()
    }
}

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,
    offset: u64,
    line_number: usize,
    ends_on_boundary: bool,
    locked: bool,
    buf: Vec<u8>,
}

impl WalReader {
    /// Open a WAL file for reading, holding a shared advisory lock until the
    /// reader is dropped
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_at(path, 0, true)
    }

    /// Start reading at `offset`, which must be a line boundary.
    ///
    /// Line numbers reported by a reader that does not start at 0 are
    /// relative to `offset`.
    pub(crate) fn open_at(path: &Path, offset: u64, shared_lock: bool) -> Result<Self> {
        let mut file = File::open(path).map_err(|source| KvError::WalOpen {
            path: path.to_path_buf(),
            source,
        })?;

        if shared_lock {
            FileExt::lock_shared(&file).map_err(KvError::WalLock)?;
        }

        if offset > 0 {
            file.seek(SeekFrom::Start(offset))?;
        }

        Ok(Self {
            reader: BufReader::new(file),
            offset,
            line_number: 0,
            ends_on_boundary: true,
            locked: shared_lock,
            buf: Vec::new(),
        })
    }

    /// Read the next line from the WAL.
    ///
    /// Returns `Ok(None)` at end of file. Blank lines are passed over
    /// silently.
    pub fn next_item(&mut self) -> Result<Option<ScanItem>> {
        loop {
            self.buf.clear();
            let start = self.offset;
            let read = self.reader.read_until(b'\n', &mut self.buf)?;
            if read == 0 {
                return Ok(None);
            }

            self.offset += read as u64;
            self.line_number += 1;
            self.ends_on_boundary = self.buf.last() == Some(&b'\n');

            let decoded = match std::str::from_utf8(&self.buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => codec::decode(line),
                Err(e) => Err(DecodeError::Syntax {
                    line: 1,
                    column: e.valid_up_to() + 1,
                    message: "line is not valid UTF-8".to_string(),
                }),
            };

            return Ok(Some(match decoded {
                Ok(record) => ScanItem::Record(record),
                Err(error) => ScanItem::Skipped(SkippedLine {
                    line_number: self.line_number,
                    offset: start,
                    error,
                }),
            }));
        }
    }

    /// Drain the reader into a [`LogScan`], warning about each skipped line
    pub fn scan(mut self) -> Result<LogScan> {
        let mut scan = LogScan::default();

        while let Some(item) = self.next_item()? {
            match item {
                ScanItem::Record(record) => scan.records.push(record),
                ScanItem::Skipped(skipped) => {
                    warn!(
                        line = skipped.line_number,
                        offset = skipped.offset,
                        error = %skipped.error,
                        "Skipping malformed WAL line"
                    );
                    scan.skipped.push(skipped);
                }
            }
        }

        scan.end_offset = self.offset;
        scan.ends_on_boundary = self.ends_on_boundary;
        Ok(scan)
    }
}

impl Iterator for WalReader {
    type Item = Result<ScanItem>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_item().transpose()
    }
}

impl Drop for WalReader {
    fn drop(&mut self) {
        if self.locked {
            // Closing the descriptor releases the lock as well
            let _ = FileExt::unlock(self.reader.get_ref());
        }
    }
}
