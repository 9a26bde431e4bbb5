//! Log record codec
//!
//! Encoding and decoding of one [`LogRecord`] per text line.
//!
//! ## Line Format
//! ```text
//! {"sequence_number":1,"transaction_id":"txn_1_1700000000","operation_kind":"INSERT",
//!  "key":"user:1","new_value":{"name":"A"},"timestamp":1700000000.25}
//! ```
//! (shown wrapped; on disk it is a single line terminated by `\n`)
//!
//! - `old_value` / `new_value` are omitted when absent. A present JSON `null`
//!   is a stored null, not an absence.
//! - `operation_type` is accepted as a spelling of `operation_kind`.

use serde::de::IgnoredAny;
use serde::Serialize;
use serde_json::error::Category;
use thiserror::Error;

use super::entry::LogRecord;
use crate::error::{KvError, Result};

/// Why a line could not be decoded into a [`LogRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum DecodeError {
    #[error("empty line")]
    Empty,

    /// Not well-formed JSON, including lines cut short by a crash
    #[error("invalid JSON at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("record is not a JSON object")]
    NotAnObject,

    /// A JSON object that does not describe a record: a missing field, a
    /// field of the wrong type or an unknown operation kind
    #[error("invalid record at {line}:{column}: {message}")]
    Schema {
        line: usize,
        column: usize,
        message: String,
    },
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        let (line, column, message) = (e.line(), e.column(), e.to_string());
        match e.classify() {
            Category::Data => DecodeError::Schema {
                line,
                column,
                message,
            },
            Category::Io | Category::Syntax | Category::Eof => DecodeError::Syntax {
                line,
                column,
                message,
            },
        }
    }
}

/// Encode a record as a single JSON line (without the trailing newline)
pub fn encode(record: &LogRecord) -> Result<String> {
    serde_json::to_string(record).map_err(|e| KvError::Serialization(e.to_string()))
}

/// Decode one line. Never panics; every malformed input maps to a
/// [`DecodeError`].
pub fn decode(line: &str) -> std::result::Result<LogRecord, DecodeError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(DecodeError::Empty);
    }

    // Arrays would otherwise be accepted as a positional form of the struct
    if !line.starts_with('{') {
        return Err(match serde_json::from_str::<IgnoredAny>(line) {
            Ok(_) => DecodeError::NotAnObject,
            Err(e) => e.into(),
        });
    }

    Ok(serde_json::from_str(line)?)
}
