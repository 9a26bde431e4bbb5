//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log records.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize};

use crate::value::Value;

/// A single record in the WAL
///
/// Serialized as one JSON object. `old_value` / `new_value` are left out when
/// absent; a present `null` reads back as `Some(Value::Null)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Monotonically increasing, defines the order of application
    pub sequence_number: u64,

    /// Identifies the operation that produced this record
    pub transaction_id: String,

    /// The kind of mutation. Older logs name this field `operation_type`.
    #[serde(alias = "operation_type")]
    pub operation_kind: OperationKind,

    pub key: String,

    /// Value at `key` before the mutation (audit/undo only)
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub old_value: Option<Value>,

    /// Value to apply; `None` for deletes
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub new_value: Option<Value>,

    /// Seconds since the Unix epoch when the record was created.
    /// Never used for ordering.
    pub timestamp: f64,
}

/// Mutations that can be logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    /// Key was absent before the write
    Insert,

    /// Key held a value before the write
    Update,

    Delete,
}

impl LogRecord {
    /// Build a record stamped with the current wall-clock time
    pub fn new(
        sequence_number: u64,
        transaction_id: impl Into<String>,
        operation_kind: OperationKind,
        key: impl Into<String>,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) -> Self {
        Self {
            sequence_number,
            transaction_id: transaction_id.into(),
            operation_kind,
            key: key.into(),
            old_value,
            new_value,
            timestamp: unix_timestamp(),
        }
    }

    /// `new_value` is present iff the operation is not a delete.
    ///
    /// Older logs write an explicit `null` as the new value of a delete;
    /// that is accepted too.
    pub fn is_well_formed(&self) -> bool {
        match self.operation_kind {
            OperationKind::Delete => matches!(self.new_value, None | Some(Value::Null)),
            OperationKind::Insert | OperationKind::Update => self.new_value.is_some(),
        }
    }
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Insert => "INSERT",
            OperationKind::Update => "UPDATE",
            OperationKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the on-disk spelling; anything else is rejected.
impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INSERT" => Ok(OperationKind::Insert),
            "UPDATE" => Ok(OperationKind::Update),
            "DELETE" => Ok(OperationKind::Delete),
            other => Err(other.to_string()),
        }
    }
}

/// A field that is present holds a value, even when that value is `null`
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Current wall-clock time as fractional seconds since the Unix epoch.
///
/// A clock set before the epoch yields 0.0.
pub(crate) fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
