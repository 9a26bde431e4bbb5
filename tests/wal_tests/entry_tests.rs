//! Tests for WAL record encoding and decoding
//!
//! These tests verify:
//! - Encoded lines carry all seven fields and decode back
//! - Absent values are omitted while a stored null survives as a value
//! - Every malformed input yields a DecodeError instead of a panic
//! - Lines using the `operation_type` spelling still decode

use serde_json::json;
use walkv::wal::codec::{decode, encode};
use walkv::wal::{DecodeError, LogRecord, OperationKind};
use walkv::Value;

fn record(kind: OperationKind, old: Option<Value>, new: Option<Value>) -> LogRecord {
    LogRecord {
        sequence_number: 42,
        transaction_id: "txn_3_1700000000".to_string(),
        operation_kind: kind,
        key: "user:1".to_string(),
        old_value: old,
        new_value: new,
        timestamp: 1_700_000_000.25,
    }
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_contains_all_fields() {
    let rec = record(
        OperationKind::Update,
        Some(Value::from(json!({"name": "A"}))),
        Some(Value::from(json!({"name": "B"}))),
    );

    let parsed: serde_json::Value = serde_json::from_str(&encode(&rec).unwrap()).unwrap();

    assert_eq!(
        parsed,
        json!({
            "sequence_number": 42,
            "transaction_id": "txn_3_1700000000",
            "operation_kind": "UPDATE",
            "key": "user:1",
            "old_value": {"name": "A"},
            "new_value": {"name": "B"},
            "timestamp": 1_700_000_000.25
        })
    );
}

#[test]
fn test_encode_omits_absent_values() {
    let rec = record(OperationKind::Delete, Some(Value::from("gone")), None);
    let parsed: serde_json::Value = serde_json::from_str(&encode(&rec).unwrap()).unwrap();

    assert!(parsed.get("new_value").is_none());
    assert_eq!(parsed["old_value"], json!("gone"));
    assert_eq!(parsed["operation_kind"], json!("DELETE"));
}

#[test]
fn test_decode_preserves_nested_values() {
    let nested = Value::from(json!({
        "profile": {"tags": ["a", "b"], "active": true, "score": 9.5},
        "history": [1, 2, {"deep": null}]
    }));
    let rec = record(OperationKind::Insert, None, Some(nested.clone()));

    let decoded = decode(&encode(&rec).unwrap()).unwrap();

    assert_eq!(decoded, rec);
    assert_eq!(decoded.new_value, Some(nested));
}

#[test]
fn test_stored_null_is_not_absent() {
    let rec = record(OperationKind::Insert, None, Some(Value::Null));

    let decoded = decode(&encode(&rec).unwrap()).unwrap();

    assert_eq!(decoded.old_value, None);
    assert_eq!(decoded.new_value, Some(Value::Null));
    assert!(decoded.is_well_formed());
}

// =============================================================================
// Malformed Input Tests
// =============================================================================

#[test]
fn test_decode_empty_line() {
    assert_eq!(decode(""), Err(DecodeError::Empty));
    assert_eq!(decode("   \r"), Err(DecodeError::Empty));
}

#[test]
fn test_decode_invalid_json() {
    let err = decode("invalid entry").unwrap_err();
    assert!(matches!(err, DecodeError::Syntax { line: 1, .. }));
}

#[test]
fn test_decode_truncated_json() {
    let err = decode(r#"{"sequence_number":33, "transaction_id": "incomplete""#).unwrap_err();
    assert!(matches!(err, DecodeError::Syntax { .. }));
}

#[test]
fn test_decode_non_object() {
    assert_eq!(decode("[1, 2, 3]"), Err(DecodeError::NotAnObject));
    assert_eq!(decode("17"), Err(DecodeError::NotAnObject));
}

/// Message of a schema error, or a panic for any other outcome
fn schema_message(line: &str) -> String {
    match decode(line) {
        Err(DecodeError::Schema { message, .. }) => message,
        other => panic!("expected a schema error, got {:?}", other),
    }
}

#[test]
fn test_decode_missing_fields() {
    let line = json!({
        "sequence_number": 1,
        "operation_kind": "INSERT",
        "key": "k",
        "timestamp": 1.0
    })
    .to_string();
    assert!(schema_message(&line).contains("missing field `transaction_id`"));

    let line = json!({
        "sequence_number": 1,
        "transaction_id": "t",
        "operation_kind": "INSERT",
        "key": "k"
    })
    .to_string();
    assert!(schema_message(&line).contains("missing field `timestamp`"));
}

#[test]
fn test_decode_unknown_operation() {
    let line = json!({
        "sequence_number": 1,
        "transaction_id": "t",
        "operation_kind": "UPSERT",
        "key": "k",
        "timestamp": 1.0
    })
    .to_string();

    assert!(schema_message(&line).contains("unknown variant `UPSERT`"));
}

#[test]
fn test_decode_wrong_field_types() {
    let line = json!({
        "sequence_number": -4,
        "transaction_id": "t",
        "operation_kind": "INSERT",
        "key": "k",
        "timestamp": 1.0
    })
    .to_string();
    assert!(schema_message(&line).contains("-4"));

    let line = json!({
        "sequence_number": 1,
        "transaction_id": "t",
        "operation_kind": "INSERT",
        "key": ["not", "a", "string"],
        "timestamp": 1.0
    })
    .to_string();
    assert!(schema_message(&line).contains("expected a string"));
}

#[test]
fn test_decode_ignores_unknown_fields() {
    let line = json!({
        "sequence_number": 3,
        "transaction_id": "t",
        "operation_kind": "DELETE",
        "key": "k",
        "timestamp": 1.0,
        "checksum": "abc"
    })
    .to_string();

    let decoded = decode(&line).unwrap();
    assert_eq!(decoded.sequence_number, 3);
    assert_eq!(decoded.new_value, None);
}

// =============================================================================
// Compatibility Tests
// =============================================================================

#[test]
fn test_decode_legacy_operation_type_field() {
    let line = r#"{"sequence_number": 2, "transaction_id": "txn_2_1700000000", "operation_type": "DELETE", "key": "user:2", "old_value": {"name": "Surekha", "age": 25}, "new_value": null, "timestamp": 1700000000.5}"#;

    let decoded = decode(line).unwrap();

    assert_eq!(decoded.operation_kind, OperationKind::Delete);
    assert_eq!(decoded.key, "user:2");
    assert_eq!(
        decoded.old_value,
        Some(Value::from(json!({"name": "Surekha", "age": 25})))
    );
}

#[test]
fn test_operation_kind_spelling() {
    assert_eq!(OperationKind::Insert.to_string(), "INSERT");
    assert_eq!("UPDATE".parse::<OperationKind>(), Ok(OperationKind::Update));
    assert!("delete".parse::<OperationKind>().is_err());
}
