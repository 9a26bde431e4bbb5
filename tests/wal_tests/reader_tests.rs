//! Tests for WAL Reader
//!
//! These tests verify:
//! - Reading back entries written by the writer, in file order
//! - Malformed lines are skipped and reported, not fatal
//! - Blank lines are ignored
//! - The lazy iterator yields the same items as a full scan

use walkv::wal::{DecodeError, ScanItem, WalReader};
use walkv::WalWriter;

use crate::common::{append_raw, setup_temp_wal, write_inserts};

// =============================================================================
// Basic Reading Tests
// =============================================================================

#[test]
fn test_read_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    let wal = WalWriter::open(&wal_path).unwrap();

    let scan = wal.scan().unwrap();

    assert!(scan.records.is_empty());
    assert!(scan.skipped.is_empty());
    assert_eq!(scan.end_offset, 0);
    assert_eq!(scan.max_sequence(), None);
}

#[test]
fn test_read_entries_in_file_order() {
    let (_temp, wal_path) = setup_temp_wal();
    let wal = WalWriter::open(&wal_path).unwrap();
    write_inserts(&wal, 10);

    let records = wal.read_all().unwrap();

    assert_eq!(records.len(), 10);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.sequence_number, (i + 1) as u64);
        assert_eq!(record.key, format!("key{}", i));
    }
}

#[test]
fn test_scan_reports_file_length() {
    let (_temp, wal_path) = setup_temp_wal();
    let wal = WalWriter::open(&wal_path).unwrap();
    write_inserts(&wal, 3);

    let scan = wal.scan().unwrap();

    assert_eq!(scan.end_offset, std::fs::metadata(&wal_path).unwrap().len());
    assert!(scan.ends_on_boundary);
    assert_eq!(scan.max_sequence(), Some(3));
}

// =============================================================================
// Corruption Handling Tests
// =============================================================================

#[test]
fn test_malformed_line_between_valid_records() {
    let (_temp, wal_path) = setup_temp_wal();
    let wal = WalWriter::open(&wal_path).unwrap();

    write_inserts(&wal, 1);
    append_raw(&wal_path, b"invalid entry\n");
    write_inserts(&wal, 1);

    let scan = wal.scan().unwrap();

    assert_eq!(scan.records.len(), 2);
    assert_eq!(scan.records[0].sequence_number, 1);
    assert_eq!(scan.records[1].sequence_number, 2);
    assert_eq!(scan.skipped.len(), 1);
    assert_eq!(scan.skipped[0].line_number, 2);
    assert!(matches!(scan.skipped[0].error, DecodeError::Syntax { .. }));
}

#[test]
fn test_only_malformed_lines() {
    let (_temp, wal_path) = setup_temp_wal();
    let wal = WalWriter::open(&wal_path).unwrap();
    append_raw(&wal_path, b"garbage\n{\"sequence_number\": 1}\n[]\n");

    let scan = wal.scan().unwrap();

    assert!(scan.records.is_empty());
    assert_eq!(scan.skipped.len(), 3);
    assert!(matches!(
        &scan.skipped[1].error,
        DecodeError::Schema { message, .. } if message.contains("missing field `transaction_id`")
    ));
    assert_eq!(scan.skipped[2].error, DecodeError::NotAnObject);
}

#[test]
fn test_blank_lines_are_ignored() {
    let (_temp, wal_path) = setup_temp_wal();
    let wal = WalWriter::open(&wal_path).unwrap();

    write_inserts(&wal, 1);
    append_raw(&wal_path, b"\n   \n");
    write_inserts(&wal, 1);

    let scan = wal.scan().unwrap();
    assert_eq!(scan.records.len(), 2);
    assert!(scan.skipped.is_empty());
}

// =============================================================================
// Iterator Tests
// =============================================================================

#[test]
fn test_iterator_matches_scan() {
    let (_temp, wal_path) = setup_temp_wal();
    let wal = WalWriter::open(&wal_path).unwrap();
    write_inserts(&wal, 2);
    append_raw(&wal_path, b"not json\n");
    write_inserts(&wal, 1);

    let items: Vec<ScanItem> = WalReader::open(&wal_path)
        .unwrap()
        .collect::<walkv::Result<_>>()
        .unwrap();

    assert_eq!(items.len(), 4);
    assert!(matches!(&items[0], ScanItem::Record(r) if r.sequence_number == 1));
    assert!(matches!(&items[1], ScanItem::Record(r) if r.sequence_number == 2));
    assert!(matches!(&items[2], ScanItem::Skipped(s) if s.line_number == 3));
    assert!(matches!(&items[3], ScanItem::Record(r) if r.sequence_number == 3));
}

#[test]
fn test_reader_on_missing_file_fails() {
    let (_temp, wal_path) = setup_temp_wal();
    assert!(matches!(
        WalReader::open(&wal_path),
        Err(walkv::KvError::WalOpen { .. })
    ));
}
