//! WAL test suite

mod entry_tests;
mod reader_tests;
