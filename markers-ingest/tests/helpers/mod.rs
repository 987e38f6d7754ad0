//! Test Helper Utilities
//!
//! Shared utilities for testing markers-ingest

#![allow(dead_code)]

pub mod db_utils;
pub mod log_capture;
pub mod scripted_store;

pub use db_utils::{
    count_rows, create_test_store, create_test_writer, fetch_media, fetch_options, fetch_ranges,
    seed_media, MediaRow, OptionRow, RangeRow,
};
pub use log_capture::{init_test_logging, LogCapture};
pub use scripted_store::ScriptedStore;
