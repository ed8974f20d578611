#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveDate;
use debtor_core::{core::time::FixedClock, storage::SqliteStore};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a unique directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Opens a file-backed store in an isolated directory with caching disabled.
pub fn temp_store() -> SqliteStore {
    let path = temp_base().join("debtors.db");
    SqliteStore::open(&path, Duration::ZERO).expect("open sqlite store")
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Monday 4 March 2024, the reference day used across the suites.
pub fn monday_clock() -> FixedClock {
    FixedClock::new(date(2024, 3, 4))
}
