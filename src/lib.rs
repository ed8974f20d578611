#![doc(test(attr(deny(warnings))))]

//! Debtor Core tracks who owes money and drives each debtor through the collection
//! workflow: pending, scheduled with phased follow-ups, and finally paid. It ships a SQLite
//! store, spreadsheet import/export, calendar and dashboard views, and an operator shell.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod spreadsheet;
pub mod storage;
pub mod utils;

pub use crate::core::errors::{DebtorError, ErrorKind};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Debtor Core tracing initialized.");
    });
}
