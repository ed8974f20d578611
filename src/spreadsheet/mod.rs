//! Conversion between spreadsheet files and debtor records.

pub mod export;
pub mod import;
pub mod table;

pub use export::{export_bytes, export_to_path, ExportFormat, ExportOutcome, EXPORT_COLUMNS};
pub use import::{import_file, import_table, ImportSummary, SkipReason, SkippedRow};
pub use table::{read_table, Table};
