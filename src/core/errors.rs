use std::result::Result as StdResult;

use thiserror::Error;

use crate::domain::DebtorId;

/// Unified error type for the domain, storage and spreadsheet layers.
#[derive(Error, Debug)]
pub enum DebtorError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Duplicate record: {0}")]
    Duplicate(String),
    #[error("Debtor {0} not found")]
    NotFound(DebtorId),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),
}

/// Coarse error category so callers can branch without matching messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Duplicate,
    NotFound,
    Storage,
    Config,
    Spreadsheet,
}

impl DebtorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DebtorError::Validation(_) => ErrorKind::Validation,
            DebtorError::Duplicate(_) => ErrorKind::Duplicate,
            DebtorError::NotFound(_) => ErrorKind::NotFound,
            DebtorError::Storage(_) => ErrorKind::Storage,
            DebtorError::Config(_) => ErrorKind::Config,
            DebtorError::Spreadsheet(_) => ErrorKind::Spreadsheet,
        }
    }

    pub(crate) fn duplicate_person(external_id: &str) -> Self {
        DebtorError::Duplicate(format!(
            "external person id `{}` is already registered",
            external_id
        ))
    }
}

pub type Result<T> = StdResult<T, DebtorError>;

impl From<rusqlite::Error> for DebtorError {
    fn from(err: rusqlite::Error) -> Self {
        if is_unique_violation(&err) {
            DebtorError::Duplicate("external person id is already registered".into())
        } else {
            DebtorError::Storage(err.to_string())
        }
    }
}

/// Detects a UNIQUE constraint failure raised by SQLite while executing or committing.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == rusqlite::ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}

impl From<std::io::Error> for DebtorError {
    fn from(err: std::io::Error) -> Self {
        DebtorError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DebtorError {
    fn from(err: serde_json::Error) -> Self {
        DebtorError::Config(err.to_string())
    }
}

impl From<csv::Error> for DebtorError {
    fn from(err: csv::Error) -> Self {
        DebtorError::Spreadsheet(err.to_string())
    }
}

impl From<calamine::Error> for DebtorError {
    fn from(err: calamine::Error) -> Self {
        DebtorError::Spreadsheet(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for DebtorError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        DebtorError::Spreadsheet(err.to_string())
    }
}
