use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::errors::{DebtorError, Result};
use crate::core::utils::ensure_dir;
use crate::domain::Debtor;

use super::import::{COL_AMOUNT, COL_NAME, COL_OVERDUE, COL_PERSON, COL_PHONE};

/// Export columns. The first five reuse the import headers so an export can be re-imported.
pub const EXPORT_COLUMNS: [&str; 11] = [
    COL_PERSON,
    COL_NAME,
    COL_AMOUNT,
    COL_OVERDUE,
    COL_PHONE,
    "id",
    "status",
    "fase_cobranca",
    "data_cobranca",
    "ultima_cobranca",
    "data_pagamento",
];

const DATE_FORMAT: &str = "%Y-%m-%d";
const SHEET_NAME: &str = "Devedores";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    /// Format implied by a file name, if the extension is one we write.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = DebtorError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(DebtorError::Validation(format!(
                "unknown export format `{}`; expected xlsx or csv",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Nothing matched; no file was written.
    Empty,
    Written { rows: usize, path: PathBuf },
}

impl ExportOutcome {
    pub fn message(&self) -> String {
        match self {
            ExportOutcome::Empty => "No debtors to export.".to_string(),
            ExportOutcome::Written { rows, path } => {
                format!("{} debtor(s) exported to {}.", rows, path.display())
            }
        }
    }
}

/// Serializes `debtors` in the given order. Returns `None` for an empty selection.
pub fn export_bytes(debtors: &[Debtor], format: ExportFormat) -> Result<Option<Vec<u8>>> {
    if debtors.is_empty() {
        return Ok(None);
    }
    let bytes = match format {
        ExportFormat::Csv => write_csv(debtors)?,
        ExportFormat::Xlsx => write_xlsx(debtors)?,
    };
    Ok(Some(bytes))
}

pub fn export_to_path(
    debtors: &[Debtor],
    path: &Path,
    format: ExportFormat,
) -> Result<ExportOutcome> {
    let Some(bytes) = export_bytes(debtors, format)? else {
        info!("export skipped: empty selection");
        return Ok(ExportOutcome::Empty);
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    fs::write(path, bytes)?;
    info!(rows = debtors.len(), path = %path.display(), %format, "debtors exported");
    Ok(ExportOutcome::Written {
        rows: debtors.len(),
        path: path.to_path_buf(),
    })
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn text_cells(debtor: &Debtor) -> [String; 11] {
    [
        debtor.external_person_id.clone().unwrap_or_default(),
        debtor.name.clone(),
        debtor.total_owed.to_string(),
        debtor.overdue_days.to_string(),
        debtor.phone.clone().unwrap_or_default(),
        debtor.id.to_string(),
        debtor.status().as_str().to_string(),
        debtor.collection_phase().to_string(),
        format_date(debtor.next_collection_date()),
        format_date(debtor.last_collection_date()),
        format_date(debtor.payment_date()),
    ]
}

fn write_csv(debtors: &[Debtor]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_COLUMNS)?;
    for debtor in debtors {
        writer.write_record(text_cells(debtor))?;
    }
    writer
        .into_inner()
        .map_err(|err| DebtorError::Spreadsheet(err.to_string()))
}

fn write_xlsx(debtors: &[Debtor]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;
    for (col, title) in EXPORT_COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header)?;
    }
    for (index, debtor) in debtors.iter().enumerate() {
        let row = index as u32 + 1;
        let cells = text_cells(debtor);
        for (col, value) in cells.iter().enumerate() {
            let col = col as u16;
            match EXPORT_COLUMNS[col as usize] {
                COL_AMOUNT => {
                    let amount = debtor.total_owed.to_f64().unwrap_or_default();
                    worksheet.write_number(row, col, amount)?;
                }
                COL_OVERDUE => {
                    worksheet.write_number(row, col, f64::from(debtor.overdue_days))?;
                }
                _ if value.is_empty() => {}
                _ => {
                    worksheet.write_string(row, col, value.as_str())?;
                }
            }
        }
    }
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewDebtor;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_selection_is_a_no_op() {
        assert_eq!(export_bytes(&[], ExportFormat::Csv).unwrap(), None);
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.csv");
        let outcome = export_to_path(&[], &target, ExportFormat::Csv).unwrap();
        assert_eq!(outcome, ExportOutcome::Empty);
        assert!(!target.exists());
    }

    #[test]
    fn csv_dates_use_iso_format() {
        let mut debtor = Debtor::pending(
            7,
            NewDebtor::new("Ana Silva", dec!(150.00), 5).with_external_id("P-7"),
        );
        let today = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        debtor
            .apply_collection(today, NaiveDate::from_ymd_opt(2024, 3, 18).unwrap())
            .unwrap();

        let bytes = export_bytes(&[debtor], ExportFormat::Csv).unwrap().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(EXPORT_COLUMNS.join(",").as_str()));
        assert_eq!(
            lines.next(),
            Some("P-7,Ana Silva,150.00,5,,7,scheduled,2,2024-03-18,2024-03-04,")
        );
    }

    #[test]
    fn format_is_inferred_from_extension() {
        assert_eq!(
            ExportFormat::from_path(Path::new("a/b.CSV")),
            Some(ExportFormat::Csv)
        );
        assert_eq!(ExportFormat::from_path(Path::new("report.pdf")), None);
    }
}
