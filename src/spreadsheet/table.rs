use std::{fs, path::Path};

use calamine::{open_workbook_auto, Data, Reader};

use crate::core::errors::{DebtorError, Result};

/// A header row plus data rows, every cell already rendered as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Headers are compared trimmed and lowercased.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        if rows.is_empty() {
            return Table::default();
        }
        let headers = rows
            .remove(0)
            .into_iter()
            .map(|header| header.trim_start_matches('\u{feff}').trim().to_lowercase())
            .collect();
        rows.retain(|row| row.iter().any(|cell| !cell.trim().is_empty()));
        Table { headers, rows }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

/// Reads the first sheet of a spreadsheet file. The format is chosen from the extension.
pub fn read_table(path: &Path) -> Result<Table> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "csv" | "tsv" | "txt" => {
            let content = read_text(path)?;
            read_delimited(&content)
        }
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path),
        other => Err(DebtorError::Spreadsheet(format!(
            "unsupported file type `{}`; expected csv, xlsx, xls or ods",
            other
        ))),
    }
}

/// UTF-8 first, then Windows-1252 (what spreadsheet tools commonly emit for CSV).
fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(err.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}

pub fn read_delimited(content: &str) -> Result<Table> {
    let delimiter = sniff_delimiter(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(Table::from_rows(rows))
}

/// Picks the candidate producing the most consistent field count (> 1) over the first lines.
fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content.lines().take(10).collect();
    let mut best = b',';
    let mut best_score = 0usize;
    for candidate in [b',', b';', b'\t'] {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(candidate)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|record| record.ok())
                    .map_or(1, |record| record.len())
            })
            .collect();
        let Some(&target) = counts.first() else {
            continue;
        };
        if target <= 1 {
            continue;
        }
        let score = counts.iter().filter(|&&count| count == target).count() * target;
        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }
    best
}

fn read_workbook(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| DebtorError::Spreadsheet("workbook contains no sheets".into()))?;
    let range = workbook.worksheet_range(&first)?;
    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    Ok(Table::from_rows(rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        // Whole numbers are printed without a fraction so ids like `1042` stay intact.
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Data::Float(value) => fractional_text(*value),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string().to_uppercase(),
        Data::Error(err) => format!("#{:?}", err),
        Data::DateTime(value) => value.as_f64().to_string(),
        Data::DateTimeIso(text) | Data::DurationIso(text) => text.clone(),
    }
}

fn fractional_text(value: f64) -> String {
    let text = value.to_string();
    // Exactly three fractional digits would read back as a thousands group.
    match text.split_once('.') {
        Some((_, fraction)) if fraction.len() == 3 => format!("{}0", text),
        _ => text,
    }
}
