use std::{collections::HashSet, fmt, path::Path, str::FromStr};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::errors::{DebtorError, Result};
use crate::domain::{normalize_person_key, NewDebtor};
use crate::storage::DebtorStore;

use super::table::{read_table, Table};

pub const COL_PERSON: &str = "pessoa";
pub const COL_NAME: &str = "nome";
pub const COL_AMOUNT: &str = "valortotal";
pub const COL_OVERDUE: &str = "atraso";
pub const COL_MOBILE: &str = "celular1";
pub const COL_PHONE: &str = "telefone";

const REQUIRED_COLUMNS: [&str; 4] = [COL_PERSON, COL_NAME, COL_AMOUNT, COL_OVERDUE];

/// Upper bound on the skipped rows kept as samples in an [`ImportSummary`].
pub const MAX_SKIP_SAMPLES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    MissingIdentifier,
    Duplicate,
    MissingName,
    InvalidAmount,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkipReason::MissingIdentifier => "missing identifier",
            SkipReason::Duplicate => "duplicate",
            SkipReason::MissingName => "missing name",
            SkipReason::InvalidAmount => "invalid amount",
        };
        f.write_str(label)
    }
}

/// A skipped row; `line` is the 1-based spreadsheet line, header included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub samples: Vec<SkippedRow>,
}

impl ImportSummary {
    fn skip(&mut self, line: usize, reason: SkipReason) {
        self.skipped += 1;
        if self.samples.len() < MAX_SKIP_SAMPLES {
            self.samples.push(SkippedRow { line, reason });
        }
    }

    pub fn message(&self) -> String {
        format!(
            "{} debtor(s) imported, {} row(s) skipped.",
            self.imported, self.skipped
        )
    }
}

/// Imports the first sheet of `path` into `store` as pending debtors.
pub fn import_file(store: &dyn DebtorStore, path: &Path) -> Result<ImportSummary> {
    let table = read_table(path)?;
    debug!(path = %path.display(), rows = table.rows.len(), "spreadsheet read");
    import_table(store, &table)
}

/// Validates the rows of `table` and inserts the accepted ones in a single batch.
///
/// Row-level problems are counted and sampled; only missing required columns or a storage
/// failure abort the import, in which case nothing is written.
pub fn import_table(store: &dyn DebtorStore, table: &Table) -> Result<ImportSummary> {
    let layout = ColumnLayout::resolve(table)?;
    let mut seen = store.person_keys()?;
    let mut summary = ImportSummary::default();
    let mut accepted = Vec::new();

    for (index, row) in table.rows.iter().enumerate() {
        let line = index + 2;
        match layout.parse_row(row, &mut seen) {
            Ok(record) => accepted.push(record),
            Err(reason) => summary.skip(line, reason),
        }
    }

    summary.imported = if accepted.is_empty() {
        0
    } else {
        store.create_many(&accepted)?
    };
    info!(
        imported = summary.imported,
        skipped = summary.skipped,
        "spreadsheet imported"
    );
    Ok(summary)
}

struct ColumnLayout {
    person: usize,
    name: usize,
    amount: usize,
    overdue: usize,
    mobile: Option<usize>,
    phone: Option<usize>,
}

impl ColumnLayout {
    fn resolve(table: &Table) -> Result<Self> {
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| table.column(column).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(DebtorError::Spreadsheet(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }
        let required = |name: &str| table.column(name).unwrap_or_default();
        Ok(Self {
            person: required(COL_PERSON),
            name: required(COL_NAME),
            amount: required(COL_AMOUNT),
            overdue: required(COL_OVERDUE),
            mobile: table.column(COL_MOBILE),
            phone: table.column(COL_PHONE),
        })
    }

    fn parse_row(
        &self,
        row: &[String],
        seen: &mut HashSet<String>,
    ) -> std::result::Result<NewDebtor, SkipReason> {
        let cell = |index: usize| row.get(index).map(|text| text.trim()).unwrap_or("");

        let person = cell(self.person);
        let key = normalize_person_key(person).ok_or(SkipReason::MissingIdentifier)?;
        if seen.contains(&key) {
            return Err(SkipReason::Duplicate);
        }
        let name = cell(self.name);
        if name.is_empty() {
            return Err(SkipReason::MissingName);
        }
        let total_owed = parse_amount(cell(self.amount)).ok_or(SkipReason::InvalidAmount)?;
        seen.insert(key);

        let phone = self
            .mobile
            .and_then(|index| clean_phone(cell(index)))
            .or_else(|| self.phone.and_then(|index| clean_phone(cell(index))));

        Ok(NewDebtor {
            name: name.to_string(),
            total_owed,
            overdue_days: parse_days(cell(self.overdue)),
            phone,
            external_person_id: Some(person.to_string()),
        })
    }
}

/// Reads `1234.56`, `1.234,56`, `1,234.56`, `R$ 10,50` and dot-grouped thousands such as
/// `1.500` or `2.000.000`. A blank cell is zero; unreadable or negative amounts are `None`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Some(Decimal::ZERO);
    }
    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if cleaned.matches(',').count() > 1 => {
            if !is_thousands_grouped(&cleaned, ',') {
                return None;
            }
            cleaned.replace(',', "")
        }
        (Some(_), None) => cleaned.replace(',', "."),
        (None, Some(_)) if is_thousands_grouped(&cleaned, '.') => cleaned.replace('.', ""),
        _ => cleaned,
    };
    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .ok()
        .filter(|amount| !amount.is_sign_negative())
}

/// True for `1.500` or `12.345.678`: a leading group of one to three digits without a
/// leading zero, followed by one or more groups of exactly three digits.
fn is_thousands_grouped(value: &str, separator: char) -> bool {
    let digits = |group: &str| group.chars().all(|ch| ch.is_ascii_digit());
    let mut groups = value.split(separator);
    let Some(head) = groups.next() else {
        return false;
    };
    if !(1..=3).contains(&head.len()) || !digits(head) || head.starts_with('0') {
        return false;
    }
    let tail: Vec<&str> = groups.collect();
    !tail.is_empty() && tail.iter().all(|group| group.len() == 3 && digits(group))
}

/// Whole days; fractional cells are truncated and anything unreadable is zero.
pub fn parse_days(raw: &str) -> u32 {
    let trimmed = raw.trim();
    trimmed.parse::<u32>().unwrap_or_else(|_| {
        trimmed
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|days| days.is_finite() && *days > 0.0)
            .map_or(0, |days| days.min(u32::MAX as f64) as u32)
    })
}

/// Placeholders without a single digit (`-`, `( )`, `n/a`) are treated as absent.
pub fn clean_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    trimmed
        .chars()
        .any(|ch| ch.is_ascii_digit())
        .then(|| trimmed.to_string())
}
