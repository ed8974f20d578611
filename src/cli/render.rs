//! Plain-text rendering of debtor tables, detail views and the collection calendar.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::cli::output::current_preferences;
use crate::core::services::{CollectionSummary, Week};
use crate::domain::Debtor;

const DEFAULT_TERMINAL_WIDTH: usize = 100;
const DATE_FORMAT: &str = "%d/%m/%Y";
const WEEKDAY_HEADER: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableColumn {
    pub header: &'static str,
    pub min_width: usize,
    pub max_width: Option<usize>,
    pub alignment: Alignment,
}

impl TableColumn {
    const fn new(header: &'static str, alignment: Alignment) -> Self {
        Self {
            header,
            min_width: 0,
            max_width: None,
            alignment,
        }
    }
}

pub struct Table {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn compute_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let mut width = column.header.chars().count().max(column.min_width);
                for row in &self.rows {
                    if let Some(cell) = row.get(idx) {
                        width = width.max(cell.chars().count());
                    }
                }
                column.max_width.map_or(width, |max| width.min(max))
            })
            .collect()
    }

    fn render_row(&self, row: &[String], widths: &[usize]) -> String {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let text = row.get(idx).map(String::as_str).unwrap_or("");
                render_cell(text, widths[idx], column.alignment)
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    }

    pub fn render(&self) -> String {
        let widths = self.compute_widths();
        let header: Vec<String> = self.columns.iter().map(|c| c.header.to_string()).collect();
        let mut lines = vec![self.render_row(&header, &widths), horizontal_rule(&widths)];
        lines.extend(self.rows.iter().map(|row| self.render_row(row, &widths)));
        lines.join("\n")
    }
}

fn truncate_text(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut fitted: String = text.chars().take(width - 1).collect();
    fitted.push('~');
    fitted
}

pub fn render_cell(text: &str, width: usize, alignment: Alignment) -> String {
    let fitted = truncate_text(text, width);
    match alignment {
        Alignment::Left => format!("{:<width$}", fitted, width = width),
        Alignment::Right => format!("{:>width$}", fitted, width = width),
    }
}

pub fn horizontal_rule(widths: &[usize]) -> String {
    let total: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * 2;
    let ch = if current_preferences().plain_mode { '-' } else { '─' };
    ch.to_string().repeat(total)
}

/// Terminal columns, falling back to a fixed width when stdout is not a terminal.
pub fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _)| cols as usize)
        .ok()
        .filter(|cols| *cols > 0)
        .unwrap_or(DEFAULT_TERMINAL_WIDTH)
}

pub fn format_money(amount: Decimal) -> String {
    format!("R$ {:.2}", amount.round_dp(2))
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Numbered listing; `first_position` is the 1-based rank of the first row.
pub fn debtor_table(debtors: &[Debtor], first_position: usize, width: usize) -> String {
    let mut name = TableColumn::new("Name", Alignment::Left);
    // Remaining columns take roughly 80 characters.
    name.max_width = Some(width.saturating_sub(80).max(12));
    let columns = vec![
        TableColumn::new("#", Alignment::Right),
        TableColumn::new("ID", Alignment::Right),
        name,
        TableColumn::new("Person", Alignment::Left),
        TableColumn::new("Owed", Alignment::Right),
        TableColumn::new("Overdue", Alignment::Right),
        TableColumn::new("Status", Alignment::Left),
        TableColumn::new("Phase", Alignment::Right),
        TableColumn::new("Next", Alignment::Left),
    ];
    let rows = debtors
        .iter()
        .enumerate()
        .map(|(offset, debtor)| {
            vec![
                (first_position + offset).to_string(),
                debtor.id.to_string(),
                debtor.name.clone(),
                debtor.external_person_id.clone().unwrap_or_default(),
                format_money(debtor.total_owed),
                format!("{}d", debtor.overdue_days),
                debtor.status().to_string(),
                debtor.collection_phase().to_string(),
                format_date(debtor.next_collection_date()),
            ]
        })
        .collect();
    Table { columns, rows }.render()
}

pub fn debtor_detail(debtor: &Debtor) -> Vec<String> {
    let fields = [
        ("ID", debtor.id.to_string()),
        ("Name", debtor.name.clone()),
        (
            "Person",
            debtor.external_person_id.clone().unwrap_or_else(|| "-".into()),
        ),
        ("Owed", format_money(debtor.total_owed)),
        ("Overdue", format!("{} days", debtor.overdue_days)),
        ("Phone", debtor.phone.clone().unwrap_or_else(|| "-".into())),
        ("Status", debtor.status().to_string()),
        ("Phase", format!("{} of 3", debtor.collection_phase())),
        ("Next", format_date(debtor.next_collection_date())),
        ("Last", format_date(debtor.last_collection_date())),
        ("Paid on", format_date(debtor.payment_date())),
    ];
    fields
        .iter()
        .map(|(label, value)| format!("  {:<8} {}", label, value))
        .collect()
}

/// Month grid with event counts next to each day, e.g. `15(2)`. `today` is bracketed.
pub fn calendar_text(
    year: i32,
    month: u32,
    weeks: &[Week],
    events: &BTreeMap<u32, usize>,
    today: NaiveDate,
) -> String {
    let title = MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?");
    let mut lines = vec![format!("{} {}", title, year)];
    lines.push(
        WEEKDAY_HEADER
            .iter()
            .map(|day| format!("{:>7}", day))
            .collect::<String>()
            .trim_end()
            .to_string(),
    );
    let is_current = today.year() == year && today.month() == month;
    for week in weeks {
        let line: String = week
            .iter()
            .map(|cell| {
                let Some(day) = cell else {
                    return format!("{:>7}", "");
                };
                let mut label = if is_current && today.day() == *day {
                    format!("[{}]", day)
                } else {
                    day.to_string()
                };
                if let Some(count) = events.get(day) {
                    label.push_str(&format!("({})", count));
                }
                format!("{:>7}", label)
            })
            .collect();
        lines.push(line.trim_end().to_string());
    }
    let total: usize = events.values().sum();
    lines.push(format!("{} scheduled collection(s) this month.", total));
    lines.join("\n")
}

pub fn summary_lines(summary: &CollectionSummary) -> Vec<String> {
    let mut lines = vec![
        format!("  Debtors        {}", summary.total_debtors),
        format!("  Total owed     {}", format_money(summary.total_owed)),
        format!("  Still open     {}", format_money(summary.open_owed)),
        format!(
            "  Mean overdue   {}",
            summary
                .mean_overdue_days
                .map_or_else(|| "-".to_string(), |days| format!("{} days", days))
        ),
        format!("  Payment rate   {}%", summary.payment_rate),
    ];
    for (status, count) in &summary.per_status {
        lines.push(format!("  {:<14} {}", status.to_string(), count));
    }
    for (phase, count) in &summary.per_phase {
        lines.push(format!("  Phase {:<8} {}", phase.to_string(), count));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewDebtor;
    use rust_decimal_macros::dec;

    #[test]
    fn cells_are_truncated_to_width() {
        assert_eq!(render_cell("Ana Beatriz", 5, Alignment::Left), "Ana ~");
        assert_eq!(render_cell("42", 4, Alignment::Right), "  42");
    }

    #[test]
    fn money_uses_two_decimals() {
        assert_eq!(format_money(dec!(150)), "R$ 150.00");
        assert_eq!(format_money(dec!(10.505)), "R$ 10.50");
    }

    #[test]
    fn table_rows_have_no_trailing_spaces() {
        let debtors = vec![Debtor::pending(1, NewDebtor::new("Ana", dec!(10), 3))];
        let table = debtor_table(&debtors, 1, 100);
        assert!(table.lines().all(|line| !line.ends_with(' ')));
        assert!(table.contains("R$ 10.00"));
    }
}
