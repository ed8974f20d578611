use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::core::errors::DebtorError;
use crate::domain::{CollectionStatus, Debtor};

use super::ServiceResult;

/// One calendar row, Sunday first; `None` pads days outside the month.
pub type Week = [Option<u32>; 7];

/// Read-only grouping of scheduled collections for calendar display.
pub struct CalendarService;

impl CalendarService {
    /// Counts, per day of month, the non-paid debtors whose next collection falls in
    /// `year`/`month`. Days without events are absent from the map.
    pub fn events_for_month(debtors: &[Debtor], year: i32, month: u32) -> BTreeMap<u32, usize> {
        let mut events = BTreeMap::new();
        for debtor in debtors.iter().filter(|debtor| !debtor.is_paid()) {
            if let Some(date) = debtor.next_collection_date() {
                if date.year() == year && date.month() == month {
                    *events.entry(date.day()).or_insert(0) += 1;
                }
            }
        }
        events
    }

    /// Scheduled debtors due on `date`, ordered by name.
    pub fn scheduled_on(debtors: &[Debtor], date: NaiveDate) -> Vec<Debtor> {
        let mut due: Vec<Debtor> = debtors
            .iter()
            .filter(|debtor| {
                debtor.status() == CollectionStatus::Scheduled
                    && debtor.next_collection_date() == Some(date)
            })
            .cloned()
            .collect();
        due.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        due
    }

    /// Lays out the month as Sunday-first weeks.
    pub fn month_grid(year: i32, month: u32) -> ServiceResult<Vec<Week>> {
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            DebtorError::Validation(format!("invalid calendar month {}-{:02}", year, month))
        })?;
        let days = days_in_month(first);
        let offset = first.weekday().num_days_from_sunday() as usize;

        let mut weeks = Vec::new();
        let mut week: Week = [None; 7];
        let mut slot = offset;
        for day in 1..=days {
            week[slot] = Some(day);
            slot += 1;
            if slot == 7 {
                weeks.push(week);
                week = [None; 7];
                slot = 0;
            }
        }
        if slot > 0 {
            weeks.push(week);
        }
        Ok(weeks)
    }
}

fn days_in_month(first: NaiveDate) -> u32 {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewDebtor;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn scheduled(id: i64, name: &str, on: NaiveDate) -> Debtor {
        let mut debtor = Debtor::pending(id, NewDebtor::new(name, dec!(10), 0));
        debtor.apply_collection(date(2024, 1, 1), on).unwrap();
        debtor
    }

    #[test]
    fn counts_events_per_day_excluding_paid() {
        let mut paid = scheduled(3, "Carla", date(2024, 3, 15));
        paid.apply_payment(date(2024, 3, 1));
        // Stale date left behind by older data.
        paid.next_collection_date = Some(date(2024, 3, 15));

        let debtors = vec![
            scheduled(1, "Ana", date(2024, 3, 15)),
            scheduled(2, "Bruno", date(2024, 3, 15)),
            paid,
            scheduled(4, "Davi", date(2024, 3, 20)),
            scheduled(5, "Eva", date(2024, 4, 15)),
            Debtor::pending(6, NewDebtor::new("Fabio", dec!(1), 0)),
        ];
        let events = CalendarService::events_for_month(&debtors, 2024, 3);
        assert_eq!(events.into_iter().collect::<Vec<_>>(), vec![(15, 2), (20, 1)]);
    }

    #[test]
    fn scheduled_on_sorts_by_name() {
        let debtors = vec![
            scheduled(1, "bruno", date(2024, 3, 15)),
            scheduled(2, "Ana", date(2024, 3, 15)),
            scheduled(3, "Carla", date(2024, 3, 16)),
        ];
        let due = CalendarService::scheduled_on(&debtors, date(2024, 3, 15));
        let names: Vec<_> = due.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "bruno"]);
    }

    #[test]
    fn month_grid_starts_on_sunday() {
        // March 2024 starts on a Friday and has 31 days.
        let weeks = CalendarService::month_grid(2024, 3).unwrap();
        assert_eq!(weeks.len(), 6);
        assert_eq!(weeks[0][5], Some(1));
        assert_eq!(weeks[0][4], None);
        assert_eq!(weeks[5][0], Some(31));
        assert!(CalendarService::month_grid(2024, 13).is_err());
    }

    #[test]
    fn february_leap_year() {
        let weeks = CalendarService::month_grid(2024, 2).unwrap();
        let last = weeks.iter().flatten().flatten().max().copied();
        assert_eq!(last, Some(29));
    }
}
