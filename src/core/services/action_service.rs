use std::{cmp::Ordering, str::FromStr};

use chrono::NaiveDate;

use crate::core::errors::DebtorError;
use crate::domain::Debtor;

/// Column used to order the action queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    Id,
    #[default]
    Name,
    TotalOwed,
    OverdueDays,
    NextCollection,
}

impl FromStr for SortKey {
    type Err = DebtorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "id" => Ok(SortKey::Id),
            "name" => Ok(SortKey::Name),
            "amount" | "total_owed" => Ok(SortKey::TotalOwed),
            "overdue" | "overdue_days" => Ok(SortKey::OverdueDays),
            "next" | "next_collection" => Ok(SortKey::NextCollection),
            other => Err(DebtorError::Validation(format!("unknown sort key `{}`", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

pub struct ActionService;

impl ActionService {
    /// Debtors needing collection work on `today`: every pending debtor plus scheduled
    /// debtors whose date has arrived. An optional name filter narrows the queue.
    pub fn actions_due(
        debtors: &[Debtor],
        today: NaiveDate,
        name_filter: Option<&str>,
        key: SortKey,
        order: SortOrder,
    ) -> Vec<Debtor> {
        let needle = name_filter
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);
        let mut due: Vec<Debtor> = debtors
            .iter()
            .filter(|debtor| debtor.requires_action(today))
            .filter(|debtor| {
                needle
                    .as_deref()
                    .map_or(true, |term| debtor.name.to_lowercase().contains(term))
            })
            .cloned()
            .collect();
        due.sort_by(|a, b| {
            let ordering = compare(a, b, key).then_with(|| a.id.cmp(&b.id));
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
        due
    }
}

fn compare(a: &Debtor, b: &Debtor, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => a.id.cmp(&b.id),
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::TotalOwed => a.total_owed.cmp(&b.total_owed),
        SortKey::OverdueDays => a.overdue_days.cmp(&b.overdue_days),
        // Undated (pending) debtors come first: they have waited longest for a first contact.
        SortKey::NextCollection => a.next_collection_date().cmp(&b.next_collection_date()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewDebtor;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixtures() -> Vec<Debtor> {
        let pending = Debtor::pending(1, NewDebtor::new("Zeca", dec!(300), 10));
        let mut due = Debtor::pending(2, NewDebtor::new("Ana", dec!(900), 40));
        due.apply_collection(date(2024, 3, 1), date(2024, 3, 10)).unwrap();
        let mut later = Debtor::pending(3, NewDebtor::new("Bia", dec!(50), 5));
        later.apply_collection(date(2024, 3, 1), date(2024, 3, 20)).unwrap();
        let mut paid = Debtor::pending(4, NewDebtor::new("Caio", dec!(70), 2));
        paid.apply_payment(date(2024, 3, 2));
        vec![pending, due, later, paid]
    }

    #[test]
    fn queue_contains_pending_and_overdue_schedules() {
        let queue = ActionService::actions_due(
            &fixtures(),
            date(2024, 3, 12),
            None,
            SortKey::Name,
            SortOrder::Ascending,
        );
        let ids: Vec<_> = queue.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn queue_sorts_descending_by_amount() {
        let queue = ActionService::actions_due(
            &fixtures(),
            date(2024, 3, 25),
            None,
            SortKey::TotalOwed,
            SortOrder::Descending,
        );
        let ids: Vec<_> = queue.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn name_filter_narrows_queue() {
        let queue = ActionService::actions_due(
            &fixtures(),
            date(2024, 3, 25),
            Some("ZE"),
            SortKey::Id,
            SortOrder::Ascending,
        );
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].name, "Zeca");
        assert!("bogus".parse::<SortKey>().is_err());
    }
}
