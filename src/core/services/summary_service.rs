use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{CollectionPhase, CollectionStatus, Debtor};

/// Headline figures for the collections dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub total_debtors: usize,
    pub per_status: BTreeMap<CollectionStatus, usize>,
    pub per_phase: BTreeMap<CollectionPhase, usize>,
    pub total_owed: Decimal,
    pub open_owed: Decimal,
    pub mean_overdue_days: Option<Decimal>,
    /// Share of paid debtors, in percent, rounded to one decimal place.
    pub payment_rate: Decimal,
}

pub struct SummaryService;

impl SummaryService {
    pub fn summarize(debtors: &[Debtor]) -> CollectionSummary {
        let mut per_status: BTreeMap<CollectionStatus, usize> =
            CollectionStatus::ALL.iter().map(|status| (*status, 0)).collect();
        let mut per_phase = BTreeMap::new();
        let mut total_owed = Decimal::ZERO;
        let mut open_owed = Decimal::ZERO;
        let mut overdue_sum: u64 = 0;

        for debtor in debtors {
            *per_status.entry(debtor.status()).or_insert(0) += 1;
            *per_phase.entry(debtor.collection_phase()).or_insert(0) += 1;
            // Amounts near `Decimal::MAX` would overflow a plain sum.
            total_owed = total_owed.saturating_add(debtor.total_owed);
            if !debtor.is_paid() {
                open_owed = open_owed.saturating_add(debtor.total_owed);
            }
            overdue_sum += u64::from(debtor.overdue_days);
        }

        let count = debtors.len();
        let mean_overdue_days = (count > 0)
            .then(|| (Decimal::from(overdue_sum) / Decimal::from(count as u64)).round_dp(1));
        let paid = per_status
            .get(&CollectionStatus::Paid)
            .copied()
            .unwrap_or(0);
        let payment_rate = if count == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(paid as u64) * Decimal::ONE_HUNDRED / Decimal::from(count as u64))
                .round_dp(1)
        };

        CollectionSummary {
            total_debtors: count,
            per_status,
            per_phase,
            total_owed,
            open_owed,
            mean_overdue_days,
            payment_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewDebtor;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_collection_has_no_mean() {
        let summary = SummaryService::summarize(&[]);
        assert_eq!(summary.total_debtors, 0);
        assert_eq!(summary.mean_overdue_days, None);
        assert_eq!(summary.payment_rate, Decimal::ZERO);
        assert_eq!(summary.per_status.get(&CollectionStatus::Paid), Some(&0));
    }

    #[test]
    fn huge_amounts_saturate_instead_of_overflowing() {
        let debtors = [
            Debtor::pending(1, NewDebtor::new("Ana", Decimal::MAX, 0)),
            Debtor::pending(2, NewDebtor::new("Bia", Decimal::MAX, 0)),
        ];
        let summary = SummaryService::summarize(&debtors);
        assert_eq!(summary.total_owed, Decimal::MAX);
        assert_eq!(summary.open_owed, Decimal::MAX);
    }

    #[test]
    fn totals_and_rates() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let mut paid = Debtor::pending(1, NewDebtor::new("Ana", dec!(100.50), 10));
        paid.apply_payment(today);
        let open = Debtor::pending(2, NewDebtor::new("Bia", dec!(200), 20));
        let mut scheduled = Debtor::pending(3, NewDebtor::new("Caio", dec!(300), 31));
        scheduled
            .apply_collection(today, NaiveDate::from_ymd_opt(2024, 5, 16).unwrap())
            .unwrap();

        let summary = SummaryService::summarize(&[paid, open, scheduled]);
        assert_eq!(summary.total_debtors, 3);
        assert_eq!(summary.total_owed, dec!(600.50));
        assert_eq!(summary.open_owed, dec!(500));
        assert_eq!(summary.mean_overdue_days, Some(dec!(20.3)));
        assert_eq!(summary.payment_rate, dec!(33.3));
        assert_eq!(summary.per_phase.get(&CollectionPhase::FIRST), Some(&2));
    }
}
