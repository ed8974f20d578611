use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::core::errors::DebtorError;
use crate::domain::Debtor;

/// Inclusive `[min, max]` bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> ValueRange<T> {
    pub fn new(min: T, max: T) -> Self {
        if max < min {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Amount buckets offered as quick filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmountCategory {
    /// Up to 500.
    Small,
    /// Above 500 up to 2000.
    Medium,
    /// Above 2000.
    Large,
}

impl AmountCategory {
    pub fn matches(&self, amount: Decimal) -> bool {
        match self {
            AmountCategory::Small => amount <= dec!(500),
            AmountCategory::Medium => amount > dec!(500) && amount <= dec!(2000),
            AmountCategory::Large => amount > dec!(2000),
        }
    }
}

impl FromStr for AmountCategory {
    type Err = DebtorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "small" => Ok(AmountCategory::Small),
            "medium" => Ok(AmountCategory::Medium),
            "large" => Ok(AmountCategory::Large),
            other => Err(DebtorError::Validation(format!(
                "unknown amount category `{}` (expected small, medium or large)",
                other
            ))),
        }
    }
}

/// Overdue buckets offered as quick filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverdueCategory {
    /// Up to 30 days.
    Starting,
    /// 31 to 90 days.
    Moderate,
    /// 91 to 180 days.
    Late,
    /// More than 180 days.
    Critical,
}

impl OverdueCategory {
    pub fn matches(&self, days: u32) -> bool {
        match self {
            OverdueCategory::Starting => days <= 30,
            OverdueCategory::Moderate => days > 30 && days <= 90,
            OverdueCategory::Late => days > 90 && days <= 180,
            OverdueCategory::Critical => days > 180,
        }
    }
}

impl FromStr for OverdueCategory {
    type Err = DebtorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "starting" => Ok(OverdueCategory::Starting),
            "moderate" => Ok(OverdueCategory::Moderate),
            "late" => Ok(OverdueCategory::Late),
            "critical" => Ok(OverdueCategory::Critical),
            other => Err(DebtorError::Validation(format!(
                "unknown overdue category `{}` (expected starting, moderate, late or critical)",
                other
            ))),
        }
    }
}

/// Observed minimum and maximum of the filterable numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterBounds {
    pub amount: ValueRange<Decimal>,
    pub overdue: ValueRange<u32>,
}

impl FilterBounds {
    /// Scans the collection; an empty collection yields `0..0` for both ranges.
    pub fn observe(records: &[Debtor]) -> Self {
        let mut iter = records.iter();
        let Some(first) = iter.next() else {
            return Self {
                amount: ValueRange::new(Decimal::ZERO, Decimal::ZERO),
                overdue: ValueRange::new(0, 0),
            };
        };
        let mut amount = ValueRange::new(first.total_owed, first.total_owed);
        let mut overdue = ValueRange::new(first.overdue_days, first.overdue_days);
        for debtor in iter {
            amount.min = amount.min.min(debtor.total_owed);
            amount.max = amount.max.max(debtor.total_owed);
            overdue.min = overdue.min.min(debtor.overdue_days);
            overdue.max = overdue.max.max(debtor.overdue_days);
        }
        Self { amount, overdue }
    }

    /// Criteria that restrict nothing: full observed ranges, no categories, no search.
    pub fn unrestricted(&self) -> FilterCriteria {
        FilterCriteria {
            amount_range: Some(self.amount),
            overdue_range: Some(self.overdue),
            ..FilterCriteria::default()
        }
    }
}

/// Request-scoped filter selection. All parts are ANDed; categories within a set are ORed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub amount_range: Option<ValueRange<Decimal>>,
    pub overdue_range: Option<ValueRange<u32>>,
    #[serde(default)]
    pub amount_categories: Vec<AmountCategory>,
    #[serde(default)]
    pub overdue_categories: Vec<OverdueCategory>,
    #[serde(default)]
    pub search: Option<String>,
}

impl FilterCriteria {
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_amount_range(mut self, min: Decimal, max: Decimal) -> Self {
        self.amount_range = Some(ValueRange::new(min, max));
        self
    }

    pub fn with_overdue_range(mut self, min: u32, max: u32) -> Self {
        self.overdue_range = Some(ValueRange::new(min, max));
        self
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }
}

pub struct FilterService;

impl FilterService {
    /// Returns the matching debtors in their original order.
    ///
    /// A range equal to the collection's observed range does not restrict anything, so the
    /// default slider positions always yield the full collection.
    pub fn apply(records: &[Debtor], criteria: &FilterCriteria) -> Vec<Debtor> {
        if records.is_empty() {
            return Vec::new();
        }
        let bounds = FilterBounds::observe(records);
        let amount_range = criteria
            .amount_range
            .filter(|range| *range != bounds.amount);
        let overdue_range = criteria
            .overdue_range
            .filter(|range| *range != bounds.overdue);
        let term = criteria.search_term();

        records
            .iter()
            .filter(|debtor| amount_range.map_or(true, |range| range.contains(debtor.total_owed)))
            .filter(|debtor| {
                overdue_range.map_or(true, |range| range.contains(debtor.overdue_days))
            })
            .filter(|debtor| {
                criteria.amount_categories.is_empty()
                    || criteria
                        .amount_categories
                        .iter()
                        .any(|category| category.matches(debtor.total_owed))
            })
            .filter(|debtor| {
                criteria.overdue_categories.is_empty()
                    || criteria
                        .overdue_categories
                        .iter()
                        .any(|category| category.matches(debtor.overdue_days))
            })
            .filter(|debtor| term.as_deref().map_or(true, |term| matches_term(debtor, term)))
            .cloned()
            .collect()
    }
}

fn matches_term(debtor: &Debtor, term: &str) -> bool {
    debtor.name.to_lowercase().contains(term)
        || debtor
            .external_person_id
            .as_deref()
            .map_or(false, |external| external.to_lowercase().contains(term))
}
