use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::errors::{DebtorError, Result};
use crate::domain::common::{
    clean_optional, normalize_person_key, DebtorId, Displayable, Identifiable,
};

/// Collection status of a debtor. `Paid` is terminal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionStatus {
    #[default]
    Pending,
    Scheduled,
    Paid,
}

impl CollectionStatus {
    pub const ALL: [CollectionStatus; 3] = [
        CollectionStatus::Pending,
        CollectionStatus::Scheduled,
        CollectionStatus::Paid,
    ];

    /// Stable token used in the database and in exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionStatus::Pending => "pending",
            CollectionStatus::Scheduled => "scheduled",
            CollectionStatus::Paid => "paid",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CollectionStatus::Paid)
    }
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CollectionStatus::Pending => "Pending",
            CollectionStatus::Scheduled => "Scheduled",
            CollectionStatus::Paid => "Paid",
        };
        f.write_str(label)
    }
}

impl FromStr for CollectionStatus {
    type Err = DebtorError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "pending" | "pendente" | "open" | "aberto" => Ok(CollectionStatus::Pending),
            "scheduled" | "agendado" => Ok(CollectionStatus::Scheduled),
            "paid" | "pago" => Ok(CollectionStatus::Paid),
            other => Err(DebtorError::Validation(format!(
                "unknown collection status `{}`",
                other
            ))),
        }
    }
}

/// Escalation step of the collection workflow, always within `1..=3`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CollectionPhase(u8);

impl CollectionPhase {
    pub const FIRST: CollectionPhase = CollectionPhase(1);
    pub const LAST: CollectionPhase = CollectionPhase(3);

    pub fn new(value: u8) -> Option<Self> {
        (Self::FIRST.0..=Self::LAST.0)
            .contains(&value)
            .then_some(CollectionPhase(value))
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Next phase, saturating at the last one.
    pub fn advance(self) -> Self {
        CollectionPhase((self.0 + 1).min(Self::LAST.0))
    }
}

impl Default for CollectionPhase {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for CollectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A person or entity owing money, together with its collection progress.
///
/// Status, phase and the three dates are only changed through the lifecycle
/// transitions below, which the lifecycle service drives inside a store transaction.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Debtor {
    pub id: DebtorId,
    pub external_person_id: Option<String>,
    pub name: String,
    pub total_owed: Decimal,
    pub overdue_days: u32,
    pub phone: Option<String>,
    pub(crate) status: CollectionStatus,
    pub(crate) next_collection_date: Option<NaiveDate>,
    pub(crate) last_collection_date: Option<NaiveDate>,
    pub(crate) payment_date: Option<NaiveDate>,
    pub(crate) collection_phase: CollectionPhase,
}

impl Debtor {
    /// Materializes a freshly created record: pending, first phase, no dates.
    pub fn pending(id: DebtorId, record: NewDebtor) -> Self {
        Self {
            id,
            external_person_id: record.external_person_id,
            name: record.name,
            total_owed: record.total_owed,
            overdue_days: record.overdue_days,
            phone: record.phone,
            status: CollectionStatus::Pending,
            next_collection_date: None,
            last_collection_date: None,
            payment_date: None,
            collection_phase: CollectionPhase::FIRST,
        }
    }

    pub fn status(&self) -> CollectionStatus {
        self.status
    }

    pub fn collection_phase(&self) -> CollectionPhase {
        self.collection_phase
    }

    pub fn next_collection_date(&self) -> Option<NaiveDate> {
        self.next_collection_date
    }

    pub fn last_collection_date(&self) -> Option<NaiveDate> {
        self.last_collection_date
    }

    pub fn payment_date(&self) -> Option<NaiveDate> {
        self.payment_date
    }

    pub fn is_paid(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn person_key(&self) -> Option<String> {
        self.external_person_id
            .as_deref()
            .and_then(normalize_person_key)
    }

    /// Pending debtors and scheduled debtors whose date has arrived need work today.
    pub fn requires_action(&self, today: NaiveDate) -> bool {
        match self.status {
            CollectionStatus::Pending => true,
            CollectionStatus::Scheduled => self
                .next_collection_date
                .map_or(false, |date| date <= today),
            CollectionStatus::Paid => false,
        }
    }

    pub(crate) fn apply_payment(&mut self, today: NaiveDate) {
        self.status = CollectionStatus::Paid;
        self.payment_date = Some(today);
        self.next_collection_date = None;
    }

    pub(crate) fn apply_collection(&mut self, today: NaiveDate, next: NaiveDate) -> Result<()> {
        if self.is_paid() {
            return Err(DebtorError::Validation(format!(
                "debtor `{}` is already paid; collections can no longer be recorded",
                self.name
            )));
        }
        if next < today {
            return Err(DebtorError::Validation(format!(
                "next collection date {} is before today ({})",
                next, today
            )));
        }
        self.last_collection_date = Some(today);
        self.next_collection_date = Some(next);
        self.collection_phase = self.collection_phase.advance();
        self.status = CollectionStatus::Scheduled;
        Ok(())
    }

    pub(crate) fn apply_changes(&mut self, changes: &DebtorChanges) {
        if let Some(name) = &changes.name {
            self.name = name.trim().to_string();
        }
        if let Some(amount) = changes.total_owed {
            self.total_owed = amount;
        }
        if let Some(days) = changes.overdue_days {
            self.overdue_days = days;
        }
        if let Some(phone) = &changes.phone {
            self.phone = clean_optional(phone.as_deref());
        }
        if let Some(external) = &changes.external_person_id {
            self.external_person_id = clean_optional(external.as_deref());
        }
    }

    /// Rebuilds a record from persisted columns; used by storage backends only.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: DebtorId,
        external_person_id: Option<String>,
        name: String,
        total_owed: Decimal,
        overdue_days: u32,
        phone: Option<String>,
        status: CollectionStatus,
        next_collection_date: Option<NaiveDate>,
        last_collection_date: Option<NaiveDate>,
        payment_date: Option<NaiveDate>,
        collection_phase: CollectionPhase,
    ) -> Self {
        Self {
            id,
            external_person_id,
            name,
            total_owed,
            overdue_days,
            phone,
            status,
            next_collection_date,
            last_collection_date,
            payment_date,
            collection_phase,
        }
    }
}

impl Identifiable for Debtor {
    fn id(&self) -> DebtorId {
        self.id
    }
}

impl Displayable for Debtor {
    fn display_label(&self) -> String {
        match &self.external_person_id {
            Some(external) => format!("{} (#{}, {})", self.name, self.id, external),
            None => format!("{} (#{})", self.name, self.id),
        }
    }
}

/// Input for creating a debtor, either typed by an operator or read from a spreadsheet row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewDebtor {
    pub name: String,
    pub total_owed: Decimal,
    pub overdue_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_person_id: Option<String>,
}

impl NewDebtor {
    pub fn new(name: impl Into<String>, total_owed: Decimal, overdue_days: u32) -> Self {
        Self {
            name: name.into(),
            total_owed,
            overdue_days,
            phone: None,
            external_person_id: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_external_id(mut self, external: impl Into<String>) -> Self {
        self.external_person_id = Some(external.into());
        self
    }

    /// Trims text fields and drops blank optional values.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.phone = clean_optional(self.phone.as_deref());
        self.external_person_id = clean_optional(self.external_person_id.as_deref());
        self
    }

    pub fn person_key(&self) -> Option<String> {
        self.external_person_id
            .as_deref()
            .and_then(normalize_person_key)
    }
}

/// Partial update of the descriptive fields. Lifecycle fields are deliberately absent.
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebtorChanges {
    pub name: Option<String>,
    pub total_owed: Option<Decimal>,
    pub overdue_days: Option<u32>,
    pub phone: Option<Option<String>>,
    pub external_person_id: Option<Option<String>>,
}

impl DebtorChanges {
    pub fn is_empty(&self) -> bool {
        self == &DebtorChanges::default()
    }
}
