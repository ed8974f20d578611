use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::core::business_days::{add_business_days, DEFAULT_RESCHEDULE_BUSINESS_DAYS};
use crate::core::errors::DebtorError;
use crate::core::time::Clock;
use crate::domain::{Debtor, DebtorChanges, DebtorId, NewDebtor};
use crate::storage::DebtorStore;

use super::ServiceResult;

/// Result of a lifecycle operation: the affected record plus an operator-facing message.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub debtor: Debtor,
    pub message: String,
}

/// Drives the collection workflow: create, record a collection and reschedule, mark paid,
/// delete. These are the only paths that change status, phase or the collection dates.
pub struct LifecycleService<'a> {
    store: &'a dyn DebtorStore,
    clock: &'a dyn Clock,
    reschedule_days: u32,
}

impl<'a> LifecycleService<'a> {
    pub fn new(store: &'a dyn DebtorStore, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            clock,
            reschedule_days: DEFAULT_RESCHEDULE_BUSINESS_DAYS,
        }
    }

    pub fn with_reschedule_days(mut self, days: u32) -> Self {
        self.reschedule_days = days.max(1);
        self
    }

    pub fn create(&self, record: NewDebtor) -> ServiceResult<Outcome> {
        let record = record.normalized();
        validate_name(&record.name)?;
        validate_amount(record.total_owed)?;
        let id = self.store.create(&record)?;
        let debtor = self.store.get_by_id(id)?;
        info!(debtor_id = id, "debtor created");
        Ok(Outcome {
            message: format!("Debtor {} registered.", debtor.name),
            debtor,
        })
    }

    /// Records a collection attempt made today and schedules the next one, either on
    /// `explicit_date` or after the configured number of business days.
    pub fn record_collection_and_reschedule(
        &self,
        id: DebtorId,
        explicit_date: Option<NaiveDate>,
    ) -> ServiceResult<Outcome> {
        let today = self.clock.today();
        let next = explicit_date.unwrap_or_else(|| add_business_days(today, self.reschedule_days));
        let debtor = self
            .store
            .modify(id, &mut |debtor: &mut Debtor| debtor.apply_collection(today, next))?;
        info!(
            debtor_id = id,
            next = %next,
            phase = debtor.collection_phase().get(),
            "collection recorded"
        );
        let message = match explicit_date {
            Some(date) => format!(
                "Collection for {} scheduled for {}.",
                debtor.name,
                date.format("%d/%m/%Y")
            ),
            None => format!(
                "Collection for {} recorded and rescheduled for {} ({} business days).",
                debtor.name,
                next.format("%d/%m/%Y"),
                self.reschedule_days
            ),
        };
        Ok(Outcome { debtor, message })
    }

    /// Marks a debtor as paid today. Re-applying on a paid debtor refreshes the same
    /// terminal values.
    pub fn mark_paid(&self, id: DebtorId) -> ServiceResult<Outcome> {
        let today = self.clock.today();
        let debtor = self.store.modify(id, &mut |debtor: &mut Debtor| {
            debtor.apply_payment(today);
            Ok(())
        })?;
        info!(debtor_id = id, "debtor marked as paid");
        Ok(Outcome {
            message: format!("Debtor {} marked as PAID.", debtor.name),
            debtor,
        })
    }

    /// Removes a debtor regardless of status. Irreversible.
    pub fn delete(&self, id: DebtorId) -> ServiceResult<Outcome> {
        let debtor = self.store.delete(id)?;
        info!(debtor_id = id, "debtor deleted");
        Ok(Outcome {
            message: format!("Debtor {} removed.", debtor.name),
            debtor,
        })
    }

    /// Corrects descriptive fields with the same rules as creation.
    pub fn update_details(&self, id: DebtorId, changes: &DebtorChanges) -> ServiceResult<Outcome> {
        if changes.is_empty() {
            return Err(DebtorError::Validation("no changes supplied".into()));
        }
        if let Some(name) = &changes.name {
            validate_name(name)?;
        }
        if let Some(amount) = changes.total_owed {
            validate_amount(amount)?;
        }
        let debtor = self.store.update(id, changes)?;
        info!(debtor_id = id, "debtor details updated");
        Ok(Outcome {
            message: format!("Debtor {} updated.", debtor.name),
            debtor,
        })
    }
}

fn validate_name(name: &str) -> ServiceResult<()> {
    if name.trim().is_empty() {
        Err(DebtorError::Validation("name must not be empty".into()))
    } else {
        Ok(())
    }
}

fn validate_amount(amount: Decimal) -> ServiceResult<()> {
    if amount <= Decimal::ZERO {
        Err(DebtorError::Validation(format!(
            "amount owed must be greater than zero, got {}",
            amount
        )))
    } else {
        Ok(())
    }
}
