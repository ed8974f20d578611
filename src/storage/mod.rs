pub mod cache;
pub mod sqlite_backend;

use std::collections::HashSet;

use crate::core::errors::Result;
use crate::domain::{Debtor, DebtorChanges, DebtorId, NewDebtor};

/// Persistence contract for debtor records.
///
/// Every mutating method runs in its own transaction: it either commits completely or leaves
/// the store untouched. Uniqueness violations on the external person id surface as
/// `DebtorError::Duplicate` whether they are caught by a pre-check or by the database.
pub trait DebtorStore: Send + Sync {
    fn create(&self, record: &NewDebtor) -> Result<DebtorId>;

    /// Inserts all records in a single transaction; any failure rolls back the whole batch.
    fn create_many(&self, records: &[NewDebtor]) -> Result<usize>;

    /// All debtors ordered by id.
    fn get_all(&self) -> Result<Vec<Debtor>>;

    fn get_by_id(&self, id: DebtorId) -> Result<Debtor>;

    fn update(&self, id: DebtorId, changes: &DebtorChanges) -> Result<Debtor>;

    /// Loads a debtor, applies `apply` and writes the result back, all inside one
    /// transaction. Returning an error from `apply` rolls the transaction back.
    fn modify(
        &self,
        id: DebtorId,
        apply: &mut dyn FnMut(&mut Debtor) -> Result<()>,
    ) -> Result<Debtor>;

    /// Removes a debtor and returns the deleted record.
    fn delete(&self, id: DebtorId) -> Result<Debtor>;

    /// Normalized external person ids currently in use.
    fn person_keys(&self) -> Result<HashSet<String>>;
}

pub use sqlite_backend::SqliteStore;
