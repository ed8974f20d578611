pub mod common;
pub mod debtor;

pub use common::{normalize_person_key, DebtorId, Displayable, Identifiable};
pub use debtor::{CollectionPhase, CollectionStatus, Debtor, DebtorChanges, NewDebtor};
