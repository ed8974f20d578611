pub mod action_service;
pub mod calendar_service;
pub mod filter_service;
pub mod lifecycle_service;
pub mod pagination;
pub mod summary_service;

pub use action_service::{ActionService, SortKey, SortOrder};
pub use calendar_service::{CalendarService, Week};
pub use filter_service::{
    AmountCategory, FilterBounds, FilterCriteria, FilterService, OverdueCategory, ValueRange,
};
pub use lifecycle_service::{LifecycleService, Outcome};
pub use pagination::{paginate, Page, PageSize, PAGE_SIZE_CHOICES};
pub use summary_service::{CollectionSummary, SummaryService};

use crate::core::errors::DebtorError;

pub type ServiceResult<T> = Result<T, DebtorError>;
