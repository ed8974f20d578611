use std::{fmt, num::NonZeroUsize, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::core::errors::DebtorError;

/// Page sizes offered to operators.
pub const PAGE_SIZE_CHOICES: [usize; 4] = [10, 25, 50, 100];

/// Number of items per page, or everything on a single page.
///
/// Serialized as its display text (`"25"`, `"all"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PageSize {
    Items(NonZeroUsize),
    All,
}

impl PageSize {
    pub fn items(count: usize) -> Option<Self> {
        NonZeroUsize::new(count).map(PageSize::Items)
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::Items(NonZeroUsize::new(25).unwrap_or(NonZeroUsize::MIN))
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::Items(count) => write!(f, "{}", count),
            PageSize::All => f.write_str("all"),
        }
    }
}

impl FromStr for PageSize {
    type Err = DebtorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(PageSize::All);
        }
        trimmed
            .parse::<usize>()
            .ok()
            .and_then(PageSize::items)
            .ok_or_else(|| {
                DebtorError::Validation(format!(
                    "page size must be a positive number or `all`, got `{}`",
                    value
                ))
            })
    }
}

impl TryFrom<String> for PageSize {
    type Error = DebtorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PageSize> for String {
    fn from(size: PageSize) -> Self {
        size.to_string()
    }
}

/// One slice of an ordered collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based page number after clamping.
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<'_, T> {
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// 1-based position of the first item on this page, 0 when empty.
    pub fn first_position(&self, size: PageSize) -> usize {
        match size {
            _ if self.items.is_empty() => 0,
            PageSize::All => 1,
            PageSize::Items(count) => (self.number - 1) * count.get() + 1,
        }
    }
}

/// Slices `items` into the requested page. Out-of-range page numbers are clamped into
/// `1..=total_pages`; `total_pages` is at least 1 even for an empty collection.
pub fn paginate<T>(items: &[T], page: usize, size: PageSize) -> Page<'_, T> {
    let total_items = items.len();
    let per_page = match size {
        PageSize::All => {
            return Page {
                items,
                number: 1,
                total_pages: 1,
                total_items,
            }
        }
        PageSize::Items(count) => count.get(),
    };
    let total_pages = total_items.div_ceil(per_page).max(1);
    let number = page.clamp(1, total_pages);
    let start = ((number - 1) * per_page).min(total_items);
    let end = (start + per_page).min(total_items);
    Page {
        items: &items[start..end],
        number,
        total_pages,
        total_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(count: usize) -> PageSize {
        PageSize::items(count).unwrap()
    }

    #[test]
    fn pages_cover_every_item_once() {
        let items: Vec<u32> = (0..23).collect();
        let first = paginate(&items, 1, size(10));
        assert_eq!(first.total_pages, 3);
        let total: usize = (1..=first.total_pages)
            .map(|number| paginate(&items, number, size(10)).items.len())
            .sum();
        assert_eq!(total, items.len());
        assert_eq!(paginate(&items, 3, size(10)).items, &[20, 21, 22]);
    }

    #[test]
    fn out_of_range_pages_clamp() {
        let items: Vec<u32> = (0..5).collect();
        let high = paginate(&items, 99, size(2));
        assert_eq!(high.number, 3);
        assert_eq!(high.items, &[4]);
        let low = paginate(&items, 0, size(2));
        assert_eq!(low.number, 1);
        assert_eq!(low.items, &[0, 1]);
    }

    #[test]
    fn empty_collection_has_one_empty_page() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(&items, 4, size(10));
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.number, 1);
        assert!(page.items.is_empty());
        assert_eq!(page.first_position(size(10)), 0);
    }

    #[test]
    fn all_bypasses_slicing() {
        let items: Vec<u32> = (0..250).collect();
        let page = paginate(&items, 7, PageSize::All);
        assert_eq!(page.items.len(), 250);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.number, 1);
    }

    #[test]
    fn page_size_parsing() {
        assert_eq!("all".parse::<PageSize>().unwrap(), PageSize::All);
        assert_eq!("25".parse::<PageSize>().unwrap(), size(25));
        assert!("0".parse::<PageSize>().is_err());
        assert!("ten".parse::<PageSize>().is_err());
    }
}
