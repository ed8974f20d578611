use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crate::domain::Debtor;

/// Default lifetime of a cached full listing.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Short-lived memo of the full debtor listing, shared by list and calendar reads.
/// Mutations must call [`ListingCache::invalidate`] before reporting success.
#[derive(Debug)]
pub struct ListingCache {
    ttl: Duration,
    entry: Mutex<Option<(Instant, Arc<Vec<Debtor>>)>>,
}

impl ListingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached listing when it is younger than the TTL.
    pub fn get(&self) -> Option<Arc<Vec<Debtor>>> {
        let guard = self.entry.lock().ok()?;
        match guard.as_ref() {
            Some((stored_at, records)) if stored_at.elapsed() < self.ttl => Some(records.clone()),
            _ => None,
        }
    }

    pub fn put(&self, records: Vec<Debtor>) -> Arc<Vec<Debtor>> {
        let records = Arc::new(records);
        if self.ttl.is_zero() {
            return records;
        }
        if let Ok(mut guard) = self.entry.lock() {
            *guard = Some((Instant::now(), records.clone()));
        }
        records
    }

    pub fn invalidate(&self) {
        match self.entry.lock() {
            Ok(mut guard) => *guard = None,
            // A poisoned lock still holds the stale entry; clear it anyway.
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

impl Default for ListingCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_expire_and_invalidate() {
        let cache = ListingCache::new(Duration::from_secs(60));
        assert!(cache.get().is_none());
        cache.put(Vec::new());
        assert!(cache.get().is_some());
        cache.invalidate();
        assert!(cache.get().is_none());
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let cache = ListingCache::new(Duration::ZERO);
        cache.put(Vec::new());
        assert!(cache.get().is_none());
    }
}
