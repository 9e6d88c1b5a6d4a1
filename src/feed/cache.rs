use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Single-slot cache that serves its value only inside a freshness window.
///
/// The lock is held just long enough to read or replace the slot, never
/// across a fetch, so two callers racing past an expired entry may both
/// refetch. Values are cloned out; use an `Arc` for anything large.
#[derive(Debug)]
pub struct FreshnessCache<T> {
    ttl: Duration,
    slot: Mutex<Option<Stored<T>>>,
}

#[derive(Debug)]
struct Stored<T> {
    stored_at: Instant,
    value: T,
}

impl<T: Clone> FreshnessCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Returns the cached value if it was stored less than `ttl` ago.
    pub fn get(&self) -> Option<T> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|stored| stored.stored_at.elapsed() < self.ttl)
            .map(|stored| stored.value.clone())
    }

    pub fn store(&self, value: T) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Stored {
            stored_at: Instant::now(),
            value,
        });
    }

    pub fn clear(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cache_misses() {
        let cache: FreshnessCache<u32> = FreshnessCache::new(Duration::from_secs(60));
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn test_fresh_value_served() {
        let cache = FreshnessCache::new(Duration::from_secs(60));
        cache.store(7);
        assert_eq!(cache.get(), Some(7));
        assert_eq!(cache.get(), Some(7));
    }

    #[test]
    fn test_store_replaces_value() {
        let cache = FreshnessCache::new(Duration::from_secs(60));
        cache.store(1);
        cache.store(2);
        assert_eq!(cache.get(), Some(2));
    }

    #[test]
    fn test_zero_ttl_never_serves() {
        let cache = FreshnessCache::new(Duration::ZERO);
        cache.store(1);
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn test_value_expires() {
        let cache = FreshnessCache::new(Duration::from_millis(10));
        cache.store("feed");
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn test_clear() {
        let cache = FreshnessCache::new(Duration::from_secs(60));
        cache.store(1);
        cache.clear();
        assert_eq!(cache.get(), None);
    }
}
