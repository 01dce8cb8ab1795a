//! Time-bounded value cache.
//!
//! An explicit owner of `{ value, last_refresh, ttl }` with a pure
//! `get_or_refresh(now, ..)`: callers pass the clock in, nothing is
//! initialized implicitly.

use chrono::{DateTime, Duration, Utc};

/// Single cached value that expires `ttl` after it was stored.
#[derive(Debug, Clone)]
pub struct TtlCache<T> {
    value: Option<T>,
    last_refresh: Option<DateTime<Utc>>,
    ttl: Duration,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            value: None,
            last_refresh: None,
            ttl,
        }
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    /// Whether a value is held and younger than the ttl at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match (&self.value, self.last_refresh) {
            (Some(_), Some(at)) => now >= at && now - at < self.ttl,
            _ => false,
        }
    }

    /// The value, if still fresh at `now`.
    pub fn get(&self, now: DateTime<Utc>) -> Option<&T> {
        if self.is_fresh(now) {
            self.value.as_ref()
        } else {
            None
        }
    }

    pub fn store(&mut self, value: T, now: DateTime<Utc>) {
        self.value = Some(value);
        self.last_refresh = Some(now);
    }

    /// Return the cached value, refreshing it through `refresh` when stale.
    pub fn get_or_refresh(&mut self, now: DateTime<Utc>, refresh: impl FnOnce() -> T) -> &T {
        if !self.is_fresh(now) {
            self.value = None;
            self.last_refresh = Some(now);
        }
        self.value.get_or_insert_with(refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
    }

    #[test]
    fn test_fresh_until_ttl() {
        let mut cache = TtlCache::new(Duration::minutes(15));
        assert!(!cache.is_fresh(at(0)));
        assert!(cache.get(at(0)).is_none());

        cache.store(7, at(0));
        assert_eq!(cache.get(at(14)), Some(&7));
        assert!(!cache.is_fresh(at(15)));
        assert!(cache.get(at(20)).is_none());
    }

    #[test]
    fn test_get_or_refresh() {
        let mut cache = TtlCache::new(Duration::minutes(10));
        let mut calls = 0;

        assert_eq!(*cache.get_or_refresh(at(0), || { calls += 1; "a" }), "a");
        assert_eq!(*cache.get_or_refresh(at(5), || { calls += 1; "b" }), "a");
        assert_eq!(*cache.get_or_refresh(at(10), || { calls += 1; "c" }), "c");
        assert_eq!(calls, 2);
        assert_eq!(cache.last_refresh(), Some(at(10)));
    }

    #[test]
    fn test_clock_going_backwards_is_stale() {
        let mut cache = TtlCache::new(Duration::minutes(10));
        cache.store(1, at(30));
        assert!(!cache.is_fresh(at(20)));
    }
}
