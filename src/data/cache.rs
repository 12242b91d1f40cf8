//! Time-boxed caching around a [`SeriesSource`].
//!
//! Entries are populated on miss and served until their TTL runs out. The cache
//! lives for the process only; failed fetches are never stored.
//!
//! A single pipeline run requests each series once, so hits come from callers
//! that keep one `CachedSource` across several runs (for example re-running
//! with other detector settings via `app::pipeline::run_with_source`). The
//! one-shot `cuts` binary builds a fresh cache per invocation.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::data::SeriesSource;
use crate::domain::RawSeries;
use crate::error::AppError;

struct Entry {
    series: RawSeries,
    expires_at: Instant,
}

pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl<S: SeriesSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of entries currently held (expired ones included until touched).
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, series_id: &str) -> Option<RawSeries> {
        let mut guard = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(entry) = guard.get(series_id)
            && Instant::now() < entry.expires_at
        {
            return Some(entry.series.clone());
        }
        guard.remove(series_id);
        None
    }

    fn store(&self, series: &RawSeries) {
        let expires_at = Instant::now() + self.ttl;
        let mut guard = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        guard.insert(
            series.id.clone(),
            Entry {
                series: series.clone(),
                expires_at,
            },
        );
    }
}

impl<S: SeriesSource> SeriesSource for CachedSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch_series(&self, series_id: &str) -> Result<RawSeries, AppError> {
        if let Some(hit) = self.lookup(series_id) {
            debug!(series_id, source = self.inner.name(), "cache hit");
            return Ok(hit);
        }
        debug!(series_id, source = self.inner.name(), "cache miss");
        let series = self.inner.fetch_series(series_id)?;
        self.store(&series);
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use chrono::NaiveDate;

    struct CountingSource {
        calls: Cell<usize>,
        fail: bool,
    }

    impl SeriesSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch_series(&self, series_id: &str) -> Result<RawSeries, AppError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(AppError::new(4, "upstream down"));
            }
            let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            Ok(RawSeries::from_pairs(series_id, [(date, 1.0)]))
        }
    }

    fn counting(fail: bool) -> CountingSource {
        CountingSource { calls: Cell::new(0), fail }
    }

    #[test]
    fn repeated_fetches_within_ttl_hit_the_cache() {
        let cache = CachedSource::new(counting(false), Duration::from_secs(3600));
        let a = cache.fetch_series("FEDFUNDS").unwrap();
        let b = cache.fetch_series("FEDFUNDS").unwrap();
        cache.fetch_series("PCE").unwrap();

        assert_eq!(a, b);
        assert_eq!(cache.inner().calls.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn expired_entries_are_refetched() {
        let cache = CachedSource::new(counting(false), Duration::ZERO);
        cache.fetch_series("FEDFUNDS").unwrap();
        cache.fetch_series("FEDFUNDS").unwrap();
        assert_eq!(cache.inner().calls.get(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = CachedSource::new(counting(true), Duration::from_secs(3600));
        assert!(cache.fetch_series("FEDFUNDS").is_err());
        assert!(cache.fetch_series("FEDFUNDS").is_err());
        assert_eq!(cache.inner().calls.get(), 2);
        assert!(cache.is_empty());
    }
}
