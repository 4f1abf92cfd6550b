//! Time-bounded cache of the most recently loaded raw table.

use crate::error::Result;
use crate::observation::Observation;
use log::info;
use std::time::{Duration, Instant};

/// The upstream table is republished daily; one hour keeps the dashboard responsive.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Owns a loader callback and the table it last produced.
///
/// The table is reloaded on [`DatasetCache::get`] once it is older than the
/// TTL, or immediately after [`DatasetCache::invalidate`].
pub struct DatasetCache<F>
where
    F: FnMut() -> Result<Vec<Observation>>,
{
    loader: F,
    ttl: Duration,
    entry: Option<(Instant, Vec<Observation>)>,
}

impl<F> DatasetCache<F>
where
    F: FnMut() -> Result<Vec<Observation>>,
{
    pub fn new(ttl: Duration, loader: F) -> Self {
        DatasetCache {
            loader,
            ttl,
            entry: None,
        }
    }

    pub fn with_default_ttl(loader: F) -> Self {
        Self::new(DEFAULT_TTL, loader)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached table, reloading if missing or stale.
    pub fn get(&mut self) -> Result<&[Observation]> {
        self.get_at(Instant::now())
    }

    /// Same as [`DatasetCache::get`] with an explicit clock reading.
    pub fn get_at(&mut self, now: Instant) -> Result<&[Observation]> {
        let fresh = matches!(
            &self.entry,
            Some((loaded_at, _)) if now.saturating_duration_since(*loaded_at) < self.ttl
        );
        if !fresh {
            self.reload(now)?;
        }
        Ok(self.rows())
    }

    /// Reload now regardless of age.
    pub fn refresh(&mut self) -> Result<&[Observation]> {
        self.reload(Instant::now())?;
        Ok(self.rows())
    }

    /// Drop the cached table; the next `get` reloads.
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            info!("cache: Invalidated cached table");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.entry.is_some()
    }

    fn rows(&self) -> &[Observation] {
        self.entry
            .as_ref()
            .map(|(_, rows)| rows.as_slice())
            .unwrap_or(&[])
    }

    fn reload(&mut self, now: Instant) -> Result<()> {
        // A failed reload leaves the cache empty.
        self.entry = None;
        let rows = (self.loader)()?;
        info!("cache: Refreshed table with {} rows", rows.len());
        self.entry = Some((now, rows));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OwidError;
    use chrono::NaiveDate;
    use std::cell::Cell;

    fn one_row() -> Vec<Observation> {
        let date = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        vec![Observation::new("Germany", Some("Europe"), date)]
    }

    #[test]
    fn cache_loads_once_within_ttl() {
        let calls = Cell::new(0);
        let mut cache = DatasetCache::new(Duration::from_secs(60), || {
            calls.set(calls.get() + 1);
            Ok(one_row())
        });
        let start = Instant::now();
        assert_eq!(cache.get_at(start).unwrap().len(), 1);
        assert_eq!(cache.get_at(start + Duration::from_secs(59)).unwrap().len(), 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn cache_reloads_after_ttl() {
        let calls = Cell::new(0);
        let mut cache = DatasetCache::new(Duration::from_secs(60), || {
            calls.set(calls.get() + 1);
            Ok(one_row())
        });
        let start = Instant::now();
        cache.get_at(start).unwrap();
        cache.get_at(start + Duration::from_secs(60)).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn cache_invalidate_forces_reload() {
        let calls = Cell::new(0);
        let mut cache = DatasetCache::with_default_ttl(|| {
            calls.set(calls.get() + 1);
            Ok(one_row())
        });
        assert_eq!(cache.ttl(), DEFAULT_TTL);
        let start = Instant::now();
        cache.get_at(start).unwrap();
        cache.invalidate();
        assert!(!cache.is_loaded());
        cache.get_at(start).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn cache_refresh_ignores_age() {
        let calls = Cell::new(0);
        let mut cache = DatasetCache::with_default_ttl(|| {
            calls.set(calls.get() + 1);
            Ok(one_row())
        });
        cache.get().unwrap();
        cache.refresh().unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn cache_propagates_loader_error() {
        let mut cache = DatasetCache::with_default_ttl(|| {
            Err(OwidError::MissingColumns {
                missing: vec!["date".to_string()],
            })
        });
        assert!(cache.get().is_err());
        assert!(!cache.is_loaded());
    }
}
