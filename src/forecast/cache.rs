use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::debug;

use super::{ForecastPoint, ForecastProvider, Site};
use crate::error::ForecastError;
use crate::schedule::types::DayGrid;

/// Default time-to-live for cached forecasts (15 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// Cache key: site coordinates (micro-degrees) and target day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lat_micro: i64,
    lon_micro: i64,
    day: NaiveDate,
}

impl CacheKey {
    /// Builds the key for `site` on `day`.
    pub fn new(site: &Site, day: NaiveDate) -> Self {
        Self {
            lat_micro: (site.latitude * 1e6).round() as i64,
            lon_micro: (site.longitude * 1e6).round() as i64,
            day,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    points: Vec<ForecastPoint>,
    expires_at: Instant,
}

/// Caller-owned memo around a [`ForecastProvider`].
///
/// Entries are keyed by (location, target day) and expire after a fixed
/// time-to-live; an expired entry is refetched on the next lookup. The
/// scheduler never sees the cache, only the points it returns.
#[derive(Debug)]
pub struct ForecastCache<P> {
    provider: P,
    ttl: Duration,
    entries: HashMap<CacheKey, CacheEntry>,
}

impl<P: ForecastProvider> ForecastCache<P> {
    /// Wraps `provider` with entries living for `ttl`.
    pub fn new(provider: P, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Returns the forecast for `site` on `grid`'s day, fetching on miss.
    ///
    /// # Errors
    ///
    /// Propagates provider failures; failed fetches are not cached.
    pub fn get(&mut self, site: &Site, grid: &DayGrid) -> Result<Vec<ForecastPoint>, ForecastError> {
        self.get_at(site, grid, Instant::now())
    }

    /// Same as [`ForecastCache::get`] with an explicit current instant.
    ///
    /// # Errors
    ///
    /// Propagates provider failures; failed fetches are not cached.
    pub fn get_at(
        &mut self,
        site: &Site,
        grid: &DayGrid,
        now: Instant,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        self.evict_expired(now);
        let key = CacheKey::new(site, grid.date());
        if let Some(entry) = self.entries.get(&key) {
            debug!(provider = self.provider.name(), day = %grid.date(), "forecast cache hit");
            return Ok(entry.points.clone());
        }

        debug!(provider = self.provider.name(), day = %grid.date(), "forecast cache miss");
        let points = self.provider.forecast(site, grid)?;
        self.entries.insert(
            key,
            CacheEntry {
                points: points.clone(),
                expires_at: now + self.ttl,
            },
        );
        Ok(points)
    }

    /// Drops entries that have expired at `now`.
    fn evict_expired(&mut self, now: Instant) {
        self.entries.retain(|_, e| now < e.expires_at);
    }

    /// Number of entries kept since the last lookup.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use chrono_tz::Africa::Nairobi;

    struct CountingProvider {
        calls: Cell<usize>,
        fail: bool,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
                fail: false,
            }
        }
    }

    impl ForecastProvider for CountingProvider {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn forecast(
            &self,
            _site: &Site,
            grid: &DayGrid,
        ) -> Result<Vec<ForecastPoint>, ForecastError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(ForecastError::Unavailable {
                    provider: "counting",
                    day: grid.date(),
                });
            }
            Ok(vec![ForecastPoint {
                timestamp: grid.day_start().fixed_offset(),
                generation_wh: self.calls.get() as f32,
                irradiance_w_m2: None,
            }])
        }
    }

    fn site() -> Site {
        Site {
            latitude: -1.2921,
            longitude: 36.8219,
        }
    }

    fn grid(day: u32) -> DayGrid {
        DayGrid::new(NaiveDate::from_ymd_opt(2025, 3, day).unwrap(), Nairobi)
    }

    #[test]
    fn second_lookup_within_ttl_hits_cache() {
        let mut cache = ForecastCache::new(CountingProvider::new(), DEFAULT_TTL);
        let t0 = Instant::now();
        let a = cache.get_at(&site(), &grid(14), t0).unwrap();
        let b = cache
            .get_at(&site(), &grid(14), t0 + Duration::from_secs(60))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.provider.calls.get(), 1);
    }

    #[test]
    fn expired_entry_is_refetched() {
        let mut cache = ForecastCache::new(CountingProvider::new(), Duration::from_secs(10));
        let t0 = Instant::now();
        cache.get_at(&site(), &grid(14), t0).unwrap();
        let b = cache
            .get_at(&site(), &grid(14), t0 + Duration::from_secs(10))
            .unwrap();
        assert_eq!(cache.provider.calls.get(), 2);
        assert_eq!(b[0].generation_wh, 2.0);
    }

    #[test]
    fn different_days_use_different_keys() {
        let mut cache = ForecastCache::new(CountingProvider::new(), DEFAULT_TTL);
        let t0 = Instant::now();
        cache.get_at(&site(), &grid(14), t0).unwrap();
        cache.get_at(&site(), &grid(15), t0).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.provider.calls.get(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let provider = CountingProvider {
            calls: Cell::new(0),
            fail: true,
        };
        let mut cache = ForecastCache::new(provider, DEFAULT_TTL);
        let t0 = Instant::now();
        assert!(cache.get_at(&site(), &grid(14), t0).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn lookup_drops_stale_entries_for_other_days() {
        let mut cache = ForecastCache::new(CountingProvider::new(), Duration::from_secs(5));
        let t0 = Instant::now();
        cache.get_at(&site(), &grid(14), t0).unwrap();
        cache
            .get_at(&site(), &grid(15), t0 + Duration::from_secs(6))
            .unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn evict_expired_drops_stale_entries() {
        let mut cache = ForecastCache::new(CountingProvider::new(), Duration::from_secs(5));
        let t0 = Instant::now();
        cache.get_at(&site(), &grid(14), t0).unwrap();
        cache.evict_expired(t0 + Duration::from_secs(6));
        assert!(cache.is_empty());
    }
}
