//! Yearly sunlight and moonlight series for one observer.
//!
//! Each day is independent: four oracle lookups (sunrise, sunset, moonrise, moonset)
//! starting at midnight UTC, with the set searches anchored at the matching rise when
//! one was found. A failing oracle aborts the whole year; a missing event does not.

use crate::config::{Config, DayCount};
use crate::oracle::{EventOracle, EventSearch};
use crate::time::{year_start, DeltaT};
use crate::{Body, DayRecord, Direction, Error, Observer, Result};
use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared flag telling a running build to stop.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

/// Point in time after which a run gives up.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Option<std::time::Duration>,
}

impl Deadline {
    /// Deadline `limit` from now.
    #[must_use]
    pub fn after(limit: std::time::Duration) -> Self {
        Self {
            started: Instant::now(),
            limit: Some(limit),
        }
    }

    /// A deadline that never expires.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            started: Instant::now(),
            limit: None,
        }
    }

    /// Time since the deadline was set.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }

    /// Whether the limit has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.limit.is_some_and(|limit| self.elapsed() >= limit)
    }

    /// Fails with `Timeout` once the limit has passed.
    ///
    /// # Errors
    /// Returns `Timeout` carrying the elapsed milliseconds.
    pub fn check(&self) -> Result<()> {
        if self.is_expired() {
            let elapsed_ms = u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX);
            return Err(Error::Timeout { elapsed_ms });
        }
        Ok(())
    }
}

/// Builds one [`DayRecord`] per day of a year from an [`EventOracle`].
#[derive(Debug, Clone)]
pub struct DaylightSeriesBuilder<O> {
    oracle: O,
    window_days: f64,
    day_count: DayCount,
    timeout: Option<std::time::Duration>,
}

impl<O: EventOracle> DaylightSeriesBuilder<O> {
    /// Builder with one-day search windows, 365 days per year and no deadline.
    #[must_use]
    pub const fn new(oracle: O) -> Self {
        Self {
            oracle,
            window_days: 1.0,
            day_count: DayCount::Fixed365,
            timeout: None,
        }
    }

    /// Builder using the configured window, day count and run timeout.
    #[must_use]
    pub fn from_config(oracle: O, config: &Config) -> Self {
        Self::new(oracle)
            .with_window_days(config.search_window_days)
            .with_day_count(config.day_count)
            .with_timeout(Some(config.run_timeout()))
    }

    /// Sets the search window per oracle call, in days.
    #[must_use]
    pub fn with_window_days(mut self, window_days: f64) -> Self {
        self.window_days = window_days;
        self
    }

    /// Sets how many days a year produces.
    #[must_use]
    pub fn with_day_count(mut self, day_count: DayCount) -> Self {
        self.day_count = day_count;
        self
    }

    /// Sets the per-run deadline; `None` disables it.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<std::time::Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The oracle used for lookups.
    #[must_use]
    pub const fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Builds the series for `year`, starting January 1st.
    ///
    /// # Errors
    /// Returns `OracleUnavailable` if any lookup fails, `Timeout` if the deadline passes
    /// and `InvalidDateTime` for years outside 1700..3000, checked before any lookup.
    /// No partial series is returned.
    pub fn build_year(&self, observer: &Observer, year: i32) -> Result<Vec<DayRecord>> {
        self.build_year_cancellable(observer, year, &CancellationToken::new())
    }

    /// Like [`build_year`](Self::build_year), checking `token` between days.
    ///
    /// # Errors
    /// Additionally returns `Cancelled` once the token is cancelled.
    pub fn build_year_cancellable(
        &self,
        observer: &Observer,
        year: i32,
        token: &CancellationToken,
    ) -> Result<Vec<DayRecord>> {
        let (start, days, deadline) = self.prepare(observer, year)?;

        let records = (0..days)
            .map(|day| {
                token.check()?;
                deadline.check()?;
                self.build_day(observer, start + Duration::days(i64::from(day)))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("built {} days in {:?}", records.len(), deadline.elapsed());
        Ok(records)
    }

    /// Four lookups for the day starting at `day_start`.
    ///
    /// # Errors
    /// Returns `OracleUnavailable` if a lookup fails.
    pub fn build_day(&self, observer: &Observer, day_start: DateTime<Utc>) -> Result<DayRecord> {
        let sunrise = self.find(Body::Sun, Direction::Rising, observer, day_start)?;
        let sunset = self.find(
            Body::Sun,
            Direction::Setting,
            observer,
            sunrise.unwrap_or(day_start),
        )?;
        let moonrise = self.find(Body::Moon, Direction::Rising, observer, day_start)?;
        let moonset = self.find(
            Body::Moon,
            Direction::Setting,
            observer,
            moonrise.unwrap_or(day_start),
        )?;

        Ok(DayRecord::from_events(
            day_start.date_naive(),
            sunrise,
            sunset,
            moonrise,
            moonset,
        ))
    }

    fn find(
        &self,
        body: Body,
        direction: Direction,
        observer: &Observer,
        start: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>> {
        let search = EventSearch::new(body, *observer, direction, start, self.window_days);
        Ok(self.oracle.find_event(&search)?)
    }

    fn prepare(&self, observer: &Observer, year: i32) -> Result<(DateTime<Utc>, u32, Deadline)> {
        let start = year_start(year)?;
        let days = self.day_count.days_for(year);
        // Both ends of the series must lie inside the ΔT model's range.
        DeltaT::estimate_from_date_like(start)?;
        DeltaT::estimate_from_date_like(start + Duration::days(i64::from(days) - 1))?;
        let deadline = self.timeout.map_or_else(Deadline::unbounded, Deadline::after);
        debug!(
            "building {days} days for {year} at ({}, {})",
            observer.latitude(),
            observer.longitude()
        );
        Ok((start, days, deadline))
    }
}

#[cfg(feature = "rayon")]
impl<O: EventOracle + Sync> DaylightSeriesBuilder<O> {
    /// Like [`build_year_cancellable`](Self::build_year_cancellable), computing days in
    /// parallel. The oracle must be safe to call from several threads at once.
    ///
    /// # Errors
    /// Same as [`build_year_cancellable`](Self::build_year_cancellable).
    pub fn build_year_parallel(
        &self,
        observer: &Observer,
        year: i32,
        token: &CancellationToken,
    ) -> Result<Vec<DayRecord>> {
        use rayon::prelude::*;

        let (start, days, deadline) = self.prepare(observer, year)?;
        let records = (0..days)
            .into_par_iter()
            .map(|day| {
                token.check()?;
                deadline.check()?;
                self.build_day(observer, start + Duration::days(i64::from(day)))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "built {} days in parallel in {:?}",
            records.len(),
            deadline.elapsed()
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::OracleError;
    use chrono::{Datelike, NaiveDate};
    use std::sync::Mutex;

    /// Sun up 06:00-18:00 and Moon up 20:00-(+10h), relative to each search start's date.
    #[derive(Default)]
    struct ClockworkOracle {
        searches: Mutex<Vec<EventSearch>>,
    }

    impl EventOracle for ClockworkOracle {
        fn find_event(&self, search: &EventSearch) -> core::result::Result<Option<DateTime<Utc>>, OracleError> {
            if let Ok(mut searches) = self.searches.lock() {
                searches.push(*search);
            }
            let midnight = search
                .start
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|naive| naive.and_utc())
                .ok_or_else(|| OracleError::fatal("bad date"))?;
            let event = match (search.body, search.direction) {
                (Body::Sun, Direction::Rising) => midnight + Duration::hours(6),
                (Body::Sun, Direction::Setting) => midnight + Duration::hours(18),
                (Body::Moon, Direction::Rising) => midnight + Duration::hours(20),
                (Body::Moon, Direction::Setting) => search.start + Duration::hours(10),
            };
            Ok(Some(event))
        }
    }

    struct NeverOracle;

    impl EventOracle for NeverOracle {
        fn find_event(&self, _: &EventSearch) -> core::result::Result<Option<DateTime<Utc>>, OracleError> {
            Ok(None)
        }
    }

    struct BrokenOracle;

    impl EventOracle for BrokenOracle {
        fn find_event(&self, _: &EventSearch) -> core::result::Result<Option<DateTime<Utc>>, OracleError> {
            Err(OracleError::fatal("ephemeris offline"))
        }
    }

    fn observer() -> Observer {
        Observer::new(16.5, 80.6, 0.0).unwrap()
    }

    #[test]
    fn test_year_has_365_chronological_days() {
        let builder = DaylightSeriesBuilder::new(ClockworkOracle::default());
        let days = builder.build_year(&observer(), 2025).unwrap();

        assert_eq!(days.len(), 365);
        assert_eq!(days[0].date(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(days[364].date(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert!(days.windows(2).all(|pair| pair[0].date() < pair[1].date()));
        assert!(days.iter().all(|day| day.sunlight_hours() == Some(12.0)));
        assert!(days.iter().all(|day| day.moonlight_hours() == Some(10.0)));
    }

    #[test]
    fn test_set_searches_are_anchored_at_rise() {
        let builder = DaylightSeriesBuilder::new(ClockworkOracle::default());
        let day_start = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        builder.build_day(&observer(), day_start).unwrap();

        let searches = builder.oracle().searches.lock().unwrap();
        assert_eq!(searches.len(), 4);
        assert_eq!(searches[0].start, day_start);
        assert_eq!(searches[1].start, day_start + Duration::hours(6));
        assert_eq!(searches[2].start, day_start);
        assert_eq!(searches[3].start, day_start + Duration::hours(20));
        assert!(searches.iter().all(|search| search.window_days == 1.0));
    }

    #[test]
    fn test_missing_events_leave_durations_undefined() {
        let builder = DaylightSeriesBuilder::new(NeverOracle);
        let days = builder.build_year(&observer(), 2025).unwrap();
        assert_eq!(days.len(), 365);
        assert!(days.iter().all(|day| day.sunlight_hours().is_none()));
        assert!(days.iter().all(|day| day.moonlight_hours_or_nan().is_nan()));
    }

    #[test]
    fn test_oracle_failure_aborts_the_run() {
        let builder = DaylightSeriesBuilder::new(BrokenOracle);
        let result = builder.build_year(&observer(), 2025);
        assert!(matches!(result, Err(Error::OracleUnavailable { .. })));
    }

    #[test]
    fn test_years_outside_delta_t_range_are_rejected_up_front() {
        let builder = DaylightSeriesBuilder::new(ClockworkOracle::default());
        for year in [1500, 1699, 3000, 3001] {
            let result = builder.build_year(&observer(), year);
            assert!(
                matches!(result, Err(Error::InvalidDateTime { .. })),
                "{year}: {result:?}"
            );
        }
        assert!(builder.oracle().searches.lock().unwrap().is_empty());

        let first_supported = builder.build_year(&observer(), 1700).unwrap();
        assert_eq!(first_supported.len(), 365);
    }

    #[test]
    fn test_leap_year_day_count() {
        let fixed = DaylightSeriesBuilder::new(NeverOracle);
        let days = fixed.build_year(&observer(), 2024).unwrap();
        assert_eq!(days.len(), 365);
        assert_eq!(days[364].date().ordinal(), 365);

        let calendar = DaylightSeriesBuilder::new(NeverOracle).with_day_count(DayCount::CalendarYear);
        let days = calendar.build_year(&observer(), 2024).unwrap();
        assert_eq!(days.len(), 366);
        assert_eq!(days[365].date(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_cancelled_token_stops_the_run() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());

        let builder = DaylightSeriesBuilder::new(NeverOracle);
        let result = builder.build_year_cancellable(&observer(), 2025, &token);
        assert_eq!(result, Err(Error::Cancelled));
    }

    #[test]
    fn test_expired_deadline_times_out() {
        let builder =
            DaylightSeriesBuilder::new(NeverOracle).with_timeout(Some(std::time::Duration::ZERO));
        let result = builder.build_year(&observer(), 2025);
        assert!(matches!(result, Err(Error::Timeout { .. })));

        assert!(!Deadline::unbounded().is_expired());
        assert!(Deadline::unbounded().check().is_ok());
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            search_window_days: 2.0,
            day_count: DayCount::CalendarYear,
            ..Config::default()
        };
        let builder = DaylightSeriesBuilder::from_config(ClockworkOracle::default(), &config);
        let day_start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        builder.build_day(&observer(), day_start).unwrap();
        let searches = builder.oracle().searches.lock().unwrap();
        assert!(searches.iter().all(|search| search.window_days == 2.0));
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_parallel_build_matches_sequential() {
        let builder = DaylightSeriesBuilder::new(ClockworkOracle::default());
        let sequential = builder.build_year(&observer(), 2025).unwrap();
        let parallel = builder
            .build_year_parallel(&observer(), 2025, &CancellationToken::new())
            .unwrap();
        assert_eq!(sequential, parallel);
    }
}
