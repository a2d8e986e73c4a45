//! Rise/set search over the built-in Sun and Moon models.

use super::{moon, sun, EventOracle, EventSearch, OracleError};
use crate::config::Config;
use crate::time::{DeltaT, JulianDate};
use crate::{Body, Direction, Observer};
use chrono::{DateTime, Duration, Utc};
use log::trace;

/// Bisection stops once the bracket is this many seconds wide.
const RESOLUTION_SECONDS: i64 = 1;

/// Longest search window the built-in oracle accepts, in days.
pub const MAX_WINDOW_DAYS: f64 = 366.0;

/// Deterministic, stateless oracle computing rise and set times from ephemerides.
///
/// The window is scanned in fixed steps for a sign change of the body's altitude
/// relative to its rise/set altitude, then the bracket is bisected to one second.
/// Crossings that happen and reverse inside a single step are missed, so the step
/// should stay well below the shortest possible time above or below the horizon.
///
/// # Example
/// ```
/// # use place_daylight::oracle::{AstronomicalOracle, EventOracle, EventSearch};
/// # use place_daylight::{Body, Direction, Observer};
/// # use chrono::{TimeZone, Utc};
/// let london = Observer::new(51.5074, -0.1278, 0.0).unwrap();
/// let start = Utc.with_ymd_and_hms(2024, 6, 21, 0, 0, 0).unwrap();
/// let search = EventSearch::new(Body::Sun, london, Direction::Rising, start, 1.0);
/// let sunrise = AstronomicalOracle::new().find_event(&search).unwrap().unwrap();
/// assert_eq!(sunrise.format("%H").to_string(), "03");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AstronomicalOracle {
    scan_step: Duration,
}

impl Default for AstronomicalOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl AstronomicalOracle {
    /// Oracle scanning in 10 minute steps.
    #[must_use]
    pub fn new() -> Self {
        Self::with_scan_step_minutes(10)
    }

    /// Oracle scanning in steps of `minutes` (at least one).
    #[must_use]
    pub fn with_scan_step_minutes(minutes: u32) -> Self {
        Self {
            scan_step: Duration::minutes(i64::from(minutes.max(1))),
        }
    }

    /// Oracle using the configured scan step.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::with_scan_step_minutes(config.scan_step_minutes)
    }

    /// Scan step.
    #[must_use]
    pub const fn scan_step(&self) -> Duration {
        self.scan_step
    }
}

/// Altitude of a body relative to its rise/set altitude, in degrees.
///
/// ΔT is fixed per search; it drifts by well under a second over one window.
struct HorizonOffset {
    body: Body,
    observer: Observer,
    delta_t: f64,
}

impl HorizonOffset {
    fn at(&self, instant: DateTime<Utc>) -> f64 {
        let jd = JulianDate::from_datetime(&instant, self.delta_t);
        match self.body {
            Body::Sun => sun::altitude(&jd, &self.observer) - sun::SUN_HORIZON_ALTITUDE,
            Body::Moon => {
                let (altitude, distance_km) = moon::altitude(&jd, &self.observer);
                altitude - moon::horizon_altitude(distance_km)
            }
        }
    }
}

/// Whether the offset moved across the horizon in the requested direction.
fn crosses(direction: Direction, before: f64, after: f64) -> bool {
    match direction {
        Direction::Rising => before < 0.0 && after >= 0.0,
        Direction::Setting => before >= 0.0 && after < 0.0,
    }
}

/// Whether `offset` lies on the pre-crossing side.
fn before_crossing(direction: Direction, offset: f64) -> bool {
    match direction {
        Direction::Rising => offset < 0.0,
        Direction::Setting => offset >= 0.0,
    }
}

fn window_length(window_days: f64) -> Result<Duration, OracleError> {
    if !(window_days.is_finite() && window_days > 0.0 && window_days <= MAX_WINDOW_DAYS) {
        return Err(OracleError::fatal(format!(
            "search window of {window_days} days is out of range"
        )));
    }
    Ok(Duration::milliseconds((window_days * 86_400_000.0).round() as i64))
}

impl EventOracle for AstronomicalOracle {
    fn find_event(&self, search: &EventSearch) -> Result<Option<DateTime<Utc>>, OracleError> {
        let end = search.start + window_length(search.window_days)?;
        let delta_t = DeltaT::estimate_from_date_like(search.start)
            .map_err(|err| OracleError::fatal(err.to_string()))?;
        let offset = HorizonOffset {
            body: search.body,
            observer: search.observer,
            delta_t,
        };

        let mut lo = search.start;
        let mut lo_offset = offset.at(lo);
        while lo < end {
            let hi = (lo + self.scan_step).min(end);
            let hi_offset = offset.at(hi);
            if crosses(search.direction, lo_offset, hi_offset) {
                let event = bisect(&offset, search.direction, lo, hi);
                trace!(
                    "{:?} {:?} at {event} for ({}, {})",
                    search.body,
                    search.direction,
                    search.observer.latitude(),
                    search.observer.longitude()
                );
                return Ok(Some(event));
            }
            lo = hi;
            lo_offset = hi_offset;
        }

        trace!(
            "no {:?} {:?} within {} days of {}",
            search.body,
            search.direction,
            search.window_days,
            search.start
        );
        Ok(None)
    }
}

/// Narrows a bracketing interval down to one second and returns its upper end.
fn bisect(
    offset: &HorizonOffset,
    direction: Direction,
    mut lo: DateTime<Utc>,
    mut hi: DateTime<Utc>,
) -> DateTime<Utc> {
    let resolution = Duration::seconds(RESOLUTION_SECONDS);
    while hi - lo > resolution {
        let mid = lo + (hi - lo) / 2;
        if before_crossing(direction, offset.at(mid)) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    hi
}
