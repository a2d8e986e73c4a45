//! Time-related calculations for the celestial event search.
//!
//! This module provides Julian date conversion from chrono instants, ΔT (Delta T)
//! estimation following Espenak & Meeus, and the calendar helpers used to lay out
//! a year of days.

#![allow(clippy::unreadable_literal)]

use crate::math::polynomial;
use crate::{Error, Result};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

/// Seconds per day (86,400)
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Julian Day Number for J2000.0 epoch (2000-01-01 12:00:00 UTC)
pub const J2000_JDN: f64 = 2_451_545.0;

/// Julian Date of the Unix epoch (1970-01-01 00:00:00 UTC)
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Days per Julian century
const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Julian date of an instant, carrying the ΔT needed to move to Terrestrial Time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JulianDate {
    /// Julian Date (JD) - referenced to UT
    jd: f64,
    /// Delta T in seconds - difference between TT and UT1
    delta_t: f64,
}

impl JulianDate {
    /// Creates a Julian date from a timezone-aware instant.
    #[must_use]
    pub fn from_datetime<Tz: TimeZone>(datetime: &DateTime<Tz>, delta_t: f64) -> Self {
        let utc = datetime.with_timezone(&Utc);
        let millis = utc.timestamp_millis() as f64;
        Self {
            jd: UNIX_EPOCH_JD + millis / (SECONDS_PER_DAY * 1000.0),
            delta_t,
        }
    }

    /// Creates a Julian date from a raw JD value.
    #[must_use]
    pub const fn from_raw(jd: f64, delta_t: f64) -> Self {
        Self { jd, delta_t }
    }

    /// Gets the Julian Date (JD) value.
    #[must_use]
    pub const fn julian_date(&self) -> f64 {
        self.jd
    }

    /// Gets the ΔT value in seconds.
    #[must_use]
    pub const fn delta_t(&self) -> f64 {
        self.delta_t
    }

    /// Julian Ephemeris Day, JDE = JD + ΔT/86400.
    #[must_use]
    pub fn julian_ephemeris_day(&self) -> f64 {
        self.jd + self.delta_t / SECONDS_PER_DAY
    }

    /// Julian centuries (UT) since J2000.0.
    #[must_use]
    pub fn julian_century(&self) -> f64 {
        (self.jd - J2000_JDN) / DAYS_PER_CENTURY
    }

    /// Julian ephemeris centuries (TT) since J2000.0.
    #[must_use]
    pub fn julian_ephemeris_century(&self) -> f64 {
        (self.julian_ephemeris_day() - J2000_JDN) / DAYS_PER_CENTURY
    }
}

/// One polynomial segment of the ΔT fit: valid for years below `until`,
/// evaluated at `year - origin`.
struct DeltaTSegment {
    until: f64,
    origin: f64,
    coeffs: &'static [f64],
}

/// Espenak & Meeus polynomial fits, updated 2014.
/// See: <https://www.eclipsewise.com/help/deltatpoly2014.html>
const DELTA_T_SEGMENTS: &[DeltaTSegment] = &[
    DeltaTSegment {
        until: 1800.0,
        origin: 1700.0,
        coeffs: &[8.83, 0.1603, -0.0059285, 0.00013336, -1.0 / 1_174_000.0],
    },
    DeltaTSegment {
        until: 1860.0,
        origin: 1800.0,
        coeffs: &[
            13.72,
            -0.332447,
            0.0068612,
            0.0041116,
            -0.00037436,
            0.0000121272,
            -0.0000001699,
            0.000000000875,
        ],
    },
    DeltaTSegment {
        until: 1900.0,
        origin: 1860.0,
        coeffs: &[
            7.62,
            0.5737,
            -0.251754,
            0.01680668,
            -0.0004473624,
            1.0 / 233_174.0,
        ],
    },
    DeltaTSegment {
        until: 1920.0,
        origin: 1900.0,
        coeffs: &[-2.79, 1.494119, -0.0598939, 0.0061966, -0.000197],
    },
    DeltaTSegment {
        until: 1941.0,
        origin: 1920.0,
        coeffs: &[21.20, 0.84493, -0.076100, 0.0020936],
    },
    DeltaTSegment {
        until: 1961.0,
        origin: 1950.0,
        coeffs: &[29.07, 0.407, -1.0 / 233.0, 1.0 / 2547.0],
    },
    DeltaTSegment {
        until: 1986.0,
        origin: 1975.0,
        coeffs: &[45.45, 1.067, -1.0 / 260.0, -1.0 / 718.0],
    },
    DeltaTSegment {
        until: 2005.0,
        origin: 2000.0,
        coeffs: &[
            63.86,
            0.3345,
            -0.060374,
            0.0017275,
            0.000651814,
            0.00002373599,
        ],
    },
    DeltaTSegment {
        until: 2015.0,
        origin: 2005.0,
        coeffs: &[64.69, 0.2930],
    },
    DeltaTSegment {
        until: f64::INFINITY,
        origin: 2015.0,
        coeffs: &[67.62, 0.3645, 0.0039755],
    },
];

/// ΔT (Delta T) estimation.
///
/// ΔT represents the difference between Terrestrial Time (TT) and Universal Time (UT1).
pub struct DeltaT;

impl DeltaT {
    /// Earliest decimal year with a ΔT fit.
    pub const MIN_YEAR: f64 = 1700.0;

    /// Latest decimal year with a ΔT fit.
    pub const MAX_YEAR: f64 = 3000.0;

    /// Estimates ΔT in seconds for a decimal year.
    ///
    /// # Errors
    /// Returns `InvalidDateTime` for non-finite years or years outside 1700..=3000.
    ///
    /// # Example
    /// ```
    /// # use place_daylight::time::DeltaT;
    /// let delta_t = DeltaT::estimate(2024.0).unwrap();
    /// assert!(delta_t > 60.0 && delta_t < 80.0);
    /// ```
    pub fn estimate(decimal_year: f64) -> Result<f64> {
        if !decimal_year.is_finite() {
            return Err(Error::invalid_datetime("year must be finite"));
        }
        if decimal_year < Self::MIN_YEAR {
            return Err(Error::invalid_datetime(
                "ΔT estimates not available before year 1700",
            ));
        }
        if decimal_year > Self::MAX_YEAR {
            return Err(Error::invalid_datetime(
                "ΔT estimates not available beyond year 3000",
            ));
        }

        DELTA_T_SEGMENTS
            .iter()
            .find(|segment| decimal_year < segment.until)
            .map(|segment| polynomial(segment.coeffs, decimal_year - segment.origin))
            .ok_or(Error::invalid_datetime("no ΔT segment covers this year"))
    }

    /// Estimates ΔT from any chrono date-like value, using `year + (month - 0.5) / 12`.
    ///
    /// # Errors
    /// Returns `InvalidDateTime` if the year is outside the supported range.
    #[allow(clippy::needless_pass_by_value)]
    pub fn estimate_from_date_like<D: Datelike>(date: D) -> Result<f64> {
        let decimal_year = f64::from(date.year()) + (f64::from(date.month()) - 0.5) / 12.0;
        Self::estimate(decimal_year)
    }
}

/// Gregorian leap year rule.
#[must_use]
pub const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of calendar days in `year` (365 or 366).
#[must_use]
pub const fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Midnight UTC on January 1st of `year`.
///
/// # Errors
/// Returns `InvalidDateTime` if the year cannot be represented.
pub fn year_start(year: i32) -> Result<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or(Error::invalid_datetime("year is out of range"))
}
