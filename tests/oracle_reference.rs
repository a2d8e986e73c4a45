//! Built-in oracle against published rise/set times.
//!
//! Reference times are civil almanac values rounded to the minute; the low-precision
//! models are expected within a few minutes of them.

use chrono::{DateTime, Duration, TimeZone, Utc};
use place_daylight::config::RetryPolicy;
use place_daylight::oracle::{AstronomicalOracle, EventOracle, EventSearch, RetryingOracle};
use place_daylight::{Body, Direction, Observer};

const TOLERANCE_MINUTES: i64 = 4;

fn search(
    body: Body,
    direction: Direction,
    observer: Observer,
    start: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    AstronomicalOracle::new()
        .find_event(&EventSearch::new(body, observer, direction, start, 1.0))
        .unwrap()
}

fn assert_close(actual: DateTime<Utc>, expected: DateTime<Utc>, label: &str) {
    let diff = (actual - expected).num_minutes().abs();
    assert!(
        diff <= TOLERANCE_MINUTES,
        "{label}: expected {expected}, got {actual} ({diff} min off)"
    );
}

#[test]
fn new_york_new_year() {
    let new_york = Observer::new(40.7128, -74.0060, 10.0).unwrap();
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

    let sunrise = search(Body::Sun, Direction::Rising, new_york, start).unwrap();
    let sunset = search(Body::Sun, Direction::Setting, new_york, sunrise).unwrap();

    // 07:20 and 16:39 EST
    assert_close(sunrise, Utc.with_ymd_and_hms(2025, 1, 1, 12, 20, 0).unwrap(), "sunrise");
    assert_close(sunset, Utc.with_ymd_and_hms(2025, 1, 1, 21, 39, 0).unwrap(), "sunset");
}

#[test]
fn sydney_summer_solstice() {
    let sydney = Observer::new(-33.8688, 151.2093, 0.0).unwrap();
    let start = Utc.with_ymd_and_hms(2024, 12, 21, 0, 0, 0).unwrap();

    // From midnight UTC the next sunset is the local evening of the 21st (20:05 AEDT),
    // the next sunrise the local morning of the 22nd (05:42 AEDT).
    let sunset = search(Body::Sun, Direction::Setting, sydney, start).unwrap();
    let sunrise = search(Body::Sun, Direction::Rising, sydney, start).unwrap();

    assert_close(sunset, Utc.with_ymd_and_hms(2024, 12, 21, 9, 5, 0).unwrap(), "sunset");
    assert_close(sunrise, Utc.with_ymd_and_hms(2024, 12, 21, 18, 42, 0).unwrap(), "sunrise");
}

#[test]
fn polar_night_has_no_sunrise() {
    let tromso = Observer::new(69.6492, 18.9553, 10.0).unwrap();
    let start = Utc.with_ymd_and_hms(2024, 12, 21, 0, 0, 0).unwrap();
    assert_eq!(search(Body::Sun, Direction::Rising, tromso, start), None);
    assert_eq!(search(Body::Sun, Direction::Setting, tromso, start), None);
}

#[test]
fn full_moon_rises_near_sunset() {
    let london = Observer::new(51.5074, -0.1278, 11.0).unwrap();
    let start = Utc.with_ymd_and_hms(2025, 1, 13, 0, 0, 0).unwrap();

    let moonrise = search(Body::Moon, Direction::Rising, london, start).unwrap();
    let sunset = search(Body::Sun, Direction::Setting, london, start).unwrap();
    let gap = (moonrise - sunset).num_minutes().abs();
    assert!(gap < 120, "moonrise {moonrise}, sunset {sunset}");
}

#[test]
fn new_moon_rises_near_sunrise() {
    let london = Observer::new(51.5074, -0.1278, 11.0).unwrap();
    let start = Utc.with_ymd_and_hms(2025, 1, 29, 0, 0, 0).unwrap();

    let moonrise = search(Body::Moon, Direction::Rising, london, start).unwrap();
    let sunrise = search(Body::Sun, Direction::Rising, london, start).unwrap();
    let gap = (moonrise - sunrise).num_minutes().abs();
    assert!(gap < 120, "moonrise {moonrise}, sunrise {sunrise}");
}

#[test]
fn moon_rises_on_almost_every_day_of_a_month() {
    let london = Observer::new(51.5074, -0.1278, 11.0).unwrap();
    let first = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

    let moonrises: Vec<_> = (0..31)
        .filter_map(|day| search(Body::Moon, Direction::Rising, london, first + Duration::days(day)))
        .collect();
    assert!(
        (29..=31).contains(&moonrises.len()),
        "{} moonrises in January",
        moonrises.len()
    );

    // The Moon rises roughly 50 minutes later each day.
    let mean_gap = (moonrises[moonrises.len() - 1] - moonrises[0]).num_minutes() as f64
        / (moonrises.len() - 1) as f64;
    assert!((mean_gap - 24.0 * 60.0 - 50.0).abs() < 15.0, "mean gap {mean_gap} min");
}

#[test]
fn moonset_follows_moonrise_within_a_day() {
    let observer = Observer::new(16.5062, 80.6480, 0.0).unwrap();
    let first = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    for day in 0..30 {
        let start = first + Duration::days(day);
        if let Some(moonrise) = search(Body::Moon, Direction::Rising, observer, start) {
            let moonset = search(Body::Moon, Direction::Setting, observer, moonrise).unwrap();
            let hours = (moonset - moonrise).num_minutes() as f64 / 60.0;
            assert!(hours > 9.0 && hours < 16.0, "day {day}: {hours} h");
        }
    }
}

#[test]
fn retrying_wrapper_is_transparent() {
    let observer = Observer::new(48.21, 16.37, 190.0).unwrap();
    let start = Utc.with_ymd_and_hms(2026, 6, 21, 0, 0, 0).unwrap();
    let query = EventSearch::new(Body::Sun, observer, Direction::Rising, start, 1.0);

    let plain = AstronomicalOracle::new().find_event(&query).unwrap();
    let retrying = RetryingOracle::new(AstronomicalOracle::new(), RetryPolicy::default())
        .find_event(&query)
        .unwrap();
    assert_eq!(plain, retrying);
    assert!(plain.is_some());
}
