//! Whole-year daylight series computed with the built-in oracle.

use chrono::{Datelike, NaiveDate};
use place_daylight::config::DayCount;
use place_daylight::daylight::DaylightSeriesBuilder;
use place_daylight::oracle::AstronomicalOracle;
use place_daylight::types::rounded_hours;
use place_daylight::{DayRecord, Observer};

fn year(latitude: f64, longitude: f64, year: i32) -> Vec<DayRecord> {
    let observer = Observer::new(latitude, longitude, 0.0).unwrap();
    DaylightSeriesBuilder::new(AstronomicalOracle::new())
        .build_year(&observer, year)
        .unwrap()
}

fn day_of(days: &[DayRecord], month: u32, day: u32) -> &DayRecord {
    days.iter()
        .find(|record| record.date().month() == month && record.date().day() == day)
        .unwrap()
}

#[test]
fn every_observer_gets_one_record_per_day() {
    for (lat, lon) in [(0.0, 0.0), (-89.9, 0.0), (-45.0, 179.9), (64.0, -179.9)] {
        let days = year(lat, lon, 2025);
        assert_eq!(days.len(), 365, "({lat}, {lon})");
        assert_eq!(days[0].date(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(days
            .windows(2)
            .all(|pair| pair[1].date() == pair[0].date().succ_opt().unwrap()));
    }
}

#[test]
fn high_arctic_has_midnight_sun_and_polar_night() {
    let days = year(80.0, 0.0, 2025);

    let midsummer = day_of(&days, 6, 21);
    assert_eq!(midsummer.sunrise(), None);
    assert_eq!(midsummer.sunset(), None);
    assert_eq!(midsummer.sunlight_hours(), None);
    assert!(midsummer.sunlight_hours_or_nan().is_nan());

    let midwinter = day_of(&days, 12, 21);
    assert_eq!(midwinter.sunrise(), None);
    assert_eq!(midwinter.sunlight_hours(), None);
}

#[test]
fn equinox_at_the_equator_is_just_over_twelve_hours() {
    let days = year(0.0, 0.0, 2025);
    let hours = day_of(&days, 3, 20).sunlight_hours().unwrap();
    assert!((12.0..=12.3).contains(&hours), "got {hours} h");
}

#[test]
fn tropical_city_sunlight_stays_within_seasonal_range() {
    let days = year(16.5062, 80.6480, 2025);
    for record in &days {
        let hours = record.sunlight_hours().unwrap();
        assert!(hours > 10.5 && hours < 13.5, "{}: {hours} h", record.date());
        assert!(record.sunset().unwrap() > record.sunrise().unwrap());
    }

    let december = day_of(&days, 12, 21).sunlight_hours().unwrap();
    let june = day_of(&days, 6, 21).sunlight_hours().unwrap();
    assert!(june - december > 1.5, "june {june}, december {december}");
}

#[test]
fn moon_misses_a_handful_of_days_each_year() {
    let days = year(48.21, 16.37, 2025);
    let with_moonrise = days.iter().filter(|d| d.moonrise().is_some()).count();
    assert!(
        (340..=362).contains(&with_moonrise),
        "{with_moonrise} days with a moonrise"
    );

    for record in &days {
        if let Some(hours) = record.moonlight_hours() {
            assert!(hours > 0.0 && hours <= 24.0, "{}: {hours} h", record.date());
        }
    }
}

#[test]
fn presented_durations_have_two_decimals() {
    let days = year(51.5074, -0.1278, 2024);
    assert_eq!(days.len(), 365);
    for record in &days {
        let hours = rounded_hours(record.sunlight_hours()).unwrap();
        assert!(((hours * 100.0).round() - hours * 100.0).abs() < 1e-6, "{hours}");
        assert!((hours - record.sunlight_hours().unwrap()).abs() <= 0.005 + 1e-9);
    }
}

#[test]
fn calendar_year_counts_leap_day() {
    let observer = Observer::new(51.5074, -0.1278, 11.0).unwrap();
    let days = DaylightSeriesBuilder::new(AstronomicalOracle::new())
        .with_day_count(DayCount::CalendarYear)
        .build_year(&observer, 2024)
        .unwrap();
    assert_eq!(days.len(), 366);
    assert_eq!(days[365].date(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
}

#[test]
fn series_is_deterministic() {
    assert_eq!(year(-33.8688, 151.2093, 2026), year(-33.8688, 151.2093, 2026));
}
