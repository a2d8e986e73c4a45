//! Prints a monthly digest of a year of sunlight and moonlight at one place.
//!
//! ```text
//! RUST_LOG=debug cargo run --example yearly_daylight -- [latitude] [longitude] [year]
//! ```

use chrono::Datelike;
use place_daylight::daylight::DaylightSeriesBuilder;
use place_daylight::oracle::AstronomicalOracle;
use place_daylight::types::rounded_hours;
use place_daylight::{DayRecord, Observer};

fn format_hours(hours: Option<f64>) -> String {
    rounded_hours(hours).map_or_else(|| "-".to_owned(), |h| format!("{h:.2}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")?.start()?;

    let mut args = std::env::args().skip(1);
    let latitude: f64 = args.next().map_or(Ok(69.6492), |s| s.parse())?;
    let longitude: f64 = args.next().map_or(Ok(18.9553), |s| s.parse())?;
    let year: i32 = args.next().map_or(Ok(2025), |s| s.parse())?;

    let observer = Observer::new(latitude, longitude, 0.0)?;
    let started = std::time::Instant::now();
    let days = DaylightSeriesBuilder::new(AstronomicalOracle::new()).build_year(&observer, year)?;
    log::info!("{} days computed in {:?}", days.len(), started.elapsed());

    println!("Daylight at ({latitude}, {longitude}) in {year}, first day of each month (UTC):");
    println!(
        "{:<12} {:>8} {:>8} {:>9} {:>8} {:>8} {:>9}",
        "date", "sunrise", "sunset", "sun h", "moonrise", "moonset", "moon h"
    );
    let time = |instant: Option<chrono::DateTime<chrono::Utc>>| {
        instant.map_or_else(|| "-".to_owned(), |t| t.format("%H:%M").to_string())
    };
    for record in days.iter().filter(|d| d.date().day() == 1) {
        println!(
            "{:<12} {:>8} {:>8} {:>9} {:>8} {:>8} {:>9}",
            record.date(),
            time(record.sunrise()),
            time(record.sunset()),
            format_hours(record.sunlight_hours()),
            time(record.moonrise()),
            time(record.moonset()),
            format_hours(record.moonlight_hours()),
        );
    }

    let undefined = days.iter().filter(|d| d.sunlight_hours().is_none()).count();
    let total: f64 = days.iter().filter_map(DayRecord::sunlight_hours).sum();
    println!("{undefined} days without a sunrise/sunset pair; {total:.0} h of sunlight otherwise");

    Ok(())
}
