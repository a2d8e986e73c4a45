//! Ranks the catalog by distance from a reference place.
//!
//! ```text
//! cargo run --example nearest_places -- [catalog.csv] [reference] [min_population] [sort_key]
//! ```

use place_daylight::catalog::{Catalog, Region};
use place_daylight::proximity::{ProximityRanker, ReferenceResolution};
use place_daylight::{SortKey, SortOrder};
use std::fs::File;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")?.start()?;

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .unwrap_or_else(|| "tests/data/catalog.csv".to_owned());
    let reference = args.next().unwrap_or_else(|| "Vijayawada".to_owned());
    let min_population: u64 = args.next().map_or(Ok(500_000), |s| s.parse())?;
    let sort_key = match args.next().as_deref() {
        Some("name") => SortKey::SubjectName,
        Some("population") => SortKey::SubjectPopulation,
        _ => SortKey::Distance,
    };

    let catalog = Catalog::from_csv_reader(Region::Country("local".into()), File::open(&path)?)?;
    log::info!("loaded {} places from {path}", catalog.len());

    let requested = catalog
        .find(&reference)
        .or_else(|| catalog.first())
        .ok_or("catalog is empty")?;
    let mut table = ProximityRanker::new().rank(requested, catalog.places(), min_population);
    if sort_key != SortKey::Distance {
        table.sort_by(sort_key, SortOrder::Descending);
    }

    if let ReferenceResolution::FellBack { requested } = table.resolution() {
        println!("{requested} is not in the catalog; using {}", table.reference().name());
    }
    println!(
        "Places with population above {min_population} around {}:",
        table.reference().name()
    );
    println!("{:<20} {:>12} {:>10}", "place", "population", "km");
    for record in table.records() {
        println!(
            "{:<20} {:>12} {:>10.2}",
            record.subject_name, record.subject_population, record.distance_km
        );
    }

    Ok(())
}
