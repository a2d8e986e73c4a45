//! # Place Daylight
//!
//! Nearest-place ranking and year-long sunlight/moonlight hours for a reference place.
//!
//! Two pipelines share one catalog of populated places:
//! - **Proximity ranking**: great-circle (haversine) distances from the reference place to
//!   every catalog place above a population threshold, closest first, re-sortable by any column.
//! - **Daylight series**: for each day of a year, sunrise, sunset, moonrise and moonset at the
//!   reference place and the resulting hours of sunlight and moonlight.
//!
//! Rise and set times come from an [`oracle::EventOracle`]. The crate ships
//! [`oracle::AstronomicalOracle`], which computes them from low-precision ephemerides
//! (Grena's algorithm no. 3 for the Sun, a truncated Meeus series for the Moon).
//! Days on which the body never crosses the horizon (polar day or night) yield `None`
//! instead of an instant, and the corresponding duration is `None` rather than zero.
//!
//! ## Feature Flags
//!
//! - `rayon`: `DaylightSeriesBuilder::build_year_parallel`, computing days in parallel for
//!   oracles that are `Sync`.
//!
//! ## Quick Start
//!
//! ### Nearest places
//! ```rust
//! use place_daylight::{proximity::ProximityRanker, Place, SortKey, SortOrder};
//!
//! let catalog = vec![
//!     Place::new("Vijayawada", 16.5062, 80.6480, 1_048_240).unwrap(),
//!     Place::new("Guntur", 16.3067, 80.4365, 743_354).unwrap(),
//!     Place::new("Eluru", 16.7107, 81.0952, 250_000).unwrap(),
//! ];
//! let mut table = ProximityRanker::new().rank(&catalog[0], &catalog, 500_000);
//! assert_eq!(table.len(), 2);
//! assert_eq!(table.records()[1].subject_name, "Guntur");
//!
//! table.sort_by(SortKey::SubjectPopulation, SortOrder::Descending);
//! assert_eq!(table.records()[0].subject_name, "Vijayawada");
//! ```
//!
//! ### Daylight series
//! ```rust
//! use place_daylight::{daylight::DaylightSeriesBuilder, oracle::AstronomicalOracle, Observer};
//!
//! let tromso = Observer::new(69.6492, 18.9553, 10.0).unwrap();
//! let days = DaylightSeriesBuilder::new(AstronomicalOracle::new())
//!     .build_year(&tromso, 2025)
//!     .unwrap();
//!
//! assert_eq!(days.len(), 365);
//! // Midnight sun: no sunset, so no defined sunlight duration.
//! assert_eq!(days[171].sunset(), None);
//! assert_eq!(days[171].sunlight_hours(), None);
//! ```
//!
//! ## References
//!
//! - Grena, R. (2012). Five new algorithms for the computation of sun position from 2010 to 2110.
//!   Solar Energy, 86(5), 1323-1337. DOI: <http://dx.doi.org/10.1016/j.solener.2012.01.024>
//! - Meeus, J. (1998). Astronomical Algorithms, 2nd ed., chapters 12, 22 and 47.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery, clippy::all)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::float_cmp, // Exact comparisons of rounded values in tests
)]

// Public API exports
pub use crate::error::{Error, Result};
pub use crate::types::{
    Body, DayRecord, Direction, Observer, Place, ProximityRecord, RenderMode, SortKey, SortOrder,
};

// Core modules
pub mod error;
pub mod types;

// Pipelines
pub mod daylight;
pub mod distance;
pub mod oracle;
pub mod proximity;

// Surroundings
pub mod catalog;
pub mod config;
pub mod pipeline;
pub mod render;
pub mod time;

// Internal modules
mod math;
