//! Core data types: places, observers, proximity records and day records.

use crate::error::check_coordinates;
use crate::math::round_to_decimals;
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Elevation value catalog sources use for "unknown".
pub const ELEVATION_SENTINEL: f64 = -9999.0;

/// A populated place from a catalog.
///
/// Coordinates are validated on construction and on deserialization, so every
/// `Place` in memory carries a latitude in [-90, 90] and a longitude in [-180, 180].
///
/// # Example
/// ```
/// # use place_daylight::Place;
/// let place = Place::new("Vijayawada", 16.5, 80.6, 1_048_240).unwrap();
/// assert_eq!(place.name(), "Vijayawada");
/// assert!(Place::new("Nowhere", 120.0, 0.0, 1).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPlace")]
pub struct Place {
    name: String,
    lat: f64,
    lon: f64,
    population: u64,
    elevation: Option<f64>,
}

/// Wire shape of a place before validation.
#[derive(Deserialize)]
pub(crate) struct RawPlace {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    population: u64,
    #[serde(default, deserialize_with = "deserialize_elevation")]
    elevation: Option<f64>,
}

impl TryFrom<RawPlace> for Place {
    type Error = Error;

    fn try_from(raw: RawPlace) -> Result<Self> {
        Self::new(raw.name, raw.lat, raw.lon, raw.population)
            .map(|place| place.with_elevation(raw.elevation))
    }
}

/// Missing, null, NaN and the -9999 sentinel all mean "unknown".
fn deserialize_elevation<'de, D>(deserializer: D) -> core::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|elevation| is_known_elevation(*elevation)))
}

#[allow(clippy::float_cmp)]
fn is_known_elevation(elevation: f64) -> bool {
    elevation.is_finite() && elevation != ELEVATION_SENTINEL
}

impl Place {
    /// Creates a place with unknown elevation.
    ///
    /// # Errors
    /// Returns `InvalidLatitude` or `InvalidLongitude` for out-of-range coordinates.
    pub fn new(name: impl Into<String>, lat: f64, lon: f64, population: u64) -> Result<Self> {
        check_coordinates(lat, lon)?;
        Ok(Self {
            name: name.into(),
            lat,
            lon,
            population,
            elevation: None,
        })
    }

    /// Returns the place with the given elevation in meters; the sentinel and NaN mean unknown.
    #[must_use]
    pub fn with_elevation(mut self, elevation: Option<f64>) -> Self {
        self.elevation = elevation.filter(|value| is_known_elevation(*value));
        self
    }

    /// Place name, used as the identity key inside a catalog.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.lon
    }

    /// Population count.
    #[must_use]
    pub const fn population(&self) -> u64 {
        self.population
    }

    /// Elevation in meters, if known.
    #[must_use]
    pub const fn elevation(&self) -> Option<f64> {
        self.elevation
    }
}

/// Observer position for rise/set searches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    latitude: f64,
    longitude: f64,
    elevation: f64,
}

impl Observer {
    /// Creates an observer; an unknown (NaN or sentinel) elevation becomes 0.
    ///
    /// # Errors
    /// Returns `InvalidLatitude` or `InvalidLongitude` for out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64, elevation: f64) -> Result<Self> {
        check_coordinates(latitude, longitude)?;
        Ok(Self {
            latitude,
            longitude,
            elevation: normalize_elevation(Some(elevation)),
        })
    }

    /// Observer standing at a catalog place.
    #[must_use]
    pub fn from_place(place: &Place) -> Self {
        Self {
            latitude: place.lat(),
            longitude: place.lon(),
            elevation: normalize_elevation(place.elevation()),
        }
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Elevation in meters (0 when unknown).
    #[must_use]
    pub const fn elevation(&self) -> f64 {
        self.elevation
    }
}

/// Maps unknown elevations to sea level.
#[must_use]
pub fn normalize_elevation(elevation: Option<f64>) -> f64 {
    elevation
        .filter(|value| is_known_elevation(*value))
        .unwrap_or(0.0)
}

/// Celestial body whose horizon crossings are searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    /// The Sun
    Sun,
    /// The Moon
    Moon,
}

/// Direction of a horizon crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Body ascends through the horizon
    Rising,
    /// Body descends through the horizon
    Setting,
}

/// One row of the proximity table: a catalog place measured from the reference place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximityRecord {
    /// Name of the measured place
    pub subject_name: String,
    /// Population of the measured place
    pub subject_population: u64,
    /// Name of the reference place
    pub reference_name: String,
    /// Population of the reference place
    pub reference_population: u64,
    /// Great-circle distance in km, rounded to two decimals
    pub distance_km: f64,
    /// Latitude of the measured place
    pub subject_lat: f64,
    /// Longitude of the measured place
    pub subject_lon: f64,
}

/// Column of a [`ProximityRecord`] the table can be re-sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// `subject_name`
    SubjectName,
    /// `subject_population` (`pop1` in the table view)
    SubjectPopulation,
    /// `reference_name`
    ReferenceName,
    /// `reference_population` (`pop2` in the table view)
    ReferencePopulation,
    /// `distance_km`
    Distance,
    /// `subject_lat`
    SubjectLat,
    /// `subject_lon`
    SubjectLon,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

/// How the map sink draws the proximity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Population bubbles for every record
    #[default]
    Bubble,
    /// Lines from the reference to the nearest records
    Line,
    /// Polygon through the nearest records
    Polygon,
}

impl RenderMode {
    /// Maximum number of records drawn in this mode (`None` = all).
    #[must_use]
    pub const fn record_limit(&self) -> Option<usize> {
        match self {
            Self::Bubble => None,
            Self::Line => Some(15),
            Self::Polygon => Some(10),
        }
    }
}

/// Sunlight and moonlight for one calendar day at one observer.
///
/// Durations are derived from the rise/set instants and are `None` whenever either
/// instant is missing (circumpolar day or night), never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRecord {
    date: NaiveDate,
    sunrise: Option<DateTime<Utc>>,
    sunset: Option<DateTime<Utc>>,
    moonrise: Option<DateTime<Utc>>,
    moonset: Option<DateTime<Utc>>,
    sunlight_hours: Option<f64>,
    moonlight_hours: Option<f64>,
}

impl DayRecord {
    /// Builds a record from the four searched events, deriving both durations.
    #[must_use]
    pub fn from_events(
        date: NaiveDate,
        sunrise: Option<DateTime<Utc>>,
        sunset: Option<DateTime<Utc>>,
        moonrise: Option<DateTime<Utc>>,
        moonset: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            date,
            sunrise,
            sunset,
            moonrise,
            moonset,
            sunlight_hours: span_hours(sunrise, sunset),
            moonlight_hours: span_hours(moonrise, moonset),
        }
    }

    /// Calendar date (UTC) the searches started from.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Sunrise, if one occurred in the search window.
    #[must_use]
    pub const fn sunrise(&self) -> Option<DateTime<Utc>> {
        self.sunrise
    }

    /// Sunset, if one occurred in the search window.
    #[must_use]
    pub const fn sunset(&self) -> Option<DateTime<Utc>> {
        self.sunset
    }

    /// Moonrise, if one occurred in the search window.
    #[must_use]
    pub const fn moonrise(&self) -> Option<DateTime<Utc>> {
        self.moonrise
    }

    /// Moonset, if one occurred in the search window.
    #[must_use]
    pub const fn moonset(&self) -> Option<DateTime<Utc>> {
        self.moonset
    }

    /// Hours between sunrise and sunset; `None` if either is missing.
    #[must_use]
    pub const fn sunlight_hours(&self) -> Option<f64> {
        self.sunlight_hours
    }

    /// Hours between moonrise and moonset; `None` if either is missing.
    #[must_use]
    pub const fn moonlight_hours(&self) -> Option<f64> {
        self.moonlight_hours
    }

    /// Sunlight hours with NaN standing in for "undefined", as chart payloads expect.
    #[must_use]
    pub fn sunlight_hours_or_nan(&self) -> f64 {
        self.sunlight_hours.unwrap_or(f64::NAN)
    }

    /// Moonlight hours with NaN standing in for "undefined".
    #[must_use]
    pub fn moonlight_hours_or_nan(&self) -> f64 {
        self.moonlight_hours.unwrap_or(f64::NAN)
    }
}

/// Two-decimal presentation of an optional duration.
#[must_use]
pub fn rounded_hours(hours: Option<f64>) -> Option<f64> {
    hours.map(|value| round_to_decimals(value, 2))
}

/// Absolute span in hours; undefined unless both instants are present.
fn span_hours(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Option<f64> {
    match (start, end) {
        (Some(start), Some(end)) => {
            let millis = end.signed_duration_since(start).num_milliseconds().abs();
            Some(millis as f64 / 3_600_000.0)
        }
        _ => None,
    }
}
