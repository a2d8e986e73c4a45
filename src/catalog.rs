//! Place catalogs: validated ingestion, region keys and a freshness-aware cache.

use crate::config::Config;
use crate::types::RawPlace;
use crate::{Error, Place, Result};
use chrono::{DateTime, Duration, Utc};
use core::fmt;
use core::str::FromStr;
use log::{debug, info};
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

/// Key a catalog source is queried with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Region {
    /// All places of one country.
    Country(String),
    /// The `n` most populous places (`"Top250"`).
    Top(u32),
    /// Places with population in `[min, max)` (`"$Range_0_100000"`).
    PopulationRange {
        /// Lower population bound
        min: u64,
        /// Upper population bound
        max: u64,
    },
}

impl Region {
    /// The preset region keys offered next to the country list.
    #[must_use]
    pub fn presets() -> Vec<Self> {
        let mut presets = vec![Self::Top(250), Self::Top(100), Self::Top(50)];
        presets.extend((0..100).step_by(5).map(|i| Self::PopulationRange {
            min: i * 100_000,
            max: (i + 5) * 100_000,
        }));
        presets.push(Self::PopulationRange {
            min: 0,
            max: 100_000,
        });
        presets.push(Self::PopulationRange {
            min: 5_000_000,
            max: 100_000_000,
        });
        presets
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Country(name) => f.write_str(name),
            Self::Top(n) => write!(f, "Top{n}"),
            Self::PopulationRange { min, max } => write!(f, "$Range_{min}_{max}"),
        }
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::catalog_format("region key is empty"));
        }
        if let Some(bounds) = s.strip_prefix("$Range_") {
            let (min, max) = bounds
                .split_once('_')
                .ok_or_else(|| Error::catalog_format(format!("malformed range `{s}`")))?;
            let parse = |value: &str| {
                value
                    .parse::<u64>()
                    .map_err(|_| Error::catalog_format(format!("malformed range `{s}`")))
            };
            return Ok(Self::PopulationRange {
                min: parse(min)?,
                max: parse(max)?,
            });
        }
        if let Some(count) = s.strip_prefix("Top") {
            if let Ok(n) = count.parse::<u32>() {
                return Ok(Self::Top(n));
            }
        }
        Ok(Self::Country(s.to_owned()))
    }
}

/// The candidate places of one region.
///
/// Immutable once built; replaced wholesale when the region changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    region: Region,
    places: Vec<Place>,
}

impl Catalog {
    /// Wraps already validated places.
    #[must_use]
    pub fn new(region: Region, places: Vec<Place>) -> Self {
        Self { region, places }
    }

    /// Parses the JSON array a catalog source returns.
    ///
    /// # Errors
    /// Returns `CatalogFormat` for malformed JSON and `InvalidLatitude`/`InvalidLongitude`
    /// for the first out-of-range coordinate.
    pub fn from_json_str(region: Region, json: &str) -> Result<Self> {
        let raw: Vec<RawPlace> = serde_json::from_str(json)?;
        let places = raw
            .into_iter()
            .map(Place::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(region, places))
    }

    /// Parses CSV with a `name,lat,lon,population,elevation` header.
    ///
    /// # Errors
    /// Returns `CatalogFormat` for malformed rows and `InvalidLatitude`/`InvalidLongitude`
    /// for the first out-of-range coordinate.
    pub fn from_csv_reader<R: Read>(region: Region, reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut places = Vec::new();
        for row in csv_reader.deserialize::<RawPlace>() {
            places.push(Place::try_from(row?)?);
        }
        Ok(Self::new(region, places))
    }

    /// Region this catalog was fetched for.
    #[must_use]
    pub const fn region(&self) -> &Region {
        &self.region
    }

    /// Places in source order.
    #[must_use]
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// First place in source order.
    #[must_use]
    pub fn first(&self) -> Option<&Place> {
        self.places.first()
    }

    /// Looks a place up by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Place> {
        self.places.iter().find(|place| place.name() == name)
    }

    /// Looks a place up by name, failing when absent.
    ///
    /// # Errors
    /// Returns `MissingReference` if no place has that name.
    pub fn require(&self, name: &str) -> Result<&Place> {
        self.find(name).ok_or_else(|| Error::missing_reference(name))
    }

    /// Number of places.
    #[must_use]
    pub fn len(&self) -> usize {
        self.places.len()
    }

    /// Whether the catalog has no places.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

/// Remote (or local) provider of place lists.
pub trait CatalogSource {
    /// Fetches the ordered place list for a region.
    ///
    /// # Errors
    /// Implementations report transport or format failures.
    fn fetch(&self, region: &Region) -> Result<Vec<Place>>;
}

impl<S: CatalogSource + ?Sized> CatalogSource for &S {
    fn fetch(&self, region: &Region) -> Result<Vec<Place>> {
        (**self).fetch(region)
    }
}

/// Source of the current time, injectable for cache tests.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    catalog: Arc<Catalog>,
    fetched_at: DateTime<Utc>,
}

/// Catalog cache keyed by region, each entry stamped with its fetch time.
///
/// Entries older than the TTL are refetched on the next lookup; `invalidate`
/// drops an entry immediately.
#[derive(Debug)]
pub struct CatalogCache<S, C = SystemClock> {
    source: S,
    clock: C,
    ttl: Duration,
    entries: HashMap<Region, CacheEntry>,
}

impl<S: CatalogSource> CatalogCache<S> {
    /// Cache over `source` using the wall clock.
    #[must_use]
    pub fn new(source: S, ttl: Duration) -> Self {
        Self::with_clock(source, ttl, SystemClock)
    }

    /// Cache over `source` with the configured `cache_ttl_secs`.
    #[must_use]
    pub fn from_config(source: S, config: &Config) -> Self {
        Self::new(source, config.cache_ttl())
    }
}

impl<S: CatalogSource, C: Clock> CatalogCache<S, C> {
    /// Cache over `source` using a custom clock.
    #[must_use]
    pub fn with_clock(source: S, ttl: Duration, clock: C) -> Self {
        Self {
            source,
            clock,
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Returns the cached catalog for `region`, fetching it if absent or stale.
    ///
    /// # Errors
    /// Propagates source failures; a failed refresh leaves the stale entry untouched.
    pub fn get(&mut self, region: &Region) -> Result<Arc<Catalog>> {
        let now = self.clock.now();
        if let Some(entry) = self.entries.get(region) {
            if now.signed_duration_since(entry.fetched_at) < self.ttl {
                debug!("catalog cache hit for `{region}`");
                return Ok(Arc::clone(&entry.catalog));
            }
            debug!("catalog cache entry for `{region}` expired");
        }

        let places = self.source.fetch(region)?;
        info!("fetched {} places for `{region}`", places.len());
        let catalog = Arc::new(Catalog::new(region.clone(), places));
        self.entries.insert(
            region.clone(),
            CacheEntry {
                catalog: Arc::clone(&catalog),
                fetched_at: now,
            },
        );
        Ok(catalog)
    }

    /// How long an entry stays fresh.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// When the entry for `region` was fetched, if cached.
    #[must_use]
    pub fn fetched_at(&self, region: &Region) -> Option<DateTime<Utc>> {
        self.entries.get(region).map(|entry| entry.fetched_at)
    }

    /// Drops the entry for `region`.
    pub fn invalidate(&mut self, region: &Region) {
        self.entries.remove(region);
    }

    /// Drops every entry.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }
}
