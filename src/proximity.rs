//! Proximity ranking: which catalog places are nearest to a reference place.
//!
//! The ranker measures every catalog place from the reference, keeps those above a
//! population threshold and returns them closest-first. The resulting
//! [`ProximityTable`] can be re-sorted by any column without recomputing distances.

use crate::distance::distance_between;
use crate::math::round_to_decimals;
use crate::{Place, ProximityRecord, SortKey, SortOrder};
use core::cmp::Ordering;
use log::{debug, warn};

/// How the effective reference place was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceResolution {
    /// The requested place is in the catalog.
    Resolved,
    /// The requested place is missing; the first catalog entry was used instead.
    FellBack {
        /// Name that was requested.
        requested: String,
    },
    /// The catalog is empty; nothing was measured.
    EmptyCatalog,
}

/// Ranking options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProximityRanker {
    exclude_reference: bool,
}

impl ProximityRanker {
    /// Ranker that keeps the reference place itself when it passes the filter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            exclude_reference: false,
        }
    }

    /// Drops catalog entries named like the effective reference.
    #[must_use]
    pub const fn excluding_reference(mut self, exclude: bool) -> Self {
        self.exclude_reference = exclude;
        self
    }

    /// Ranks `catalog` by distance from `reference`, keeping places with
    /// `population > min_population`.
    ///
    /// If `reference` is not in the catalog (matched by name) the first catalog
    /// entry becomes the effective reference.
    #[must_use]
    pub fn rank(&self, reference: &Place, catalog: &[Place], min_population: u64) -> ProximityTable {
        let (effective, resolution) = resolve_reference(reference, catalog);

        let records: Vec<ProximityRecord> = catalog
            .iter()
            .filter(|place| place.population() > min_population)
            .filter(|place| !(self.exclude_reference && place.name() == effective.name()))
            .map(|place| ProximityRecord {
                subject_name: place.name().to_owned(),
                subject_population: place.population(),
                reference_name: effective.name().to_owned(),
                reference_population: effective.population(),
                distance_km: round_to_decimals(distance_between(effective, place), 2),
                subject_lat: place.lat(),
                subject_lon: place.lon(),
            })
            .collect();

        debug!(
            "ranked {} of {} places from `{}` (min population {min_population})",
            records.len(),
            catalog.len(),
            effective.name()
        );

        let mut table = ProximityTable {
            reference: effective.clone(),
            resolution,
            records,
            order: (SortKey::Distance, SortOrder::Ascending),
        };
        table.sort_by(SortKey::Distance, SortOrder::Ascending);
        table
    }
}

/// Ranks with default options. See [`ProximityRanker::rank`].
///
/// # Example
/// ```
/// # use place_daylight::{proximity::rank, Place};
/// let catalog = vec![
///     Place::new("A", 0.0, 0.0, 10).unwrap(),
///     Place::new("B", 0.0, 1.0, 20).unwrap(),
///     Place::new("C", 0.0, 2.0, 5).unwrap(),
/// ];
/// let table = rank(&catalog[0], &catalog, 8);
/// let names: Vec<_> = table.records().iter().map(|r| r.subject_name.as_str()).collect();
/// assert_eq!(names, ["A", "B"]);
/// ```
#[must_use]
pub fn rank(reference: &Place, catalog: &[Place], min_population: u64) -> ProximityTable {
    ProximityRanker::new().rank(reference, catalog, min_population)
}

fn resolve_reference<'a>(
    reference: &'a Place,
    catalog: &'a [Place],
) -> (&'a Place, ReferenceResolution) {
    if let Some(found) = catalog.iter().find(|place| place.name() == reference.name()) {
        return (found, ReferenceResolution::Resolved);
    }
    match catalog.first() {
        Some(first) => {
            warn!(
                "reference `{}` not in catalog, falling back to `{}`",
                reference.name(),
                first.name()
            );
            (
                first,
                ReferenceResolution::FellBack {
                    requested: reference.name().to_owned(),
                },
            )
        }
        None => (reference, ReferenceResolution::EmptyCatalog),
    }
}

/// Ranked proximity records for one reference place.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityTable {
    reference: Place,
    resolution: ReferenceResolution,
    records: Vec<ProximityRecord>,
    order: (SortKey, SortOrder),
}

impl ProximityTable {
    /// The place distances were measured from.
    #[must_use]
    pub const fn reference(&self) -> &Place {
        &self.reference
    }

    /// Whether the requested reference was found or replaced.
    #[must_use]
    pub const fn resolution(&self) -> &ReferenceResolution {
        &self.resolution
    }

    /// Records in the current view order.
    #[must_use]
    pub fn records(&self) -> &[ProximityRecord] {
        &self.records
    }

    /// Current view order.
    #[must_use]
    pub const fn order(&self) -> (SortKey, SortOrder) {
        self.order
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no place passed the filter.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reorders the records by one column. Stable: ties keep their previous order.
    pub fn sort_by(&mut self, key: SortKey, order: SortOrder) {
        self.records.sort_by(|a, b| {
            let ordering = compare_by(a, b, key);
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
        self.order = (key, order);
    }

    /// Consumes the table, returning its records.
    #[must_use]
    pub fn into_records(self) -> Vec<ProximityRecord> {
        self.records
    }
}

fn compare_by(a: &ProximityRecord, b: &ProximityRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::SubjectName => a.subject_name.cmp(&b.subject_name),
        SortKey::SubjectPopulation => a.subject_population.cmp(&b.subject_population),
        SortKey::ReferenceName => a.reference_name.cmp(&b.reference_name),
        SortKey::ReferencePopulation => a.reference_population.cmp(&b.reference_population),
        SortKey::Distance => a.distance_km.total_cmp(&b.distance_km),
        SortKey::SubjectLat => a.subject_lat.total_cmp(&b.subject_lat),
        SortKey::SubjectLon => a.subject_lon.total_cmp(&b.subject_lon),
    }
}
