//! Spatial fallback resolution of city and zone-category clauses.
//!
//! City attributes on parcels are frequently null or stale, while municipal
//! boundary polygons are authoritative. City resolution therefore runs as
//! ordered tiers, cheapest first:
//!
//! 1. attribute check: the parcel's own `city`, normalized, against the
//!    requested names;
//! 2. name lookup: boundaries whose normalized key matches a requested
//!    name (done once per search, in [`GeometryStore::city_filter`]);
//! 3. geometry: interior overlap of the parcel with those boundaries.
//!
//! Zone resolution always uses full-geometry overlap. A parcel that
//! overlaps a zone only near its edge still matches; centroid containment
//! is not used. A parcel that merely shares a lot line with a boundary or
//! zone does not match (see [`geometry::interiors_overlap`]).

use std::collections::BTreeSet;

use geo::MultiPolygon;
use parcel_map_places::{name_matches, normalize_city};
use parcel_map_zoning_models::ZoneCategory;
use rstar::Envelope;

use crate::{GeometryStore, geometry};

/// How (or whether) a parcel satisfied a city clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CityResolution {
    /// The parcel's attribute city matched; no spatial work was done.
    Attribute,
    /// The parcel's geometry overlaps a matching municipal boundary.
    Boundary,
    /// Neither tier matched.
    Unresolved,
}

impl CityResolution {
    /// Returns `true` for either matching tier.
    #[must_use]
    pub const fn is_match(self) -> bool {
        matches!(self, Self::Attribute | Self::Boundary)
    }
}

/// A city clause prepared against a specific store: requested names
/// normalized, and the matching boundaries looked up.
#[derive(Debug, Clone, Default)]
pub struct CityFilter {
    requested: Vec<String>,
    boundary_indices: Vec<usize>,
}

impl CityFilter {
    /// Normalized requested city names.
    #[must_use]
    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    /// Number of boundaries whose name matched a requested city.
    #[must_use]
    pub const fn boundary_count(&self) -> usize {
        self.boundary_indices.len()
    }
}

impl GeometryStore {
    /// Normalizes requested city names and finds the boundaries they name.
    ///
    /// Unknown names simply find no boundary; blank names are dropped.
    #[must_use]
    pub fn city_filter<S: AsRef<str>>(&self, cities: &[S]) -> CityFilter {
        let requested: Vec<String> = cities
            .iter()
            .map(|c| normalize_city(c.as_ref()))
            .filter(|c| !c.is_empty())
            .collect();

        let boundary_indices = self
            .boundaries
            .iter()
            .enumerate()
            .filter(|(_, b)| {
                requested
                    .iter()
                    .any(|r| name_matches(&b.boundary.name_key, r))
            })
            .map(|(i, _)| i)
            .collect();

        CityFilter {
            requested,
            boundary_indices,
        }
    }

    /// Decides whether a parcel satisfies a city clause.
    #[must_use]
    pub fn resolve_city(
        &self,
        geometry: Option<&MultiPolygon<f64>>,
        attribute_city: Option<&str>,
        filter: &CityFilter,
    ) -> CityResolution {
        if attribute_city_matches(attribute_city, &filter.requested) {
            return CityResolution::Attribute;
        }

        if filter.boundary_indices.is_empty() {
            return CityResolution::Unresolved;
        }

        let Some(geometry) = geometry else {
            return CityResolution::Unresolved;
        };

        let parcel_env = geometry::compute_envelope(geometry);
        let overlaps_any = filter.boundary_indices.iter().any(|&i| {
            let boundary = &self.boundaries[i];
            boundary.envelope.intersects(&parcel_env)
                && geometry::interiors_overlap(&boundary.polygon, geometry)
        });

        if overlaps_any {
            CityResolution::Boundary
        } else {
            CityResolution::Unresolved
        }
    }

    /// Name of the municipal boundary a parcel geometry lies in, used to
    /// fill a null city attribute when a parcel is opened in detail.
    ///
    /// Every boundary overlapping the geometry is a candidate; the
    /// smallest wins, as in [`GeometryStore::city_at`].
    #[must_use]
    pub fn city_for(&self, geometry: &MultiPolygon<f64>) -> Option<&str> {
        let query_env = geometry::compute_envelope(geometry);
        self.boundary_tree
            .locate_in_envelope_intersecting(&query_env)
            .map(|slot| &self.boundaries[slot.index])
            .filter(|b| geometry::interiors_overlap(&b.polygon, geometry))
            .min_by(|a, b| a.area.total_cmp(&b.area))
            .map(|b| b.boundary.name.as_str())
    }

    /// Returns `true` if the geometry overlaps at least one zone whose
    /// category is in `categories`. Parcels without geometry never match.
    #[must_use]
    pub fn resolve_zone(
        &self,
        geometry: Option<&MultiPolygon<f64>>,
        categories: &BTreeSet<ZoneCategory>,
    ) -> bool {
        let Some(geometry) = geometry else {
            return false;
        };
        if categories.is_empty() {
            return false;
        }

        self.zone_candidates(geometry)
            .into_iter()
            .filter(|z| categories.contains(&z.zone.category))
            .any(|z| geometry::interiors_overlap(z.polygon(), geometry))
    }

    /// Distinct categories of every zone the geometry overlaps, sorted.
    #[must_use]
    pub fn zone_categories_at(&self, geometry: &MultiPolygon<f64>) -> Vec<ZoneCategory> {
        self.zone_candidates(geometry)
            .into_iter()
            .filter(|z| geometry::interiors_overlap(z.polygon(), geometry))
            .map(|z| z.zone.category)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn attribute_city_matches(attribute_city: Option<&str>, requested: &[String]) -> bool {
    let Some(city) = attribute_city else {
        return false;
    };
    let city = normalize_city(city);
    !city.is_empty() && requested.iter().any(|r| name_matches(&city, r))
}
