#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory geometry store for parcel search.
//!
//! Holds the three polygon collections the search engine queries (parcels,
//! zoning polygons, municipal boundaries) behind R-tree indexes. A store is
//! built once by [`GeometryStoreBuilder`] and is immutable afterwards;
//! concurrent searches share it through an `Arc` without locking, and a
//! refresh builds a new store rather than mutating the old one.

pub mod geometry;
pub mod resolver;

use std::collections::BTreeMap;

use geo::{Area, Centroid, Contains, Intersects, MultiPolygon, Rect};
use parcel_map_parcel_models::{
    AcreageSource, BoundingBox, MunicipalBoundary, Parcel, Zone, effective_acreage,
};
use parcel_map_zoning_models::ZoneLabels;
use rstar::{AABB, RTree, RTreeObject};

pub use resolver::{CityFilter, CityResolution};

/// A parcel row with its geometry and cached geometry-derived acreage.
#[derive(Debug, Clone)]
pub struct ParcelEntry {
    /// Attribute row.
    pub parcel: Parcel,
    /// WGS84 geometry, if the import supplied a valid one.
    pub geometry: Option<MultiPolygon<f64>>,
    /// Geodesic area of `geometry` in acres.
    pub geometry_acres: Option<f64>,
}

impl ParcelEntry {
    /// Effective acreage: assessor, then legacy, then geometry-computed.
    #[must_use]
    pub fn acreage(&self) -> Option<(f64, AcreageSource)> {
        effective_acreage(
            self.parcel.parcel_acres,
            self.parcel.size_acres,
            self.geometry_acres,
        )
    }
}

/// Envelope of a parcel, pointing back into the parcel vector.
struct ParcelSlot {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for ParcelSlot {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// A zone polygon stored in the R-tree with its attribute row.
#[derive(Debug)]
pub struct ZoneEntry {
    /// Attribute row, including the stored canonical category.
    pub zone: Zone,
    polygon: MultiPolygon<f64>,
    envelope: AABB<[f64; 2]>,
}

impl ZoneEntry {
    /// The zone's geometry.
    #[must_use]
    pub const fn polygon(&self) -> &MultiPolygon<f64> {
        &self.polygon
    }
}

impl RTreeObject for ZoneEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// A municipal boundary polygon with its attribute row.
#[derive(Debug)]
pub struct BoundaryEntry {
    /// Name and normalized lookup key.
    pub boundary: MunicipalBoundary,
    polygon: MultiPolygon<f64>,
    envelope: AABB<[f64; 2]>,
    /// Planar area, used only to rank overlapping boundaries.
    area: f64,
}

/// Envelope of a boundary, pointing back into the boundary vector.
struct BoundarySlot {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for BoundarySlot {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Immutable, indexed snapshot of parcels, zones, and municipal
/// boundaries.
pub struct GeometryStore {
    parcels: Vec<ParcelEntry>,
    parcel_tree: RTree<ParcelSlot>,
    by_apn: BTreeMap<String, usize>,
    zones: RTree<ZoneEntry>,
    boundaries: Vec<BoundaryEntry>,
    boundary_tree: RTree<BoundarySlot>,
}

impl GeometryStore {
    /// Starts building a new store.
    #[must_use]
    pub fn builder() -> GeometryStoreBuilder {
        GeometryStoreBuilder::default()
    }

    /// All parcels, in insertion order.
    #[must_use]
    pub fn parcels(&self) -> &[ParcelEntry] {
        &self.parcels
    }

    /// Looks up a parcel by APN.
    #[must_use]
    pub fn parcel(&self, apn: &str) -> Option<&ParcelEntry> {
        self.by_apn.get(apn).map(|&i| &self.parcels[i])
    }

    /// Number of parcels.
    #[must_use]
    pub fn parcel_count(&self) -> usize {
        self.parcels.len()
    }

    /// Number of zones.
    #[must_use]
    pub fn zone_count(&self) -> usize {
        self.zones.size()
    }

    /// Number of municipal boundaries.
    #[must_use]
    pub fn boundary_count(&self) -> usize {
        self.boundaries.len()
    }

    /// All municipal boundaries.
    pub fn boundaries(&self) -> impl Iterator<Item = &BoundaryEntry> {
        self.boundaries.iter()
    }

    /// All zones, in no particular order.
    pub fn zones(&self) -> impl Iterator<Item = &ZoneEntry> {
        self.zones.iter()
    }

    /// Indices (into [`Self::parcels`]) of parcels whose geometry
    /// intersects `bbox`. Parcels without geometry are never returned.
    #[must_use]
    pub fn parcel_indices_in_bbox(&self, bbox: &BoundingBox) -> Vec<usize> {
        let rect = Rect::new(
            geo::coord! { x: bbox.west, y: bbox.south },
            geo::coord! { x: bbox.east, y: bbox.north },
        );
        let query_env = AABB::from_corners([bbox.west, bbox.south], [bbox.east, bbox.north]);

        let mut indices: Vec<usize> = self
            .parcel_tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|slot| {
                self.parcels[slot.index]
                    .geometry
                    .as_ref()
                    .is_some_and(|g| g.intersects(&rect))
            })
            .map(|slot| slot.index)
            .collect();
        indices.sort_unstable();
        indices
    }

    /// Zones whose envelope intersects the given geometry's envelope.
    /// Callers still need an exact intersection test.
    #[must_use]
    pub fn zone_candidates(&self, geometry: &MultiPolygon<f64>) -> Vec<&ZoneEntry> {
        let query_env = geometry::compute_envelope(geometry);
        self.zones
            .locate_in_envelope_intersecting(&query_env)
            .collect()
    }

    /// Name of the municipal boundary containing a point.
    ///
    /// Boundaries can overlap; the smallest area wins.
    #[must_use]
    pub fn city_at(&self, lng: f64, lat: f64) -> Option<&str> {
        let point = geo::Point::new(lng, lat);
        let query_env = AABB::from_point([lng, lat]);

        let mut best: Option<&BoundaryEntry> = None;

        for slot in self.boundary_tree.locate_in_envelope_intersecting(&query_env) {
            let entry = &self.boundaries[slot.index];
            if entry.polygon.contains(&point) {
                match best {
                    None => best = Some(entry),
                    Some(current) if entry.area < current.area => {
                        best = Some(entry);
                    }
                    _ => {}
                }
            }
        }

        best.map(|e| e.boundary.name.as_str())
    }
}

/// Accumulates rows and builds a [`GeometryStore`].
///
/// Later rows replace earlier rows with the same key (APN for parcels, id
/// for zones).
#[derive(Default)]
pub struct GeometryStoreBuilder {
    parcels: Vec<ParcelEntry>,
    by_apn: BTreeMap<String, usize>,
    zones: BTreeMap<i64, (Zone, MultiPolygon<f64>)>,
    boundaries: Vec<(MunicipalBoundary, MultiPolygon<f64>)>,
}

impl GeometryStoreBuilder {
    /// Adds a parcel. Geometry-derived acreage is computed here, once.
    pub fn add_parcel(
        &mut self,
        parcel: Parcel,
        geometry: Option<MultiPolygon<f64>>,
    ) -> &mut Self {
        let geometry_acres = geometry.as_ref().and_then(geometry::geodesic_acres);
        let apn = parcel.apn.clone();
        let entry = ParcelEntry {
            parcel,
            geometry,
            geometry_acres,
        };

        if let Some(&existing) = self.by_apn.get(&apn) {
            log::debug!("Replacing duplicate parcel {apn}");
            self.parcels[existing] = entry;
        } else {
            self.by_apn.insert(apn, self.parcels.len());
            self.parcels.push(entry);
        }
        self
    }

    /// Adds a zone whose category was already computed on its write path.
    pub fn add_zone(&mut self, zone: Zone, geometry: MultiPolygon<f64>) -> &mut Self {
        self.zones.insert(zone.id, (zone, geometry));
        self
    }

    /// Inserts or replaces a zone from raw labels, classifying it as part
    /// of the same step so the stored category can never lag its labels.
    pub fn upsert_zone(
        &mut self,
        id: i64,
        labels: ZoneLabels,
        municipality: Option<String>,
        geometry: MultiPolygon<f64>,
    ) -> &mut Self {
        let category = parcel_map_zoning::classify_labels(&labels);
        self.add_zone(
            Zone {
                id,
                labels,
                category,
                municipality,
            },
            geometry,
        )
    }

    /// Adds a municipal boundary. Its lookup key is produced by the same
    /// city normalizer applied to query-side city filters.
    pub fn add_boundary(&mut self, name: &str, geometry: MultiPolygon<f64>) -> &mut Self {
        let boundary = MunicipalBoundary {
            name: name.trim().to_string(),
            name_key: parcel_map_places::normalize_city(name),
        };
        self.boundaries.push((boundary, geometry));
        self
    }

    /// Builds the R-tree indexes and infers missing zone municipalities.
    #[must_use]
    pub fn build(self) -> GeometryStore {
        let boundaries: Vec<BoundaryEntry> = self
            .boundaries
            .into_iter()
            .map(|(boundary, polygon)| BoundaryEntry {
                envelope: geometry::compute_envelope(&polygon),
                area: polygon.unsigned_area(),
                boundary,
                polygon,
            })
            .collect();

        let boundary_tree = RTree::bulk_load(
            boundaries
                .iter()
                .enumerate()
                .map(|(index, b)| BoundarySlot {
                    index,
                    envelope: b.envelope,
                })
                .collect(),
        );

        let parcel_tree = RTree::bulk_load(
            self.parcels
                .iter()
                .enumerate()
                .filter_map(|(index, p)| {
                    p.geometry.as_ref().map(|g| ParcelSlot {
                        index,
                        envelope: geometry::compute_envelope(g),
                    })
                })
                .collect(),
        );

        let mut store = GeometryStore {
            parcels: self.parcels,
            parcel_tree,
            by_apn: self.by_apn,
            zones: RTree::new(),
            boundaries,
            boundary_tree,
        };

        let mut inferred = 0usize;
        let zones: Vec<ZoneEntry> = self
            .zones
            .into_values()
            .map(|(mut zone, polygon)| {
                if zone.municipality.is_none() {
                    zone.municipality = polygon
                        .centroid()
                        .and_then(|c| store.city_at(c.x(), c.y()))
                        .map(String::from);
                    if zone.municipality.is_some() {
                        inferred += 1;
                    }
                }
                ZoneEntry {
                    envelope: geometry::compute_envelope(&polygon),
                    zone,
                    polygon,
                }
            })
            .collect();
        store.zones = RTree::bulk_load(zones);

        log::info!(
            "Built geometry store: {} parcels, {} zones ({inferred} with inferred municipality), {} boundaries",
            store.parcel_count(),
            store.zone_count(),
            store.boundary_count()
        );

        store
    }
}
