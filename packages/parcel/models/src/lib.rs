#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Parcel, zone, and boundary row types and search query definitions.
//!
//! Attribute fields are populated inconsistently across import vintages,
//! so every attribute is an explicit `Option`. The null policy of each
//! search predicate is documented on [`ParcelFilter`].

use parcel_map_zoning_models::{ZoneCategory, ZoneLabels};
use serde::{Deserialize, Serialize};

/// Square meters per acre.
pub const SQ_METERS_PER_ACRE: f64 = 4_046.856_422_4;

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Returns `true` if all edges are finite and `west <= east`,
    /// `south <= north`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.west, self.south, self.east, self.north]
            .iter()
            .all(|v| v.is_finite())
            && self.west <= self.east
            && self.south <= self.north
    }
}

/// A parcel's attribute row. Geometry is carried separately by the
/// spatial store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    /// Assessor's Parcel Number. Unique and stable; the key shared with
    /// the external record-keeping service.
    pub apn: String,
    /// Situs street address.
    pub address: Option<String>,
    /// Situs city as recorded by the assessor. Often null or stale.
    pub city: Option<String>,
    /// County name.
    pub county: Option<String>,
    /// ZIP code.
    pub zip_code: Option<String>,
    /// Authoritative assessor acreage.
    pub parcel_acres: Option<f64>,
    /// Legacy size field from older import vintages.
    pub size_acres: Option<f64>,
    /// Property classification label (e.g. "Vacant", "Residential").
    pub prop_class: Option<String>,
    /// Building square footage.
    pub bldg_sqft: Option<f64>,
    /// Year built.
    pub built_yr: Option<i32>,
    /// Reported housing unit count.
    pub house_cnt: Option<i32>,
    /// Total market value.
    pub total_mkt_value: Option<f64>,
    /// Land-only market value.
    pub land_mkt_value: Option<f64>,
    /// Owning-entity type (e.g. "Private", "Federal").
    pub owner_type: Option<String>,
}

impl Parcel {
    /// Creates an attribute row with only the APN set.
    #[must_use]
    pub fn new(apn: impl Into<String>) -> Self {
        Self {
            apn: apn.into(),
            ..Self::default()
        }
    }
}

/// Which of the three acreage sources produced a parcel's effective
/// acreage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcreageSource {
    /// `parcel_acres` (authoritative assessor value)
    Assessor,
    /// `size_acres` (legacy field)
    Legacy,
    /// Geodesic area of the parcel geometry
    Geometry,
}

/// Resolves effective acreage in preference order: assessor, legacy, then
/// geometry-computed. Non-finite or negative values are treated as absent.
#[must_use]
pub fn effective_acreage(
    parcel_acres: Option<f64>,
    size_acres: Option<f64>,
    geometry_acres: Option<f64>,
) -> Option<(f64, AcreageSource)> {
    let usable = |v: Option<f64>| v.filter(|a| a.is_finite() && *a >= 0.0);

    usable(parcel_acres)
        .map(|a| (a, AcreageSource::Assessor))
        .or_else(|| usable(size_acres).map(|a| (a, AcreageSource::Legacy)))
        .or_else(|| usable(geometry_acres).map(|a| (a, AcreageSource::Geometry)))
}

/// A zoning or general-plan polygon's attribute row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Primary key.
    pub id: i64,
    /// Raw label fields from the source municipality.
    pub labels: ZoneLabels,
    /// Canonical category derived from `labels` at write time.
    pub category: ZoneCategory,
    /// Owning municipality, inferred spatially when the source omits it.
    pub municipality: Option<String>,
}

/// A municipal boundary's attribute row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalBoundary {
    /// Canonical city name as published.
    pub name: String,
    /// `name` after city normalization; the lookup key.
    pub name_key: String,
}

/// An inclusive numeric range. Either bound may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Range<T> {
    /// Inclusive lower bound.
    pub min: Option<T>,
    /// Inclusive upper bound.
    pub max: Option<T>,
}

impl<T: Copy + PartialOrd> Range<T> {
    /// Creates a range from optional bounds.
    #[must_use]
    pub const fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    /// Returns `true` if either bound is set.
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    /// Returns `true` if both bounds are set and `min > max`.
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        matches!((self.min, self.max), (Some(min), Some(max)) if min > max)
    }

    /// Returns `true` if `value` lies within the set bounds.
    #[must_use]
    pub fn contains(&self, value: T) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Search filter. All clauses are optional and combined with AND.
///
/// Null policy per clause:
///
/// * `acres`: effective acreage (assessor, legacy, geometry). A parcel
///   with no resolvable acreage is excluded when a bound is set.
/// * `prop_classes`: a parcel with no class label is excluded, except that
///   `"Vacant"` is also satisfied by inferred vacancy.
/// * `market_value`: on `total_mkt_value`; null excluded when bounded.
/// * `year_built`: null (or non-positive) years excluded when bounded,
///   unless `include_null_year` is set.
/// * `county`: null county excluded when the clause is set.
/// * `cities`: null attribute city falls back to boundary intersection.
/// * `zone_categories`: parcels without geometry never match.
/// * `bbox`: parcels without geometry never match.
///
/// Empty lists mean "no clause". Names that match nothing (an unknown city
/// or zone category) make that clause match nothing; they are not errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParcelFilter {
    /// Acreage range.
    pub acres: Range<f64>,
    /// Property-class labels, any of which may match.
    pub prop_classes: Vec<String>,
    /// Total market value range.
    pub market_value: Range<f64>,
    /// Year-built range.
    pub year_built: Range<i32>,
    /// Also include parcels with no year built when `year_built` is set.
    pub include_null_year: bool,
    /// County name (suffix-insensitive).
    pub county: Option<String>,
    /// City names, any of which may match.
    pub cities: Vec<String>,
    /// Canonical zone category names, any of which may match.
    pub zone_categories: Vec<String>,
    /// Viewport restriction.
    pub bbox: Option<BoundingBox>,
    /// Result cap. Defaults and hard maximum come from configuration.
    pub limit: Option<u32>,
}

/// One search result row, carrying simplified geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelResult {
    /// Assessor's Parcel Number.
    pub apn: String,
    /// Situs street address.
    pub address: Option<String>,
    /// Situs city attribute.
    pub city: Option<String>,
    /// County name.
    pub county: Option<String>,
    /// ZIP code.
    pub zip_code: Option<String>,
    /// Property classification label.
    pub prop_class: Option<String>,
    /// Effective acreage.
    pub acres: Option<f64>,
    /// Which source `acres` came from.
    pub acreage_source: Option<AcreageSource>,
    /// Total market value.
    pub total_mkt_value: Option<f64>,
    /// Land-only market value.
    pub land_mkt_value: Option<f64>,
    /// Year built.
    pub built_yr: Option<i32>,
    /// Building square footage.
    pub bldg_sqft: Option<f64>,
    /// Owning-entity type.
    pub owner_type: Option<String>,
    /// Whether the parcel has no meaningful improvements.
    pub inferred_vacant: bool,
    /// Simplified, precision-reduced geometry.
    pub geometry: Option<geojson::Geometry>,
}

/// A single parcel opened in detail, with full-resolution geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelDetail {
    /// All attribute fields.
    pub parcel: Parcel,
    /// Effective acreage.
    pub acres: Option<f64>,
    /// Which source `acres` came from.
    pub acreage_source: Option<AcreageSource>,
    /// City from the boundary layer, when the attribute city is null.
    pub resolved_city: Option<String>,
    /// Canonical categories of all zones the parcel intersects.
    pub zone_categories: Vec<ZoneCategory>,
    /// Full-resolution geometry.
    pub geometry: Option<geojson::Geometry>,
}
