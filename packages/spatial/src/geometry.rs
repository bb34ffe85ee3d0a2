//! Spatial primitives over WGS84 polygons.
//!
//! Thin wrappers around `geo` for the handful of operations the store and
//! search engine need: `GeoJSON` parsing, envelopes, geodesic acreage, and
//! transport-size reduction (topology-preserving simplification plus
//! coordinate rounding).

use geo::{
    BoundingRect, Coord, GeodesicArea, MapCoords, MultiPolygon, Relate, SimplifyVwPreserve,
};
use geojson::GeoJson;
use parcel_map_parcel_models::SQ_METERS_PER_ACRE;
use rstar::AABB;

/// Parse a `GeoJSON` string into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types, bare or
/// wrapped in a `Feature`.
#[must_use]
pub fn parse_geojson_to_multipolygon(geojson_str: &str) -> Option<MultiPolygon<f64>> {
    let geojson: GeoJson = geojson_str.parse().ok()?;
    let geom = match geojson {
        GeoJson::Geometry(geom) => geom,
        GeoJson::Feature(feature) => feature.geometry?,
        GeoJson::FeatureCollection(_) => return None,
    };
    let geo_geom: geo::Geometry<f64> = geom.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Serializes a [`MultiPolygon`] as a `GeoJSON` geometry.
#[must_use]
pub fn to_geojson(mp: &MultiPolygon<f64>) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(mp))
}

/// Serializes a [`MultiPolygon`] as a `GeoJSON` string.
#[must_use]
pub fn to_geojson_string(mp: &MultiPolygon<f64>) -> String {
    GeoJson::from(to_geojson(mp)).to_string()
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
#[must_use]
pub fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

/// Returns `true` if the interiors of `a` and `b` overlap.
///
/// Polygons that only share an edge or a corner do not overlap. Parcel,
/// zone, and boundary layers are drawn along the same lot lines, so plain
/// intersection would match every neighbor across a shared line.
#[must_use]
pub fn interiors_overlap(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    let matrix = a.relate(b);
    matrix.is_intersects() && !matrix.is_touches()
}

/// Geodesic area of a WGS84 polygon in acres.
///
/// Returns `None` for empty or degenerate geometry.
#[must_use]
pub fn geodesic_acres(mp: &MultiPolygon<f64>) -> Option<f64> {
    if mp.0.is_empty() {
        return None;
    }
    let sq_m = mp.geodesic_area_unsigned();
    (sq_m.is_finite() && sq_m > 0.0).then(|| sq_m / SQ_METERS_PER_ACRE)
}

/// Reduces a geometry for transport: topology-preserving
/// Visvalingam-Whyatt simplification with `tolerance` (square degrees),
/// then coordinates rounded to `precision` decimal places.
///
/// Falls back to the rounded, unsimplified geometry if simplification
/// collapses every polygon.
#[must_use]
pub fn simplify_for_transport(
    mp: &MultiPolygon<f64>,
    tolerance: f64,
    precision: u32,
) -> MultiPolygon<f64> {
    let simplified = if tolerance > 0.0 {
        mp.simplify_vw_preserve(tolerance)
    } else {
        mp.clone()
    };

    let kept = if simplified.0.iter().all(|p| p.exterior().0.len() < 4) {
        mp.clone()
    } else {
        simplified
    };

    round_coords(&kept, precision)
}

/// Rounds every coordinate to `precision` decimal places.
#[must_use]
pub fn round_coords(mp: &MultiPolygon<f64>, precision: u32) -> MultiPolygon<f64> {
    let scale = 10f64.powi(i32::try_from(precision.min(15)).unwrap_or(15));
    mp.map_coords(|c| Coord {
        x: (c.x * scale).round() / scale,
        y: (c.y * scale).round() / scale,
    })
}

#[cfg(test)]
pub(crate) mod test_shapes {
    use geo::{LineString, MultiPolygon, Polygon};

    /// Axis-aligned square polygon from `(x0, y0)` to `(x1, y1)`.
    pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![Polygon::new(
            LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
            vec![],
        )])
    }
}
