//! Municipal boundary rows.

use duckdb::Connection;
use geo::MultiPolygon;
use parcel_map_places::normalize_city;
use parcel_map_spatial::geometry;

use crate::DbError;

/// Inserts or replaces a municipal boundary by name.
///
/// The stored `name_key` comes from the same city normalizer the search
/// side applies to requested city names.
///
/// # Errors
///
/// Returns [`DbError`] if the write fails.
pub fn upsert_boundary(
    conn: &Connection,
    name: &str,
    geometry: &MultiPolygon<f64>,
) -> Result<(), DbError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DbError::Conversion {
            message: "municipal boundary name is empty".to_string(),
        });
    }

    conn.execute(
        "INSERT OR REPLACE INTO municipal_boundaries (name, name_key, boundary_geojson)
         VALUES (?, ?, ?)",
        duckdb::params![
            name,
            normalize_city(name),
            geometry::to_geojson_string(geometry)
        ],
    )?;
    Ok(())
}
