//! Building an in-memory [`GeometryStore`] snapshot from the database.

use duckdb::Connection;
use parcel_map_parcel_models::Zone;
use parcel_map_spatial::{GeometryStore, geometry::parse_geojson_to_multipolygon};
use parcel_map_zoning_models::{ZoneCategory, ZoneLabels};

use crate::DbError;
use crate::parcels::{PARCEL_COLUMNS, read_parcel_row};

/// Reads all three tables and builds an immutable snapshot.
///
/// Parcels with unparseable geometry are kept without geometry; zones and
/// boundaries with unparseable geometry are skipped. Zones whose stored
/// category is missing or unrecognized are classified here.
///
/// # Errors
///
/// Returns [`DbError`] if any query fails.
pub fn load_store(conn: &Connection) -> Result<GeometryStore, DbError> {
    let mut builder = GeometryStore::builder();

    load_boundaries(conn, &mut builder)?;
    load_zones(conn, &mut builder)?;
    load_parcels(conn, &mut builder)?;

    Ok(builder.build())
}

fn load_boundaries(
    conn: &Connection,
    builder: &mut parcel_map_spatial::GeometryStoreBuilder,
) -> Result<(), DbError> {
    let mut stmt =
        conn.prepare("SELECT name, boundary_geojson FROM municipal_boundaries ORDER BY name")?;
    let mut rows = stmt.query([])?;
    let mut loaded = 0usize;

    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        let geojson_str: String = row.get(1)?;

        let Some(multi_polygon) = parse_geojson_to_multipolygon(&geojson_str) else {
            log::warn!("Failed to parse GeoJSON for boundary {name}");
            continue;
        };

        builder.add_boundary(&name, multi_polygon);
        loaded += 1;
    }

    log::info!("Loaded {loaded} municipal boundaries");
    Ok(())
}

fn load_zones(
    conn: &Connection,
    builder: &mut parcel_map_spatial::GeometryStoreBuilder,
) -> Result<(), DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, zone_name, zone_code, zone_type, category, municipality, boundary_geojson
         FROM zones ORDER BY id",
    )?;
    let mut rows = stmt.query([])?;
    let mut loaded = 0usize;
    let mut classified = 0usize;

    while let Some(row) = rows.next()? {
        let id: i64 = row.get(0)?;
        let labels = ZoneLabels {
            zone_name: row.get(1)?,
            zone_code: row.get(2)?,
            zone_type: row.get(3)?,
        };
        let stored: Option<String> = row.get(4)?;
        let municipality: Option<String> = row.get(5)?;
        let geojson_str: String = row.get(6)?;

        let Some(multi_polygon) = parse_geojson_to_multipolygon(&geojson_str) else {
            log::warn!("Failed to parse GeoJSON for zone {id}");
            continue;
        };

        if let Some(category) = stored.as_deref().and_then(ZoneCategory::from_label) {
            builder.add_zone(
                Zone {
                    id,
                    labels,
                    category,
                    municipality,
                },
                multi_polygon,
            );
        } else {
            log::warn!("Zone {id} has no usable stored category ({stored:?}); classifying");
            builder.upsert_zone(id, labels, municipality, multi_polygon);
            classified += 1;
        }
        loaded += 1;
    }

    log::info!("Loaded {loaded} zones ({classified} classified at load)");
    Ok(())
}

fn load_parcels(
    conn: &Connection,
    builder: &mut parcel_map_spatial::GeometryStoreBuilder,
) -> Result<(), DbError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PARCEL_COLUMNS} FROM parcels ORDER BY apn"
    ))?;
    let mut rows = stmt.query([])?;
    let mut loaded = 0usize;
    let mut without_geometry = 0usize;

    while let Some(row) = rows.next()? {
        let (parcel, geojson) = read_parcel_row(row)?;

        let geometry = geojson.as_deref().and_then(|text| {
            let parsed = parse_geojson_to_multipolygon(text);
            if parsed.is_none() {
                log::warn!("Failed to parse GeoJSON for parcel {}", parcel.apn);
            }
            parsed
        });
        if geometry.is_none() {
            without_geometry += 1;
        }

        builder.add_parcel(parcel, geometry);
        loaded += 1;
    }

    log::info!("Loaded {loaded} parcels ({without_geometry} without geometry)");
    Ok(())
}
