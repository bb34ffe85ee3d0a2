//! Zone rows and the zone write path.
//!
//! A zone's canonical category is derived from its raw label fields. It
//! is computed here, on write, inside the same transaction as the write
//! itself, so no reader ever sees labels and category out of step.

use duckdb::Connection;
use geo::MultiPolygon;
use parcel_map_spatial::geometry;
use parcel_map_zoning::classify_labels;
use parcel_map_zoning_models::{ZoneCategory, ZoneLabels};

use crate::{DbError, in_transaction};

/// Summary of a [`reclassify_zones`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReclassifyReport {
    /// Zones examined.
    pub total: u64,
    /// Zones whose stored category changed.
    pub changed: u64,
}

/// Inserts or replaces a zone, classifying its labels first.
///
/// Returns the category that was stored.
///
/// # Errors
///
/// Returns [`DbError`] if the write fails; nothing is stored then.
pub fn upsert_zone(
    conn: &Connection,
    id: i64,
    labels: &ZoneLabels,
    municipality: Option<&str>,
    geometry: &MultiPolygon<f64>,
) -> Result<ZoneCategory, DbError> {
    let geojson = geometry::to_geojson_string(geometry);

    in_transaction(conn, |conn| {
        let category = classify_labels(labels);
        conn.execute(
            "INSERT OR REPLACE INTO zones
                (id, zone_name, zone_code, zone_type, category, municipality, boundary_geojson)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            duckdb::params![
                id,
                labels.zone_name.as_deref(),
                labels.zone_code.as_deref(),
                labels.zone_type.as_deref(),
                category.as_ref(),
                municipality,
                geojson,
            ],
        )?;
        log::debug!("Stored zone {id} as {category}");
        Ok(category)
    })
}

/// Recomputes every stored zone category in one transaction, e.g. after
/// the classification rules change.
///
/// `on_progress` is called with `(done, total)` after each zone.
///
/// # Errors
///
/// Returns [`DbError`] if reading or updating fails; no category is
/// changed then.
pub fn reclassify_zones(
    conn: &Connection,
    mut on_progress: impl FnMut(u64, u64),
) -> Result<ReclassifyReport, DbError> {
    in_transaction(conn, |conn| {
        let zones = read_labels(conn)?;
        let total = zones.len() as u64;
        let mut report = ReclassifyReport {
            total,
            changed: 0,
        };

        let mut update = conn.prepare("UPDATE zones SET category = ? WHERE id = ?")?;

        for (done, (id, labels, stored)) in zones.iter().enumerate() {
            let category = classify_labels(labels);
            if stored.as_deref().and_then(ZoneCategory::from_label) != Some(category) {
                update.execute(duckdb::params![category.as_ref(), id])?;
                report.changed += 1;
            }
            on_progress(done as u64 + 1, total);
        }

        log::info!(
            "Reclassified {} zones, {} changed category",
            report.total,
            report.changed
        );
        Ok(report)
    })
}

/// Reads a stored zone category by id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn stored_category(conn: &Connection, id: i64) -> Result<Option<String>, DbError> {
    let mut stmt = conn.prepare("SELECT category FROM zones WHERE id = ?")?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(row.get(0)?),
        None => Ok(None),
    }
}

fn read_labels(conn: &Connection) -> Result<Vec<(i64, ZoneLabels, Option<String>)>, DbError> {
    let mut stmt =
        conn.prepare("SELECT id, zone_name, zone_code, zone_type, category FROM zones ORDER BY id")?;
    let mut rows = stmt.query([])?;
    let mut zones = Vec::new();

    while let Some(row) = rows.next()? {
        let labels = ZoneLabels {
            zone_name: row.get(1)?,
            zone_code: row.get(2)?,
            zone_type: row.get(3)?,
        };
        zones.push((row.get(0)?, labels, row.get(4)?));
    }

    Ok(zones)
}
