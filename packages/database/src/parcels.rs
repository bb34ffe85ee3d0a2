//! Parcel rows.
//!
//! Parcels are written by bulk import and read back only when a
//! [`parcel_map_spatial::GeometryStore`] snapshot is built.

use duckdb::Connection;
use geo::MultiPolygon;
use parcel_map_parcel_models::Parcel;
use parcel_map_spatial::geometry;

use crate::{DbError, in_transaction};

/// Column list shared by the insert and select statements.
pub(crate) const PARCEL_COLUMNS: &str = "apn, address, city, county, zip_code, parcel_acres, \
     size_acres, prop_class, bldg_sqft, built_yr, house_cnt, total_mkt_value, land_mkt_value, \
     owner_type, boundary_geojson";

/// Inserts or replaces parcels (keyed by APN) in one transaction.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError`] if any insert fails; no rows are written then.
pub fn upsert_parcels(
    conn: &Connection,
    parcels: &[(Parcel, Option<MultiPolygon<f64>>)],
) -> Result<usize, DbError> {
    if parcels.is_empty() {
        return Ok(0);
    }

    in_transaction(conn, |conn| {
        let mut stmt = conn.prepare(&format!(
            "INSERT OR REPLACE INTO parcels ({PARCEL_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))?;

        for (p, geom) in parcels {
            let geojson = geom.as_ref().map(geometry::to_geojson_string);
            stmt.execute(duckdb::params![
                p.apn,
                p.address.as_deref(),
                p.city.as_deref(),
                p.county.as_deref(),
                p.zip_code.as_deref(),
                p.parcel_acres,
                p.size_acres,
                p.prop_class.as_deref(),
                p.bldg_sqft,
                p.built_yr,
                p.house_cnt,
                p.total_mkt_value,
                p.land_mkt_value,
                p.owner_type.as_deref(),
                geojson,
            ])?;
        }

        log::info!("Upserted {} parcels", parcels.len());
        Ok(parcels.len())
    })
}

/// Reads a parcel row by APN, with its raw `GeoJSON`.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn get_parcel(
    conn: &Connection,
    apn: &str,
) -> Result<Option<(Parcel, Option<String>)>, DbError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PARCEL_COLUMNS} FROM parcels WHERE apn = ?"
    ))?;
    let mut rows = stmt.query([apn])?;
    rows.next()?.map(read_parcel_row).transpose()
}

/// Decodes one row selected with [`PARCEL_COLUMNS`].
pub(crate) fn read_parcel_row(
    row: &duckdb::Row<'_>,
) -> Result<(Parcel, Option<String>), DbError> {
    let parcel = Parcel {
        apn: row.get(0)?,
        address: row.get(1)?,
        city: row.get(2)?,
        county: row.get(3)?,
        zip_code: row.get(4)?,
        parcel_acres: row.get(5)?,
        size_acres: row.get(6)?,
        prop_class: row.get(7)?,
        bldg_sqft: row.get(8)?,
        built_yr: row.get(9)?,
        house_cnt: row.get(10)?,
        total_mkt_value: row.get(11)?,
        land_mkt_value: row.get(12)?,
        owner_type: row.get(13)?,
    };
    let geojson: Option<String> = row.get(14)?;
    Ok((parcel, geojson))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use geo::{LineString, Polygon};

    fn square() -> MultiPolygon<f64> {
        MultiPolygon(vec![Polygon::new(
            LineString::from(vec![
                (-111.93, 41.03),
                (-111.92, 41.03),
                (-111.92, 41.04),
                (-111.93, 41.04),
                (-111.93, 41.03),
            ]),
            vec![],
        )])
    }

    #[test]
    fn upsert_round_trips_attributes() {
        let conn = open_in_memory().unwrap();
        let parcel = Parcel {
            city: Some("Kaysville".into()),
            size_acres: Some(2.5),
            built_yr: Some(1978),
            ..Parcel::new("08-123-0001")
        };
        upsert_parcels(&conn, &[(parcel.clone(), Some(square()))]).unwrap();

        let (stored, geojson) = get_parcel(&conn, "08-123-0001").unwrap().unwrap();
        assert_eq!(stored, parcel);
        assert!(geojson.unwrap().contains("Polygon"));
    }

    #[test]
    fn upsert_replaces_by_apn() {
        let conn = open_in_memory().unwrap();
        upsert_parcels(&conn, &[(Parcel::new("A"), None)]).unwrap();
        let updated = Parcel {
            prop_class: Some("Vacant".into()),
            ..Parcel::new("A")
        };
        upsert_parcels(&conn, &[(updated, None)]).unwrap();

        let (stored, geojson) = get_parcel(&conn, "A").unwrap().unwrap();
        assert_eq!(stored.prop_class.as_deref(), Some("Vacant"));
        assert!(geojson.is_none());
        assert_eq!(crate::db::table_counts(&conn).unwrap().0, 1);
    }

    #[test]
    fn missing_parcel_is_none() {
        let conn = open_in_memory().unwrap();
        assert!(get_parcel(&conn, "nope").unwrap().is_none());
    }
}
