//! Opening the parcels database and creating its schema.

use std::path::Path;

use duckdb::Connection;

use crate::DbError;

/// Opens (or creates) the parcels `DuckDB` and ensures schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the data directory, connection, or schema
/// creation fails.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent() {
        crate::paths::ensure_dir(parent)?;
    }

    let conn = Connection::open(path)?;

    conn.execute_batch("SET threads = 4; SET memory_limit = '1GB';")?;

    create_schema(&conn)?;

    log::debug!("Opened parcels database at {}", path.display());

    Ok(conn)
}

/// Opens the parcels DB at the default path (see
/// [`crate::paths::parcels_db_path`]).
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_default() -> Result<Connection, DbError> {
    open(&crate::paths::parcels_db_path())
}

/// Opens a throwaway in-memory database with the schema applied.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_in_memory() -> Result<Connection, DbError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS parcels (
            apn TEXT PRIMARY KEY,
            address TEXT,
            city TEXT,
            county TEXT,
            zip_code TEXT,
            parcel_acres DOUBLE,
            size_acres DOUBLE,
            prop_class TEXT,
            bldg_sqft DOUBLE,
            built_yr INTEGER,
            house_cnt INTEGER,
            total_mkt_value DOUBLE,
            land_mkt_value DOUBLE,
            owner_type TEXT,
            boundary_geojson TEXT
        );

        CREATE TABLE IF NOT EXISTS zones (
            id BIGINT PRIMARY KEY,
            zone_name TEXT,
            zone_code TEXT,
            zone_type TEXT,
            category TEXT,
            municipality TEXT,
            boundary_geojson TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS municipal_boundaries (
            name TEXT PRIMARY KEY,
            name_key TEXT NOT NULL,
            boundary_geojson TEXT NOT NULL
        );",
    )?;

    Ok(())
}

/// Row counts of the three tables: `(parcels, zones, boundaries)`.
///
/// # Errors
///
/// Returns [`DbError`] if a count query fails.
pub fn table_counts(conn: &Connection) -> Result<(u64, u64, u64), DbError> {
    let count = |table: &str| -> Result<u64, DbError> {
        let n: i64 = conn
            .prepare(&format!("SELECT COUNT(*) FROM {table}"))?
            .query_row([], |row| row.get(0))?;
        u64::try_from(n).map_err(|e| DbError::Conversion {
            message: format!("negative row count for {table}: {e}"),
        })
    };

    Ok((
        count("parcels")?,
        count("zones")?,
        count("municipal_boundaries")?,
    ))
}
