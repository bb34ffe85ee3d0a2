#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `DuckDB` persistence for the parcel map.
//!
//! One database file holds the three polygon tables the search engine
//! reads: `parcels`, `zones`, and `municipal_boundaries`. Geometry is
//! stored as `GeoJSON` TEXT in WGS84. [`store::load_store`] reads all
//! three into an in-memory [`parcel_map_spatial::GeometryStore`].

pub mod boundaries;
pub mod db;
pub mod parcels;
pub mod paths;
pub mod store;
pub mod zones;

use duckdb::Connection;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// I/O error (e.g. creating the data directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Runs `f` inside one transaction, committing on success and rolling
/// back on error.
///
/// # Errors
///
/// Returns whatever `f` returns, or [`DbError::DuckDb`] if the
/// transaction cannot be opened or committed.
pub fn in_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T, DbError>,
) -> Result<T, DbError> {
    conn.execute_batch("BEGIN TRANSACTION")?;
    match f(conn) {
        Ok(value) => {
            conn.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                log::error!("Rollback failed: {rollback}");
            }
            Err(e)
        }
    }
}
