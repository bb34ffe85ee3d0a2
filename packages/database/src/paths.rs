#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the `DuckDB` data directory.
//!
//! All paths are relative to the project root's `data/` directory unless
//! overridden by `PARCEL_MAP_DB`.

use std::path::{Path, PathBuf};

/// Environment variable overriding [`parcels_db_path`].
pub const DB_PATH_ENV: &str = "PARCEL_MAP_DB";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`, falling back to the
/// current directory when the crate is built outside the workspace.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the parcels `DuckDB` file path, honoring `PARCEL_MAP_DB`.
#[must_use]
pub fn parcels_db_path() -> PathBuf {
    resolve_db_path(std::env::var(DB_PATH_ENV).ok())
}

fn resolve_db_path(override_path: Option<String>) -> PathBuf {
    override_path
        .filter(|p| !p.trim().is_empty())
        .map_or_else(|| data_dir().join("parcels.duckdb"), PathBuf::from)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_is_under_data_dir() {
        let path = resolve_db_path(None);
        assert!(path.starts_with(data_dir()));
        assert!(path.ends_with("parcels.duckdb"));
    }

    #[test]
    fn override_wins_unless_blank() {
        assert_eq!(
            resolve_db_path(Some("/tmp/other.duckdb".into())),
            PathBuf::from("/tmp/other.duckdb")
        );
        assert!(resolve_db_path(Some("  ".into())).ends_with("parcels.duckdb"));
    }
}
