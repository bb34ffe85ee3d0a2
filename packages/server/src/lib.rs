#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for parcel search.
//!
//! Holds one immutable [`GeometryStore`] snapshot loaded from `DuckDB`.
//! Searches clone the snapshot's `Arc` and run on the blocking pool; a
//! reload builds a new snapshot and swaps it in, so in-flight searches
//! finish against the snapshot they started with.

mod handlers;

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use parcel_map_database::DbError;
use parcel_map_records::RecordStore;
use parcel_map_search::{ConfigError, SearchConfig, SearchEngine};
use parcel_map_spatial::GeometryStore;

/// Errors starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Search configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The database could not be opened or read.
    #[error(transparent)]
    Db(#[from] DbError),

    /// The HTTP server failed to bind or run.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state.
pub struct AppState {
    /// Current geometry snapshot. Replaced wholesale on reload.
    store: RwLock<Arc<GeometryStore>>,
    /// Search engine (configuration only).
    pub engine: SearchEngine,
    /// `DuckDB` file the snapshot is loaded from.
    pub db_path: PathBuf,
    /// External record-keeping service, if configured.
    pub records: Option<Arc<dyn RecordStore>>,
}

impl AppState {
    /// Creates state around an initial snapshot.
    #[must_use]
    pub fn new(
        store: GeometryStore,
        engine: SearchEngine,
        db_path: PathBuf,
        records: Option<Arc<dyn RecordStore>>,
    ) -> Self {
        Self {
            store: RwLock::new(Arc::new(store)),
            engine,
            db_path,
            records,
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<GeometryStore> {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swaps in a new snapshot.
    pub fn replace_store(&self, store: GeometryStore) {
        *self.store.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(store);
    }
}

/// Server startup options.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// `DuckDB` file to load.
    pub db_path: PathBuf,
    /// Optional search config file layered over the embedded defaults.
    pub config_path: Option<PathBuf>,
    /// Bind address.
    pub bind_addr: String,
    /// Port.
    pub port: u16,
}

impl ServerOptions {
    /// Options from the environment: `PARCEL_MAP_DB`, `BIND_ADDR`
    /// (default `127.0.0.1`), and `PORT` (default `8080`).
    #[must_use]
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        Self {
            db_path: parcel_map_database::paths::parcels_db_path(),
            config_path: None,
            bind_addr,
            port,
        }
    }
}

/// Opens the database at `path` and builds a snapshot from it.
///
/// # Errors
///
/// Returns [`DbError`] if the database cannot be opened or read.
pub fn load_snapshot(path: &std::path::Path) -> Result<GeometryStore, DbError> {
    let conn = parcel_map_database::db::open(path)?;
    parcel_map_database::store::load_store(&conn)
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/zone-categories", web::get().to(handlers::zone_categories))
            .route("/parcels/search", web::post().to(handlers::search))
            .route("/parcels", web::get().to(handlers::parcels_in_bbox))
            .route("/parcels/{apn}", web::get().to(handlers::parcel_detail))
            .route(
                "/records/{record_id}/links",
                web::post().to(handlers::link_records),
            )
            .route("/admin/reload", web::post().to(handlers::reload)),
    );
}

/// Starts the parcel map API server.
///
/// Loads the search configuration and the geometry snapshot, connects the
/// record store when `AIRTABLE_*` variables are set, and serves until
/// shut down. The caller initializes logging and provides the async
/// runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// * [`ServerError::Config`] if the search configuration is invalid
/// * [`ServerError::Db`] if the snapshot cannot be loaded
/// * [`ServerError::Io`] if the HTTP server fails to bind or run
#[allow(clippy::future_not_send)]
pub async fn run_server(options: ServerOptions) -> Result<(), ServerError> {
    let config = SearchConfig::load(options.config_path.as_deref())?;

    log::info!("Loading geometry snapshot from {}...", options.db_path.display());
    let store = load_snapshot(&options.db_path)?;

    let records: Option<Arc<dyn RecordStore>> = parcel_map_records::AirtableStore::from_env()
        .map(|store| Arc::new(store) as Arc<dyn RecordStore>);
    if records.is_none() {
        log::info!("AIRTABLE_* not set; record linking is disabled");
    }

    let state = web::Data::new(AppState::new(
        store,
        SearchEngine::new(config),
        options.db_path,
        records,
    ));

    log::info!("Starting server on {}:{}", options.bind_addr, options.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((options.bind_addr, options.port))?
    .run()
    .await?;

    Ok(())
}
