#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the parcel map toolchain.
//!
//! Runs searches and detail lookups against the local `DuckDB` snapshot,
//! explains zone classifications, recomputes stored categories, and
//! starts the API server.

mod progress;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use parcel_map_parcel_models::ParcelFilter;
use parcel_map_search::{SearchConfig, SearchEngine};
use parcel_map_zoning_models::ZoneCategory;

#[derive(Parser)]
#[command(name = "parcel_map", about = "Parcel search and zone classification tool")]
struct Cli {
    /// Path to the parcels database (overrides `PARCEL_MAP_DB`)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Search config file layered over the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a parcel search and print the results as JSON
    Search {
        /// Filter as JSON (e.g. `{"acres":{"min":5},"cities":["Lehi"]}`)
        #[arg(long, conflicts_with = "filter_file")]
        filter: Option<String>,
        /// Read the JSON filter from a file
        #[arg(long)]
        filter_file: Option<PathBuf>,
    },
    /// Print one parcel's detail as JSON
    Parcel {
        /// Assessor's Parcel Number
        apn: String,
    },
    /// Classify raw zone labels and show which rule matched
    Classify {
        /// Zone name (e.g. "Low Density Residential")
        #[arg(long)]
        name: Option<String>,
        /// Zone code (e.g. "R-1-8")
        #[arg(long)]
        code: Option<String>,
        /// Zone type
        #[arg(long = "type")]
        zone_type: Option<String>,
    },
    /// Recompute every stored zone category from its labels
    Reclassify,
    /// List the canonical zone categories
    Categories,
    /// Start the API server
    Serve {
        /// Bind address (overrides `BIND_ADDR`)
        #[arg(long)]
        bind: Option<String>,
        /// Port (overrides `PORT`)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = progress::init_logger();
    let cli = Cli::parse();
    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(parcel_map_database::paths::parcels_db_path);

    match cli.command {
        Commands::Search {
            filter,
            filter_file,
        } => {
            let filter = read_filter(filter.as_deref(), filter_file.as_deref())?;
            let engine = SearchEngine::new(SearchConfig::load(cli.config.as_deref())?);
            let store = load_store(&db_path)?;

            let results = engine.search(&store, &filter)?;
            log::info!("{} parcels matched", results.len());
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Parcel { apn } => {
            let engine = SearchEngine::new(SearchConfig::load(cli.config.as_deref())?);
            let store = load_store(&db_path)?;

            match engine.detail(&store, &apn) {
                Some(detail) => println!("{}", serde_json::to_string_pretty(&detail)?),
                None => return Err(format!("Parcel not found: {apn}").into()),
            }
        }
        Commands::Classify {
            name,
            code,
            zone_type,
        } => {
            let rule = parcel_map_zoning::matching_rule(
                name.as_deref(),
                code.as_deref(),
                zone_type.as_deref(),
            );
            match rule {
                Some(rule) => println!("{} (rule: {})", rule.category.label(), rule.name),
                None => println!("{} (no rule matched)", ZoneCategory::Other.label()),
            }
        }
        Commands::Reclassify => {
            let conn = parcel_map_database::db::open(&db_path)?;
            let mut bar = progress::JobProgress::new(&multi, "Reclassifying zones");

            let report = parcel_map_database::zones::reclassify_zones(&conn, |done, total| {
                bar.update(done, total);
            })?;

            bar.finish(format!(
                "{} zones, {} changed category",
                report.total, report.changed
            ));
        }
        Commands::Categories => {
            println!("{:<24} LABEL", "NAME");
            println!("{}", "-".repeat(48));
            for category in ZoneCategory::all() {
                println!("{:<24} {}", category.as_ref(), category.label());
            }
        }
        Commands::Serve { bind, port } => {
            let mut options = parcel_map_server::ServerOptions::from_env();
            options.db_path = db_path;
            options.config_path = cli.config;
            if let Some(bind) = bind {
                options.bind_addr = bind;
            }
            if let Some(port) = port {
                options.port = port;
            }

            actix_web::rt::System::new().block_on(parcel_map_server::run_server(options))?;
        }
    }

    Ok(())
}

fn read_filter(
    inline: Option<&str>,
    file: Option<&Path>,
) -> Result<ParcelFilter, Box<dyn std::error::Error>> {
    let json = match (inline, file) {
        (Some(json), _) => json.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => return Ok(ParcelFilter::default()),
    };
    Ok(serde_json::from_str(&json)?)
}

fn load_store(
    db_path: &Path,
) -> Result<parcel_map_spatial::GeometryStore, parcel_map_database::DbError> {
    log::info!("Loading geometry snapshot from {}...", db_path.display());
    parcel_map_server::load_snapshot(db_path)
}
