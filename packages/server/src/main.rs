#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parcel map API server binary.

use parcel_map_server::{ServerOptions, run_server};

#[actix_web::main]
async fn main() -> Result<(), parcel_map_server::ServerError> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    run_server(ServerOptions::from_env()).await
}
