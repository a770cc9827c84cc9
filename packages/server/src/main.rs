#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web UI and API server for the KSI map.
//!
//! Binds to `BIND_ADDR`:`PORT` (default `127.0.0.1:8080`) and routes via
//! the service configured by `OSRM_BASE_URL` / `OSRM_TIMEOUT_SECS`.

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    ksi_map_server::run_server().await
}
