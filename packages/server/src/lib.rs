#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web UI and API server for the KSI map.
//!
//! Serves a single page where the user uploads the speed and KSI CSV
//! files, picks a road and sees its route with the killed-or-seriously
//! injured collisions on it. The server holds one session: the latest
//! uploads, the shell state derived from them and the last evaluated
//! view.

mod handlers;
pub mod interactive;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use ksi_map_routing::{OsrmClient, RouteFetcher, RoutingConfig};
use ksi_map_shell::{ShellState, Uploads, ViewModel};

/// Largest accepted JSON body, enough for two sizeable CSV files.
pub const UPLOAD_LIMIT_BYTES: usize = 64 * 1024 * 1024;

/// Everything the user has done so far.
#[derive(Debug)]
pub struct Session {
    pub uploads: Uploads,
    pub state: ShellState,
    /// Bumped on every upload and every selection. A route result computed
    /// for an older generation is discarded.
    pub generation: u64,
    /// The most recent view, for `GET /api/map`.
    pub last_view: Option<ViewModel>,
}

impl Default for Session {
    fn default() -> Self {
        let uploads = Uploads::default();
        let state = ShellState::from_uploads(&uploads);
        Self {
            uploads,
            state,
            generation: 0,
            last_view: None,
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Routing service used for every selection.
    pub router: Arc<dyn RouteFetcher>,
    /// The single user session. Never held across an `.await`.
    pub session: Mutex<Session>,
}

impl AppState {
    #[must_use]
    pub fn new(router: Arc<dyn RouteFetcher>) -> Self {
        Self {
            router,
            session: Mutex::new(Session::default()),
        }
    }

    /// Locks the session, recovering it if a handler panicked mid-update.
    pub fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registers the page and API routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(UPLOAD_LIMIT_BYTES))
        .route("/", web::get().to(handlers::index))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health))
                .route("/upload", web::post().to(handlers::upload))
                .route("/view", web::get().to(handlers::view))
                .route("/map", web::get().to(handlers::map)),
        );
}

/// Starts the server on `BIND_ADDR`:`PORT` (default `127.0.0.1:8080`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the routing configuration is
/// invalid or the HTTP server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    run_server_on(bind_addr, port).await
}

/// Starts the server on an explicit address. This is a regular async
/// function; the caller provides the actix runtime.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the routing configuration is
/// invalid or the HTTP server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server_on(bind_addr: String, port: u16) -> std::io::Result<()> {
    let config = RoutingConfig::from_env().map_err(std::io::Error::other)?;
    log::info!(
        "Routing via {} (profile {}, timeout {}s, {} retries)",
        config.base_url,
        config.profile,
        config.timeout_secs,
        config.retry.max_retries
    );
    let router = OsrmClient::new(config).map_err(std::io::Error::other)?;

    let state = web::Data::new(AppState::new(Arc::new(router)));

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
