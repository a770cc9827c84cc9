#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Driving-route client for the KSI map.
//!
//! Fetches a route between two points from an OSRM-compatible service
//! (`/route/v1/{profile}/{lon},{lat};{lon},{lat}`) and decodes its `GeoJSON`
//! geometry. Requests go through an explicit [`retry::RetryPolicy`] so
//! transient server errors (500, 502, 503, 504 by default) are retried with
//! exponential backoff.
//!
//! Fetch failures never escape as errors: [`RouteFetcher::fetch_route`]
//! always yields a [`RouteOutcome`], with an empty geometry and a
//! user-facing [`StatusMessage`] when something went wrong.

pub mod config;
pub mod osrm;
pub mod retry;
pub mod transport;

use async_trait::async_trait;
use ksi_map_road_models::{LatLon, RouteGeometry, StatusMessage};

pub use config::RoutingConfig;
pub use osrm::OsrmClient;
pub use retry::RetryPolicy;

/// Errors that can occur while talking to the routing service.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The connection failed before a response arrived.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of what went wrong.
        message: String,
    },

    /// Every attempt ended in a retryable status.
    #[error("Max retries exceeded ({retries}): too many {status} error responses")]
    RetriesExhausted {
        /// Status of the final attempt.
        status: u16,
        /// Number of retries made after the first attempt.
        retries: u32,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response JSON did not have the expected shape.
    #[error("Unexpected route response: {message}")]
    Parse {
        /// Description of what went wrong.
        message: String,
    },

    /// Routing configuration is invalid.
    #[error("Invalid routing configuration: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

impl RouteError {
    /// Returns `true` if the error is likely transient and worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_body() || e.is_request(),
            Self::Connection { .. } => true,
            Self::RetriesExhausted { .. }
            | Self::Json(_)
            | Self::Parse { .. }
            | Self::Config { .. } => false,
        }
    }
}

/// Result of a route fetch as seen by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOutcome {
    /// Route points in service order; empty when no route is available.
    pub geometry: RouteGeometry,
    /// Set on every warning or error path, `None` on success.
    pub status: Option<StatusMessage>,
}

impl RouteOutcome {
    #[must_use]
    pub const fn found(geometry: RouteGeometry) -> Self {
        Self {
            geometry,
            status: None,
        }
    }

    #[must_use]
    pub const fn failed(status: StatusMessage) -> Self {
        Self {
            geometry: RouteGeometry::empty(),
            status: Some(status),
        }
    }
}

/// Anything that can produce a driving route between two points.
#[async_trait]
pub trait RouteFetcher: Send + Sync {
    /// Fetches the route from `start` to `end`.
    ///
    /// Never fails: problems are reported through
    /// [`RouteOutcome::status`] alongside an empty geometry.
    async fn fetch_route(&self, start: LatLon, end: LatLon) -> RouteOutcome;
}
