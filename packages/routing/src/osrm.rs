//! OSRM route client.
//!
//! See <https://project-osrm.org/docs/v5.24.0/api/#route-service>

use std::sync::Arc;

use async_trait::async_trait;
use ksi_map_road_models::{LatLon, LonLat, RouteGeometry, StatusMessage};

use crate::transport::{ReqwestTransport, RouteTransport};
use crate::{RouteError, RouteFetcher, RouteOutcome, RoutingConfig, retry};

/// Warning shown when the service answers but has no route.
pub const NO_ROUTE_MESSAGE: &str = "No route found. Check coordinates or road connectivity.";

/// Builds the route request URL. Coordinates are written longitude first,
/// as OSRM expects, and the full geometry is requested as `GeoJSON`.
#[must_use]
pub fn route_url(base_url: &str, profile: &str, start: LatLon, end: LatLon) -> String {
    format!(
        "{}/route/v1/{profile}/{},{};{},{}?overview=full&geometries=geojson",
        base_url.trim_end_matches('/'),
        start.lon,
        start.lat,
        end.lon,
        end.lat,
    )
}

/// Extracts the first route's coordinates from an OSRM response.
///
/// Returns `Ok(None)` when `routes` is missing or empty.
///
/// # Errors
///
/// Returns [`RouteError::Parse`] if the first route has no coordinate list
/// or a coordinate is not a `[lon, lat, ...]` pair of numbers.
pub fn parse_response(body: &serde_json::Value) -> Result<Option<RouteGeometry>, RouteError> {
    let Some(first) = body["routes"].as_array().and_then(|routes| routes.first()) else {
        return Ok(None);
    };

    let coordinates = first["geometry"]["coordinates"]
        .as_array()
        .ok_or_else(|| RouteError::Parse {
            message: "route has no geometry.coordinates array".to_owned(),
        })?;

    let points = coordinates
        .iter()
        .enumerate()
        .map(|(i, coord)| {
            let lon = coord[0].as_f64();
            let lat = coord[1].as_f64();
            match (lon, lat) {
                (Some(lon), Some(lat)) => Ok(LonLat::new(lon, lat)),
                _ => Err(RouteError::Parse {
                    message: format!("coordinate {i} is not a [lon, lat] pair: {coord}"),
                }),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(RouteGeometry::new(points)))
}

/// Client for an OSRM-compatible route service.
pub struct OsrmClient {
    config: RoutingConfig,
    transport: Arc<dyn RouteTransport>,
}

impl OsrmClient {
    /// Creates a client that talks HTTP via `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: RoutingConfig) -> Result<Self, RouteError> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a client over an arbitrary transport.
    #[must_use]
    pub fn with_transport(config: RoutingConfig, transport: Arc<dyn RouteTransport>) -> Self {
        Self { config, transport }
    }

    #[must_use]
    pub const fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Requests the route from `start` to `end`.
    ///
    /// Success yields the geometry and no status. A response with an empty
    /// route list yields a warning, any other outcome an error, and both
    /// come with an empty geometry.
    pub async fn fetch_route(&self, start: LatLon, end: LatLon) -> RouteOutcome {
        let url = route_url(&self.config.base_url, &self.config.profile, start, end);
        log::info!("Fetching route: {url}");

        match self.request(&url).await {
            Ok(Fetched::Route(geometry)) => {
                log::info!("Route has {} points", geometry.len());
                RouteOutcome::found(geometry)
            }
            Ok(Fetched::NoRoute) => {
                log::warn!("No route returned for {url}");
                RouteOutcome::failed(StatusMessage::warning(NO_ROUTE_MESSAGE))
            }
            Ok(Fetched::Status(status)) => {
                log::error!("Route request failed with HTTP {status}: {url}");
                RouteOutcome::failed(StatusMessage::error(format!(
                    "Failed to fetch route, HTTP status: {status}"
                )))
            }
            Err(e) => {
                log::error!("Route request failed: {e}");
                RouteOutcome::failed(StatusMessage::error(format!("Error fetching route: {e}")))
            }
        }
    }

    async fn request(&self, url: &str) -> Result<Fetched, RouteError> {
        let response =
            retry::get_with_retry(self.transport.as_ref(), url, &self.config.retry).await?;

        if response.status != 200 {
            return Ok(Fetched::Status(response.status));
        }

        let body: serde_json::Value = serde_json::from_str(&response.body)?;
        Ok(parse_response(&body)?.map_or(Fetched::NoRoute, Fetched::Route))
    }
}

enum Fetched {
    Route(RouteGeometry),
    NoRoute,
    Status(u16),
}

#[async_trait]
impl RouteFetcher for OsrmClient {
    async fn fetch_route(&self, start: LatLon, end: LatLon) -> RouteOutcome {
        Self::fetch_route(self, start, end).await
    }
}
