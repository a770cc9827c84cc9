#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map view model, Leaflet HTML and collision tables for the KSI map.
//!
//! [`render`] turns a route and the filtered collisions into a
//! [`MapView`]: a serializable description of the map (center, zoom, route
//! line, collision markers) that front ends draw however they like. The
//! [`html`] module draws it as a standalone Leaflet page and [`table`]
//! lays out the filtered rows.

pub mod html;
pub mod table;

use geojson::{Feature, FeatureCollection, Geometry, Value};
use ksi_map_road_models::{CollisionRecord, LatLon, LonLat, RouteGeometry, Severity};
use serde::Serialize;

pub use table::CollisionTableView;

/// Initial zoom level of every map.
pub const DEFAULT_ZOOM: u8 = 14;

/// Shown instead of a map when the route is empty.
pub const NO_ROUTE_DATA_MESSAGE: &str =
    "No route data available. Unable to create a visual representation.";

/// Stroke of the route line.
pub const ROUTE_STYLE: LineStyle = LineStyle {
    color: "blue",
    weight: 3,
};

/// Appearance of collision markers.
pub const MARKER_STYLE: MarkerStyle = MarkerStyle {
    radius: 5,
    color: "red",
    fill: true,
    fill_color: "red",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStyle {
    pub color: &'static str,
    pub weight: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    pub radius: u32,
    pub color: &'static str,
    pub fill: bool,
    pub fill_color: &'static str,
}

/// The route as drawn: service points in service order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLine {
    pub points: Vec<LonLat>,
    pub style: LineStyle,
}

/// One filled circle per KSI collision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionMarker {
    pub location: LatLon,
    pub severity: Option<Severity>,
    /// Hover text, `Severity: {code}`.
    pub tooltip: String,
    pub style: MarkerStyle,
}

/// Everything needed to draw one road's map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub center: LatLon,
    pub zoom: u8,
    pub route: RouteLine,
    pub markers: Vec<CollisionMarker>,
}

/// Builds the map for a route and its filtered collisions.
///
/// Returns `None` when `route` is empty: there is nothing to draw and the
/// caller shows [`NO_ROUTE_DATA_MESSAGE`] instead. Otherwise the map is
/// centered on `origin`, the route points are kept exactly as given, and
/// every collision with coordinates gets a marker.
#[must_use]
pub fn render(
    route: &RouteGeometry,
    origin: LatLon,
    collisions: &[CollisionRecord],
) -> Option<MapView> {
    if route.is_empty() {
        return None;
    }

    let markers = collisions
        .iter()
        .filter_map(|row| {
            let Some(location) = row.location() else {
                log::warn!(
                    "Skipping marker for collision on road {:?} without coordinates",
                    row.road_id
                );
                return None;
            };
            Some(CollisionMarker {
                location,
                severity: row.severity,
                tooltip: tooltip(row.severity),
                style: MARKER_STYLE,
            })
        })
        .collect();

    Some(MapView {
        center: origin,
        zoom: DEFAULT_ZOOM,
        route: RouteLine {
            points: route.points().to_vec(),
            style: ROUTE_STYLE,
        },
        markers,
    })
}

fn tooltip(severity: Option<Severity>) -> String {
    severity.map_or_else(|| "Severity: ".to_owned(), |s| format!("Severity: {s}"))
}

impl MapView {
    /// The route and markers as `GeoJSON`, in `[lon, lat]` order.
    ///
    /// Each feature carries its styling in `properties` (`kind`, `color`,
    /// `weight` for the route; `kind`, `radius`, `color`, `fill`,
    /// `fillColor`, `tooltip`, `severity` for markers).
    #[must_use]
    pub fn feature_collection(&self) -> FeatureCollection {
        let mut features = Vec::with_capacity(self.markers.len() + 1);

        let line = self
            .route
            .points
            .iter()
            .map(|p| vec![p.lon, p.lat])
            .collect();
        let mut route = Feature::from(Geometry::new(Value::LineString(line)));
        route.set_property("kind", "route");
        route.set_property("color", self.route.style.color);
        route.set_property("weight", self.route.style.weight);
        features.push(route);

        for marker in &self.markers {
            let point = vec![marker.location.lon, marker.location.lat];
            let mut feature = Feature::from(Geometry::new(Value::Point(point)));
            feature.set_property("kind", "collision");
            feature.set_property("radius", marker.style.radius);
            feature.set_property("color", marker.style.color);
            feature.set_property("fill", marker.style.fill);
            feature.set_property("fillColor", marker.style.fill_color);
            feature.set_property("tooltip", marker.tooltip.clone());
            feature.set_property("severity", marker.severity.map(Severity::code));
            features.push(feature);
        }

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use ksi_map_road_models::RoadId;

    use super::*;

    fn route() -> RouteGeometry {
        RouteGeometry::new(vec![
            LonLat::new(-79.40, 43.70),
            LonLat::new(-79.405, 43.705),
            LonLat::new(-79.41, 43.71),
        ])
    }

    fn collision(severity: i64, lat: Option<f64>) -> CollisionRecord {
        CollisionRecord {
            road_class: "R".to_owned(),
            road_number: "1".to_owned(),
            road_id: Some(RoadId::new("R1")),
            latitude: lat,
            longitude: Some(-79.402),
            severity: Some(Severity::new(severity)),
            cells: Vec::new(),
        }
    }

    #[test]
    fn empty_route_renders_nothing() {
        let view = render(
            &RouteGeometry::empty(),
            LatLon::new(43.7, -79.4),
            &[collision(1, Some(43.7))],
        );
        assert!(view.is_none());
    }

    #[test]
    fn centers_on_origin_with_fixed_zoom() {
        let origin = LatLon::new(43.70, -79.40);
        let view = render(&route(), origin, &[]).unwrap();
        assert_eq!(view.center, origin);
        assert_eq!(view.zoom, 14);
        assert!(view.markers.is_empty());
    }

    #[test]
    fn keeps_route_points_in_order() {
        let view = render(&route(), LatLon::new(43.70, -79.40), &[]).unwrap();
        assert_eq!(view.route.points, route().points());
        assert_eq!(view.route.style, ROUTE_STYLE);
        assert_eq!(view.route.style.color, "blue");
        assert_eq!(view.route.style.weight, 3);
    }

    #[test]
    fn one_marker_per_collision_with_severity_tooltip() {
        let view = render(
            &route(),
            LatLon::new(43.70, -79.40),
            &[collision(2, Some(43.701))],
        )
        .unwrap();
        assert_eq!(view.markers.len(), 1);
        let marker = &view.markers[0];
        assert_eq!(marker.tooltip, "Severity: 2");
        assert_eq!(marker.location, LatLon::new(43.701, -79.402));
        assert_eq!(marker.style.color, "red");
        assert_eq!(marker.style.fill_color, "red");
        assert!(marker.style.fill);
    }

    #[test]
    fn skips_collisions_without_coordinates() {
        let view = render(
            &route(),
            LatLon::new(43.70, -79.40),
            &[collision(1, None), collision(2, Some(43.701))],
        )
        .unwrap();
        assert_eq!(view.markers.len(), 1);
    }

    #[test]
    fn feature_collection_uses_lon_lat_order() {
        let view = render(
            &route(),
            LatLon::new(43.70, -79.40),
            &[collision(1, Some(43.701))],
        )
        .unwrap();
        let fc = view.feature_collection();
        assert_eq!(fc.features.len(), 2);

        let json = serde_json::to_value(&fc).unwrap();
        assert_eq!(json["features"][0]["geometry"]["type"], "LineString");
        assert_eq!(
            json["features"][0]["geometry"]["coordinates"][0],
            serde_json::json!([-79.40, 43.70])
        );
        assert_eq!(json["features"][1]["geometry"]["type"], "Point");
        assert_eq!(
            json["features"][1]["geometry"]["coordinates"],
            serde_json::json!([-79.402, 43.701])
        );
        assert_eq!(json["features"][1]["properties"]["tooltip"], "Severity: 1");
    }
}
