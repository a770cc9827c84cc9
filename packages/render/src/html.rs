//! Standalone Leaflet page for a [`MapView`].
//!
//! The page loads Leaflet and OpenStreetMap tiles from public CDNs and
//! draws the view's `GeoJSON` features, so it can be saved and opened
//! without the server.

use serde_json::json;

use crate::table::escape_html;
use crate::{CollisionTableView, MapView};

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>__TITLE__</title>
<link rel="stylesheet" href="__LEAFLET_CSS__">
<script src="__LEAFLET_JS__"></script>
<style>
  body { margin: 0; font-family: sans-serif; }
  h1 { font-size: 1.2rem; margin: 0.75rem 1rem; }
  #map { height: 70vh; width: 100%; }
  table.collisions { border-collapse: collapse; margin: 1rem; font-size: 0.85rem; }
  table.collisions th, table.collisions td { border: 1px solid #ccc; padding: 0.2rem 0.5rem; }
</style>
</head>
<body>
<h1>__TITLE__</h1>
<div id="map"></div>
__TABLE__
<script>
const view = __VIEW_JSON__;
const map = L.map('map').setView([view.center.lat, view.center.lon], view.zoom);
L.tileLayer('https://tile.openstreetmap.org/{z}/{x}/{y}.png', {
  maxZoom: 19,
  attribution: '&copy; OpenStreetMap contributors'
}).addTo(map);
L.geoJSON(view.features, {
  style: f => f.geometry.type === 'LineString'
    ? { color: f.properties.color, weight: f.properties.weight }
    : {},
  pointToLayer: (f, latlng) => L.circleMarker(latlng, {
    radius: f.properties.radius,
    color: f.properties.color,
    fill: f.properties.fill,
    fillColor: f.properties.fillColor
  }),
  onEachFeature: (f, layer) => {
    if (f.properties.tooltip) layer.bindTooltip(f.properties.tooltip);
  }
}).addTo(map);
</script>
</body>
</html>
"#;

/// Renders `view` as a complete HTML document, with the filtered
/// collision `table` below the map when given.
///
/// # Errors
///
/// Returns an error if the view cannot be serialized to JSON.
pub fn to_html(
    view: &MapView,
    title: &str,
    table: Option<&CollisionTableView>,
) -> Result<String, serde_json::Error> {
    let data = json!({
        "center": view.center,
        "zoom": view.zoom,
        "features": view.feature_collection(),
    });

    let table_html = table.map_or_else(String::new, CollisionTableView::to_html_table);

    Ok(TEMPLATE
        .replace("__LEAFLET_CSS__", LEAFLET_CSS)
        .replace("__LEAFLET_JS__", LEAFLET_JS)
        .replace("__TITLE__", &escape_html(title))
        .replace("__TABLE__", &table_html)
        .replace("__VIEW_JSON__", &script_safe_json(&data)?))
}

/// Serializes `value` for embedding inside a `<script>` element.
fn script_safe_json(value: &serde_json::Value) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

#[cfg(test)]
mod tests {
    use ksi_map_road_models::{CollisionRecord, LatLon, LonLat, RoadId, RouteGeometry, Severity};

    use super::*;
    use crate::render;

    fn view() -> MapView {
        let route = RouteGeometry::new(vec![LonLat::new(-79.40, 43.70), LonLat::new(-79.41, 43.71)]);
        let collision = CollisionRecord {
            road_class: "R".to_owned(),
            road_number: "1".to_owned(),
            road_id: Some(RoadId::new("R1")),
            latitude: Some(43.705),
            longitude: Some(-79.405),
            severity: Some(Severity::new(2)),
            cells: vec!["</script><script>alert(1)</script>".to_owned()],
        };
        render(&route, LatLon::new(43.70, -79.40), &[collision]).unwrap()
    }

    #[test]
    fn document_embeds_view_and_leaflet() {
        let html = to_html(&view(), "Road R1", None).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(LEAFLET_JS));
        assert!(html.contains("<title>Road R1</title>"));
        assert!(html.contains("\"zoom\":14"));
        assert!(html.contains("Severity: 2"));
        assert!(!html.contains("__VIEW_JSON__"));
    }

    #[test]
    fn escapes_title_and_table() {
        let v = view();
        let table = CollisionTableView::new(&["note".to_owned()], &[CollisionRecord {
            cells: vec!["</script><script>alert(1)</script>".to_owned()],
            ..collision_stub()
        }]);
        let html = to_html(&v, "<R1>", Some(&table)).unwrap();
        assert!(html.contains("<title>&lt;R1&gt;</title>"));
        assert!(html.contains("&lt;/script&gt;&lt;script&gt;alert(1)"));
        assert_eq!(html.matches("<script>").count(), 1);
    }

    #[test]
    fn script_json_cannot_close_the_element() {
        let out = script_safe_json(&json!({"t": "</script>"})).unwrap();
        assert!(!out.contains("</"));
        let back: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(back["t"], "</script>");
    }

    fn collision_stub() -> CollisionRecord {
        CollisionRecord {
            road_class: String::new(),
            road_number: String::new(),
            road_id: None,
            latitude: None,
            longitude: None,
            severity: None,
            cells: Vec::new(),
        }
    }
}
