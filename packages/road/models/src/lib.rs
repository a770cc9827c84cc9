#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Road speed, collision and route geometry types for the KSI map.
//!
//! Speed records describe a road segment by its endpoints. Collision
//! ("KSI": killed or seriously injured) records carry a road class and road
//! number which, concatenated, form the [`RoadId`] used to join the two
//! datasets. Everything here is in-memory only and lives for a single
//! session.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Column holding the road identifier in the speed dataset, and the column
/// the derived identifier is written to in the collision dataset.
pub const ROAD_ID_COLUMN: &str = "Road_Number";

/// Severity codes that count as killed or seriously injured.
pub const KSI_SEVERITIES: [i64; 2] = [1, 2];

/// Which of the two uploaded datasets something refers to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
pub enum Dataset {
    /// Road-segment speed records.
    #[strum(serialize = "speed")]
    Speed,
    /// Collision records.
    #[strum(serialize = "KSI")]
    Ksi,
}

impl Dataset {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Speed, Self::Ksi]
    }
}

/// Road identifier shared by the speed and collision datasets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoadId(String);

impl RoadId {
    /// Wraps an identifier read verbatim from a dataset.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives an identifier from a road class and road number by plain
    /// text concatenation: class `4` and number `17` become `"417"`.
    #[must_use]
    pub fn from_class_and_number(road_class: &str, road_number: &str) -> Self {
        let mut id = String::with_capacity(road_class.len() + road_number.len());
        id.push_str(road_class);
        id.push_str(road_number);
        Self(id)
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoadId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Collision severity code as recorded in the source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Severity(i64);

impl Severity {
    /// Wraps a raw severity code.
    #[must_use]
    pub const fn new(code: i64) -> Self {
        Self(code)
    }

    /// Returns the raw code.
    #[must_use]
    pub const fn code(self) -> i64 {
        self.0
    }

    /// Whether this code is one of [`KSI_SEVERITIES`].
    #[must_use]
    pub const fn is_ksi(self) -> bool {
        matches!(self.0, 1 | 2)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A WGS84 point in latitude/longitude order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

impl LatLon {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A WGS84 point in the longitude/latitude order routing services use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// Latitude in decimal degrees.
    pub lat: f64,
}

impl LonLat {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Swaps into latitude/longitude order.
    #[must_use]
    pub const fn to_lat_lon(self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

/// Ordered driving path returned by the routing service.
///
/// An empty geometry means either no route exists or the fetch failed; the
/// two cases are only told apart by the status message that accompanies
/// them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteGeometry(Vec<LonLat>);

impl RouteGeometry {
    #[must_use]
    pub const fn new(points: Vec<LonLat>) -> Self {
        Self(points)
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Points in service order.
    #[must_use]
    pub fn points(&self) -> &[LonLat] {
        &self.0
    }
}

/// One road segment from the speed dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedRecord {
    /// Road identifier (`Road_Number`).
    pub road_id: RoadId,
    /// Segment start (`latitude_S`, `longitude_S`), or `None` if either
    /// cell is blank or not a number.
    pub start: Option<LatLon>,
    /// Segment end (`latitude_E`, `longitude_E`), or `None` if either cell
    /// is blank or not a number.
    pub end: Option<LatLon>,
}

/// All rows of an uploaded speed dataset, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeedTable {
    pub rows: Vec<SpeedRecord>,
}

impl SpeedTable {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One collision event from the KSI dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionRecord {
    /// Road class code (`Roadclass1`), as written in the file.
    pub road_class: String,
    /// Road number (`roadnum1`), as written in the file.
    pub road_number: String,
    /// Join key derived by preprocessing. `None` until the table has been
    /// preprocessed.
    pub road_id: Option<RoadId>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub severity: Option<Severity>,
    /// Every cell of the source row, aligned with
    /// [`CollisionTable::columns`].
    pub cells: Vec<String>,
}

impl CollisionRecord {
    /// Marker position, when both coordinates are present.
    #[must_use]
    pub fn location(&self) -> Option<LatLon> {
        Some(LatLon::new(self.latitude?, self.longitude?))
    }
}

/// All rows of an uploaded KSI dataset, in file order, with the source
/// header row so the table can be shown as it was uploaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionTable {
    pub columns: Vec<String>,
    pub rows: Vec<CollisionRecord>,
}

impl CollisionTable {
    /// Index of a column by exact header name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// How prominently a status message should be shown.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// A user-visible status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Warning,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }
}

impl std::fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.text)
    }
}
