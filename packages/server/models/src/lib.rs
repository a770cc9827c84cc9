#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the KSI map server.
//!
//! These types are serialized to JSON for the browser. They are separate
//! from the shell types so the API contract can change independently.

use geojson::FeatureCollection;
use ksi_map_render::{CollisionTableView, MapView};
use ksi_map_road_models::{Dataset, RoadId, StatusMessage};
use ksi_map_shell::{ShellState, UPLOAD_PROMPT, ViewModel};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body for non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Body of `POST /api/upload`. Omitted files keep their previous upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// Full text of the speed CSV.
    pub speed_csv: Option<String>,
    /// Original file name of the speed CSV.
    pub speed_name: Option<String>,
    /// Full text of the KSI CSV.
    pub ksi_csv: Option<String>,
    /// Original file name of the KSI CSV.
    pub ksi_name: Option<String>,
}

/// Session state as seen by the browser.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ApiShellState {
    /// Still waiting for one or both files.
    #[serde(rename_all = "camelCase")]
    AwaitingFiles {
        message: String,
        missing: Vec<Dataset>,
    },
    /// Both files loaded.
    #[serde(rename_all = "camelCase")]
    Ready {
        choices: Vec<RoadId>,
        default_road: Option<RoadId>,
    },
    /// Both files present but unusable.
    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

impl From<&ShellState> for ApiShellState {
    fn from(state: &ShellState) -> Self {
        match state {
            ShellState::AwaitingFiles { missing } => Self::AwaitingFiles {
                message: UPLOAD_PROMPT.to_owned(),
                missing: missing.clone(),
            },
            ShellState::Ready(data) => Self::Ready {
                choices: data.choices.clone(),
                default_road: data.default_road().cloned(),
            },
            ShellState::Failed { message } => Self::Error {
                message: message.clone(),
            },
        }
    }
}

/// Response of `POST /api/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSession {
    /// Bumped on every upload and selection.
    pub generation: u64,
    pub shell: ApiShellState,
}

/// Query parameters for the view and map endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewQueryParams {
    /// Road to evaluate. Defaults to the first choice.
    pub road: Option<String>,
}

/// One evaluated road selection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiView {
    /// Session generation this view was computed for.
    pub generation: u64,
    pub road: RoadId,
    pub messages: Vec<StatusMessage>,
    pub map: Option<MapView>,
    /// The map's route and markers as `GeoJSON`.
    pub features: Option<FeatureCollection>,
    pub table: Option<CollisionTableView>,
}

impl ApiView {
    #[must_use]
    pub fn new(generation: u64, view: ViewModel) -> Self {
        let features = view.map.as_ref().map(MapView::feature_collection);
        Self {
            generation,
            road: view.road,
            messages: view.messages,
            map: view.map,
            features,
            table: view.table,
        }
    }
}
