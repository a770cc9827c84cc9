#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Upload state and per-selection evaluation for the KSI map.
//!
//! A session moves through three states as files arrive:
//!
//! * no files or one file: [`ShellState::AwaitingFiles`], shown as
//!   [`UPLOAD_PROMPT`];
//! * both files: [`ShellState::Ready`] with the loaded tables and road
//!   choices, or [`ShellState::Failed`] if either file is unusable or the
//!   speed data is empty.
//!
//! Every road selection in the ready state runs [`evaluate`] from scratch.
//! It is a plain function of the loaded data, the selected road and a route
//! fetcher, so web and terminal front ends share it unchanged.

use std::path::Path;
use std::sync::Arc;

use ksi_map_render::{CollisionTableView, MapView, NO_ROUTE_DATA_MESSAGE, render};
use ksi_map_road::{
    LoadError, SelectError, load_collision_csv, load_speed_csv, preprocess, read_collision_csv,
    read_speed_csv, road_choices, select_and_filter,
};
use ksi_map_road_models::{CollisionTable, Dataset, RoadId, SpeedTable, StatusMessage};
use ksi_map_routing::RouteFetcher;
use serde::Serialize;

/// Shown until both files have been uploaded.
pub const UPLOAD_PROMPT: &str = "Please upload both speed and KSI data CSV files to proceed.";

/// Errors that prevent a session from reaching the ready state or a
/// selection from being evaluated.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// An uploaded file could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The selection could not be made.
    #[error(transparent)]
    Select(#[from] SelectError),
}

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// File name as given by the user, for display only.
    pub name: String,
    /// Full CSV text.
    pub contents: String,
}

impl Upload {
    #[must_use]
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// The files currently held by a session. Each slot is replaced
/// independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uploads {
    pub speed: Option<Upload>,
    pub ksi: Option<Upload>,
}

impl Uploads {
    /// Replaces the file for `dataset`.
    pub fn set(&mut self, dataset: Dataset, upload: Upload) {
        match dataset {
            Dataset::Speed => self.speed = Some(upload),
            Dataset::Ksi => self.ksi = Some(upload),
        }
    }

    /// Datasets that have not been uploaded yet.
    #[must_use]
    pub fn missing(&self) -> Vec<Dataset> {
        Dataset::all()
            .iter()
            .copied()
            .filter(|dataset| match dataset {
                Dataset::Speed => self.speed.is_none(),
                Dataset::Ksi => self.ksi.is_none(),
            })
            .collect()
    }
}

/// Both datasets, loaded and preprocessed, with the selectable roads.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedData {
    pub speed: SpeedTable,
    pub collisions: CollisionTable,
    /// Distinct road identifiers in first-seen order. Never empty.
    pub choices: Vec<RoadId>,
}

impl LoadedData {
    /// Preprocesses the collisions and lists the road choices.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::EmptySpeedTable`] if `speed` has no rows.
    pub fn from_tables(speed: SpeedTable, collisions: CollisionTable) -> Result<Self, ShellError> {
        if speed.is_empty() {
            return Err(SelectError::EmptySpeedTable.into());
        }
        let collisions = preprocess(collisions);
        let choices = road_choices(&speed);
        log::info!(
            "Loaded {} speed rows ({} roads) and {} collision rows",
            speed.rows.len(),
            choices.len(),
            collisions.rows.len()
        );
        Ok(Self {
            speed,
            collisions,
            choices,
        })
    }

    /// Parses both uploads.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Load`] if either file is malformed and
    /// [`ShellError::Select`] if the speed data is empty.
    pub fn from_uploads(speed: &Upload, ksi: &Upload) -> Result<Self, ShellError> {
        log::debug!("Loading uploads '{}' and '{}'", speed.name, ksi.name);
        let speed = read_speed_csv(speed.contents.as_bytes())?;
        let collisions = read_collision_csv(ksi.contents.as_bytes())?;
        Self::from_tables(speed, collisions)
    }

    /// Reads both files from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Load`] if either file cannot be read or is
    /// malformed and [`ShellError::Select`] if the speed data is empty.
    pub fn from_paths(speed: &Path, ksi: &Path) -> Result<Self, ShellError> {
        let speed = load_speed_csv(speed)?;
        let collisions = load_collision_csv(ksi)?;
        Self::from_tables(speed, collisions)
    }

    /// The road evaluated when the user has not picked one.
    #[must_use]
    pub fn default_road(&self) -> Option<&RoadId> {
        self.choices.first()
    }
}

/// Where a session stands after its latest upload.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellState {
    /// At least one file is still missing.
    AwaitingFiles { missing: Vec<Dataset> },
    /// Both files loaded; roads can be selected.
    Ready(Arc<LoadedData>),
    /// Both files present but unusable. Stays until a file is replaced.
    Failed { message: String },
}

impl ShellState {
    /// Derives the state from the files currently uploaded. Any earlier
    /// selection is irrelevant: the data is always reloaded in full.
    #[must_use]
    pub fn from_uploads(uploads: &Uploads) -> Self {
        let (Some(speed), Some(ksi)) = (&uploads.speed, &uploads.ksi) else {
            return Self::AwaitingFiles {
                missing: uploads.missing(),
            };
        };

        match LoadedData::from_uploads(speed, ksi) {
            Ok(data) => Self::Ready(Arc::new(data)),
            Err(e) => {
                log::warn!("Uploads rejected: {e}");
                Self::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// The message to show in place of road choices, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusMessage> {
        match self {
            Self::AwaitingFiles { .. } => Some(StatusMessage::info(UPLOAD_PROMPT)),
            Self::Ready(_) => None,
            Self::Failed { message } => Some(StatusMessage::error(message.clone())),
        }
    }
}

/// Everything shown for one road selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub road: RoadId,
    /// Status lines in the order they were raised.
    pub messages: Vec<StatusMessage>,
    /// `None` when no route could be drawn.
    pub map: Option<MapView>,
    /// Filtered KSI rows; only present alongside a map.
    pub table: Option<CollisionTableView>,
}

/// Runs one selection: resolve the road, fetch its route, filter the
/// collisions and render.
///
/// `road` defaults to the first choice. A failed or empty route is not an
/// error: the view carries the route status and
/// [`NO_ROUTE_DATA_MESSAGE`] without a map, and the next selection works
/// as usual. A road whose speed row lacks usable endpoints is reported the
/// same way without asking the router.
///
/// # Errors
///
/// Returns [`SelectError::UnknownRoad`] if `road` is not in the speed data.
pub async fn evaluate(
    data: &LoadedData,
    road: Option<&RoadId>,
    router: &dyn RouteFetcher,
) -> Result<ViewModel, ShellError> {
    let road = road
        .or_else(|| data.default_road())
        .ok_or(SelectError::EmptySpeedTable)?;
    let selection = select_and_filter(&data.speed, &data.collisions, road)?;

    let (Some(origin), Some(end)) = (selection.speed.start, selection.speed.end) else {
        log::warn!("Road {road}: speed row has no usable start and end coordinates");
        return Ok(ViewModel {
            road: road.clone(),
            messages: vec![
                StatusMessage::error(missing_endpoints_message(road)),
                StatusMessage::error(NO_ROUTE_DATA_MESSAGE),
            ],
            map: None,
            table: None,
        });
    };

    let outcome = router.fetch_route(origin, end).await;

    let mut messages: Vec<StatusMessage> = outcome.status.into_iter().collect();

    let Some(map) = render(&outcome.geometry, origin, &selection.collisions) else {
        log::info!("Road {road}: no route to draw");
        messages.push(StatusMessage::error(NO_ROUTE_DATA_MESSAGE));
        return Ok(ViewModel {
            road: road.clone(),
            messages,
            map: None,
            table: None,
        });
    };

    log::info!(
        "Road {road}: {} route points, {} KSI markers",
        map.route.points.len(),
        map.markers.len()
    );

    Ok(ViewModel {
        road: road.clone(),
        messages,
        map: Some(map),
        table: Some(CollisionTableView::new(
            &data.collisions.columns,
            &selection.collisions,
        )),
    })
}

fn missing_endpoints_message(road: &RoadId) -> String {
    format!("Road {road} has no usable start and end coordinates in the speed data.")
}
