#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV loading, preprocessing and road selection for the KSI map.
//!
//! The pipeline is:
//!
//! 1. [`load`] reads the speed and KSI CSV files against an explicit
//!    column schema, failing early with a [`LoadError`] that names the
//!    dataset and the missing column or bad cell.
//! 2. [`preprocess`] derives the join key on every collision row.
//! 3. [`select`] lists the selectable roads and, for a chosen road, picks
//!    the canonical speed record and the killed-or-seriously-injured
//!    collisions on that road.

pub mod load;
pub mod preprocess;
pub mod select;

use ksi_map_road_models::Dataset;

pub use load::{load_collision_csv, load_speed_csv, read_collision_csv, read_speed_csv};
pub use preprocess::preprocess;
pub use select::{
    SelectError, Selection, filter_collisions, find_speed_record, road_choices, select_and_filter,
};

/// Errors that can occur while loading an uploaded dataset.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("Failed to read {dataset} data: {source}")]
    Io {
        /// Which dataset was being read.
        dataset: Dataset,
        source: std::io::Error,
    },

    /// The file is not valid CSV.
    #[error("Failed to parse {dataset} data as CSV: {source}")]
    Csv {
        /// Which dataset was being read.
        dataset: Dataset,
        source: csv::Error,
    },

    /// A required column is absent from the header row.
    #[error("{dataset} data is missing required column '{column}'")]
    MissingColumn {
        /// Which dataset was being read.
        dataset: Dataset,
        /// Name of the missing column.
        column: &'static str,
    },

    /// A cell could not be converted to the column's type.
    #[error("{dataset} data line {line}: invalid {column} value '{value}'")]
    InvalidValue {
        /// Which dataset was being read.
        dataset: Dataset,
        /// 1-based line number in the file.
        line: u64,
        /// Column the cell belongs to.
        column: &'static str,
        /// The offending cell text.
        value: String,
    },
}

impl LoadError {
    /// The dataset this error refers to.
    #[must_use]
    pub const fn dataset(&self) -> Dataset {
        match self {
            Self::Io { dataset, .. }
            | Self::Csv { dataset, .. }
            | Self::MissingColumn { dataset, .. }
            | Self::InvalidValue { dataset, .. } => *dataset,
        }
    }
}
