//! Road selection and collision filtering.

use std::collections::HashSet;

use ksi_map_road_models::{
    CollisionRecord, CollisionTable, RoadId, Severity, SpeedRecord, SpeedTable,
};

/// Why a selection could not be made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    /// The speed dataset has no rows, so there is nothing to select.
    #[error("Loaded speed data is empty. Please check the file content.")]
    EmptySpeedTable,

    /// The requested road does not occur in the speed dataset.
    #[error("Road '{road}' is not present in the speed data")]
    UnknownRoad {
        /// The requested identifier.
        road: RoadId,
    },
}

/// A chosen road with everything needed to route and render it.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// First speed record carrying the selected identifier.
    pub speed: SpeedRecord,
    /// Killed-or-seriously-injured collisions on the selected road, in file
    /// order.
    pub collisions: Vec<CollisionRecord>,
}

/// Distinct road identifiers in order of first appearance.
#[must_use]
pub fn road_choices(speed: &SpeedTable) -> Vec<RoadId> {
    let mut seen = HashSet::new();
    let mut choices = Vec::new();
    for row in &speed.rows {
        if seen.insert(&row.road_id) {
            choices.push(row.road_id.clone());
        }
    }
    choices
}

/// The first speed record for `road`. Later duplicates are ignored.
#[must_use]
pub fn find_speed_record<'a>(speed: &'a SpeedTable, road: &RoadId) -> Option<&'a SpeedRecord> {
    speed.rows.iter().find(|row| &row.road_id == road)
}

/// Collisions whose derived identifier equals `road` and whose severity is
/// 1 or 2. Rows that have not been preprocessed never match.
///
/// Applying the filter to its own output returns the same rows.
#[must_use]
pub fn filter_collisions(collisions: &[CollisionRecord], road: &RoadId) -> Vec<CollisionRecord> {
    collisions
        .iter()
        .filter(|row| row.road_id.as_ref() == Some(road))
        .filter(|row| row.severity.is_some_and(Severity::is_ksi))
        .cloned()
        .collect()
}

/// Resolves `road` against the speed data and filters the collisions to it.
///
/// # Errors
///
/// Returns [`SelectError::EmptySpeedTable`] if the speed data has no rows
/// and [`SelectError::UnknownRoad`] if no speed record carries `road`.
pub fn select_and_filter(
    speed: &SpeedTable,
    collisions: &CollisionTable,
    road: &RoadId,
) -> Result<Selection, SelectError> {
    if speed.is_empty() {
        return Err(SelectError::EmptySpeedTable);
    }

    let record = find_speed_record(speed, road).ok_or_else(|| SelectError::UnknownRoad {
        road: road.clone(),
    })?;

    let filtered = filter_collisions(&collisions.rows, road);

    log::debug!(
        "Road {road}: {} of {} collisions are KSI on this road",
        filtered.len(),
        collisions.rows.len()
    );

    Ok(Selection {
        speed: record.clone(),
        collisions: filtered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{preprocess, read_collision_csv, read_speed_csv};

    fn speed_table(csv: &str) -> SpeedTable {
        read_speed_csv(csv.as_bytes()).unwrap()
    }

    fn collision_table(csv: &str) -> CollisionTable {
        preprocess(read_collision_csv(csv.as_bytes()).unwrap())
    }

    const SPEED: &str = "\
Road_Number,latitude_S,longitude_S,latitude_E,longitude_E
R2,1,1,1,1
R1,43.70,-79.40,43.71,-79.41
R2,2,2,2,2
R1,9,9,9,9
";

    #[test]
    fn choices_are_distinct_in_first_seen_order() {
        let choices = road_choices(&speed_table(SPEED));
        assert_eq!(choices, vec![RoadId::new("R2"), RoadId::new("R1")]);
    }

    #[test]
    fn first_matching_speed_row_wins() {
        let table = speed_table(SPEED);
        let record = find_speed_record(&table, &RoadId::new("R1")).unwrap();
        assert!((record.start.unwrap().lat - 43.70).abs() < f64::EPSILON);
        assert!((record.end.unwrap().lon - -79.41).abs() < f64::EPSILON);
    }

    #[test]
    fn keeps_only_matching_road_with_ksi_severity() {
        let collisions = collision_table(
            "Roadclass1,roadnum1,latitude,longitude,severity\n\
             R,1,43.7,-79.4,1\n\
             R,1,43.7,-79.4,2\n\
             R,1,43.7,-79.4,3\n\
             R,1,43.7,-79.4,\n\
             4,1,43.7,-79.4,1\n",
        );
        let filtered = filter_collisions(&collisions.rows, &RoadId::new("R1"));
        let severities: Vec<i64> = filtered
            .iter()
            .filter_map(|r| r.severity.map(|s| s.code()))
            .collect();
        assert_eq!(severities, vec![1, 2]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let collisions = collision_table(
            "Roadclass1,roadnum1,latitude,longitude,severity\n\
             R,1,43.7,-79.4,1\n\
             R,1,43.7,-79.4,3\n\
             R,2,43.7,-79.4,2\n",
        );
        let road = RoadId::new("R1");
        let once = filter_collisions(&collisions.rows, &road);
        let twice = filter_collisions(&once, &road);
        assert_eq!(once, twice);
    }

    #[test]
    fn unpreprocessed_rows_never_match() {
        let raw = read_collision_csv(
            "Roadclass1,roadnum1,latitude,longitude,severity\nR,1,43.7,-79.4,1\n".as_bytes(),
        )
        .unwrap();
        assert!(filter_collisions(&raw.rows, &RoadId::new("R1")).is_empty());
    }

    #[test]
    fn mismatched_ids_yield_empty_set() {
        let speed = speed_table(
            "Road_Number,latitude_S,longitude_S,latitude_E,longitude_E\n\
             R1,43.70,-79.40,43.71,-79.41\n",
        );
        let collisions = collision_table(
            "Roadclass1,roadnum1,latitude,longitude,severity\n4,1,43.705,-79.405,1\n",
        );
        let selection = select_and_filter(&speed, &collisions, &RoadId::new("R1")).unwrap();
        assert!(selection.collisions.is_empty());
        assert_eq!(selection.speed.road_id, RoadId::new("R1"));
    }

    #[test]
    fn empty_speed_table_is_reported() {
        let speed = SpeedTable::default();
        let err = select_and_filter(&speed, &CollisionTable::default(), &RoadId::new("R1"))
            .unwrap_err();
        assert_eq!(err, SelectError::EmptySpeedTable);
    }

    #[test]
    fn unknown_road_is_reported() {
        let speed = speed_table(SPEED);
        let err = select_and_filter(&speed, &CollisionTable::default(), &RoadId::new("R9"))
            .unwrap_err();
        assert_eq!(
            err,
            SelectError::UnknownRoad {
                road: RoadId::new("R9")
            }
        );
    }
}
