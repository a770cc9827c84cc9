//! Join-key derivation for the KSI dataset.

use ksi_map_road_models::{CollisionTable, ROAD_ID_COLUMN, RoadId};

/// Writes the derived road identifier onto every collision row.
///
/// The identifier is `Roadclass1` followed directly by `roadnum1`, both as
/// they appear in the file. It is stored in [`ROAD_ID_COLUMN`], which is
/// appended to the header row if the upload lacks it and overwritten if it
/// already exists. Rows are neither dropped nor reordered.
#[must_use]
pub fn preprocess(mut table: CollisionTable) -> CollisionTable {
    let idx = if let Some(idx) = table.column_index(ROAD_ID_COLUMN) {
        log::debug!("Overwriting existing {ROAD_ID_COLUMN} column in KSI data");
        idx
    } else {
        table.columns.push(ROAD_ID_COLUMN.to_owned());
        table.columns.len() - 1
    };

    for row in &mut table.rows {
        let id = RoadId::from_class_and_number(&row.road_class, &row.road_number);
        if row.cells.len() <= idx {
            row.cells.resize(idx + 1, String::new());
        }
        row.cells[idx] = id.to_string();
        row.road_id = Some(id);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_collision_csv;

    #[test]
    fn appends_derived_column() {
        let csv = "Roadclass1,roadnum1,latitude,longitude,severity\n\
                   4,17,43.7,-79.4,1\n\
                   R,1,43.7,-79.4,2\n";
        let table = preprocess(read_collision_csv(csv.as_bytes()).unwrap());

        assert_eq!(table.columns.last().map(String::as_str), Some(ROAD_ID_COLUMN));
        assert_eq!(table.rows[0].road_id, Some(RoadId::new("417")));
        assert_eq!(table.rows[0].cells.last().map(String::as_str), Some("417"));
        assert_eq!(table.rows[1].road_id, Some(RoadId::new("R1")));
    }

    #[test]
    fn overwrites_existing_column_in_place() {
        let csv = "Road_Number,Roadclass1,roadnum1,latitude,longitude,severity\n\
                   stale,4,1,43.7,-79.4,1\n";
        let table = preprocess(read_collision_csv(csv.as_bytes()).unwrap());

        assert_eq!(table.columns.len(), 6);
        assert_eq!(table.rows[0].cells[0], "41");
    }

    #[test]
    fn preserves_row_count_order_and_other_cells() {
        let csv = "id,Roadclass1,roadnum1,latitude,longitude,severity\n\
                   c,3,9,43.7,-79.4,3\n\
                   a,4,1,43.7,-79.4,1\n\
                   b,4,1,43.7,-79.4,\n";
        let before = read_collision_csv(csv.as_bytes()).unwrap();
        let after = preprocess(before.clone());

        assert_eq!(after.rows.len(), before.rows.len());
        for (old, new) in before.rows.iter().zip(&after.rows) {
            assert_eq!(old.cells[..], new.cells[..old.cells.len()]);
            assert_eq!(old.severity, new.severity);
        }
    }

    #[test]
    fn derived_id_has_no_numeric_artifacts() {
        let csv = "Roadclass1,roadnum1,latitude,longitude,severity\n4,17,43.7,-79.4,1\n";
        let table = preprocess(read_collision_csv(csv.as_bytes()).unwrap());
        let id = table.rows[0].road_id.as_ref().unwrap();
        assert_eq!(id.as_str(), "417");
        assert_ne!(id.as_str(), "21");
        assert_ne!(id.as_str(), "4.017.0");
    }
}
