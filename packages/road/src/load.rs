//! Schema-checked CSV loading for the speed and KSI datasets.
//!
//! Headers are matched by exact (trimmed) name. Columns beyond the required
//! ones are kept for the KSI dataset so the filtered table can be shown as
//! uploaded; the speed dataset only keeps what the pipeline uses.

use std::io::Read;
use std::path::Path;

use ksi_map_road_models::{
    CollisionRecord, CollisionTable, Dataset, LatLon, ROAD_ID_COLUMN, RoadId, Severity,
    SpeedRecord, SpeedTable,
};

use crate::LoadError;

/// Columns the speed dataset must provide.
pub const SPEED_COLUMNS: [&str; 5] = [
    ROAD_ID_COLUMN,
    "latitude_S",
    "longitude_S",
    "latitude_E",
    "longitude_E",
];

/// Columns the KSI dataset must provide.
pub const KSI_COLUMNS: [&str; 5] = ["Roadclass1", "roadnum1", "latitude", "longitude", "severity"];

/// Reads a speed dataset from a file on disk.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be opened or fails
/// [`read_speed_csv`].
pub fn load_speed_csv(path: &Path) -> Result<SpeedTable, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        dataset: Dataset::Speed,
        source,
    })?;
    read_speed_csv(file)
}

/// Reads a KSI dataset from a file on disk.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be opened or fails
/// [`read_collision_csv`].
pub fn load_collision_csv(path: &Path) -> Result<CollisionTable, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        dataset: Dataset::Ksi,
        source,
    })?;
    read_collision_csv(file)
}

/// Parses a speed dataset.
///
/// An endpoint whose latitude or longitude is blank or not a number loads
/// as `None` so one bad row does not hide the other roads.
///
/// # Errors
///
/// Returns [`LoadError::MissingColumn`] if a column from [`SPEED_COLUMNS`]
/// is absent, or [`LoadError::Csv`] for malformed CSV.
pub fn read_speed_csv<R: Read>(reader: R) -> Result<SpeedTable, LoadError> {
    let dataset = Dataset::Speed;
    let mut reader = csv_reader(reader);
    let headers = read_headers(&mut reader, dataset)?;
    let [road, lat_s, lon_s, lat_e, lon_e] = resolve_columns(&headers, &SPEED_COLUMNS, dataset)?;

    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|source| LoadError::Csv { dataset, source })?;
        let cells = Cells::new(&record, dataset);

        rows.push(SpeedRecord {
            road_id: RoadId::new(cells.text(road)),
            start: cells.lat_lon([lat_s, lon_s], [SPEED_COLUMNS[1], SPEED_COLUMNS[2]]),
            end: cells.lat_lon([lat_e, lon_e], [SPEED_COLUMNS[3], SPEED_COLUMNS[4]]),
        });
    }

    log::debug!("Loaded {} speed records", rows.len());

    Ok(SpeedTable { rows })
}

/// Parses a KSI dataset.
///
/// Road class and road number are kept as written so the derived
/// identifier is a plain text concatenation. Empty coordinates and empty
/// severities load as `None`.
///
/// # Errors
///
/// Returns [`LoadError::MissingColumn`] if a column from [`KSI_COLUMNS`] is
/// absent, [`LoadError::InvalidValue`] if a non-empty coordinate or
/// severity cannot be parsed, or [`LoadError::Csv`] for malformed CSV.
pub fn read_collision_csv<R: Read>(reader: R) -> Result<CollisionTable, LoadError> {
    let dataset = Dataset::Ksi;
    let mut reader = csv_reader(reader);
    let columns = read_headers(&mut reader, dataset)?;
    let [class, number, lat, lon, severity] = resolve_columns(&columns, &KSI_COLUMNS, dataset)?;

    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|source| LoadError::Csv { dataset, source })?;
        let cells = Cells::new(&record, dataset);

        let severity = cells
            .optional(severity)
            .map(|value| parse_severity(value).ok_or_else(|| cells.invalid(KSI_COLUMNS[4], value)))
            .transpose()?;

        let mut all: Vec<String> = record.iter().map(str::to_owned).collect();
        all.resize(columns.len(), String::new());

        rows.push(CollisionRecord {
            road_class: cells.text(class).to_owned(),
            road_number: cells.text(number).to_owned(),
            road_id: None,
            latitude: cells.optional_f64(lat, KSI_COLUMNS[2])?,
            longitude: cells.optional_f64(lon, KSI_COLUMNS[3])?,
            severity,
            cells: all,
        });
    }

    log::debug!("Loaded {} KSI records", rows.len());

    Ok(CollisionTable { columns, rows })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn read_headers<R: Read>(
    reader: &mut csv::Reader<R>,
    dataset: Dataset,
) -> Result<Vec<String>, LoadError> {
    Ok(reader
        .headers()
        .map_err(|source| LoadError::Csv { dataset, source })?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_owned())
        .collect())
}

/// Maps each required column name to its index in the header row.
fn resolve_columns<const N: usize>(
    headers: &[String],
    required: &[&'static str; N],
    dataset: Dataset,
) -> Result<[usize; N], LoadError> {
    let mut indices = [0; N];
    for (slot, &column) in indices.iter_mut().zip(required) {
        *slot = headers
            .iter()
            .position(|h| h == column)
            .ok_or(LoadError::MissingColumn { dataset, column })?;
    }
    Ok(indices)
}

/// Accessors over one CSV row that attach line numbers to parse errors.
struct Cells<'a> {
    record: &'a csv::StringRecord,
    dataset: Dataset,
}

impl<'a> Cells<'a> {
    const fn new(record: &'a csv::StringRecord, dataset: Dataset) -> Self {
        Self { record, dataset }
    }

    fn text(&self, idx: usize) -> &'a str {
        self.record.get(idx).unwrap_or("")
    }

    fn optional(&self, idx: usize) -> Option<&'a str> {
        Some(self.text(idx)).filter(|s| !s.is_empty())
    }

    fn invalid(&self, column: &'static str, value: &str) -> LoadError {
        LoadError::InvalidValue {
            dataset: self.dataset,
            line: self.line(),
            column,
            value: value.to_owned(),
        }
    }

    fn line(&self) -> u64 {
        self.record.position().map_or(0, csv::Position::line)
    }

    /// A number, or `None` with a warning if the cell is blank or does not
    /// parse.
    fn lenient_f64(&self, idx: usize, column: &'static str) -> Option<f64> {
        let value = self.text(idx);
        let number = value.parse().ok();
        if number.is_none() {
            log::warn!(
                "{} data line {}: unusable {column} value '{value}'",
                self.dataset,
                self.line()
            );
        }
        number
    }

    /// Both coordinates are read so each bad cell is reported.
    fn lat_lon(&self, [lat, lon]: [usize; 2], columns: [&'static str; 2]) -> Option<LatLon> {
        let lat = self.lenient_f64(lat, columns[0]);
        let lon = self.lenient_f64(lon, columns[1]);
        Some(LatLon::new(lat?, lon?))
    }

    fn optional_f64(&self, idx: usize, column: &'static str) -> Result<Option<f64>, LoadError> {
        self.optional(idx)
            .map(|value| value.parse().map_err(|_| self.invalid(column, value)))
            .transpose()
    }
}

/// Parses an integer severity code. Integral floats such as `"2.0"` are
/// accepted.
#[allow(clippy::cast_possible_truncation)]
fn parse_severity(value: &str) -> Option<Severity> {
    if let Ok(code) = value.parse::<i64>() {
        return Some(Severity::new(code));
    }
    let float = value.parse::<f64>().ok()?;
    (float.is_finite() && float.fract() == 0.0).then(|| Severity::new(float as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEED_CSV: &str = "\
Road_Number,latitude_S,longitude_S,latitude_E,longitude_E,speed_limit
R1,43.70,-79.40,43.71,-79.41,50
R2,43.80,-79.50,43.81,-79.51,60
";

    const KSI_CSV: &str = "\
accident_id,Roadclass1,roadnum1,latitude,longitude,severity
A1,4,17,43.701,-79.401,1
A2,R,1,43.702,-79.402,3
A3,4,1,,,2.0
";

    #[test]
    fn reads_speed_records_in_file_order() {
        let table = read_speed_csv(SPEED_CSV.as_bytes()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].road_id.as_str(), "R1");
        assert!((table.rows[0].start.unwrap().lat - 43.70).abs() < f64::EPSILON);
        assert!((table.rows[0].end.unwrap().lon - -79.41).abs() < f64::EPSILON);
        assert_eq!(table.rows[1].road_id.as_str(), "R2");
    }

    #[test]
    fn reads_collision_records_with_all_cells() {
        let table = read_collision_csv(KSI_CSV.as_bytes()).unwrap();
        assert_eq!(table.columns.len(), 6);
        assert_eq!(table.rows.len(), 3);

        let first = &table.rows[0];
        assert_eq!(first.road_class, "4");
        assert_eq!(first.road_number, "17");
        assert_eq!(first.severity, Some(Severity::new(1)));
        assert_eq!(first.cells[0], "A1");
        assert!(first.road_id.is_none());

        let third = &table.rows[2];
        assert!(third.latitude.is_none());
        assert!(third.longitude.is_none());
        assert_eq!(third.severity, Some(Severity::new(2)));
    }

    #[test]
    fn empty_speed_file_loads_as_empty_table() {
        let csv = "Road_Number,latitude_S,longitude_S,latitude_E,longitude_E\n";
        let table = read_speed_csv(csv.as_bytes()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn rejects_missing_speed_column() {
        let csv = "Road_Number,latitude_S,longitude_S,latitude_E\nR1,1,2,3\n";
        let err = read_speed_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingColumn {
                dataset: Dataset::Speed,
                column: "longitude_E",
            }
        ));
    }

    #[test]
    fn rejects_missing_ksi_column() {
        let csv = "Roadclass1,latitude,longitude,severity\n4,1,2,1\n";
        let err = read_collision_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingColumn {
                dataset: Dataset::Ksi,
                column: "roadnum1",
            }
        ));
        assert_eq!(err.dataset(), Dataset::Ksi);
    }

    #[test]
    fn unusable_speed_coordinates_load_as_none_without_dropping_rows() {
        let csv = "Road_Number,latitude_S,longitude_S,latitude_E,longitude_E\n\
                   R1,43.7,-79.4,43.71,-79.41\n\
                   R2,north,-79.4,43.71,-79.41\n\
                   R3,43.9,-79.6,,-79.61\n";
        let table = read_speed_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.rows.len(), 3);

        assert_eq!(table.rows[0].start, Some(LatLon::new(43.7, -79.4)));
        assert_eq!(table.rows[0].end, Some(LatLon::new(43.71, -79.41)));

        assert_eq!(table.rows[1].road_id.as_str(), "R2");
        assert!(table.rows[1].start.is_none());
        assert_eq!(table.rows[1].end, Some(LatLon::new(43.71, -79.41)));

        assert_eq!(table.rows[2].start, Some(LatLon::new(43.9, -79.6)));
        assert!(table.rows[2].end.is_none());
    }

    #[test]
    fn rejects_fractional_severity() {
        let csv = "Roadclass1,roadnum1,latitude,longitude,severity\n4,1,43.7,-79.4,1.5\n";
        let err = read_collision_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidValue {
                column: "severity",
                ..
            }
        ));
    }

    #[test]
    fn trims_headers_and_cells() {
        let csv = " Road_Number , latitude_S,longitude_S,latitude_E,longitude_E\n R1 ,1,2,3,4\n";
        let table = read_speed_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.rows[0].road_id.as_str(), "R1");
    }

    #[test]
    fn short_rows_are_padded_to_header_width() {
        let csv = "Roadclass1,roadnum1,latitude,longitude,severity,notes\n4,1,43.7,-79.4,1\n";
        let table = read_collision_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.rows[0].cells.len(), 6);
        assert_eq!(table.rows[0].cells[5], "");
    }

    #[test]
    fn parses_integral_float_severity() {
        assert_eq!(parse_severity("2"), Some(Severity::new(2)));
        assert_eq!(parse_severity("2.0"), Some(Severity::new(2)));
        assert_eq!(parse_severity("fatal"), None);
    }
}
