use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::cell::Cell;

#[derive(Debug)]
pub enum CellLoadError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    JsonError(serde_json::Error),
    UnsupportedFormat(String),
}

impl From<std::io::Error> for CellLoadError {
    fn from(err: std::io::Error) -> Self {
        CellLoadError::IoError(err)
    }
}

impl From<csv::Error> for CellLoadError {
    fn from(err: csv::Error) -> Self {
        CellLoadError::CsvError(err)
    }
}

impl From<serde_json::Error> for CellLoadError {
    fn from(err: serde_json::Error) -> Self {
        CellLoadError::JsonError(err)
    }
}

impl std::fmt::Display for CellLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellLoadError::IoError(e) => write!(f, "IO error: {}", e),
            CellLoadError::CsvError(e) => write!(f, "CSV error: {}", e),
            CellLoadError::JsonError(e) => write!(f, "JSON error: {}", e),
            CellLoadError::UnsupportedFormat(s) => {
                write!(f, "Unsupported cell file format: {}", s)
            }
        }
    }
}

impl std::error::Error for CellLoadError {}

/// On-disk cell record. Risk-factor fields default to neutral values when
/// a column is absent; `need_index` defaults to population * risk_score.
#[derive(Debug, Deserialize)]
struct CellRecord {
    id: String,
    lat: f64,
    lon: f64,
    population: u32,
    #[serde(default)]
    risk_score: f64,
    #[serde(default)]
    poverty_rate: f64,
    #[serde(default)]
    benefit_rate: f64,
    #[serde(default = "default_vehicle_access")]
    vehicle_access_rate: f64,
    #[serde(default)]
    need_index: Option<f64>,
}

fn default_vehicle_access() -> f64 {
    1.0
}

impl CellRecord {
    fn into_cell(self) -> Cell {
        let need_index = self
            .need_index
            .unwrap_or(self.population as f64 * self.risk_score);
        Cell {
            id: self.id,
            lat: self.lat,
            lon: self.lon,
            population: self.population,
            risk_score: self.risk_score,
            poverty_rate: self.poverty_rate,
            benefit_rate: self.benefit_rate,
            vehicle_access_rate: self.vehicle_access_rate,
            need_index,
        }
    }
}

/// Loads cells from a JSON or CSV file, dispatching on the extension.
pub fn load_cells(path: &Path) -> Result<Vec<Cell>, CellLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_cells_json(path),
        Some("csv") => load_cells_csv(path),
        other => Err(CellLoadError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

pub fn load_cells_json(path: &Path) -> Result<Vec<Cell>, CellLoadError> {
    let mut contents = String::new();
    File::open(path)?.read_to_string(&mut contents)?;
    cells_from_json(&contents)
}

/// Parses a JSON array of cell records. Records that fail to parse are
/// skipped with a warning; one bad block never aborts the load.
pub fn cells_from_json(contents: &str) -> Result<Vec<Cell>, CellLoadError> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(contents)?;
    let mut cells = Vec::with_capacity(raw.len());
    let mut skipped = 0usize;

    for value in raw {
        match serde_json::from_value::<CellRecord>(value) {
            Ok(record) => push_populated(record, &mut cells),
            Err(e) => {
                warn!("skipping malformed cell record: {}", e);
                skipped += 1;
            }
        }
    }

    debug!(loaded = cells.len(), skipped, "loaded cells from JSON");
    Ok(cells)
}

pub fn load_cells_csv(path: &Path) -> Result<Vec<Cell>, CellLoadError> {
    let mut contents = String::new();
    File::open(path)?.read_to_string(&mut contents)?;
    cells_from_csv(&contents)
}

/// Parses CSV cell records with a header row. Rows that fail to parse are
/// skipped with a warning.
pub fn cells_from_csv(contents: &str) -> Result<Vec<Cell>, CellLoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(contents.as_bytes());

    let mut cells = Vec::new();
    let mut skipped = 0usize;

    for result in reader.deserialize::<CellRecord>() {
        match result {
            Ok(record) => push_populated(record, &mut cells),
            Err(e) => {
                warn!("skipping malformed cell row: {}", e);
                skipped += 1;
            }
        }
    }

    debug!(loaded = cells.len(), skipped, "loaded cells from CSV");
    Ok(cells)
}

// Unpopulated cells never enter a candidate pool; exclude them at the
// ingestion boundary.
fn push_populated(record: CellRecord, cells: &mut Vec<Cell>) {
    let cell = record.into_cell();
    if cell.population > 0 {
        cells.push(cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_parsing_with_need_fallback() {
        let data = "\
id,lat,lon,population,risk_score,poverty_rate,benefit_rate,vehicle_access_rate,need_index
06037-1,34.05,-118.24,1000,3.0,0.25,0.15,0.8,
06037-2,34.06,-118.25,500,2.0,0.10,0.05,0.9,750
";
        let cells = cells_from_csv(data).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].need_index, 3000.0);
        assert_eq!(cells[1].need_index, 750.0);
    }

    #[test]
    fn test_csv_skips_malformed_rows() {
        let data = "\
id,lat,lon,population,risk_score
good,34.05,-118.24,1000,3.0
bad,not-a-number,-118.25,500,2.0
also-good,34.07,-118.26,200,1.0
";
        let cells = cells_from_csv(data).unwrap();
        let ids: Vec<&str> = cells.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["good", "also-good"]);
    }

    #[test]
    fn test_unpopulated_cells_excluded() {
        let data = "\
id,lat,lon,population,risk_score
lived-in,34.05,-118.24,10,3.0
empty,34.06,-118.25,0,5.0
";
        let cells = cells_from_csv(data).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].id, "lived-in");
    }

    #[test]
    fn test_json_parsing_skips_bad_records() {
        let data = r#"[
            {"id": "a", "lat": 34.05, "lon": -118.24, "population": 1000, "risk_score": 3.0},
            {"id": "broken", "lat": "nope"},
            {"id": "b", "lat": 34.06, "lon": -118.25, "population": 500, "risk_score": 2.0, "need_index": 123.0}
        ]"#;
        let cells = cells_from_json(data).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].need_index, 3000.0);
        assert_eq!(cells[1].need_index, 123.0);
    }

    #[test]
    fn test_vehicle_access_defaults_to_full() {
        let data = r#"[{"id": "a", "lat": 34.0, "lon": -118.0, "population": 10, "risk_score": 1.0}]"#;
        let cells = cells_from_json(data).unwrap();
        assert_eq!(cells[0].vehicle_access_rate, 1.0);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_cells(Path::new("cells.parquet")).unwrap_err();
        assert!(matches!(err, CellLoadError::UnsupportedFormat(_)));
    }
}
