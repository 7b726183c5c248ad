//! Raw source datasets.
//!
//! Two independent datasets feed the index:
//!
//! - **Coordinates**: a JSON document `{"cities": [...]}` whose records carry
//!   the city code, department number and latitude/longitude as strings.
//! - **Populations**: a `;`-delimited CSV with a header row, where column 2
//!   holds the department code, column 6 the town name and column 7 the
//!   population.
//!
//! Loaders only reshape records. Numeric fields stay textual so that the
//! indexing pipeline decides which records are malformed.

use crate::error::Result;
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Column of the department code in the population dataset
pub const POPULATION_REGION_COLUMN: usize = 2;
/// Column of the town name in the population dataset
pub const POPULATION_NAME_COLUMN: usize = 6;
/// Column of the population count in the population dataset
pub const POPULATION_COUNT_COLUMN: usize = 7;

/// Coordinate source record, before normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawCoordinate {
    pub name: String,
    pub region: String,
    pub latitude: String,
    pub longitude: String,
}

/// Population source record, before normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawPopulation {
    pub name: String,
    pub region: String,
    pub population: String,
}

/// One entry of the coordinate document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoordinateRecord {
    pub city_code: String,
    pub department_name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub department_number: String,
    pub insee_code: String,
    pub label: String,
    #[serde(deserialize_with = "string_or_number")]
    pub latitude: String,
    #[serde(deserialize_with = "string_or_number")]
    pub longitude: String,
    pub region_geojson_name: String,
    pub region_name: String,
    pub zip_code: String,
}

impl From<CoordinateRecord> for RawCoordinate {
    fn from(record: CoordinateRecord) -> Self {
        Self {
            name: record.city_code,
            region: record.department_number,
            latitude: record.latitude,
            longitude: record.longitude,
        }
    }
}

#[derive(Deserialize)]
struct CoordinateDocument {
    cities: Vec<CoordinateRecord>,
}

/// Accept `"48.85"`, `48.85` or `null` for fields the source usually quotes.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or a number, found {}",
            other
        ))),
    }
}

/// Read the coordinate document.
pub fn read_coordinates<R: Read>(reader: R) -> Result<Vec<RawCoordinate>> {
    let document: CoordinateDocument = serde_json::from_reader(reader)?;
    Ok(document.cities.into_iter().map(RawCoordinate::from).collect())
}

pub fn load_coordinates<P: AsRef<Path>>(path: P) -> Result<Vec<RawCoordinate>> {
    let file = File::open(path)?;
    read_coordinates(BufReader::new(file))
}

/// Read the population CSV.
///
/// Rows too short for the column layout come back with empty fields and are
/// rejected by the pipeline like any other malformed record.
pub fn read_populations<R: Read>(reader: R) -> Result<Vec<RawPopulation>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let field = |i: usize| row.get(i).unwrap_or_default().to_string();
        records.push(RawPopulation {
            name: field(POPULATION_NAME_COLUMN),
            region: field(POPULATION_REGION_COLUMN),
            population: field(POPULATION_COUNT_COLUMN),
        });
    }
    Ok(records)
}

pub fn load_populations<P: AsRef<Path>>(path: P) -> Result<Vec<RawPopulation>> {
    let file = File::open(path)?;
    read_populations(BufReader::new(file))
}
