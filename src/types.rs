//! Records exchanged with callers of the catalog.

use crate::store::{HashFields, StoreStats};
use geo::Point;
use serde::{Deserialize, Serialize};

/// Hash field holding a city's latitude in degrees
pub const FIELD_LATITUDE: &str = "latitude";
/// Hash field holding a city's longitude in degrees
pub const FIELD_LONGITUDE: &str = "longitude";
/// Hash field holding a city's population
pub const FIELD_POPULATION: &str = "population";

/// A hydrated city.
///
/// Attributes are `None` when the city's hash lacks the field, which happens
/// when the attribute store and the indexes disagree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct City {
    pub key: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub population: Option<f64>,
}

impl City {
    /// A city with no attributes.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Build a city from the fields of its hash. Unparsable fields are dropped.
    pub fn from_fields(key: impl Into<String>, fields: &HashFields) -> Self {
        let parse = |field: &str| fields.get(field).and_then(|v| v.parse::<f64>().ok());
        Self {
            key: key.into(),
            latitude: parse(FIELD_LATITUDE),
            longitude: parse(FIELD_LONGITUDE),
            population: parse(FIELD_POPULATION),
        }
    }

    pub fn point(&self) -> Option<Point> {
        Some(Point::new(self.longitude?, self.latitude?))
    }
}

/// Outcome of a composite query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// The reference city the radius is centered on
    pub reference: City,
    /// Matching cities, most populated first
    pub cities: Vec<City>,
    /// Radius actually applied
    pub radius_km: f64,
    /// Population floor actually applied, if any
    pub min_population: Option<f64>,
}

/// Counters from one indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub coordinates_indexed: usize,
    /// Coordinate records dropped for unparsable or out-of-range fields
    pub coordinates_skipped: usize,
    pub populations_indexed: usize,
    /// Population records dropped for unparsable fields
    pub populations_skipped: usize,
    /// Keys present in both datasets
    pub valid_cities: usize,
    pub prefix_members: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStats {
    /// Entries in the population index
    pub scored_cities: usize,
    /// Members of the prefix index, terminals included
    pub prefix_members: usize,
    pub store: StoreStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_from_fields() {
        let mut fields = HashFields::default();
        fields.insert(FIELD_LATITUDE.to_string(), "48.8566".to_string());
        fields.insert(FIELD_LONGITUDE.to_string(), "2.3522".to_string());
        fields.insert(FIELD_POPULATION.to_string(), "2000000".to_string());

        let city = City::from_fields("paris-75", &fields);
        assert_eq!(city.latitude, Some(48.8566));
        assert_eq!(city.population, Some(2_000_000.0));
        assert_eq!(city.point(), Some(Point::new(2.3522, 48.8566)));
    }

    #[test]
    fn test_city_from_empty_fields() {
        let city = City::from_fields("ghost-00", &HashFields::default());
        assert_eq!(city, City::new("ghost-00"));
        assert!(city.point().is_none());
    }

    #[test]
    fn test_city_serializes_to_json() {
        let city = City {
            key: "lyon-69".into(),
            latitude: Some(45.76),
            longitude: Some(4.83),
            population: None,
        };
        let json = serde_json::to_value(&city).unwrap();
        assert_eq!(json["key"], "lyon-69");
        assert!(json["population"].is_null());
    }
}
