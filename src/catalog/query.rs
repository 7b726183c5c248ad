//! Composite ranked query.
//!
//! A query combines two filters that the store can evaluate on its own:
//!
//! 1. **Radius**: every city within the radius of the reference city's point
//!    is staged into a plain scratch set.
//! 2. **Population floor**: every city scored at or above the floor is staged
//!    into a scored scratch set.
//! 3. **Weighted intersection**: the two sets are intersected with weights
//!    0 and 1, so the result is scored by population alone.
//!
//! The top of the intersection, read in descending score order, is the
//! answer. The reference city itself is dropped from it.

use super::Catalog;
use super::scratch::ScratchKeys;
use crate::error::{CityIndexError, Result};
use crate::store::OrderedIndexStore;
use crate::types::QueryResult;

/// Parse a textual radius in kilometers. Absent, unparsable, negative or
/// non-finite values fall back to `default_km`.
pub fn parse_radius_km(raw: Option<&str>, default_km: f64) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|r| r.is_finite() && *r >= 0.0)
        .unwrap_or(default_km)
}

/// Parse a textual population floor. Absent or unparsable values mean no floor.
pub fn parse_min_population(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|p| !p.is_nan())
}

impl<S: OrderedIndexStore> Catalog<S> {
    /// Cities within `radius_km` of `reference` with a population of at least
    /// `min_population`, most populated first, hydrated.
    ///
    /// Fails with [`CityIndexError::CityNotFound`] when `reference` has no
    /// point in the spatial index.
    pub fn query(
        &self,
        reference: &str,
        radius_km: f64,
        min_population: Option<f64>,
    ) -> Result<QueryResult> {
        let keys = self.query_keys(reference, radius_km, min_population)?;
        let cities = self.hydrate(&keys)?;
        let reference = self.city(reference)?;

        Ok(QueryResult {
            reference,
            cities,
            radius_km,
            min_population,
        })
    }

    /// [`Catalog::query`] with textual request parameters.
    pub fn query_raw(
        &self,
        reference: &str,
        radius: Option<&str>,
        min_population: Option<&str>,
    ) -> Result<QueryResult> {
        let radius_km = parse_radius_km(radius, self.config.default_radius_km);
        self.query(reference, radius_km, parse_min_population(min_population))
    }

    /// Ranked keys of [`Catalog::query`], without hydration.
    pub fn query_keys(
        &self,
        reference: &str,
        radius_km: f64,
        min_population: Option<f64>,
    ) -> Result<Vec<String>> {
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(CityIndexError::InvalidInput(format!(
                "radius must be a non-negative number of kilometers, got {}",
                radius_km
            )));
        }
        if min_population.is_some_and(f64::is_nan) {
            return Err(CityIndexError::InvalidInput(
                "population floor is not a number".to_string(),
            ));
        }

        let keys = &self.config.keys;
        if self.store.geopos(&keys.coords, reference)?.is_none() {
            return Err(CityIndexError::CityNotFound(reference.to_string()));
        }

        let mut scratch = ScratchKeys::new(self.store.as_ref(), &keys.scratch);
        let near = scratch.key("coords");
        let floor = scratch.key("pops");
        let ranked = scratch.key("zinter");

        let within = self
            .store
            .geosearch_store(&near, &keys.coords, reference, radius_km * 1000.0)?;
        let above = self.store.zrange_by_score_store(
            &floor,
            &keys.pops,
            min_population.unwrap_or(f64::NEG_INFINITY),
            f64::INFINITY,
        )?;
        let matched = self
            .store
            .zinterstore(&ranked, &[(near.as_str(), 0.0), (floor.as_str(), 1.0)])?;

        // One extra slot so dropping the reference still leaves a full page.
        let max = self.config.max_results;
        let mut result: Vec<String> = self
            .store
            .zrevrange(&ranked, 0, max)?
            .into_iter()
            .filter(|key| key != reference)
            .collect();
        result.truncate(max);

        log::debug!(
            "query {} r={}km floor={:?}: {} near, {} above floor, {} matched, {} returned",
            reference,
            radius_km,
            min_population,
            within,
            above,
            matched,
            result.len()
        );

        Ok(result)
    }
}
