//! Hydration of bare city keys into [`City`] records.
//!
//! Attributes live in one hash per key; a whole result list is resolved with a
//! single batched lookup.

use super::Catalog;
use crate::error::Result;
use crate::store::OrderedIndexStore;
use crate::types::City;

impl<S: OrderedIndexStore> Catalog<S> {
    /// Resolve keys into cities with one batched hash lookup.
    ///
    /// Order follows `keys`. A key without a hash yields a city with no
    /// attributes rather than an error.
    pub fn hydrate(&self, keys: &[String]) -> Result<Vec<City>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let hashes = self.store.hgetall_batch(keys)?;
        Ok(keys
            .iter()
            .zip(hashes.iter())
            .map(|(key, fields)| City::from_fields(key.as_str(), fields))
            .collect())
    }

    /// Hydrate a single key.
    pub fn city(&self, key: &str) -> Result<City> {
        let mut cities = self.hydrate(&[key.to_string()])?;
        Ok(cities.pop().unwrap_or_else(|| City::new(key)))
    }
}
