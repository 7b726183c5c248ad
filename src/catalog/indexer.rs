//! Indexing pipeline.
//!
//! A rebuild runs these phases in order, each against the store:
//!
//! 1. Wipe the attribute hashes of every key in the previous spatial and
//!    population indexes, then the indexes themselves and any leftover
//!    temporary sets, so keys that dropped out of the datasets leave no
//!    orphaned attributes or prefixes behind.
//! 2. Index coordinates: per-key hash fields, the geo set, and a temporary
//!    "has coordinates" set.
//! 3. Index populations: per-key hash field, the scored set, and a temporary
//!    "has population" set.
//! 4. Intersect the two temporary sets into the validity set.
//! 5. Scan the validity set in batches and add every prefix and terminal
//!    member of each key to the prefix index.
//! 6. Drop the temporary sets.
//!
//! Malformed records are skipped and counted. A record whose key would
//! contain the terminal sigil counts as malformed. Any store error aborts the run;
//! rerunning it is safe since phase 1 starts from a clean slate.

use super::Catalog;
use super::lock::RebuildLock;
use crate::compute::key::derive_key;
use crate::compute::normalize::{normalize_geo_name, normalize_population_name};
use crate::compute::prefix::prefix_members;
use crate::dataset::{self, RawCoordinate, RawPopulation};
use crate::error::Result;
use crate::store::OrderedIndexStore;
use crate::types::{FIELD_LATITUDE, FIELD_LONGITUDE, FIELD_POPULATION, IndexReport};
use geo::Point;
use std::path::Path;

/// Parse a coordinate record into its key and point.
fn parse_coordinate(record: &RawCoordinate, sigil: char) -> Option<(String, Point)> {
    let latitude = record.latitude.trim().parse::<f64>().ok()?;
    let longitude = record.longitude.trim().parse::<f64>().ok()?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }

    let name = normalize_geo_name(&record.name);
    if name.is_empty() || record.region.is_empty() {
        return None;
    }
    let key = derive_key(&name, &record.region);
    if key.contains(sigil) {
        return None;
    }
    Some((key, Point::new(longitude, latitude)))
}

/// Parse a population record into its key and population.
fn parse_population(record: &RawPopulation, sigil: char) -> Option<(String, f64)> {
    let population = record.population.trim().parse::<f64>().ok()?;
    if !population.is_finite() || population < 0.0 {
        return None;
    }
    // "-0" would sort below a floor of 0
    let population = if population == 0.0 { 0.0 } else { population };

    let name = normalize_population_name(&record.name);
    if name.is_empty() || record.region.is_empty() {
        return None;
    }
    let key = derive_key(&name, &record.region);
    if key.contains(sigil) {
        return None;
    }
    Some((key, population))
}

impl<S: OrderedIndexStore> Catalog<S> {
    /// Rebuild every index from the two raw datasets.
    ///
    /// Only one rebuild may run at a time per store; a concurrent call, from
    /// this catalog or any other over the same store, fails with
    /// [`CityIndexError::RebuildInProgress`].
    ///
    /// [`CityIndexError::RebuildInProgress`]: crate::error::CityIndexError::RebuildInProgress
    pub fn rebuild(
        &self,
        coordinates: &[RawCoordinate],
        populations: &[RawPopulation],
    ) -> Result<IndexReport> {
        let keys = &self.config.keys;
        let _lock = RebuildLock::acquire(self.store.as_ref(), keys.scratch_key("rebuild-lock"))?;

        let has_coords = keys.scratch_key("coords-set");
        let has_pops = keys.scratch_key("pops-set");
        let valid = keys.scratch_key("cities");

        let stale = self.wipe_attributes()?;
        let wiped = self.store.del(&[
            keys.coords.as_str(),
            &keys.pops,
            &keys.cities,
            &has_coords,
            &has_pops,
            &valid,
        ])?;
        log::debug!(
            "Cleared {} attribute hashes and {} index keys before rebuild",
            stale,
            wiped
        );

        let mut report = IndexReport::default();
        self.index_coordinates(coordinates, &has_coords, &mut report)?;
        self.index_populations(populations, &has_pops, &mut report)?;

        report.valid_cities = self.store.sinterstore(&valid, &[&has_coords, &has_pops])?;
        report.prefix_members = self.index_prefixes(&valid)?;

        self.store
            .del(&[has_coords.as_str(), &has_pops, &valid])?;

        log::info!(
            "Indexed {} valid cities ({} coordinates, {} skipped; {} populations, {} skipped; {} prefix members)",
            report.valid_cities,
            report.coordinates_indexed,
            report.coordinates_skipped,
            report.populations_indexed,
            report.populations_skipped,
            report.prefix_members
        );
        Ok(report)
    }

    /// Load both datasets from disk and rebuild.
    pub fn rebuild_from_paths<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        coordinates_path: P,
        populations_path: Q,
    ) -> Result<IndexReport> {
        let coordinates = dataset::load_coordinates(coordinates_path)?;
        let populations = dataset::load_populations(populations_path)?;
        self.rebuild(&coordinates, &populations)
    }

    /// Delete the hashes of every key in the current spatial and population
    /// indexes. Returns how many existed.
    fn wipe_attributes(&self) -> Result<usize> {
        let keys = &self.config.keys;
        let mut stale = self.store.geomembers(&keys.coords)?;
        stale.extend(self.store.zrange(&keys.pops, 0, usize::MAX)?);
        stale.sort_unstable();
        stale.dedup();

        let mut removed = 0;
        for chunk in stale.chunks(self.config.index_batch_size) {
            let batch: Vec<&str> = chunk.iter().map(String::as_str).collect();
            removed += self.store.del(&batch)?;
        }
        Ok(removed)
    }

    fn index_coordinates(
        &self,
        records: &[RawCoordinate],
        has_coords: &str,
        report: &mut IndexReport,
    ) -> Result<()> {
        let mut points = Vec::with_capacity(records.len());
        for record in records {
            let Some((key, point)) = parse_coordinate(record, self.config.terminal_sigil) else {
                log::trace!("Skipping coordinate record {:?}", record);
                report.coordinates_skipped += 1;
                continue;
            };

            self.store.hset(
                &key,
                &[
                    (FIELD_LATITUDE, point.y().to_string()),
                    (FIELD_LONGITUDE, point.x().to_string()),
                ],
            )?;
            points.push((key, point));
        }
        report.coordinates_indexed = points.len();

        let members: Vec<String> = points.iter().map(|(key, _)| key.clone()).collect();
        self.store.sadd(has_coords, &members)?;
        self.store.geoadd(&self.config.keys.coords, &points)?;
        Ok(())
    }

    fn index_populations(
        &self,
        records: &[RawPopulation],
        has_pops: &str,
        report: &mut IndexReport,
    ) -> Result<()> {
        let mut scores = Vec::with_capacity(records.len());
        for record in records {
            let Some((key, population)) = parse_population(record, self.config.terminal_sigil)
            else {
                log::trace!("Skipping population record {:?}", record);
                report.populations_skipped += 1;
                continue;
            };

            self.store
                .hset(&key, &[(FIELD_POPULATION, population.to_string())])?;
            scores.push((population, key));
        }
        report.populations_indexed = scores.len();

        let members: Vec<String> = scores.iter().map(|(_, key)| key.clone()).collect();
        self.store.sadd(has_pops, &members)?;
        self.store.zadd(&self.config.keys.pops, &scores)?;
        Ok(())
    }

    fn index_prefixes(&self, valid: &str) -> Result<usize> {
        let index = &self.config.keys.cities;
        let sigil = self.config.terminal_sigil;
        let mut cursor = 0;

        loop {
            let (keys, next) = self
                .store
                .sscan(valid, cursor, self.config.index_batch_size)?;

            let members: Vec<(f64, String)> = keys
                .iter()
                .flat_map(|key| prefix_members(key, sigil))
                .map(|member| (0.0, member))
                .collect();
            if !members.is_empty() {
                self.store.zadd(index, &members)?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        self.store.zcard(index)
    }
}
