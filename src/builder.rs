//! Catalog builder for flexible configuration
//!
//! Builds a [`Catalog`] over the in-memory store or a caller-provided one,
//! optionally indexing the two source datasets before handing it out.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::Result;
use crate::store::{MemoryStore, OrderedIndexStore};
use std::path::PathBuf;

/// Builder for catalogs with custom configuration and startup datasets.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    config: Config,
    datasets: Option<(PathBuf, PathBuf)>,
}

impl CatalogBuilder {
    /// Create a new builder with default configuration and no datasets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the catalog configuration (result cap, batch sizes, key names, etc.).
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Index the coordinate (JSON) and population (CSV) datasets on build.
    pub fn datasets<P: Into<PathBuf>, Q: Into<PathBuf>>(
        mut self,
        coordinates: P,
        populations: Q,
    ) -> Self {
        self.datasets = Some((coordinates.into(), populations.into()));
        self
    }

    /// Build a catalog over a fresh in-memory store.
    pub fn build(self) -> Result<Catalog<MemoryStore>> {
        self.build_with_store(MemoryStore::new())
    }

    /// Build a catalog over `store`. Validates the configuration and runs the
    /// indexing pipeline if datasets were given.
    pub fn build_with_store<S: OrderedIndexStore>(self, store: S) -> Result<Catalog<S>> {
        let catalog = Catalog::new(store, self.config)?;

        if let Some((coordinates, populations)) = self.datasets {
            let report = catalog.rebuild_from_paths(&coordinates, &populations)?;
            log::info!(
                "Loaded {} cities from {} and {}",
                report.valid_cities,
                coordinates.display(),
                populations.display()
            );
        }

        Ok(catalog)
    }
}
