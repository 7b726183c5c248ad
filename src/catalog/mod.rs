//! City catalog: indexing pipeline and query engines.
//!
//! A [`Catalog`] wraps an [`OrderedIndexStore`] and decides which store
//! operations to issue, over which keys and in which order:
//!
//! - [`Catalog::rebuild`] populates the spatial, population and prefix indexes
//!   from the two raw datasets.
//! - [`Catalog::query`] lists cities around a reference city above a
//!   population floor, most populated first.
//! - [`Catalog::search`] lists cities whose key starts with a typed prefix.
//! - [`Catalog::hydrate`] attaches display attributes to bare keys.
//!
//! Catalogs are cheap to clone and share their store, so one catalog can
//! serve many request threads. The rebuild lock lives in the store itself:
//! only one rebuild runs at a time per store, across clones and across
//! catalogs built separately over a shared store.

use crate::config::Config;
use crate::error::{CityIndexError, Result};
use crate::store::{MemoryStore, OrderedIndexStore};
use crate::types::CatalogStats;
use std::sync::Arc;

mod hydrate;
mod indexer;
mod lock;
mod query;
mod scratch;
mod search;

pub use query::{parse_min_population, parse_radius_km};

pub struct Catalog<S: OrderedIndexStore = MemoryStore> {
    store: Arc<S>,
    config: Arc<Config>,
}

impl<S: OrderedIndexStore> Clone for Catalog<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl Catalog<MemoryStore> {
    /// Catalog over a fresh in-memory store with default configuration.
    pub fn memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            config: Arc::new(Config::default()),
        }
    }

    pub fn builder() -> crate::builder::CatalogBuilder {
        crate::builder::CatalogBuilder::new()
    }
}

impl<S: OrderedIndexStore> Catalog<S> {
    pub fn new(store: S, config: Config) -> Result<Self> {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Catalog over a store that other components also hold.
    ///
    /// Catalogs over one store that agree on the scratch namespace share its
    /// rebuild lock.
    pub fn with_shared_store(store: Arc<S>, config: Config) -> Result<Self> {
        config.validate().map_err(CityIndexError::InvalidConfig)?;
        Ok(Self {
            store,
            config: Arc::new(config),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> Result<CatalogStats> {
        let keys = &self.config.keys;
        Ok(CatalogStats {
            scored_cities: self.store.zcard(&keys.pops)?,
            prefix_members: self.store.zcard(&keys.cities)?,
            store: self.store.stats()?,
        })
    }
}

impl<S: OrderedIndexStore> std::fmt::Debug for Catalog<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
