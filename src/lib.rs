//! City catalog with prefix autocomplete and ranked radius queries, built on
//! an ordered index store.
//!
//! ```rust
//! use cityindex::{Catalog, RawCoordinate, RawPopulation};
//!
//! let catalog = Catalog::memory();
//! catalog.rebuild(
//!     &[
//!         RawCoordinate {
//!             name: "paris".into(),
//!             region: "75".into(),
//!             latitude: "48.8566".into(),
//!             longitude: "2.3522".into(),
//!         },
//!         RawCoordinate {
//!             name: "boulogne billancourt".into(),
//!             region: "92".into(),
//!             latitude: "48.8397".into(),
//!             longitude: "2.2399".into(),
//!         },
//!     ],
//!     &[
//!         RawPopulation {
//!             name: "Paris".into(),
//!             region: "75".into(),
//!             population: "2000000".into(),
//!         },
//!         RawPopulation {
//!             name: "Boulogne-Billancourt".into(),
//!             region: "92".into(),
//!             population: "120000".into(),
//!         },
//!     ],
//! )?;
//!
//! let nearby = catalog.query("paris-75", 15.0, Some(50_000.0))?;
//! assert_eq!(nearby.cities[0].key, "boulogne-billancourt-92");
//!
//! let matches = catalog.search_keys("par")?;
//! assert_eq!(matches, ["paris-75"]);
//! # Ok::<(), cityindex::CityIndexError>(())
//! ```

pub mod builder;
pub mod catalog;
pub mod compute;
pub mod config;
pub mod dataset;
pub mod error;
pub mod store;
pub mod types;

pub use builder::CatalogBuilder;
pub use catalog::{Catalog, parse_min_population, parse_radius_km};
pub use config::{Config, IndexKeys};
pub use error::{CityIndexError, Result};

pub use geo::Point;

pub use dataset::{RawCoordinate, RawPopulation};

pub use store::{MemoryStore, OrderedIndexStore, StoreStats};

pub use types::{CatalogStats, City, IndexReport, QueryResult};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Catalog, CatalogBuilder, CityIndexError, Result};

    pub use crate::{City, IndexReport, QueryResult};

    pub use crate::{Config, IndexKeys};

    pub use crate::{MemoryStore, OrderedIndexStore};

    pub use crate::{RawCoordinate, RawPopulation};

    pub use geo::Point;
}
