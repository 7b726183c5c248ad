//! Pure computations over source names and keys.
//!
//! Nothing here touches the store:
//! - Name normalization for each source dataset
//! - City key derivation
//! - Prefix index member derivation

pub mod key;
pub mod normalize;
pub mod prefix;

pub use key::derive_key;
pub use normalize::{normalize_geo_name, normalize_population_name};
pub use prefix::{prefix_members, strip_terminal, terminal_member};
