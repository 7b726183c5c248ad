//! Ordered index store abstraction.
//!
//! The catalog never owns its data structures directly. It issues operations
//! against an [`OrderedIndexStore`]: per-key hashes, scored sorted sets,
//! geospatial sets and plain sets, plus the set algebra that combines them.
//! The trait mirrors the command surface of an ordered-set key/value server so
//! that an in-process store ([`MemoryStore`]) and a networked one are
//! interchangeable.
//!
//! All methods take `&self`: implementations handle their own locking, and
//! concurrent requests share one store.

use crate::error::Result;
use geo::Point;
use rustc_hash::FxHashMap;

mod geo_set;
mod memory;
mod sorted_set;

pub use geo_set::GeoSet;
pub use memory::MemoryStore;
pub use sorted_set::SortedSet;

/// Field/value pairs of a per-key hash.
pub type HashFields = FxHashMap<String, String>;

/// Trait for ordered index store implementations
///
/// Writes with no members or fields are no-ops and never create a key.
pub trait OrderedIndexStore: Send + Sync {
    /// Set fields on the hash stored at `key`. Returns the number of fields
    /// that did not exist before.
    fn hset(&self, key: &str, fields: &[(&str, String)]) -> Result<usize>;

    /// Fetch every field of each hash in one round-trip. Missing keys yield
    /// an empty map at their position.
    fn hgetall_batch(&self, keys: &[String]) -> Result<Vec<HashFields>>;

    /// Add members with scores, overwriting the score of existing members.
    /// Returns the number of new members.
    fn zadd(&self, key: &str, members: &[(f64, String)]) -> Result<usize>;

    fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>>;

    fn zcard(&self, key: &str) -> Result<usize>;

    /// Zero-based rank of `member` in ascending (score, member) order.
    fn zrank(&self, key: &str, member: &str) -> Result<Option<usize>>;

    /// Members with ranks `start..=stop` in ascending order.
    fn zrange(&self, key: &str, start: usize, stop: usize) -> Result<Vec<String>>;

    /// Members with ranks `start..=stop` in descending order.
    fn zrevrange(&self, key: &str, start: usize, stop: usize) -> Result<Vec<String>>;

    /// Store the members of `src` scored within `[min, max]` into `dest`,
    /// keeping their scores. Returns the size of `dest`.
    fn zrange_by_score_store(&self, dest: &str, src: &str, min: f64, max: f64) -> Result<usize>;

    /// Store the intersection of `sources` into `dest`. Each member's score is
    /// the sum of its score in every source multiplied by that source's
    /// weight; plain-set members score 1. Returns the size of `dest`.
    fn zinterstore(&self, dest: &str, sources: &[(&str, f64)]) -> Result<usize>;

    /// Add or move points. Returns the number of new members.
    fn geoadd(&self, key: &str, points: &[(String, Point)]) -> Result<usize>;

    fn geopos(&self, key: &str, member: &str) -> Result<Option<Point>>;

    /// Every member of a geo set, in no particular order.
    fn geomembers(&self, key: &str) -> Result<Vec<String>>;

    /// Store into `dest` (as a plain set) every member of `src` lying within
    /// `radius_m` meters of `member`'s stored point, boundary included.
    /// Returns the size of `dest`.
    fn geosearch_store(&self, dest: &str, src: &str, member: &str, radius_m: f64)
    -> Result<usize>;

    /// Add members to a plain set. Returns the number of new members.
    fn sadd(&self, key: &str, members: &[String]) -> Result<usize>;

    fn scard(&self, key: &str) -> Result<usize>;

    /// Store the intersection of the plain sets at `keys` into `dest`.
    fn sinterstore(&self, dest: &str, keys: &[&str]) -> Result<usize>;

    /// Enumerate a plain set in batches of about `count` members. Start with
    /// cursor 0; a returned cursor of 0 means the scan is complete.
    fn sscan(&self, key: &str, cursor: u64, count: usize) -> Result<(Vec<String>, u64)>;

    /// Store `value` at `key` only if `key` does not exist. Returns whether
    /// it was stored.
    fn set_nx(&self, key: &str, value: &str) -> Result<bool>;

    /// Remove `key` only if it holds the plain value `value`. Returns whether
    /// it was removed.
    fn del_if_equal(&self, key: &str, value: &str) -> Result<bool>;

    /// Remove keys of any type. Returns how many existed.
    fn del(&self, keys: &[&str]) -> Result<usize>;

    fn exists(&self, key: &str) -> Result<bool>;

    fn stats(&self) -> Result<StoreStats>;

    /// Close the store. Every later operation fails.
    fn close(&self) -> Result<()>;
}

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Total number of keys
    pub key_count: usize,
    pub hash_count: usize,
    pub sorted_set_count: usize,
    pub geo_set_count: usize,
    pub set_count: usize,
    pub value_count: usize,
    /// Number of operations performed
    pub operations_count: u64,
}
