//! In-memory ordered index store.

use super::{GeoSet, HashFields, OrderedIndexStore, SortedSet, StoreStats};
use crate::error::{CityIndexError, Result};
use geo::Point;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Value held at a store key
enum Entry {
    Hash(HashFields),
    Set(BTreeSet<String>),
    Sorted(SortedSet),
    Geo(GeoSet),
    Value(String),
}

impl Entry {
    fn kind(&self) -> &'static str {
        match self {
            Entry::Hash(_) => "hash",
            Entry::Set(_) => "set",
            Entry::Sorted(_) => "sorted set",
            Entry::Geo(_) => "geo set",
            Entry::Value(_) => "string",
        }
    }
}

/// Thread-safe in-memory store.
///
/// One `RwLock` guards the whole keyspace, so every trait method is atomic
/// with respect to the others. Readers proceed in parallel; the `*store`
/// operations and writes take the lock exclusively.
pub struct MemoryStore {
    entries: RwLock<FxHashMap<String, Entry>>,
    closed: AtomicBool,
    operations: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            closed: AtomicBool::new(false),
            operations: AtomicU64::new(0),
        }
    }

    fn begin(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CityIndexError::StoreClosed);
        }
        self.operations.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! entry_as {
    ($entries:expr, $key:expr, $variant:ident, $expected:literal) => {
        match $entries.get($key) {
            None => None,
            Some(Entry::$variant(value)) => Some(value),
            Some(_) => return Err(CityIndexError::wrong_type($key, $expected)),
        }
    };
}

macro_rules! entry_as_mut {
    ($entries:expr, $key:expr, $variant:ident, $expected:literal) => {
        match $entries
            .entry($key.to_string())
            .or_insert_with(|| Entry::$variant(Default::default()))
        {
            Entry::$variant(value) => value,
            _ => return Err(CityIndexError::wrong_type($key, $expected)),
        }
    };
}

/// Replace `dest` with `entry`, or drop it when the result is empty.
fn store_result(entries: &mut FxHashMap<String, Entry>, dest: &str, entry: Entry, len: usize) {
    if len == 0 {
        entries.remove(dest);
    } else {
        entries.insert(dest.to_string(), entry);
    }
}

/// Members and scores of a set usable as a weighted intersection input.
fn scored_members<'a>(
    entries: &'a FxHashMap<String, Entry>,
    key: &str,
) -> Result<Option<FxHashMap<&'a str, f64>>> {
    Ok(match entries.get(key) {
        None => None,
        Some(Entry::Sorted(set)) => Some(set.iter().map(|(score, m)| (m, score)).collect()),
        Some(Entry::Set(set)) => Some(set.iter().map(|m| (m.as_str(), 1.0)).collect()),
        Some(_) => return Err(CityIndexError::wrong_type(key, "set or sorted set")),
    })
}

impl OrderedIndexStore for MemoryStore {
    fn hset(&self, key: &str, fields: &[(&str, String)]) -> Result<usize> {
        self.begin()?;
        if fields.is_empty() {
            return Ok(0);
        }
        let mut entries = self.entries.write();
        let hash = entry_as_mut!(entries, key, Hash, "hash");

        let mut added = 0;
        for (field, value) in fields {
            if hash.insert(field.to_string(), value.clone()).is_none() {
                added += 1;
            }
        }
        Ok(added)
    }

    fn hgetall_batch(&self, keys: &[String]) -> Result<Vec<HashFields>> {
        self.begin()?;
        let entries = self.entries.read();
        keys.iter()
            .map(|key| Ok(entry_as!(entries, key, Hash, "hash").cloned().unwrap_or_default()))
            .collect()
    }

    fn zadd(&self, key: &str, members: &[(f64, String)]) -> Result<usize> {
        self.begin()?;
        if members.is_empty() {
            return Ok(0);
        }
        if let Some((_, member)) = members.iter().find(|(score, _)| score.is_nan()) {
            return Err(CityIndexError::InvalidInput(format!(
                "score for member '{}' is not a number",
                member
            )));
        }

        let mut entries = self.entries.write();
        let set = entry_as_mut!(entries, key, Sorted, "sorted set");
        Ok(set.insert_many(members))
    }

    fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        self.begin()?;
        let entries = self.entries.read();
        Ok(entry_as!(entries, key, Sorted, "sorted set").and_then(|set| set.score(member)))
    }

    fn zcard(&self, key: &str) -> Result<usize> {
        self.begin()?;
        let entries = self.entries.read();
        Ok(entry_as!(entries, key, Sorted, "sorted set").map_or(0, SortedSet::len))
    }

    fn zrank(&self, key: &str, member: &str) -> Result<Option<usize>> {
        self.begin()?;
        let entries = self.entries.read();
        Ok(entry_as!(entries, key, Sorted, "sorted set").and_then(|set| set.rank(member)))
    }

    fn zrange(&self, key: &str, start: usize, stop: usize) -> Result<Vec<String>> {
        self.begin()?;
        let entries = self.entries.read();
        Ok(entry_as!(entries, key, Sorted, "sorted set")
            .map(|set| set.range(start, stop))
            .unwrap_or_default())
    }

    fn zrevrange(&self, key: &str, start: usize, stop: usize) -> Result<Vec<String>> {
        self.begin()?;
        let entries = self.entries.read();
        Ok(entry_as!(entries, key, Sorted, "sorted set")
            .map(|set| set.rev_range(start, stop))
            .unwrap_or_default())
    }

    fn zrange_by_score_store(&self, dest: &str, src: &str, min: f64, max: f64) -> Result<usize> {
        self.begin()?;
        let mut entries = self.entries.write();
        let result: SortedSet = match entry_as!(entries, src, Sorted, "sorted set") {
            Some(set) => set
                .range_by_score(min, max)
                .map(|(score, member)| (score, member.to_string()))
                .collect(),
            None => SortedSet::new(),
        };

        let len = result.len();
        store_result(&mut entries, dest, Entry::Sorted(result), len);
        Ok(len)
    }

    fn zinterstore(&self, dest: &str, sources: &[(&str, f64)]) -> Result<usize> {
        self.begin()?;
        let mut entries = self.entries.write();

        let result: SortedSet = {
            let mut inputs = Vec::with_capacity(sources.len());
            let mut missing = false;
            for &(key, weight) in sources {
                match scored_members(&entries, key)? {
                    Some(members) => inputs.push((members, weight)),
                    None => {
                        missing = true;
                        break;
                    }
                }
            }

            // Drive the intersection from the smallest input.
            inputs.sort_by_key(|(members, _)| members.len());
            match inputs.split_first() {
                Some(((first, first_weight), rest)) if !missing => first
                    .iter()
                    .filter_map(|(member, score)| {
                        let mut total = score * first_weight;
                        for (members, weight) in rest {
                            total += members.get(member)? * weight;
                        }
                        // 0 * inf is NaN; a zero weight contributes nothing.
                        Some((if total.is_nan() { 0.0 } else { total }, member.to_string()))
                    })
                    .collect(),
                _ => SortedSet::new(),
            }
        };

        let len = result.len();
        store_result(&mut entries, dest, Entry::Sorted(result), len);
        Ok(len)
    }

    fn geoadd(&self, key: &str, points: &[(String, Point)]) -> Result<usize> {
        self.begin()?;
        if points.is_empty() {
            return Ok(0);
        }
        if let Some((member, _)) = points
            .iter()
            .find(|(_, p)| !(-180.0..=180.0).contains(&p.x()) || !(-90.0..=90.0).contains(&p.y()))
        {
            return Err(CityIndexError::InvalidInput(format!(
                "coordinates of member '{}' are out of range",
                member
            )));
        }

        let mut entries = self.entries.write();
        let set = entry_as_mut!(entries, key, Geo, "geo set");
        Ok(points
            .iter()
            .filter(|(member, point)| set.insert(member.clone(), *point))
            .count())
    }

    fn geopos(&self, key: &str, member: &str) -> Result<Option<Point>> {
        self.begin()?;
        let entries = self.entries.read();
        Ok(entry_as!(entries, key, Geo, "geo set").and_then(|set| set.position(member)))
    }

    fn geomembers(&self, key: &str) -> Result<Vec<String>> {
        self.begin()?;
        let entries = self.entries.read();
        Ok(entry_as!(entries, key, Geo, "geo set")
            .map(|set| set.members().map(str::to_string).collect())
            .unwrap_or_default())
    }

    fn geosearch_store(
        &self,
        dest: &str,
        src: &str,
        member: &str,
        radius_m: f64,
    ) -> Result<usize> {
        self.begin()?;
        let mut entries = self.entries.write();
        let center = entry_as!(entries, src, Geo, "geo set")
            .and_then(|set| set.position(member).map(|center| (set, center)));
        let Some((set, center)) = center else {
            return Err(CityIndexError::InvalidInput(format!(
                "member '{}' has no position in '{}'",
                member, src
            )));
        };

        let found: BTreeSet<String> = set.within_radius(center, radius_m).into_iter().collect();
        let len = found.len();
        store_result(&mut entries, dest, Entry::Set(found), len);
        Ok(len)
    }

    fn sadd(&self, key: &str, members: &[String]) -> Result<usize> {
        self.begin()?;
        if members.is_empty() {
            return Ok(0);
        }
        let mut entries = self.entries.write();
        let set = entry_as_mut!(entries, key, Set, "set");
        Ok(members
            .iter()
            .filter(|member| set.insert((*member).clone()))
            .count())
    }

    fn scard(&self, key: &str) -> Result<usize> {
        self.begin()?;
        let entries = self.entries.read();
        Ok(entry_as!(entries, key, Set, "set").map_or(0, BTreeSet::len))
    }

    fn sinterstore(&self, dest: &str, keys: &[&str]) -> Result<usize> {
        self.begin()?;
        let mut entries = self.entries.write();

        let result: BTreeSet<String> = {
            let mut inputs = Vec::with_capacity(keys.len());
            let mut missing = false;
            for &key in keys {
                match entry_as!(entries, key, Set, "set") {
                    Some(set) => inputs.push(set),
                    None => {
                        missing = true;
                        break;
                    }
                }
            }

            inputs.sort_by_key(|set| set.len());
            match inputs.split_first() {
                Some((first, rest)) if !missing => first
                    .iter()
                    .filter(|member| rest.iter().all(|set| set.contains(*member)))
                    .cloned()
                    .collect(),
                _ => BTreeSet::new(),
            }
        };

        let len = result.len();
        store_result(&mut entries, dest, Entry::Set(result), len);
        Ok(len)
    }

    fn sscan(&self, key: &str, cursor: u64, count: usize) -> Result<(Vec<String>, u64)> {
        self.begin()?;
        let entries = self.entries.read();
        let Some(set) = entry_as!(entries, key, Set, "set") else {
            return Ok((Vec::new(), 0));
        };

        let offset = usize::try_from(cursor).unwrap_or(usize::MAX);
        let count = count.max(1);
        let batch: Vec<String> = set.iter().skip(offset).take(count).cloned().collect();
        let next = offset.saturating_add(count);
        let next_cursor = if next >= set.len() { 0 } else { next as u64 };
        Ok((batch, next_cursor))
    }

    fn set_nx(&self, key: &str, value: &str) -> Result<bool> {
        self.begin()?;
        let mut entries = self.entries.write();
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), Entry::Value(value.to_string()));
        Ok(true)
    }

    fn del_if_equal(&self, key: &str, value: &str) -> Result<bool> {
        self.begin()?;
        let mut entries = self.entries.write();
        let held = match entries.get(key) {
            Some(Entry::Value(current)) => current == value,
            None => false,
            Some(_) => return Err(CityIndexError::wrong_type(key, "string")),
        };
        if held {
            entries.remove(key);
        }
        Ok(held)
    }

    fn del(&self, keys: &[&str]) -> Result<usize> {
        self.begin()?;
        let mut entries = self.entries.write();
        Ok(keys.iter().filter(|key| entries.remove(**key).is_some()).count())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        self.begin()?;
        Ok(self.entries.read().contains_key(key))
    }

    fn stats(&self) -> Result<StoreStats> {
        self.begin()?;
        let entries = self.entries.read();
        let mut stats = StoreStats {
            key_count: entries.len(),
            operations_count: self.operations.load(Ordering::Relaxed),
            ..StoreStats::default()
        };
        for entry in entries.values() {
            match entry {
                Entry::Hash(_) => stats.hash_count += 1,
                Entry::Set(_) => stats.set_count += 1,
                Entry::Sorted(_) => stats.sorted_set_count += 1,
                Entry::Geo(_) => stats.geo_set_count += 1,
                Entry::Value(_) => stats.value_count += 1,
            }
        }
        Ok(stats)
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        self.entries.write().clear();
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.read();
        let mut kinds: Vec<(&str, &str)> = entries
            .iter()
            .map(|(key, entry)| (key.as_str(), entry.kind()))
            .collect();
        kinds.sort_unstable();
        f.debug_struct("MemoryStore")
            .field("entries", &kinds)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_hash_roundtrip() {
        let store = MemoryStore::new();
        let added = store
            .hset("paris-75", &[("latitude", "48.85".into()), ("longitude", "2.35".into())])
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(store.hset("paris-75", &[("latitude", "48.86".into())]).unwrap(), 0);

        let hashes = store
            .hgetall_batch(&strings(&["paris-75", "missing"]))
            .unwrap();
        assert_eq!(hashes.len(), 2);
        assert_eq!(hashes[0]["latitude"], "48.86");
        assert!(hashes[1].is_empty());
    }

    #[test]
    fn test_wrong_type() {
        let store = MemoryStore::new();
        store.sadd("k", &strings(&["a"])).unwrap();

        let err = store.zadd("k", &[(1.0, "a".into())]).unwrap_err();
        assert!(matches!(err, CityIndexError::WrongType { .. }));
        assert!(store.zrank("k", "a").is_err());
        assert!(store.hgetall_batch(&strings(&["k"])).is_err());
    }

    #[test]
    fn test_zadd_rejects_nan() {
        let store = MemoryStore::new();
        assert!(store.zadd("z", &[(f64::NAN, "a".into())]).is_err());
        assert!(!store.exists("z").unwrap());
    }

    #[test]
    fn test_zrange_by_score_store() {
        let store = MemoryStore::new();
        store
            .zadd("pops", &[(10.0, "a".into()), (20.0, "b".into()), (30.0, "c".into())])
            .unwrap();

        assert_eq!(
            store
                .zrange_by_score_store("tmp", "pops", 20.0, f64::INFINITY)
                .unwrap(),
            2
        );
        assert_eq!(store.zrange("tmp", 0, 10).unwrap(), ["b", "c"]);
        assert_eq!(store.zscore("tmp", "c").unwrap(), Some(30.0));

        assert_eq!(
            store
                .zrange_by_score_store("tmp", "pops", 100.0, f64::INFINITY)
                .unwrap(),
            0
        );
        assert!(!store.exists("tmp").unwrap());
    }

    #[test]
    fn test_zinterstore_weights() {
        let store = MemoryStore::new();
        store.sadd("near", &strings(&["a", "b", "x"])).unwrap();
        store
            .zadd("pops", &[(10.0, "a".into()), (30.0, "b".into()), (20.0, "c".into())])
            .unwrap();

        let len = store
            .zinterstore("inter", &[("near", 0.0), ("pops", 1.0)])
            .unwrap();
        assert_eq!(len, 2);
        assert_eq!(store.zrevrange("inter", 0, 10).unwrap(), ["b", "a"]);
        assert_eq!(store.zscore("inter", "b").unwrap(), Some(30.0));

        store
            .zinterstore("sum", &[("near", 1.0), ("pops", 2.0)])
            .unwrap();
        assert_eq!(store.zscore("sum", "a").unwrap(), Some(21.0));
    }

    #[test]
    fn test_zinterstore_zero_weight_infinite_score() {
        let store = MemoryStore::new();
        store.zadd("a", &[(f64::INFINITY, "m".into())]).unwrap();
        store.zadd("b", &[(5.0, "m".into())]).unwrap();
        store.zinterstore("d", &[("a", 0.0), ("b", 1.0)]).unwrap();
        assert_eq!(store.zscore("d", "m").unwrap(), Some(5.0));
    }

    #[test]
    fn test_zinterstore_missing_source() {
        let store = MemoryStore::new();
        store.zadd("pops", &[(10.0, "a".into())]).unwrap();
        store.zadd("inter", &[(1.0, "old".into())]).unwrap();

        let len = store
            .zinterstore("inter", &[("absent", 0.0), ("pops", 1.0)])
            .unwrap();
        assert_eq!(len, 0);
        assert!(!store.exists("inter").unwrap());
    }

    #[test]
    fn test_geo_operations() {
        let store = MemoryStore::new();
        let added = store
            .geoadd(
                "coords",
                &[
                    ("paris-75".into(), Point::new(2.3522, 48.8566)),
                    ("boulogne-billancourt-92".into(), Point::new(2.2399, 48.8397)),
                    ("lyon-69".into(), Point::new(4.8357, 45.7640)),
                ],
            )
            .unwrap();
        assert_eq!(added, 3);
        assert_eq!(
            store.geopos("coords", "lyon-69").unwrap(),
            Some(Point::new(4.8357, 45.7640))
        );

        let len = store
            .geosearch_store("near", "coords", "paris-75", 15_000.0)
            .unwrap();
        assert_eq!(len, 2);
        assert_eq!(store.scard("near").unwrap(), 2);

        assert!(
            store
                .geosearch_store("near", "coords", "nowhere-00", 15_000.0)
                .is_err()
        );
    }

    #[test]
    fn test_geoadd_rejects_out_of_range() {
        let store = MemoryStore::new();
        assert!(
            store
                .geoadd("coords", &[("bad".into(), Point::new(200.0, 0.0))])
                .is_err()
        );
    }

    #[test]
    fn test_sets_and_scan() {
        let store = MemoryStore::new();
        store.sadd("a", &strings(&["1", "2", "3", "4", "5"])).unwrap();
        store.sadd("b", &strings(&["2", "4", "5", "6"])).unwrap();

        assert_eq!(store.sinterstore("ab", &["a", "b"]).unwrap(), 3);

        let mut cursor = 0;
        let mut seen = Vec::new();
        loop {
            let (batch, next) = store.sscan("ab", cursor, 2).unwrap();
            assert!(batch.len() <= 2);
            seen.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        assert_eq!(seen, ["2", "4", "5"]);

        let (batch, next) = store.sscan("missing", 0, 10).unwrap();
        assert!(batch.is_empty());
        assert_eq!(next, 0);
    }

    #[test]
    fn test_del_and_stats() {
        let store = MemoryStore::new();
        store.sadd("s", &strings(&["a"])).unwrap();
        store.zadd("z", &[(1.0, "a".into())]).unwrap();
        store.hset("h", &[("f", "v".into())]).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.key_count, 3);
        assert_eq!(stats.set_count, 1);
        assert_eq!(stats.sorted_set_count, 1);
        assert_eq!(stats.hash_count, 1);

        assert_eq!(store.del(&["s", "z", "nope"]).unwrap(), 2);
        assert!(!store.exists("s").unwrap());
    }

    #[test]
    fn test_set_nx_and_conditional_delete() {
        let store = MemoryStore::new();
        assert!(store.set_nx("lock", "token-a").unwrap());
        assert!(!store.set_nx("lock", "token-b").unwrap());

        assert!(!store.del_if_equal("lock", "token-b").unwrap());
        assert!(store.exists("lock").unwrap());
        assert!(store.del_if_equal("lock", "token-a").unwrap());
        assert!(!store.exists("lock").unwrap());
        assert!(!store.del_if_equal("lock", "token-a").unwrap());

        store.sadd("s", &strings(&["a"])).unwrap();
        assert!(!store.set_nx("s", "x").unwrap());
        assert!(store.del_if_equal("s", "a").is_err());
        assert_eq!(store.stats().unwrap().value_count, 0);
    }

    #[test]
    fn test_geomembers() {
        let store = MemoryStore::new();
        assert!(store.geomembers("coords").unwrap().is_empty());
        store
            .geoadd(
                "coords",
                &[
                    ("a".into(), Point::new(2.0, 48.0)),
                    ("b".into(), Point::new(3.0, 45.0)),
                ],
            )
            .unwrap();
        let mut members = store.geomembers("coords").unwrap();
        members.sort();
        assert_eq!(members, ["a", "b"]);
    }

    #[test]
    fn test_closed_store_rejects_operations() {
        let store = MemoryStore::new();
        store.sadd("s", &strings(&["a"])).unwrap();
        store.close().unwrap();

        assert!(matches!(
            store.scard("s").unwrap_err(),
            CityIndexError::StoreClosed
        ));
    }
}
