//! Scored sorted set.
//!
//! Members are kept in ascending (score, member) order in a flat vector, so
//! rank lookups are a binary search and rank ranges are slices. Members with
//! equal scores are ordered byte-wise, which is what lets a set of
//! zero-scored strings act as a lexicographic index.

use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;

#[derive(Debug, Clone)]
struct ScoredMember {
    score: f64,
    member: String,
}

impl PartialEq for ScoredMember {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredMember {}

impl PartialOrd for ScoredMember {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredMember {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.member.cmp(&other.member))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SortedSet {
    scores: FxHashMap<String, f64>,
    ordered: Vec<ScoredMember>,
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or rescore members. Later duplicates in `items` win.
    ///
    /// Returns the number of members that were not present before.
    pub fn insert_many(&mut self, items: &[(f64, String)]) -> usize {
        let mut pending: FxHashMap<&str, f64> = FxHashMap::default();
        for (score, member) in items {
            pending.insert(member.as_str(), *score);
        }

        let mut added = 0;
        let mut rescored: FxHashSet<&str> = FxHashSet::default();
        let mut fresh = Vec::with_capacity(pending.len());

        for (member, score) in pending {
            match self.scores.insert(member.to_string(), score) {
                None => added += 1,
                Some(old) if old.total_cmp(&score).is_ne() => {
                    rescored.insert(member);
                }
                Some(_) => continue,
            }
            fresh.push(ScoredMember {
                score,
                member: member.to_string(),
            });
        }

        if !rescored.is_empty() {
            self.ordered
                .retain(|entry| !rescored.contains(entry.member.as_str()));
        }

        if !fresh.is_empty() {
            fresh.sort_unstable();
            self.ordered = merge_sorted(std::mem::take(&mut self.ordered), fresh);
        }

        added
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn score(&self, member: &str) -> Option<f64> {
        self.scores.get(member).copied()
    }

    pub fn contains(&self, member: &str) -> bool {
        self.scores.contains_key(member)
    }

    pub fn rank(&self, member: &str) -> Option<usize> {
        let score = self.score(member)?;
        self.ordered
            .binary_search_by(|entry| {
                entry
                    .score
                    .total_cmp(&score)
                    .then_with(|| entry.member.as_str().cmp(member))
            })
            .ok()
    }

    /// Members with ranks `start..=stop`, ascending.
    pub fn range(&self, start: usize, stop: usize) -> Vec<String> {
        self.rank_slice(start, stop)
            .iter()
            .map(|entry| entry.member.clone())
            .collect()
    }

    /// Members with ranks `start..=stop` counted from the highest score.
    pub fn rev_range(&self, start: usize, stop: usize) -> Vec<String> {
        let len = self.ordered.len();
        if start >= len || start > stop {
            return Vec::new();
        }
        let stop = stop.min(len - 1);
        self.ordered[len - 1 - stop..len - start]
            .iter()
            .rev()
            .map(|entry| entry.member.clone())
            .collect()
    }

    /// Members scored within `[min, max]`, ascending.
    pub fn range_by_score(&self, min: f64, max: f64) -> impl Iterator<Item = (f64, &str)> + '_ {
        let start = self
            .ordered
            .partition_point(|entry| entry.score.total_cmp(&min).is_lt());
        self.ordered[start..]
            .iter()
            .take_while(move |entry| entry.score.total_cmp(&max).is_le())
            .map(|entry| (entry.score, entry.member.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &str)> + '_ {
        self.ordered
            .iter()
            .map(|entry| (entry.score, entry.member.as_str()))
    }

    fn rank_slice(&self, start: usize, stop: usize) -> &[ScoredMember] {
        let len = self.ordered.len();
        if start >= len || start > stop {
            return &[];
        }
        &self.ordered[start..=stop.min(len - 1)]
    }
}

impl FromIterator<(f64, String)> for SortedSet {
    fn from_iter<I: IntoIterator<Item = (f64, String)>>(iter: I) -> Self {
        let items: Vec<(f64, String)> = iter.into_iter().collect();
        let mut set = SortedSet::new();
        set.insert_many(&items);
        set
    }
}

fn merge_sorted(existing: Vec<ScoredMember>, fresh: Vec<ScoredMember>) -> Vec<ScoredMember> {
    if existing.is_empty() {
        return fresh;
    }

    let mut merged = Vec::with_capacity(existing.len() + fresh.len());
    let mut left = existing.into_iter().peekable();
    let mut right = fresh.into_iter().peekable();

    while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
        if a <= b {
            merged.extend(left.next());
        } else {
            merged.extend(right.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(items: &[(f64, &str)]) -> SortedSet {
        items
            .iter()
            .map(|(score, member)| (*score, member.to_string()))
            .collect()
    }

    #[test]
    fn test_orders_by_score_then_member() {
        let set = set_of(&[(2.0, "b"), (1.0, "z"), (2.0, "a"), (0.5, "m")]);
        assert_eq!(set.range(0, 10), ["m", "z", "a", "b"]);
        assert_eq!(set.rev_range(0, 10), ["b", "a", "z", "m"]);
    }

    #[test]
    fn test_equal_scores_are_lexicographic() {
        let set = set_of(&[(0.0, "pa"), (0.0, "p"), (0.0, "paris-75*"), (0.0, "par")]);
        assert_eq!(set.range(0, 3), ["p", "pa", "par", "paris-75*"]);
        assert_eq!(set.rank("par"), Some(2));
        assert_eq!(set.rank("pau"), None);
    }

    #[test]
    fn test_insert_many_counts_new_members() {
        let mut set = SortedSet::new();
        assert_eq!(set.insert_many(&[(1.0, "a".into()), (2.0, "b".into())]), 2);
        assert_eq!(set.insert_many(&[(1.0, "a".into()), (3.0, "c".into())]), 1);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_rescore_moves_member() {
        let mut set = set_of(&[(1.0, "a"), (2.0, "b"), (3.0, "c")]);
        set.insert_many(&[(10.0, "a".into())]);

        assert_eq!(set.len(), 3);
        assert_eq!(set.score("a"), Some(10.0));
        assert_eq!(set.range(0, 2), ["b", "c", "a"]);
        assert_eq!(set.rank("a"), Some(2));
    }

    #[test]
    fn test_duplicate_in_batch_last_wins() {
        let set = set_of(&[(1.0, "a"), (5.0, "a")]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.score("a"), Some(5.0));
    }

    #[test]
    fn test_range_clamps() {
        let set = set_of(&[(1.0, "a"), (2.0, "b"), (3.0, "c")]);
        assert_eq!(set.range(1, 100), ["b", "c"]);
        assert!(set.range(3, 5).is_empty());
        assert!(set.range(2, 1).is_empty());
        assert_eq!(set.rev_range(1, 1), ["b"]);
        assert!(set.rev_range(5, 9).is_empty());
    }

    #[test]
    fn test_range_by_score_inclusive() {
        let set = set_of(&[(10.0, "a"), (20.0, "b"), (30.0, "c")]);
        let members: Vec<&str> = set.range_by_score(20.0, f64::INFINITY).map(|(_, m)| m).collect();
        assert_eq!(members, ["b", "c"]);

        let all = set.range_by_score(f64::NEG_INFINITY, f64::INFINITY).count();
        assert_eq!(all, 3);

        assert_eq!(set.range_by_score(31.0, f64::INFINITY).count(), 0);
    }

    #[test]
    fn test_merge_keeps_order_across_batches() {
        let mut set = SortedSet::new();
        set.insert_many(&[(0.0, "b".into()), (0.0, "d".into())]);
        set.insert_many(&[(0.0, "a".into()), (0.0, "c".into()), (0.0, "e".into())]);
        assert_eq!(set.range(0, 10), ["a", "b", "c", "d", "e"]);
    }
}
