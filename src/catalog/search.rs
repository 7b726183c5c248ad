//! Prefix search over the prefix index.
//!
//! Every prefix of every valid key is a member of one lexicographically
//! ordered set, so all members extending an input form a contiguous run that
//! starts at the input itself. The search looks up the input's rank, then
//! reads forward in fixed-size batches, collecting terminal members until the
//! first member that no longer extends the input.

use super::Catalog;
use crate::compute::prefix::strip_terminal;
use crate::error::Result;
use crate::store::OrderedIndexStore;
use crate::types::City;

impl<S: OrderedIndexStore> Catalog<S> {
    /// Cities whose key starts with `input`, in key order, hydrated.
    ///
    /// Inputs shorter than the configured minimum, inputs containing the
    /// terminal sigil, and inputs that are not a prefix of any valid key yield
    /// an empty list.
    pub fn search(&self, input: &str) -> Result<Vec<City>> {
        let keys = self.search_keys(input)?;
        self.hydrate(&keys)
    }

    /// Matching keys of [`Catalog::search`], without hydration.
    pub fn search_keys(&self, input: &str) -> Result<Vec<String>> {
        let sigil = self.config.terminal_sigil;
        if input.chars().count() < self.config.min_search_len || input.contains(sigil) {
            return Ok(Vec::new());
        }

        let index = &self.config.keys.cities;
        let Some(mut rank) = self.store.zrank(index, input)? else {
            return Ok(Vec::new());
        };

        let batch = self.config.scan_batch_size;
        let max = self.config.max_results;
        let mut matches = Vec::new();
        let mut round_trips = 0;

        loop {
            let members = self.store.zrange(index, rank, rank + batch - 1)?;
            round_trips += 1;

            let mut done = false;
            for member in &members {
                if !member.starts_with(input) {
                    done = true;
                    break;
                }
                if let Some(key) = strip_terminal(member, sigil) {
                    matches.push(key.to_string());
                    if matches.len() >= max {
                        done = true;
                        break;
                    }
                }
            }

            if done || members.len() < batch {
                break;
            }
            rank += batch;
        }

        log::debug!(
            "search {:?}: {} matches in {} scans",
            input,
            matches.len(),
            round_trips
        );
        Ok(matches)
    }
}
