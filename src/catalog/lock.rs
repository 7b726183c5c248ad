//! Store-held rebuild lock.
//!
//! The lock is a plain value written with set-if-absent under the scratch
//! namespace, so every catalog over the same store contends for the same key
//! no matter how it was constructed. The value is a per-acquisition token;
//! release only removes the key while it still holds that token.

use crate::error::{CityIndexError, Result};
use crate::store::OrderedIndexStore;
use uuid::Uuid;

pub(crate) struct RebuildLock<'a, S: OrderedIndexStore + ?Sized> {
    store: &'a S,
    key: String,
    token: String,
}

impl<'a, S: OrderedIndexStore + ?Sized> RebuildLock<'a, S> {
    /// Take the lock at `key`, or fail with `RebuildInProgress` if another
    /// writer holds it.
    pub(crate) fn acquire(store: &'a S, key: String) -> Result<Self> {
        let token = Uuid::new_v4().simple().to_string();
        if !store.set_nx(&key, &token)? {
            return Err(CityIndexError::RebuildInProgress);
        }
        Ok(Self { store, key, token })
    }
}

impl<S: OrderedIndexStore + ?Sized> Drop for RebuildLock<'_, S> {
    fn drop(&mut self) {
        match self.store.del_if_equal(&self.key, &self.token) {
            Ok(true) => {}
            Ok(false) => log::warn!("Rebuild lock {} was released by someone else", self.key),
            Err(e) => log::warn!("Failed to release rebuild lock {}: {}", self.key, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_lock_is_exclusive() {
        let store = MemoryStore::new();
        let held = RebuildLock::acquire(&store, "tmp:rebuild".to_string()).unwrap();

        let err = RebuildLock::acquire(&store, "tmp:rebuild".to_string())
            .err()
            .unwrap();
        assert!(matches!(err, CityIndexError::RebuildInProgress));

        drop(held);
        assert!(!store.exists("tmp:rebuild").unwrap());
        assert!(RebuildLock::acquire(&store, "tmp:rebuild".to_string()).is_ok());
    }
}
