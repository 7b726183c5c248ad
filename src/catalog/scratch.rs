//! Request-scoped scratch keys.
//!
//! Intermediate results of a query (radius matches, population matches, their
//! intersection) are staged in store keys named after a fresh UUID, so
//! concurrent requests never share them. The keys are deleted when the guard
//! drops, including on early return.

use crate::store::OrderedIndexStore;
use uuid::Uuid;

pub(crate) struct ScratchKeys<'a, S: OrderedIndexStore + ?Sized> {
    store: &'a S,
    prefix: String,
    issued: Vec<String>,
}

impl<'a, S: OrderedIndexStore + ?Sized> ScratchKeys<'a, S> {
    pub(crate) fn new(store: &'a S, namespace: &str) -> Self {
        Self {
            store,
            prefix: format!("{}:{}", namespace, Uuid::new_v4().simple()),
            issued: Vec::new(),
        }
    }

    /// Name a scratch key owned by this guard.
    pub(crate) fn key(&mut self, name: &str) -> String {
        let key = format!("{}:{}", self.prefix, name);
        self.issued.push(key.clone());
        key
    }
}

impl<S: OrderedIndexStore + ?Sized> Drop for ScratchKeys<'_, S> {
    fn drop(&mut self) {
        if self.issued.is_empty() {
            return;
        }
        let keys: Vec<&str> = self.issued.iter().map(String::as_str).collect();
        if let Err(e) = self.store.del(&keys) {
            log::warn!("Failed to delete scratch keys under {}: {}", self.prefix, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_scratch_keys_are_unique() {
        let store = MemoryStore::new();
        let mut a = ScratchKeys::new(&store, "tmp");
        let mut b = ScratchKeys::new(&store, "tmp");
        let (ka, kb) = (a.key("coords"), b.key("coords"));

        assert_ne!(ka, kb);
        assert!(ka.starts_with("tmp:"));
        assert!(ka.ends_with(":coords"));
    }

    #[test]
    fn test_scratch_keys_deleted_on_drop() {
        let store = MemoryStore::new();
        let key = {
            let mut scratch = ScratchKeys::new(&store, "tmp");
            let key = scratch.key("near");
            store.sadd(&key, &["a".to_string()]).unwrap();
            assert!(store.exists(&key).unwrap());
            key
        };
        assert!(!store.exists(&key).unwrap());
    }
}
