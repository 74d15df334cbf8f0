use std::{collections::HashMap, sync::RwLock};

use crate::{
    store::{incremented, KeyValueStore, StoreError},
    value::Value,
};

/// A store that keeps its values in process memory.
///
/// Nothing survives the process; intended for tests and for hosts that persist state elsewhere.
pub struct MemoryStore {
    namespace: String,
    values: RwLock<HashMap<String, Value>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl MemoryStore {
    /// Creates an empty store for the given namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        MemoryStore {
            namespace: namespace.into(),
            values: RwLock::new(HashMap::new()),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .values
            .read()
            .expect("RwLock should not be poisoned")
            .get(key)
            .copied())
    }

    fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values
            .write()
            .expect("RwLock should not be poisoned")
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values
            .write()
            .expect("RwLock should not be poisoned")
            .remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .values
            .read()
            .expect("RwLock should not be poisoned")
            .keys()
            .cloned()
            .collect())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.values
            .write()
            .expect("RwLock should not be poisoned")
            .clear();
        Ok(())
    }

    fn increment_int(&self, key: &str) -> Result<i32, StoreError> {
        let mut values = self.values.write().expect("RwLock should not be poisoned");
        let count = incremented(&self.namespace, key, values.get(key).copied());
        values.insert(key.to_string(), Value::Int(count));
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let store = MemoryStore::new("test");

        assert_eq!(store.get("a").unwrap(), None);

        store.put_int("a", 5).unwrap();
        store.put_bool("b", true).unwrap();
        assert_eq!(store.get_int("a").unwrap(), Some(5));
        assert_eq!(store.get_bool("b").unwrap(), Some(true));

        store.remove("a").unwrap();
        assert_eq!(store.get_int("a").unwrap(), None);
        assert_eq!(store.keys().unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn test_type_mismatch_reads_as_absent() {
        let store = MemoryStore::new("test");
        store.put_bool("count", true).unwrap();

        assert_eq!(store.get_int("count").unwrap(), None);
        assert_eq!(store.get_long("count").unwrap(), None);
        assert_eq!(store.get_bool("count").unwrap(), Some(true));
    }

    #[test]
    fn test_increment_int_is_atomic_across_handles() {
        let store = std::sync::Arc::new(MemoryStore::new("test"));

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let store = store.clone();
                scope.spawn(move || {
                    for _ in 0..1000 {
                        store.increment_int("count").unwrap();
                    }
                });
            }
        });

        assert_eq!(store.get_int("count").unwrap(), Some(4000));
    }

    #[test]
    fn test_clear() {
        let store = MemoryStore::new("test");
        store.put_long("a", 1).unwrap();
        store.put_long("b", 2).unwrap();

        store.clear().unwrap();

        assert!(store.keys().unwrap().is_empty());
        assert_eq!(store.get_long("a").unwrap(), None);
    }
}
