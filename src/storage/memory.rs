//! Direct in-memory engine
//!
//! A single map behind a parking_lot RwLock, which never poisons on panic.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::StorageEngine;

/// Map-backed engine; reads share the lock, writes are exclusive
pub struct InMemoryEngine {
    storage: RwLock<HashMap<String, String>>,
}

impl InMemoryEngine {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }
}

impl StorageEngine for InMemoryEngine {
    fn set(&self, key: &str, value: &str) {
        self.storage.write().insert(key.to_string(), value.to_string());
    }

    fn get(&self, key: &str) -> String {
        self.storage.read().get(key).cloned().unwrap_or_default()
    }

    fn del(&self, key: &str) {
        self.storage.write().remove(key);
    }
}
