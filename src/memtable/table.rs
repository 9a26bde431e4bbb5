//! MemTable implementation
//!
//! HashMap-based memtable with RwLock for concurrency.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use crate::value::Value;

/// In-memory key-value map
#[derive(Debug, Default)]
pub struct MemTable {
    data: RwLock<HashMap<String, Value>>,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &str) -> Option<Value> {
        self.data.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Put a key-value pair (write lock), returning the previous value
    pub fn put(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.data.write().insert(key.into(), value)
    }

    /// Remove a key (write lock), returning the removed value.
    ///
    /// Removing an absent key is a no-op.
    pub fn delete(&self, key: &str) -> Option<Value> {
        self.data.write().remove(key)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy of the contents, ordered by key
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Discard the current contents and take over those of `other`
    pub fn replace_with(&self, other: MemTable) {
        *self.data.write() = other.data.into_inner();
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.data.write().clear();
    }
}
