//! In-memory mapping from cache key to stored result

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::key::CacheKey;
use crate::value::Value;

/// Mapping from [`CacheKey`] to the result stored for it
///
/// Serializes as a sequence of `(key, value)` pairs; on deserialization a
/// key that appears twice keeps its last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheTable {
    entries: HashMap<CacheKey, Value>,
}

impl CacheTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entry is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if `key` has a stored result
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Stored result for `key`, if any
    pub fn get(&self, key: &CacheKey) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Inserts or overwrites an entry, returning the previous value
    pub fn insert(&mut self, key: CacheKey, value: Value) -> Option<Value> {
        self.entries.insert(key, value)
    }

    /// Removes an entry, returning its value
    pub fn remove(&mut self, key: &CacheKey) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Drops every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Keys in arbitrary order
    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.entries.keys()
    }

    /// Entries in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&CacheKey, &Value)> {
        self.entries.iter()
    }
}

impl FromIterator<(CacheKey, Value)> for CacheTable {
    fn from_iter<I: IntoIterator<Item = (CacheKey, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for CacheTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter())
    }
}

impl<'de> Deserialize<'de> for CacheTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pairs = Vec::<(CacheKey, Value)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}
