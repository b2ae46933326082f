//! String-keyed map type for dict values and object fields.
//!
//! [`Dict`] wraps an [`IndexMap`] so that iteration follows insertion order,
//! which keeps `Debug` output and field access predictable. Iteration order is
//! never what reaches the wire: both encoders go through
//! [`Dict::canonical_entries`], which normalizes and sorts the keys.
//!
//! ## Examples
//!
//! ```rust
//! use serde_ots::{Dict, Value};
//!
//! let mut map = Dict::new();
//! map.insert("name".to_string(), Value::from("Alice"));
//! map.insert("age".to_string(), Value::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, HashMap};
use unicode_normalization::UnicodeNormalization;

use crate::{Error, Result, Value};

/// A map of string keys to values.
///
/// Equality ignores insertion order, so two dicts holding the same entries
/// compare equal however they were built.
///
/// # Examples
///
/// ```rust
/// use serde_ots::{Dict, Value};
///
/// let mut map = Dict::new();
/// map.insert("first".to_string(), Value::from(1));
/// map.insert("second".to_string(), Value::from(2));
///
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dict(IndexMap<String, Value>);

impl Dict {
    /// Creates an empty `Dict`.
    #[must_use]
    pub fn new() -> Self {
        Dict(IndexMap::new())
    }

    /// Creates an empty `Dict` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Dict(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the old value is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_ots::{Dict, Value};
    ///
    /// let mut map = Dict::new();
    /// assert!(map.insert("key".to_string(), Value::from(42)).is_none());
    /// assert!(map.insert("key".to_string(), Value::from(43)).is_some());
    /// ```
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// Removes a key from the map, returning its value if it was present.
    ///
    /// Remaining entries keep their relative order.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Returns `true` if the map contains the key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of elements in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, Value> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Returns the entries in wire order: keys NFC-normalized and sorted.
    ///
    /// Fails if a key is empty, contains U+0000, or collides with another key
    /// once normalized.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_ots::{Dict, Value};
    ///
    /// let mut map = Dict::new();
    /// map.insert("b".to_string(), Value::from(2));
    /// map.insert("a".to_string(), Value::from(1));
    ///
    /// let entries = map.canonical_entries().unwrap();
    /// assert_eq!(entries[0].0, "a");
    /// assert_eq!(entries[1].0, "b");
    /// ```
    pub fn canonical_entries(&self) -> Result<Vec<(String, &Value)>> {
        let mut entries = Vec::with_capacity(self.0.len());
        for (key, value) in &self.0 {
            entries.push((normalize_key(key)?, value));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(Error::invalid_key(
                &pair[0].0,
                "collides with another key after NFC normalization",
            ));
        }
        Ok(entries)
    }
}

fn normalize_key(key: &str) -> Result<String> {
    if key.is_empty() {
        return Err(Error::invalid_key(key, "keys must not be empty"));
    }
    if key.contains('\0') {
        return Err(Error::invalid_key(key, "keys must not contain U+0000"));
    }
    Ok(key.nfc().collect())
}

impl From<HashMap<String, Value>> for Dict {
    fn from(map: HashMap<String, Value>) -> Self {
        Dict(map.into_iter().collect())
    }
}

impl From<BTreeMap<String, Value>> for Dict {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Dict(map.into_iter().collect())
    }
}

impl From<Dict> for HashMap<String, Value> {
    fn from(map: Dict) -> Self {
        map.0.into_iter().collect()
    }
}

impl IntoIterator for Dict {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Dict {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for Dict {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Dict(IndexMap::from_iter(iter))
    }
}

impl Serialize for Dict {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_order() {
        let a: Dict = vec![
            ("x".to_string(), Value::from(1)),
            ("y".to_string(), Value::from(2)),
        ]
        .into_iter()
        .collect();
        let b: Dict = vec![
            ("y".to_string(), Value::from(2)),
            ("x".to_string(), Value::from(1)),
        ]
        .into_iter()
        .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_canonical_entries_sorted() {
        let mut map = Dict::new();
        map.insert("zeta".to_string(), Value::Null);
        map.insert("Alpha".to_string(), Value::Null);
        map.insert("alpha".to_string(), Value::Null);

        let keys: Vec<_> = map
            .canonical_entries()
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["Alpha", "alpha", "zeta"]);
    }

    #[test]
    fn test_canonical_entries_rejects_empty_key() {
        let mut map = Dict::new();
        map.insert(String::new(), Value::Null);
        assert!(matches!(
            map.canonical_entries(),
            Err(Error::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_canonical_entries_rejects_normalization_collision() {
        let mut map = Dict::new();
        // "é" precomposed and decomposed
        map.insert("\u{e9}".to_string(), Value::from(1));
        map.insert("e\u{301}".to_string(), Value::from(2));
        assert!(matches!(
            map.canonical_entries(),
            Err(Error::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut map = Dict::new();
        map.insert("a".to_string(), Value::from(1));
        map.insert("b".to_string(), Value::from(2));
        map.insert("c".to_string(), Value::from(3));
        assert_eq!(map.remove("b"), Some(Value::from(2)));

        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }
}
