use deepeq_canonical::{Normalized, Normalizer, Options, ResolvedOptions, Structure};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::comparable::Comparable;
use crate::errors::DeepEqualityError;
use crate::map::{DeepMap, Iter};

/// [`DeepMap`] with a reverse index from values to keys.
///
/// Pairs are one-to-one: no two keys may hold structurally equal values.
/// A write that would break this fails with
/// [`DeepEqualityError::UniquenessConflict`] and leaves the map untouched.
pub struct BiDirectionalDeepMap<K, V> {
    map: DeepMap<K, V>,
    keys_by_value: HashMap<Normalized, Normalized>,
    values_by_key: HashMap<Normalized, Normalized>,
}

impl<K, V> BiDirectionalDeepMap<K, V> {
    /// Empty map with default options.
    pub fn new() -> Self {
        Self::from_parts(DeepMap::new())
    }

    /// Empty map with the given options.
    pub fn with_options(options: &Options) -> Self {
        Self::from_parts(DeepMap::with_options(options))
    }

    /// Empty map sharing an existing normalizer.
    pub fn with_normalizer(normalizer: Arc<Normalizer>) -> Self {
        Self::from_parts(DeepMap::with_normalizer(normalizer))
    }

    fn from_parts(map: DeepMap<K, V>) -> Self {
        Self {
            map,
            keys_by_value: HashMap::new(),
            values_by_key: HashMap::new(),
        }
    }

    /// Forward view of the pairs.
    pub fn as_map(&self) -> &DeepMap<K, V> {
        &self.map
    }

    /// Drops the reverse index.
    pub fn into_map(self) -> DeepMap<K, V> {
        self.map
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when the map holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Removes every pair from both directions.
    pub fn clear(&mut self) {
        self.keys_by_value.clear();
        self.values_by_key.clear();
        self.map.clear();
    }

    /// Pairs in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.map.iter()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.map.keys()
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.map.values()
    }

    /// Calls `f` for every pair in insertion order.
    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&K, &V),
    {
        self.map.for_each(f);
    }

    /// Resolved configuration of this map.
    pub fn options(&self) -> &ResolvedOptions {
        self.map.options()
    }

    /// Value stored under a key structurally equal to `key`.
    pub fn get<Q>(&self, key: &Q) -> Result<Option<&V>, DeepEqualityError>
    where
        Q: Serialize + ?Sized,
    {
        self.map.get(key)
    }

    /// True when a structurally equal key is present.
    pub fn contains_key<Q>(&self, key: &Q) -> Result<bool, DeepEqualityError>
    where
        Q: Serialize + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// True when a structurally equal value is present.
    pub fn contains_value<Q>(&self, value: &Q) -> Result<bool, DeepEqualityError>
    where
        Q: Serialize + ?Sized,
    {
        let value_id = self.map.normalizer().normalize_value(value)?;
        Ok(self.keys_by_value.contains_key(&value_id))
    }

    /// Key bound to a value structurally equal to `value`.
    pub fn get_key_by_value<Q>(&self, value: &Q) -> Result<Option<&K>, DeepEqualityError>
    where
        Q: Serialize + ?Sized,
    {
        let value_id = self.map.normalizer().normalize_value(value)?;
        Ok(self
            .keys_by_value
            .get(&value_id)
            .and_then(|key_id| self.map.get_normalized(key_id))
            .map(|(key, _)| key))
    }

    /// Removes the pair for `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<Option<V>, DeepEqualityError>
    where
        Q: Serialize + ?Sized,
    {
        let key_id = self.map.normalizer().normalize_key(key)?;
        Ok(self.remove_by_key_id(&key_id).map(|(_, value)| value))
    }

    /// Removes the pair whose value is structurally equal to `value`.
    pub fn remove_by_value<Q>(&mut self, value: &Q) -> Result<Option<(K, V)>, DeepEqualityError>
    where
        Q: Serialize + ?Sized,
    {
        let value_id = self.map.normalizer().normalize_value(value)?;
        let Some(key_id) = self.keys_by_value.get(&value_id).cloned() else {
            return Ok(None);
        };
        Ok(self.remove_by_key_id(&key_id))
    }

    fn remove_by_key_id(&mut self, key_id: &Normalized) -> Option<(K, V)> {
        if let Some(value_id) = self.values_by_key.remove(key_id) {
            self.keys_by_value.remove(&value_id);
        }
        self.map.remove_normalized(key_id)
    }
}

impl<K: Serialize, V: Serialize> BiDirectionalDeepMap<K, V> {
    /// Builds a map from `entries`, failing on the first value already bound
    /// to a different key.
    pub fn from_entries<I>(entries: I, options: &Options) -> Result<Self, DeepEqualityError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::with_options(options);
        for (key, value) in entries {
            map.insert(key, value)?;
        }
        Ok(map)
    }

    /// Indexes an existing map, failing if two of its keys hold equal values.
    pub fn from_map(map: DeepMap<K, V>) -> Result<Self, DeepEqualityError> {
        let mut indexed = Self::with_normalizer(Arc::clone(map.normalizer()));
        for (key_id, key, value) in map.into_normalized() {
            let value_id = indexed.map.normalizer().normalize_value(&value)?;
            indexed.check_unique(&key_id, &value_id, &key, &value)?;
            indexed.bind(key_id, value_id, key, value);
        }
        Ok(indexed)
    }

    /// Inserts or overwrites a pair, returning the previous value.
    ///
    /// Re-binding a key to the value it already holds is not a conflict.
    /// Overwriting a key with a new value releases the old value.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, DeepEqualityError> {
        let normalizer = self.map.normalizer();
        let key_id = normalizer.normalize_key(&key)?;
        let value_id = normalizer.normalize_value(&value)?;
        self.check_unique(&key_id, &value_id, &key, &value)?;
        Ok(self.bind(key_id, value_id, key, value))
    }

    fn check_unique(
        &self,
        key_id: &Normalized,
        value_id: &Normalized,
        key: &K,
        value: &V,
    ) -> Result<(), DeepEqualityError> {
        let Some(existing_id) = self.keys_by_value.get(value_id) else {
            return Ok(());
        };
        if existing_id == key_id {
            return Ok(());
        }
        let existing_key = match self.map.get_normalized(existing_id) {
            Some((existing, _)) => render(existing)?,
            None => existing_id.to_string(),
        };
        let error = DeepEqualityError::UniquenessConflict {
            key: render(key)?,
            value: render(value)?,
            existing_key,
        };
        debug!(%error, "uniqueness conflict");
        Err(error)
    }

    fn bind(&mut self, key_id: Normalized, value_id: Normalized, key: K, value: V) -> Option<V> {
        if let Some(stale) = self.values_by_key.insert(key_id.clone(), value_id.clone()) {
            self.keys_by_value.remove(&stale);
        }
        self.keys_by_value.insert(value_id, key_id.clone());
        self.map
            .insert_normalized(key_id, key, value)
            .map(|(_, previous)| previous)
    }
}

fn render<T: Serialize + ?Sized>(value: &T) -> Result<String, DeepEqualityError> {
    Ok(Structure::from_serialize(value)?.render())
}

/// Pairs match on key and value, as for [`DeepMap`]. A union that would bind
/// one value to two keys fails with a uniqueness conflict.
impl<K, V> Comparable for BiDirectionalDeepMap<K, V>
where
    K: Serialize + Clone,
    V: Serialize + Clone,
{
    fn equals(&self, other: &Self) -> Result<bool, DeepEqualityError> {
        self.map.equals(&other.map)
    }

    fn contains(&self, other: &Self) -> Result<bool, DeepEqualityError> {
        self.map.contains(&other.map)
    }

    fn union(&self, other: &Self) -> Result<Self, DeepEqualityError> {
        Self::from_map(self.map.union(&other.map)?)
    }

    fn intersection(&self, other: &Self) -> Result<Self, DeepEqualityError> {
        Self::from_map(self.map.intersection(&other.map)?)
    }

    fn difference(&self, other: &Self) -> Result<Self, DeepEqualityError> {
        Self::from_map(self.map.difference(&other.map)?)
    }
}

impl<K, V> Default for BiDirectionalDeepMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for BiDirectionalDeepMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
            keys_by_value: self.keys_by_value.clone(),
            values_by_key: self.values_by_key.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BiDirectionalDeepMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.map, f)
    }
}

impl<K, V> IntoIterator for BiDirectionalDeepMap<K, V> {
    type Item = (K, V);
    type IntoIter = crate::map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.into_iter()
    }
}

impl<'a, K, V> IntoIterator for &'a BiDirectionalDeepMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failed_insert_leaves_both_directions_untouched() {
        let mut map = BiDirectionalDeepMap::new();
        map.insert("k1", json!({"v": 1})).unwrap();
        let err = map.insert("k2", json!({"v": 1})).unwrap_err();
        assert!(matches!(err, DeepEqualityError::UniquenessConflict { .. }));
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key("k2").unwrap());
        assert_eq!(map.get_key_by_value(&json!({"v": 1})).unwrap(), Some(&"k1"));
    }

    #[test]
    fn overwrite_releases_the_old_value() {
        let mut map = BiDirectionalDeepMap::new();
        map.insert(1, "a").unwrap();
        assert_eq!(map.insert(1, "b").unwrap(), Some("a"));
        assert!(!map.contains_value("a").unwrap());
        map.insert(2, "a").unwrap();
        assert_eq!(map.get_key_by_value("a").unwrap(), Some(&2));
        assert_eq!(map.get_key_by_value("b").unwrap(), Some(&1));
    }

    #[test]
    fn clear_empties_both_directions() {
        let mut map = BiDirectionalDeepMap::new();
        map.insert(1, 10).unwrap();
        map.clear();
        assert!(map.is_empty());
        assert!(!map.contains_value(&10).unwrap());
        map.insert(2, 10).unwrap();
        assert_eq!(map.get_key_by_value(&10).unwrap(), Some(&2));
    }
}
