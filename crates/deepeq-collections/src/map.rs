use deepeq_canonical::{Normalized, Normalizer, Options, ResolvedOptions};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

use crate::comparable::{ensure_same_options, Comparable};
use crate::errors::DeepEqualityError;

/// Insertion-ordered map whose keys are compared by structure.
///
/// Keys and values are stored as given; lookups go through their
/// [`Normalized`] identity, so `get(&json!({"a": 1}))` finds an entry
/// inserted under any structurally equal key. Overwriting a key keeps its
/// original position.
///
/// Iteration borrows the map, so it cannot be mutated mid-traversal.
pub struct DeepMap<K, V> {
    normalizer: Arc<Normalizer>,
    entries: IndexMap<Normalized, (K, V)>,
}

impl<K, V> DeepMap<K, V> {
    /// Empty map with default options.
    pub fn new() -> Self {
        Self::with_normalizer(Arc::new(Normalizer::default()))
    }

    /// Empty map with the given options.
    pub fn with_options(options: &Options) -> Self {
        Self::with_normalizer(Arc::new(Normalizer::new(options)))
    }

    /// Empty map sharing an existing normalizer.
    pub fn with_normalizer(normalizer: Arc<Normalizer>) -> Self {
        Self {
            normalizer,
            entries: IndexMap::new(),
        }
    }

    /// Number of distinct normalized keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries in insertion order, as originally supplied.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.entries.values(),
        }
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Calls `f` for every entry in insertion order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for (key, value) in self.iter() {
            f(key, value);
        }
    }

    /// Normalizer shared by this map and every map derived from it.
    pub fn normalizer(&self) -> &Arc<Normalizer> {
        &self.normalizer
    }

    /// Resolved configuration of this map.
    pub fn options(&self) -> &ResolvedOptions {
        self.normalizer.options()
    }

    pub(crate) fn get_normalized(&self, id: &Normalized) -> Option<&(K, V)> {
        self.entries.get(id)
    }

    pub(crate) fn insert_normalized(&mut self, id: Normalized, key: K, value: V) -> Option<(K, V)> {
        self.entries.insert(id, (key, value))
    }

    pub(crate) fn remove_normalized(&mut self, id: &Normalized) -> Option<(K, V)> {
        self.entries.shift_remove(id)
    }

    pub(crate) fn iter_normalized(&self) -> impl Iterator<Item = (&Normalized, &K, &V)> + '_ {
        self.entries
            .iter()
            .map(|(id, (key, value))| (id, key, value))
    }

    pub(crate) fn into_normalized(self) -> impl Iterator<Item = (Normalized, K, V)> {
        self.entries
            .into_iter()
            .map(|(id, (key, value))| (id, key, value))
    }
}

impl<K: Serialize, V> DeepMap<K, V> {
    /// Builds a map from `entries`; later duplicates overwrite earlier ones
    /// in place.
    pub fn from_entries<I>(entries: I, options: &Options) -> Result<Self, DeepEqualityError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::with_options(options);
        map.try_extend(entries)?;
        Ok(map)
    }

    /// Inserts every entry, stopping at the first key that cannot be lifted.
    pub fn try_extend<I>(&mut self, entries: I) -> Result<(), DeepEqualityError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            if self.insert_entry(key, value)?.is_some() {
                trace!(len = self.len(), "collapsed duplicate key");
            }
        }
        Ok(())
    }

    /// Inserts or overwrites an entry, returning the previous value.
    ///
    /// The stored key is replaced by `key` as well; the entry keeps its
    /// original position.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, DeepEqualityError> {
        Ok(self.insert_entry(key, value)?.map(|(_, previous)| previous))
    }

    fn insert_entry(&mut self, key: K, value: V) -> Result<Option<(K, V)>, DeepEqualityError> {
        let id = self.normalizer.normalize_key(&key)?;
        Ok(self.insert_normalized(id, key, value))
    }
}

impl<K, V> DeepMap<K, V> {
    /// Value stored under a key structurally equal to `key`.
    pub fn get<Q>(&self, key: &Q) -> Result<Option<&V>, DeepEqualityError>
    where
        Q: Serialize + ?Sized,
    {
        Ok(self.get_key_value(key)?.map(|(_, value)| value))
    }

    /// Stored key and value for a key structurally equal to `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Result<Option<(&K, &V)>, DeepEqualityError>
    where
        Q: Serialize + ?Sized,
    {
        let id = self.normalizer.normalize_key(key)?;
        Ok(self.get_normalized(&id).map(|(k, v)| (k, v)))
    }

    /// True when a structurally equal key is present.
    pub fn contains_key<Q>(&self, key: &Q) -> Result<bool, DeepEqualityError>
    where
        Q: Serialize + ?Sized,
    {
        let id = self.normalizer.normalize_key(key)?;
        Ok(self.entries.contains_key(&id))
    }

    /// Removes the entry for `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<Option<V>, DeepEqualityError>
    where
        Q: Serialize + ?Sized,
    {
        Ok(self.remove_entry(key)?.map(|(_, value)| value))
    }

    /// Removes the entry for `key`, returning the stored key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Result<Option<(K, V)>, DeepEqualityError>
    where
        Q: Serialize + ?Sized,
    {
        let id = self.normalizer.normalize_key(key)?;
        Ok(self.remove_normalized(&id))
    }
}

impl<K, V: Serialize> DeepMap<K, V> {
    fn pair_present_in(
        &self,
        id: &Normalized,
        value: &V,
        other: &DeepMap<K, V>,
    ) -> Result<bool, DeepEqualityError> {
        match other.get_normalized(id) {
            Some((_, found)) => Ok(self.normalizer.normalize_value(found)?
                == self.normalizer.normalize_value(value)?),
            None => Ok(false),
        }
    }

    fn filtered(&self, other: &Self, keep_present: bool) -> Result<Self, DeepEqualityError>
    where
        K: Clone,
        V: Clone,
    {
        ensure_same_options(&self.normalizer, &other.normalizer)?;
        let mut derived = Self::with_normalizer(Arc::clone(&self.normalizer));
        for (id, key, value) in self.iter_normalized() {
            if self.pair_present_in(id, value, other)? == keep_present {
                derived.insert_normalized(id.clone(), key.clone(), value.clone());
            }
        }
        Ok(derived)
    }
}

/// Entries match on key and value: an entry of `other` counts as present in
/// `self` only when `self` stores a structurally equal value under that key.
impl<K: Clone, V: Serialize + Clone> Comparable for DeepMap<K, V> {
    fn equals(&self, other: &Self) -> Result<bool, DeepEqualityError> {
        ensure_same_options(&self.normalizer, &other.normalizer)?;
        Ok(self.len() == other.len() && self.contains(other)?)
    }

    fn contains(&self, other: &Self) -> Result<bool, DeepEqualityError> {
        ensure_same_options(&self.normalizer, &other.normalizer)?;
        for (id, _, value) in other.iter_normalized() {
            if !self.pair_present_in(id, value, self)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn union(&self, other: &Self) -> Result<Self, DeepEqualityError> {
        ensure_same_options(&self.normalizer, &other.normalizer)?;
        let mut merged = Self::with_normalizer(Arc::clone(&self.normalizer));
        for (id, key, value) in other.iter_normalized().chain(self.iter_normalized()) {
            merged.insert_normalized(id.clone(), key.clone(), value.clone());
        }
        Ok(merged)
    }

    fn intersection(&self, other: &Self) -> Result<Self, DeepEqualityError> {
        self.filtered(other, true)
    }

    fn difference(&self, other: &Self) -> Result<Self, DeepEqualityError> {
        self.filtered(other, false)
    }
}

impl<K, V> Default for DeepMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for DeepMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            normalizer: Arc::clone(&self.normalizer),
            entries: self.entries.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for DeepMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Borrowing iterator over the entries of a [`DeepMap`].
pub struct Iter<'a, K, V> {
    inner: indexmap::map::Values<'a, Normalized, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, value)| (key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Owning iterator over the entries of a [`DeepMap`].
pub struct IntoIter<K, V> {
    inner: indexmap::map::IntoValues<Normalized, (K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> IntoIterator for DeepMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.entries.into_values(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a DeepMap<K, V> {
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
    fn structurally_equal_keys_share_an_entry() {
        let mut map = DeepMap::new();
        map.insert(json!({"a": 1, "b": 2}), "first").unwrap();
        assert_eq!(map.insert(json!({"b": 2, "a": 1}), "second").unwrap(), Some("first"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&json!({"a": 1, "b": 2})).unwrap(), Some(&"second"));
        assert!(map.contains_key(&json!({"b": 2, "a": 1})).unwrap());
    }

    #[test]
    fn overwrite_keeps_position_and_remove_shifts() {
        let mut map = DeepMap::new();
        map.insert(1, "a").unwrap();
        map.insert(2, "b").unwrap();
        map.insert(3, "c").unwrap();
        map.insert(1, "z").unwrap();
        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec!["z", "b", "c"]);

        assert_eq!(map.remove(&2).unwrap(), Some("b"));
        assert_eq!(map.remove(&2).unwrap(), None);
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn iteration_reflects_current_state() {
        let mut map = DeepMap::new();
        map.insert("x", 1).unwrap();
        assert_eq!(map.iter().count(), 1);
        map.insert("y", 2).unwrap();
        assert_eq!(map.iter().count(), 2);
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.iter().count(), 0);
    }

    #[test]
    fn derived_maps_share_the_normalizer() {
        let map = DeepMap::from_entries([(1, 1)], &Options::new().with_case_insensitive(true))
            .unwrap();
        let derived = map.union(&map.clone()).unwrap();
        assert!(Arc::ptr_eq(map.normalizer(), derived.normalizer()));
        assert!(derived.options().case_insensitive);
    }
}
