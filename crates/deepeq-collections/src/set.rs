use deepeq_canonical::{Normalizer, Options, ResolvedOptions};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::comparable::Comparable;
use crate::errors::DeepEqualityError;
use crate::map::{self, DeepMap};

/// Insertion-ordered set whose elements are compared by structure.
///
/// Backed by a [`DeepMap`] with unit values, so the algebra reduces to key
/// membership.
pub struct DeepSet<T> {
    map: DeepMap<T, ()>,
}

impl<T> DeepSet<T> {
    /// Empty set with default options.
    pub fn new() -> Self {
        Self { map: DeepMap::new() }
    }

    /// Empty set with the given options.
    pub fn with_options(options: &Options) -> Self {
        Self {
            map: DeepMap::with_options(options),
        }
    }

    /// Empty set sharing an existing normalizer.
    pub fn with_normalizer(normalizer: Arc<Normalizer>) -> Self {
        Self {
            map: DeepMap::with_normalizer(normalizer),
        }
    }

    /// Number of distinct normalized elements.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when the set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Elements in first-seen order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.map.iter(),
        }
    }

    /// Calls `f` for every element in first-seen order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&T),
    {
        self.map.for_each(|value, _| f(value));
    }

    /// Resolved configuration of this set.
    pub fn options(&self) -> &ResolvedOptions {
        self.map.options()
    }

    /// True when a structurally equal element is present.
    pub fn has<Q>(&self, value: &Q) -> Result<bool, DeepEqualityError>
    where
        Q: Serialize + ?Sized,
    {
        self.map.contains_key(value)
    }

    /// Stored element structurally equal to `value`.
    pub fn get<Q>(&self, value: &Q) -> Result<Option<&T>, DeepEqualityError>
    where
        Q: Serialize + ?Sized,
    {
        Ok(self.map.get_key_value(value)?.map(|(stored, _)| stored))
    }

    /// Removes a structurally equal element; true when one was present.
    pub fn remove<Q>(&mut self, value: &Q) -> Result<bool, DeepEqualityError>
    where
        Q: Serialize + ?Sized,
    {
        Ok(self.take(value)?.is_some())
    }

    /// Removes and returns the stored element structurally equal to `value`.
    pub fn take<Q>(&mut self, value: &Q) -> Result<Option<T>, DeepEqualityError>
    where
        Q: Serialize + ?Sized,
    {
        Ok(self.map.remove_entry(value)?.map(|(stored, _)| stored))
    }
}

impl<T: Serialize> DeepSet<T> {
    /// Builds a set from `values`, keeping the first position of each
    /// distinct element.
    pub fn from_values<I>(values: I, options: &Options) -> Result<Self, DeepEqualityError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut set = Self::with_options(options);
        set.try_extend(values)?;
        Ok(set)
    }

    /// Adds every element, stopping at the first that cannot be lifted.
    pub fn try_extend<I>(&mut self, values: I) -> Result<(), DeepEqualityError>
    where
        I: IntoIterator<Item = T>,
    {
        self.map.try_extend(values.into_iter().map(|value| (value, ())))
    }

    /// Adds `value`; true when no equal element was present.
    ///
    /// An equal element already in the set is replaced by `value` in place.
    pub fn insert(&mut self, value: T) -> Result<bool, DeepEqualityError> {
        Ok(self.map.insert(value, ())?.is_none())
    }
}

impl<T: Clone> Comparable for DeepSet<T> {
    fn equals(&self, other: &Self) -> Result<bool, DeepEqualityError> {
        self.map.equals(&other.map)
    }

    fn contains(&self, other: &Self) -> Result<bool, DeepEqualityError> {
        self.map.contains(&other.map)
    }

    fn union(&self, other: &Self) -> Result<Self, DeepEqualityError> {
        Ok(Self {
            map: self.map.union(&other.map)?,
        })
    }

    fn intersection(&self, other: &Self) -> Result<Self, DeepEqualityError> {
        Ok(Self {
            map: self.map.intersection(&other.map)?,
        })
    }

    fn difference(&self, other: &Self) -> Result<Self, DeepEqualityError> {
        Ok(Self {
            map: self.map.difference(&other.map)?,
        })
    }
}

impl<T> Default for DeepSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for DeepSet<T> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for DeepSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Borrowing iterator over the elements of a [`DeepSet`].
pub struct Iter<'a, T> {
    inner: map::Iter<'a, T, ()>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(value, _)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Owning iterator over the elements of a [`DeepSet`].
pub struct IntoIter<T> {
    inner: map::IntoIter<T, ()>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(value, _)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> IntoIterator for DeepSet<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.map.into_iter(),
        }
    }
}

impl<'a, T> IntoIterator for &'a DeepSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
