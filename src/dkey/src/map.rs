//! Mapping wrapper that warns when deprecated keys are touched.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::descriptor::KeyDeprecation;
use crate::sink::{GlobalSink, WarningSink};
use crate::{DkeyError, Result};

/// A key-value mapping with deprecation notices for selected keys.
///
/// Behaves like an insertion-ordered map. Touching a key registered through a
/// [`KeyDeprecation`] emits its notice on the sink first:
///
/// - reads ([`get_item`](Self::get_item), [`get`](Self::get),
///   [`contains_key`](Self::contains_key), iteration) warn every time;
/// - writes and removals ([`set_item`](Self::set_item), [`pop`](Self::pop),
///   [`delete_item`](Self::delete_item), [`pop_item`](Self::pop_item)) warn
///   once and unregister the key;
/// - bulk views ([`keys`](Self::keys), [`values`](Self::values),
///   [`items`](Self::items), [`len`](Self::len)) warn once per registered key.
///
/// A rename copies the value of the new key under the old key at
/// construction. The two entries are independent afterwards.
pub struct DeprecatedKeys<K, V> {
    entries: IndexMap<K, V>,
    deprecations: IndexMap<K, Arc<KeyDeprecation<K>>>,
    sink: Arc<dyn WarningSink>,
}

impl<K, V> DeprecatedKeys<K, V>
where
    K: Eq + Hash + Clone + fmt::Display,
{
    /// Wrap `base`, emitting into the process-wide sink.
    pub fn new<B, D>(base: B, deprecations: D) -> Result<Self>
    where
        B: IntoIterator<Item = (K, V)>,
        D: IntoIterator<Item = KeyDeprecation<K>>,
        V: Clone,
    {
        Self::with_sink(base, deprecations, Arc::new(GlobalSink))
    }

    /// Wrap `base`, emitting into `sink`.
    ///
    /// Every descriptor's new key must be present in `base` (for removals
    /// that is the deprecated key itself), otherwise this fails with
    /// [`DkeyError::InvalidReplacement`] and nothing is built. Old keys of
    /// renames are placed right before their new key.
    pub fn with_sink<B, D>(base: B, deprecations: D, sink: Arc<dyn WarningSink>) -> Result<Self>
    where
        B: IntoIterator<Item = (K, V)>,
        D: IntoIterator<Item = KeyDeprecation<K>>,
        V: Clone,
    {
        let base: IndexMap<K, V> = base.into_iter().collect();
        let deprecations: Vec<KeyDeprecation<K>> = deprecations.into_iter().collect();

        if let Some(missing) = deprecations
            .iter()
            .find(|deprecation| !base.contains_key(deprecation.new_key()))
        {
            return Err(DkeyError::InvalidReplacement {
                old_key: missing.old_key().to_string(),
                new_key: missing.new_key().to_string(),
            });
        }

        let entries = {
            let mut renamed_from: HashMap<&K, Vec<&K>> = HashMap::new();
            for deprecation in deprecations.iter().filter(|d| d.is_rename()) {
                renamed_from
                    .entry(deprecation.new_key())
                    .or_default()
                    .push(deprecation.old_key());
            }

            let mut entries = IndexMap::with_capacity(base.len() + renamed_from.len());
            for (key, value) in base {
                if let Some(old_keys) = renamed_from.get(&key) {
                    for old_key in old_keys {
                        entries.insert((*old_key).clone(), value.clone());
                    }
                }
                entries.insert(key, value);
            }
            entries
        };

        let deprecations: IndexMap<K, Arc<KeyDeprecation<K>>> = deprecations
            .into_iter()
            .map(|deprecation| (deprecation.old_key().clone(), Arc::new(deprecation)))
            .collect();

        debug!(
            entries = entries.len(),
            deprecations = deprecations.len(),
            "Wrapped mapping with deprecated keys"
        );

        Ok(Self {
            entries,
            deprecations,
            sink,
        })
    }

    /// Value for `key`, or [`DkeyError::KeyNotFound`].
    pub fn get_item<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + fmt::Display,
    {
        self.check(key);
        self.entries.get(key).ok_or_else(|| not_found(key))
    }

    /// Store `value` under `key`, returning the previous value.
    pub fn set_item(&mut self, key: K, value: V) -> Option<V> {
        self.check_and_consume(&key);
        self.entries.insert(key, value)
    }

    /// Remove `key`, or fail with [`DkeyError::KeyNotFound`].
    pub fn delete_item<Q>(&mut self, key: &Q) -> Result<()>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + fmt::Display,
    {
        self.pop(key).map(drop)
    }

    /// Check if `key` is present. A registered deprecated key always counts
    /// as present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.check(key) || self.entries.contains_key(key)
    }

    /// Iterate over the keys in insertion order, warning for each deprecated
    /// key as it is reached.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            keys: self.entries.keys(),
            map: self,
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.check(key);
        self.entries.get(key)
    }

    /// Value for `key`, or `default` when absent.
    pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).unwrap_or(default)
    }

    /// Remove and return the value for `key`, or fail with
    /// [`DkeyError::KeyNotFound`].
    pub fn pop<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + fmt::Display,
    {
        self.check_and_consume(key);
        self.entries.shift_remove(key).ok_or_else(|| not_found(key))
    }

    /// Remove and return the value for `key`, or `default` when absent.
    pub fn pop_or<Q>(&mut self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.check_and_consume(key);
        self.entries.shift_remove(key).unwrap_or(default)
    }

    /// Remove the most recently inserted entry. `None` when empty.
    pub fn pop_item(&mut self) -> Option<(K, V)> {
        let (key, value) = self.entries.pop()?;
        self.check_and_consume(&key);
        Some((key, value))
    }

    /// Remove every entry and every deprecation, without warning.
    pub fn clear(&mut self) {
        self.deprecations.clear();
        self.entries.clear();
    }

    /// Shallow copy with its own entries and deprecation table.
    pub fn copy(&self) -> Self
    where
        V: Clone,
    {
        self.clone()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, K, V> {
        self.warn_all();
        self.entries.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, K, V> {
        self.warn_all();
        self.entries.values()
    }

    pub fn items(&self) -> indexmap::map::Iter<'_, K, V> {
        self.warn_all();
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.warn_all();
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if `key` is still registered as deprecated. Does not warn.
    pub fn is_deprecated<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.deprecations.contains_key(key)
    }

    /// Registered deprecations in registration order. Does not warn.
    pub fn deprecations(&self) -> impl Iterator<Item = &KeyDeprecation<K>> {
        self.deprecations
            .values()
            .map(|deprecation| deprecation.as_ref())
    }

    pub fn sink(&self) -> &Arc<dyn WarningSink> {
        &self.sink
    }

    /// Unwrap into the plain mapping, dropping the deprecation table.
    pub fn into_inner(self) -> IndexMap<K, V> {
        self.entries
    }

    fn check<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.deprecations.get(key) {
            Some(deprecation) => {
                self.sink.emit(&deprecation.notice());
                true
            }
            None => false,
        }
    }

    fn check_and_consume<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.deprecations.shift_remove(key) {
            Some(deprecation) => {
                self.sink.emit(&deprecation.notice());
                trace!(key = %deprecation.old_key(), "Deprecation consumed");
                true
            }
            None => false,
        }
    }

    fn warn_all(&self) {
        for deprecation in self.deprecations.values() {
            self.sink.emit(&deprecation.notice());
        }
    }
}

fn not_found<Q: ?Sized + fmt::Display>(key: &Q) -> DkeyError {
    DkeyError::KeyNotFound {
        key: key.to_string(),
    }
}

impl<K: Clone, V: Clone> Clone for DeprecatedKeys<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            deprecations: self.deprecations.clone(),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for DeprecatedKeys<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeprecatedKeys")
            .field("entries", &self.entries)
            .field("deprecated", &self.deprecations.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Key iterator returned by [`DeprecatedKeys::iter`].
pub struct Iter<'a, K, V> {
    keys: indexmap::map::Keys<'a, K, V>,
    map: &'a DeprecatedKeys<K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: Eq + Hash + Clone + fmt::Display,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.keys.next()?;
        self.map.check(key);
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl<'a, K, V> IntoIterator for &'a DeprecatedKeys<K, V>
where
    K: Eq + Hash + Clone + fmt::Display,
{
    type Item = &'a K;
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// Equality compares entries regardless of order and warns for every
// registered deprecation on each wrapped side.

impl<K, V> PartialEq for DeprecatedKeys<K, V>
where
    K: Eq + Hash + Clone + fmt::Display,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.warn_all();
        other.warn_all();
        self.entries == other.entries
    }
}

impl<K, V, S> PartialEq<IndexMap<K, V, S>> for DeprecatedKeys<K, V>
where
    K: Eq + Hash + Clone + fmt::Display,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &IndexMap<K, V, S>) -> bool {
        self.warn_all();
        self.entries == *other
    }
}

impl<K, V, S> PartialEq<DeprecatedKeys<K, V>> for IndexMap<K, V, S>
where
    K: Eq + Hash + Clone + fmt::Display,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &DeprecatedKeys<K, V>) -> bool {
        other == self
    }
}

impl<K, V, S> PartialEq<HashMap<K, V, S>> for DeprecatedKeys<K, V>
where
    K: Eq + Hash + Clone + fmt::Display,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &HashMap<K, V, S>) -> bool {
        self.warn_all();
        self.entries.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K, V, S> PartialEq<DeprecatedKeys<K, V>> for HashMap<K, V, S>
where
    K: Eq + Hash + Clone + fmt::Display,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &DeprecatedKeys<K, V>) -> bool {
        other == self
    }
}
