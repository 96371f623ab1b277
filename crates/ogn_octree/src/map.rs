//! SparseOctreeMap - ordered mapping from octree key to a value.
//!
//! Iteration is strictly ascending by key and restartable. One map is built
//! per batch element per level for a single forward pass and read by every
//! gather/scatter call in that pass.

use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::error::{OctreeError, Result};
use crate::key::{OctreeKey, MAX_LEVEL};

/// Ordered key -> value container for octree cells.
///
/// Insertion overwrites an existing value and hands back the old one.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseOctreeMap<V> {
  entries: BTreeMap<OctreeKey, V>,
}

/// Map from key to a compact slot index into a dense feature buffer.
pub type SlotMap = SparseOctreeMap<u32>;

impl<V> SparseOctreeMap<V> {
  /// Create an empty map.
  pub fn new() -> Self {
    Self {
      entries: BTreeMap::new(),
    }
  }

  /// Insert or overwrite. Keys that do not decode are rejected.
  pub fn insert(&mut self, key: OctreeKey, value: V) -> Result<Option<V>> {
    if !key.is_valid() {
      return Err(OctreeError::InvalidKey(key.raw()));
    }
    Ok(self.entries.insert(key, value))
  }

  /// Borrow the value for a key.
  #[inline]
  pub fn get(&self, key: OctreeKey) -> Option<&V> {
    self.entries.get(&key)
  }

  #[inline]
  pub fn contains_key(&self, key: OctreeKey) -> bool {
    self.entries.contains_key(&key)
  }

  pub fn remove(&mut self, key: OctreeKey) -> Option<V> {
    self.entries.remove(&key)
  }

  /// Number of stored keys.
  #[inline]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }

  /// `(key, value)` pairs in ascending key order.
  pub fn iter(&self) -> Iter<'_, V> {
    Iter {
      inner: self.entries.iter(),
    }
  }

  pub fn keys(&self) -> impl DoubleEndedIterator<Item = OctreeKey> + ExactSizeIterator + '_ {
    self.entries.keys().copied()
  }

  pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
    self.entries.values()
  }

  /// Number of keys at each level, indexed by level.
  pub fn level_histogram(&self) -> [usize; MAX_LEVEL as usize + 1] {
    let mut counts = [0usize; MAX_LEVEL as usize + 1];
    for key in self.entries.keys() {
      if let Ok(level) = key.level() {
        counts[level as usize] += 1;
      }
    }
    counts
  }

  /// Build from pairs, validating every key. Later duplicates overwrite
  /// earlier ones.
  pub fn try_from_pairs<I>(pairs: I) -> Result<Self>
  where
    I: IntoIterator<Item = (OctreeKey, V)>,
  {
    let mut map = Self::new();
    for (key, value) in pairs {
      map.insert(key, value)?;
    }
    Ok(map)
  }
}

impl<V: Copy> SparseOctreeMap<V> {
  /// Copy of the value for a key; `None` when absent.
  #[inline]
  pub fn lookup(&self, key: OctreeKey) -> Option<V> {
    self.entries.get(&key).copied()
  }
}

impl SlotMap {
  /// Assign compact slots `0..n` to the given keys in ascending key order.
  /// Duplicates collapse onto one slot.
  pub fn from_keys<I>(keys: I) -> Result<Self>
  where
    I: IntoIterator<Item = OctreeKey>,
  {
    let mut entries = BTreeMap::new();
    for key in keys {
      if !key.is_valid() {
        return Err(OctreeError::InvalidKey(key.raw()));
      }
      entries.insert(key, 0u32);
    }
    for (slot, value) in entries.values_mut().enumerate() {
      *value = slot as u32;
    }
    Ok(Self { entries })
  }

  /// Slot index for a key as a buffer offset.
  #[inline]
  pub fn slot(&self, key: OctreeKey) -> Option<usize> {
    self.lookup(key).map(|slot| slot as usize)
  }

  /// One past the largest stored slot; the minimum pixel count of a feature
  /// buffer addressed through this map.
  pub fn slot_extent(&self) -> usize {
    self
      .entries
      .values()
      .map(|&slot| slot as usize + 1)
      .max()
      .unwrap_or(0)
  }
}

impl<V> Default for SparseOctreeMap<V> {
  fn default() -> Self {
    Self::new()
  }
}

/// Ascending-key iterator over a [`SparseOctreeMap`].
pub struct Iter<'a, V> {
  inner: btree_map::Iter<'a, OctreeKey, V>,
}

impl<'a, V> Iterator for Iter<'a, V> {
  type Item = (OctreeKey, &'a V);

  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    self.inner.next().map(|(k, v)| (*k, v))
  }

  #[inline]
  fn size_hint(&self) -> (usize, Option<usize>) {
    self.inner.size_hint()
  }
}

impl<V> DoubleEndedIterator for Iter<'_, V> {
  fn next_back(&mut self) -> Option<Self::Item> {
    self.inner.next_back().map(|(k, v)| (*k, v))
  }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<'a, V> IntoIterator for &'a SparseOctreeMap<V> {
  type Item = (OctreeKey, &'a V);
  type IntoIter = Iter<'a, V>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

#[cfg(test)]
#[path = "map_test.rs"]
mod map_test;
