//! Building one level's map from another.
//!
//! These use nothing but size, slot lookup and ordered iteration, which is
//! all a caller assembling per-level maps needs from the container.

use crate::error::{OctreeError, Result};
use crate::key::OctreeKey;
use crate::map::{SlotMap, SparseOctreeMap};

/// Move every key to its parent and de-duplicate, assigning fresh slots in
/// key order. Root keys have no parent and fail the call.
pub fn coarsen<V>(map: &SparseOctreeMap<V>) -> Result<SlotMap> {
  let parents = map
    .keys()
    .map(|key| key.parent().ok_or(OctreeError::RootHasNoParent))
    .collect::<Result<Vec<OctreeKey>>>()?;
  SlotMap::from_keys(parents)
}

/// Keys at exactly `level` whose value passes `keep`, with fresh slots.
///
/// For occupancy bytes the usual predicate is `|v| *v != 0`.
pub fn select_level<V, F>(map: &SparseOctreeMap<V>, level: u32, keep: F) -> Result<SlotMap>
where
  F: Fn(&V) -> bool,
{
  SlotMap::from_keys(
    map
      .iter()
      .filter(|(key, value)| key.level().ok() == Some(level) && keep(value))
      .map(|(key, _)| key),
  )
}

/// Check that every key of `map` sits at `level`.
pub fn ensure_level<V>(map: &SparseOctreeMap<V>, level: u32) -> Result<()> {
  for key in map.keys() {
    let actual = key.level()?;
    if actual != level {
      return Err(OctreeError::LevelMismatch {
        key: key.raw(),
        expected: level,
        actual,
      });
    }
  }
  Ok(())
}

/// Union of two maps whose key sets must not overlap. Slots are reassigned
/// in merged key order.
pub fn merge_disjoint<A, B>(a: &SparseOctreeMap<A>, b: &SparseOctreeMap<B>) -> Result<SlotMap> {
  let overlap = if a.len() <= b.len() {
    a.keys().find(|key| b.contains_key(*key))
  } else {
    b.keys().find(|key| a.contains_key(*key))
  };
  if let Some(key) = overlap {
    return Err(OctreeError::DuplicateKey(key.raw()));
  }
  SlotMap::from_keys(a.keys().chain(b.keys()))
}

#[cfg(test)]
#[path = "levels_test.rs"]
mod levels_test;
