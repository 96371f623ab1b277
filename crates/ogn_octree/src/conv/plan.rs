//! NeighborPlan - precomputed source slots for one batch element.
//!
//! For query key `j` (in query-map iteration order) and window entry `e`, the
//! plan stores the slot of `neighbors(first_child(key_j), f)[e]` in the
//! source map, or `None` when the neighbor is out of range or unoccupied.
//! Gather and scatter read the same table, which keeps them exact transposes.

use rayon::prelude::*;

use crate::error::{OctreeError, Result};
use crate::key::{INVALID_KEY, MAX_LEVEL};
use crate::levels::ensure_level;
use crate::map::{SlotMap, SparseOctreeMap};
use crate::neighbors::for_each_neighbor;

use super::ConvConfig;

/// Source-slot table for one query map against one source map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NeighborPlan {
  config: ConvConfig,
  window: usize,
  rows: usize,
  queries: usize,
  cols: usize,
  source_extent: usize,
  slots: Vec<Option<u32>>,
}

impl NeighborPlan {
  /// Resolve every query's window against `source`.
  ///
  /// Query keys must share one level with a child level below it; keys at
  /// [`MAX_LEVEL`] fail. Every source key must sit at that child level.
  pub fn build<Q>(query: &SparseOctreeMap<Q>, source: &SlotMap, config: &ConvConfig) -> Result<Self> {
    let rows = config.column_rows()?;
    let window = config.window_volume()?;
    let capacity = query
      .len()
      .checked_mul(window)
      .ok_or(OctreeError::InvalidFilterSize(config.filter_size))?;
    let mut slots = Vec::with_capacity(capacity);
    let mut source_extent = 0usize;
    let mut anchor_level = None;

    for key in query.keys() {
      let level = key.level()?;
      let anchor = key.first_child().ok_or(OctreeError::LevelTooDeep {
        level: level + 1,
        max: MAX_LEVEL,
      })?;
      match anchor_level {
        None => {
          ensure_level(source, level + 1)?;
          anchor_level = Some(level + 1);
        }
        Some(expected) if expected != level + 1 => {
          return Err(OctreeError::LevelMismatch {
            key: key.raw(),
            expected: expected - 1,
            actual: level,
          });
        }
        Some(_) => {}
      }

      for_each_neighbor(anchor, config.filter_size, config.anchor, |neighbor| {
        let slot = if neighbor == INVALID_KEY {
          None
        } else {
          source.lookup(neighbor)
        };
        if let Some(s) = slot {
          source_extent = source_extent.max(s as usize + 1);
        }
        slots.push(slot);
      })?;
    }

    Ok(Self {
      config: *config,
      window,
      rows,
      queries: query.len(),
      cols: query.len(),
      source_extent,
      slots,
    })
  }

  /// Build one plan per batch element in parallel, all padded to the widest
  /// element's column count.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "conv::build_batch"))]
  pub fn build_batch<Q>(
    queries: &[SparseOctreeMap<Q>],
    sources: &[SlotMap],
    config: &ConvConfig,
  ) -> Result<Vec<Self>>
  where
    Q: Sync,
  {
    if queries.len() != sources.len() {
      return Err(OctreeError::ShapeMismatch {
        what: "source maps per batch",
        expected: queries.len(),
        actual: sources.len(),
      });
    }
    let plans = queries
      .par_iter()
      .zip(sources.par_iter())
      .map(|(query, source)| Self::build(query, source, config))
      .collect::<Result<Vec<_>>>()?;

    let cols = plans.iter().map(|p| p.queries).max().unwrap_or(0);
    #[cfg(feature = "tracing")]
    tracing::debug!(batch = plans.len(), cols, "neighbor plans built");

    plans.into_iter().map(|p| p.with_columns(cols)).collect()
  }

  /// Widen the column count (extra columns gather as zero and scatter
  /// nothing). Narrower than the query count is an error.
  pub fn with_columns(mut self, cols: usize) -> Result<Self> {
    if cols < self.queries {
      return Err(OctreeError::ShapeMismatch {
        what: "column count",
        expected: self.queries,
        actual: cols,
      });
    }
    if self.rows.checked_mul(cols).is_none() {
      return Err(OctreeError::ShapeMismatch {
        what: "column buffer size",
        expected: usize::MAX / self.rows.max(1),
        actual: cols,
      });
    }
    self.cols = cols;
    Ok(self)
  }

  #[inline]
  pub fn config(&self) -> &ConvConfig {
    &self.config
  }

  /// Entries per window (`f^3`).
  #[inline]
  pub fn window_volume(&self) -> usize {
    self.window
  }

  /// Number of occupied query keys.
  #[inline]
  pub fn query_count(&self) -> usize {
    self.queries
  }

  /// Column count of buffers built from this plan.
  #[inline]
  pub fn column_count(&self) -> usize {
    self.cols
  }

  /// Row count of buffers built from this plan.
  #[inline]
  pub fn row_count(&self) -> usize {
    self.rows
  }

  /// Smallest per-channel pixel count a source buffer must have.
  #[inline]
  pub fn source_extent(&self) -> usize {
    self.source_extent
  }

  /// Source slots for query `j` in raster order.
  pub fn column(&self, j: usize) -> Option<&[Option<u32>]> {
    if j >= self.queries {
      return None;
    }
    Some(&self.slots[j * self.window..(j + 1) * self.window])
  }

  /// Source slot for query `j`, window entry `e`.
  #[inline]
  pub fn entry(&self, j: usize, e: usize) -> Option<usize> {
    if j >= self.queries || e >= self.window {
      return None;
    }
    self.slots[j * self.window + e].map(|s| s as usize)
  }

  /// How many (query, entry) pairs resolve to a source slot.
  pub fn hit_count(&self) -> usize {
    self.slots.iter().filter(|s| s.is_some()).count()
  }

  /// Per-slot reference counts: how many (query, entry) pairs read each
  /// source slot. Length is `source_extent`.
  pub fn slot_references(&self) -> Vec<usize> {
    let mut counts = vec![0usize; self.source_extent];
    for slot in self.slots.iter().flatten() {
      counts[*slot as usize] += 1;
    }
    counts
  }

  pub(crate) fn slots(&self) -> &[Option<u32>] {
    &self.slots
  }

  /// Reject a feature buffer that does not match `channels x pixels` or
  /// cannot hold every referenced slot.
  pub(crate) fn check_features(&self, len: usize, pixels: usize) -> Result<()> {
    let expected = self.config.channels.checked_mul(pixels);
    if expected != Some(len) {
      return Err(OctreeError::ShapeMismatch {
        what: "feature buffer",
        expected: expected.unwrap_or(usize::MAX),
        actual: len,
      });
    }
    if self.source_extent > pixels {
      return Err(OctreeError::SlotOutOfRange {
        slot: self.source_extent - 1,
        pixels,
      });
    }
    Ok(())
  }

  pub(crate) fn check_columns(&self, rows: usize, cols: usize) -> Result<()> {
    if rows != self.row_count() {
      return Err(OctreeError::ShapeMismatch {
        what: "column buffer rows",
        expected: self.row_count(),
        actual: rows,
      });
    }
    if cols != self.cols {
      return Err(OctreeError::ShapeMismatch {
        what: "column buffer columns",
        expected: self.cols,
        actual: cols,
      });
    }
    Ok(())
  }
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod plan_test;
