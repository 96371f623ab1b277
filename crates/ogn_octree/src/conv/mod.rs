//! Sparse convolution gather/scatter.
//!
//! Turns features stored per occupied cell of a fine level into a dense
//! column buffer, one column per occupied cell of the next coarser level, so
//! a plain matrix multiply realizes a convolution over the neighbor window.
//! Scatter is the exact transpose and accumulates.
//!
//! ```text
//! query map (level L)   ──first_child──▶ window at L+1 ──lookup──▶ source slots
//!                                                                     │
//! features[ch][slot] ──gather──▶ columns[ch * f^3 + e][j] ──scatter-add──▶ grad
//! ```
//!
//! # Module Structure
//!
//! - [`plan`]: `NeighborPlan` - resolved source slots per query and entry
//! - [`column`]: `ColumnBuffer` - the dense staging matrix
//! - [`kernel`]: gather / scatter for one element and for a batch

pub mod column;
pub mod kernel;
pub mod plan;

use std::ops::AddAssign;

pub use column::ColumnBuffer;
pub use kernel::{gather, gather_batch, gather_into, scatter, scatter_batch};
pub use plan::NeighborPlan;

use crate::error::{OctreeError, Result};
use crate::map::{SlotMap, SparseOctreeMap};
use crate::neighbors::{window_volume, WindowAnchor};

/// Numeric element of feature and column buffers. `Default` is zero.
pub trait Element: Copy + Default + AddAssign + Send + Sync + 'static {}

impl<T> Element for T where T: Copy + Default + AddAssign + Send + Sync + 'static {}

/// Integers supplied by the caller at setup time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConvConfig {
  /// Input channels per source slot.
  pub channels: usize,
  /// Window edge length.
  pub filter_size: usize,
  /// Window placement relative to the anchor cell.
  pub anchor: WindowAnchor,
}

impl ConvConfig {
  pub fn new(channels: usize, filter_size: usize) -> Self {
    Self {
      channels,
      filter_size,
      anchor: WindowAnchor::Corner,
    }
  }

  /// Reject a window that is empty, larger than
  /// [`MAX_FILTER_SIZE`](crate::neighbors::MAX_FILTER_SIZE), or whose column
  /// buffer row count does not fit a `usize`.
  pub fn validate(&self) -> Result<()> {
    self.column_rows().map(|_| ())
  }

  /// `filter_size^3`.
  #[inline]
  pub fn window_volume(&self) -> Result<usize> {
    window_volume(self.filter_size)
  }

  /// Rows of the column buffer: `channels * filter_size^3`.
  pub fn column_rows(&self) -> Result<usize> {
    self
      .window_volume()?
      .checked_mul(self.channels)
      .ok_or(OctreeError::InvalidFilterSize(self.filter_size))
  }
}

impl Default for ConvConfig {
  fn default() -> Self {
    Self::new(1, 2)
  }
}

/// One-shot gather: resolve the plan and fill a column buffer.
pub fn gather_columns<Q, T: Element>(
  query: &SparseOctreeMap<Q>,
  source: &SlotMap,
  features: &[T],
  pixels: usize,
  config: &ConvConfig,
) -> Result<ColumnBuffer<T>> {
  let plan = NeighborPlan::build(query, source, config)?;
  gather(&plan, features, pixels)
}

/// One-shot scatter-add, the transpose of [`gather_columns`].
pub fn scatter_columns<Q, T: Element>(
  query: &SparseOctreeMap<Q>,
  source: &SlotMap,
  columns: &ColumnBuffer<T>,
  grad: &mut [T],
  pixels: usize,
  config: &ConvConfig,
) -> Result<()> {
  let plan = NeighborPlan::build(query, source, config)?;
  scatter(&plan, columns, grad, pixels)
}

// Test utilities
#[cfg(test)]
pub mod test_utils;
