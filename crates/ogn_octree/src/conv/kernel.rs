//! Gather (im2col) and scatter-add (col2im) over a [`NeighborPlan`].
//!
//! Feature buffers are laid out `(channel, pixel)` for one element and
//! `(batch, channel, pixel)` for a batch, where `pixel` is a source slot.
//! Every shape is checked before the first write, so a rejected call leaves
//! its output untouched.

use rayon::prelude::*;

use crate::error::{OctreeError, Result};

use super::{ColumnBuffer, Element, NeighborPlan};

/// Gather one element's source features into a new column buffer.
pub fn gather<T: Element>(plan: &NeighborPlan, features: &[T], pixels: usize) -> Result<ColumnBuffer<T>> {
  let mut columns = ColumnBuffer::zeros(plan.row_count(), plan.column_count());
  gather_into(plan, features, pixels, &mut columns)?;
  Ok(columns)
}

/// Gather into an existing buffer. Unresolved entries and padding columns
/// are written as zero.
pub fn gather_into<T: Element>(
  plan: &NeighborPlan,
  features: &[T],
  pixels: usize,
  columns: &mut ColumnBuffer<T>,
) -> Result<()> {
  plan.check_features(features.len(), pixels)?;
  plan.check_columns(columns.rows(), columns.cols())?;
  columns.fill_zero();

  let cols = columns.cols();
  if cols == 0 || columns.rows() == 0 {
    return Ok(());
  }
  let window = plan.window_volume();
  let queries = plan.query_count();
  let slots = plan.slots();

  columns
    .as_mut_slice()
    .par_chunks_mut(cols)
    .enumerate()
    .for_each(|(row, out)| {
      let (ch, e) = (row / window, row % window);
      let channel = &features[ch * pixels..(ch + 1) * pixels];
      for (j, value) in out.iter_mut().take(queries).enumerate() {
        if let Some(slot) = slots[j * window + e] {
          *value = channel[slot as usize];
        }
      }
    });
  Ok(())
}

/// Scatter-add a column buffer into one element's gradient buffer.
///
/// Values are added, never assigned: several queries may share a source
/// neighbor. The caller zeroes `grad` before the first scatter of a pass.
pub fn scatter<T: Element>(
  plan: &NeighborPlan,
  columns: &ColumnBuffer<T>,
  grad: &mut [T],
  pixels: usize,
) -> Result<()> {
  plan.check_features(grad.len(), pixels)?;
  plan.check_columns(columns.rows(), columns.cols())?;
  if pixels == 0 || grad.is_empty() {
    return Ok(());
  }

  let window = plan.window_volume();
  let queries = plan.query_count();
  let cols = columns.cols();
  let slots = plan.slots();
  let data = columns.as_slice();

  // One task per channel; within a channel the accumulation order is fixed.
  grad.par_chunks_mut(pixels).enumerate().for_each(|(ch, channel)| {
    for e in 0..window {
      let row = &data[(ch * window + e) * cols..][..cols];
      for (j, value) in row.iter().take(queries).enumerate() {
        if let Some(slot) = slots[j * window + e] {
          channel[slot as usize] += *value;
        }
      }
    }
  });
  Ok(())
}

/// Gather every element of a batch in parallel.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "conv::gather_batch"))]
pub fn gather_batch<T: Element>(
  plans: &[NeighborPlan],
  features: &[T],
  pixels: usize,
) -> Result<Vec<ColumnBuffer<T>>> {
  let stride = batch_stride(plans, features.len(), pixels)?;
  for plan in plans {
    plan.check_features(stride, pixels)?;
  }

  #[cfg(feature = "tracing")]
  tracing::debug!(batch = plans.len(), pixels, "gathering columns");

  plans
    .par_iter()
    .enumerate()
    .map(|(n, plan)| gather(plan, &features[n * stride..(n + 1) * stride], pixels))
    .collect()
}

/// Zero `grad`, then scatter-add every element of a batch in parallel.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "conv::scatter_batch"))]
pub fn scatter_batch<T: Element>(
  plans: &[NeighborPlan],
  columns: &[ColumnBuffer<T>],
  grad: &mut [T],
  pixels: usize,
) -> Result<()> {
  if columns.len() != plans.len() {
    return Err(OctreeError::ShapeMismatch {
      what: "column buffers per batch",
      expected: plans.len(),
      actual: columns.len(),
    });
  }
  let stride = batch_stride(plans, grad.len(), pixels)?;
  for (plan, buffer) in plans.iter().zip(columns) {
    plan.check_features(stride, pixels)?;
    plan.check_columns(buffer.rows(), buffer.cols())?;
  }

  #[cfg(feature = "tracing")]
  tracing::debug!(batch = plans.len(), pixels, "scattering columns");

  grad.fill(T::default());
  if stride == 0 {
    return Ok(());
  }
  grad
    .par_chunks_mut(stride)
    .zip(plans.par_iter().zip(columns.par_iter()))
    .try_for_each(|(element, (plan, buffer))| scatter(plan, buffer, element, pixels))
}

/// Per-element length of a batch buffer; all plans must share one channel
/// count and the buffer must split evenly into them.
fn batch_stride(plans: &[NeighborPlan], len: usize, pixels: usize) -> Result<usize> {
  let channels = plans.first().map(|p| p.config().channels).unwrap_or(0);
  if let Some(odd) = plans.iter().find(|p| p.config().channels != channels) {
    return Err(OctreeError::ShapeMismatch {
      what: "channels per batch element",
      expected: channels,
      actual: odd.config().channels,
    });
  }
  let stride = channels.checked_mul(pixels);
  let expected = stride.and_then(|s| s.checked_mul(plans.len()));
  match (stride, expected) {
    (Some(stride), Some(expected)) if expected == len => Ok(stride),
    _ => Err(OctreeError::ShapeMismatch {
      what: "batch feature buffer",
      expected: expected.unwrap_or(usize::MAX),
      actual: len,
    }),
  }
}

#[cfg(test)]
#[path = "kernel_test.rs"]
mod kernel_test;
