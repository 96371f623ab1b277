//! Dense column buffer handed to the matrix multiply.

use crate::error::{OctreeError, Result};

use super::Element;

/// Row-major `rows x cols` staging matrix.
///
/// Row `ch * f^3 + e` holds channel `ch` of window entry `e`; column `j` is
/// the `j`-th query key.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnBuffer<T> {
  rows: usize,
  cols: usize,
  data: Vec<T>,
}

impl<T: Element> ColumnBuffer<T> {
  /// Zero-filled buffer.
  pub fn zeros(rows: usize, cols: usize) -> Self {
    Self {
      rows,
      cols,
      data: vec![T::default(); rows * cols],
    }
  }

  /// Wrap existing data (e.g. the product of a transposed matrix multiply).
  pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
    if data.len() != rows * cols {
      return Err(OctreeError::ShapeMismatch {
        what: "column buffer data",
        expected: rows * cols,
        actual: data.len(),
      });
    }
    Ok(Self { rows, cols, data })
  }

  #[inline]
  pub fn rows(&self) -> usize {
    self.rows
  }

  #[inline]
  pub fn cols(&self) -> usize {
    self.cols
  }

  #[inline]
  pub fn get(&self, row: usize, col: usize) -> Option<T> {
    if row >= self.rows || col >= self.cols {
      return None;
    }
    self.data.get(row * self.cols + col).copied()
  }

  /// One row (all columns of one channel/window entry).
  pub fn row(&self, row: usize) -> Option<&[T]> {
    if row >= self.rows {
      return None;
    }
    Some(&self.data[row * self.cols..(row + 1) * self.cols])
  }

  #[inline]
  pub fn as_slice(&self) -> &[T] {
    &self.data
  }

  #[inline]
  pub fn as_mut_slice(&mut self) -> &mut [T] {
    &mut self.data
  }

  pub fn fill_zero(&mut self) {
    self.data.fill(T::default());
  }

  pub fn into_vec(self) -> Vec<T> {
    self.data
  }
}
