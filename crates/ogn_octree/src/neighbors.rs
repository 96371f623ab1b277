//! Neighbor query over a cubic window.
//!
//! For a key at level L and window size f, returns f^3 keys at the same
//! level in a fixed raster (x outermost, z innermost). Cells that fall
//! outside `[0, 2^L)` on any axis come back as [`INVALID_KEY`]. Gather and
//! scatter both walk this raster, so entry `e` always names the same cell.
//!
//! The convolution engine calls this with the *first child* of a coarse
//! query key, so a 2-wide window covers the eight children of that cell.

use smallvec::SmallVec;

use crate::error::{OctreeError, Result};
use crate::key::{OctreeKey, INVALID_KEY, MAX_LEVEL};

/// Ordered neighbor keys for one query; inline for windows up to 2^3.
pub type NeighborList = SmallVec<[OctreeKey; 8]>;

/// Where the window sits relative to the query cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WindowAnchor {
  /// Offsets `0..f` on each axis; the query cell is the window's min corner.
  #[default]
  Corner,
  /// Offsets `-(f-1)/2 .. f-(f-1)/2`; the query cell is the window's center
  /// for odd `f`.
  Centered,
}

impl WindowAnchor {
  #[inline]
  fn origin_shift(self, filter_size: usize) -> i64 {
    match self {
      WindowAnchor::Corner => 0,
      WindowAnchor::Centered => -(((filter_size - 1) / 2) as i64),
    }
  }
}

/// Largest accepted window edge: twice the finest grid resolution. Any
/// larger window only adds out-of-range entries.
pub const MAX_FILTER_SIZE: usize = 1 << (MAX_LEVEL + 1);

/// Number of entries in a window of the given size.
///
/// Sizes of 0 or above [`MAX_FILTER_SIZE`], and cubes that do not fit a
/// `usize`, are rejected.
pub fn window_volume(filter_size: usize) -> Result<usize> {
  if filter_size == 0 || filter_size > MAX_FILTER_SIZE {
    return Err(OctreeError::InvalidFilterSize(filter_size));
  }
  filter_size
    .checked_mul(filter_size)
    .and_then(|square| square.checked_mul(filter_size))
    .ok_or(OctreeError::InvalidFilterSize(filter_size))
}

/// Corner-anchored neighbor list of `filter_size^3` keys.
pub fn neighbors(key: OctreeKey, filter_size: usize) -> Result<NeighborList> {
  neighbors_anchored(key, filter_size, WindowAnchor::Corner)
}

/// Neighbor list for an explicit anchor.
pub fn neighbors_anchored(
  key: OctreeKey,
  filter_size: usize,
  anchor: WindowAnchor,
) -> Result<NeighborList> {
  let mut out = NeighborList::with_capacity(window_volume(filter_size)?);
  for_each_neighbor(key, filter_size, anchor, |k| out.push(k))?;
  Ok(out)
}

/// Fill `out` with the neighbor list, reusing its allocation.
///
/// `out` is cleared first and left empty on error.
pub fn neighbors_into(
  key: OctreeKey,
  filter_size: usize,
  anchor: WindowAnchor,
  out: &mut Vec<OctreeKey>,
) -> Result<()> {
  out.clear();
  out.reserve(window_volume(filter_size)?);
  for_each_neighbor(key, filter_size, anchor, |k| out.push(k)).inspect_err(|_| out.clear())
}

/// Visit the window in raster order without allocating.
pub fn for_each_neighbor<F>(
  key: OctreeKey,
  filter_size: usize,
  anchor: WindowAnchor,
  mut visit: F,
) -> Result<()>
where
  F: FnMut(OctreeKey),
{
  window_volume(filter_size)?;
  let coord = key.decode()?;
  let res = 1i64 << coord.level;
  let shift = anchor.origin_shift(filter_size);
  let f = filter_size as i64;

  let axis = |base: u32, d: i64| -> Option<u32> {
    let c = base as i64 + shift + d;
    (0..res).contains(&c).then_some(c as u32)
  };

  for dx in 0..f {
    let x = axis(coord.x, dx);
    for dy in 0..f {
      let y = axis(coord.y, dy);
      for dz in 0..f {
        let z = axis(coord.z, dz);
        let neighbor = match (x, y, z) {
          (Some(x), Some(y), Some(z)) => {
            OctreeKey::encode(coord.level, x, y, z).unwrap_or(INVALID_KEY)
          }
          _ => INVALID_KEY,
        };
        visit(neighbor);
      }
    }
  }
  Ok(())
}

#[cfg(test)]
#[path = "neighbors_test.rs"]
mod neighbors_test;
