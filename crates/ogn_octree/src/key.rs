//! Octree key codec.
//!
//! A key packs `(level, x, y, z)` into one `u32`:
//!
//! ```text
//! bit 3*level     : sentinel (marks the depth)
//! bits 3*i..3*i+3 : octant at depth level-i, x at bit 2, y at bit 1, z at bit 0
//! ```
//!
//! The finest octant sits in the lowest group, so shifting a key right by 3
//! moves it to its parent and shifting left by 3 moves it to its first child.
//! Level 0 is the root (`key == 1`). Keys of different levels never collide,
//! which lets one ordered map hold cells from several depths.

use std::fmt;

use crate::error::{OctreeError, Result};

/// Deepest level whose sentinel still fits in a `u32` (bit 30).
pub const MAX_LEVEL: u32 = 10;

/// Integer key for one octree cell.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OctreeKey(u32);

/// Marker for "no such cell".
///
/// All ones puts the highest set bit at 31, which is not a sentinel position,
/// so no call to [`OctreeKey::encode`] can produce it.
pub const INVALID_KEY: OctreeKey = OctreeKey(u32::MAX);

/// Decoded cell position. `x`, `y` and `z` are in `[0, 2^level)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct OctreeCoord {
  pub level: u32,
  pub x: u32,
  pub y: u32,
  pub z: u32,
}

impl OctreeCoord {
  /// Grid resolution along one axis at this level.
  #[inline]
  pub fn resolution(&self) -> u32 {
    1 << self.level
  }

  /// Row-major index of this cell in a dense `r x r x r` grid (`r = 2^level`).
  #[inline]
  pub fn dense_index(&self) -> usize {
    let r = self.resolution() as usize;
    (self.x as usize * r + self.y as usize) * r + self.z as usize
  }
}

impl OctreeKey {
  /// The single level-0 cell.
  pub const ROOT: Self = Self(1);

  /// Wrap a raw integer without validation (file loading, interop).
  #[inline]
  pub const fn from_raw(raw: u32) -> Self {
    Self(raw)
  }

  #[inline]
  pub const fn raw(self) -> u32 {
    self.0
  }

  /// Encode a cell. Fails when the level is too deep or a coordinate does not
  /// fit the level.
  pub fn encode(level: u32, x: u32, y: u32, z: u32) -> Result<Self> {
    if level > MAX_LEVEL {
      return Err(OctreeError::LevelTooDeep {
        level,
        max: MAX_LEVEL,
      });
    }
    let res = 1u32 << level;
    if x >= res || y >= res || z >= res {
      return Err(OctreeError::CoordinateOutOfRange { level, x, y, z });
    }

    let mut key = 1u32;
    for i in (0..level).rev() {
      let octant = (((x >> i) & 1) << 2) | (((y >> i) & 1) << 1) | ((z >> i) & 1);
      key = (key << 3) | octant;
    }
    Ok(Self(key))
  }

  /// Encode from a coordinate value.
  #[inline]
  pub fn from_coord(coord: OctreeCoord) -> Result<Self> {
    Self::encode(coord.level, coord.x, coord.y, coord.z)
  }

  /// Depth of this key, read from the sentinel bit.
  pub fn level(self) -> Result<u32> {
    if self.0 == 0 {
      return Err(OctreeError::InvalidKey(self.0));
    }
    let top = 31 - self.0.leading_zeros();
    if top % 3 != 0 {
      return Err(OctreeError::InvalidKey(self.0));
    }
    Ok(top / 3)
  }

  /// True if the key decodes to a cell.
  #[inline]
  pub fn is_valid(self) -> bool {
    self.level().is_ok()
  }

  /// Full decode to `(level, x, y, z)`.
  pub fn decode(self) -> Result<OctreeCoord> {
    let level = self.level()?;
    let (mut x, mut y, mut z) = (0u32, 0u32, 0u32);
    for i in (0..level).rev() {
      let octant = (self.0 >> (3 * i)) & 0b111;
      x = (x << 1) | (octant >> 2);
      y = (y << 1) | ((octant >> 1) & 1);
      z = (z << 1) | (octant & 1);
    }
    Ok(OctreeCoord { level, x, y, z })
  }

  /// Parent cell (one level coarser). `None` for the root or an invalid key.
  #[inline]
  pub fn parent(self) -> Option<Self> {
    match self.level() {
      Ok(level) if level > 0 => Some(Self(self.0 >> 3)),
      _ => None,
    }
  }

  /// Octant of this cell within its parent (0..8). `None` for the root.
  #[inline]
  pub fn octant(self) -> Option<u8> {
    self.parent().map(|_| (self.0 & 0b111) as u8)
  }

  /// Child cell (one level finer).
  ///
  /// Octant bits: bit 2 = +X, bit 1 = +Y, bit 0 = +Z.
  /// Returns `None` at [`MAX_LEVEL`], for an invalid key, or for `octant >= 8`.
  #[inline]
  pub fn child(self, octant: u8) -> Option<Self> {
    if octant >= 8 {
      return None;
    }
    match self.level() {
      Ok(level) if level < MAX_LEVEL => Some(Self((self.0 << 3) | octant as u32)),
      _ => None,
    }
  }

  /// Child at octant 0, the corner the neighbor window is anchored on.
  #[inline]
  pub fn first_child(self) -> Option<Self> {
    self.child(0)
  }
}

impl fmt::Debug for OctreeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if *self == INVALID_KEY {
      return f.write_str("OctreeKey(INVALID)");
    }
    match self.decode() {
      Ok(c) => write!(f, "OctreeKey({:#x} = L{}:{},{},{})", self.0, c.level, c.x, c.y, c.z),
      Err(_) => write!(f, "OctreeKey({:#x}?)", self.0),
    }
  }
}

impl fmt::Display for OctreeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:#x}", self.0)
  }
}

impl TryFrom<OctreeCoord> for OctreeKey {
  type Error = OctreeError;

  fn try_from(coord: OctreeCoord) -> Result<Self> {
    Self::from_coord(coord)
  }
}

#[cfg(test)]
#[path = "key_test.rs"]
mod key_test;
