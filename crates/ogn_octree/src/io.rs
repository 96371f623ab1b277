//! Binary octree file format.
//!
//! ```text
//! u32 LE            entry count N
//! N x { u32 LE key, V::WIDTH bytes LE value }   ascending by key
//! ```
//!
//! Loading is all-or-nothing: a short record, trailing bytes, an undecodable
//! key or out-of-order keys fail the whole load.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use crate::error::{OctreeError, Result};
use crate::key::OctreeKey;
use crate::map::SparseOctreeMap;

/// Fixed-width little-endian value encoding for persisted maps.
pub trait OctreeValue: Sized {
  /// Encoded size in bytes.
  const WIDTH: usize;

  /// Write exactly `WIDTH` bytes into `out`.
  fn write_le(&self, out: &mut [u8]);

  /// Decode from exactly `WIDTH` bytes.
  fn read_le(bytes: &[u8]) -> Result<Self>;
}

macro_rules! impl_numeric_value {
  ($($ty:ty),*) => {
    $(
      impl OctreeValue for $ty {
        const WIDTH: usize = std::mem::size_of::<$ty>();

        #[inline]
        fn write_le(&self, out: &mut [u8]) {
          out.copy_from_slice(&self.to_le_bytes());
        }

        #[inline]
        fn read_le(bytes: &[u8]) -> Result<Self> {
          let array = bytes
            .try_into()
            .map_err(|_| OctreeError::format(concat!("bad value width for ", stringify!($ty))))?;
          Ok(<$ty>::from_le_bytes(array))
        }
      }
    )*
  };
}

impl_numeric_value!(u8, u32, i32, f32);

/// Occupancy flags stored as one byte; any non-zero byte reads as occupied.
impl OctreeValue for bool {
  const WIDTH: usize = 1;

  #[inline]
  fn write_le(&self, out: &mut [u8]) {
    out[0] = *self as u8;
  }

  #[inline]
  fn read_le(bytes: &[u8]) -> Result<Self> {
    match bytes {
      [b] => Ok(*b != 0),
      _ => Err(OctreeError::format("bad value width for bool")),
    }
  }
}

const KEY_WIDTH: usize = 4;
const COUNT_WIDTH: usize = 4;

impl<V: OctreeValue> SparseOctreeMap<V> {
  /// Read a map from any byte stream.
  pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
    let mut count_bytes = [0u8; COUNT_WIDTH];
    read_exact_or_format(&mut reader, &mut count_bytes, "entry count")?;
    let count = u32::from_le_bytes(count_bytes) as usize;

    let mut map = SparseOctreeMap::new();
    let mut record = vec![0u8; KEY_WIDTH + V::WIDTH];
    let mut previous: Option<OctreeKey> = None;

    for index in 0..count {
      read_exact_or_format(&mut reader, &mut record, "record")
        .map_err(|e| truncated(e, index, count))?;

      let mut key_bytes = [0u8; KEY_WIDTH];
      key_bytes.copy_from_slice(&record[..KEY_WIDTH]);
      let key = OctreeKey::from_raw(u32::from_le_bytes(key_bytes));
      if !key.is_valid() {
        return Err(OctreeError::format(format!(
          "record {} holds undecodable key {}",
          index, key
        )));
      }
      if previous.is_some_and(|p| p >= key) {
        return Err(OctreeError::format(format!(
          "record {} key {} is not strictly ascending",
          index, key
        )));
      }
      previous = Some(key);

      let value = V::read_le(&record[KEY_WIDTH..])?;
      map.insert(key, value)?;
    }

    let mut probe = [0u8; 1];
    loop {
      match reader.read(&mut probe) {
        Ok(0) => break,
        Ok(_) => {
          return Err(OctreeError::format(format!(
            "declared {} entries but more data follows",
            count
          )))
        }
        Err(e) if e.kind() == ErrorKind::Interrupted => continue,
        Err(e) => return Err(e.into()),
      }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(entries = count, value_width = V::WIDTH, "octree map read");

    Ok(map)
  }

  /// Write the map in ascending key order.
  pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
    let count = u32::try_from(self.len())
      .map_err(|_| OctreeError::format("too many entries for a u32 count"))?;
    writer.write_all(&count.to_le_bytes())?;

    let mut record = vec![0u8; KEY_WIDTH + V::WIDTH];
    for (key, value) in self.iter() {
      record[..KEY_WIDTH].copy_from_slice(&key.raw().to_le_bytes());
      value.write_le(&mut record[KEY_WIDTH..]);
      writer.write_all(&record)?;
    }
    writer.flush()?;
    Ok(())
  }

  /// Load a map from a file.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "octree::load"))]
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let file = File::open(path.as_ref())?;
    Self::read_from(BufReader::new(file))
  }

  /// Save a map to a file, replacing any existing one.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "octree::save"))]
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path.as_ref())?;
    self.write_to(BufWriter::new(file))
  }
}

fn read_exact_or_format<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
  reader.read_exact(buf).map_err(|e| {
    if e.kind() == ErrorKind::UnexpectedEof {
      OctreeError::format(format!("truncated {}", what))
    } else {
      OctreeError::Io(e)
    }
  })
}

fn truncated(err: OctreeError, index: usize, count: usize) -> OctreeError {
  match err {
    OctreeError::Format(_) => OctreeError::format(format!(
      "declared {} entries but only {} complete records",
      count, index
    )),
    other => other,
  }
}

#[cfg(test)]
#[path = "io_test.rs"]
mod io_test;
