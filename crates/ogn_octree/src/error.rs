//! Error types shared by the codec, the container and the convolution engine.
//!
//! Absent keys are not errors anywhere in this crate: lookups return
//! `Option`, and absent neighbors contribute zero during gather.

use thiserror::Error;

/// Broad class of an [`OctreeError`], used by callers to decide whether to
/// drop a batch or stop entirely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
  /// A coordinate, level or key that cannot be encoded or decoded.
  Encoding,
  /// A malformed or unreadable octree file.
  Format,
  /// Buffers, maps and shapes that disagree with each other.
  Consistency,
}

/// Errors produced by octree operations.
#[derive(Error, Debug)]
pub enum OctreeError {
  #[error("coordinate ({x}, {y}, {z}) out of range for level {level}")]
  CoordinateOutOfRange { level: u32, x: u32, y: u32, z: u32 },

  #[error("level {level} exceeds the maximum encodable level {max}")]
  LevelTooDeep { level: u32, max: u32 },

  #[error("{0:#x} is not a valid octree key")]
  InvalidKey(u32),

  #[error("the root key has no parent")]
  RootHasNoParent,

  #[error("octree file I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("malformed octree file: {0}")]
  Format(String),

  #[error("shape mismatch for {what}: expected {expected}, got {actual}")]
  ShapeMismatch {
    what: &'static str,
    expected: usize,
    actual: usize,
  },

  #[error("slot {slot} out of range for a buffer of {pixels} pixels")]
  SlotOutOfRange { slot: usize, pixels: usize },

  #[error("filter size must be at least 1, got {0}")]
  InvalidFilterSize(usize),

  #[error("key {key:#x} is at level {actual}, expected level {expected}")]
  LevelMismatch { key: u32, expected: u32, actual: u32 },

  #[error("key {0:#x} is present in both inputs")]
  DuplicateKey(u32),
}

impl OctreeError {
  /// Which part of the caller contract was violated.
  pub fn category(&self) -> ErrorCategory {
    match self {
      OctreeError::CoordinateOutOfRange { .. }
      | OctreeError::LevelTooDeep { .. }
      | OctreeError::InvalidKey(_)
      | OctreeError::RootHasNoParent => ErrorCategory::Encoding,
      OctreeError::Io(_) | OctreeError::Format(_) => ErrorCategory::Format,
      OctreeError::ShapeMismatch { .. }
      | OctreeError::SlotOutOfRange { .. }
      | OctreeError::InvalidFilterSize(_)
      | OctreeError::LevelMismatch { .. }
      | OctreeError::DuplicateKey(_) => ErrorCategory::Consistency,
    }
  }

  pub(crate) fn format(msg: impl Into<String>) -> Self {
    OctreeError::Format(msg.into())
  }
}

pub type Result<T> = std::result::Result<T, OctreeError>;
