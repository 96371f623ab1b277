//! ogn_octree - Sparse octree storage and convolution gather/scatter
//!
//! This crate provides the data plumbing for convolutions over sparse
//! octrees: a compact key per cell, a sorted sparse map from keys to values,
//! neighbor-window queries, and the im2col/col2im pair that moves per-cell
//! features into dense column buffers and back.
//!
//! # Features
//!
//! - **Octree keys**: 32-bit keys with a level sentinel bit, up to level 10
//! - **Sparse maps**: ordered key→value storage with a little-endian binary
//!   file format
//! - **Neighbor windows**: `f³` keys in deterministic raster order
//! - **Gather / scatter**: parallel im2col and scatter-add over a resolved
//!   [`NeighborPlan`], single element or batch
//!
//! # Example
//!
//! ```ignore
//! use ogn_octree::{coarsen, gather, ConvConfig, NeighborPlan, SlotMap};
//!
//! // Level-3 cells with per-cell feature slots.
//! let source = SlotMap::load("level3.oct")?;
//! let query = coarsen(&source)?;
//!
//! let config = ConvConfig::new(16, 2);
//! let plan = NeighborPlan::build(&query, &source, &config)?;
//! let columns = gather(&plan, &features, source.len())?;
//!
//! println!("{} x {} column buffer", columns.rows(), columns.cols());
//! ```

pub mod error;
pub use error::{ErrorCategory, OctreeError, Result};

// Key codec
pub mod key;
pub use key::{OctreeCoord, OctreeKey, INVALID_KEY, MAX_LEVEL};

// Sparse container and its file format
pub mod io;
pub mod map;
pub use io::OctreeValue;
pub use map::{SlotMap, SparseOctreeMap};

// Neighbor windows
pub mod neighbors;
pub use neighbors::{
  for_each_neighbor, neighbors, neighbors_anchored, neighbors_into, window_volume, NeighborList,
  WindowAnchor, MAX_FILTER_SIZE,
};

// Level selection and merging
pub mod levels;
pub use levels::{coarsen, ensure_level, merge_disjoint, select_level};

// Convolution gather/scatter
pub mod conv;
pub use conv::{
  gather, gather_batch, gather_columns, gather_into, scatter, scatter_batch, scatter_columns,
  ColumnBuffer, ConvConfig, Element, NeighborPlan,
};
