//! Subcommand bodies. Each writes its report to `out` so tests can capture it.

use anyhow::{Context, Result};
use ogn_octree::{
  coarsen, neighbors_anchored, select_level, OctreeKey, OctreeValue, SlotMap, SparseOctreeMap,
  INVALID_KEY, MAX_LEVEL,
};
use std::fmt;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::config::ToolConfig;

/// Values the tool can print and test for occupancy.
pub trait CellValue: OctreeValue + fmt::Display + Default + PartialEq {}

impl<T> CellValue for T where T: OctreeValue + fmt::Display + Default + PartialEq {}

pub fn load<V: OctreeValue>(path: &Path) -> Result<SparseOctreeMap<V>> {
  let map = SparseOctreeMap::<V>::load(path)
    .with_context(|| format!("Failed to load octree file: {}", path.display()))?;
  info!(path = %path.display(), entries = map.len(), "loaded octree");
  Ok(map)
}

fn save(map: &SlotMap, path: &Path) -> Result<()> {
  map
    .save(path)
    .with_context(|| format!("Failed to write octree file: {}", path.display()))?;
  info!(path = %path.display(), entries = map.len(), "wrote octree");
  Ok(())
}

/// One line per entry: 32-bit key in binary, level, coordinates, value.
pub fn dump<V: CellValue>(map: &SparseOctreeMap<V>, out: &mut impl Write) -> Result<()> {
  for (key, value) in map {
    let coord = key.decode()?;
    writeln!(
      out,
      "{:032b} level={} ({}, {}, {}) {}",
      key.raw(),
      coord.level,
      coord.x,
      coord.y,
      coord.z,
      value
    )?;
  }
  Ok(())
}

/// Entry count, occupied levels and non-default value count.
pub fn stats<V: CellValue>(map: &SparseOctreeMap<V>, out: &mut impl Write) -> Result<()> {
  writeln!(out, "entries: {}", map.len())?;
  let occupied = map.values().filter(|v| **v != V::default()).count();
  writeln!(out, "non-zero: {}", occupied)?;
  for (level, count) in map.level_histogram().iter().enumerate() {
    if *count > 0 {
      writeln!(out, "level {:2}: {}", level, count)?;
    }
  }
  Ok(())
}

/// Write the parent level of `input` as a slot map. Returns its size.
pub fn coarsen_file<V: OctreeValue>(input: &Path, output: &Path) -> Result<usize> {
  let map = load::<V>(input)?;
  let parents = coarsen(&map).context("Failed to coarsen")?;
  save(&parents, output)?;
  Ok(parents.len())
}

/// Write the non-zero cells of one level of `input` as a slot map.
pub fn select_file<V: CellValue>(input: &Path, output: &Path, level: u32) -> Result<usize> {
  if level > MAX_LEVEL {
    anyhow::bail!("level must be at most {}, got {}", MAX_LEVEL, level);
  }
  let map = load::<V>(input)?;
  let selected = select_level(&map, level, |v| *v != V::default())?;
  save(&selected, output)?;
  Ok(selected.len())
}

/// Print the neighbor window of one cell, one entry per line in raster order.
pub fn print_neighbors(key: OctreeKey, config: &ToolConfig, out: &mut impl Write) -> Result<()> {
  let window = neighbors_anchored(key, config.filter_size, config.anchor.into())?;
  writeln!(out, "{:?} filter={} anchor={:?}", key, config.filter_size, config.anchor)?;
  for (index, neighbor) in window.iter().enumerate() {
    if *neighbor == INVALID_KEY {
      writeln!(out, "{:3} invalid", index)?;
      continue;
    }
    let coord = neighbor.decode()?;
    writeln!(
      out,
      "{:3} {:032b} ({}, {}, {})",
      index,
      neighbor.raw(),
      coord.x,
      coord.y,
      coord.z
    )?;
  }
  Ok(())
}

#[cfg(test)]
#[path = "commands_test.rs"]
mod commands_test;
