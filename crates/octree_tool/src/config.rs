//! Tool configuration: optional TOML file, overridden by command-line flags.

use anyhow::{Context, Result};
use clap::ValueEnum;
use ogn_octree::{WindowAnchor, MAX_FILTER_SIZE};
use serde::Deserialize;
use std::path::Path;

/// Value type stored in the octree files the tool reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
  /// One occupancy byte per cell.
  #[default]
  U8,
  /// One byte, non-zero reads as occupied.
  Bool,
  U32,
  I32,
  F32,
}

/// Placement of the neighbor window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
  #[default]
  Corner,
  Centered,
}

impl From<Anchor> for WindowAnchor {
  fn from(anchor: Anchor) -> Self {
    match anchor {
      Anchor::Corner => WindowAnchor::Corner,
      Anchor::Centered => WindowAnchor::Centered,
    }
  }
}

/// Root configuration for the octree tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
  /// Value type of input files.
  pub value_type: ValueType,
  /// Neighbor window edge length.
  pub filter_size: usize,
  /// Neighbor window placement.
  pub anchor: Anchor,
}

impl Default for ToolConfig {
  fn default() -> Self {
    Self {
      value_type: ValueType::U8,
      filter_size: 2,
      anchor: Anchor::Corner,
    }
  }
}

impl ToolConfig {
  /// Load configuration from a TOML file.
  pub fn load(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    Self::parse(&content)
  }

  /// Parse and validate TOML text. Missing keys take their defaults.
  pub fn parse(content: &str) -> Result<Self> {
    let config: ToolConfig = toml::from_str(content).context("Failed to parse config TOML")?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if self.filter_size == 0 || self.filter_size > MAX_FILTER_SIZE {
      anyhow::bail!(
        "filter_size must be between 1 and {}, got {}",
        MAX_FILTER_SIZE,
        self.filter_size
      );
    }
    Ok(())
  }

  /// Apply command-line overrides on top of file values.
  pub fn with_overrides(
    mut self,
    value_type: Option<ValueType>,
    filter_size: Option<usize>,
    anchor: Option<Anchor>,
  ) -> Result<Self> {
    if let Some(value_type) = value_type {
      self.value_type = value_type;
    }
    if let Some(filter_size) = filter_size {
      self.filter_size = filter_size;
    }
    if let Some(anchor) = anchor {
      self.anchor = anchor;
    }
    self.validate()?;
    Ok(self)
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
