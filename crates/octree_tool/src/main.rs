//! Octree file inspector.
//!
//! Reads the sparse octree binary format (u32 count, then ascending
//! key/value records) and prints keys, per-level statistics and neighbor
//! windows, or derives coarser and level-filtered slot maps from a file.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ogn_octree::OctreeKey;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use config::{Anchor, ToolConfig, ValueType};

/// Inspect and transform sparse octree files.
#[derive(Parser, Debug)]
#[command(name = "octree_tool")]
#[command(about = "Inspect and transform sparse octree files")]
struct Args {
  /// Path to configuration TOML file.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Value type stored in input files (overrides the config file).
  #[arg(long, value_enum)]
  value_type: Option<ValueType>,

  /// Neighbor window edge length (overrides the config file).
  #[arg(short, long)]
  filter_size: Option<usize>,

  /// Neighbor window placement (overrides the config file).
  #[arg(long, value_enum)]
  anchor: Option<Anchor>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print every key in binary with its level, coordinates and value.
  Dump { input: PathBuf },
  /// Print entry count and per-level key counts.
  Stats { input: PathBuf },
  /// Write the parent level of a file as a slot map.
  Coarsen { input: PathBuf, output: PathBuf },
  /// Write the non-zero cells of one level as a slot map.
  Select {
    input: PathBuf,
    output: PathBuf,
    #[arg(short, long)]
    level: u32,
  },
  /// Print the neighbor window of one cell.
  Neighbors { level: u32, x: u32, y: u32, z: u32 },
}

/// Run `$body` with `V` bound to the Rust type of a [`ValueType`].
macro_rules! with_value_type {
  ($value_type:expr, $v:ident => $body:expr) => {
    match $value_type {
      ValueType::U8 => {
        type $v = u8;
        $body
      }
      ValueType::Bool => {
        type $v = bool;
        $body
      }
      ValueType::U32 => {
        type $v = u32;
        $body
      }
      ValueType::I32 => {
        type $v = i32;
        $body
      }
      ValueType::F32 => {
        type $v = f32;
        $body
      }
    }
  };
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let file_config = match &args.config {
    Some(path) => {
      info!(path = %path.display(), "loading config");
      ToolConfig::load(path)?
    }
    None => ToolConfig::default(),
  };
  let config = file_config.with_overrides(args.value_type, args.filter_size, args.anchor)?;
  debug!(?config, "effective config");

  let stdout = std::io::stdout();
  let mut out = stdout.lock();

  match args.command {
    Command::Dump { input } => with_value_type!(config.value_type, V => {
      let map = commands::load::<V>(&input)?;
      commands::dump(&map, &mut out)?;
    }),
    Command::Stats { input } => with_value_type!(config.value_type, V => {
      let map = commands::load::<V>(&input)?;
      commands::stats(&map, &mut out)?;
    }),
    Command::Coarsen { input, output } => {
      let written = with_value_type!(config.value_type, V => commands::coarsen_file::<V>(&input, &output)?);
      info!(entries = written, "coarsened");
    }
    Command::Select { input, output, level } => {
      let written =
        with_value_type!(config.value_type, V => commands::select_file::<V>(&input, &output, level)?);
      info!(level, entries = written, "selected level");
    }
    Command::Neighbors { level, x, y, z } => {
      let key = OctreeKey::encode(level, x, y, z)?;
      commands::print_neighbors(key, &config, &mut out)?;
    }
  }

  out.flush()?;
  Ok(())
}
