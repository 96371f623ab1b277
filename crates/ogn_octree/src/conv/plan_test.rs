use super::super::test_utils::two_cell_level;
use super::*;
use crate::key::OctreeKey;
use crate::levels::coarsen;
use crate::neighbors::{neighbors, WindowAnchor};

fn key(level: u32, x: u32, y: u32, z: u32) -> OctreeKey {
  OctreeKey::encode(level, x, y, z).unwrap()
}

// =========================================================================
// Plan construction
// =========================================================================

/// The two-cell fixture coarsens to one query whose 8-entry window finds
/// slots 0 and 1 at the (0,0,0) and (1,1,1) raster positions.
#[test]
fn test_plan_two_cell_fixture() {
  let source = two_cell_level();
  let query = coarsen(&source).unwrap();
  let plan = NeighborPlan::build(&query, &source, &ConvConfig::default()).unwrap();

  assert_eq!(plan.query_count(), 1);
  assert_eq!(plan.column_count(), 1);
  assert_eq!(plan.window_volume(), 8);
  assert_eq!(plan.row_count(), 8);

  let column = plan.column(0).unwrap();
  assert_eq!(column[0], Some(0), "entry (0,0,0)");
  assert_eq!(column[7], Some(1), "entry (1,1,1)");
  assert_eq!(column.iter().filter(|s| s.is_none()).count(), 6);
  assert_eq!(plan.hit_count(), 2);
  assert_eq!(plan.source_extent(), 2);
}

/// Each plan entry matches a direct neighbor lookup on the source map.
#[test]
fn test_plan_matches_neighbor_lookup() {
  let source = SlotMap::from_keys([
    key(3, 0, 0, 0),
    key(3, 1, 0, 1),
    key(3, 2, 2, 2),
    key(3, 3, 3, 2),
    key(3, 7, 7, 7),
  ])
  .unwrap();
  let query = coarsen(&source).unwrap();
  let config = ConvConfig::new(2, 3);
  let plan = NeighborPlan::build(&query, &source, &config).unwrap();

  for (j, q) in query.keys().enumerate() {
    let window = neighbors(q.first_child().unwrap(), 3).unwrap();
    for (e, n) in window.iter().enumerate() {
      assert_eq!(
        plan.entry(j, e),
        source.slot(*n),
        "query {} entry {} ({:?})",
        j,
        e,
        n
      );
    }
  }
}

/// Reference counts sum to the hit count.
#[test]
fn test_slot_references_sum_to_hits() {
  let source = SlotMap::from_keys([key(2, 1, 1, 1), key(2, 2, 2, 2), key(2, 1, 2, 1)]).unwrap();
  let query = coarsen(&source).unwrap();
  let config = ConvConfig {
    channels: 1,
    filter_size: 3,
    anchor: WindowAnchor::Centered,
  };
  let plan = NeighborPlan::build(&query, &source, &config).unwrap();

  let refs = plan.slot_references();
  assert_eq!(refs.len(), plan.source_extent());
  assert_eq!(refs.iter().sum::<usize>(), plan.hit_count());
}

/// An empty query map gives an empty plan.
#[test]
fn test_empty_query() {
  let plan = NeighborPlan::build(&SlotMap::new(), &two_cell_level(), &ConvConfig::default()).unwrap();
  assert_eq!(plan.query_count(), 0);
  assert_eq!(plan.source_extent(), 0);
  assert!(plan.column(0).is_none());
}

// =========================================================================
// Contract violations
// =========================================================================

/// Filter size 0 is rejected before any lookup.
#[test]
fn test_zero_filter_rejected() {
  let source = two_cell_level();
  let query = coarsen(&source).unwrap();
  let err = NeighborPlan::build(&query, &source, &ConvConfig::new(1, 0)).unwrap_err();
  assert!(matches!(err, OctreeError::InvalidFilterSize(0)));
}

/// An oversized filter is a typed error, not an overflow or a huge allocation.
#[test]
fn test_oversized_filter_rejected() {
  let source = two_cell_level();
  let query = coarsen(&source).unwrap();
  let err = NeighborPlan::build(&query, &source, &ConvConfig::new(1, 3_000_000)).unwrap_err();
  assert!(matches!(err, OctreeError::InvalidFilterSize(3_000_000)));

  let err = NeighborPlan::build(&query, &source, &ConvConfig::new(usize::MAX, 2)).unwrap_err();
  assert!(matches!(err, OctreeError::InvalidFilterSize(2)));
}

/// A source map at the query's own level is a level mismatch, not an
/// all-miss plan.
#[test]
fn test_source_at_query_level_rejected() {
  let query = SlotMap::from_keys([key(1, 0, 0, 0)]).unwrap();
  let source = SlotMap::from_keys([key(1, 0, 0, 0), key(1, 1, 1, 1)]).unwrap();
  let err = NeighborPlan::build(&query, &source, &ConvConfig::default()).unwrap_err();
  assert!(matches!(
    err,
    OctreeError::LevelMismatch {
      expected: 2,
      actual: 1,
      ..
    }
  ));
}

/// Query keys must all sit at one level.
#[test]
fn test_mixed_query_levels_rejected() {
  let query = SlotMap::from_keys([key(1, 0, 0, 0), key(2, 3, 3, 3)]).unwrap();
  let err = NeighborPlan::build(&query, &two_cell_level(), &ConvConfig::default()).unwrap_err();
  assert!(matches!(
    err,
    OctreeError::LevelMismatch {
      expected: 1,
      actual: 2,
      ..
    }
  ));
}

/// An empty source map at any level is accepted; every entry misses.
#[test]
fn test_empty_source_accepted() {
  let query = SlotMap::from_keys([key(1, 0, 0, 0)]).unwrap();
  let plan = NeighborPlan::build(&query, &SlotMap::new(), &ConvConfig::default()).unwrap();
  assert_eq!(plan.hit_count(), 0);
}

/// Queries at the deepest level have no child level to search.
#[test]
fn test_deepest_query_rejected() {
  let query = SlotMap::from_keys([key(MAX_LEVEL, 0, 0, 0)]).unwrap();
  let err = NeighborPlan::build(&query, &SlotMap::new(), &ConvConfig::default()).unwrap_err();
  assert!(matches!(err, OctreeError::LevelTooDeep { .. }));
}

/// Padding cannot shrink below the query count.
#[test]
fn test_with_columns_bounds() {
  let source = SlotMap::from_keys([key(2, 0, 0, 0), key(2, 3, 3, 3)]).unwrap();
  let query = coarsen(&source).unwrap();
  let plan = NeighborPlan::build(&query, &source, &ConvConfig::default()).unwrap();
  assert_eq!(plan.query_count(), 2);

  assert!(plan.clone().with_columns(1).is_err());
  assert_eq!(plan.with_columns(5).unwrap().column_count(), 5);
}

// =========================================================================
// Batches
// =========================================================================

/// Batch plans are padded to the widest element.
#[test]
fn test_build_batch_pads_columns() {
  let a = SlotMap::from_keys([key(2, 0, 0, 0)]).unwrap();
  let b = SlotMap::from_keys([key(2, 0, 0, 0), key(2, 2, 0, 0), key(2, 0, 2, 0)]).unwrap();
  let queries = vec![coarsen(&a).unwrap(), coarsen(&b).unwrap()];
  let sources = vec![a, b];

  let plans = NeighborPlan::build_batch(&queries, &sources, &ConvConfig::default()).unwrap();
  assert_eq!(plans.len(), 2);
  assert_eq!(plans[0].query_count(), 1);
  assert_eq!(plans[1].query_count(), 3);
  assert!(plans.iter().all(|p| p.column_count() == 3));
}

/// Mismatched batch lengths are a consistency error.
#[test]
fn test_build_batch_length_mismatch() {
  let queries = vec![SlotMap::new(), SlotMap::new()];
  let sources = vec![SlotMap::new()];
  assert!(matches!(
    NeighborPlan::build_batch(&queries, &sources, &ConvConfig::default()),
    Err(OctreeError::ShapeMismatch { .. })
  ));
}
