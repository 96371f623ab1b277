//! Gather/scatter benchmarks over random sparse levels.
//!
//! Each workload coarsens a random level-6 occupancy (64³ cells) and builds
//! 2x2x2 corner windows from the coarse cells, the layout used by
//! downsampling convolutions. Densities sweep from surface-like to
//! half-full.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ogn_octree::{
  coarsen, gather, neighbors, scatter, ColumnBuffer, ConvConfig, NeighborPlan, OctreeKey, SlotMap,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const LEVEL: u32 = 6;
const CHANNELS: usize = 8;
const DENSITIES: [f64; 3] = [0.02, 0.1, 0.5];

fn random_level(density: f64) -> SlotMap {
  let mut rng = StdRng::seed_from_u64(42);
  let res = 1u32 << LEVEL;
  let mut keys = Vec::new();
  for x in 0..res {
    for y in 0..res {
      for z in 0..res {
        if rng.random_bool(density) {
          keys.push(OctreeKey::encode(LEVEL, x, y, z).unwrap());
        }
      }
    }
  }
  SlotMap::from_keys(keys).unwrap()
}

// =============================================================================
// Neighbor queries
// =============================================================================

fn bench_neighbors(c: &mut Criterion) {
  let mut group = c.benchmark_group("neighbors");
  let key = OctreeKey::encode(LEVEL, 17, 33, 9).unwrap();

  for filter_size in [2usize, 3, 5] {
    group.throughput(Throughput::Elements((filter_size * filter_size * filter_size) as u64));
    group.bench_with_input(BenchmarkId::from_parameter(filter_size), &filter_size, |b, &f| {
      b.iter(|| black_box(neighbors(black_box(key), f).unwrap()))
    });
  }

  group.finish();
}

// =============================================================================
// Plan construction
// =============================================================================

fn bench_plan_build(c: &mut Criterion) {
  let mut group = c.benchmark_group("plan_build");

  for density in DENSITIES {
    let source = random_level(density);
    let query = coarsen(&source).unwrap();
    let config = ConvConfig::new(CHANNELS, 2);

    group.throughput(Throughput::Elements(query.len() as u64));
    group.bench_with_input(BenchmarkId::from_parameter(density), &density, |b, _| {
      b.iter(|| black_box(NeighborPlan::build(&query, &source, &config).unwrap()))
    });
  }

  group.finish();
}

// =============================================================================
// Gather / scatter
// =============================================================================

fn bench_gather_scatter(c: &mut Criterion) {
  let mut group = c.benchmark_group("gather_scatter");

  for density in DENSITIES {
    let source = random_level(density);
    let query = coarsen(&source).unwrap();
    let plan = NeighborPlan::build(&query, &source, &ConvConfig::new(CHANNELS, 2)).unwrap();
    let pixels = source.len();
    let features: Vec<f32> = (0..CHANNELS * pixels).map(|i| (i % 97) as f32).collect();
    let mut columns = ColumnBuffer::<f32>::zeros(plan.row_count(), plan.column_count());
    let mut grad = vec![0.0f32; features.len()];

    group.throughput(Throughput::Elements((plan.row_count() * plan.column_count()) as u64));

    group.bench_with_input(BenchmarkId::new("gather", density), &density, |b, _| {
      b.iter(|| {
        ogn_octree::gather_into(&plan, &features, pixels, &mut columns).unwrap();
        black_box(columns.as_slice()[0])
      })
    });

    let gathered = gather(&plan, &features, pixels).unwrap();
    group.bench_with_input(BenchmarkId::new("scatter", density), &density, |b, _| {
      b.iter(|| {
        grad.fill(0.0);
        scatter(&plan, &gathered, &mut grad, pixels).unwrap();
        black_box(grad[0])
      })
    });
  }

  group.finish();
}

criterion_group!(benches, bench_neighbors, bench_plan_build, bench_gather_scatter);
criterion_main!(benches);
