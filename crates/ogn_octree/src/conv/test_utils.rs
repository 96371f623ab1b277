//! Fixtures for convolution tests: random occupied levels and feature
//! buffers with recognizable values.

use rand::Rng;

use crate::key::OctreeKey;
use crate::map::SlotMap;

/// Random set of occupied cells at `level`, each with probability `density`.
/// Never empty.
pub fn random_level(rng: &mut impl Rng, level: u32, density: f64) -> SlotMap {
  let res = 1u32 << level;
  let mut keys = Vec::new();
  for x in 0..res {
    for y in 0..res {
      for z in 0..res {
        if rng.random_bool(density) {
          keys.push(OctreeKey::encode(level, x, y, z).unwrap());
        }
      }
    }
  }
  if keys.is_empty() {
    keys.push(OctreeKey::encode(level, 0, 0, 0).unwrap());
  }
  SlotMap::from_keys(keys).unwrap()
}

/// Feature value encoding its position: `1000 * (channel + 1) + slot`.
pub fn tagged_features(channels: usize, pixels: usize) -> Vec<f32> {
  (0..channels)
    .flat_map(|ch| (0..pixels).map(move |slot| (1000 * (ch + 1) + slot) as f32))
    .collect()
}

/// Uniform random values in [-1, 1).
pub fn random_values(rng: &mut impl Rng, len: usize) -> Vec<f64> {
  (0..len).map(|_| rng.random_range(-1.0..1.0)).collect()
}

/// Two-cell level-2 fixture: (0,0,0) -> slot 0, (1,1,1) -> slot 1.
pub fn two_cell_level() -> SlotMap {
  SlotMap::from_keys([
    OctreeKey::encode(2, 0, 0, 0).unwrap(),
    OctreeKey::encode(2, 1, 1, 1).unwrap(),
  ])
  .unwrap()
}
