//! Biome classification from large-scale noise.

use noise::NoiseFn;
use serde::{Deserialize, Serialize};

/// Terrain flavour at a world column. Derived on demand, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiomeType {
    Plains,
    Forest,
}

/// Biome noise parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomeConfig {
    /// Horizontal frequency of the biome field.
    pub scale: f64,
    /// Offset added to both sample coordinates, decorrelating from terrain.
    pub offset: f64,
    /// Normalized noise value at and above which a column is forest.
    pub forest_threshold: f64,
}

impl Default for BiomeConfig {
    fn default() -> Self {
        Self {
            scale: 0.0015,
            offset: 500.0,
            forest_threshold: 0.5,
        }
    }
}

impl BiomeConfig {
    /// Classify the biome at a world column.
    pub fn classify<N: NoiseFn<f64, 2>>(&self, noise: &N, world_x: i32, world_z: i32) -> BiomeType {
        let n = noise.get([
            f64::from(world_x) * self.scale + self.offset,
            f64::from(world_z) * self.scale + self.offset,
        ]);
        if (n + 1.0) * 0.5 < self.forest_threshold {
            BiomeType::Plains
        } else {
            BiomeType::Forest
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perlin::PermutationNoise;
    use noise::Constant;

    #[test]
    fn threshold_splits_biomes() {
        let config = BiomeConfig::default();
        assert_eq!(config.classify(&Constant::new(-0.2), 0, 0), BiomeType::Plains);
        assert_eq!(config.classify(&Constant::new(0.0), 0, 0), BiomeType::Forest);
        assert_eq!(config.classify(&Constant::new(0.7), 0, 0), BiomeType::Forest);
    }

    #[test]
    fn biome_is_a_pure_function() {
        let config = BiomeConfig::default();
        let noise = PermutationNoise::new(42);
        for x in (-2000..2000).step_by(137) {
            for z in (-2000..2000).step_by(211) {
                assert_eq!(
                    config.classify(&noise, x, z),
                    config.classify(&noise, x, z)
                );
            }
        }
    }

    #[test]
    fn both_biomes_occur() {
        let config = BiomeConfig::default();
        let noise = PermutationNoise::new(42);
        let forests = (0..400)
            .filter(|i| config.classify(&noise, i * 25, i * 13) == BiomeType::Forest)
            .count();
        assert!(forests > 0 && forests < 400, "forest columns: {forests}");
    }
}
