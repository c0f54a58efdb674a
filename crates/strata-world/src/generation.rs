//! Procedural terrain generation.
//!
//! Column heights are the sum of independently scaled noise octaves: a
//! continental swell, regional variation, fine detail, and strong hills that
//! only appear where a separate mask field crosses a threshold.

use noise::NoiseFn;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strata_core::constants::{CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH};
use strata_core::{BlockType, ChunkCoord};
use strata_voxel::Chunk;

use crate::biome::{BiomeConfig, BiomeType};
use crate::perlin::{smoothstep, PermutationNoise};
use crate::WorldSeed;

/// One independently scaled noise contribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Octave {
    /// Horizontal frequency.
    pub scale: f64,
    /// Output multiplier.
    pub amplitude: f64,
    /// Offset added to the scaled (x, z) sample position.
    pub offset: [f64; 2],
}

impl Octave {
    /// Create an octave sampled at `(x * scale + offset.0, z * scale + offset.1)`.
    pub const fn new(scale: f64, amplitude: f64, offset: [f64; 2]) -> Self {
        Self {
            scale,
            amplitude,
            offset,
        }
    }

    /// Raw noise value in `[-1, 1]`.
    #[inline]
    pub fn sample<N: NoiseFn<f64, 2>>(&self, noise: &N, world_x: i32, world_z: i32) -> f64 {
        noise.get([
            f64::from(world_x) * self.scale + self.offset[0],
            f64::from(world_z) * self.scale + self.offset[1],
        ])
    }
}

/// Terrain generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Seed for the noise permutation.
    pub seed: WorldSeed,
    /// Surface height with every octave at zero.
    pub base_height: f64,
    /// Continental-scale undulation.
    pub macro_octave: Octave,
    /// Regional variation.
    pub regional_octave: Octave,
    /// Fine roughness.
    pub detail_octave: Octave,
    /// Strong relief, scaled by the hill mask. Only raises terrain.
    pub hill_octave: Octave,
    /// Field gating where hills appear. Amplitude is unused.
    pub hill_mask_octave: Octave,
    /// Normalized mask value where hills start.
    pub hill_mask_threshold: f64,
    /// Width of the mask ramp above the threshold.
    pub hill_mask_feather: f64,
    /// Thinnest soil layer on ordinary terrain.
    pub min_dirt_depth: i32,
    /// Thickest soil layer.
    pub max_dirt_depth: i32,
    /// Fraction of the regional amplitude above the macro surface where soil starts thinning.
    pub stone_threshold_factor: f64,
    /// Biome field parameters.
    pub biome: BiomeConfig,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            base_height: 48.0,
            macro_octave: Octave::new(0.0012, 20.0, [0.0, 0.0]),
            regional_octave: Octave::new(0.0035, 6.0, [37.0, -91.0]),
            detail_octave: Octave::new(0.05, 2.0, [-120.0, 53.0]),
            hill_octave: Octave::new(0.07, 14.0, [777.0, -333.0]),
            hill_mask_octave: Octave::new(0.010, 1.0, [200.0, 200.0]),
            hill_mask_threshold: 0.62,
            hill_mask_feather: 0.08,
            min_dirt_depth: 2,
            max_dirt_depth: 5,
            stone_threshold_factor: 0.8,
            biome: BiomeConfig::default(),
        }
    }
}

/// Height and soil depth of a single world column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnProfile {
    /// Y of the grass block, in `[0, CHUNK_HEIGHT - 1]`.
    pub height: i32,
    /// Number of dirt blocks directly below the grass.
    pub dirt_depth: i32,
}

impl ColumnProfile {
    /// Block at height `y` in this column.
    #[inline]
    pub const fn block_at(&self, y: i32) -> BlockType {
        if y > self.height {
            BlockType::Air
        } else if y == self.height {
            BlockType::Grass
        } else if y >= self.height - self.dirt_depth {
            BlockType::Dirt
        } else {
            BlockType::Stone
        }
    }
}

/// Procedural terrain generator.
///
/// Generic over the 2-D noise source; the default is the seeded
/// [`PermutationNoise`].
#[derive(Debug, Clone)]
pub struct TerrainGenerator<N = PermutationNoise> {
    config: TerrainConfig,
    noise: N,
}

impl TerrainGenerator<PermutationNoise> {
    /// Create a new terrain generator with the given configuration.
    pub fn new(config: TerrainConfig) -> Self {
        let noise = PermutationNoise::new(config.seed);
        Self { config, noise }
    }

    /// Create a terrain generator with default configuration.
    pub fn with_seed(seed: WorldSeed) -> Self {
        Self::new(TerrainConfig {
            seed,
            ..Default::default()
        })
    }
}

impl<N: NoiseFn<f64, 2>> TerrainGenerator<N> {
    /// Create a generator over an arbitrary noise source.
    pub const fn with_noise(config: TerrainConfig, noise: N) -> Self {
        Self { config, noise }
    }

    /// Get the terrain configuration.
    pub const fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Get the noise source.
    pub const fn noise(&self) -> &N {
        &self.noise
    }

    /// Height and soil depth at a world column.
    pub fn column_profile(&self, world_x: i32, world_z: i32) -> ColumnProfile {
        let c = &self.config;
        let noise = &self.noise;

        let macro_offset = c.macro_octave.sample(noise, world_x, world_z) * c.macro_octave.amplitude;
        let region_offset =
            c.regional_octave.sample(noise, world_x, world_z) * c.regional_octave.amplitude;

        let mask = (c.hill_mask_octave.sample(noise, world_x, world_z) + 1.0) * 0.5;
        let hill_mask = smoothstep(
            c.hill_mask_threshold,
            c.hill_mask_threshold + c.hill_mask_feather,
            mask,
        );

        let detail_offset =
            c.detail_octave.sample(noise, world_x, world_z) * c.detail_octave.amplitude;

        let hill_amp = c.hill_octave.amplitude;
        let hill_up = (c.hill_octave.sample(noise, world_x, world_z) + 1.0) * 0.5 * hill_amp;
        let hill_offset = hill_up * hill_mask;

        let raw = c.base_height + macro_offset + region_offset + detail_offset + hill_offset;
        let height = (raw as i32).clamp(0, CHUNK_HEIGHT as i32 - 1);

        // Rough columns get thicker soil.
        let variation = detail_offset.abs() + hill_mask * 0.5 * hill_amp;
        let norm = (variation / (hill_amp + c.detail_octave.amplitude)).clamp(0.0, 1.0);
        let mut dirt_depth =
            c.min_dirt_depth + (norm * f64::from(c.max_dirt_depth - c.min_dirt_depth)) as i32;

        // Exposed high ground gets thinner soil.
        let stone_threshold = (c.base_height
            + macro_offset
            + c.regional_octave.amplitude * c.stone_threshold_factor) as i32;
        if height > stone_threshold {
            dirt_depth = (dirt_depth - (height - stone_threshold) / 2).max(1);
        }
        dirt_depth = dirt_depth.min(height);

        ColumnProfile { height, dirt_depth }
    }

    /// Get terrain height at world XZ coordinates.
    pub fn height_at(&self, world_x: i32, world_z: i32) -> i32 {
        self.column_profile(world_x, world_z).height
    }

    /// Biome at world XZ coordinates.
    pub fn biome_at(&self, world_x: i32, world_z: i32) -> BiomeType {
        self.config.biome.classify(&self.noise, world_x, world_z)
    }

    /// Fill every column of `chunk` from the height profile.
    ///
    /// Overwrites all cells, so running it twice yields the same blocks.
    pub fn generate_terrain(&self, chunk: &mut Chunk) {
        let origin = chunk.coord().to_world_pos();
        for x in 0..CHUNK_WIDTH {
            for z in 0..CHUNK_DEPTH {
                let profile = self.column_profile(origin.x + x as i32, origin.z + z as i32);
                for y in 0..CHUNK_HEIGHT {
                    chunk.set(x, y, z, profile.block_at(y as i32));
                }
            }
        }
    }

    /// Generate a fresh chunk at the given position.
    pub fn generate_chunk(&self, coord: ChunkCoord) -> Chunk {
        let mut chunk = Chunk::new(coord);
        self.generate_terrain(&mut chunk);
        chunk
    }
}

impl<N: NoiseFn<f64, 2> + Sync> TerrainGenerator<N> {
    /// Generate multiple chunks in parallel.
    pub fn generate_chunks_parallel(&self, coords: &[ChunkCoord]) -> Vec<Chunk> {
        coords
            .par_iter()
            .map(|&coord| self.generate_chunk(coord))
            .collect()
    }
}
