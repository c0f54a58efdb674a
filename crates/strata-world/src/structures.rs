//! Tree placement.
//!
//! Trees are stamped onto a chunk after its terrain exists. A tree rooted near
//! a chunk edge writes trunk and leaves into loaded neighbors through
//! [`ChunkManager::set_block_world`]; writes into unloaded chunks are dropped,
//! so canopies can be clipped at the edge of loaded space.

use std::collections::BTreeSet;

use noise::NoiseFn;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use strata_core::constants::{CHUNK_DEPTH, CHUNK_WIDTH};
use strata_core::{Block, BlockType, ChunkCoord, Error, Result, WorldPos};

use crate::biome::BiomeType;
use crate::chunk_manager::ChunkManager;
use crate::generation::TerrainGenerator;
use crate::WorldSeed;

/// Where tree randomness comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeSeeding {
    /// Derived from a fixed seed and the chunk coordinate. Reproducible for
    /// the same seed and the same observer path; canopies spilling over a
    /// chunk edge can suppress a neighbor's trees, so the stamping order
    /// still shapes the forest.
    PerWorld(WorldSeed),
    /// A fresh seed drawn from OS entropy when the generator is built.
    PerRun,
}

impl Default for TreeSeeding {
    fn default() -> Self {
        Self::PerWorld(0)
    }
}

/// Tree placement parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    pub seeding: TreeSeeding,
    /// Per-column placement chance in forest.
    pub forest_chance: f64,
    /// Per-column placement chance in plains.
    pub plains_chance: f64,
    pub min_trunk_height: i32,
    pub max_trunk_height: i32,
    /// Half-width of the square leaf layers.
    pub canopy_radius: i32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            seeding: TreeSeeding::default(),
            forest_chance: 0.08,
            plains_chance: 0.005,
            min_trunk_height: 4,
            max_trunk_height: 6,
            canopy_radius: 2,
        }
    }
}

impl TreeConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.forest_chance) || !(0.0..=1.0).contains(&self.plains_chance) {
            return Err(Error::InvalidConfig(
                "tree chances must lie in [0, 1]".to_string(),
            ));
        }
        if self.min_trunk_height < 1 || self.max_trunk_height < self.min_trunk_height {
            return Err(Error::InvalidConfig(format!(
                "invalid trunk height range {}..={}",
                self.min_trunk_height, self.max_trunk_height
            )));
        }
        if self.canopy_radius < 0 {
            return Err(Error::InvalidConfig(
                "canopy radius must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Placement chance for a biome.
    pub const fn chance(&self, biome: BiomeType) -> f64 {
        match biome {
            BiomeType::Forest => self.forest_chance,
            BiomeType::Plains => self.plains_chance,
        }
    }
}

const TOPPER_OFFSETS: [(i32, i32); 5] = [(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)];

/// Stamps trees onto chunks.
#[derive(Debug, Clone)]
pub struct TreeGenerator {
    config: TreeConfig,
    seed: u64,
}

impl Default for TreeGenerator {
    fn default() -> Self {
        Self {
            config: TreeConfig::default(),
            seed: 0,
        }
    }
}

impl TreeGenerator {
    /// Create a generator, resolving the seeding policy once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` fails validation.
    pub fn new(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let seed = match config.seeding {
            TreeSeeding::PerWorld(seed) => seed,
            TreeSeeding::PerRun => rand::random(),
        };
        Ok(Self { config, seed })
    }

    pub const fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Seed the per-chunk streams derive from.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// RNG stream for a chunk.
    pub fn chunk_rng(&self, coord: ChunkCoord) -> ChaCha8Rng {
        let key = (u64::from(coord.x as u32) << 32) | u64::from(coord.z as u32);
        ChaCha8Rng::seed_from_u64(self.seed ^ key.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    /// Stamp trees onto the chunk at `coord`.
    ///
    /// Returns every chunk coordinate whose blocks may have changed,
    /// including `coord` itself. Each of them has been marked mesh-dirty.
    /// A chunk is only ever processed once; later calls return an empty set.
    pub fn generate_trees<N: NoiseFn<f64, 2>>(
        &self,
        coord: ChunkCoord,
        manager: &mut ChunkManager,
        terrain: &TerrainGenerator<N>,
    ) -> Result<BTreeSet<ChunkCoord>> {
        let mut rng = self.chunk_rng(coord);
        self.generate_trees_with_rng(coord, manager, terrain, &mut rng)
    }

    /// [`generate_trees`](Self::generate_trees) with an explicit RNG.
    pub fn generate_trees_with_rng<N: NoiseFn<f64, 2>, R: Rng + ?Sized>(
        &self,
        coord: ChunkCoord,
        manager: &mut ChunkManager,
        terrain: &TerrainGenerator<N>,
        rng: &mut R,
    ) -> Result<BTreeSet<ChunkCoord>> {
        let _span = tracing::trace_span!("generate_trees", x = coord.x, z = coord.z).entered();

        let chunk = manager.get_mut(coord).ok_or(Error::ChunkNotLoaded(coord))?;
        if chunk.is_structures_generated() {
            return Ok(BTreeSet::new());
        }
        chunk.mark_structures_generated()?;

        let mut modified = BTreeSet::from([coord]);
        let base = coord.to_world_pos();
        let mut planted = 0usize;

        for lx in 0..CHUNK_WIDTH {
            for lz in 0..CHUNK_DEPTH {
                let wx = base.x + lx as i32;
                let wz = base.z + lz as i32;

                let chance = self.config.chance(terrain.biome_at(wx, wz));
                let draw = f64::from(rng.gen_range(0..1000_u32)) / 1000.0;
                if draw > chance {
                    continue;
                }

                let Some(source) = manager.get(coord) else {
                    continue;
                };
                let Some(surface) = source.chunk().surface_height(lx, lz) else {
                    continue;
                };
                if surface == 0 || source.chunk().get(lx, surface, lz).kind != BlockType::Grass {
                    continue;
                }

                let trunk_height =
                    rng.gen_range(self.config.min_trunk_height..=self.config.max_trunk_height);
                self.place_tree(
                    manager,
                    WorldPos::new(wx, surface as i32, wz),
                    trunk_height,
                    &mut modified,
                );
                planted += 1;
            }
        }

        tracing::trace!(planted, touched = modified.len(), "trees stamped");
        Ok(modified)
    }

    /// Stamp one tree rooted on the grass block at `ground`.
    fn place_tree(
        &self,
        manager: &mut ChunkManager,
        ground: WorldPos,
        trunk_height: i32,
        modified: &mut BTreeSet<ChunkCoord>,
    ) {
        let trunk_blocks = (trunk_height - 1).max(1);
        for dy in 1..=trunk_blocks {
            let pos = WorldPos::new(ground.x, ground.y + dy, ground.z);
            if !write_block(manager, modified, pos, Block::new(BlockType::Wood)) {
                break;
            }
        }

        let leaves = Block::new(BlockType::Leaves);
        let r = self.config.canopy_radius;
        let leaf_start = ground.y + trunk_height - 2;
        for layer in 0..2 {
            for dx in -r..=r {
                for dz in -r..=r {
                    let pos = WorldPos::new(ground.x + dx, leaf_start + layer, ground.z + dz);
                    if manager.block_world(pos).is_some_and(|b| b.is_air()) {
                        write_block(manager, modified, pos, leaves);
                    }
                }
            }
        }

        let topper_start = ground.y + trunk_blocks + 1;
        for layer in 0..2 {
            for (dx, dz) in TOPPER_OFFSETS {
                let pos = WorldPos::new(ground.x + dx, topper_start + layer, ground.z + dz);
                if manager.block_world(pos).is_some_and(|b| b.is_air()) {
                    write_block(manager, modified, pos, leaves);
                }
            }
        }
    }
}

/// Write through the manager, recording the owning chunk on success.
fn write_block(
    manager: &mut ChunkManager,
    modified: &mut BTreeSet<ChunkCoord>,
    pos: WorldPos,
    block: Block,
) -> bool {
    let written = manager.set_block_world(pos, block);
    if written {
        modified.insert(pos.chunk_coord());
    }
    written
}
