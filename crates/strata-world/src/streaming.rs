//! Chunk streaming based on observer position.
//!
//! Each tick keeps a square of chunks around the observer loaded and walks
//! them through terrain, structure and mesh passes. The square is one chunk
//! wider than the view radius so that trees near the visible edge can write
//! into their neighbors and boundary faces are culled against real data.

use glam::Vec3;
use noise::NoiseFn;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strata_core::{ChunkCoord, Error, Result};

use crate::atlas::TextureAtlas;
use crate::chunk::ManagedChunk;
use crate::chunk_manager::ChunkManager;
use crate::generation::TerrainGenerator;
use crate::meshing::{generate_chunk_mesh, Mesh};
use crate::perlin::PermutationNoise;
use crate::structures::TreeGenerator;

/// Largest view radius a tick will honour, in chunks.
pub const MAX_VIEW_RADIUS: i32 = 64;

/// Largest keep-alive padding, in chunks.
pub const MAX_PADDING: i32 = 8;

/// Configuration for chunk streaming behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Radius in chunks of the disc that receives structures.
    pub view_radius: i32,
    /// Extra ring of chunks kept loaded beyond the view radius.
    pub padding: i32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            view_radius: 8,
            padding: 1,
        }
    }
}

impl StreamingConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.view_radius < 0 {
            return Err(Error::InvalidConfig(format!(
                "view radius must not be negative, got {}",
                self.view_radius
            )));
        }
        if self.view_radius > MAX_VIEW_RADIUS {
            return Err(Error::InvalidConfig(format!(
                "view radius {} exceeds {MAX_VIEW_RADIUS}",
                self.view_radius
            )));
        }
        if !(0..=MAX_PADDING).contains(&self.padding) {
            return Err(Error::InvalidConfig(format!(
                "padding must lie in 0..={MAX_PADDING}, got {}",
                self.padding
            )));
        }
        Ok(())
    }

    /// Clamp a requested view radius to `0..=MAX_VIEW_RADIUS`.
    pub const fn effective_radius(view_radius: i32) -> i32 {
        if view_radius < 0 {
            0
        } else if view_radius > MAX_VIEW_RADIUS {
            MAX_VIEW_RADIUS
        } else {
            view_radius
        }
    }

    /// Chebyshev radius of the keep-alive square for a view radius.
    pub const fn keep_alive_radius(&self, view_radius: i32) -> i32 {
        Self::effective_radius(view_radius).saturating_add(self.padding)
    }
}

/// What one streaming tick did, for the renderer to mirror.
///
/// All lists are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamingUpdate {
    /// Chunk containing the observer.
    pub center: ChunkCoord,
    /// Chunks allocated this tick.
    pub created: Vec<ChunkCoord>,
    /// Chunks dropped this tick. Their buffers can be released.
    pub unloaded: Vec<ChunkCoord>,
    pub terrain_generated: Vec<ChunkCoord>,
    pub structures_generated: Vec<ChunkCoord>,
    /// Chunks whose mesh was rebuilt. Their buffers need (re)upload.
    pub meshed: Vec<ChunkCoord>,
}

impl StreamingUpdate {
    /// Whether the tick changed nothing.
    pub fn is_idle(&self) -> bool {
        self.created.is_empty()
            && self.unloaded.is_empty()
            && self.terrain_generated.is_empty()
            && self.structures_generated.is_empty()
            && self.meshed.is_empty()
    }
}

/// Handles chunk streaming based on observer position.
pub struct ChunkStreamer<N = PermutationNoise> {
    config: StreamingConfig,
    terrain: TerrainGenerator<N>,
    trees: TreeGenerator,
    atlas: TextureAtlas,
    last_center: Option<ChunkCoord>,
}

impl<N: NoiseFn<f64, 2> + Sync> ChunkStreamer<N> {
    /// Create a new chunk streamer.
    pub fn new(config: StreamingConfig, terrain: TerrainGenerator<N>, trees: TreeGenerator) -> Result<Self> {
        config.validate()?;
        trees.config().validate()?;
        Ok(Self {
            config,
            terrain,
            trees,
            atlas: TextureAtlas::default(),
            last_center: None,
        })
    }

    /// Use a different atlas layout for mesh UVs.
    #[must_use]
    pub fn with_atlas(mut self, atlas: TextureAtlas) -> Self {
        self.atlas = atlas;
        self
    }

    /// Get the streaming configuration.
    pub const fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Get the terrain generator.
    pub const fn terrain(&self) -> &TerrainGenerator<N> {
        &self.terrain
    }

    pub const fn trees(&self) -> &TreeGenerator {
        &self.trees
    }

    pub const fn atlas(&self) -> &TextureAtlas {
        &self.atlas
    }

    /// Chunk the observer was in on the last tick.
    pub const fn last_center(&self) -> Option<ChunkCoord> {
        self.last_center
    }

    /// Run one tick with the configured view radius.
    pub fn update(&mut self, manager: &mut ChunkManager, observer: Vec3) -> StreamingUpdate {
        self.update_with_radius(manager, observer, self.config.view_radius)
    }

    /// Run one tick with an explicit view radius.
    ///
    /// Negative radii are treated as zero and radii above
    /// [`MAX_VIEW_RADIUS`] are clamped to it.
    pub fn update_with_radius(
        &mut self,
        manager: &mut ChunkManager,
        observer: Vec3,
        view_radius: i32,
    ) -> StreamingUpdate {
        let _span = tracing::trace_span!("streaming_update").entered();

        let radius = StreamingConfig::effective_radius(view_radius);
        let center = ChunkCoord::from_world(observer);
        if self.last_center != Some(center) {
            tracing::trace!(x = center.x, z = center.z, "observer entered chunk");
            self.last_center = Some(center);
        }

        let keep = self.config.keep_alive_radius(radius);
        let mut update = StreamingUpdate {
            center,
            ..StreamingUpdate::default()
        };

        update.unloaded = Self::unload_distant(manager, center, keep);
        update.created = Self::create_missing(manager, center, keep);
        update.terrain_generated = self.terrain_pass(manager);
        update.structures_generated = self.structure_pass(manager, center, radius);
        update.meshed = self.mesh_pass(manager);

        update.created.sort_unstable();
        update.unloaded.sort_unstable();
        update.terrain_generated.sort_unstable();
        update.structures_generated.sort_unstable();
        update.meshed.sort_unstable();

        tracing::debug!(
            center_x = center.x,
            center_z = center.z,
            created = update.created.len(),
            unloaded = update.unloaded.len(),
            terrain = update.terrain_generated.len(),
            structures = update.structures_generated.len(),
            meshed = update.meshed.len(),
            loaded = manager.len(),
            "streaming tick"
        );

        update
    }

    /// Remove loaded chunks outside the keep-alive square.
    fn unload_distant(manager: &mut ChunkManager, center: ChunkCoord, keep: i32) -> Vec<ChunkCoord> {
        let _span = tracing::trace_span!("unload_pass").entered();

        let unloaded: Vec<ChunkCoord> = manager
            .coords()
            .into_iter()
            .filter(|coord| coord.chebyshev_distance(center) > keep)
            .collect();
        for &coord in &unloaded {
            manager.remove(coord);
        }
        unloaded
    }

    /// Allocate empty chunks for the keep-alive square, nearest first.
    fn create_missing(manager: &mut ChunkManager, center: ChunkCoord, keep: i32) -> Vec<ChunkCoord> {
        let _span = tracing::trace_span!("create_pass").entered();

        let mut missing = Vec::new();
        for dx in -keep..=keep {
            for dz in -keep..=keep {
                let coord = center.offset(dx, dz);
                if !manager.contains(coord) {
                    missing.push(coord);
                }
            }
        }
        missing.sort_by_key(|coord| coord.distance_squared(center));

        for &coord in &missing {
            manager.create(coord);
        }
        missing
    }

    /// Generate terrain for every chunk still lacking it, in parallel.
    fn terrain_pass(&self, manager: &mut ChunkManager) -> Vec<ChunkCoord> {
        let _span = tracing::trace_span!("terrain_pass").entered();

        let pending: Vec<&mut ManagedChunk> = manager
            .iter_mut()
            .filter(|chunk| !chunk.is_terrain_generated())
            .collect();

        pending
            .into_par_iter()
            .map(|chunk| {
                self.terrain.generate_terrain(chunk.chunk_mut());
                chunk.mark_terrain_generated();
                chunk.coord()
            })
            .collect()
    }

    /// Stamp trees on the view disc, one chunk at a time.
    fn structure_pass(&self, manager: &mut ChunkManager, center: ChunkCoord, radius: i32) -> Vec<ChunkCoord> {
        let _span = tracing::trace_span!("structure_pass").entered();

        let mut generated = Vec::new();
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                if dx * dx + dz * dz > radius * radius {
                    continue;
                }
                let coord = center.offset(dx, dz);
                let Some(chunk) = manager.get(coord) else {
                    continue;
                };
                if chunk.is_structures_generated() {
                    continue;
                }

                let result = self.trees.generate_trees(coord, manager, &self.terrain);
                debug_assert!(result.is_ok(), "structure pass on {coord:?}: {result:?}");
                match result {
                    Ok(touched) => {
                        tracing::trace!(x = coord.x, z = coord.z, touched = touched.len(), "structures");
                        generated.push(coord);
                    }
                    Err(err) => tracing::error!(%err, "skipping structures"),
                }
            }
        }
        generated
    }

    /// Rebuild meshes that are missing or stale.
    ///
    /// Meshes are built in parallel against a shared view of the manager and
    /// installed afterwards.
    fn mesh_pass(&self, manager: &mut ChunkManager) -> Vec<ChunkCoord> {
        let _span = tracing::trace_span!("mesh_pass").entered();

        let dirty: Vec<ChunkCoord> = manager
            .iter()
            .filter(|chunk| chunk.is_terrain_generated() && chunk.needs_mesh())
            .map(ManagedChunk::coord)
            .collect();

        let shared: &ChunkManager = manager;
        let built: Vec<(ChunkCoord, Result<Mesh>)> = dirty
            .into_par_iter()
            .map(|coord| (coord, generate_chunk_mesh(coord, shared, &self.atlas)))
            .collect();

        let mut meshed = Vec::with_capacity(built.len());
        for (coord, mesh) in built {
            let installed = mesh.and_then(|mesh| {
                manager
                    .get_mut(coord)
                    .ok_or(Error::ChunkNotLoaded(coord))?
                    .set_mesh(mesh)
            });
            debug_assert!(installed.is_ok(), "mesh pass on {coord:?}: {installed:?}");
            match installed {
                Ok(()) => meshed.push(coord),
                Err(err) => tracing::error!(%err, "skipping mesh"),
            }
        }
        meshed
    }
}

impl<N> std::fmt::Debug for ChunkStreamer<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStreamer")
            .field("config", &self.config)
            .field("trees", &self.trees)
            .field("atlas", &self.atlas)
            .field("last_center", &self.last_center)
            .finish_non_exhaustive()
    }
}

/// Per-frame entry point: stream chunks around `observer` with the given
/// view radius.
pub fn update_chunks<N: NoiseFn<f64, 2> + Sync>(
    streamer: &mut ChunkStreamer<N>,
    manager: &mut ChunkManager,
    observer: Vec3,
    view_radius: i32,
) -> StreamingUpdate {
    streamer.update_with_radius(manager, observer, view_radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::TerrainConfig;
    use crate::structures::TreeConfig;
    use noise::Constant;
    use std::collections::BTreeSet;

    fn create_test_streamer(view_radius: i32) -> (ChunkStreamer, ChunkManager) {
        let config = StreamingConfig {
            view_radius,
            padding: 1,
        };
        let terrain = TerrainGenerator::new(TerrainConfig::default());
        let streamer = ChunkStreamer::new(config, terrain, TreeGenerator::default()).unwrap();
        (streamer, ChunkManager::new())
    }

    fn square(center: ChunkCoord, radius: i32) -> BTreeSet<ChunkCoord> {
        let mut set = BTreeSet::new();
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                set.insert(center.offset(dx, dz));
            }
        }
        set
    }

    fn loaded(manager: &ChunkManager) -> BTreeSet<ChunkCoord> {
        manager.coords().into_iter().collect()
    }

    #[test]
    fn rejects_negative_config() {
        let config = StreamingConfig {
            view_radius: -1,
            padding: 1,
        };
        let terrain = TerrainGenerator::new(TerrainConfig::default());
        assert!(ChunkStreamer::new(config, terrain, TreeGenerator::default()).is_err());
    }

    #[test]
    fn radius_is_bounded() {
        let too_wide = StreamingConfig {
            view_radius: MAX_VIEW_RADIUS + 1,
            padding: 1,
        };
        assert!(matches!(too_wide.validate(), Err(Error::InvalidConfig(_))));
        let too_padded = StreamingConfig {
            view_radius: 2,
            padding: i32::MAX,
        };
        assert!(matches!(too_padded.validate(), Err(Error::InvalidConfig(_))));

        assert_eq!(StreamingConfig::effective_radius(i32::MAX), MAX_VIEW_RADIUS);
        assert_eq!(StreamingConfig::effective_radius(i32::MIN), 0);
        let config = StreamingConfig::default();
        assert_eq!(config.keep_alive_radius(i32::MAX), MAX_VIEW_RADIUS + 1);
    }

    #[test]
    fn first_tick_loads_keep_alive_square() {
        let (mut streamer, mut manager) = create_test_streamer(2);

        let update = streamer.update(&mut manager, Vec3::new(8.0, 80.0, 8.0));

        assert_eq!(update.center, ChunkCoord::new(0, 0));
        assert_eq!(loaded(&manager), square(ChunkCoord::new(0, 0), 3));
        assert_eq!(update.created.len(), 49);
        assert_eq!(update.terrain_generated.len(), 49);
        assert_eq!(update.meshed.len(), 49);
        assert!(update.unloaded.is_empty());
    }

    #[test]
    fn structures_cover_view_disc_only() {
        let (mut streamer, mut manager) = create_test_streamer(2);

        let update = streamer.update(&mut manager, Vec3::new(8.0, 80.0, 8.0));

        // Offsets with dx² + dz² <= 4.
        assert_eq!(update.structures_generated.len(), 13);
        for coord in manager.coords() {
            let chunk = manager.get(coord).unwrap();
            let in_disc = coord.distance_squared(ChunkCoord::new(0, 0)) <= 4;
            assert_eq!(chunk.is_structures_generated(), in_disc, "{coord:?}");
        }
    }

    #[test]
    fn every_chunk_is_meshed_and_clean_after_tick() {
        let (mut streamer, mut manager) = create_test_streamer(1);

        streamer.update(&mut manager, Vec3::ZERO);

        assert!(manager.dirty_chunks().is_empty());
        for chunk in manager.iter() {
            assert!(chunk.mesh().is_some());
        }
    }

    #[test]
    fn second_tick_in_place_is_idle() {
        let (mut streamer, mut manager) = create_test_streamer(2);
        streamer.update(&mut manager, Vec3::new(8.0, 80.0, 8.0));

        let update = streamer.update(&mut manager, Vec3::new(9.0, 80.0, 7.0));

        assert!(update.is_idle(), "{update:?}");
    }

    #[test]
    fn moving_unloads_trailing_edge() {
        let (mut streamer, mut manager) = create_test_streamer(2);
        streamer.update(&mut manager, Vec3::new(8.0, 80.0, 8.0));

        let update = streamer.update(&mut manager, Vec3::new(24.0, 80.0, 8.0));

        assert_eq!(update.center, ChunkCoord::new(1, 0));
        assert_eq!(loaded(&manager), square(ChunkCoord::new(1, 0), 3));
        let expected_unloaded: Vec<_> = (-3..=3).map(|z| ChunkCoord::new(-3, z)).collect();
        let expected_created: Vec<_> = (-3..=3).map(|z| ChunkCoord::new(4, z)).collect();
        assert_eq!(update.unloaded, expected_unloaded);
        assert_eq!(update.created, expected_created);
    }

    #[test]
    fn teleport_replaces_everything() {
        let (mut streamer, mut manager) = create_test_streamer(1);
        streamer.update(&mut manager, Vec3::ZERO);

        let update = streamer.update(&mut manager, Vec3::new(5000.0, 80.0, -5000.0));

        assert_eq!(update.unloaded.len(), 25);
        assert_eq!(update.created.len(), 25);
        assert_eq!(loaded(&manager), square(update.center, 2));
    }

    #[test]
    fn free_function_honours_radius() {
        let (mut streamer, mut manager) = create_test_streamer(8);

        let update = update_chunks(&mut streamer, &mut manager, Vec3::new(-1.0, 64.0, -1.0), 0);

        assert_eq!(update.center, ChunkCoord::new(-1, -1));
        assert_eq!(loaded(&manager), square(ChunkCoord::new(-1, -1), 1));
        assert_eq!(update.structures_generated, vec![ChunkCoord::new(-1, -1)]);
    }

    #[test]
    fn flat_world_surface_is_grass() {
        let terrain = TerrainGenerator::with_noise(TerrainConfig::default(), Constant::new(0.0));
        let trees = TreeGenerator::new(TreeConfig {
            forest_chance: 0.0,
            plains_chance: 0.0,
            ..TreeConfig::default()
        })
        .unwrap();
        let mut streamer = ChunkStreamer::new(StreamingConfig::default(), terrain, trees).unwrap();
        let mut manager = ChunkManager::new();

        update_chunks(&mut streamer, &mut manager, Vec3::ZERO, 1);

        let chunk = manager.get(ChunkCoord::new(0, 0)).unwrap().chunk();
        assert_eq!(chunk.get(3, 48, 3).kind, strata_core::BlockType::Grass);
        assert_eq!(chunk.get(3, 47, 3).kind, strata_core::BlockType::Dirt);
        assert_eq!(chunk.get(3, 45, 3).kind, strata_core::BlockType::Stone);
    }
}
