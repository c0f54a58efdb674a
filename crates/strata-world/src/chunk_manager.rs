//! Chunk manager with spatial indexing.

use hashbrown::HashMap;
use strata_core::{Block, ChunkCoord, WorldPos};
use strata_voxel::Chunk;

use crate::chunk::ManagedChunk;

/// Owns every live chunk, keyed by chunk coordinate.
///
/// Chunks are boxed so that moving the map never moves block data, and
/// removal is a single drop. Mutation requires `&mut self`, so no lookup can
/// observe a chunk while it is being inserted or removed.
#[derive(Default)]
pub struct ChunkManager {
    chunks: HashMap<ChunkCoord, Box<ManagedChunk>>,
}

impl ChunkManager {
    /// Create an empty chunk manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty chunk manager sized for `capacity` chunks.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            chunks: HashMap::with_capacity(capacity),
        }
    }

    /// Check if a chunk exists at the given position.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Get the number of loaded chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Check if no chunks are loaded.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Shared access to a chunk.
    pub fn get(&self, coord: ChunkCoord) -> Option<&ManagedChunk> {
        self.chunks.get(&coord).map(AsRef::as_ref)
    }

    /// Exclusive access to a chunk.
    pub fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut ManagedChunk> {
        self.chunks.get_mut(&coord).map(AsMut::as_mut)
    }

    /// Insert a chunk at the given position.
    ///
    /// Coordinates are removed before they are recreated, so inserting over
    /// a live chunk is a logic error: it asserts in debug builds. In release
    /// builds the displaced chunk is handed back instead of leaked.
    pub fn insert(&mut self, coord: ChunkCoord, chunk: ManagedChunk) -> Option<Box<ManagedChunk>> {
        debug_assert_eq!(coord, chunk.coord(), "chunk inserted under the wrong key");
        let previous = self.chunks.insert(coord, Box::new(chunk));
        debug_assert!(
            previous.is_none(),
            "chunk ({}, {}) inserted over a live chunk",
            coord.x,
            coord.z
        );
        if previous.is_some() {
            tracing::error!(x = coord.x, z = coord.z, "chunk inserted over a live chunk");
        }
        previous
    }

    /// Create an empty chunk at `coord` unless one is already loaded.
    ///
    /// Returns `true` if a chunk was created.
    pub fn create(&mut self, coord: ChunkCoord) -> bool {
        if self.contains(coord) {
            return false;
        }
        self.chunks.insert(coord, Box::new(ManagedChunk::new(coord)));
        true
    }

    /// Remove a chunk at the given position, releasing it.
    pub fn remove(&mut self, coord: ChunkCoord) -> Option<Box<ManagedChunk>> {
        self.chunks.remove(&coord)
    }

    /// Drop every chunk.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Get all loaded chunk positions.
    pub fn coords(&self) -> Vec<ChunkCoord> {
        self.chunks.keys().copied().collect()
    }

    /// Iterate over all loaded chunks.
    pub fn iter(&self) -> impl Iterator<Item = &ManagedChunk> {
        self.chunks.values().map(AsRef::as_ref)
    }

    /// Iterate mutably over all loaded chunks.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ManagedChunk> {
        self.chunks.values_mut().map(AsMut::as_mut)
    }

    /// Loaded cardinal neighbors of `coord`, omitting absent ones.
    ///
    /// A missing neighbor is unknown, not air or solid; callers decide.
    pub fn neighbors4(&self, coord: ChunkCoord) -> Vec<(ChunkCoord, &ManagedChunk)> {
        coord
            .neighbors4()
            .into_iter()
            .filter_map(|n| self.get(n).map(|chunk| (n, chunk)))
            .collect()
    }

    /// Block data of the four lateral neighbors in +X, -X, +Z, -Z order.
    pub fn lateral_neighbors(&self, coord: ChunkCoord) -> [Option<&Chunk>; 4] {
        coord
            .neighbors4()
            .map(|n| self.get(n).map(ManagedChunk::chunk))
    }

    /// Get chunks within a square (Chebyshev) radius of a center position.
    pub fn chunks_in_radius(&self, center: ChunkCoord, radius: i32) -> Vec<ChunkCoord> {
        self.chunks
            .keys()
            .filter(|coord| coord.chebyshev_distance(center) <= radius)
            .copied()
            .collect()
    }

    /// Get chunks whose mesh is missing or stale.
    pub fn dirty_chunks(&self) -> Vec<ChunkCoord> {
        self.chunks
            .iter()
            .filter(|(_, chunk)| chunk.needs_mesh())
            .map(|(coord, _)| *coord)
            .collect()
    }

    /// Block at a world position, `None` if its chunk is not loaded or `y`
    /// is outside the world.
    pub fn block_world(&self, pos: WorldPos) -> Option<Block> {
        let (coord, local) = pos.split()?;
        self.get(coord).map(|chunk| chunk.chunk().get_local(local))
    }

    /// Write a block at a world position.
    ///
    /// Returns `false` without writing when the owning chunk is not loaded or
    /// `y` is outside the world. A successful write marks the chunk's mesh
    /// dirty.
    pub fn set_block_world(&mut self, pos: WorldPos, block: impl Into<Block>) -> bool {
        let Some((coord, local)) = pos.split() else {
            return false;
        };
        let Some(chunk) = self.get_mut(coord) else {
            return false;
        };
        chunk.chunk_mut().set(
            usize::from(local.x),
            usize::from(local.y),
            usize::from(local.z),
            block,
        );
        chunk.mark_dirty();
        true
    }

    /// Get total memory usage of all chunks.
    pub fn memory_usage(&self) -> usize {
        self.iter().map(ManagedChunk::memory_usage).sum()
    }
}

impl std::fmt::Debug for ChunkManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkManager")
            .field("loaded", &self.chunks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meshing::Mesh;
    use strata_core::BlockType;

    #[test]
    fn insert_and_retrieve() {
        let mut manager = ChunkManager::new();
        let coord = ChunkCoord::new(1, 2);

        assert!(manager.insert(coord, ManagedChunk::new(coord)).is_none());

        assert!(manager.contains(coord));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.get(coord).map(ManagedChunk::coord), Some(coord));
    }

    #[test]
    fn remove_chunk() {
        let mut manager = ChunkManager::new();
        let coord = ChunkCoord::new(1, 2);
        manager.create(coord);

        let removed = manager.remove(coord);

        assert!(removed.is_some());
        assert!(!manager.contains(coord));
        assert!(manager.is_empty());
        assert!(manager.remove(coord).is_none());
    }

    #[test]
    fn create_does_not_replace() {
        let mut manager = ChunkManager::new();
        let coord = ChunkCoord::new(0, 0);
        assert!(manager.create(coord));
        manager.get_mut(coord).unwrap().mark_terrain_generated();

        assert!(!manager.create(coord));
        assert!(manager.get(coord).unwrap().is_terrain_generated());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "live chunk")]
    fn double_insert_asserts() {
        let mut manager = ChunkManager::new();
        let coord = ChunkCoord::new(4, 4);
        manager.insert(coord, ManagedChunk::new(coord));
        manager.insert(coord, ManagedChunk::new(coord));
    }

    #[test]
    fn neighbors_skip_missing() {
        let mut manager = ChunkManager::new();
        let center = ChunkCoord::new(0, 0);
        manager.create(center);
        manager.create(ChunkCoord::new(1, 0));
        manager.create(ChunkCoord::new(0, -1));
        manager.create(ChunkCoord::new(1, 1));

        let mut found: Vec<_> = manager.neighbors4(center).into_iter().map(|(c, _)| c).collect();
        found.sort();
        assert_eq!(found, vec![ChunkCoord::new(0, -1), ChunkCoord::new(1, 0)]);

        let lateral = manager.lateral_neighbors(center);
        assert!(lateral[0].is_some());
        assert!(lateral[1].is_none());
        assert!(lateral[2].is_none());
        assert!(lateral[3].is_some());
    }

    #[test]
    fn chunks_in_radius() {
        let mut manager = ChunkManager::new();
        for x in -5..=5 {
            for z in -5..=5 {
                manager.create(ChunkCoord::new(x, z));
            }
        }

        let nearby = manager.chunks_in_radius(ChunkCoord::new(0, 0), 2);

        assert_eq!(nearby.len(), 25);
    }

    #[test]
    fn dirty_chunks() {
        let mut manager = ChunkManager::new();
        let coord = ChunkCoord::new(0, 0);
        manager.create(coord);
        manager.get_mut(coord).unwrap().mark_terrain_generated();

        assert_eq!(manager.dirty_chunks(), vec![coord]);

        manager.get_mut(coord).unwrap().set_mesh(Mesh::default()).unwrap();
        assert!(manager.dirty_chunks().is_empty());
    }

    #[test]
    fn world_writes_resolve_owning_chunk() {
        let mut manager = ChunkManager::new();
        let coord = ChunkCoord::new(-1, 0);
        manager.create(coord);
        manager.get_mut(coord).unwrap().mark_terrain_generated();
        manager.get_mut(coord).unwrap().set_mesh(Mesh::default()).unwrap();

        let pos = WorldPos::new(-1, 64, 3);
        assert!(manager.set_block_world(pos, BlockType::Wood));

        assert_eq!(manager.block_world(pos), Some(Block::new(BlockType::Wood)));
        let chunk = manager.get(coord).unwrap();
        assert_eq!(chunk.chunk().get(15, 64, 3).kind, BlockType::Wood);
        assert!(chunk.needs_mesh());
    }

    #[test]
    fn world_writes_outside_loaded_space_are_dropped() {
        let mut manager = ChunkManager::new();
        manager.create(ChunkCoord::new(0, 0));

        assert!(!manager.set_block_world(WorldPos::new(16, 10, 0), BlockType::Stone));
        assert!(!manager.set_block_world(WorldPos::new(0, 128, 0), BlockType::Stone));
        assert!(!manager.set_block_world(WorldPos::new(0, -1, 0), BlockType::Stone));
        assert_eq!(manager.block_world(WorldPos::new(16, 10, 0)), None);
        assert_eq!(manager.block_world(WorldPos::new(0, 128, 0)), None);
        assert!(manager.get(ChunkCoord::new(0, 0)).unwrap().chunk().is_empty());
    }
}
