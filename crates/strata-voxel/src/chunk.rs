//! Dense chunk block storage.
//!
//! A chunk is a fixed 16x128x16 grid of [`Block`]s stored as a flat array in
//! `[x][y][z]` order. Every in-range cell always holds a block; out-of-range
//! coordinates are a caller error and are never clamped.

use strata_core::constants::{CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_VOLUME, CHUNK_WIDTH};
use strata_core::{Block, BlockType, ChunkCoord, Error, LocalPos, Result, WorldPos};

/// A 16x128x16 column of blocks.
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    coord: ChunkCoord,
    blocks: Box<[Block]>,
}

impl Chunk {
    /// Create an all-air chunk at the given chunk coordinate.
    pub fn new(coord: ChunkCoord) -> Self {
        Self::filled(coord, Block::AIR)
    }

    /// Create a chunk with every cell set to `block`.
    pub fn filled(coord: ChunkCoord, block: Block) -> Self {
        Self {
            coord,
            blocks: vec![block; CHUNK_VOLUME].into_boxed_slice(),
        }
    }

    /// Position in chunk coordinates.
    #[inline]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Whether local coordinates fall inside the chunk.
    #[inline]
    pub const fn in_bounds(x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as usize) < CHUNK_WIDTH
            && (y as usize) < CHUNK_HEIGHT
            && (z as usize) < CHUNK_DEPTH
    }

    #[inline]
    fn index(x: usize, y: usize, z: usize) -> usize {
        assert!(
            x < CHUNK_WIDTH && y < CHUNK_HEIGHT && z < CHUNK_DEPTH,
            "block ({x}, {y}, {z}) is outside the {CHUNK_WIDTH}x{CHUNK_HEIGHT}x{CHUNK_DEPTH} chunk"
        );
        (x * CHUNK_HEIGHT + y) * CHUNK_DEPTH + z
    }

    /// Get the block at local coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the chunk.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Block {
        self.blocks[Self::index(x, y, z)]
    }

    /// Mutable access to the block at local coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the chunk.
    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize, z: usize) -> &mut Block {
        &mut self.blocks[Self::index(x, y, z)]
    }

    /// Set the block at local coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the chunk.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, block: impl Into<Block>) {
        self.blocks[Self::index(x, y, z)] = block.into();
    }

    /// Get the block at a [`LocalPos`].
    #[inline]
    pub fn get_local(&self, pos: LocalPos) -> Block {
        self.get(pos.x as usize, pos.y as usize, pos.z as usize)
    }

    /// Checked read that reports out-of-range coordinates as an error.
    pub fn try_get(&self, x: i32, y: i32, z: i32) -> Result<Block> {
        if Self::in_bounds(x, y, z) {
            Ok(self.get(x as usize, y as usize, z as usize))
        } else {
            Err(Error::OutOfBounds { x, y, z })
        }
    }

    /// Checked write that reports out-of-range coordinates as an error.
    pub fn try_set(&mut self, x: i32, y: i32, z: i32, block: impl Into<Block>) -> Result<()> {
        if Self::in_bounds(x, y, z) {
            self.set(x as usize, y as usize, z as usize, block);
            Ok(())
        } else {
            Err(Error::OutOfBounds { x, y, z })
        }
    }

    /// Y of the topmost non-air block in a column, if any.
    pub fn surface_height(&self, x: usize, z: usize) -> Option<usize> {
        (0..CHUNK_HEIGHT).rev().find(|&y| self.get(x, y, z).is_solid())
    }

    /// World position of a local cell in this chunk.
    #[inline]
    pub const fn world_pos(&self, x: usize, y: usize, z: usize) -> WorldPos {
        WorldPos::new(
            self.coord.x * CHUNK_WIDTH as i32 + x as i32,
            y as i32,
            self.coord.z * CHUNK_DEPTH as i32 + z as i32,
        )
    }

    /// All blocks in `[x][y][z]` order.
    #[inline]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Check if this chunk is empty (all air).
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(Block::is_air)
    }

    /// Number of cells holding the given block type.
    pub fn count(&self, kind: BlockType) -> usize {
        self.blocks.iter().filter(|b| b.kind == kind).count()
    }

    /// Get memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + std::mem::size_of_val(&*self.blocks)
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("coord", &self.coord)
            .field("blocks", &"<16x128x16>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Axis;

    #[test]
    fn new_chunk_is_air() {
        let chunk = Chunk::new(ChunkCoord::new(3, -2));
        assert!(chunk.is_empty());
        assert_eq!(chunk.coord(), ChunkCoord::new(3, -2));
        assert_eq!(chunk.blocks().len(), CHUNK_VOLUME);
        assert_eq!(chunk.get(15, 127, 15), Block::AIR);
    }

    #[test]
    fn set_and_get_single_block() {
        let mut chunk = Chunk::new(ChunkCoord::default());
        chunk.set(10, 64, 3, Block::with_axis(BlockType::Wood, Axis::Z));

        assert_eq!(chunk.get(10, 64, 3).kind, BlockType::Wood);
        assert_eq!(chunk.get(10, 64, 3).axis, Axis::Z);
        assert_eq!(chunk.get(3, 64, 10), Block::AIR);
        assert!(!chunk.is_empty());
    }

    #[test]
    fn set_and_get_corners() {
        let mut chunk = Chunk::new(ChunkCoord::default());
        let corners = [
            (0, 0, 0),
            (15, 0, 0),
            (0, 127, 0),
            (0, 0, 15),
            (15, 127, 15),
        ];
        for &(x, y, z) in &corners {
            chunk.set(x, y, z, BlockType::Stone);
        }
        for &(x, y, z) in &corners {
            assert_eq!(chunk.get(x, y, z).kind, BlockType::Stone);
        }
        assert_eq!(chunk.count(BlockType::Stone), corners.len());
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn out_of_bounds_get_panics() {
        let chunk = Chunk::new(ChunkCoord::default());
        let _ = chunk.get(0, 0, 16);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn out_of_bounds_set_panics() {
        let mut chunk = Chunk::new(ChunkCoord::default());
        chunk.set(0, 128, 0, BlockType::Dirt);
    }

    #[test]
    fn checked_access_reports_errors() {
        let mut chunk = Chunk::new(ChunkCoord::default());
        assert_eq!(
            chunk.try_get(-1, 0, 0),
            Err(Error::OutOfBounds { x: -1, y: 0, z: 0 })
        );
        assert!(chunk.try_set(16, 0, 0, BlockType::Dirt).is_err());
        assert!(chunk.try_set(15, 0, 0, BlockType::Dirt).is_ok());
        assert_eq!(chunk.try_get(15, 0, 0).map(|b| b.kind), Ok(BlockType::Dirt));
    }

    #[test]
    fn surface_height_finds_topmost_solid() {
        let mut chunk = Chunk::new(ChunkCoord::default());
        assert_eq!(chunk.surface_height(4, 4), None);
        chunk.set(4, 10, 4, BlockType::Stone);
        chunk.set(4, 40, 4, BlockType::Grass);
        assert_eq!(chunk.surface_height(4, 4), Some(40));
    }

    #[test]
    fn world_pos_offsets_by_chunk() {
        let chunk = Chunk::new(ChunkCoord::new(-1, 2));
        assert_eq!(chunk.world_pos(0, 5, 0), WorldPos::new(-16, 5, 32));
        assert_eq!(chunk.world_pos(15, 5, 15), WorldPos::new(-1, 5, 47));
    }
}
