//! Coordinate systems for the voxel world.
//!
//! Chunks tile the XZ plane only; a chunk spans the full world height, so
//! chunk coordinates are two-dimensional while world and local positions
//! are three-dimensional.

use crate::constants::{CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Chunk coordinate containing the given world-space position along X or Z.
///
/// `floor(pos / 16)`, so negative positions map to negative chunks:
/// `chunk_coord_of(31.5) == 1` and `chunk_coord_of(-1.0) == -1`.
#[inline]
pub fn chunk_coord_of(world_pos: f32) -> i32 {
    (world_pos / CHUNK_WIDTH as f32).floor() as i32
}

/// Position within a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalPos {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl LocalPos {
    /// Create a new local position
    #[inline]
    pub const fn new(x: u8, y: u8, z: u8) -> Self {
        debug_assert!((x as usize) < CHUNK_WIDTH);
        debug_assert!((y as usize) < CHUNK_HEIGHT);
        debug_assert!((z as usize) < CHUNK_DEPTH);
        Self { x, y, z }
    }

    /// Convert to linear index for `[x][y][z]` flat array storage
    #[inline]
    pub const fn to_index(self) -> usize {
        (self.x as usize * CHUNK_HEIGHT + self.y as usize) * CHUNK_DEPTH + self.z as usize
    }

    /// Create from linear index
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        let z = (index % CHUNK_DEPTH) as u8;
        let y = ((index / CHUNK_DEPTH) % CHUNK_HEIGHT) as u8;
        let x = (index / (CHUNK_DEPTH * CHUNK_HEIGHT)) as u8;
        Self { x, y, z }
    }
}

/// Chunk position in chunk coordinates.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Pod,
    Zeroable,
    Serialize,
    Deserialize,
)]
#[repr(C)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    /// Create a new chunk coordinate
    #[inline]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing a world-space point (Y is ignored).
    #[inline]
    pub fn from_world(pos: Vec3) -> Self {
        Self::new(chunk_coord_of(pos.x), chunk_coord_of(pos.z))
    }

    /// World position of the chunk's minimum corner (y = 0).
    #[inline]
    pub const fn to_world_pos(self) -> WorldPos {
        WorldPos::new(
            self.x * CHUNK_WIDTH as i32,
            0,
            self.z * CHUNK_DEPTH as i32,
        )
    }

    /// Coordinate offset by a number of chunks along X and Z
    #[inline]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// The four cardinal neighbors in the order +X, -X, +Z, -Z.
    pub const fn neighbors4(self) -> [Self; 4] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
        ]
    }

    /// Grid (Chebyshev) distance in chunks.
    #[inline]
    pub const fn chebyshev_distance(self, other: Self) -> i32 {
        let dx = (self.x - other.x).abs();
        let dz = (self.z - other.z).abs();
        if dx > dz {
            dx
        } else {
            dz
        }
    }

    /// Squared Euclidean distance in chunks.
    #[inline]
    pub const fn distance_squared(self, other: Self) -> i32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }
}

/// World position in block coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl WorldPos {
    /// Create a new world position
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Get the chunk containing this position
    #[inline]
    pub const fn chunk_coord(self) -> ChunkCoord {
        ChunkCoord::new(
            self.x.div_euclid(CHUNK_WIDTH as i32),
            self.z.div_euclid(CHUNK_DEPTH as i32),
        )
    }

    /// Get the local position within the owning chunk.
    ///
    /// Returns `None` when `y` lies outside the world's vertical extent.
    #[inline]
    pub const fn local_pos(self) -> Option<LocalPos> {
        if self.y < 0 || self.y >= CHUNK_HEIGHT as i32 {
            return None;
        }
        Some(LocalPos::new(
            self.x.rem_euclid(CHUNK_WIDTH as i32) as u8,
            self.y as u8,
            self.z.rem_euclid(CHUNK_DEPTH as i32) as u8,
        ))
    }

    /// Split into chunk and local position
    #[inline]
    pub const fn split(self) -> Option<(ChunkCoord, LocalPos)> {
        match self.local_pos() {
            Some(local) => Some((self.chunk_coord(), local)),
            None => None,
        }
    }

    /// Create from chunk and local position
    #[inline]
    pub const fn from_chunk_local(chunk: ChunkCoord, local: LocalPos) -> Self {
        Self::new(
            chunk.x * CHUNK_WIDTH as i32 + local.x as i32,
            local.y as i32,
            chunk.z * CHUNK_DEPTH as i32 + local.z as i32,
        )
    }

    /// Convert to floating point Vec3
    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

impl From<Vec3> for WorldPos {
    fn from(v: Vec3) -> Self {
        Self::new(v.x.floor() as i32, v.y.floor() as i32, v.z.floor() as i32)
    }
}
