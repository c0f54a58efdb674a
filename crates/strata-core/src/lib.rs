//! Core types for the Strata voxel world.
//!
//! This crate provides the foundational types shared by the world crates:
//! - Block types and orientation
//! - Coordinate systems (world, chunk, local)
//! - The common error type

pub mod coords;
pub mod error;
pub mod types;

pub use coords::{chunk_coord_of, ChunkCoord, LocalPos, WorldPos};
pub use error::{Error, Result};
pub use types::{Axis, Block, BlockType};

/// World-wide constants.
///
/// Chunk dimensions are fixed; terrain, meshing and streaming all assume them.
pub mod constants {
    /// Chunk extent along X in blocks
    pub const CHUNK_WIDTH: usize = 16;
    /// Chunk extent along Z in blocks
    pub const CHUNK_DEPTH: usize = 16;
    /// Chunk extent along Y in blocks
    pub const CHUNK_HEIGHT: usize = 128;
    /// Total blocks in a chunk (16 * 128 * 16)
    pub const CHUNK_VOLUME: usize = CHUNK_WIDTH * CHUNK_HEIGHT * CHUNK_DEPTH;
}
