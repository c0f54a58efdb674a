//! Error types for the world core.

use thiserror::Error;

use crate::coords::ChunkCoord;

/// World-wide error type.
///
/// Only the checked accessors and transitions return these; the hot paths
/// treat the same conditions as programmer errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Block coordinates outside a chunk's extent
    #[error("Out of bounds: ({x}, {y}, {z}) is outside the chunk")]
    OutOfBounds { x: i32, y: i32, z: i32 },

    /// Operation targeted a chunk that is not loaded
    #[error("Chunk not loaded: ({}, {})", .0.x, .0.z)]
    ChunkNotLoaded(ChunkCoord),

    /// Chunk lifecycle step attempted out of order
    #[error("Invalid transition for chunk ({}, {}): {reason}", .coord.x, .coord.z)]
    InvalidTransition {
        coord: ChunkCoord,
        reason: &'static str,
    },

    /// Configuration value rejected
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
