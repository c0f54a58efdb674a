//! Block storage for the Strata voxel world.

pub mod chunk;

pub use chunk::Chunk;
