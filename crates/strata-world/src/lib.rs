//! Infinite chunked voxel terrain: generation, trees, meshing and streaming.

pub mod atlas;
pub mod biome;
pub mod chunk;
pub mod chunk_manager;
pub mod generation;
pub mod meshing;
pub mod perlin;
pub mod streaming;
pub mod structures;

pub use atlas::{AtlasTile, TextureAtlas, UvRect};
pub use biome::{BiomeConfig, BiomeType};
pub use chunk::{ChunkStage, ManagedChunk};
pub use chunk_manager::ChunkManager;
pub use generation::{ColumnProfile, Octave, TerrainConfig, TerrainGenerator};
pub use meshing::{generate_chunk_mesh, generate_mesh, Face, Mesh, Vertex, VERTICES_PER_FACE};
pub use perlin::PermutationNoise;
pub use streaming::{
    update_chunks, ChunkStreamer, StreamingConfig, StreamingUpdate, MAX_PADDING, MAX_VIEW_RADIUS,
};
pub use structures::{TreeConfig, TreeGenerator, TreeSeeding};

/// World seed for procedural generation.
pub type WorldSeed = u64;
