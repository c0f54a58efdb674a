//! Chunk lifecycle state.
//!
//! A [`ManagedChunk`] pairs block data with the flags that drive the
//! streaming pipeline: terrain, then structures, then meshing, with a dirty
//! flag that sends the chunk back through meshing whenever its blocks change.

use strata_core::{ChunkCoord, Error, Result};
use strata_voxel::Chunk;

use crate::meshing::Mesh;

/// Stage of a chunk in the loading pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChunkStage {
    /// Allocated, all air, terrain not generated.
    Created,
    /// Terrain generated.
    TerrainReady,
    /// Trees stamped.
    StructuresReady,
    /// Mesh built from the current blocks.
    MeshUploaded,
}

/// A chunk owned by the [`ChunkManager`](crate::ChunkManager).
pub struct ManagedChunk {
    chunk: Chunk,
    mesh: Mesh,
    terrain_generated: bool,
    structures_generated: bool,
    mesh_uploaded: bool,
    mesh_dirty: bool,
}

impl ManagedChunk {
    /// Create a new empty chunk at the given position.
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            chunk: Chunk::new(coord),
            mesh: Mesh::default(),
            terrain_generated: false,
            structures_generated: false,
            mesh_uploaded: false,
            mesh_dirty: true,
        }
    }

    /// Wrap already generated terrain.
    pub fn with_terrain(chunk: Chunk) -> Self {
        Self {
            chunk,
            mesh: Mesh::default(),
            terrain_generated: true,
            structures_generated: false,
            mesh_uploaded: false,
            mesh_dirty: true,
        }
    }

    /// Position in chunk coordinates.
    #[inline]
    pub const fn coord(&self) -> ChunkCoord {
        self.chunk.coord()
    }

    /// Block data.
    #[inline]
    pub const fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    /// Mutable block data. Callers that change blocks must [`mark_dirty`](Self::mark_dirty).
    #[inline]
    pub fn chunk_mut(&mut self) -> &mut Chunk {
        &mut self.chunk
    }

    /// Current pipeline stage.
    pub const fn stage(&self) -> ChunkStage {
        if self.mesh_uploaded && !self.mesh_dirty {
            ChunkStage::MeshUploaded
        } else if self.structures_generated {
            ChunkStage::StructuresReady
        } else if self.terrain_generated {
            ChunkStage::TerrainReady
        } else {
            ChunkStage::Created
        }
    }

    pub const fn is_terrain_generated(&self) -> bool {
        self.terrain_generated
    }

    pub const fn is_structures_generated(&self) -> bool {
        self.structures_generated
    }

    pub const fn is_mesh_uploaded(&self) -> bool {
        self.mesh_uploaded
    }

    pub const fn is_mesh_dirty(&self) -> bool {
        self.mesh_dirty
    }

    /// Whether the mesh pass should rebuild this chunk.
    #[inline]
    pub const fn needs_mesh(&self) -> bool {
        !self.mesh_uploaded || self.mesh_dirty
    }

    /// Record that terrain has been written into the block data.
    pub fn mark_terrain_generated(&mut self) {
        self.terrain_generated = true;
        self.mesh_dirty = true;
    }

    /// Record that trees have been stamped.
    pub fn mark_structures_generated(&mut self) -> Result<()> {
        if !self.terrain_generated {
            return Err(Error::InvalidTransition {
                coord: self.coord(),
                reason: "structures before terrain",
            });
        }
        self.structures_generated = true;
        self.mesh_dirty = true;
        Ok(())
    }

    /// Flag the mesh as stale relative to the block data.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.mesh_dirty = true;
    }

    /// Install a freshly built mesh.
    pub fn set_mesh(&mut self, mesh: Mesh) -> Result<()> {
        if !self.terrain_generated {
            return Err(Error::InvalidTransition {
                coord: self.coord(),
                reason: "mesh before terrain",
            });
        }
        self.mesh = mesh;
        self.mesh_uploaded = true;
        self.mesh_dirty = false;
        Ok(())
    }

    /// The last installed mesh, if any.
    pub const fn mesh(&self) -> Option<&Mesh> {
        if self.mesh_uploaded {
            Some(&self.mesh)
        } else {
            None
        }
    }

    /// Get memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.chunk.memory_usage() + self.mesh.memory_usage()
    }
}

impl std::fmt::Debug for ManagedChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedChunk")
            .field("coord", &self.coord())
            .field("stage", &self.stage())
            .field("mesh_dirty", &self.mesh_dirty)
            .field("faces", &self.mesh.face_count())
            .finish()
    }
}
