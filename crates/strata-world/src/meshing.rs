//! Chunk mesh generation.
//!
//! Emits one quad (two triangles, six vertices) per visible block face. A
//! face is visible when the cell it looks into is air, lies above or below
//! the world, or sits in a lateral neighbor that is not loaded. No quads are
//! merged.

use bytemuck::{Pod, Zeroable};
use glam::{IVec3, Vec3};
use strata_core::constants::{CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH};
use strata_core::{Block, ChunkCoord, Error, Result};
use strata_voxel::Chunk;

use crate::atlas::{TextureAtlas, UvRect};
use crate::chunk_manager::ChunkManager;

/// Vertices emitted per visible face.
pub const VERTICES_PER_FACE: usize = 6;

/// Interleaved vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

/// Block face, indexed in vertex-stream order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    NegZ = 0,
    PosZ = 1,
    NegX = 2,
    PosX = 3,
    NegY = 4,
    PosY = 5,
}

impl Face {
    pub const ALL: [Self; 6] = [
        Self::NegZ,
        Self::PosZ,
        Self::NegX,
        Self::PosX,
        Self::NegY,
        Self::PosY,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Unit offset toward the cell this face looks into.
    pub const fn direction(self) -> IVec3 {
        match self {
            Self::NegZ => IVec3::new(0, 0, -1),
            Self::PosZ => IVec3::new(0, 0, 1),
            Self::NegX => IVec3::new(-1, 0, 0),
            Self::PosX => IVec3::new(1, 0, 0),
            Self::NegY => IVec3::new(0, -1, 0),
            Self::PosY => IVec3::new(0, 1, 0),
        }
    }

    /// Outward normal.
    pub fn normal(self) -> Vec3 {
        self.direction().as_vec3()
    }

    /// Unit-cube corners, counter-clockwise seen from outside, with their
    /// tile-relative UVs.
    const fn corners(self) -> [([f32; 3], [f32; 2]); 4] {
        match self {
            Self::NegZ => [
                ([0.0, 0.0, 0.0], [1.0, 0.0]),
                ([0.0, 1.0, 0.0], [1.0, 1.0]),
                ([1.0, 1.0, 0.0], [0.0, 1.0]),
                ([1.0, 0.0, 0.0], [0.0, 0.0]),
            ],
            Self::PosZ => [
                ([0.0, 0.0, 1.0], [0.0, 0.0]),
                ([1.0, 0.0, 1.0], [1.0, 0.0]),
                ([1.0, 1.0, 1.0], [1.0, 1.0]),
                ([0.0, 1.0, 1.0], [0.0, 1.0]),
            ],
            Self::NegX => [
                ([0.0, 0.0, 0.0], [0.0, 0.0]),
                ([0.0, 0.0, 1.0], [1.0, 0.0]),
                ([0.0, 1.0, 1.0], [1.0, 1.0]),
                ([0.0, 1.0, 0.0], [0.0, 1.0]),
            ],
            Self::PosX => [
                ([1.0, 0.0, 0.0], [1.0, 0.0]),
                ([1.0, 1.0, 0.0], [1.0, 1.0]),
                ([1.0, 1.0, 1.0], [0.0, 1.0]),
                ([1.0, 0.0, 1.0], [0.0, 0.0]),
            ],
            Self::NegY => [
                ([0.0, 0.0, 0.0], [0.0, 0.0]),
                ([1.0, 0.0, 0.0], [1.0, 0.0]),
                ([1.0, 0.0, 1.0], [1.0, 1.0]),
                ([0.0, 0.0, 1.0], [0.0, 1.0]),
            ],
            Self::PosY => [
                ([0.0, 1.0, 0.0], [0.0, 0.0]),
                ([0.0, 1.0, 1.0], [0.0, 1.0]),
                ([1.0, 1.0, 1.0], [1.0, 1.0]),
                ([1.0, 1.0, 0.0], [1.0, 0.0]),
            ],
        }
    }
}

/// Triangle list for one chunk, positions in world space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
}

impl Mesh {
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn face_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_FACE
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Raw vertex bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Heap bytes held by the vertex buffer.
    pub fn memory_usage(&self) -> usize {
        self.vertices.capacity() * std::mem::size_of::<Vertex>()
    }

    fn push_face(&mut self, origin: Vec3, face: Face, uv: UvRect) {
        let normal = face.normal().to_array();
        let quad = face.corners().map(|(corner, tex)| Vertex {
            position: (origin + Vec3::from(corner)).to_array(),
            uv: uv.map(tex),
            normal,
        });
        for i in [0, 1, 2, 0, 2, 3] {
            self.vertices.push(quad[i]);
        }
    }
}

/// Neighbor slot for a lateral step out of the chunk, in +X, -X, +Z, -Z order.
#[inline]
const fn neighbor_slot(x: i32, z: i32) -> usize {
    if x >= CHUNK_WIDTH as i32 {
        0
    } else if x < 0 {
        1
    } else if z >= CHUNK_DEPTH as i32 {
        2
    } else {
        3
    }
}

/// Whether the cell at local `pos` (possibly one step outside the chunk)
/// hides a face looking into it.
#[inline]
fn occludes(chunk: &Chunk, neighbors: &[Option<&Chunk>; 4], pos: IVec3) -> bool {
    if pos.y < 0 || pos.y >= CHUNK_HEIGHT as i32 {
        return false;
    }
    if Chunk::in_bounds(pos.x, pos.y, pos.z) {
        return chunk.get(pos.x as usize, pos.y as usize, pos.z as usize).is_solid();
    }
    let Some(neighbor) = neighbors[neighbor_slot(pos.x, pos.z)] else {
        return false;
    };
    let x = pos.x.rem_euclid(CHUNK_WIDTH as i32) as usize;
    let z = pos.z.rem_euclid(CHUNK_DEPTH as i32) as usize;
    neighbor.get(x, pos.y as usize, z).is_solid()
}

/// Build the mesh of `chunk` against its lateral neighbors (+X, -X, +Z, -Z).
pub fn generate_mesh(chunk: &Chunk, neighbors: &[Option<&Chunk>; 4], atlas: &TextureAtlas) -> Mesh {
    let _span = tracing::trace_span!("generate_mesh", x = chunk.coord().x, z = chunk.coord().z)
        .entered();

    let base = chunk.coord().to_world_pos();
    let mut mesh = Mesh::default();

    for x in 0..CHUNK_WIDTH {
        for y in 0..CHUNK_HEIGHT {
            for z in 0..CHUNK_DEPTH {
                let block: Block = chunk.get(x, y, z);
                if block.is_air() {
                    continue;
                }
                let local = IVec3::new(x as i32, y as i32, z as i32);
                let origin = IVec3::new(base.x, 0, base.z) + local;
                for face in Face::ALL {
                    if occludes(chunk, neighbors, local + face.direction()) {
                        continue;
                    }
                    if let Some(uv) = atlas.face_uv(block, face) {
                        mesh.push_face(origin.as_vec3(), face, uv);
                    }
                }
            }
        }
    }

    mesh
}

/// Build the mesh of a loaded chunk using whatever neighbors are loaded.
pub fn generate_chunk_mesh(coord: ChunkCoord, manager: &ChunkManager, atlas: &TextureAtlas) -> Result<Mesh> {
    let chunk = manager.get(coord).ok_or(Error::ChunkNotLoaded(coord))?;
    Ok(generate_mesh(chunk.chunk(), &manager.lateral_neighbors(coord), atlas))
}
