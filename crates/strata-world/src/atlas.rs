//! Texture atlas lookup.
//!
//! Blocks share one atlas image laid out as a grid of square tiles. The mesher
//! asks the atlas for the tile of a (block, face) pair and writes the tile's
//! UV rectangle into the vertex stream; texture loading lives elsewhere.

use serde::{Deserialize, Serialize};
use strata_core::{Axis, Block, BlockType};

use crate::meshing::Face;

/// A tile position in the atlas grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AtlasTile {
    pub column: u32,
    pub row: u32,
}

impl AtlasTile {
    /// Tile in the first column.
    pub const fn row(row: u32) -> Self {
        Self { column: 0, row }
    }
}

/// Normalized UV rectangle of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvRect {
    pub u: f32,
    pub v: f32,
    pub width: f32,
    pub height: f32,
}

impl UvRect {
    /// Map a corner-relative coordinate in `[0, 1]²` into the rectangle.
    #[inline]
    pub fn map(&self, corner: [f32; 2]) -> [f32; 2] {
        [
            self.u + corner[0] * self.width,
            self.v + corner[1] * self.height,
        ]
    }
}

/// Grid dimensions of the shared atlas image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureAtlas {
    pub columns: u32,
    pub rows: u32,
}

impl Default for TextureAtlas {
    /// One column of six rows.
    fn default() -> Self {
        Self {
            columns: 1,
            rows: 6,
        }
    }
}

impl TextureAtlas {
    pub const LEAVES: AtlasTile = AtlasTile::row(0);
    pub const WOOD_END: AtlasTile = AtlasTile::row(1);
    pub const WOOD_BARK: AtlasTile = AtlasTile::row(2);
    pub const STONE: AtlasTile = AtlasTile::row(3);
    pub const DIRT: AtlasTile = AtlasTile::row(4);
    pub const GRASS_TOP: AtlasTile = AtlasTile::row(5);

    /// Create an atlas with the given grid.
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Tile shown on `face` of `block`. `None` for air.
    pub fn tile(&self, block: Block, face: Face) -> Option<AtlasTile> {
        let tile = match block.kind {
            BlockType::Air => return None,
            BlockType::Leaves => Self::LEAVES,
            BlockType::Stone => Self::STONE,
            BlockType::Dirt => Self::DIRT,
            BlockType::Grass => {
                if face == Face::PosY {
                    Self::GRASS_TOP
                } else {
                    Self::DIRT
                }
            }
            BlockType::Wood => {
                if face.axis() == block.axis {
                    Self::WOOD_END
                } else {
                    Self::WOOD_BARK
                }
            }
        };
        Some(tile)
    }

    /// UV rectangle of a tile.
    pub fn uv_rect(&self, tile: AtlasTile) -> UvRect {
        let width = 1.0 / self.columns.max(1) as f32;
        let height = 1.0 / self.rows.max(1) as f32;
        UvRect {
            u: tile.column as f32 * width,
            v: tile.row as f32 * height,
            width,
            height,
        }
    }

    /// UV rectangle for `face` of `block`, `None` for air.
    pub fn face_uv(&self, block: Block, face: Face) -> Option<UvRect> {
        self.tile(block, face).map(|tile| self.uv_rect(tile))
    }
}

impl Face {
    /// Axis the face normal points along.
    pub const fn axis(self) -> Axis {
        match self {
            Self::NegZ | Self::PosZ => Axis::Z,
            Self::NegX | Self::PosX => Axis::X,
            Self::NegY | Self::PosY => Axis::Y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn grass_top_differs_from_sides() {
        let atlas = TextureAtlas::default();
        let grass = Block::new(BlockType::Grass);
        assert_eq!(atlas.tile(grass, Face::PosY), Some(TextureAtlas::GRASS_TOP));
        assert_eq!(atlas.tile(grass, Face::NegY), Some(TextureAtlas::DIRT));
        for face in [Face::NegZ, Face::PosZ, Face::NegX, Face::PosX] {
            assert_eq!(atlas.tile(grass, face), Some(TextureAtlas::DIRT));
        }
    }

    #[test]
    fn wood_end_faces_follow_axis() {
        let atlas = TextureAtlas::default();

        let upright = Block::new(BlockType::Wood);
        assert_eq!(atlas.tile(upright, Face::PosY), Some(TextureAtlas::WOOD_END));
        assert_eq!(atlas.tile(upright, Face::NegY), Some(TextureAtlas::WOOD_END));
        assert_eq!(atlas.tile(upright, Face::PosX), Some(TextureAtlas::WOOD_BARK));

        let sideways = Block::with_axis(BlockType::Wood, Axis::X);
        assert_eq!(atlas.tile(sideways, Face::NegX), Some(TextureAtlas::WOOD_END));
        assert_eq!(atlas.tile(sideways, Face::PosY), Some(TextureAtlas::WOOD_BARK));

        let lengthwise = Block::with_axis(BlockType::Wood, Axis::Z);
        assert_eq!(atlas.tile(lengthwise, Face::PosZ), Some(TextureAtlas::WOOD_END));
        assert_eq!(atlas.tile(lengthwise, Face::NegX), Some(TextureAtlas::WOOD_BARK));
    }

    #[test]
    fn air_has_no_tile() {
        let atlas = TextureAtlas::default();
        assert!(atlas.face_uv(Block::AIR, Face::PosY).is_none());
    }

    #[test]
    fn rows_are_sixths() {
        let atlas = TextureAtlas::default();
        let rect = atlas.uv_rect(TextureAtlas::STONE);
        assert_relative_eq!(rect.u, 0.0);
        assert_relative_eq!(rect.v, 0.5);
        assert_relative_eq!(rect.width, 1.0);
        assert_relative_eq!(rect.height, 1.0 / 6.0);

        let mapped = rect.map([1.0, 1.0]);
        assert_relative_eq!(mapped[1], 4.0 / 6.0);
    }
}
