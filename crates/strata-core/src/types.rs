//! Core block types.

use serde::{Deserialize, Serialize};

/// Material of a block cell.
///
/// `Air` is the empty cell and the default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlockType {
    /// Empty space
    #[default]
    Air = 0,
    /// Grass-covered surface block
    Grass = 1,
    /// Dirt layer below grass
    Dirt = 2,
    /// Stone bedrock
    Stone = 3,
    /// Tree log, oriented along an axis
    Wood = 4,
    /// Tree leaves
    Leaves = 5,
}

impl BlockType {
    /// Returns true if this block is air (empty)
    #[inline]
    pub const fn is_air(self) -> bool {
        matches!(self, Self::Air)
    }

    /// Returns true if this block is solid (not air)
    #[inline]
    pub const fn is_solid(self) -> bool {
        !self.is_air()
    }
}

/// Orientation axis. Only meaningful for [`BlockType::Wood`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Axis {
    X = 0,
    #[default]
    Y = 1,
    Z = 2,
}

/// A single block cell: material plus orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    /// The block material
    pub kind: BlockType,
    /// Log orientation
    pub axis: Axis,
}

impl Block {
    /// Air block
    pub const AIR: Self = Self {
        kind: BlockType::Air,
        axis: Axis::Y,
    };

    /// Create a new block of the given type with the default orientation
    #[inline]
    pub const fn new(kind: BlockType) -> Self {
        Self {
            kind,
            axis: Axis::Y,
        }
    }

    /// Create a new block with an explicit orientation
    #[inline]
    pub const fn with_axis(kind: BlockType, axis: Axis) -> Self {
        Self { kind, axis }
    }

    /// Returns true if this block is air
    #[inline]
    pub const fn is_air(&self) -> bool {
        self.kind.is_air()
    }

    /// Returns true if this block is solid
    #[inline]
    pub const fn is_solid(&self) -> bool {
        self.kind.is_solid()
    }
}

impl From<BlockType> for Block {
    fn from(kind: BlockType) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_type_air() {
        assert!(BlockType::Air.is_air());
        assert!(!BlockType::Air.is_solid());
    }

    #[test]
    fn block_type_solid() {
        assert!(!BlockType::Stone.is_air());
        assert!(BlockType::Stone.is_solid());
        assert!(BlockType::Leaves.is_solid());
    }

    #[test]
    fn block_default_is_air() {
        let block = Block::default();
        assert!(block.is_air());
        assert_eq!(block, Block::AIR);
    }

    #[test]
    fn wood_keeps_axis() {
        let log = Block::with_axis(BlockType::Wood, Axis::X);
        assert_eq!(log.axis, Axis::X);
        assert_eq!(Block::from(BlockType::Wood).axis, Axis::Y);
    }
}
