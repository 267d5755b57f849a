//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world.
//! It provides functionality for block type identification and conversion from
//! the compact integer representation stored in chunks.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

use super::BlockTypeSize;

/// Enumerates all possible block types in the voxel world.
///
/// `AIR` (id 0) is the only non-solid type. Every other variant is solid for the
/// purposes of face culling and occupancy queries.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, FromPrimitive, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum BlockType {
    /// Empty space. Never rendered and never occludes a neighbor.
    #[default]
    AIR = 0,

    /// A basic dirt block, found just below the surface.
    DIRT = 1,

    /// A grass block with different textures on top and sides.
    GRASS = 2,

    /// Stone, the bulk of everything below the dirt layer.
    STONE = 3,

    /// Tree trunks.
    WOOD = 4,

    /// Tree canopy.
    LEAVES = 5,

    /// Beach and low-lying surface material.
    SAND = 6,
}

impl BlockType {
    /// Number of block types, including `AIR`.
    pub const COUNT: usize = 7;

    /// All block types in id order.
    pub const ALL: [BlockType; Self::COUNT] = [
        BlockType::AIR,
        BlockType::DIRT,
        BlockType::GRASS,
        BlockType::STONE,
        BlockType::WOOD,
        BlockType::LEAVES,
        BlockType::SAND,
    ];

    /// Converts a stored block id back into a `BlockType`.
    ///
    /// # Returns
    /// `None` if the id does not name a known block type.
    pub fn from_id(id: BlockTypeSize) -> Option<Self> {
        FromPrimitive::from_u8(id)
    }

    /// The compact id used when the block is stored or serialized.
    pub fn id(self) -> BlockTypeSize {
        self as BlockTypeSize
    }

    /// Whether this block occludes the faces of its neighbors.
    #[inline]
    pub fn is_solid(self) -> bool {
        self != BlockType::AIR
    }

    /// Iterates over every solid block type.
    pub fn solid_types() -> impl Iterator<Item = BlockType> {
        Self::ALL.into_iter().filter(|block_type| block_type.is_solid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_from_id() {
        for block_type in BlockType::ALL {
            assert_eq!(BlockType::from_id(block_type.id()), Some(block_type));
        }
        assert_eq!(BlockType::from_id(BlockType::COUNT as u8), None);
    }

    #[test]
    fn only_air_is_non_solid() {
        assert!(!BlockType::AIR.is_solid());
        assert_eq!(BlockType::solid_types().count(), BlockType::COUNT - 1);
    }
}
