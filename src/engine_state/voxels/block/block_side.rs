//! # Block Side Module
//!
//! This module defines the different faces/sides of a voxel block, the direction each
//! one faces, and the corner layout used when a face is turned into geometry.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// The discriminant is the face index used for texture atlas lookups, so the order
/// must not change: [FRONT, BACK, LEFT, RIGHT, TOP, BOTTOM].
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, PartialOrd, Ord)]
pub enum BlockSide {
    /// The front face (facing positive Z)
    FRONT = 0,

    /// The back face (facing negative Z)
    BACK = 1,

    /// The left face (facing negative X)
    LEFT = 2,

    /// The right face (facing positive X)
    RIGHT = 3,

    /// The top face (facing positive Y)
    TOP = 4,

    /// The bottom face (facing negative Y)
    BOTTOM = 5,
}

/// Corner offsets of a unit face, relative to the block's minimum corner.
///
/// Each entry lists bottom-left, bottom-right, top-right, top-left as seen from
/// outside the block, so the corners wind counter-clockwise around the face normal.
const FACE_CORNERS: [[[f32; 3]; 4]; 6] = [
    // FRONT
    [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]],
    // BACK
    [[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
    // LEFT
    [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]],
    // RIGHT
    [[1.0, 0.0, 1.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0]],
    // TOP
    [[0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
    // BOTTOM
    [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
];

impl BlockSide {
    /// Returns an array containing all six block faces in face-index order.
    ///
    /// The order is: [FRONT, BACK, LEFT, RIGHT, TOP, BOTTOM]
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::LEFT,
            BlockSide::RIGHT,
            BlockSide::TOP,
            BlockSide::BOTTOM,
        ]
    }

    /// The face index (0..6) used to key atlas lookups.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Unit offset from a block to the neighbor this face looks at.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::FRONT => Vector3::new(0, 0, 1),
            BlockSide::BACK => Vector3::new(0, 0, -1),
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
        }
    }

    /// The face on the other side of the block.
    pub fn opposite(self) -> BlockSide {
        match self {
            BlockSide::FRONT => BlockSide::BACK,
            BlockSide::BACK => BlockSide::FRONT,
            BlockSide::LEFT => BlockSide::RIGHT,
            BlockSide::RIGHT => BlockSide::LEFT,
            BlockSide::TOP => BlockSide::BOTTOM,
            BlockSide::BOTTOM => BlockSide::TOP,
        }
    }

    /// Corner offsets of this face: bottom-left, bottom-right, top-right, top-left.
    pub fn corners(self) -> &'static [[f32; 3]; 4] {
        &FACE_CORNERS[self.index()]
    }
}
