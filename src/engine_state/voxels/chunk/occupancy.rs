//! Padded solidity snapshot used while meshing a chunk.
//!
//! The snapshot covers the chunk plus a one-cell border on every side, so every
//! face-adjacent neighbor of an interior block can be tested with a single bit
//! lookup. Only the six face shells of the border are ever populated; edge and
//! corner cells stay clear since no face test reads them.

use bitvec::prelude::*;
use cgmath::Point3;

use crate::engine_state::voxels::coords;

use super::{Chunk, NeighborLookup, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_LENGTH};

const LENGTH_WRAPPED: i32 = CHUNK_LENGTH + 2;
const HEIGHT_WRAPPED: i32 = CHUNK_HEIGHT + 2;
const DEPTH_WRAPPED: i32 = CHUNK_DEPTH + 2;
const SIZE_WRAPPED: usize = (LENGTH_WRAPPED * HEIGHT_WRAPPED * DEPTH_WRAPPED) as usize;

pub(super) struct Occupancy {
    solid_array: BitVec,
}

impl Occupancy {
    /// Captures the solidity of `chunk` and of the neighbor cells touching its faces.
    pub(super) fn capture(chunk: &Chunk, neighbors: &dyn NeighborLookup) -> Self {
        let mut solid_array = bitvec![0; SIZE_WRAPPED];

        for (local, _) in chunk.solid_blocks() {
            solid_array.set(Self::index(local.x, local.y, local.z), true);
        }

        // A chunk whose origin does not fit in block coordinates has no addressable
        // neighbors; its border stays air.
        if let Some(origin) = coords::chunk_origin(chunk.position()) {
            for x in -1..=CHUNK_LENGTH {
                for y in -1..=CHUNK_HEIGHT {
                    for z in -1..=CHUNK_DEPTH {
                        if !Self::on_face_shell(x, y, z) {
                            continue;
                        }
                        let Some(world) = offset(origin, x, y, z) else {
                            continue;
                        };
                        let solid = neighbors
                            .block_at(world)
                            .is_some_and(|block_type| block_type.is_solid());
                        if solid {
                            solid_array.set(Self::index(x, y, z), true);
                        }
                    }
                }
            }
        }

        Occupancy { solid_array }
    }

    /// Whether the cell at the (possibly border) local coordinate is solid.
    pub(super) fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        let in_wrapped = (-1..=CHUNK_LENGTH).contains(&x)
            && (-1..=CHUNK_HEIGHT).contains(&y)
            && (-1..=CHUNK_DEPTH).contains(&z);
        in_wrapped && self.solid_array[Self::index(x, y, z)]
    }

    fn on_face_shell(x: i32, y: i32, z: i32) -> bool {
        let outside = [
            !(0..CHUNK_LENGTH).contains(&x),
            !(0..CHUNK_HEIGHT).contains(&y),
            !(0..CHUNK_DEPTH).contains(&z),
        ];
        outside.iter().filter(|&&axis| axis).count() == 1
    }

    #[inline]
    fn index(x: i32, y: i32, z: i32) -> usize {
        (((x + 1) * HEIGHT_WRAPPED + (y + 1)) * DEPTH_WRAPPED + (z + 1)) as usize
    }
}

fn offset(origin: Point3<i32>, x: i32, y: i32, z: i32) -> Option<Point3<i32>> {
    Some(Point3::new(
        origin.x.checked_add(x)?,
        origin.y.checked_add(y)?,
        origin.z.checked_add(z)?,
    ))
}
