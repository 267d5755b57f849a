//! # Coordinate Mapping
//!
//! Conversions between the three coordinate spaces used by the voxel world:
//!
//! * **world** – absolute block coordinates (`Point3<i32>`) or free positions (`Point3<f32>`)
//! * **chunk** – the coordinate of the chunk that owns a block, in chunk units
//! * **local** – the block's coordinate inside its chunk, in `[0, L) x [0, H) x [0, D)`
//!
//! All conversions use floor division so negative world coordinates land in the
//! chunk below zero rather than being truncated towards it.

use cgmath::Point3;

use super::chunk::{CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_LENGTH};

/// Chunk coordinate that owns the given world block coordinate.
pub fn world_to_chunk(world: Point3<i32>) -> Point3<i32> {
    Point3::new(
        world.x.div_euclid(CHUNK_LENGTH),
        world.y.div_euclid(CHUNK_HEIGHT),
        world.z.div_euclid(CHUNK_DEPTH),
    )
}

/// Local coordinate of a world block coordinate inside its owning chunk.
pub fn world_to_local(world: Point3<i32>) -> Point3<i32> {
    Point3::new(
        world.x.rem_euclid(CHUNK_LENGTH),
        world.y.rem_euclid(CHUNK_HEIGHT),
        world.z.rem_euclid(CHUNK_DEPTH),
    )
}

/// World block coordinate of a chunk's minimum corner.
///
/// # Returns
/// `None` if the chunk coordinate is so large the corner does not fit in an `i32`.
pub fn chunk_origin(chunk: Point3<i32>) -> Option<Point3<i32>> {
    Some(Point3::new(
        chunk.x.checked_mul(CHUNK_LENGTH)?,
        chunk.y.checked_mul(CHUNK_HEIGHT)?,
        chunk.z.checked_mul(CHUNK_DEPTH)?,
    ))
}

/// The block containing a free-floating world position.
pub fn block_containing(position: Point3<f32>) -> Point3<i32> {
    Point3::new(
        position.x.floor() as i32,
        position.y.floor() as i32,
        position.z.floor() as i32,
    )
}

/// The chunk containing a free-floating world position, typically the viewpoint.
pub fn chunk_containing(position: Point3<f32>) -> Point3<i32> {
    world_to_chunk(block_containing(position))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_coordinates_floor_instead_of_truncate() {
        let world = Point3::new(-1, 5, 20);
        assert_eq!(world_to_chunk(world), Point3::new(-1, 0, 1));
        assert_eq!(world_to_local(world), Point3::new(15, 5, 4));
    }

    #[test]
    fn chunk_boundaries_map_to_local_zero() {
        assert_eq!(world_to_chunk(Point3::new(-16, 0, 16)), Point3::new(-1, 0, 1));
        assert_eq!(world_to_local(Point3::new(-16, 0, 16)), Point3::new(0, 0, 0));
        assert_eq!(world_to_chunk(Point3::new(-17, -1, 15)), Point3::new(-2, -1, 0));
    }

    #[test]
    fn origin_and_local_reassemble_world() {
        for world in [Point3::new(-33, 7, 100), Point3::new(0, -1, -16), Point3::new(47, 48, -49)] {
            let origin = chunk_origin(world_to_chunk(world)).unwrap();
            let local = world_to_local(world);
            assert_eq!(
                Point3::new(origin.x + local.x, origin.y + local.y, origin.z + local.z),
                world
            );
        }
    }

    #[test]
    fn chunk_origin_reports_overflow() {
        assert!(chunk_origin(Point3::new(i32::MAX, 0, 0)).is_none());
    }

    #[test]
    fn viewpoint_just_below_zero_is_in_negative_chunk() {
        assert_eq!(chunk_containing(Point3::new(-0.25, 64.0, 0.5)), Point3::new(-1, 4, 0));
    }
}
