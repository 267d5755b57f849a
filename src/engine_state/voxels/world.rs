//! # World Module
//!
//! This module provides the `World` struct, the live set of chunks keyed by chunk
//! coordinate. It owns every loaded chunk, answers world-space block queries, and
//! keeps mesh invalidation consistent when chunks come and go or blocks are edited.
//!
//! ## Invalidation
//!
//! A chunk's mesh depends on the boundary blocks of its six face neighbors, so
//! inserting or removing a chunk dirties the neighbors that are loaded, and editing a
//! block dirties its chunk together with all six neighbors.
//!
//! ## Performance Considerations
//!
//! - Chunk lookup is O(1) using a hash map
//! - Only chunks near the viewpoint are kept, the chunk manager evicts the rest

use std::collections::HashMap;

use cgmath::{Point3, Vector3};
use log::debug;

use crate::engine_state::rendering::atlas::BlockAtlas;

use super::{
    block::{block_side::BlockSide, block_type::BlockType},
    chunk::{Chunk, NeighborLookup},
    coords,
};

/// Represents a voxel world composed of multiple chunks.
///
/// The world is stored as a sparse 3D grid of chunks, where each chunk is a 16x16x16
/// collection of blocks. Each coordinate holds at most one chunk.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use voxel_world::{BlockType, Chunk, World};
///
/// let mut world = World::new();
/// world.insert_chunk(Chunk::new(Point3::new(0, 0, 0)));
///
/// world.set_block_at_world(Point3::new(3, 4, 5), BlockType::STONE);
/// assert_eq!(world.block_at_world(Point3::new(3, 4, 5)), Some(BlockType::STONE));
/// assert_eq!(world.block_at_world(Point3::new(-1, 0, 0)), None);
/// ```
#[derive(Debug, Default)]
pub struct World {
    chunks: HashMap<Point3<i32>, Chunk>,
}

impl World {
    /// Creates a new, empty world.
    pub fn new() -> Self {
        World {
            chunks: HashMap::new(),
        }
    }

    /// Number of live chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn contains_chunk(&self, position: Point3<i32>) -> bool {
        self.chunks.contains_key(&position)
    }

    pub fn get_chunk_at(&self, position: Point3<i32>) -> Option<&Chunk> {
        self.chunks.get(&position)
    }

    /// Mutable access to a chunk. Callers editing blocks through this must mark the
    /// chunk and its neighbors dirty themselves; prefer [`World::set_block_at_world`].
    pub fn get_chunk_at_mut(&mut self, position: Point3<i32>) -> Option<&mut Chunk> {
        self.chunks.get_mut(&position)
    }

    /// Coordinates of every live chunk.
    pub fn positions(&self) -> impl Iterator<Item = Point3<i32>> + '_ {
        self.chunks.keys().copied()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// Adds a chunk to the live set, replacing any chunk at the same coordinate.
    ///
    /// The new chunk and its loaded neighbors are marked dirty.
    pub fn insert_chunk(&mut self, mut chunk: Chunk) -> Option<Chunk> {
        let position = chunk.position();
        chunk.mark_dirty();
        let previous = self.chunks.insert(position, chunk);
        self.mark_neighbors_dirty(position);
        previous
    }

    /// Removes a chunk from the live set, marking its loaded neighbors dirty.
    pub fn remove_chunk(&mut self, position: Point3<i32>) -> Option<Chunk> {
        let removed = self.chunks.remove(&position);
        if removed.is_some() {
            self.mark_neighbors_dirty(position);
        }
        removed
    }

    /// Marks the loaded face neighbors of `position` dirty.
    pub fn mark_neighbors_dirty(&mut self, position: Point3<i32>) {
        for side in BlockSide::all() {
            let Some(neighbor) = offset(position, side.offset()) else {
                continue;
            };
            if let Some(chunk) = self.chunks.get_mut(&neighbor) {
                chunk.mark_dirty();
            }
        }
    }

    /// The block at a world block coordinate.
    ///
    /// # Returns
    /// `None` if the chunk containing the coordinate is not loaded.
    pub fn block_at_world(&self, world: Point3<i32>) -> Option<BlockType> {
        let chunk = self.chunks.get(&coords::world_to_chunk(world))?;
        let local = coords::world_to_local(world);
        Some(chunk.get_block(local.x, local.y, local.z))
    }

    /// Sets the block at a world block coordinate and dirties its chunk and the chunk's
    /// six neighbors.
    ///
    /// # Returns
    /// `false` if the chunk containing the coordinate is not loaded (nothing changes).
    pub fn set_block_at_world(&mut self, world: Point3<i32>, block_type: BlockType) -> bool {
        let position = coords::world_to_chunk(world);
        let Some(chunk) = self.chunks.get_mut(&position) else {
            return false;
        };
        let local = coords::world_to_local(world);
        chunk.set_block(local.x, local.y, local.z, block_type);
        chunk.mark_dirty();
        self.mark_neighbors_dirty(position);
        true
    }

    /// Number of live chunks whose mesh is stale.
    pub fn dirty_count(&self) -> usize {
        self.chunks.values().filter(|chunk| chunk.is_dirty()).count()
    }

    /// Rebuilds the mesh of every dirty chunk against the current live set.
    ///
    /// # Returns
    /// The number of chunks rebuilt.
    pub fn rebuild_dirty(&mut self, atlas: &BlockAtlas) -> usize {
        let dirty: Vec<Point3<i32>> = self
            .chunks
            .iter()
            .filter(|(_, chunk)| chunk.is_dirty())
            .map(|(position, _)| *position)
            .collect();

        for position in &dirty {
            // Take the chunk out so it can be rebuilt while the rest of the world is
            // borrowed as its neighbor lookup. A chunk is never its own neighbor.
            if let Some(mut chunk) = self.chunks.remove(position) {
                chunk.rebuild_mesh(atlas, &*self);
                self.chunks.insert(*position, chunk);
            }
        }

        if !dirty.is_empty() {
            debug!("Rebuilt {} chunk meshes", dirty.len());
        }
        dirty.len()
    }

    /// Concatenates the meshes of all live chunks into one flat vertex buffer.
    ///
    /// Chunks are visited in coordinate order so the output is reproducible.
    pub fn vertex_data(&self) -> Vec<f32> {
        let mut positions: Vec<Point3<i32>> = self.positions().collect();
        positions.sort_by_key(|position| (position.x, position.y, position.z));

        let total = self.chunks.values().map(|chunk| chunk.vertex_data().len()).sum();
        let mut vertex_data = Vec::with_capacity(total);
        for position in positions {
            if let Some(chunk) = self.chunks.get(&position) {
                vertex_data.extend_from_slice(chunk.vertex_data());
            }
        }
        vertex_data
    }
}

impl NeighborLookup for World {
    fn block_at(&self, world_position: Point3<i32>) -> Option<BlockType> {
        self.block_at_world(world_position)
    }
}

fn offset(position: Point3<i32>, by: Vector3<i32>) -> Option<Point3<i32>> {
    Some(Point3::new(
        position.x.checked_add(by.x)?,
        position.y.checked_add(by.y)?,
        position.z.checked_add(by.z)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_chunk(position: Point3<i32>) -> Chunk {
        let mut chunk = Chunk::new(position);
        chunk.rebuild_mesh(&BlockAtlas::default(), &crate::NoNeighbors);
        chunk
    }

    #[test]
    fn inserting_dirties_loaded_neighbors_only() {
        let mut world = World::new();
        world.chunks.insert(Point3::new(1, 0, 0), clean_chunk(Point3::new(1, 0, 0)));
        world.chunks.insert(Point3::new(2, 0, 0), clean_chunk(Point3::new(2, 0, 0)));

        world.insert_chunk(Chunk::new(Point3::new(0, 0, 0)));

        assert!(world.get_chunk_at(Point3::new(1, 0, 0)).unwrap().is_dirty());
        assert!(!world.get_chunk_at(Point3::new(2, 0, 0)).unwrap().is_dirty());
    }

    #[test]
    fn negative_world_coordinates_resolve_to_the_chunk_below_zero() {
        let mut world = World::new();
        world.insert_chunk(Chunk::new(Point3::new(-1, 0, 1)));

        assert!(world.set_block_at_world(Point3::new(-1, 5, 20), BlockType::SAND));
        let chunk = world.get_chunk_at(Point3::new(-1, 0, 1)).unwrap();
        assert_eq!(chunk.get_block(15, 5, 4), BlockType::SAND);
        assert!(!world.set_block_at_world(Point3::new(0, 5, 20), BlockType::SAND));
    }

    #[test]
    fn rebuild_sees_loaded_neighbors() {
        let atlas = BlockAtlas::default();
        let mut world = World::new();
        for x in 0..2 {
            let mut chunk = Chunk::new(Point3::new(x, 0, 0));
            chunk.set_block(if x == 0 { 15 } else { 0 }, 0, 0, BlockType::STONE);
            world.insert_chunk(chunk);
        }

        assert_eq!(world.rebuild_dirty(&atlas), 2);
        assert_eq!(world.dirty_count(), 0);
        // Two touching cubes: 5 faces each.
        assert_eq!(world.vertex_data().len(), 2 * 5 * 2 * 18);
    }
}
