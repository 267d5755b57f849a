//! # Chunk Module
//!
//! This module provides the `Chunk` struct and related functionality for managing
//! 16x16x16 blocks of voxel data, together with the face-culling mesh rebuild that
//! turns a chunk's blocks into triangles.
//!
//! ## Storage
//!
//! Blocks live in a single flat buffer of `CHUNK_LENGTH * CHUNK_HEIGHT * CHUNK_DEPTH`
//! entries indexed as `((x * H) + y) * D + z`. Local coordinates are signed so that
//! callers (and the mesher) can probe one cell past the boundary: reads outside the
//! grid return `AIR` and writes outside the grid are ignored.
//!
//! ## Meshing
//!
//! The triangle list is a cache derived from the blocks and from the boundary
//! occupancy of the six neighboring chunks at the time of the last rebuild. Mutating
//! blocks never rebuilds it implicitly; the owner marks the chunk dirty and calls
//! [`Chunk::rebuild_mesh`] again.

use cgmath::{Point3, Vector3};
use log::{trace, warn};
use web_time::Instant;

use chunk_iteration::ChunkBlockIterator;
use occupancy::Occupancy;

use super::block::block_side::BlockSide;
use super::block::block_type::BlockType;
use crate::engine_state::rendering::{
    atlas::BlockAtlas,
    meshing::Face,
    vertex::{self, Triangle},
};

pub mod chunk_iteration;
mod occupancy;

/// The width (x extent) of a chunk in blocks.
pub const CHUNK_LENGTH: i32 = 16;
/// The height (y extent) of a chunk in blocks.
pub const CHUNK_HEIGHT: i32 = 16;
/// The depth (z extent) of a chunk in blocks.
pub const CHUNK_DEPTH: i32 = 16;
/// The total number of blocks in a chunk.
pub const CHUNK_SIZE: usize = (CHUNK_LENGTH * CHUNK_HEIGHT * CHUNK_DEPTH) as usize;

/// Resolves blocks outside a chunk while it is being meshed.
///
/// Implementations answer with the block at an absolute world block coordinate, or
/// `None` when the chunk holding that coordinate is not loaded. Unknown blocks are
/// treated as air, so faces on an unloaded boundary are always emitted.
pub trait NeighborLookup {
    /// The block at `world_position`, if its chunk is available.
    fn block_at(&self, world_position: Point3<i32>) -> Option<BlockType>;
}

impl<F> NeighborLookup for F
where
    F: Fn(Point3<i32>) -> Option<BlockType>,
{
    fn block_at(&self, world_position: Point3<i32>) -> Option<BlockType> {
        self(world_position)
    }
}

/// A lookup for a chunk meshed in isolation: every neighbor is unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNeighbors;

impl NeighborLookup for NoNeighbors {
    fn block_at(&self, _world_position: Point3<i32>) -> Option<BlockType> {
        None
    }
}

/// Represents a 16x16x16 collection of voxel blocks in the world.
///
/// Chunks are the fundamental unit of generation, meshing and streaming. Each chunk
/// knows its position (in chunk coordinates), owns its blocks, and caches the
/// triangles produced by its last mesh rebuild.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    position: Point3<i32>,
    /// Flat block storage, see the module docs for the index layout.
    blocks: Box<[BlockType]>,
    /// Triangles produced by the last rebuild.
    mesh: Vec<Triangle>,
    /// Whether the mesh no longer reflects the blocks or the neighbors.
    dirty: bool,
    /// Number of completed mesh rebuilds.
    mesh_generation: u64,
}

impl Chunk {
    /// Creates a new, completely empty chunk (all blocks are air).
    ///
    /// The chunk starts dirty with an empty mesh.
    pub fn new(position: Point3<i32>) -> Self {
        Chunk {
            position,
            blocks: vec![BlockType::AIR; CHUNK_SIZE].into_boxed_slice(),
            mesh: Vec::new(),
            dirty: true,
            mesh_generation: 0,
        }
    }

    /// The position of this chunk in chunk coordinates.
    pub fn position(&self) -> Point3<i32> {
        self.position
    }

    /// Moves the chunk to a new chunk coordinate. The mesh becomes stale.
    pub fn set_position(&mut self, position: Point3<i32>) {
        self.position = position;
        self.dirty = true;
    }

    /// World-space position of the chunk's minimum corner.
    pub fn world_offset(&self) -> Point3<f32> {
        Point3::new(
            self.position.x as f32 * CHUNK_LENGTH as f32,
            self.position.y as f32 * CHUNK_HEIGHT as f32,
            self.position.z as f32 * CHUNK_DEPTH as f32,
        )
    }

    /// Expresses a world-space viewpoint relative to this chunk's minimum corner.
    pub fn relative_position(&self, viewpoint: Point3<f32>) -> Vector3<f32> {
        viewpoint - self.world_offset()
    }

    /// Whether the local coordinate lies inside the chunk.
    #[inline]
    pub fn contains(x: i32, y: i32, z: i32) -> bool {
        (0..CHUNK_LENGTH).contains(&x) && (0..CHUNK_HEIGHT).contains(&y) && (0..CHUNK_DEPTH).contains(&z)
    }

    #[inline]
    fn index(x: i32, y: i32, z: i32) -> usize {
        (((x * CHUNK_HEIGHT) + y) * CHUNK_DEPTH + z) as usize
    }

    /// Gets the block at the specified chunk-relative coordinates.
    ///
    /// # Returns
    /// The stored block, or `AIR` when any coordinate is outside the chunk.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockType {
        if !Self::contains(x, y, z) {
            return BlockType::AIR;
        }
        self.blocks[Self::index(x, y, z)]
    }

    /// Sets the block at the specified chunk-relative coordinates.
    ///
    /// Out-of-range coordinates are silently ignored. The mesh is not invalidated;
    /// the owner is responsible for marking the chunk (and its neighbors) dirty.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block_type: BlockType) {
        if !Self::contains(x, y, z) {
            return;
        }
        self.blocks[Self::index(x, y, z)] = block_type;
    }

    /// Sets `length` blocks along +x starting at `(x, y, z)`.
    ///
    /// Cells that fall outside the chunk are skipped.
    pub fn set_row(&mut self, x: i32, y: i32, z: i32, length: i32, block_type: BlockType) {
        for i in 0..length.max(0) {
            let Some(row_x) = x.checked_add(i) else {
                break;
            };
            self.set_block(row_x, y, z, block_type);
        }
    }

    /// Fills the whole horizontal (x/z) layer at height `y`.
    pub fn set_horizontal_face(&mut self, y: i32, block_type: BlockType) {
        self.set_horizontal_layers(y, 1, block_type);
    }

    /// Fills `height` horizontal layers starting at `y` and going up.
    ///
    /// Layers outside the chunk are skipped, so a band that straddles the chunk
    /// boundary only fills the part inside it.
    pub fn set_horizontal_layers(&mut self, y: i32, height: i32, block_type: BlockType) {
        let start = y.max(0);
        let end = y.saturating_add(height.max(0)).min(CHUNK_HEIGHT);
        for layer in start..end {
            for z in 0..CHUNK_DEPTH {
                self.set_row(0, layer, z, CHUNK_LENGTH, block_type);
            }
        }
    }

    /// Sets every block in the chunk to `block_type`.
    pub fn fill_chunk(&mut self, block_type: BlockType) {
        self.blocks.fill(block_type);
    }

    /// Read-only view of the raw block buffer.
    pub fn blocks(&self) -> &[BlockType] {
        &self.blocks
    }

    /// Whether every block is air.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|block| !block.is_solid())
    }

    /// Iterates over all non-air blocks with their local coordinates.
    pub fn solid_blocks(&self) -> ChunkBlockIterator<'_> {
        ChunkBlockIterator::new(self)
    }

    /// Whether the cached mesh is stale.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the cached mesh as stale.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Number of mesh rebuilds this chunk has gone through.
    pub fn mesh_generation(&self) -> u64 {
        self.mesh_generation
    }

    /// Recomputes the triangle list from scratch.
    ///
    /// Every solid block emits one quad per face whose neighbor is not solid. Neighbors
    /// past the chunk boundary are resolved through `neighbors`, and unknown ones count
    /// as air. Faces are visited in [`BlockSide::all`] order and textured from `atlas`.
    ///
    /// Blocks the atlas has no texture for are skipped (with a warning) instead of
    /// failing the rebuild.
    pub fn rebuild_mesh(&mut self, atlas: &BlockAtlas, neighbors: &dyn NeighborLookup) {
        let started = Instant::now();
        let occupancy = Occupancy::capture(self, neighbors);
        let world_offset = self.world_offset();

        let mut triangles = Vec::with_capacity(self.mesh.len());
        let mut untextured = 0usize;

        for (local, block_type) in self.solid_blocks() {
            for side in BlockSide::all() {
                let neighbor = local + side.offset();
                if occupancy.is_solid(neighbor.x, neighbor.y, neighbor.z) {
                    continue;
                }

                let Some(region) = atlas.get_block_texture(block_type, side) else {
                    untextured += 1;
                    continue;
                };

                let block_origin = world_offset
                    + Vector3::new(local.x as f32, local.y as f32, local.z as f32);
                Face::new(block_origin, side, region).push_triangles(&mut triangles);
            }
        }

        if untextured > 0 {
            warn!(
                "Chunk {:?}: skipped {} faces of block types missing from the atlas",
                self.position, untextured
            );
        }

        self.mesh = triangles;
        self.dirty = false;
        self.mesh_generation += 1;

        trace!(
            "Meshed chunk {:?}: {} triangles in {:?}",
            self.position,
            self.mesh.len(),
            started.elapsed()
        );
    }

    /// The triangles from the last rebuild; empty until the first rebuild.
    pub fn get_mesh(&self) -> &[Triangle] {
        &self.mesh
    }

    /// The last rebuilt mesh as the renderer's flat float layout.
    pub fn vertex_data(&self) -> &[f32] {
        vertex::flatten(&self.mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_reads_are_air_and_writes_are_ignored() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        chunk.set_block(CHUNK_LENGTH, 0, 0, BlockType::STONE);
        chunk.set_block(0, -1, 0, BlockType::STONE);

        assert!(chunk.is_empty());
        assert_eq!(chunk.get_block(-1, 0, 0), BlockType::AIR);
        assert_eq!(chunk.get_block(0, 0, CHUNK_DEPTH), BlockType::AIR);
    }

    #[test]
    fn horizontal_layers_clip_to_the_chunk() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        chunk.set_horizontal_layers(14, 5, BlockType::SAND);

        assert_eq!(chunk.solid_blocks().count(), 2 * 16 * 16);
        assert_eq!(chunk.get_block(3, 15, 9), BlockType::SAND);
        assert_eq!(chunk.get_block(3, 13, 9), BlockType::AIR);
    }

    #[test]
    fn row_stops_at_the_boundary() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0));
        chunk.set_row(12, 1, 1, 10, BlockType::WOOD);
        assert_eq!(chunk.solid_blocks().count(), 4);
    }

    #[test]
    fn rebuild_clears_dirty_and_counts_generations() {
        let atlas = BlockAtlas::default();
        let mut chunk = Chunk::new(Point3::new(2, -1, 0));
        chunk.set_block(1, 1, 1, BlockType::GRASS);
        assert!(chunk.is_dirty());

        chunk.rebuild_mesh(&atlas, &NoNeighbors);

        assert!(!chunk.is_dirty());
        assert_eq!(chunk.mesh_generation(), 1);
        assert_eq!(chunk.get_mesh().len(), 12);

        chunk.mark_dirty();
        chunk.set_block(1, 1, 1, BlockType::AIR);
        chunk.rebuild_mesh(&atlas, &NoNeighbors);
        assert!(chunk.get_mesh().is_empty());
        assert_eq!(chunk.mesh_generation(), 2);
    }

    #[test]
    fn mesh_lives_in_world_space() {
        let atlas = BlockAtlas::default();
        let mut chunk = Chunk::new(Point3::new(-1, 0, 0));
        chunk.set_block(0, 0, 0, BlockType::STONE);
        chunk.rebuild_mesh(&atlas, &NoNeighbors);

        for triangle in chunk.get_mesh() {
            for vertex in triangle.vertices {
                assert!((-16.0..=-15.0).contains(&vertex.position[0]));
            }
        }
    }

    #[test]
    fn relative_position_is_measured_from_the_min_corner() {
        let chunk = Chunk::new(Point3::new(1, 0, -1));
        let relative = chunk.relative_position(Point3::new(20.0, 3.0, -8.0));
        assert_eq!(relative, Vector3::new(4.0, 3.0, 8.0));
    }
}
