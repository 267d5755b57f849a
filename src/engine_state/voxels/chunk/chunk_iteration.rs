//! # Chunk Iteration Module
//!
//! This module provides an iterator for traversing all non-air blocks in a chunk.
//!
//! Blocks are visited in storage order (x outermost, z innermost), which is the
//! order the mesher emits faces in. Air cells are skipped without being yielded.

use cgmath::Point3;

use crate::engine_state::voxels::block::block_type::BlockType;

use super::{Chunk, CHUNK_DEPTH, CHUNK_HEIGHT};

/// An iterator over all non-air blocks in a chunk.
///
/// Yields each solid block together with its chunk-local coordinate.
pub struct ChunkBlockIterator<'a> {
    /// Reference to the chunk being iterated over
    chunk_ref: &'a Chunk,
    /// Next flat index to inspect
    current_offset: usize,
}

impl<'a> ChunkBlockIterator<'a> {
    /// Creates a new `ChunkBlockIterator` positioned before the first block of `chunk_ref`.
    pub fn new(chunk_ref: &'a Chunk) -> Self {
        ChunkBlockIterator {
            chunk_ref,
            current_offset: 0,
        }
    }

    fn local_position(offset: usize) -> Point3<i32> {
        let offset = offset as i32;
        Point3::new(
            offset / (CHUNK_HEIGHT * CHUNK_DEPTH),
            (offset / CHUNK_DEPTH) % CHUNK_HEIGHT,
            offset % CHUNK_DEPTH,
        )
    }
}

impl Iterator for ChunkBlockIterator<'_> {
    type Item = (Point3<i32>, BlockType);

    fn next(&mut self) -> Option<Self::Item> {
        let blocks = self.chunk_ref.blocks();
        while self.current_offset < blocks.len() {
            let offset = self.current_offset;
            self.current_offset += 1;

            let block_type = blocks[offset];
            if block_type.is_solid() {
                return Some((Self::local_position(offset), block_type));
            }
        }
        None
    }
}
