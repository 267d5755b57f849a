//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which generates the blocks of one
//! chunk, on a worker thread or inline. The result is applied to the chunk manager's
//! streaming state: a successful chunk joins the live set (and will be meshed by the
//! next dirty rebuild), a failed one is left out so it is retried on a later frame.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use cgmath::Point3;
use log::{debug, warn};

use crate::engine_state::{
    chunk_manager::StreamingState,
    rendering::atlas::BlockAtlas,
    task_management::task::{Task, TaskResult},
    voxels::{
        chunk::Chunk,
        terrain::{GenerationError, TerrainGenerator},
    },
};

/// A task that generates chunk data.
pub struct ChunkGenerationTask {
    generator: Arc<dyn TerrainGenerator>,
    atlas: Arc<BlockAtlas>,
    /// The position of the chunk to generate (in chunk coordinates)
    position: Point3<i32>,
}

impl ChunkGenerationTask {
    pub fn new(generator: Arc<dyn TerrainGenerator>, atlas: Arc<BlockAtlas>, position: Point3<i32>) -> Self {
        ChunkGenerationTask {
            generator,
            atlas,
            position,
        }
    }

    pub fn position(&self) -> Point3<i32> {
        self.position
    }

    /// Runs the generator, turning a panic into a [`GenerationError::Panicked`].
    pub fn generate(&self) -> Result<Chunk, GenerationError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.generator.generate(self.position, &self.atlas)))
            .unwrap_or(Err(GenerationError::Panicked(self.position)))
    }
}

impl Task<StreamingState> for ChunkGenerationTask {
    fn process(&self) -> Box<dyn TaskResult<StreamingState> + Send> {
        Box::new(ChunkGenerationTaskResult {
            position: self.position,
            result: self.generate(),
        })
    }
}

/// The result of a chunk generation task.
pub struct ChunkGenerationTaskResult {
    position: Point3<i32>,
    result: Result<Chunk, GenerationError>,
}

impl TaskResult<StreamingState> for ChunkGenerationTaskResult {
    /// Adds the generated chunk to the live set if its coordinate is still required.
    fn handle_result(self: Box<Self>, state: &mut StreamingState) -> Vec<Box<dyn Task<StreamingState> + Send>> {
        state.pending.remove(&self.position);

        if !state.required.contains(&self.position) {
            debug!("Discarding chunk {:?}, no longer required", self.position);
            state.frame.discarded += 1;
            return Vec::new();
        }

        match self.result {
            Ok(chunk) => {
                state.world.insert_chunk(chunk);
                state.frame.loaded += 1;
            }
            Err(err) => {
                warn!("Failed to generate chunk {:?}: {}", self.position, err);
                state.frame.failed += 1;
            }
        }

        Vec::new()
    }
}
