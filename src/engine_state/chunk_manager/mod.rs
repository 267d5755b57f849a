//! # Chunk Manager
//!
//! Streams chunks in and out around a moving viewpoint and submits the resulting
//! geometry to a [`Renderer`] once per frame.
//!
//! ## Frame Order
//!
//! Each call to [`ChunkManager::render_world`]:
//! 1. computes the required set around the viewpoint's chunk
//! 2. evicts live chunks that are no longer required
//! 3. generates missing required chunks, inline or on the worker pool
//! 4. rebuilds every dirty mesh against the current live set
//! 5. concatenates all live meshes and hands them to the renderer
//!
//! Eviction runs before generation so a frame never meshes against chunks it is
//! about to drop.
//!
//! ## Modes
//!
//! With `worker_threads == 0` generation happens inside the frame and the live set
//! equals the required set (minus failed coordinates) when the frame ends. With
//! workers, chunks join the live set on the first frame after their generation
//! completes; results for coordinates that left the required set meanwhile are
//! discarded. Generation is only dispatched to idle workers, nearest chunks first, so
//! at most one generation per worker is pending at any time. If every worker thread
//! has died the manager falls back to synchronous generation. Meshing always runs on
//! the owning thread against a single snapshot of the live set.

use std::collections::HashSet;
use std::sync::Arc;

use cgmath::{Matrix4, Point3};
use log::{debug, info, warn};
use thiserror::Error;
use web_time::Instant;

use crate::config::WorldConfig;
use crate::engine_state::{
    rendering::{atlas::BlockAtlas, RenderError, Renderer},
    task_management::{
        task::{Task, TaskResult},
        TaskManager,
    },
    voxels::{
        block::block_type::BlockType,
        coords,
        tasks::chunk_generation_task::ChunkGenerationTask,
        terrain::{GenerationError, Terrain, TerrainGenerator},
        world::World,
    },
};

pub mod required_set;

pub use required_set::{distance_squared, required_set, RequiredShape};

/// Counters describing one frame of streaming work.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    /// Chunks that joined the live set
    pub loaded: usize,
    /// Chunks removed because they left the required set
    pub evicted: usize,
    /// Meshes rebuilt
    pub remeshed: usize,
    /// Generation attempts that failed (retried on a later frame)
    pub failed: usize,
    /// Completed generations thrown away because the coordinate is no longer required
    pub discarded: usize,
    /// Generations still running on workers at the end of the frame
    pub pending: usize,
    /// Live chunks at the end of the frame
    pub live: usize,
    /// Length of the vertex buffer handed to the renderer
    pub vertex_floats: usize,
    /// Whether the renderer accepted the frame
    pub submitted: bool,
    /// Non-fatal error reported by the renderer
    pub render_error: Option<RenderError>,
}

/// Errors from editing blocks through the manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("chunk {0:?} is not loaded")]
    ChunkNotLoaded(Point3<i32>),
    #[error("block type {0:?} has no atlas entry")]
    UnsupportedBlock(BlockType),
}

/// State shared between the manager and the results of generation tasks.
#[derive(Debug, Default)]
pub struct StreamingState {
    pub(crate) world: World,
    pub(crate) required: HashSet<Point3<i32>>,
    pub(crate) pending: HashSet<Point3<i32>>,
    pub(crate) frame: FrameStats,
}

/// Owns the live set and decides what is loaded, meshed and drawn each frame.
pub struct ChunkManager {
    state: StreamingState,
    generator: Arc<dyn TerrainGenerator>,
    atlas: Arc<BlockAtlas>,
    radius: i32,
    shape: RequiredShape,
    workers: Option<TaskManager<StreamingState>>,
}

impl ChunkManager {
    /// Creates a manager using the built-in terrain generator described by `config`.
    ///
    /// # Errors
    /// Fails if the terrain places a block type `atlas` has no textures for.
    pub fn new(config: &WorldConfig, atlas: BlockAtlas) -> Result<Self, GenerationError> {
        let generator: Arc<dyn TerrainGenerator> = Arc::new(Terrain::new(config.terrain.clone()));
        Self::with_generator(config, generator, Arc::new(atlas))
    }

    /// Creates a manager with a custom generator. Terrain settings in `config` are ignored.
    ///
    /// # Errors
    /// Fails if the generator's palette contains a block type `atlas` cannot texture.
    pub fn with_generator(
        config: &WorldConfig,
        generator: Arc<dyn TerrainGenerator>,
        atlas: Arc<BlockAtlas>,
    ) -> Result<Self, GenerationError> {
        generator.check_palette(&atlas)?;

        let workers = (config.worker_threads > 0).then(|| TaskManager::new(config.worker_threads));

        info!(
            "Chunk manager: radius {} ({:?}), {}",
            config.radius,
            config.shape,
            match config.worker_threads {
                0 => "synchronous generation".to_string(),
                n => format!("{} generation workers", n),
            }
        );

        Ok(ChunkManager {
            state: StreamingState::default(),
            generator,
            atlas,
            radius: config.radius.max(0),
            shape: config.shape,
            workers,
        })
    }

    pub fn world(&self) -> &World {
        &self.state.world
    }

    pub fn atlas(&self) -> &BlockAtlas {
        &self.atlas
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Changes the streaming radius, taking effect on the next frame.
    pub fn set_radius(&mut self, radius: i32) {
        self.radius = radius.max(0);
    }

    pub fn shape(&self) -> RequiredShape {
        self.shape
    }

    /// Live chunk coordinates, sorted.
    pub fn live_positions(&self) -> Vec<Point3<i32>> {
        let mut positions: Vec<_> = self.state.world.positions().collect();
        positions.sort_by_key(|position| (position.x, position.y, position.z));
        positions
    }

    pub fn is_live(&self, position: Point3<i32>) -> bool {
        self.state.world.contains_chunk(position)
    }

    /// Number of generations running in the background.
    pub fn pending_count(&self) -> usize {
        self.state.pending.len()
    }

    /// Required coordinates computed by the last frame.
    pub fn required(&self) -> &HashSet<Point3<i32>> {
        &self.state.required
    }

    /// The block at a world block coordinate, if its chunk is live.
    pub fn block_at(&self, world: Point3<i32>) -> Option<BlockType> {
        self.state.world.block_at_world(world)
    }

    /// Edits a block in a live chunk. The chunk and its neighbors are remeshed on
    /// the next frame.
    pub fn set_block(&mut self, world: Point3<i32>, block_type: BlockType) -> Result<(), EditError> {
        if !self.atlas.supports(block_type) {
            return Err(EditError::UnsupportedBlock(block_type));
        }
        if !self.state.world.set_block_at_world(world, block_type) {
            return Err(EditError::ChunkNotLoaded(coords::world_to_chunk(world)));
        }
        Ok(())
    }

    /// Runs the streaming steps of a frame without drawing: evict, generate, remesh.
    pub fn update(&mut self, viewpoint: Point3<f32>) -> FrameStats {
        let started = Instant::now();
        self.state.frame = FrameStats::default();

        let center = coords::chunk_containing(viewpoint);
        self.state.required = required_set(center, self.radius, self.shape);

        self.evict();

        if let Some(workers) = self.workers.as_mut() {
            workers.process_completed_tasks(&mut self.state);
        }

        if self.workers.as_ref().is_some_and(|workers| !workers.has_live_workers()) {
            warn!("{}, generating synchronously from now on", GenerationError::WorkerDisconnected);
            self.workers = None;
            self.state.pending.clear();
        }

        self.generate_missing(center);

        if let Some(workers) = self.workers.as_mut() {
            workers.process_queued_tasks();
        }

        self.state.frame.remeshed = self.state.world.rebuild_dirty(&self.atlas);
        self.state.frame.pending = self.state.pending.len();
        self.state.frame.live = self.state.world.len();

        let frame = &self.state.frame;
        if frame.loaded + frame.evicted + frame.remeshed + frame.failed > 0 {
            debug!(
                "Streaming around {:?}: +{} -{} remeshed {} failed {} pending {} live {} in {:?}",
                center,
                frame.loaded,
                frame.evicted,
                frame.remeshed,
                frame.failed,
                frame.pending,
                frame.live,
                started.elapsed()
            );
        }

        self.state.frame.clone()
    }

    /// Streams chunks around `viewpoint` and submits every live mesh to `renderer`.
    pub fn render_world(
        &mut self,
        renderer: &mut dyn Renderer,
        viewpoint: Point3<f32>,
        view: Matrix4<f32>,
    ) -> FrameStats {
        let mut frame = self.update(viewpoint);

        let vertex_data = self.state.world.vertex_data();
        frame.vertex_floats = vertex_data.len();

        match renderer.render_data(&view, &vertex_data) {
            Ok(()) => frame.submitted = true,
            Err(RenderError::EmptyBuffer) => {
                debug!("Nothing to draw this frame");
                frame.render_error = Some(RenderError::EmptyBuffer);
            }
            Err(err) => {
                warn!("Renderer rejected frame: {}", err);
                frame.render_error = Some(err);
            }
        }

        self.state.frame = frame.clone();
        frame
    }

    fn evict(&mut self) {
        let stale: Vec<Point3<i32>> = self
            .state
            .world
            .positions()
            .filter(|position| !self.state.required.contains(position))
            .collect();

        for position in stale {
            self.state.world.remove_chunk(position);
            self.state.frame.evicted += 1;
        }
    }

    fn generate_missing(&mut self, center: Point3<i32>) {
        let mut missing: Vec<Point3<i32>> = self
            .state
            .required
            .iter()
            .copied()
            .filter(|position| !self.state.world.contains_chunk(*position))
            .filter(|position| !self.state.pending.contains(position))
            .collect();
        missing.sort_by_key(|position| (distance_squared(*position, center), position.x, position.y, position.z));

        for position in missing {
            // Leftovers are recomputed next frame against the new required set.
            if self.workers.as_ref().is_some_and(|workers| !workers.has_free_worker()) {
                break;
            }

            let task = ChunkGenerationTask::new(self.generator.clone(), self.atlas.clone(), position);
            match self.workers.as_mut() {
                Some(workers) => {
                    self.state.pending.insert(position);
                    workers.publish_task(Box::new(task));
                }
                None => {
                    let result: Box<dyn TaskResult<StreamingState> + Send> = task.process();
                    result.handle_result(&mut self.state);
                }
            }
        }
    }
}
