//! # Engine State Module
//!
//! The core engine module that ties the voxel world to a renderer.
//!
//! ## Key Components
//!
//! * `EngineState` - Drives the chunk manager and renderer from a viewpoint each frame
//! * `chunk_manager` - Decides which chunks are live, generated and remeshed
//! * `rendering` - Atlas, vertex format, meshing and the renderer interface
//! * `task_management` - Worker pool for background chunk generation
//! * `voxels` - Blocks, chunks, coordinates, terrain and the live set
//!
//! ## Architecture
//!
//! Each subsystem owns one concern. `EngineState` keeps the chunk manager and the
//! renderer together and turns a camera position and look direction into a frame.

use cgmath::{Matrix4, Point3, Vector3};
use log::info;
use web_time::{Duration, Instant};

use crate::config::WorldConfig;

use chunk_manager::{ChunkManager, FrameStats};
use rendering::{atlas::BlockAtlas, Renderer};
use voxels::terrain::GenerationError;

pub mod chunk_manager;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// Totals over every frame an `EngineState` has drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub frames: u64,
    pub submitted_frames: u64,
    pub chunks_loaded: usize,
    pub chunks_evicted: usize,
    pub meshes_rebuilt: usize,
    pub generation_failures: usize,
    pub frame_time: Duration,
}

impl SessionStats {
    fn record(&mut self, frame: &FrameStats, elapsed: Duration) {
        self.frames += 1;
        if frame.submitted {
            self.submitted_frames += 1;
        }
        self.chunks_loaded += frame.loaded;
        self.chunks_evicted += frame.evicted;
        self.meshes_rebuilt += frame.remeshed;
        self.generation_failures += frame.failed;
        self.frame_time += elapsed;
    }

    /// Mean wall time per frame.
    pub fn average_frame_time(&self) -> Duration {
        match u32::try_from(self.frames) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(frames) => self.frame_time / frames,
        }
    }
}

/// The main state container for the voxel engine.
pub struct EngineState {
    pub chunk_manager: ChunkManager,
    renderer: Box<dyn Renderer>,
    stats: SessionStats,
}

impl EngineState {
    pub fn new(
        config: &WorldConfig,
        atlas: BlockAtlas,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self, GenerationError> {
        Ok(EngineState {
            chunk_manager: ChunkManager::new(config, atlas)?,
            renderer,
            stats: SessionStats::default(),
        })
    }

    /// Draws one frame seen from `eye` looking along `direction`.
    pub fn render(&mut self, eye: Point3<f32>, direction: Vector3<f32>) -> FrameStats {
        let started = Instant::now();
        let view = Matrix4::look_to_rh(eye, direction, Vector3::unit_y());

        let frame = self
            .chunk_manager
            .render_world(self.renderer.as_mut(), eye, view);

        self.stats.record(&frame, started.elapsed());
        frame
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Logs the session totals.
    pub fn log_summary(&self) {
        let stats = &self.stats;
        info!(
            "{} frames ({} drawn), {} chunks loaded, {} evicted, {} meshes rebuilt, {} failures, {:?} per frame",
            stats.frames,
            stats.submitted_frames,
            stats.chunks_loaded,
            stats.chunks_evicted,
            stats.meshes_rebuilt,
            stats.generation_failures,
            stats.average_frame_time()
        );
    }
}
