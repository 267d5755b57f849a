#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! A streamed voxel world: fixed-size block chunks, face-culled meshing and a chunk
//! manager that keeps the chunks around a moving viewpoint generated, meshed and
//! submitted to a renderer every frame.
//!
//! ## Key Modules
//!
//! * `config` - JSON world configuration
//! * `engine_state` - Chunks, terrain, meshing, streaming and the renderer interface
//!
//! ## Usage
//!
//! ```no_run
//! use cgmath::{Matrix4, Point3, SquareMatrix};
//! use voxel_world::{BlockAtlas, ChunkManager, LoggingRenderer, WorldConfig};
//!
//! let mut manager = ChunkManager::new(&WorldConfig::default(), BlockAtlas::default())?;
//! let mut renderer = LoggingRenderer::new();
//! let stats = manager.render_world(&mut renderer, Point3::new(0.0, 24.0, 0.0), Matrix4::identity());
//! println!("{} chunks live", stats.live);
//! # Ok::<(), voxel_world::GenerationError>(())
//! ```
//!
//! The `voxel-world` binary runs the same loop headless along a scripted camera path.

use std::path::PathBuf;

use cgmath::{Point3, Vector3};
use log::info;
use thiserror::Error;

pub mod config;
pub mod engine_state;

pub use config::{ConfigError, WorldConfig};
pub use engine_state::{
    chunk_manager::{ChunkManager, EditError, FrameStats, RequiredShape},
    rendering::{
        atlas::{AtlasError, AtlasLayout, BlockAtlas, TextureRegion},
        LoggingRenderer, RenderError, Renderer,
    },
    voxels::{
        block::{block_side::BlockSide, block_type::BlockType},
        chunk::{Chunk, NeighborLookup, NoNeighbors, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_LENGTH},
        terrain::{GenerationError, GenerationMethod, Terrain, TerrainConfig, TerrainGenerator},
        world::World,
    },
    EngineState,
};

/// Environment variable naming a JSON `WorldConfig` file.
pub const CONFIG_ENV: &str = "VOXEL_WORLD_CONFIG";
/// Environment variable naming a JSON `AtlasLayout` file.
pub const ATLAS_LAYOUT_ENV: &str = "VOXEL_WORLD_ATLAS_LAYOUT";
/// Environment variable naming the atlas image, checked against the layout.
pub const ATLAS_IMAGE_ENV: &str = "VOXEL_WORLD_ATLAS";
/// Pixel size of one atlas tile.
pub const ATLAS_TILE_SIZE: u32 = 16;

const DEMO_FRAMES: u32 = 120;
const DEMO_START: [f32; 3] = [0.0, 24.0, 0.0];
const DEMO_SPEED: f32 = 1.5;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("atlas: {0}")]
    Atlas(#[from] AtlasError),
    #[error("terrain: {0}")]
    Terrain(#[from] GenerationError),
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name).map(PathBuf::from)
}

fn load_atlas() -> Result<BlockAtlas, RunError> {
    let layout = match env_path(ATLAS_LAYOUT_ENV) {
        Some(path) => AtlasLayout::load(path)?,
        None => AtlasLayout::default(),
    };

    let atlas = match env_path(ATLAS_IMAGE_ENV) {
        Some(path) => {
            let bytes = std::fs::read(&path).map_err(|source| RunError::Io { path, source })?;
            BlockAtlas::from_image_bytes(&bytes, ATLAS_TILE_SIZE, &layout)?
        }
        None => BlockAtlas::from_layout(&layout)?,
    };
    Ok(atlas)
}

/// Runs the headless demo: streams the world along a straight camera path and logs
/// each frame through a [`LoggingRenderer`].
pub fn run() -> Result<(), RunError> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = match env_path(CONFIG_ENV) {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            WorldConfig::load(path)?
        }
        None => WorldConfig::default(),
    };
    let atlas = load_atlas()?;

    let mut engine = EngineState::new(&config, atlas, Box::new(LoggingRenderer::new()))?;

    // Walk the camera along +x while slowly turning, so chunks stream in ahead and
    // are evicted behind.
    for frame in 0..DEMO_FRAMES {
        let t = frame as f32;
        let eye = Point3::from(DEMO_START) + Vector3::new(t * DEMO_SPEED, 0.0, 0.0);
        let direction = Vector3::new(1.0, -0.3, (t * 0.05).sin());
        engine.render(eye, direction);
    }

    engine.log_summary();
    Ok(())
}
