//! # Terrain Generation
//!
//! Deterministic chunk generators. A generator is a pure function from a chunk
//! coordinate to a filled [`Chunk`]: the same coordinate (and configuration) always
//! produces a bit-identical block grid, and generating one chunk never touches another.
//!
//! Several methods are available, selected by [`GenerationMethod`]:
//! - `noise`: a Perlin heightmap with stone, dirt and grass/sand strata, Perlin caves and
//!   seeded trees
//! - `flat`: the same strata at a constant height
//! - `checkerboard`, `solid` and `empty`: debugging patterns

use cgmath::Point3;
use log::trace;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::Instant;

use crate::engine_state::rendering::atlas::BlockAtlas;

use super::{
    block::block_type::BlockType,
    chunk::{Chunk, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_LENGTH},
    coords,
};

/// Trunk height of generated trees, in blocks.
const TRUNK_HEIGHT: i32 = 4;
/// Canopy radius around the top of the trunk.
const CANOPY_RADIUS: i32 = 2;
/// Caves are never carved within this many blocks of the surface.
const CAVE_SURFACE_MARGIN: i64 = 4;

/// Errors raised while producing a chunk.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("chunk {0:?} lies outside the addressable world")]
    CoordinateOutOfRange(Point3<i32>),
    #[error("generator places {0:?}, which the block atlas does not support")]
    UnsupportedBlock(BlockType),
    #[error("generation of chunk {0:?} panicked")]
    Panicked(Point3<i32>),
    #[error("generation worker pool is no longer running")]
    WorkerDisconnected,
    #[error("generation of chunk {position:?} failed: {reason}")]
    Failed { position: Point3<i32>, reason: String },
}

/// The method used to generate new chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMethod {
    /// Perlin heightmap terrain with caves and trees
    #[default]
    Noise,
    /// Constant-height strata
    Flat,
    /// Alternating solid and air cells
    Checkerboard,
    /// Every cell filled
    Solid,
    /// Every cell air
    Empty,
}

/// Tuning for the built-in terrain generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub method: GenerationMethod,
    /// Seed for every noise source and for tree placement
    pub seed: u32,
    /// World height of the surface before noise is applied
    pub base_height: i32,
    /// Thickness of the dirt band between stone and the surface block
    pub dirt_depth: i32,
    /// Surfaces at or below this height are sand instead of grass
    pub sand_level: i32,
    /// Scaling applied to world coordinates when sampling noise
    pub noise_scale: f64,
    /// Maximum deviation of the surface from `base_height`
    pub amplitude: f64,
    /// Half-width of the noise band carved out as caves; `0.0` disables caves
    pub cave_threshold: f64,
    /// Probability of a tree on each eligible grass column
    pub tree_density: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig {
            method: GenerationMethod::Noise,
            seed: 0,
            base_height: 16,
            dirt_depth: 3,
            sand_level: 12,
            noise_scale: 0.02,
            amplitude: 10.0,
            cave_threshold: 0.05,
            tree_density: 0.01,
        }
    }
}

/// Produces the blocks of a chunk from its coordinate.
///
/// Implementations must be deterministic and must only place block types listed by
/// [`TerrainGenerator::palette`].
pub trait TerrainGenerator: Send + Sync {
    /// Every block type this generator may place.
    fn palette(&self) -> Vec<BlockType>;

    /// Fills `chunk`, whose minimum corner is the world block `origin`.
    fn fill(&self, chunk: &mut Chunk, origin: Point3<i32>);

    /// Checks that `atlas` can texture every block type in the palette.
    fn check_palette(&self, atlas: &BlockAtlas) -> Result<(), GenerationError> {
        match self.palette().into_iter().find(|block| !atlas.supports(*block)) {
            Some(unsupported) => Err(GenerationError::UnsupportedBlock(unsupported)),
            None => Ok(()),
        }
    }

    /// Creates and fills the chunk at `position`.
    ///
    /// # Errors
    /// Fails if the chunk's blocks are not addressable in world coordinates or if the
    /// palette contains a block type `atlas` cannot texture.
    fn generate(&self, position: Point3<i32>, atlas: &BlockAtlas) -> Result<Chunk, GenerationError> {
        let origin =
            coords::chunk_origin(position).ok_or(GenerationError::CoordinateOutOfRange(position))?;

        self.check_palette(atlas)?;

        let started = Instant::now();
        let mut chunk = Chunk::new(position);
        self.fill(&mut chunk, origin);
        trace!("Generated chunk {:?} in {:?}", position, started.elapsed());

        Ok(chunk)
    }
}

/// The configuration-driven terrain generator.
pub struct Terrain {
    config: TerrainConfig,
    surface: Perlin,
    caves: Perlin,
}

impl Terrain {
    pub fn new(config: TerrainConfig) -> Self {
        Terrain {
            surface: Perlin::new(config.seed),
            caves: Perlin::new(config.seed.wrapping_add(1)),
            config,
        }
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// World height of the surface block in the column at world `(x, z)`.
    pub fn surface_height(&self, x: i32, z: i32) -> i64 {
        match self.config.method {
            GenerationMethod::Noise => {
                let scale = self.config.noise_scale;
                let sample = self.surface.get([x as f64 * scale, z as f64 * scale]);
                self.config.base_height as i64 + (sample * self.config.amplitude).floor() as i64
            }
            _ => self.config.base_height as i64,
        }
    }

    fn surface_block(&self, surface: i64) -> BlockType {
        if surface <= self.config.sand_level as i64 {
            BlockType::SAND
        } else {
            BlockType::GRASS
        }
    }

    fn is_cave(&self, world: [i64; 3], surface: i64) -> bool {
        if self.config.cave_threshold <= 0.0 || world[1] > surface - CAVE_SURFACE_MARGIN {
            return false;
        }
        let scale = self.config.noise_scale * 2.0;
        let sample = self.caves.get([
            world[0] as f64 * scale,
            world[1] as f64 * scale,
            world[2] as f64 * scale,
        ]);
        sample.abs() < self.config.cave_threshold
    }

    /// Fills the whole-layer band of world heights `[bottom, top)` clipped to the chunk.
    fn fill_band(chunk: &mut Chunk, origin_y: i32, bottom: i64, top: i64, block_type: BlockType) {
        let chunk_bottom = origin_y as i64;
        let chunk_top = chunk_bottom + CHUNK_HEIGHT as i64;
        let bottom = bottom.max(chunk_bottom);
        let top = top.min(chunk_top);
        if top > bottom {
            chunk.set_horizontal_layers((bottom - chunk_bottom) as i32, (top - bottom) as i32, block_type);
        }
    }

    fn fill_flat(&self, chunk: &mut Chunk, origin: Point3<i32>) {
        let surface = self.config.base_height as i64;
        let dirt_bottom = surface - self.config.dirt_depth.max(0) as i64;

        Self::fill_band(chunk, origin.y, i64::MIN, dirt_bottom, BlockType::STONE);
        Self::fill_band(chunk, origin.y, dirt_bottom, surface, BlockType::DIRT);
        Self::fill_band(chunk, origin.y, surface, surface + 1, self.surface_block(surface));
    }

    fn fill_noise(&self, chunk: &mut Chunk, origin: Point3<i32>) {
        let chunk_bottom = origin.y as i64;
        let mut surfaces = [[0i64; CHUNK_DEPTH as usize]; CHUNK_LENGTH as usize];

        for x in 0..CHUNK_LENGTH {
            for z in 0..CHUNK_DEPTH {
                let world_x = origin.x + x;
                let world_z = origin.z + z;
                let surface = self.surface_height(world_x, world_z);
                surfaces[x as usize][z as usize] = surface;
                let dirt_bottom = surface - self.config.dirt_depth.max(0) as i64;

                for y in 0..CHUNK_HEIGHT {
                    let world_y = chunk_bottom + y as i64;
                    let block_type = if world_y > surface {
                        continue;
                    } else if world_y == surface {
                        self.surface_block(surface)
                    } else if world_y >= dirt_bottom {
                        BlockType::DIRT
                    } else {
                        BlockType::STONE
                    };

                    if self.is_cave([world_x as i64, world_y, world_z as i64], surface) {
                        continue;
                    }
                    chunk.set_block(x, y, z, block_type);
                }
            }
        }

        self.plant_trees(chunk, origin, &surfaces);
    }

    /// Places trees on grass columns where the whole tree fits inside the chunk.
    fn plant_trees(
        &self,
        chunk: &mut Chunk,
        origin: Point3<i32>,
        surfaces: &[[i64; CHUNK_DEPTH as usize]; CHUNK_LENGTH as usize],
    ) {
        if self.config.tree_density <= 0.0 {
            return;
        }

        let mut rng = fastrand::Rng::with_seed(tree_seed(self.config.seed, chunk.position()));
        let tree_height = TRUNK_HEIGHT + CANOPY_RADIUS;

        for x in CANOPY_RADIUS..CHUNK_LENGTH - CANOPY_RADIUS {
            for z in CANOPY_RADIUS..CHUNK_DEPTH - CANOPY_RADIUS {
                // Draw for every column so placement does not depend on the terrain below.
                let roll = rng.f64();
                let local_surface = surfaces[x as usize][z as usize] - origin.y as i64;
                if roll >= self.config.tree_density
                    || local_surface < 0
                    || local_surface + tree_height as i64 >= CHUNK_HEIGHT as i64
                {
                    continue;
                }
                let ground = local_surface as i32;
                if chunk.get_block(x, ground, z) != BlockType::GRASS {
                    continue;
                }
                Self::place_tree(chunk, x, ground + 1, z);
            }
        }
    }

    fn place_tree(chunk: &mut Chunk, x: i32, base: i32, z: i32) {
        let top = base + TRUNK_HEIGHT - 1;
        for dy in -1..=1 {
            let radius = if dy == 1 { CANOPY_RADIUS - 1 } else { CANOPY_RADIUS };
            for dz in -radius..=radius {
                chunk.set_row(x - radius, top + dy, z + dz, 2 * radius + 1, BlockType::LEAVES);
            }
        }
        for y in base..=top {
            chunk.set_block(x, y, z, BlockType::WOOD);
        }
    }

    fn fill_checkerboard(chunk: &mut Chunk, origin: Point3<i32>) {
        for x in 0..CHUNK_LENGTH {
            for y in 0..CHUNK_HEIGHT {
                for z in 0..CHUNK_DEPTH {
                    let parity = (origin.x as i64 + x as i64)
                        + (origin.y as i64 + y as i64)
                        + (origin.z as i64 + z as i64);
                    if parity.rem_euclid(2) == 0 {
                        chunk.set_block(x, y, z, BlockType::DIRT);
                    }
                }
            }
        }
    }
}

impl TerrainGenerator for Terrain {
    fn palette(&self) -> Vec<BlockType> {
        match self.config.method {
            GenerationMethod::Noise => vec![
                BlockType::STONE,
                BlockType::DIRT,
                BlockType::GRASS,
                BlockType::SAND,
                BlockType::WOOD,
                BlockType::LEAVES,
            ],
            GenerationMethod::Flat => {
                let surface = self.surface_block(self.config.base_height as i64);
                vec![BlockType::STONE, BlockType::DIRT, surface]
            }
            GenerationMethod::Checkerboard | GenerationMethod::Solid => vec![BlockType::DIRT],
            GenerationMethod::Empty => Vec::new(),
        }
    }

    fn fill(&self, chunk: &mut Chunk, origin: Point3<i32>) {
        match self.config.method {
            GenerationMethod::Noise => self.fill_noise(chunk, origin),
            GenerationMethod::Flat => self.fill_flat(chunk, origin),
            GenerationMethod::Checkerboard => Self::fill_checkerboard(chunk, origin),
            GenerationMethod::Solid => chunk.fill_chunk(BlockType::DIRT),
            GenerationMethod::Empty => {}
        }
    }
}

/// Per-chunk seed for feature placement.
fn tree_seed(seed: u32, position: Point3<i32>) -> u64 {
    (seed as u64)
        ^ (position.x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (position.y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        ^ (position.z as u64).wrapping_mul(0x1656_67B1_9E37_79F9)
}
