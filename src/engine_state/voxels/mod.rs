//! # Voxel Engine Core
//!
//! This module contains the voxel world model: block types, chunks and their
//! meshing, coordinate mapping, terrain generation and the live set of chunks.
//!
//! ## Architecture
//!
//! * **Block**: Defines voxel types and the six block faces
//! * **Chunk**: A fixed-size 3D array of blocks plus its cached mesh
//! * **Coords**: Floor-division mapping between world, chunk and local coordinates
//! * **Terrain**: Deterministic chunk generators
//! * **World**: The live set of chunks with neighbor-aware invalidation
//! * **Tasks**: Chunk generation work for the task manager
//!
//! ## Data Flow
//!
//! 1. The chunk manager asks a terrain generator for newly required chunks
//! 2. Generated chunks join the world, dirtying themselves and their neighbors
//! 3. Dirty chunks rebuild their meshes against the world as neighbor lookup
//! 4. Meshes are concatenated and handed to the renderer

pub mod block;
pub mod chunk;
pub mod coords;
pub mod tasks;
pub mod terrain;
pub mod world;
