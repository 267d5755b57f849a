//! # Voxel Task System
//!
//! Tasks related to voxel world generation. They run on the task manager's workers
//! in background mode, or inline in synchronous mode.

pub mod chunk_generation_task;
