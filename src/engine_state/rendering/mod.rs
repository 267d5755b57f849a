//! Rendering side of the voxel engine.
//!
//! Meshing turns exposed block faces into [`vertex::Triangle`]s textured through the
//! [`atlas::BlockAtlas`]. Drawing itself happens behind the [`Renderer`] trait: the
//! chunk manager hands it one flat vertex buffer and a view matrix per frame.

use cgmath::Matrix4;
use log::{debug, info};
use thiserror::Error;

use vertex::{FLOATS_PER_TRIANGLE, FLOATS_PER_VERTEX};

pub mod atlas;
pub mod meshing;
pub mod vertex;

// Re-export commonly used types
pub use vertex::{Triangle, Vertex};

/// Errors a renderer may report for a frame. None of them are fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Nothing to draw this frame
    #[error("vertex buffer is empty")]
    EmptyBuffer,
    /// The buffer is not a whole number of triangles
    #[error("vertex buffer of {0} floats is not a whole number of triangles")]
    MalformedBuffer(usize),
    /// Drawing failed in the backend; the next frame is tried as usual
    #[error("renderer backend error: {0}")]
    Backend(String),
}

/// Draws a frame of voxel geometry.
///
/// `vertex_data` holds 6 floats per vertex (`x y z u v layer`) and 3 vertices per
/// triangle, in world space.
pub trait Renderer {
    fn render_data(&mut self, view: &Matrix4<f32>, vertex_data: &[f32]) -> Result<(), RenderError>;
}

/// Checks the shape of a frame's vertex buffer before it is drawn.
pub fn validate_vertex_data(vertex_data: &[f32]) -> Result<(), RenderError> {
    if vertex_data.is_empty() {
        return Err(RenderError::EmptyBuffer);
    }
    if vertex_data.len() % FLOATS_PER_TRIANGLE != 0 {
        return Err(RenderError::MalformedBuffer(vertex_data.len()));
    }
    Ok(())
}

/// A headless renderer that logs what it would draw.
#[derive(Debug, Default)]
pub struct LoggingRenderer {
    frames: u64,
    last_vertex_count: usize,
}

impl LoggingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames drawn.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Vertices in the most recent frame.
    pub fn last_vertex_count(&self) -> usize {
        self.last_vertex_count
    }
}

impl Renderer for LoggingRenderer {
    fn render_data(&mut self, view: &Matrix4<f32>, vertex_data: &[f32]) -> Result<(), RenderError> {
        validate_vertex_data(vertex_data)?;

        self.frames += 1;
        self.last_vertex_count = vertex_data.len() / FLOATS_PER_VERTEX;

        debug!("View matrix: {:?}", view);
        info!(
            "Frame {}: drawing {} triangles",
            self.frames,
            vertex_data.len() / FLOATS_PER_TRIANGLE
        );
        Ok(())
    }
}
