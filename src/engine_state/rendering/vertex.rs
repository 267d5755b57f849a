//! Vertex data structures for voxel rendering.
//!
//! This module defines the vertex format handed to the renderer. Meshes are kept as
//! plain-old-data triangles so a chunk's whole mesh can be reinterpreted as the flat
//! float buffer the renderer expects without copying.

use cgmath::Point3;

use super::atlas::TextureRegion;

/// Number of floats per vertex in the flattened buffer: `x y z u v layer`.
pub const FLOATS_PER_VERTEX: usize = 6;
/// Number of vertices per triangle.
pub const VERTICES_PER_TRIANGLE: usize = 3;
/// Number of floats per triangle in the flattened buffer.
pub const FLOATS_PER_TRIANGLE: usize = FLOATS_PER_VERTEX * VERTICES_PER_TRIANGLE;

/// A vertex in the voxel rendering pipeline.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes), world space
/// - Texture coordinates: u, v, atlas layer (12 bytes)
///
/// Total size: 24 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// X, Y, Z coordinate in world space
    pub position: [f32; 3],
    /// U, V texture coordinates followed by the atlas tile (layer) index
    pub tex_coords: [f32; 3],
}

impl Vertex {
    /// Creates a new vertex from a world position and a texture coordinate inside `region`.
    pub fn new(position: Point3<f32>, u: f32, v: f32, region: &TextureRegion) -> Self {
        Vertex {
            position: position.into(),
            tex_coords: [u, v, region.tile as f32],
        }
    }

    /// World-space position of the vertex.
    pub fn position(&self) -> Point3<f32> {
        Point3::from(self.position)
    }
}

/// One triangle of a chunk mesh.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Triangle {
    /// The three corners, counter-clockwise when viewed from the visible side
    pub vertices: [Vertex; VERTICES_PER_TRIANGLE],
}

impl Triangle {
    /// Creates a triangle from three vertices.
    pub fn new(a: Vertex, b: Vertex, c: Vertex) -> Self {
        Triangle { vertices: [a, b, c] }
    }
}

/// Reinterprets a triangle list as the flat float sequence the renderer consumes.
pub fn flatten(triangles: &[Triangle]) -> &[f32] {
    bytemuck::cast_slice(triangles)
}
