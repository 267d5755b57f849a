//! Conversion of exposed block faces into triangles.
//!
//! Every visible face becomes its own quad (two triangles); faces are never merged,
//! so the geometry for a block depends only on that block and its six neighbors.

mod face;

pub use face::Face;
