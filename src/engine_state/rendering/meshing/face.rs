use cgmath::{Point3, Vector3};

use crate::engine_state::{
    rendering::{
        atlas::TextureRegion,
        vertex::{Triangle, Vertex},
    },
    voxels::block::block_side::BlockSide,
};

/// Represents a single exposed unit face of a voxel.
///
/// A face is defined by four corner points (lower-left, lower-right, upper-right,
/// upper-left) in world space, seen from outside the block, plus the texture region
/// the atlas assigned to that face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Lower-left corner of the face in world coordinates
    pub ll: Point3<f32>,
    /// Lower-right corner of the face in world coordinates
    pub lr: Point3<f32>,
    /// Upper-right corner of the face in world coordinates
    pub ur: Point3<f32>,
    /// Upper-left corner of the face in world coordinates
    pub ul: Point3<f32>,
    /// Which side of the block this face represents
    pub block_side: BlockSide,
    /// Atlas region sampled by this face
    pub region: TextureRegion,
}

impl Face {
    /// Creates the face on `block_side` of the block whose minimum corner is `block_origin`.
    pub fn new(block_origin: Point3<f32>, block_side: BlockSide, region: TextureRegion) -> Self {
        let [ll, lr, ur, ul] = (*block_side.corners()).map(|corner| block_origin + Vector3::from(corner));

        Face {
            ll,
            lr,
            ur,
            ul,
            block_side,
            region,
        }
    }

    /// Splits the face into two counter-clockwise triangles and appends them to `triangles`.
    ///
    /// The lower edge samples the bottom of the tile (`v_max`) and the upper edge the top
    /// (`v_min`), so textures appear upright on side faces.
    pub fn push_triangles(&self, triangles: &mut Vec<Triangle>) {
        let region = &self.region;
        let ll = Vertex::new(self.ll, region.u_min, region.v_max, region);
        let lr = Vertex::new(self.lr, region.u_max, region.v_max, region);
        let ur = Vertex::new(self.ur, region.u_max, region.v_min, region);
        let ul = Vertex::new(self.ul, region.u_min, region.v_min, region);

        triangles.push(Triangle::new(ll, lr, ur));
        triangles.push(Triangle::new(ll, ur, ul));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_face_lies_one_above_block_origin() {
        let face = Face::new(Point3::new(16.0, 3.0, -2.0), BlockSide::TOP, TextureRegion::default());
        for corner in [face.ll, face.lr, face.ur, face.ul] {
            assert_eq!(corner.y, 4.0);
            assert!((16.0..=17.0).contains(&corner.x));
            assert!((-2.0..=-1.0).contains(&corner.z));
        }
    }

    #[test]
    fn face_becomes_two_triangles_sharing_the_diagonal() {
        let mut triangles = Vec::new();
        Face::new(Point3::new(0.0, 0.0, 0.0), BlockSide::FRONT, TextureRegion::default())
            .push_triangles(&mut triangles);

        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[0].vertices[0], triangles[1].vertices[0]);
        assert_eq!(triangles[0].vertices[2], triangles[1].vertices[1]);
    }
}
