//! The set of chunk coordinates that must be live around a viewpoint.

use std::collections::HashSet;

use cgmath::Point3;
use serde::{Deserialize, Serialize};

/// Shape of the region kept loaded around the viewpoint's chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredShape {
    /// Every chunk within `radius` on each axis
    #[default]
    Cube,
    /// Every chunk whose squared offset is at most `radius²`
    Sphere,
}

impl RequiredShape {
    fn includes(self, dx: i32, dy: i32, dz: i32, radius: i32) -> bool {
        match self {
            RequiredShape::Cube => true,
            RequiredShape::Sphere => {
                let (dx, dy, dz, radius) = (dx as i64, dy as i64, dz as i64, radius as i64);
                dx * dx + dy * dy + dz * dz <= radius * radius
            }
        }
    }
}

/// Coordinates required around `center` for a chunk radius.
///
/// Coordinates that would overflow the chunk coordinate range are left out. A negative
/// radius is treated as zero, so the center chunk is always required.
pub fn required_set(center: Point3<i32>, radius: i32, shape: RequiredShape) -> HashSet<Point3<i32>> {
    let radius = radius.max(0);
    let mut required = HashSet::new();

    for dx in -radius..=radius {
        for dy in -radius..=radius {
            for dz in -radius..=radius {
                if !shape.includes(dx, dy, dz, radius) {
                    continue;
                }
                let position = (|| {
                    Some(Point3::new(
                        center.x.checked_add(dx)?,
                        center.y.checked_add(dy)?,
                        center.z.checked_add(dz)?,
                    ))
                })();
                if let Some(position) = position {
                    required.insert(position);
                }
            }
        }
    }

    required
}

/// Squared chunk distance, used to generate the closest chunks first.
pub fn distance_squared(a: Point3<i32>, b: Point3<i32>) -> i64 {
    let dx = a.x as i64 - b.x as i64;
    let dy = a.y as i64 - b.y as i64;
    let dz = a.z as i64 - b.z as i64;
    dx * dx + dy * dy + dz * dz
}
