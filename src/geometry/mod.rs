mod aabb;
mod ray_box_intersection;
mod ray_triangle_intersection;
mod transform;
mod triangle;

use nalgebra::Unit;

use crate::scene::MaterialIdx;

pub use aabb::AABB;
pub use ray_box_intersection::{RayIntersectionExt, SlabHit, intersect_unit_cube};
pub use transform::Transform;
pub use triangle::{BarycentricCoordinates, Triangle};

pub type FloatType = f32;

pub const EPSILON: FloatType = 1e-5;

/// Hit points are reported this far in front of the surface (measured along the ray),
/// so that a continuing ray doesn't immediately hit the same surface again.
pub const SURFACE_OFFSET: FloatType = 1e-4;

pub type ScreenPoint = nalgebra::Point2<u32>;
pub type ScreenSize = nalgebra::Vector2<u32>;

pub type WorldPoint = nalgebra::Point3<FloatType>;
pub type WorldVector = nalgebra::Vector3<FloatType>;
pub type WorldMatrix = nalgebra::Matrix4<FloatType>;
pub type WorldBox = AABB<WorldPoint>;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    pub origin: WorldPoint,
    /// Normalized direction of the ray
    pub direction: Unit<WorldVector>,
    /// Shutter time in [0, 1), moving geometry is displaced according to it
    pub time: FloatType,
}

impl Ray {
    pub fn new(origin: WorldPoint, direction: WorldVector) -> Ray {
        Ray {
            origin,
            direction: Unit::new_normalize(direction),
            time: 0.0,
        }
    }

    pub fn with_time(self, time: FloatType) -> Ray {
        Ray { time, ..self }
    }

    pub fn point_at(&self, distance: FloatType) -> WorldPoint {
        self.origin + self.direction.as_ref() * distance
    }

    /// Point at the given distance, pulled back toward the origin by `SURFACE_OFFSET`.
    pub fn surface_point_at(&self, distance: FloatType) -> WorldPoint {
        self.point_at(distance - SURFACE_OFFSET)
    }
}

/// Nearest intersection of a ray with the scene, everything in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HitRecord {
    /// Distance from the ray origin to `point`
    pub t: FloatType,
    pub point: WorldPoint,
    pub normal: Unit<WorldVector>,
    pub material: MaterialIdx,
}
