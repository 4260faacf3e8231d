use crate::geometry::{FloatType, Ray, WorldBox, WorldVector};

/// Starting values of the slab interval, finite so that infinite slab distances still
/// shrink the interval.
const FAR: FloatType = 1e38;

/// GLSL style minimum (`y < x ? y : x`), a NaN first argument propagates.
/// Directions parallel to a slab divide zero by zero when the ray origin lies on the slab
/// plane. If the NaN survives, it fails every comparison below and the axis doesn't
/// constrain the interval.
#[inline(always)]
fn slab_min(x: FloatType, y: FloatType) -> FloatType {
    if y < x { y } else { x }
}

/// GLSL style maximum (`x < y ? y : x`), a NaN first argument propagates.
#[inline(always)]
fn slab_max(x: FloatType, y: FloatType) -> FloatType {
    if x < y { y } else { x }
}

pub trait RayIntersectionExt {
    /// Calculate first and last ray intersection with the box.
    fn intersect(&self, ray: &Ray) -> (FloatType, FloatType);

    /// Does the ray hit the box in front of its origin (or start inside)?
    fn is_hit(&self, ray: &Ray) -> bool {
        let (min_t, max_t) = self.intersect(ray);
        max_t >= min_t && max_t > 0.0
    }
}

impl RayIntersectionExt for WorldBox {
    /// Returns entry and exit distance along the ray.
    /// Only entries in front of the ray origin are recorded, if the ray starts inside the box
    /// the entry is left at -1e38.
    fn intersect(&self, ray: &Ray) -> (FloatType, FloatType) {
        let mut min_t = -FAR;
        let mut max_t = FAR;

        for axis in 0..3 {
            let d = ray.direction[axis];
            // Division by zero is expected here, infinities order correctly
            let t1 = (self.min[axis] - ray.origin[axis]) / d;
            let t2 = (self.max[axis] - ray.origin[axis]) / d;
            let ta = slab_min(t1, t2);
            let tb = slab_max(t1, t2);

            if ta > 0.0 && ta > min_t {
                min_t = ta;
            }
            if tb < max_t {
                max_t = tb;
            }
        }

        (min_t, max_t)
    }
}

/// Crossing of a ray with one face of a box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SlabHit {
    pub t: FloatType,
    /// Axis aligned normal of the crossed face, pointing out of the box
    pub normal: WorldVector,
}

/// Intersects a ray with the cube [-0.5, 0.5]^3.
/// Returns entry and exit crossings if the ray hits the cube and the exit is in front of
/// the origin. When the origin is inside the cube, the entry has non-positive `t` and zero
/// normal.
pub fn intersect_unit_cube(ray: &Ray) -> Option<(SlabHit, SlabHit)> {
    let mut entry = SlabHit {
        t: -FAR,
        normal: WorldVector::zeros(),
    };
    let mut exit = SlabHit {
        t: FAR,
        normal: WorldVector::zeros(),
    };

    for axis in 0..3 {
        let d = ray.direction[axis];
        let t1 = (-0.5 - ray.origin[axis]) / d;
        let t2 = (0.5 - ray.origin[axis]) / d;
        let ta = slab_min(t1, t2);
        let tb = slab_max(t1, t2);

        let mut normal = WorldVector::zeros();
        normal[axis] = if t2 < t1 { 1.0 } else { -1.0 };

        if ta > 0.0 && ta > entry.t {
            entry = SlabHit { t: ta, normal };
        }
        if tb < exit.t {
            normal[axis] = -normal[axis];
            exit = SlabHit { t: tb, normal };
        }
    }

    if exit.t >= entry.t && exit.t > 0.0 {
        Some((entry, exit))
    } else {
        None
    }
}
