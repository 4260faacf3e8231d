use crate::geometry::{BarycentricCoordinates, FloatType, Ray, Triangle, WorldPoint};

impl Triangle<WorldPoint> {
    /// Calculates ray intersection with the (two sided) triangle.
    /// Returns distance along ray and barycentric uv coordinates, None for misses,
    /// intersections behind the ray origin and rays parallel to the triangle plane.
    /// Adapted from https://en.wikipedia.org/wiki/M%C3%B6ller%E2%80%93Trumbore_intersection_algorithm#Rust_implementation
    pub fn intersect(&self, ray: &Ray) -> Option<(FloatType, BarycentricCoordinates)> {
        let [e1, e2] = self.edges();

        let ray_cross_e2 = ray.direction.cross(&e2);
        let det = e1.dot(&ray_cross_e2);
        if det.abs() < FloatType::EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = ray.origin - self[0];
        let u = inv_det * s.dot(&ray_cross_e2);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let s_cross_e1 = s.cross(&e1);
        let v = inv_det * ray.direction.dot(&s_cross_e1);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = inv_det * e2.dot(&s_cross_e1);
        if t < 0.0 {
            return None;
        }

        Some((t, BarycentricCoordinates { u, v }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::WorldVector;
    use assert2::{assert, let_assert};
    use test_case::test_case;

    fn test_triangle() -> Triangle<WorldPoint> {
        Triangle::new(
            WorldPoint::new(0.0, 0.0, 0.0),
            WorldPoint::new(1.0, 0.0, 0.0),
            WorldPoint::new(0.0, 1.0, 0.0),
        )
    }

    #[test_case(1.0 ; "front")]
    #[test_case(-1.0 ; "back")]
    fn hit_from_both_sides(side: f32) {
        let ray = Ray::new(
            WorldPoint::new(0.25, 0.5, 2.0 * side),
            WorldVector::new(0.0, 0.0, -side),
        );
        let_assert!(Some((t, uv)) = test_triangle().intersect(&ray));

        assert!((t - 2.0).abs() < 1e-6);
        assert!((uv.u - 0.25).abs() < 1e-6);
        assert!((uv.v - 0.5).abs() < 1e-6);
    }

    #[test_case(0.75, 0.75 ; "beyond_hypotenuse")]
    #[test_case(-0.1, 0.5 ; "left_of_edge")]
    #[test_case(0.5, -0.1 ; "below_edge")]
    fn narrow_misses(x: f32, y: f32) {
        let ray = Ray::new(WorldPoint::new(x, y, 1.0), WorldVector::new(0.0, 0.0, -1.0));
        assert!(test_triangle().intersect(&ray).is_none());
    }

    #[test]
    fn behind_origin() {
        let ray = Ray::new(WorldPoint::new(0.25, 0.25, 1.0), WorldVector::new(0.0, 0.0, 1.0));
        assert!(test_triangle().intersect(&ray).is_none());
    }

    #[test]
    fn parallel_to_plane() {
        let ray = Ray::new(WorldPoint::new(-1.0, 0.25, 0.0), WorldVector::new(1.0, 0.0, 0.0));
        assert!(test_triangle().intersect(&ray).is_none());
    }

    #[test]
    fn degenerate_triangle() {
        let triangle = Triangle::new(
            WorldPoint::new(0.0, 0.0, 0.0),
            WorldPoint::new(1.0, 1.0, 0.0),
            WorldPoint::new(2.0, 2.0, 0.0),
        );
        let ray = Ray::new(WorldPoint::new(1.0, 1.0, 1.0), WorldVector::new(0.0, 0.0, -1.0));
        assert!(triangle.intersect(&ray).is_none());
    }
}
