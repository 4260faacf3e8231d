use index_vec::IndexSlice;

use crate::geometry::{
    FloatType, HitRecord, Ray, RayIntersectionExt as _, WorldPoint, WorldVector,
    intersect_unit_cube,
};

use super::{Geometry, MeshTriangle, Shape, TriangleIdx};

const SPHERE_RADIUS: FloatType = 0.5;

impl Geometry {
    /// Intersects a world space ray with this geometry.
    /// The returned distance is measured in world space from the original ray origin.
    pub fn intersect(
        &self,
        ray: &Ray,
        triangles: &IndexSlice<TriangleIdx, [MeshTriangle]>,
        mesh_culling: bool,
    ) -> Option<HitRecord> {
        let displacement = self.displacement(ray.time);
        let object_ray = Ray::new(
            self.transform.point_to_object(&(ray.origin - displacement)),
            self.transform.vector_to_object(&ray.direction),
        );

        let (object_point, object_normal) = match &self.shape {
            Shape::Sphere => intersect_sphere(&object_ray)?,
            Shape::Cube => intersect_cube(&object_ray)?,
            Shape::Mesh {
                triangles: range,
                bounds,
            } => {
                if mesh_culling && !bounds.is_hit(&object_ray) {
                    return None;
                }
                intersect_mesh(&object_ray, &triangles[range.clone()])?
            }
        };

        let point = self.transform.point_to_world(&object_point) + displacement;
        Some(HitRecord {
            t: (point - ray.origin).norm(),
            point,
            normal: self.transform.normal_to_world(&object_normal),
            material: self.material,
        })
    }
}

/// Returns object space hit point and (unnormalized) normal.
/// If the ray starts inside the sphere, the exit point is returned.
fn intersect_sphere(ray: &Ray) -> Option<(WorldPoint, WorldVector)> {
    let b = ray.origin.coords.dot(ray.direction.as_ref());
    let radicand = b * b - (ray.origin.coords.norm_squared() - SPHERE_RADIUS * SPHERE_RADIUS);
    if radicand < 0.0 {
        return None;
    }

    let root = radicand.sqrt();
    let t1 = -b + root;
    let t2 = -b - root;
    let t = if t1 < 0.0 && t2 < 0.0 {
        return None;
    } else if t1 > 0.0 && t2 > 0.0 {
        t1.min(t2)
    } else {
        t1.max(t2)
    };

    let point = ray.surface_point_at(t);
    Some((point, point.coords))
}

/// Returns object space hit point and face normal.
/// If the ray starts inside the cube, the exit point is returned.
fn intersect_cube(ray: &Ray) -> Option<(WorldPoint, WorldVector)> {
    let (entry, exit) = intersect_unit_cube(ray)?;
    let crossing = if entry.t <= 0.0 { exit } else { entry };
    Some((ray.surface_point_at(crossing.t), crossing.normal))
}

/// Nearest triangle hit, with the interpolated shading normal turned against the ray.
fn intersect_mesh(
    ray: &Ray,
    triangles: &IndexSlice<TriangleIdx, [MeshTriangle]>,
) -> Option<(WorldPoint, WorldVector)> {
    let (t, uv, triangle) = triangles
        .iter()
        .filter_map(|triangle| {
            triangle
                .positions
                .intersect(ray)
                .map(|(t, uv)| (t, uv, triangle))
        })
        .filter(|(t, _, _)| *t > 0.0)
        .min_by(|a, b| a.0.total_cmp(&b.0))?;

    let normal = uv.interpolate_triangle(&triangle.normals);
    let normal = if normal.dot(ray.direction.as_ref()) > 0.0 {
        -normal
    } else {
        normal
    };

    Some((ray.surface_point_at(t), normal))
}
