mod scatter;
mod sky;

use index_vec::IndexSlice;

pub use scatter::{Scattered, scatter};
pub use sky::sky_color;

use crate::{
    geometry::HitRecord,
    renderer::PathSegment,
    scene::{Material, MaterialIdx},
    util::{BLACK, modulate},
};

/// Advances an active path by one bounce.
///
/// Misses pick up the sky (or black without ambient light) and terminate, lights multiply
/// in their emission and terminate, anything else scatters and spends one bounce.
/// A path that runs out of bounces without reaching a light is treated as escaping to the sky.
pub fn shade_path(
    path: &mut PathSegment,
    hit: Option<&HitRecord>,
    materials: &IndexSlice<MaterialIdx, [Material]>,
    ambient_light: bool,
    rng: &mut impl rand::Rng,
) {
    let Some(hit) = hit else {
        escape(path, ambient_light);
        return;
    };

    let material = &materials[hit.material];
    if material.is_emissive() {
        path.color = modulate(path.color, material.color * material.emittance);
        path.terminate();
        return;
    }

    let scattered = scatter(&path.ray, hit, material, rng);
    path.ray = scattered.ray;
    path.color = modulate(path.color, scattered.weight);
    path.remaining_bounces -= 1;

    if !path.is_active() {
        escape(path, ambient_light);
    }
}

fn escape(path: &mut PathSegment, ambient_light: bool) {
    path.color = if ambient_light {
        modulate(path.color, sky_color(&path.ray.direction))
    } else {
        BLACK
    };
    path.terminate();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geometry::{Ray, WorldPoint, WorldVector},
        sampling::{Stream, path_rng},
        util::{Rgb, WHITE},
    };
    use assert2::assert;
    use index_vec::IndexVec;
    use nalgebra::Unit;

    fn materials() -> IndexVec<MaterialIdx, Material> {
        let mut materials = IndexVec::new();
        materials.push(
            Material::builder()
                .color(Rgb {
                    r: 1.0,
                    g: 0.5,
                    b: 0.25,
                })
                .emittance(4.0)
                .build(),
        );
        materials.push(
            Material::builder()
                .color(Rgb {
                    r: 0.5,
                    g: 0.5,
                    b: 0.5,
                })
                .build(),
        );
        materials
    }

    fn hit(material: usize) -> HitRecord {
        HitRecord {
            t: 2.0,
            point: WorldPoint::new(0.0, 0.0, -2.0),
            normal: Unit::new_normalize(WorldVector::z()),
            material: MaterialIdx::from_usize(material),
        }
    }

    fn path(bounces: u32) -> PathSegment {
        PathSegment::new(
            Ray::new(WorldPoint::origin(), WorldVector::new(0.0, 0.0, -1.0)),
            0,
            bounces,
        )
    }

    #[test]
    fn miss_with_ambient_light() {
        let mut p = path(3);
        let mut rng = path_rng(0, 0, Stream::Bounce(0));
        shade_path(&mut p, None, &materials(), true, &mut rng);

        assert!(!p.is_active());
        assert!(p.color == sky_color(&WorldVector::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn miss_without_ambient_light() {
        let mut p = path(3);
        let mut rng = path_rng(0, 0, Stream::Bounce(0));
        shade_path(&mut p, None, &materials(), false, &mut rng);

        assert!(!p.is_active());
        assert!(p.color == BLACK);
    }

    #[test]
    fn light_terminates() {
        let mut p = path(3);
        let mut rng = path_rng(0, 0, Stream::Bounce(0));
        shade_path(&mut p, Some(&hit(0)), &materials(), true, &mut rng);

        assert!(!p.is_active());
        assert!(p.color == Rgb { r: 4.0, g: 2.0, b: 1.0 });
    }

    #[test]
    fn diffuse_spends_a_bounce() {
        let mut p = path(3);
        let mut rng = path_rng(0, 0, Stream::Bounce(0));
        shade_path(&mut p, Some(&hit(1)), &materials(), true, &mut rng);

        assert!(p.remaining_bounces == 2);
        assert!(p.color == Rgb { r: 0.5, g: 0.5, b: 0.5 });
        assert!(p.ray.direction.z > 0.0);
    }

    #[test]
    fn last_bounce_escapes_to_sky() {
        let mut p = path(1);
        let mut rng = path_rng(0, 0, Stream::Bounce(0));
        shade_path(&mut p, Some(&hit(1)), &materials(), true, &mut rng);

        assert!(!p.is_active());
        let sky = sky_color(&p.ray.direction);
        assert!(p.color == modulate(Rgb { r: 0.5, g: 0.5, b: 0.5 }, sky));
        assert!(p.color != WHITE);
    }
}
