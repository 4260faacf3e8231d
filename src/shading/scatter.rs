use nalgebra::Unit;
use rand::Rng;

use crate::{
    geometry::{FloatType, HitRecord, Ray, WorldVector},
    sampling::{OrthonormalBasis, cosine_hemisphere},
    scene::Material,
    util::Rgb,
};

/// Distance along the new direction that a scattered ray starts away from the hit point.
/// Has to exceed `SURFACE_OFFSET` so that refracted rays end up behind the surface.
const SCATTER_OFFSET: FloatType = 1e-3;

/// Outgoing ray of a bounce together with the throughput weight of the sampled lobe.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Scattered {
    pub ray: Ray,
    pub weight: Rgb,
}

/// Samples a new direction at a non-emissive hit.
///
/// Dielectrics pick between mirror reflection and refraction with Schlick's Fresnel
/// probability, falling back to reflection past the critical angle.
/// Other materials reflect with probability `reflectivity` and scatter diffusely otherwise.
/// The lobe weights are already divided by the probability of picking the lobe.
pub fn scatter(
    incoming: &Ray,
    hit: &HitRecord,
    material: &Material,
    rng: &mut impl Rng,
) -> Scattered {
    let (direction, weight) = if let Some(ior) = material.refraction {
        (dielectric(incoming, hit, ior, rng), material.specular.color)
    } else if material.reflectivity > 0.0 && rng.random::<FloatType>() < material.reflectivity {
        (
            glossy(&incoming.direction, &hit.normal, material.specular.exponent, rng),
            material.specular.color,
        )
    } else {
        (cosine_hemisphere(&hit.normal, rng), material.color)
    };

    Scattered {
        ray: Ray {
            origin: hit.point + direction.as_ref() * SCATTER_OFFSET,
            direction,
            time: incoming.time,
        },
        weight,
    }
}

fn reflect(direction: &Unit<WorldVector>, normal: &Unit<WorldVector>) -> Unit<WorldVector> {
    let d = direction.as_ref();
    let n = normal.as_ref();
    Unit::new_normalize(d - n * (2.0 * d.dot(n)))
}

/// Mirror direction spread by a Phong lobe of the given exponent, 0 gives a perfect mirror.
/// Samples that would leave below the surface fall back to the mirror direction.
fn glossy(
    direction: &Unit<WorldVector>,
    normal: &Unit<WorldVector>,
    exponent: FloatType,
    rng: &mut impl Rng,
) -> Unit<WorldVector> {
    let mirror = reflect(direction, normal);
    if exponent <= 0.0 {
        return mirror;
    }

    let cos_theta = rng.random::<FloatType>().powf(1.0 / (exponent + 1.0));
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = std::f32::consts::TAU * rng.random::<FloatType>();
    let local = WorldVector::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);
    let sample = Unit::new_normalize(OrthonormalBasis::new(&mirror).to_world(&local));

    if sample.dot(normal.as_ref()) > 0.0 {
        sample
    } else {
        mirror
    }
}

/// Snell refraction with relative index `eta`, `None` on total internal reflection.
/// `normal` must face against `direction`.
fn refract(
    direction: &Unit<WorldVector>,
    normal: &Unit<WorldVector>,
    eta: FloatType,
) -> Option<Unit<WorldVector>> {
    let d = direction.as_ref();
    let n = normal.as_ref();
    let cos_i = -d.dot(n);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        None
    } else {
        Some(Unit::new_normalize(d * eta + n * (eta * cos_i - k.sqrt())))
    }
}

fn schlick(cos_theta: FloatType, ior: FloatType) -> FloatType {
    let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cos_theta).powi(5)
}

fn dielectric(
    incoming: &Ray,
    hit: &HitRecord,
    ior: FloatType,
    rng: &mut impl Rng,
) -> Unit<WorldVector> {
    let cos_i = -incoming.direction.dot(hit.normal.as_ref());
    let (normal, eta, cos_i) = if cos_i > 0.0 {
        (hit.normal, 1.0 / ior, cos_i)
    } else {
        (Unit::new_unchecked(-hit.normal.into_inner()), ior, -cos_i)
    };

    match refract(&incoming.direction, &normal, eta) {
        Some(refracted) if rng.random::<FloatType>() >= schlick(cos_i, ior) => refracted,
        _ => reflect(&incoming.direction, &normal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geometry::WorldPoint,
        sampling::{Stream, path_rng},
        scene::{MaterialIdx, Specular},
    };
    use assert2::assert;

    fn hit_at_origin(normal: WorldVector) -> HitRecord {
        HitRecord {
            t: 1.0,
            point: WorldPoint::origin(),
            normal: Unit::new_normalize(normal),
            material: MaterialIdx::from_usize(0),
        }
    }

    fn grey() -> Rgb {
        Rgb {
            r: 0.5,
            g: 0.5,
            b: 0.5,
        }
    }

    fn incoming() -> Ray {
        Ray::new(WorldPoint::new(-1.0, 1.0, 0.0), WorldVector::new(1.0, -1.0, 0.0)).with_time(0.25)
    }

    #[test]
    fn diffuse_stays_above_surface() {
        let material = Material::builder().color(grey()).build();
        let hit = hit_at_origin(WorldVector::y());
        let mut rng = path_rng(0, 0, Stream::Bounce(0));

        for _ in 0..64 {
            let scattered = scatter(&incoming(), &hit, &material, &mut rng);
            assert!(scattered.ray.direction.y >= 0.0);
            assert!(scattered.ray.origin.y >= 0.0);
            assert!(scattered.ray.time == 0.25);
            assert!(scattered.weight == grey());
        }
    }

    #[test]
    fn perfect_mirror() {
        let material = Material::builder()
            .color(grey())
            .specular(Specular {
                exponent: 0.0,
                color: Rgb {
                    r: 0.9,
                    g: 0.8,
                    b: 0.7,
                },
            })
            .reflectivity(1.0)
            .build();
        let hit = hit_at_origin(WorldVector::y());
        let mut rng = path_rng(0, 0, Stream::Bounce(0));

        let scattered = scatter(&incoming(), &hit, &material, &mut rng);
        let expected = WorldVector::new(1.0, 1.0, 0.0).normalize();
        assert!((scattered.ray.direction.into_inner() - expected).norm() < 1e-6);
        assert!(scattered.weight == material.specular.color);
    }

    #[test]
    fn glossy_mirror_spreads_around_reflection() {
        let material = Material::builder()
            .color(grey())
            .specular(Specular {
                exponent: 200.0,
                color: grey(),
            })
            .reflectivity(1.0)
            .build();
        let hit = hit_at_origin(WorldVector::y());
        let mirror = WorldVector::new(1.0, 1.0, 0.0).normalize();
        let mut rng = path_rng(1, 7, Stream::Bounce(2));

        let directions: Vec<_> = (0..64)
            .map(|_| scatter(&incoming(), &hit, &material, &mut rng))
            .inspect(|s| assert!(s.weight == grey()))
            .map(|s| s.ray.direction)
            .collect();

        assert!(directions.iter().all(|d| d.y > 0.0));
        assert!(directions.iter().all(|d| d.dot(&mirror) > 0.9));
        assert!(directions.iter().any(|d| (d.into_inner() - mirror).norm() > 1e-4));
    }

    #[test]
    fn partial_mirror_mixes_lobes() {
        let material = Material::builder().color(grey()).reflectivity(0.5).build();
        let hit = hit_at_origin(WorldVector::y());
        let mirror = WorldVector::new(1.0, 1.0, 0.0).normalize();
        let mut rng = path_rng(3, 0, Stream::Bounce(1));

        let mirrored = (0..200)
            .map(|_| scatter(&incoming(), &hit, &material, &mut rng))
            .filter(|s| (s.ray.direction.into_inner() - mirror).norm() < 1e-6)
            .count();
        assert!(mirrored > 50);
        assert!(mirrored < 150);
    }

    #[test]
    fn glass_enters_and_leaves() {
        let material = Material::builder().color(grey()).refraction(1.5).build();
        let straight_down = Ray::new(WorldPoint::new(0.0, 1.0, 0.0), -WorldVector::y());
        let hit = hit_at_origin(WorldVector::y());
        let mut rng = path_rng(0, 0, Stream::Bounce(0));

        let refracted = (0..100)
            .map(|_| scatter(&straight_down, &hit, &material, &mut rng))
            .filter(|s| s.ray.direction.y < 0.0)
            .count();
        // Normal incidence reflects 4% of the time
        assert!(refracted > 85);
    }

    #[test]
    fn total_internal_reflection() {
        let material = Material::builder().color(grey()).refraction(1.5).build();
        // Leaving the material at a grazing angle, the normal points out of the glass
        let grazing = Ray::new(WorldPoint::new(-1.0, -0.2, 0.0), WorldVector::new(1.0, 0.2, 0.0));
        let hit = hit_at_origin(WorldVector::y());
        let mut rng = path_rng(0, 0, Stream::Bounce(0));

        for _ in 0..20 {
            let scattered = scatter(&grazing, &hit, &material, &mut rng);
            assert!(scattered.ray.direction.y < 0.0);
        }
    }

    #[test]
    fn snell_bends_toward_normal() {
        let direction = Unit::new_normalize(WorldVector::new(1.0, -1.0, 0.0));
        let normal = Unit::new_normalize(WorldVector::y());
        let refracted = refract(&direction, &normal, 1.0 / 1.5).unwrap();

        let sin_out = refracted.x;
        assert!((sin_out - (0.5f32).sqrt() / 1.5).abs() < 1e-5);
        assert!(refracted.y < 0.0);
    }
}
