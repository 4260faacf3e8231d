//! Small built-in scenes for the command line tool and benchmarks.

use std::path::Path;

use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::{
    camera::Camera,
    geometry::{FloatType, ScreenSize, Transform, WorldPoint, WorldVector},
    scene::{Material, MaterialIdx, Scene, SceneError, Specular, mesh},
    util::{Rgb, modulate},
};

const ROOM_SIZE: FloatType = 10.0;
const WALL_THICKNESS: FloatType = 0.01;

fn rgb(r: FloatType, g: FloatType, b: FloatType) -> Rgb {
    Rgb { r, g, b }
}

fn transform(
    translation: [FloatType; 3],
    rotation: [FloatType; 3],
    scale: [FloatType; 3],
) -> Result<Transform, SceneError> {
    Transform::builder()
        .translation(translation.into())
        .rotation(rotation.into())
        .scale(scale.into())
        .build()
}

/// Cornell box with a ceiling light, a diffuse, a mirror and a glass sphere,
/// and a sphere moving sideways during the shutter interval.
/// When `mesh_path` is given, the OBJ file is placed on the floor in place of the diffuse sphere.
pub fn cornell_box(mesh_path: Option<&Path>) -> Result<Scene, SceneError> {
    let mut scene = Scene::new();

    let light = scene.add_material(
        Material::builder()
            .color(rgb(1.0, 1.0, 1.0))
            .emittance(5.0)
            .build(),
    );
    let white = scene.add_material(Material::builder().color(rgb(0.98, 0.98, 0.98)).build());
    let red = scene.add_material(Material::builder().color(rgb(0.85, 0.35, 0.35)).build());
    let green = scene.add_material(Material::builder().color(rgb(0.35, 0.85, 0.35)).build());
    let mirror = scene.add_material(
        Material::builder()
            .color(rgb(0.98, 0.98, 0.98))
            .specular(Specular {
                exponent: 0.0,
                color: rgb(0.98, 0.98, 0.98),
            })
            .reflectivity(1.0)
            .build(),
    );
    let glass = scene.add_material(
        Material::builder()
            .color(rgb(0.98, 0.98, 0.98))
            .specular(Specular {
                exponent: 0.0,
                color: rgb(0.9, 0.95, 1.0),
            })
            .refraction(1.5)
            .build(),
    );
    let yellow = scene.add_material(Material::builder().color(rgb(0.9, 0.8, 0.3)).build());

    let half = ROOM_SIZE / 2.0;

    scene.add_cube(
        transform([0.0, ROOM_SIZE, 0.0], [0.0; 3], [3.0, 0.3, 3.0])?,
        light,
    );
    // floor, ceiling, back wall
    scene.add_cube(
        transform([0.0, 0.0, 0.0], [0.0; 3], [ROOM_SIZE, WALL_THICKNESS, ROOM_SIZE])?,
        white,
    );
    scene.add_cube(
        transform([0.0, ROOM_SIZE, 0.0], [0.0; 3], [ROOM_SIZE, WALL_THICKNESS, ROOM_SIZE])?,
        white,
    );
    scene.add_cube(
        transform([0.0, half, -half], [0.0; 3], [ROOM_SIZE, ROOM_SIZE, WALL_THICKNESS])?,
        white,
    );
    scene.add_cube(
        transform([-half, half, 0.0], [0.0; 3], [WALL_THICKNESS, ROOM_SIZE, ROOM_SIZE])?,
        red,
    );
    scene.add_cube(
        transform([half, half, 0.0], [0.0; 3], [WALL_THICKNESS, ROOM_SIZE, ROOM_SIZE])?,
        green,
    );

    scene.add_sphere(transform([-2.0, 2.0, -1.0], [0.0; 3], [3.0; 3])?, mirror);
    scene.add_sphere(transform([2.0, 1.5, 1.0], [0.0; 3], [3.0; 3])?, glass);
    scene
        .add_sphere(transform([-1.0, 6.5, 0.0], [0.0; 3], [1.5; 3])?, yellow)
        .motion_target = Some(WorldVector::new(1.0, 6.5, 0.0));

    match mesh_path {
        Some(path) => {
            let triangles = mesh::load_obj(path)?;
            scene.add_mesh(
                triangles,
                transform([0.0, 0.0, 2.5], [0.0, 30.0, 0.0], [1.0; 3])?,
                white,
            )?;
        }
        None => {
            scene.add_sphere(transform([0.5, 1.0, 3.0], [0.0; 3], [2.0; 3])?, white);
        }
    }

    log::debug!(
        "Built Cornell box: {} geometries, {} triangles, {} materials",
        scene.geometries.len(),
        scene.triangles.len(),
        scene.materials.len()
    );

    Ok(scene)
}

/// Camera looking into the open side of the Cornell box.
pub fn cornell_camera(resolution: ScreenSize) -> Camera {
    Camera::builder()
        .position(WorldPoint::new(0.0, 5.0, 10.5))
        .look_at(WorldPoint::new(0.0, 5.0, 0.0))
        .up(WorldVector::y())
        .resolution(resolution)
        .fov_y(45.0)
        .lens_radius(0.1)
        .focal_distance(9.5)
        .build()
}

/// Places a sphere of the given radius, the unit sphere has radius 0.5.
fn add_sphere_by_material(
    scene: &mut Scene,
    material: MaterialIdx,
    center: WorldPoint,
    radius: FloatType,
) -> Result<(), SceneError> {
    scene.add_sphere(
        transform([center.x, center.y, center.z], [0.0; 3], [2.0 * radius; 3])?,
        material,
    );
    Ok(())
}

fn random_rgb(rng: &mut impl Rng, min: FloatType, max: FloatType) -> Rgb {
    rgb(
        rng.random_range(min..max),
        rng.random_range(min..max),
        rng.random_range(min..max),
    )
}

/// Large ground sphere covered by a 22x22 grid of small random spheres,
/// with three big spheres (glass, diffuse and mirror) in the middle.
/// The small spheres are fully determined by `seed`.
pub fn random_spheres(seed: u64) -> Result<Scene, SceneError> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut scene = Scene::new();

    let ground = scene.add_material(Material::builder().color(rgb(0.5, 0.5, 0.5)).build());
    add_sphere_by_material(&mut scene, ground, WorldPoint::new(0.0, -1000.0, 0.0), 1000.0)?;

    let glass = scene.add_material(
        Material::builder()
            .color(rgb(1.0, 1.0, 1.0))
            .specular(Specular {
                exponent: 0.0,
                color: rgb(1.0, 1.0, 1.0),
            })
            .refraction(1.5)
            .build(),
    );
    let feature_clearance = WorldPoint::new(4.0, 0.2, 0.0);

    for a in -11..11 {
        for b in -11..11 {
            let choose_material: FloatType = rng.random();
            let center = WorldPoint::new(
                a as FloatType + 0.9 * rng.random::<FloatType>(),
                0.2,
                b as FloatType + 0.9 * rng.random::<FloatType>(),
            );
            if (center - feature_clearance).norm() <= 0.9 {
                continue;
            }

            let material = if choose_material < 0.8 {
                let color = modulate(
                    random_rgb(&mut rng, 0.0, 1.0),
                    random_rgb(&mut rng, 0.0, 1.0),
                );
                scene.add_material(Material::builder().color(color).build())
            } else if choose_material < 0.95 {
                let color = random_rgb(&mut rng, 0.5, 1.0);
                let fuzz: FloatType = rng.random_range(0.0..0.5);
                scene.add_material(
                    Material::builder()
                        .color(color)
                        .specular(Specular {
                            exponent: fuzz_to_exponent(fuzz),
                            color,
                        })
                        .reflectivity(1.0)
                        .build(),
                )
            } else {
                glass
            };
            add_sphere_by_material(&mut scene, material, center, 0.2)?;
        }
    }

    let brown = scene.add_material(Material::builder().color(rgb(0.4, 0.2, 0.1)).build());
    let mirror = scene.add_material(
        Material::builder()
            .color(rgb(0.7, 0.6, 0.5))
            .specular(Specular {
                exponent: 0.0,
                color: rgb(0.7, 0.6, 0.5),
            })
            .reflectivity(1.0)
            .build(),
    );
    add_sphere_by_material(&mut scene, glass, WorldPoint::new(0.0, 1.0, 0.0), 1.0)?;
    add_sphere_by_material(&mut scene, brown, WorldPoint::new(-4.0, 1.0, 0.0), 1.0)?;
    add_sphere_by_material(&mut scene, mirror, WorldPoint::new(4.0, 1.0, 0.0), 1.0)?;

    log::debug!(
        "Built random spheres (seed {seed}): {} geometries, {} materials",
        scene.geometries.len(),
        scene.materials.len()
    );

    Ok(scene)
}

/// Maps a metal fuzz radius in `[0, 1)` to a Phong exponent of similar spread.
fn fuzz_to_exponent(fuzz: FloatType) -> FloatType {
    if fuzz <= 0.0 {
        0.0
    } else {
        2.0 / (fuzz * fuzz)
    }
}

/// Low camera looking over the sphere field towards the origin.
pub fn random_spheres_camera(resolution: ScreenSize) -> Camera {
    Camera::builder()
        .position(WorldPoint::new(13.0, 2.0, 3.0))
        .look_at(WorldPoint::origin())
        .up(WorldVector::y())
        .resolution(resolution)
        .fov_y(20.0)
        .lens_radius(0.05)
        .focal_distance(10.0)
        .build()
}
