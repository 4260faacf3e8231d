//! Data parallel stages of one iteration. Every stage runs to completion over the whole
//! working set before the next one starts.

use index_vec::IndexSlice;
use rayon::prelude::*;

use crate::{
    camera::Camera,
    geometry::{HitRecord, ScreenPoint},
    renderer::{PathSegment, RenderSettings},
    sampling::{Stream, path_rng},
    scene::{Material, MaterialIdx, Scene},
    shading::shade_path,
};

/// Fills `paths` with one fresh path per pixel, in pixel order.
pub fn generate_paths(
    camera: &Camera,
    settings: &RenderSettings,
    iteration: u32,
    paths: &mut Vec<PathSegment>,
) {
    let resolution = camera.get_resolution();
    let trace_depth = settings.trace_depth.get();

    paths.clear();
    paths.par_extend(
        (0..resolution.x * resolution.y)
            .into_par_iter()
            .map(|pixel_index| {
                let point =
                    ScreenPoint::new(pixel_index % resolution.x, pixel_index / resolution.x);
                let mut rng = path_rng(iteration, pixel_index, Stream::Camera);
                let ray = camera.sample_ray(&point, settings, &mut rng);
                PathSegment::new(ray, pixel_index, trace_depth)
            }),
    );
}

/// Nearest hit for every path, `None` for misses and terminated paths.
pub fn compute_intersections(
    scene: &Scene,
    paths: &[PathSegment],
    mesh_culling: bool,
    intersections: &mut Vec<Option<HitRecord>>,
) {
    intersections.clear();
    intersections.par_extend(paths.par_iter().map(|path| {
        if path.is_active() {
            scene.intersect(&path.ray, mesh_culling)
        } else {
            None
        }
    }));
}

/// Stable sort of paths by the material they hit, misses first.
/// Paths and intersections are permuted together.
pub fn sort_by_material(
    paths: &mut [PathSegment],
    intersections: &mut [Option<HitRecord>],
    scratch: &mut Vec<(PathSegment, Option<HitRecord>)>,
) {
    scratch.clear();
    scratch.par_extend(
        paths
            .par_iter()
            .copied()
            .zip(intersections.par_iter().copied()),
    );
    scratch.par_sort_by_key(|(_, hit)| hit.map(|hit| hit.material));

    paths
        .par_iter_mut()
        .zip(intersections.par_iter_mut())
        .zip(scratch.par_iter())
        .for_each(|((path, hit), sorted)| {
            *path = sorted.0;
            *hit = sorted.1;
        });
}

pub fn shade_paths(
    paths: &mut [PathSegment],
    intersections: &[Option<HitRecord>],
    materials: &IndexSlice<MaterialIdx, [Material]>,
    ambient_light: bool,
    iteration: u32,
    depth: u32,
) {
    paths
        .par_iter_mut()
        .zip(intersections.par_iter())
        .filter(|(path, _)| path.is_active())
        .for_each(|(path, hit)| {
            let mut rng = path_rng(iteration, path.pixel_index, Stream::Bounce(depth));
            shade_path(path, hit.as_ref(), materials, ambient_light, &mut rng);
        });
}

/// Partitions the paths so that all active ones come first, returns their count.
/// Order among the active paths is not preserved. Only pairs of a terminated path in front
/// of an active one are swapped, an already partitioned array is left untouched.
pub fn compact(paths: &mut [PathSegment]) -> usize {
    let mut active = 0;
    let mut end = paths.len();

    loop {
        while active < end && paths[active].is_active() {
            active += 1;
        }
        while active < end && !paths[end - 1].is_active() {
            end -= 1;
        }
        if active == end {
            return active;
        }
        paths.swap(active, end - 1);
        active += 1;
        end -= 1;
    }
}
