use image::RgbImage;
use rayon::prelude::*;

use crate::{
    camera::Camera,
    geometry::HitRecord,
    renderer::{
        AccumulationImage, PathSegment, RenderError, RenderSettings, Stage, WorkerCount,
        stages::{compact, compute_intersections, generate_paths, shade_paths, sort_by_material},
    },
    scene::Scene,
    util::Stats,
};

/// Everything a render owns between `initialize` and `teardown`:
/// the read only scene, the accumulation image and the per iteration scratch buffers.
pub struct RenderSession {
    scene: Scene,
    camera: Camera,
    settings: RenderSettings,
    pool: rayon::ThreadPool,

    image: AccumulationImage,
    buffers: Buffers,

    iterations: u32,
    /// Active path counts after each depth, indexed by depth
    active_path_stats: Vec<Stats>,
}

/// Scratch space reused every iteration.
struct Buffers {
    pixel_count: usize,
    paths: Vec<PathSegment>,
    intersections: Vec<Option<HitRecord>>,
    sort_scratch: Vec<(PathSegment, Option<HitRecord>)>,
    /// Depth 0 intersections in pixel order, filled by the first iteration
    first_bounce: Option<Vec<Option<HitRecord>>>,
}

fn reserve<T>(buffer: &mut Vec<T>, len: usize, stage: Stage) -> Result<(), RenderError> {
    buffer
        .try_reserve_exact(len.saturating_sub(buffer.len()))
        .map_err(|source| RenderError::OutOfMemory { stage, source })
}

impl RenderSession {
    /// Validates the launch configuration, starts the worker pool and allocates all buffers.
    pub fn initialize(
        scene: Scene,
        camera: Camera,
        settings: RenderSettings,
    ) -> Result<Self, RenderError> {
        let resolution = camera.get_resolution();
        let pixel_count = resolution
            .x
            .checked_mul(resolution.y)
            .ok_or_else(|| RenderError::InvalidLaunch {
                stage: Stage::Initialize,
                reason: format!(
                    "{}x{} pixels don't fit the path index",
                    resolution.x, resolution.y
                ),
            })? as usize;
        if pixel_count == 0 {
            return Err(RenderError::InvalidLaunch {
                stage: Stage::Initialize,
                reason: format!("image size {}x{} has no pixels", resolution.x, resolution.y),
            });
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(match settings.worker_count {
                WorkerCount::Auto => 0,
                WorkerCount::Manual(count) => count.get(),
            })
            .thread_name(|worker_id| format!("worker{worker_id}"))
            .build()
            .map_err(|source| RenderError::ThreadPool {
                stage: Stage::Initialize,
                source,
            })?;

        let mut buffers = Buffers {
            pixel_count,
            paths: Vec::new(),
            intersections: Vec::new(),
            sort_scratch: Vec::new(),
            first_bounce: None,
        };
        reserve(&mut buffers.paths, pixel_count, Stage::Initialize)?;
        reserve(&mut buffers.intersections, pixel_count, Stage::Initialize)?;
        if settings.sort_by_material {
            reserve(&mut buffers.sort_scratch, pixel_count, Stage::Initialize)?;
        }

        let image = AccumulationImage::new(resolution)?;

        log::info!(
            "Render session {}x{} ({} pixels), {} workers, {} triangles in {} geometries",
            resolution.x,
            resolution.y,
            pixel_count,
            pool.current_num_threads(),
            scene.triangles.len(),
            scene.geometries.len(),
        );
        log::info!("{settings:?}");
        if settings.cache_first_bounce && !settings.first_bounce_cache_usable() {
            log::info!("First bounce cache disabled, primary rays are randomized");
        }

        Ok(RenderSession {
            scene,
            camera,
            settings,
            pool,
            image,
            buffers,
            iterations: 0,
            active_path_stats: vec![Stats::default(); settings.trace_depth.get() as usize],
        })
    }

    /// Traces one sample per pixel, adds it to the image and returns the running average.
    /// `iteration` seeds the random streams, `frame` only identifies the call in logs.
    pub fn render_iteration(
        &mut self,
        iteration: u32,
        frame: u32,
    ) -> Result<RgbImage, RenderError> {
        let RenderSession {
            scene,
            camera,
            settings,
            pool,
            image,
            buffers,
            iterations,
            active_path_stats,
        } = self;

        pool.install(|| buffers.trace(scene, camera, settings, iteration, active_path_stats))?;

        image.accumulate(&buffers.paths);
        *iterations += 1;

        log::debug!(
            "Frame {frame}, iteration {iteration} done ({} total)",
            *iterations
        );

        Ok(image.to_display(*iterations))
    }

    /// Releases the worker pool and scratch buffers, returning the accumulated image.
    pub fn teardown(self) -> AccumulationImage {
        log::info!("Render session finished after {} iterations", self.iterations);
        for (depth, stats) in self.active_path_stats.iter().enumerate() {
            if stats.count > 0 {
                log::debug!("Active paths after depth {depth}: {stats}");
            }
        }
        self.image
    }

    pub fn image(&self) -> &AccumulationImage {
        &self.image
    }

    /// Number of completed iterations.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn active_path_stats(&self) -> &[Stats] {
        &self.active_path_stats
    }
}

impl Buffers {
    fn trace(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        settings: &RenderSettings,
        iteration: u32,
        active_path_stats: &mut [Stats],
    ) -> Result<(), RenderError> {
        reserve(&mut self.paths, self.pixel_count, Stage::Generate)?;
        generate_paths(camera, settings, iteration, &mut self.paths);

        let use_cache = settings.first_bounce_cache_usable();
        let mut active = self.paths.len();

        for depth in 0..settings.trace_depth.get() {
            if settings.compact_paths && active == 0 {
                break;
            }
            let paths = &mut self.paths[..active];

            reserve(&mut self.intersections, active, Stage::Intersect)?;
            match &self.first_bounce {
                Some(cached) if depth == 0 && use_cache => {
                    self.intersections.clear();
                    self.intersections.extend_from_slice(cached);
                }
                _ => {
                    compute_intersections(
                        scene,
                        paths,
                        settings.mesh_culling,
                        &mut self.intersections,
                    );
                    if depth == 0 && use_cache {
                        let mut cached = Vec::new();
                        reserve(&mut cached, active, Stage::Intersect)?;
                        cached.extend_from_slice(&self.intersections);
                        self.first_bounce = Some(cached);
                    }
                }
            }

            if settings.sort_by_material {
                reserve(&mut self.sort_scratch, active, Stage::Shade)?;
                sort_by_material(paths, &mut self.intersections, &mut self.sort_scratch);
            }

            shade_paths(
                paths,
                &self.intersections,
                &scene.materials,
                settings.ambient_light,
                iteration,
                depth,
            );

            if settings.compact_paths {
                active = compact(paths);
            }
            let active_count = if settings.compact_paths {
                active
            } else {
                paths.par_iter().filter(|path| path.is_active()).count()
            };
            log::trace!("Depth {depth}: {active_count} active paths");
            active_path_stats[depth as usize].add_sample(active_count);
        }

        Ok(())
    }
}
