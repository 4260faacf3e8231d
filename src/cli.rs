use std::{
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
};

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use wavepath::{
    RenderSession, RenderSettings, WorkerCount,
    camera::Camera,
    geometry::ScreenSize,
    scene::{Scene, demo},
};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DemoScene {
    Cornell,
    Spheres,
}

/// Renders one of the built-in scenes and saves the result as PNG.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long, value_enum, default_value_t = DemoScene::Cornell)]
    scene: DemoScene,

    /// Seed of the random sphere placement
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Samples per pixel
    #[arg(long, default_value = "64")]
    iterations: NonZeroU32,

    /// Maximum number of bounces per path
    #[arg(long, default_value = "8")]
    trace_depth: NonZeroU32,

    #[arg(long, short, default_value = "render.png")]
    output: PathBuf,

    /// OBJ mesh placed into the Cornell box
    #[arg(long)]
    mesh: Option<PathBuf>,

    /// Worker threads, one per core if omitted
    #[arg(long)]
    workers: Option<NonZeroUsize>,

    #[arg(long)]
    no_antialiasing: bool,

    #[arg(long)]
    depth_of_field: bool,

    #[arg(long)]
    motion_blur: bool,

    #[arg(long)]
    no_first_bounce_cache: bool,

    #[arg(long)]
    no_material_sort: bool,

    #[arg(long)]
    no_compaction: bool,

    #[arg(long)]
    no_ambient_light: bool,

    #[arg(long)]
    no_mesh_culling: bool,
}

impl Args {
    fn render_settings(&self) -> RenderSettings {
        RenderSettings::builder()
            .trace_depth(self.trace_depth)
            .antialiasing(!self.no_antialiasing)
            .depth_of_field(self.depth_of_field)
            .motion_blur(self.motion_blur)
            .cache_first_bounce(!self.no_first_bounce_cache)
            .sort_by_material(!self.no_material_sort)
            .compact_paths(!self.no_compaction)
            .ambient_light(!self.no_ambient_light)
            .mesh_culling(!self.no_mesh_culling)
            .worker_count(self.workers.map_or(WorkerCount::Auto, WorkerCount::Manual))
            .build()
    }

    fn scene_and_camera(&self) -> anyhow::Result<(Scene, Camera)> {
        let resolution = ScreenSize::new(self.width, self.height);
        match self.scene {
            DemoScene::Cornell => Ok((
                demo::cornell_box(self.mesh.as_deref()).context("Failed to build the scene")?,
                demo::cornell_camera(resolution),
            )),
            DemoScene::Spheres => {
                if self.mesh.is_some() {
                    log::warn!("--mesh is only used by the Cornell box scene");
                }
                Ok((
                    demo::random_spheres(self.seed).context("Failed to build the scene")?,
                    demo::random_spheres_camera(resolution),
                ))
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let (scene, camera) = args.scene_and_camera()?;
    let mut session = RenderSession::initialize(scene, camera, args.render_settings())?;

    let bar = ProgressBar::new(args.iterations.get().into());
    bar.set_style(ProgressStyle::with_template(
        "{elapsed_precise} [{wide_bar}] {pos}/{len} iterations, eta {eta}",
    )?);

    let mut display = None;
    for iteration in 0..args.iterations.get() {
        display = Some(session.render_iteration(iteration, 0)?);
        bar.inc(1);
    }
    bar.finish();

    for (depth, stats) in session.active_path_stats().iter().enumerate() {
        if stats.count > 0 {
            println!("depth {depth}: {stats} active paths");
        }
    }
    session.teardown();

    if let Some(display) = display {
        display
            .save(&args.output)
            .with_context(|| format!("Failed to save {}", args.output.display()))?;
        log::info!("Saved {}", args.output.display());
    }

    Ok(())
}
