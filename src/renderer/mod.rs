mod accumulator;
mod path;
mod session;
mod stages;

use std::{
    collections::TryReserveError,
    fmt,
    num::{NonZeroU32, NonZeroUsize},
};

use bon::Builder;
use thiserror::Error;

pub use crate::renderer::{
    accumulator::{AccumulationImage, color_to_image},
    path::PathSegment,
    session::RenderSession,
};

const DEFAULT_TRACE_DEPTH: NonZeroU32 = NonZeroU32::new(8).unwrap();

/// Options of a render session, fixed for its whole lifetime.
#[derive(Copy, Clone, Debug, PartialEq, Builder)]
pub struct RenderSettings {
    /// Maximum number of bounces of a path
    #[builder(default = DEFAULT_TRACE_DEPTH)]
    pub trace_depth: NonZeroU32,

    /// Jitter primary rays within their pixel
    #[builder(default = true)]
    pub antialiasing: bool,
    /// Sample primary ray origins over the camera lens
    #[builder(default = false)]
    pub depth_of_field: bool,
    /// Sample a shutter time per path, moving geometry is displaced by it
    #[builder(default = false)]
    pub motion_blur: bool,

    /// Reuse the depth 0 intersections of the first iteration, only effective when
    /// primary rays are deterministic
    #[builder(default = true)]
    pub cache_first_bounce: bool,
    /// Group paths by the material they hit before shading
    #[builder(default = true)]
    pub sort_by_material: bool,
    /// Move terminated paths out of the working set after every depth
    #[builder(default = true)]
    pub compact_paths: bool,

    /// Escaping paths pick up the sky gradient instead of black
    #[builder(default = true)]
    pub ambient_light: bool,
    /// Bounding box pre-test for meshes
    #[builder(default = true)]
    pub mesh_culling: bool,

    #[builder(default = WorkerCount::Auto)]
    pub worker_count: WorkerCount,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RenderSettings {
    /// Primary rays (and their first hits) are identical in every iteration.
    pub fn first_bounce_cache_usable(&self) -> bool {
        self.cache_first_bounce && !self.antialiasing && !self.depth_of_field && !self.motion_blur
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkerCount {
    /// One worker per available core
    Auto,
    Manual(NonZeroUsize),
}

/// Pipeline stage, used to identify failures.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Initialize,
    Generate,
    Intersect,
    Shade,
    Compact,
    Gather,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Initialize => "initialize",
            Stage::Generate => "generate",
            Stage::Intersect => "intersect",
            Stage::Shade => "shade",
            Stage::Compact => "compact",
            Stage::Gather => "gather",
        };
        f.write_str(name)
    }
}

/// Fatal render failures. The session can not continue after any of these.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid launch configuration in {stage} stage: {reason}")]
    InvalidLaunch { stage: Stage, reason: String },

    #[error("Out of memory in {stage} stage")]
    OutOfMemory {
        stage: Stage,
        #[source]
        source: TryReserveError,
    },

    #[error("Failed to start worker threads in {stage} stage")]
    ThreadPool {
        stage: Stage,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

impl RenderError {
    pub fn stage(&self) -> Stage {
        match self {
            RenderError::InvalidLaunch { stage, .. }
            | RenderError::OutOfMemory { stage, .. }
            | RenderError::ThreadPool { stage, .. } => *stage,
        }
    }
}
