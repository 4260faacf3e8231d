pub mod camera;
pub mod geometry;
pub mod renderer;
pub mod sampling;
pub mod scene;
pub mod shading;
pub mod util;

pub use crate::renderer::{
    AccumulationImage, RenderError, RenderSession, RenderSettings, Stage, WorkerCount,
};
pub use camera::Camera;
pub use scene::{Scene, SceneError};
