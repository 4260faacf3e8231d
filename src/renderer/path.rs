use crate::{
    geometry::Ray,
    util::{Rgb, WHITE},
};

/// State of one light path through a pixel, advanced one bounce per depth.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PathSegment {
    pub ray: Ray,
    /// Throughput multiplied along the path, the final color once terminated
    pub color: Rgb,
    pub pixel_index: u32,
    /// Zero marks a terminated path
    pub remaining_bounces: u32,
}

impl PathSegment {
    pub fn new(ray: Ray, pixel_index: u32, trace_depth: u32) -> Self {
        PathSegment {
            ray,
            color: WHITE,
            pixel_index,
            remaining_bounces: trace_depth,
        }
    }

    pub fn is_active(&self) -> bool {
        self.remaining_bounces > 0
    }

    pub fn terminate(&mut self) {
        self.remaining_bounces = 0;
    }
}
