use image::RgbImage;

use crate::{
    geometry::ScreenSize,
    renderer::{PathSegment, RenderError, Stage},
    util::{BLACK, Rgb},
};

/// Per pixel sum of path colors over all iterations of a session.
#[derive(Clone, Debug, PartialEq)]
pub struct AccumulationImage {
    size: ScreenSize,
    pixels: Vec<Rgb>,
}

impl AccumulationImage {
    /// Zeroed image. Fails if the pixel buffer can't be allocated.
    pub fn new(size: ScreenSize) -> Result<Self, RenderError> {
        let pixel_count = size.x as usize * size.y as usize;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(pixel_count)
            .map_err(|source| RenderError::OutOfMemory {
                stage: Stage::Initialize,
                source,
            })?;
        pixels.resize(pixel_count, BLACK);

        Ok(AccumulationImage { size, pixels })
    }

    pub fn size(&self) -> ScreenSize {
        self.size
    }

    /// Raw sums, row major.
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Adds the color of every path to its pixel.
    pub fn accumulate(&mut self, paths: &[PathSegment]) {
        for path in paths {
            self.pixels[path.pixel_index as usize] += path.color;
        }
    }

    /// Averages the sums over `iterations` and converts them to 8 bit.
    pub fn to_display(&self, iterations: u32) -> RgbImage {
        let scale = 1.0 / iterations.max(1) as f32;
        RgbImage::from_fn(self.size.x, self.size.y, |x, y| {
            let index = y as usize * self.size.x as usize + x as usize;
            color_to_image(self.pixels[index] * scale)
        })
    }
}

/// Maps a 0-1 f32 rgb pixel to pixel type compatible with module image.
pub fn color_to_image(color: Rgb) -> image::Rgb<u8> {
    image::Rgb([
        (color.r * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.g * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.b * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
