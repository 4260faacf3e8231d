use crate::{
    geometry::WorldVector,
    util::{Rgb, WHITE},
};

const ZENITH: Rgb = Rgb {
    r: 0.5,
    g: 0.7,
    b: 1.0,
};

/// Vertical gradient from white at the nadir to light blue at the zenith.
pub fn sky_color(direction: &WorldVector) -> Rgb {
    let t = 0.5 * (direction.y + 1.0);
    WHITE * (1.0 - t) + ZENITH * t
}
