mod stats;

pub use stats::Stats;

pub type Rgb = rgb::RGB<f32>;

pub const BLACK: Rgb = Rgb {
    r: 0.0,
    g: 0.0,
    b: 0.0,
};

pub const WHITE: Rgb = Rgb {
    r: 1.0,
    g: 1.0,
    b: 1.0,
};

/// Componentwise product of two colors.
pub fn modulate(a: Rgb, b: Rgb) -> Rgb {
    Rgb {
        r: a.r * b.r,
        g: a.g * b.g,
        b: a.b * b.b,
    }
}
