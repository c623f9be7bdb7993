//! Display transform.

use crate::image::{Color, ImageBuffer};

/// Display gamma.
pub const GAMMA: f32 = 2.2;

/// Gamma encode a linear color. Negative input is treated as zero.
#[inline]
pub fn gamma_encode(linear: Color) -> Color {
    linear.max(Color::ZERO).powf(1.0 / GAMMA)
}

/// Gamma encode `input` into `output`.
pub fn display_into(input: &ImageBuffer, output: &mut ImageBuffer) {
    output.par_fill(|x, y| gamma_encode(input.get(x, y)));
}
