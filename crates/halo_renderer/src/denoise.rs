//! Edge-aware bilateral denoise filter.
//!
//! A fixed 5x5 window weighted by a spatial Gaussian over pixel offset and a
//! range Gaussian over color difference to the center pixel. Out-of-image
//! taps are clamped to the edge.

use halo_core::DenoiseSettings;

use crate::image::{Color, ImageBuffer};

/// Window radius in pixels.
pub const DENOISE_RADIUS: i64 = 2;

/// Lower bound on either sigma.
const MIN_SIGMA: f32 = 1e-6;

#[inline]
fn gaussian(x: f32, sigma: f32) -> f32 {
    (-0.5 * x * x / (sigma * sigma)).exp()
}

/// Filter one pixel.
pub fn denoise_pixel(input: &ImageBuffer, x: u32, y: u32, settings: &DenoiseSettings) -> Color {
    let spatial_sigma = settings.spatial_sigma.max(MIN_SIGMA);
    let color_sigma = settings.color_sigma.max(MIN_SIGMA);
    let center = input.get(x, y);

    let mut sum = Color::ZERO;
    let mut total_weight = 0.0;
    for j in -DENOISE_RADIUS..=DENOISE_RADIUS {
        for i in -DENOISE_RADIUS..=DENOISE_RADIUS {
            let neighbor = input.get_clamped(x as i64 + i, y as i64 + j);
            let offset = ((i * i + j * j) as f32).sqrt();
            let weight = gaussian(offset, spatial_sigma)
                * gaussian((neighbor - center).length(), color_sigma);
            sum += neighbor * weight;
            total_weight += weight;
        }
    }

    if total_weight > 0.0 {
        sum / total_weight
    } else {
        center
    }
}

/// Filter `input` into `output`. Both must have the same dimensions.
pub fn denoise_into(input: &ImageBuffer, output: &mut ImageBuffer, settings: &DenoiseSettings) {
    output.par_fill(|x, y| denoise_pixel(input, x, y, settings));
}
