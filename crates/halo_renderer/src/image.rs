//! Floating-point image buffers and full-image parallel passes.

use halo_math::Vec3;
use rayon::prelude::*;

/// Color type alias (linear RGB)
pub type Color = Vec3;

/// Row-major RGB image. Row 0 is the top of the image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Create an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> Color + Sync) -> Self {
        let mut image = Self::new(width, height);
        image.par_fill(f);
        image
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Get a pixel with coordinates clamped to the image edge.
    pub fn get_clamped(&self, x: i64, y: i64) -> Color {
        let cx = x.clamp(0, self.width as i64 - 1) as u32;
        let cy = y.clamp(0, self.height as i64 - 1) as u32;
        self.get(cx, cy)
    }

    /// Check the buffer holds exactly `width * height` pixels of that size.
    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width
            && self.height == height
            && self.pixels.len() == width as usize * height as usize
    }

    /// Reset every pixel to black.
    pub fn clear(&mut self) {
        self.pixels.fill(Color::ZERO);
    }

    /// True if every pixel is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.pixels.iter().all(|p| *p == Color::ZERO)
    }

    /// Overwrite every pixel with `f(x, y)`, rows in parallel.
    ///
    /// `f` only sees its own coordinate, so passes are free of cross-pixel
    /// writes.
    pub fn par_fill(&mut self, f: impl Fn(u32, u32) -> Color + Sync) {
        let width = self.width as usize;
        if width == 0 {
            return;
        }
        self.pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.iter_mut().enumerate() {
                    *pixel = f(x as u32, y as u32);
                }
            });
    }

    /// Convert to RGBA bytes. Values are clamped to [0, 1], no transfer curve.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for color in &self.pixels {
            let c = color.clamp(Color::ZERO, Color::ONE) * 255.0 + 0.5;
            bytes.extend_from_slice(&[c.x as u8, c.y as u8, c.z as u8, 255]);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_black() {
        let image = ImageBuffer::new(4, 3);
        assert_eq!(image.pixels.len(), 12);
        assert!(image.is_zero());
        assert!(image.matches(4, 3));
        assert!(!image.matches(3, 4));
    }

    #[test]
    fn test_par_fill_coordinates() {
        let image = ImageBuffer::from_fn(5, 3, |x, y| Color::new(x as f32, y as f32, 0.0));
        for y in 0..3 {
            for x in 0..5 {
                assert_eq!(image.get(x, y), Color::new(x as f32, y as f32, 0.0));
            }
        }
    }

    #[test]
    fn test_get_clamped() {
        let image = ImageBuffer::from_fn(3, 2, |x, y| Color::splat((y * 3 + x) as f32));
        assert_eq!(image.get_clamped(-2, 0), image.get(0, 0));
        assert_eq!(image.get_clamped(7, 5), image.get(2, 1));
        assert_eq!(image.get_clamped(1, -1), image.get(1, 0));
    }

    #[test]
    fn test_to_rgba8() {
        let image = ImageBuffer {
            width: 2,
            height: 1,
            pixels: vec![Color::new(1.0, 0.5, 0.0), Color::new(4.0, -1.0, 0.25)],
        };

        assert_eq!(image.to_rgba8(), vec![255, 128, 0, 255, 255, 0, 64, 255]);
    }

    #[test]
    fn test_clear() {
        let mut image = ImageBuffer::from_fn(2, 2, |_, _| Color::ONE);
        image.clear();
        assert!(image.is_zero());
    }
}
