//! Temporal accumulation with ping-pong storage.
//!
//! Frame `n` (1-based) reads the mean of frames `1..n-1` from one buffer and
//! writes the mean of `1..n` to the other. Which buffer is read alternates
//! by the parity of `n`, so a pass never reads and writes the same storage.

use crate::image::{Color, ImageBuffer};

/// One step of the running-mean recurrence.
#[inline]
pub fn running_mean(previous: Color, sample: Color, frame: u32) -> Color {
    previous + (sample - previous) / frame.max(1) as f32
}

/// The two accumulation buffers.
#[derive(Debug, Clone)]
pub struct PingPong {
    a: ImageBuffer,
    b: ImageBuffer,
}

impl PingPong {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            a: ImageBuffer::new(width, height),
            b: ImageBuffer::new(width, height),
        }
    }

    /// Buffers as (read, write) for 1-based frame `frame`.
    pub fn split(&mut self, frame: u32) -> (&ImageBuffer, &mut ImageBuffer) {
        if frame % 2 == 0 {
            (&self.a, &mut self.b)
        } else {
            (&self.b, &mut self.a)
        }
    }

    /// The buffer holding the newest mean after frame `frame` was accumulated.
    pub fn latest(&self, frame: u32) -> &ImageBuffer {
        if frame % 2 == 0 {
            &self.b
        } else {
            &self.a
        }
    }

    /// Fold `sample` into the running mean for frame `frame`.
    pub fn accumulate(&mut self, sample: &ImageBuffer, frame: u32) {
        let (read, write) = self.split(frame);
        write.par_fill(|x, y| running_mean(read.get(x, y), sample.get(x, y), frame));
    }

    /// Zero both buffers.
    pub fn clear(&mut self) {
        self.a.clear();
        self.b.clear();
    }

    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.a.matches(width, height) && self.b.matches(width, height)
    }

    pub fn is_zero(&self) -> bool {
        self.a.is_zero() && self.b.is_zero()
    }
}
