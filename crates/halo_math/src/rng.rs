//! Counter-based hash PRNG for per-pixel sample streams.
//!
//! Each pixel invocation builds its own generator from a 4-vector of floats
//! (pixel coordinate, frame counter, time, external random vector). The
//! generator is a plain value threaded through the call chain by `&mut`,
//! so a given seed always reproduces the same stream.

use crate::Vec4;

/// Additive constant applied to lane 0 before every rehash.
const GOLDEN_GAMMA: u32 = 0x9E37_79B9;

/// 4-lane xorshift-multiply hash state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashRng {
    state: [u32; 4],
}

impl HashRng {
    /// Create a generator from raw lane values.
    pub fn new(state: [u32; 4]) -> Self {
        Self { state }
    }

    /// Create a generator from the bit patterns of a float 4-vector.
    pub fn from_vec4(seed: Vec4) -> Self {
        Self::new(bytemuck::cast(seed.to_array()))
    }

    /// Current lane values.
    pub fn state(&self) -> [u32; 4] {
        self.state
    }

    /// Three xorshift-multiply rounds with a lane carry between rounds.
    ///
    /// Every step is invertible, so the 128-bit state never collapses.
    pub fn hash(lanes: [u32; 4]) -> [u32; 4] {
        const ROUNDS: [(u32, u32); 3] = [(17, 0xED5A_D4BB), (11, 0xAC4C_1B51), (15, 0x3184_8BAB)];
        let mut x = lanes;
        for (shift, multiplier) in ROUNDS {
            for lane in x.iter_mut() {
                *lane = (*lane ^ (*lane >> shift)).wrapping_mul(multiplier);
            }
            x[0] = x[0].wrapping_add(x[3]);
            x[1] = x[1].wrapping_add(x[0]);
            x[2] = x[2].wrapping_add(x[1]);
            x[3] = x[3].wrapping_add(x[2]);
        }
        x
    }

    /// Advance the state and return the new lane 0 word.
    pub fn next_u32(&mut self) -> u32 {
        self.state[0] = self.state[0].wrapping_add(GOLDEN_GAMMA);
        self.state = Self::hash(self.state);
        self.state[0]
    }

    /// Uniform float in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        // 24 bits keep the result strictly below 1.0 in f32
        (self.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0)
    }
}
