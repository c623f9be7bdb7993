//! Frame pipeline.
//!
//! Owns every image buffer and the frame counter. A frame is four passes,
//! run in order either one at a time with [`Pipeline::step`] or all at once
//! with [`Pipeline::render_frame`]:
//!
//! 1. path tracing into the sample buffer
//! 2. accumulation into the ping-pong pair
//! 3. denoise of the newest accumulation (optional)
//! 4. display encode
//!
//! Scene edits and resizes happen between frames and reset accumulation
//! before the next path tracing pass.

use std::time::Instant;

use bytemuck::{Pod, Zeroable};
use halo_core::{ParamError, ParamValue, PassName, RenderSettings, Scene, SceneError};
use halo_math::{Vec2, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::accumulate::PingPong;
use crate::camera::LensCamera;
use crate::denoise::denoise_into;
use crate::display::display_into;
use crate::image::ImageBuffer;
use crate::integrator::{pixel_rng, render_sample};

/// Frame rate assumed for synthetic time in seeded runs.
const SYNTHETIC_FPS: f32 = 60.0;

/// Errors that prevent a pipeline from being built.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("Invalid scene: {0}")]
    Scene(#[from] SceneError),

    #[error("Invalid denoise settings: {0}")]
    Denoise(#[from] ParamError),
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// The pass the pipeline completed last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    Idle,
    PathTracing,
    Accumulating,
    Denoising,
    Displaying,
}

/// Per-frame parameter block handed to the path tracing pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    /// Fresh random vector for this frame
    pub random: [f32; 4],
    pub resolution: [f32; 2],
    /// Seconds since start (synthetic in seeded runs)
    pub time: f32,
    /// 1-based frame counter
    pub frame_count: u32,
}

/// The progressive rendering pipeline.
pub struct Pipeline {
    scene: Scene,
    settings: RenderSettings,

    frame_count: u32,
    stage: FrameStage,
    uniforms: FrameUniforms,

    sample: ImageBuffer,
    accumulation: PingPong,
    denoised: ImageBuffer,
    display: ImageBuffer,

    rng: StdRng,
    start: Instant,
}

impl Pipeline {
    /// Validate the inputs and allocate buffers.
    pub fn new(scene: Scene, settings: RenderSettings) -> PipelineResult<Self> {
        let (width, height) = (settings.width, settings.height);
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidResolution { width, height });
        }
        scene.validate()?;
        settings.denoise.validate()?;

        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        log::info!(
            "Pipeline {}x{} (seed: {:?}, denoise: {})",
            width,
            height,
            settings.seed,
            settings.denoise.enabled
        );

        Ok(Self {
            scene,
            settings,
            frame_count: 0,
            stage: FrameStage::Idle,
            uniforms: FrameUniforms::default(),
            sample: ImageBuffer::new(width, height),
            accumulation: PingPong::new(width, height),
            denoised: ImageBuffer::new(width, height),
            display: ImageBuffer::new(width, height),
            rng,
            start: Instant::now(),
        })
    }

    /// Apply a named parameter to one pass.
    ///
    /// Rejected requests change nothing and are logged. A successful
    /// `pathTracer` request resets accumulation.
    pub fn set_parameter(
        &mut self,
        pass: &str,
        name: &str,
        value: ParamValue,
    ) -> Result<(), ParamError> {
        let result = match pass.parse::<PassName>() {
            Ok(PassName::PathTracer) => self
                .scene
                .set_parameter(name, value)
                .map(|()| self.reset_accumulation()),
            Ok(PassName::Denoise) => self.settings.denoise.set_parameter(name, value),
            Ok(pass @ (PassName::Accumulate | PassName::Display)) => {
                Err(ParamError::UnknownParameter {
                    pass,
                    name: name.to_string(),
                })
            }
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            log::warn!("Ignoring parameter {}.{}: {}", pass, name, err);
        }
        result
    }

    /// Reallocate every buffer at the new resolution and reset accumulation.
    ///
    /// Zero sizes (a minimized window) are rejected and leave the pipeline
    /// unchanged.
    pub fn on_resize(&mut self, width: u32, height: u32) -> PipelineResult<()> {
        if width == 0 || height == 0 {
            log::warn!("Ignoring resize to {}x{}", width, height);
            return Err(PipelineError::InvalidResolution { width, height });
        }
        log::info!("Resize {}x{} -> {}x{}", self.settings.width, self.settings.height, width, height);
        self.settings.width = width;
        self.settings.height = height;
        self.allocate_buffers();
        self.reset_accumulation();
        Ok(())
    }

    /// Zero the frame counter and both accumulation buffers. A frame in
    /// flight is abandoned.
    pub fn reset_accumulation(&mut self) {
        log::debug!("Reset accumulation after {} frames", self.frame_count);
        self.frame_count = 0;
        self.stage = FrameStage::Idle;
        self.accumulation.clear();
    }

    fn allocate_buffers(&mut self) {
        let (width, height) = (self.settings.width, self.settings.height);
        self.sample = ImageBuffer::new(width, height);
        self.accumulation = PingPong::new(width, height);
        self.denoised = ImageBuffer::new(width, height);
        self.display = ImageBuffer::new(width, height);
    }

    /// Reallocate any buffer whose size no longer matches the resolution.
    fn revalidate_buffers(&mut self) {
        let (width, height) = (self.settings.width, self.settings.height);
        let valid = self.sample.matches(width, height)
            && self.accumulation.matches(width, height)
            && self.denoised.matches(width, height)
            && self.display.matches(width, height);
        if !valid {
            log::warn!("Buffers out of date for {}x{}, reallocating", width, height);
            self.allocate_buffers();
            self.reset_accumulation();
        }
    }

    fn next_uniforms(&mut self) -> FrameUniforms {
        let time = match self.settings.seed {
            Some(_) => self.frame_count as f32 / SYNTHETIC_FPS,
            None => self.start.elapsed().as_secs_f32(),
        };
        FrameUniforms {
            random: [self.rng.gen(), self.rng.gen(), self.rng.gen(), self.rng.gen()],
            resolution: [self.settings.width as f32, self.settings.height as f32],
            time,
            frame_count: self.frame_count,
        }
    }

    fn begin_frame(&mut self) {
        self.revalidate_buffers();
        self.frame_count += 1;
        self.uniforms = self.next_uniforms();
    }

    /// Run the next pass of the current frame and return the stage it
    /// completed. From `Idle` a new frame starts with path tracing; after
    /// `Displaying` the pipeline returns to `Idle`. Denoising is skipped
    /// when disabled.
    pub fn step(&mut self) -> FrameStage {
        let frame = self.frame_count;
        let stage = self.stage;
        self.stage = match stage {
            FrameStage::Idle => {
                self.begin_frame();
                self.path_trace();
                FrameStage::PathTracing
            }
            FrameStage::PathTracing => {
                self.accumulation.accumulate(&self.sample, frame);
                FrameStage::Accumulating
            }
            FrameStage::Accumulating if self.settings.denoise.enabled => {
                denoise_into(
                    self.accumulation.latest(frame),
                    &mut self.denoised,
                    &self.settings.denoise,
                );
                FrameStage::Denoising
            }
            FrameStage::Accumulating | FrameStage::Denoising => {
                let source = match stage {
                    FrameStage::Denoising => &self.denoised,
                    _ => self.accumulation.latest(frame),
                };
                display_into(source, &mut self.display);
                FrameStage::Displaying
            }
            FrameStage::Displaying => FrameStage::Idle,
        };
        self.stage
    }

    /// Run the remaining passes of the current frame (a whole frame when
    /// idle) and return the display image.
    pub fn render_frame(&mut self) -> &ImageBuffer {
        while self.step() != FrameStage::Idle {}
        &self.display
    }

    /// Run `count` frames.
    pub fn render_frames(&mut self, count: u32) -> &ImageBuffer {
        for _ in 0..count {
            self.render_frame();
        }
        &self.display
    }

    fn path_trace(&mut self) {
        let (width, height) = (self.settings.width, self.settings.height);
        let camera = LensCamera::new(&self.scene.camera, width, height);
        let scene = &self.scene;
        let uniforms = self.uniforms;
        let random = Vec4::from_array(uniforms.random);
        let (w, h) = (width as f32, height as f32);

        self.sample.par_fill(|x, y| {
            let pixel_uv = Vec2::new((x as f32 + 0.5) / w, 1.0 - (y as f32 + 0.5) / h);
            let mut rng = pixel_rng(random, pixel_uv, uniforms.frame_count, uniforms.time);
            render_sample(scene, &camera, x, y, &mut rng)
        });
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.settings.width, self.settings.height)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn uniforms(&self) -> &FrameUniforms {
        &self.uniforms
    }

    /// Radiance sample from the last path tracing pass.
    pub fn sample(&self) -> &ImageBuffer {
        &self.sample
    }

    /// The newest running mean.
    pub fn accumulation(&self) -> &ImageBuffer {
        self.accumulation.latest(self.frame_count)
    }

    /// True if the frame counter is 0 and both accumulation buffers are zero.
    pub fn is_reset(&self) -> bool {
        self.frame_count == 0 && self.accumulation.is_zero()
    }

    pub fn denoised(&self) -> &ImageBuffer {
        &self.denoised
    }

    /// Gamma-encoded output of the last frame.
    pub fn display(&self) -> &ImageBuffer {
        &self.display
    }
}
