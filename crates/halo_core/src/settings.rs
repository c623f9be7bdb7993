//! Render settings that are not part of the scene.

use serde::{Deserialize, Serialize};

use crate::params::{checked, ParamError, ParamValue, PassName, Range};

/// Edge-aware denoise filter controls.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseSettings {
    /// When false, display reads the accumulation directly
    pub enabled: bool,

    /// Standard deviation of the spatial Gaussian, in pixels
    pub spatial_sigma: f32,

    /// Standard deviation of the range Gaussian, in color units
    pub color_sigma: f32,
}

impl Default for DenoiseSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            spatial_sigma: 2.0,
            color_sigma: 0.1,
        }
    }
}

impl DenoiseSettings {
    /// Apply one `denoise` pass parameter.
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        match name {
            "enabled" => self.enabled = value.scalar(name)? > 0.5,
            "spatial_sigma" => self.spatial_sigma = checked(name, value.scalar(name)?, Range::Positive)?,
            "color_sigma" => self.color_sigma = checked(name, value.scalar(name)?, Range::Positive)?,
            _ => {
                return Err(ParamError::UnknownParameter {
                    pass: PassName::Denoise,
                    name: name.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Check that both sigmas are positive.
    pub fn validate(&self) -> Result<(), ParamError> {
        checked("spatial_sigma", self.spatial_sigma, Range::Positive)?;
        checked("color_sigma", self.color_sigma, Range::Positive)?;
        Ok(())
    }
}

/// Output resolution, seeding and post-process configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,

    /// Fixed seed for reproducible frames; `None` seeds from entropy
    pub seed: Option<u64>,

    pub denoise: DenoiseSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 450,
            seed: None,
            denoise: DenoiseSettings::default(),
        }
    }
}

impl RenderSettings {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Builder method to fix the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
