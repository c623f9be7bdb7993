//! Named parameter interface.
//!
//! External layers (a settings panel, a config loader, a script) edit the
//! scene between frames through `set_parameter(pass, name, value)`. A request
//! either applies completely or leaves the target untouched and reports why.

use std::fmt;
use std::str::FromStr;

use halo_math::{Vec2, Vec3, Vec4};
use thiserror::Error;

use crate::material::{Material, SubsurfaceFalloff};
use crate::scene::{Primitive, Scene};

/// Why a parameter request was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("Unknown pass '{0}'")]
    UnknownPass(String),

    #[error("Unknown parameter '{name}' for pass '{pass}'")]
    UnknownParameter { pass: PassName, name: String },

    #[error("Parameter '{name}' expects {expected} component(s), got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Parameter '{name}' value {value} out of range (expected {expected})")]
    OutOfRange {
        name: String,
        value: f32,
        expected: &'static str,
    },
}

/// The four passes of a frame, as addressed by the parameter interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassName {
    PathTracer,
    Accumulate,
    Denoise,
    Display,
}

impl PassName {
    pub fn as_str(self) -> &'static str {
        match self {
            PassName::PathTracer => "pathTracer",
            PassName::Accumulate => "accumulate",
            PassName::Denoise => "denoise",
            PassName::Display => "display",
        }
    }
}

impl fmt::Display for PassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PassName {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pathTracer" => Ok(PassName::PathTracer),
            "accumulate" => Ok(PassName::Accumulate),
            "denoise" => Ok(PassName::Denoise),
            "display" => Ok(PassName::Display),
            other => Err(ParamError::UnknownPass(other.to_string())),
        }
    }
}

/// A scalar or a 2-4 component vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl ParamValue {
    /// Number of components.
    pub fn arity(&self) -> usize {
        match self {
            ParamValue::Float(_) => 1,
            ParamValue::Vec2(_) => 2,
            ParamValue::Vec3(_) => 3,
            ParamValue::Vec4(_) => 4,
        }
    }

    /// Build a value from 1-4 components. Returns `None` for other lengths.
    pub fn from_slice(components: &[f32]) -> Option<Self> {
        match *components {
            [x] => Some(ParamValue::Float(x)),
            [x, y] => Some(ParamValue::Vec2(Vec2::new(x, y))),
            [x, y, z] => Some(ParamValue::Vec3(Vec3::new(x, y, z))),
            [x, y, z, w] => Some(ParamValue::Vec4(Vec4::new(x, y, z, w))),
            _ => None,
        }
    }

    pub fn scalar(&self, name: &str) -> Result<f32, ParamError> {
        match *self {
            ParamValue::Float(x) => Ok(x),
            _ => Err(self.mismatch(name, 1)),
        }
    }

    pub fn vec2(&self, name: &str) -> Result<Vec2, ParamError> {
        match *self {
            ParamValue::Vec2(v) => Ok(v),
            _ => Err(self.mismatch(name, 2)),
        }
    }

    pub fn vec3(&self, name: &str) -> Result<Vec3, ParamError> {
        match *self {
            ParamValue::Vec3(v) => Ok(v),
            _ => Err(self.mismatch(name, 3)),
        }
    }

    fn mismatch(&self, name: &str, expected: usize) -> ParamError {
        ParamError::ArityMismatch {
            name: name.to_string(),
            expected,
            found: self.arity(),
        }
    }
}

impl From<f32> for ParamValue {
    fn from(x: f32) -> Self {
        ParamValue::Float(x)
    }
}

impl From<Vec2> for ParamValue {
    fn from(v: Vec2) -> Self {
        ParamValue::Vec2(v)
    }
}

impl From<Vec3> for ParamValue {
    fn from(v: Vec3) -> Self {
        ParamValue::Vec3(v)
    }
}

impl From<Vec4> for ParamValue {
    fn from(v: Vec4) -> Self {
        ParamValue::Vec4(v)
    }
}

/// Accepted value ranges.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Range {
    Any,
    Positive,
    NonNegative,
    Unit,
    UnitOpenLow,
    Fov,
}

impl Range {
    fn contains(self, x: f32) -> bool {
        if !x.is_finite() {
            return false;
        }
        match self {
            Range::Any => true,
            Range::Positive => x > 0.0,
            Range::NonNegative => x >= 0.0,
            Range::Unit => (0.0..=1.0).contains(&x),
            Range::UnitOpenLow => x > 0.0 && x <= 1.0,
            Range::Fov => x > 0.0 && x < 180.0,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Range::Any => "a finite number",
            Range::Positive => "finite and > 0",
            Range::NonNegative => "finite and >= 0",
            Range::Unit => "[0, 1]",
            Range::UnitOpenLow => "(0, 1]",
            Range::Fov => "(0, 180)",
        }
    }
}

pub(crate) fn checked(name: &str, x: f32, range: Range) -> Result<f32, ParamError> {
    if range.contains(x) {
        Ok(x)
    } else {
        Err(ParamError::OutOfRange {
            name: name.to_string(),
            value: x,
            expected: range.describe(),
        })
    }
}

fn checked_vec3(name: &str, v: Vec3, range: Range) -> Result<Vec3, ParamError> {
    for x in v.to_array() {
        checked(name, x, range)?;
    }
    Ok(v)
}

fn checked_vec2(name: &str, v: Vec2, range: Range) -> Result<Vec2, ParamError> {
    for x in v.to_array() {
        checked(name, x, range)?;
    }
    Ok(v)
}

impl Scene {
    /// Apply one `pathTracer` parameter.
    ///
    /// The scene is unchanged when an error is returned.
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        let scalar = |range: Range| -> Result<f32, ParamError> {
            checked(name, value.scalar(name)?, range)
        };
        let vec3 = |range: Range| -> Result<Vec3, ParamError> {
            checked_vec3(name, value.vec3(name)?, range)
        };

        match name {
            "camera_position" => self.camera.position = vec3(Range::Any)?,
            "camera_rotation" => self.camera.rotation = vec3(Range::Any)?,
            "camera_target" => self.camera.target = vec3(Range::Any)?,
            "camera_fov" => self.camera.fov_degrees = scalar(Range::Fov)?,
            "camera_aperture" => self.camera.aperture = scalar(Range::NonNegative)?,
            "camera_focus_distance" => self.camera.focus_distance = scalar(Range::Positive)?,
            "lens_distortion" => {
                self.camera.distortion = checked_vec2(name, value.vec2(name)?, Range::Any)?
            }
            "chromatic_aberration" => self.camera.chromatic_aberration = scalar(Range::Any)?,
            "vignette_strength" => self.camera.vignette = scalar(Range::NonNegative)?,

            "light_position" => self.light.position = vec3(Range::Any)?,
            "light_size" => {
                self.light.size = checked_vec2(name, value.vec2(name)?, Range::NonNegative)?
            }
            "light_intensity" => self.light.intensity = scalar(Range::NonNegative)?,
            "light_color" => self.light.color = vec3(Range::Unit)?,

            "blend_smoothness" => self.blend_smoothness = scalar(Range::Positive)?,
            "ground_height" => self.ground_height = scalar(Range::Any)?,

            "ambient_intensity" => self.ambient.intensity = scalar(Range::NonNegative)?,
            "ambient_color" => self.ambient.color = vec3(Range::NonNegative)?,
            "volume_absorption" => self.volume.absorption = scalar(Range::NonNegative)?,
            "volume_scattering" => self.volume.scattering = scalar(Range::NonNegative)?,
            "volume_anisotropy" => self.volume.anisotropy = scalar(Range::Any)?,
            "volume_albedo" => self.volume.albedo = vec3(Range::Unit)?,
            "volume_emission" => self.volume.emission = vec3(Range::NonNegative)?,

            _ => {
                let (primitive, field) = match name.split_once('_') {
                    Some(("a", field)) => (&mut self.primitive_a, field),
                    Some(("b", field)) => (&mut self.primitive_b, field),
                    _ => return Err(unknown(name)),
                };
                set_primitive_field(primitive, name, field, value)?;
            }
        }
        Ok(())
    }
}

fn unknown(name: &str) -> ParamError {
    ParamError::UnknownParameter {
        pass: PassName::PathTracer,
        name: name.to_string(),
    }
}

fn set_primitive_field(
    primitive: &mut Primitive,
    name: &str,
    field: &str,
    value: ParamValue,
) -> Result<(), ParamError> {
    let scalar = |range: Range| -> Result<f32, ParamError> {
        checked(name, value.scalar(name)?, range)
    };
    let vec3 = |range: Range| -> Result<Vec3, ParamError> {
        checked_vec3(name, value.vec3(name)?, range)
    };
    let material: &mut Material = &mut primitive.material;

    match field {
        "position" => primitive.position = vec3(Range::Any)?,
        "radius" => primitive.shape.set_radius(scalar(Range::Positive)?),
        "albedo" => material.albedo = vec3(Range::Unit)?,
        "roughness" => material.roughness = scalar(Range::UnitOpenLow)?,
        "metalness" => material.metalness = scalar(Range::Unit)?,
        "ior" => material.ior = scalar(Range::Positive)?,
        "transmission" => material.transmission = scalar(Range::Unit)?,
        "subsurface" => material.subsurface = scalar(Range::Unit)?,
        "subsurface_radius" => material.subsurface_radius = scalar(Range::Positive)?,
        "subsurface_color" => material.subsurface_color = vec3(Range::NonNegative)?,
        "subsurface_falloff" => {
            let index = scalar(Range::NonNegative)?;
            material.subsurface_falloff = SubsurfaceFalloff::from_index(index.round() as u32);
        }
        "emission" => material.emission = vec3(Range::NonNegative)?,
        _ => return Err(unknown(name)),
    }
    Ok(())
}
