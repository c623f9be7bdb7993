//! Scene model for Halo.
//!
//! The scene is intentionally tiny: one camera, one rectangular area light,
//! two smooth-unioned implicit primitives and a ground plane. It is mutated
//! between frames by the parameter interface and read-only while a frame
//! renders.

use halo_math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::material::Material;

/// Invariant violations found by [`Scene::validate`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Camera focus distance must be positive, got {0}")]
    FocusDistance(f32),

    #[error("Camera aperture must be non-negative, got {0}")]
    Aperture(f32),

    #[error("Camera field of view must be in (0, 180) degrees, got {0}")]
    FieldOfView(f32),

    #[error("Blend smoothness must be positive, got {0}")]
    Smoothness(f32),

    #[error("Primitive {primitive}: {message}")]
    Primitive { primitive: char, message: String },

    #[error("Area light: {0}")]
    Light(String),

    #[error("{0} must be finite")]
    NotFinite(&'static str),
}

/// Thin-lens camera description.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Eye position
    pub position: Vec3,

    /// Point the camera looks at before `rotation` is applied
    pub target: Vec3,

    /// Extra Euler rotation (radians, XYZ order) of the view direction
    pub rotation: Vec3,

    /// Vertical field of view in degrees
    pub fov_degrees: f32,

    /// Lens diameter (0 = pinhole)
    pub aperture: f32,

    /// Distance to the plane of perfect focus along the forward axis
    pub focus_distance: f32,

    /// Radial distortion coefficients (k1, k2)
    pub distortion: Vec2,

    /// Per-channel distortion offset strength
    pub chromatic_aberration: f32,

    /// Radial darkening strength
    pub vignette: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 4.0),
            target: Vec3::ZERO,
            rotation: Vec3::ZERO,
            fov_degrees: 45.0,
            aperture: 0.0,
            focus_distance: 4.0,
            distortion: Vec2::ZERO,
            chromatic_aberration: 0.0,
            vignette: 0.0,
        }
    }
}

impl Camera {
    /// Set camera position and target.
    pub fn with_position(mut self, position: Vec3, target: Vec3) -> Self {
        self.position = position;
        self.target = target;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, fov_degrees: f32, aperture: f32, focus_distance: f32) -> Self {
        self.fov_degrees = fov_degrees;
        self.aperture = aperture;
        self.focus_distance = focus_distance;
        self
    }
}

/// Axis-aligned rectangular area light facing along the up axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaLight {
    /// Center of the rectangle
    pub position: Vec3,

    /// Extents along x and z
    pub size: Vec2,

    /// Scalar intensity
    pub intensity: f32,

    /// Normalized color (0-1 per channel)
    pub color: Vec3,
}

impl Default for AreaLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(-3.0, 3.0, 0.0),
            size: Vec2::new(4.0, 4.0),
            intensity: 5.0,
            color: Vec3::ONE,
        }
    }
}

impl AreaLight {
    /// Emitted radiance.
    pub fn emission(&self) -> Vec3 {
        self.color * self.intensity
    }

    /// Area of the rectangle.
    pub fn area(&self) -> f32 {
        self.size.x * self.size.y
    }
}

/// Implicit surface kinds a primitive can take.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Sphere { radius: f32 },
    RoundBox { half_extent: Vec3, rounding: f32 },
}

impl Shape {
    /// Set the characteristic size: the sphere radius, or a uniform box half extent.
    pub fn set_radius(&mut self, value: f32) {
        match self {
            Shape::Sphere { radius } => *radius = value,
            Shape::RoundBox { half_extent, .. } => *half_extent = Vec3::splat(value),
        }
    }
}

/// An implicit primitive with a material slot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub position: Vec3,
    pub shape: Shape,
    pub material: Material,
}

impl Primitive {
    /// Create a sphere primitive.
    pub fn sphere(position: Vec3, radius: f32, material: Material) -> Self {
        Self {
            position,
            shape: Shape::Sphere { radius },
            material,
        }
    }

    /// Create a rounded box primitive.
    pub fn round_box(position: Vec3, half_extent: Vec3, rounding: f32, material: Material) -> Self {
        Self {
            position,
            shape: Shape::RoundBox {
                half_extent,
                rounding,
            },
            material,
        }
    }
}

/// Ambient light fields. Stored, not consumed by the integrator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientLight {
    pub intensity: f32,
    pub color: Vec3,
}

/// Participating medium fields. Stored, not consumed by the integrator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Volume {
    pub absorption: f32,
    pub scattering: f32,
    pub anisotropy: f32,
    pub albedo: Vec3,
    pub emission: Vec3,
}

/// A complete scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub camera: Camera,
    pub light: AreaLight,

    /// First blended primitive (blend factor 0)
    pub primitive_a: Primitive,

    /// Second blended primitive (blend factor 1)
    pub primitive_b: Primitive,

    /// Smooth-min constant k
    pub blend_smoothness: f32,

    /// Height of the ground plane
    pub ground_height: f32,

    /// Ground material
    pub ground: Material,

    pub ambient: AmbientLight,
    pub volume: Volume,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            light: AreaLight::default(),
            primitive_a: Primitive::sphere(
                Vec3::new(-1.0, 0.0, 0.0),
                1.0,
                Material::new(Vec3::new(1.0, 0.0, 0.0), 0.1),
            ),
            primitive_b: Primitive::round_box(
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::splat(1.0),
                0.3,
                Material::new(Vec3::new(0.0, 0.0, 1.0), 0.4),
            ),
            blend_smoothness: 0.5,
            ground_height: -1.0,
            ground: Material::ground(),
            ambient: AmbientLight::default(),
            volume: Volume::default(),
        }
    }
}

impl Scene {
    /// Create a scene from two primitives with default camera and light.
    pub fn new(primitive_a: Primitive, primitive_b: Primitive) -> Self {
        Self {
            primitive_a,
            primitive_b,
            ..Default::default()
        }
    }

    /// Builder method to set the camera.
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    /// Builder method to set the light.
    pub fn with_light(mut self, light: AreaLight) -> Self {
        self.light = light;
        self
    }

    /// Check the data-model invariants.
    pub fn validate(&self) -> Result<(), SceneError> {
        let camera = &self.camera;
        let placements = [
            ("Camera position", camera.position),
            ("Camera target", camera.target),
            ("Camera rotation", camera.rotation),
            ("Light position", self.light.position),
            ("Primitive a position", self.primitive_a.position),
            ("Primitive b position", self.primitive_b.position),
        ];
        for (what, v) in placements {
            if !v.is_finite() {
                return Err(SceneError::NotFinite(what));
            }
        }
        if !(camera.distortion.is_finite()
            && camera.chromatic_aberration.is_finite()
            && camera.vignette.is_finite()
            && self.ground_height.is_finite())
        {
            return Err(SceneError::NotFinite("Lens and ground settings"));
        }
        if !(camera.focus_distance > 0.0 && camera.focus_distance.is_finite()) {
            return Err(SceneError::FocusDistance(camera.focus_distance));
        }
        if !(camera.aperture >= 0.0 && camera.aperture.is_finite()) {
            return Err(SceneError::Aperture(camera.aperture));
        }
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(SceneError::FieldOfView(camera.fov_degrees));
        }
        if !(self.blend_smoothness > 0.0 && self.blend_smoothness.is_finite()) {
            return Err(SceneError::Smoothness(self.blend_smoothness));
        }
        let light = &self.light;
        if !(light.size.min_element() >= 0.0 && light.intensity >= 0.0)
            || !light.size.is_finite()
            || !light.intensity.is_finite()
        {
            return Err(SceneError::Light(
                "size and intensity must be finite and non-negative".to_string(),
            ));
        }

        for (tag, primitive) in [('a', &self.primitive_a), ('b', &self.primitive_b)] {
            let invalid = |message: String| SceneError::Primitive {
                primitive: tag,
                message,
            };
            match primitive.shape {
                Shape::Sphere { radius } if !(radius > 0.0 && radius.is_finite()) => {
                    return Err(invalid(format!("sphere radius must be positive, got {}", radius)));
                }
                Shape::RoundBox {
                    half_extent,
                    rounding,
                } if !(half_extent.min_element() >= 0.0 && rounding >= 0.0)
                    || !half_extent.is_finite()
                    || !rounding.is_finite() =>
                {
                    return Err(invalid("round box extents must be non-negative".to_string()));
                }
                _ => {}
            }
            validate_material(&primitive.material).map_err(invalid)?;
        }
        validate_material(&self.ground).map_err(|message| SceneError::Primitive {
            primitive: 'g',
            message,
        })
    }
}

fn validate_material(material: &Material) -> Result<(), String> {
    let unit = |value: f32| (0.0..=1.0).contains(&value);
    if !(material.roughness > 0.0 && material.roughness <= 1.0) {
        return Err(format!("roughness must be in (0, 1], got {}", material.roughness));
    }
    if !unit(material.metalness) || !unit(material.transmission) || !unit(material.subsurface) {
        return Err("metalness, transmission and subsurface must be in [0, 1]".to_string());
    }
    if !(material.subsurface_radius > 0.0 && material.subsurface_radius.is_finite()) {
        return Err(format!(
            "subsurface radius must be positive, got {}",
            material.subsurface_radius
        ));
    }
    if !(material.emission.min_element() >= 0.0) || !material.emission.is_finite() {
        return Err("emission must be finite and non-negative".to_string());
    }
    Ok(())
}
