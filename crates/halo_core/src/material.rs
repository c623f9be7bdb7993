//! Physically-based surface material records.
//!
//! Materials are plain data. The renderer resolves them per hit and blends
//! the two primitive materials with [`Material::blend`].

use halo_math::Vec3;
use serde::{Deserialize, Serialize};

/// Shape of the cheap subsurface falloff lobe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsurfaceFalloff {
    #[default]
    Exponential,
    Gaussian,
}

impl SubsurfaceFalloff {
    /// Discrete index used for interpolation (0 = exponential, 1 = gaussian).
    pub fn index(self) -> u32 {
        match self {
            SubsurfaceFalloff::Exponential => 0,
            SubsurfaceFalloff::Gaussian => 1,
        }
    }

    /// Map an index back to a kind. Anything non-zero is gaussian.
    pub fn from_index(index: u32) -> Self {
        if index == 0 {
            SubsurfaceFalloff::Exponential
        } else {
            SubsurfaceFalloff::Gaussian
        }
    }

    /// Interpolate two kinds by `t`, rounding to the nearest index.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let mixed = self.index() as f32 * (1.0 - t) + other.index() as f32 * t;
        Self::from_index((mixed + 0.5).floor().max(0.0) as u32)
    }
}

/// A PBR material definition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Base color (RGB, 0-1)
    pub albedo: Vec3,

    /// Microfacet roughness, (0, 1]
    pub roughness: f32,

    /// Metallic factor (0=dielectric, 1=metal)
    pub metalness: f32,

    /// Index of refraction
    pub ior: f32,

    /// Transmission weight. Only scales the diffuse lobe down.
    pub transmission: f32,

    /// Subsurface lobe weight, [0, 1]
    pub subsurface: f32,

    /// Subsurface radius (> 0)
    pub subsurface_radius: f32,

    /// Subsurface tint
    pub subsurface_color: Vec3,

    /// Subsurface falloff shape
    pub subsurface_falloff: SubsurfaceFalloff,

    /// Reserved, not used by shading
    pub anisotropy: f32,

    /// Emitted radiance (RGB, non-negative)
    pub emission: Vec3,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Vec3::splat(0.8),
            roughness: 0.5,
            metalness: 0.0,
            ior: 1.5,
            transmission: 0.0,
            subsurface: 0.0,
            subsurface_radius: 1.0,
            subsurface_color: Vec3::ONE,
            subsurface_falloff: SubsurfaceFalloff::Exponential,
            anisotropy: 0.0,
            emission: Vec3::ZERO,
        }
    }
}

impl Material {
    /// Create a dielectric material with the given albedo and roughness.
    pub fn new(albedo: Vec3, roughness: f32) -> Self {
        Self {
            albedo,
            roughness,
            ..Default::default()
        }
    }

    /// The fixed ground plane material.
    pub fn ground() -> Self {
        Self {
            albedo: Vec3::splat(0.8),
            roughness: 0.5,
            ior: 1.0,
            ..Default::default()
        }
    }

    /// Builder method to set metalness.
    pub fn with_metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness;
        self
    }

    /// Builder method to set emission.
    pub fn with_emission(mut self, emission: Vec3) -> Self {
        self.emission = emission;
        self
    }

    /// Builder method to set the subsurface lobe.
    pub fn with_subsurface(
        mut self,
        weight: f32,
        radius: f32,
        color: Vec3,
        falloff: SubsurfaceFalloff,
    ) -> Self {
        self.subsurface = weight;
        self.subsurface_radius = radius;
        self.subsurface_color = color;
        self.subsurface_falloff = falloff;
        self
    }

    /// Check if this material is emissive.
    pub fn is_emissive(&self) -> bool {
        self.emission.length() > 0.0
    }

    /// Weight of the Lambertian lobe.
    pub fn diffuse_weight(&self) -> f32 {
        (1.0 - self.metalness) * (1.0 - self.transmission)
    }

    /// Linearly interpolate every field toward `other` by `t`.
    ///
    /// `t = 0` returns `self`, `t = 1` returns `other`. The falloff kind is
    /// interpolated by index and rounded to the nearest kind.
    pub fn blend(&self, other: &Material, t: f32) -> Material {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Material {
            albedo: self.albedo.lerp(other.albedo, t),
            roughness: mix(self.roughness, other.roughness),
            metalness: mix(self.metalness, other.metalness),
            ior: mix(self.ior, other.ior),
            transmission: mix(self.transmission, other.transmission),
            subsurface: mix(self.subsurface, other.subsurface),
            subsurface_radius: mix(self.subsurface_radius, other.subsurface_radius),
            subsurface_color: self.subsurface_color.lerp(other.subsurface_color, t),
            subsurface_falloff: self.subsurface_falloff.lerp(other.subsurface_falloff, t),
            anisotropy: mix(self.anisotropy, other.anisotropy),
            emission: self.emission.lerp(other.emission, t),
        }
    }
}
