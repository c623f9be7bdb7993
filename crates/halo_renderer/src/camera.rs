//! Thin-lens camera for primary ray generation.

use halo_core::Camera;
use halo_math::{EulerRot, HashRng, Mat3, Ray, Vec2, Vec3};

use crate::sampling::sample_unit_disk;

/// Radial polynomial lens distortion, `uv * (1 + k1 r^2 + k2 r^4)`.
#[inline]
pub fn distort_uv(uv: Vec2, k: Vec2) -> Vec2 {
    let r2 = uv.length_squared();
    uv * (1.0 + k.x * r2 + k.y * r2 * r2)
}

/// Camera with cached basis, ready to generate rays.
#[derive(Debug, Clone, Copy)]
pub struct LensCamera {
    center: Vec3,

    // Columns are right, up, forward
    basis: Mat3,
    rotation: Mat3,

    tan_half_fov: f32,
    aspect: f32,
    lens_radius: f32,
    focus_dist: f32,

    distortion: Vec2,
    chromatic_aberration: f32,
    vignette_strength: f32,

    image_width: u32,
    image_height: u32,
}

impl LensCamera {
    /// Initialize the camera for an image resolution.
    pub fn new(camera: &Camera, image_width: u32, image_height: u32) -> Self {
        let forward = (camera.target - camera.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z);
        let right = forward.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::X);
        let up = right.cross(forward);

        Self {
            center: camera.position,
            basis: Mat3::from_cols(right, up, forward),
            rotation: Mat3::from_euler(
                EulerRot::XYZ,
                camera.rotation.x,
                camera.rotation.y,
                camera.rotation.z,
            ),
            tan_half_fov: (camera.fov_degrees.to_radians() * 0.5).tan(),
            aspect: image_width as f32 / image_height.max(1) as f32,
            lens_radius: camera.aperture * 0.5,
            focus_dist: camera.focus_distance,
            distortion: camera.distortion,
            chromatic_aberration: camera.chromatic_aberration,
            vignette_strength: camera.vignette,
            image_width,
            image_height,
        }
    }

    /// Aspect-scaled screen coordinate of pixel (i, j) with a sub-pixel
    /// offset in [-0.5, 0.5]. Row 0 is the top of the image.
    pub fn screen_uv(&self, i: u32, j: u32, offset: Vec2) -> Vec2 {
        let w = self.image_width as f32;
        let h = self.image_height as f32;
        let pixel_uv = Vec2::new((i as f32 + 0.5) / w, 1.0 - (j as f32 + 0.5) / h);
        let jittered = pixel_uv + offset / Vec2::new(w, h);
        let mut uv = jittered * 2.0 - 1.0;
        uv.x *= self.aspect;
        uv
    }

    /// Distortion coefficients for the red, green and blue traces.
    pub fn channel_distortion(&self) -> [Vec2; 3] {
        let half = Vec2::splat(0.5 * self.chromatic_aberration);
        [self.distortion + half, self.distortion, self.distortion - half]
    }

    pub fn has_chromatic_aberration(&self) -> bool {
        self.chromatic_aberration != 0.0
    }

    /// Radial darkening factor at a screen coordinate.
    pub fn vignette(&self, uv: Vec2) -> f32 {
        1.0 - (uv.length() * self.vignette_strength).clamp(0.0, 1.0)
    }

    /// Generate a ray through screen coordinate `uv` with distortion `k`.
    ///
    /// Draws two variates for the lens sample even for a pinhole, so the
    /// stream layout does not depend on the aperture.
    pub fn get_ray(&self, uv: Vec2, k: Vec2, rng: &mut HashRng) -> Ray {
        let uv = distort_uv(uv, k);
        let local = Vec3::new(uv.x * self.tan_half_fov, uv.y * self.tan_half_fov, 1.0).normalize();
        let direction = (self.basis * (self.rotation * local)).normalize();

        let disk = sample_unit_disk(rng.next_f32(), rng.next_f32()) * self.lens_radius;
        let origin = self.center + self.basis.x_axis * disk.x + self.basis.y_axis * disk.y;

        let denom = direction.dot(self.basis.z_axis);
        let t_focus = if denom > 0.0 {
            self.focus_dist / denom
        } else {
            self.focus_dist
        };
        let focus_point = self.center + direction * t_focus;

        Ray::normalized(origin, focus_point - origin)
    }

    /// Forward axis after the look-at basis.
    pub fn forward(&self) -> Vec3 {
        self.basis.z_axis
    }
}
