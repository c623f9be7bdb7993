//! Importance sampling routines.
//!
//! All samplers take their uniform variates explicitly so the caller decides
//! how the per-pixel stream is consumed.

use std::f32::consts::PI;

use halo_core::AreaLight;
use halo_math::{tangent_frame, Vec2, Vec3};

/// Mirror `v` about the normal `n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Cosine-weighted direction in the hemisphere around `n`.
pub fn sample_cosine_hemisphere(n: Vec3, r1: f32, r2: f32) -> Vec3 {
    let phi = 2.0 * PI * r1;
    let cos_theta = (1.0 - r2).sqrt();
    let sin_theta = r2.sqrt();
    let (t, b) = tangent_frame(n);
    (t * (phi.cos() * sin_theta) + b * (phi.sin() * sin_theta) + n * cos_theta).normalize()
}

/// GGX-distributed microfacet normal around `n`.
pub fn sample_ggx_half_vector(n: Vec3, roughness: f32, r1: f32, r2: f32) -> Vec3 {
    let a = roughness * roughness;
    let phi = 2.0 * PI * r1;
    let cos_theta = ((1.0 - r2) / (1.0 + (a * a - 1.0) * r2)).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let (t, b) = tangent_frame(n);
    (t * (phi.cos() * sin_theta) + b * (phi.sin() * sin_theta) + n * cos_theta).normalize()
}

/// Reflect the view direction about a sampled GGX half vector.
pub fn sample_ggx_reflection(n: Vec3, v: Vec3, roughness: f32, r1: f32, r2: f32) -> Vec3 {
    let h = sample_ggx_half_vector(n, roughness, r1, r2);
    reflect(-v, h)
}

/// Uniform point on the unit disk (polar mapping).
pub fn sample_unit_disk(r1: f32, r2: f32) -> Vec2 {
    let radius = r1.sqrt();
    let theta = 2.0 * PI * r2;
    Vec2::new(radius * theta.cos(), radius * theta.sin())
}

/// Uniform point on the light rectangle.
pub fn sample_area_light(light: &AreaLight, r1: f32, r2: f32) -> Vec3 {
    light.position + Vec3::new((r1 - 0.5) * light.size.x, 0.0, (r2 - 0.5) * light.size.y)
}

/// Solid-angle pdf of sampling `light_point` from `hit_point`.
///
/// The light emits from both faces. Returns 0 for an edge-on or zero-area
/// light.
pub fn area_light_pdf(light: &AreaLight, light_point: Vec3, hit_point: Vec3) -> f32 {
    let area = light.area();
    let to_light = light_point - hit_point;
    let dist2 = to_light.length_squared();
    let cos_light = to_light.normalize_or_zero().dot(Vec3::Y).abs();
    if cos_light > 0.0 && area > 0.0 {
        dist2 / (cos_light * area)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halo_math::HashRng;

    #[test]
    fn test_reflect() {
        let r = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
        assert!((r - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_cosine_hemisphere_stays_above() {
        let mut rng = HashRng::new([7, 11, 13, 17]);
        let n = Vec3::new(0.3, 0.9, -0.2).normalize();
        let mut mean_cos = 0.0;
        let count = 20_000;
        for _ in 0..count {
            let d = sample_cosine_hemisphere(n, rng.next_f32(), rng.next_f32());
            assert!((d.length() - 1.0).abs() < 1e-4);
            assert!(d.dot(n) >= -1e-5);
            mean_cos += d.dot(n);
        }
        // E[cos] under a cosine-weighted density is 2/3
        mean_cos /= count as f32;
        assert!((mean_cos - 2.0 / 3.0).abs() < 0.01, "mean cos {}", mean_cos);
    }

    #[test]
    fn test_ggx_half_vector_concentrates_with_low_roughness() {
        let mut rng = HashRng::new([1, 2, 3, 4]);
        let mut smooth = 0.0;
        let mut rough = 0.0;
        for _ in 0..2000 {
            let (r1, r2) = (rng.next_f32(), rng.next_f32());
            smooth += sample_ggx_half_vector(Vec3::Z, 0.1, r1, r2).z;
            rough += sample_ggx_half_vector(Vec3::Z, 0.9, r1, r2).z;
        }
        assert!(smooth > rough);
        assert!(smooth / 2000.0 > 0.99);
    }

    #[test]
    fn test_ggx_reflection_mirror_limit() {
        let v = Vec3::new(0.5, 0.0, 1.0).normalize();
        let l = sample_ggx_reflection(Vec3::Z, v, 1e-3, 0.3, 0.0);
        assert!((l - Vec3::new(-v.x, -v.y, v.z)).length() < 1e-4);
    }

    #[test]
    fn test_unit_disk() {
        let mut rng = HashRng::new([5, 6, 7, 8]);
        for _ in 0..1000 {
            assert!(sample_unit_disk(rng.next_f32(), rng.next_f32()).length() <= 1.0 + 1e-6);
        }
    }

    #[test]
    fn test_area_light_sample_and_pdf() {
        let light = AreaLight {
            position: Vec3::new(0.0, 3.0, 0.0),
            size: Vec2::new(2.0, 4.0),
            ..Default::default()
        };
        assert_eq!(sample_area_light(&light, 0.5, 0.5), light.position);
        assert_eq!(sample_area_light(&light, 0.0, 1.0), Vec3::new(-1.0, 3.0, 2.0));

        // Straight below at distance 3: dist^2 / (cos * area) = 9 / 8
        let pdf = area_light_pdf(&light, light.position, Vec3::ZERO);
        assert!((pdf - 9.0 / 8.0).abs() < 1e-5);

        // Two-sided: same pdf from above
        let above = area_light_pdf(&light, light.position, Vec3::new(0.0, 6.0, 0.0));
        assert!((above - pdf).abs() < 1e-5);

        // Edge-on
        assert_eq!(area_light_pdf(&light, light.position, Vec3::new(5.0, 3.0, 0.0)), 0.0);
    }
}
