//! Microfacet BSDF with a Lambertian base and a cheap subsurface lobe.
//!
//! The specular lobe is GGX with a Smith-Schlick visibility term and Schlick
//! Fresnel. The sampling pdf is a fixed 50/50 mixture of cosine-weighted
//! diffuse and GGX half-vector sampling.

use std::f32::consts::PI;

use halo_core::{Material, Scene, SubsurfaceFalloff};
use halo_math::Vec3;

use crate::image::Color;
use crate::sdf::PrimitiveId;

/// Added to BSDF and pdf denominators.
const DENOM_EPSILON: f32 = 1e-6;

/// Added to the final mixture pdf so it is never exactly zero.
const PDF_FLOOR: f32 = 1e-8;

/// Subsurface weights below this skip the lobe.
const SUBSURFACE_THRESHOLD: f32 = 1e-5;

/// Fixed scale of the subsurface lobe.
const SUBSURFACE_SCALE: f32 = 0.2;

/// Offset that keeps the subsurface radius away from zero.
const SUBSURFACE_RADIUS_EPSILON: f32 = 0.001;

/// BSDF value and the mixture pdf for one direction pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsdfEval {
    pub value: Color,
    pub pdf: f32,
}

/// Material at a field hit: the ground material, or the two primitive
/// materials blended by the smooth-min factor.
pub fn resolve_material(scene: &Scene, id: PrimitiveId, blend: f32) -> Material {
    match id {
        PrimitiveId::Ground => scene.ground,
        PrimitiveId::Blob => scene
            .primitive_a
            .material
            .blend(&scene.primitive_b.material, blend),
    }
}

#[inline]
fn fresnel_schlick(cos_theta: f32, f0: Color) -> Color {
    f0 + (Color::ONE - f0) * (1.0 - cos_theta).clamp(0.0, 1.0).powi(5)
}

/// GGX normal distribution. Alpha is roughness squared.
#[inline]
pub fn ggx_distribution(n_dot_h: f32, roughness: f32) -> f32 {
    let r = roughness.max(1e-3);
    let a = r * r;
    let a2 = a * a;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (PI * denom * denom)
}

/// Smith visibility with the Schlick-GGX `k = (r + 1)^2 / 8` remapping.
#[inline]
pub fn smith_visibility(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    let k = (roughness + 1.0) * (roughness + 1.0) / 8.0;
    let gv = n_dot_v / (n_dot_v * (1.0 - k) + k);
    let gl = n_dot_l / (n_dot_l * (1.0 - k) + k);
    gv * gl
}

/// Directional subsurface falloff. Not a diffusion model.
pub fn eval_subsurface(
    falloff: SubsurfaceFalloff,
    weight: f32,
    radius: f32,
    color: Color,
    n: Vec3,
    l: Vec3,
    v: Vec3,
) -> Color {
    let n_dot_l = n.dot(l);
    let n_dot_v = n.dot(v);
    let radius = radius + SUBSURFACE_RADIUS_EPSILON;

    let f = match falloff {
        SubsurfaceFalloff::Exponential => {
            let scale = 3.0 / radius;
            let pl = n_dot_l.clamp(0.0, 1.0);
            let pv = n_dot_v.clamp(0.0, 1.0);
            (1.0 - pl).powf(scale) * (1.0 - pv).powf(scale)
        }
        SubsurfaceFalloff::Gaussian => {
            let dist_l = n_dot_l.abs() / radius;
            let dist_v = n_dot_v.abs() / radius;
            (-3.0 * dist_l).exp() * (-3.0 * dist_v).exp()
        }
    };
    color * (SUBSURFACE_SCALE * f * weight)
}

/// Evaluate the BSDF for view direction `v` and light direction `l`.
pub fn eval_bsdf(material: &Material, n: Vec3, v: Vec3, l: Vec3) -> BsdfEval {
    let h = (l + v).normalize_or_zero();
    let n_dot_l = n.dot(l).max(0.0);
    let n_dot_v = n.dot(v).max(0.0);
    let n_dot_h = n.dot(h).max(0.0);
    let v_dot_h = v.dot(h).max(0.0);

    let f0 = Color::splat(0.04).lerp(material.albedo, material.metalness);
    let diffuse_weight = material.diffuse_weight();
    let diffuse = material.albedo * (diffuse_weight / PI);

    let d = ggx_distribution(n_dot_h, material.roughness);
    let g = smith_visibility(n_dot_v, n_dot_l, material.roughness);
    let f = fresnel_schlick(v_dot_h, f0);
    let specular = f * (d * g / (4.0 * n_dot_v * n_dot_l + DENOM_EPSILON));

    let subsurface = if material.subsurface > SUBSURFACE_THRESHOLD {
        eval_subsurface(
            material.subsurface_falloff,
            material.subsurface,
            material.subsurface_radius,
            material.subsurface_color,
            n,
            l,
            v,
        )
    } else {
        Color::ZERO
    };

    let pdf_diffuse = if diffuse_weight > 0.0 {
        n_dot_l / PI
    } else {
        0.0
    };
    let pdf_specular = n_dot_h * d / (4.0 * v_dot_h + DENOM_EPSILON);

    BsdfEval {
        value: diffuse + specular + subsurface,
        pdf: 0.5 * pdf_diffuse + 0.5 * pdf_specular + PDF_FLOOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{sample_cosine_hemisphere, sample_ggx_reflection};
    use halo_core::Primitive;
    use halo_math::HashRng;

    #[test]
    fn test_resolve_material() {
        let scene = Scene::new(
            Primitive::sphere(Vec3::ZERO, 1.0, Material::new(Vec3::X, 0.2)),
            Primitive::sphere(Vec3::ONE, 1.0, Material::new(Vec3::Z, 0.6)),
        );

        assert_eq!(resolve_material(&scene, PrimitiveId::Ground, 0.7), scene.ground);
        assert_eq!(
            resolve_material(&scene, PrimitiveId::Blob, 0.0),
            scene.primitive_a.material
        );
        let mid = resolve_material(&scene, PrimitiveId::Blob, 0.5);
        assert!((mid.albedo - Vec3::new(0.5, 0.0, 0.5)).length() < 1e-6);
        assert!((mid.roughness - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_bsdf_is_finite_at_grazing_angles() {
        let material = Material::new(Vec3::splat(0.5), 0.3);
        let n = Vec3::Y;
        let grazing = Vec3::new(1.0, 0.0, 0.0);
        let eval = eval_bsdf(&material, n, grazing, grazing);
        assert!(eval.value.is_finite());
        assert!(eval.pdf.is_finite() && eval.pdf > 0.0);

        let below = eval_bsdf(&material, n, Vec3::Y, -Vec3::Y);
        assert!(below.value.is_finite());
    }

    #[test]
    fn test_metal_has_no_diffuse_pdf() {
        let metal = Material::new(Vec3::ONE, 0.5).with_metalness(1.0);
        let dielectric = Material::new(Vec3::ONE, 0.5);
        let n = Vec3::Y;
        let v = Vec3::new(0.0, 1.0, 0.0);
        let l = Vec3::new(1.0, 1.0, 0.0).normalize();

        let metal_eval = eval_bsdf(&metal, n, v, l);
        let dielectric_eval = eval_bsdf(&dielectric, n, v, l);
        assert!(metal_eval.pdf < dielectric_eval.pdf);
        let expected_gap = 0.5 * n.dot(l) / PI;
        assert!((dielectric_eval.pdf - metal_eval.pdf - expected_gap).abs() < 1e-5);
    }

    #[test]
    fn test_lambert_energy() {
        // Rough white dielectric: the diffuse lobe alone integrates to about 1,
        // specular adds a little on top.
        let material = Material::new(Vec3::ONE, 1.0);
        let n = Vec3::Y;
        let v = Vec3::Y;
        let mut rng = HashRng::new([3, 1, 4, 1]);
        let count = 20_000;
        let mut albedo = 0.0;
        for _ in 0..count {
            let l = sample_cosine_hemisphere(n, rng.next_f32(), rng.next_f32());
            let value = eval_bsdf(&material, n, v, l).value.x;
            // cosine-weighted estimator: f * cos / (cos / pi)
            albedo += value * PI;
        }
        albedo /= count as f32;
        assert!(albedo > 0.95 && albedo < 1.3, "albedo {}", albedo);
    }

    #[test]
    fn test_specular_peak_in_mirror_direction() {
        let material = Material::new(Vec3::splat(0.9), 0.1).with_metalness(1.0);
        let n = Vec3::Y;
        let v = Vec3::new(1.0, 1.0, 0.0).normalize();
        let mirror = Vec3::new(-1.0, 1.0, 0.0).normalize();
        let off = Vec3::new(-0.2, 1.0, 0.5).normalize();

        let peak = eval_bsdf(&material, n, v, mirror).value;
        let side = eval_bsdf(&material, n, v, off).value;
        assert!(peak.x > side.x * 10.0);

        let sampled = sample_ggx_reflection(n, v, 0.1, 0.25, 0.5);
        assert!(sampled.dot(mirror) > 0.95);
    }

    #[test]
    fn test_subsurface_falloffs() {
        let n = Vec3::Y;
        let grazing = Vec3::new(1.0, 0.01, 0.0).normalize();
        let exp = eval_subsurface(
            SubsurfaceFalloff::Exponential,
            1.0,
            1.0,
            Vec3::ONE,
            n,
            grazing,
            grazing,
        );
        let head_on = eval_subsurface(
            SubsurfaceFalloff::Exponential,
            1.0,
            1.0,
            Vec3::ONE,
            n,
            n,
            n,
        );
        assert!(exp.x > head_on.x);
        assert!(exp.x <= SUBSURFACE_SCALE + 1e-6);

        let gauss = eval_subsurface(
            SubsurfaceFalloff::Gaussian,
            0.5,
            1.0,
            Vec3::new(1.0, 0.5, 0.0),
            n,
            n,
            n,
        );
        let expected = 0.2 * 0.5 * (-6.0f32 / 1.001).exp();
        assert!((gauss.x - expected).abs() < 1e-6);
        assert!((gauss.y - expected * 0.5).abs() < 1e-6);
        assert_eq!(gauss.z, 0.0);
    }

    #[test]
    fn test_subsurface_skipped_below_threshold() {
        let plain = Material::new(Vec3::splat(0.5), 0.5);
        let tiny = plain.with_subsurface(1e-6, 1.0, Vec3::ONE, SubsurfaceFalloff::Gaussian);
        let l = Vec3::new(0.3, 1.0, 0.0).normalize();
        assert_eq!(
            eval_bsdf(&plain, Vec3::Y, Vec3::Y, l),
            eval_bsdf(&tiny, Vec3::Y, Vec3::Y, l)
        );
    }
}
