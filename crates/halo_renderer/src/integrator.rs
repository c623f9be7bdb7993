//! Unidirectional path tracer.
//!
//! Each bounce combines area light sampling (MIS balance heuristic on the
//! light side) with BSDF sampling for the continuation ray, and applies
//! Russian roulette to the continuation weight.

use halo_core::{AreaLight, Material, Scene};
use halo_math::{HashRng, Ray, Vec2, Vec3, Vec4};

use crate::camera::LensCamera;
use crate::image::Color;
use crate::sampling::{
    area_light_pdf, sample_area_light, sample_cosine_hemisphere, sample_ggx_reflection,
};
use crate::sdf::{ray_march, DistanceField, SceneField, SURFACE_EPSILON};
use crate::shading::{eval_bsdf, resolve_material};

/// Maximum path length.
pub const MAX_BOUNCES: u32 = 6;

/// Per-channel radiance ceiling.
pub const FIREFLY_CLAMP: f32 = 10.0;

/// Probability that a path survives Russian roulette.
pub const RR_SURVIVAL: f32 = 0.9;

/// Continuation pdfs below this end the path.
const MIN_CONTINUATION_PDF: f32 = 1e-7;

/// Added to the light pdf in the direct lighting estimator.
const LIGHT_PDF_EPSILON: f32 = 1e-6;

/// Build the per-pixel random stream.
///
/// `pixel_uv` is the pixel center in [0, 1]^2 with the origin at the bottom
/// left.
pub fn pixel_rng(random: Vec4, pixel_uv: Vec2, frame: u32, time: f32) -> HashRng {
    HashRng::from_vec4(random + Vec4::new(pixel_uv.x, pixel_uv.y, frame as f32, time))
}

/// Russian roulette on a continuation weight.
///
/// Returns the compensated weight if the path survives, `None` otherwise.
#[inline]
pub fn russian_roulette(weight: Color, rng: &mut HashRng) -> Option<Color> {
    if rng.next_f32() > RR_SURVIVAL {
        None
    } else {
        Some(weight / RR_SURVIVAL)
    }
}

/// Origin offset along the normal for rays leaving a surface.
///
/// Marching stops within `SURFACE_EPSILON` of a surface, so a ray starting
/// exactly that far out would re-hit its own surface on the first step
/// depending on rounding.
const RAY_OFFSET: f32 = 2.0 * SURFACE_EPSILON;

/// A sampled continuation direction and its throughput factor
/// `f * cos / pdf`, before Russian roulette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Continuation {
    pub direction: Vec3,
    pub weight: Color,
}

/// Single-sample area light estimate at a surface point, MIS weighted
/// against BSDF sampling. Consumes two variates.
///
/// The light is visible only if the shadow ray reaches it: a blocker
/// counts only when it is closer than the light sample.
pub fn direct_light<F: DistanceField + ?Sized>(
    field: &F,
    light: &AreaLight,
    material: &Material,
    position: Vec3,
    n: Vec3,
    v: Vec3,
    rng: &mut HashRng,
) -> Color {
    let light_point = sample_area_light(light, rng.next_f32(), rng.next_f32());
    let to_light = light_point - position;
    let light_dist = to_light.length();
    let light_dir = to_light.normalize_or_zero();

    let shadow = ray_march(field, &Ray::new(position + n * RAY_OFFSET, light_dir));
    let unshadowed = match shadow {
        None => true,
        Some(blocker) => (blocker.position - position).length() > light_dist - SURFACE_EPSILON,
    };

    let light_pdf = area_light_pdf(light, light_point, position);
    let n_dot_l = n.dot(light_dir).max(0.0);
    if !(unshadowed && n_dot_l > 0.0 && light_pdf > 0.0) {
        return Color::ZERO;
    }

    let eval = eval_bsdf(material, n, v, light_dir);
    let mis_weight = light_pdf / (light_pdf + eval.pdf);
    light.emission() * eval.value * (n_dot_l / (light_pdf + LIGHT_PDF_EPSILON) * mis_weight)
}

/// Pick a lobe with `lobe` and sample the next direction with `(r1, r2)`.
///
/// Returns `None` when the mixture pdf is negligible or the direction
/// falls below the surface.
pub fn continue_path(
    material: &Material,
    n: Vec3,
    v: Vec3,
    lobe: f32,
    r1: f32,
    r2: f32,
) -> Option<Continuation> {
    let diffuse_pick_weight = material.diffuse_weight() + material.subsurface;
    let direction = if lobe < 0.5 && diffuse_pick_weight > 0.0 {
        sample_cosine_hemisphere(n, r1, r2)
    } else {
        sample_ggx_reflection(n, v, material.roughness, r1, r2)
    };

    let eval = eval_bsdf(material, n, v, direction);
    let n_dot_next = n.dot(direction).max(0.0);
    if eval.pdf < MIN_CONTINUATION_PDF || n_dot_next < SURFACE_EPSILON {
        return None;
    }

    Some(Continuation {
        direction,
        weight: eval.value * (n_dot_next / eval.pdf),
    })
}

/// Estimate the radiance arriving along `ray`.
pub fn trace_path(scene: &Scene, ray: Ray, rng: &mut HashRng) -> Color {
    let field = SceneField::new(scene);

    let mut radiance = Color::ZERO;
    let mut throughput = Color::ONE;
    let mut ray = ray;

    for _ in 0..MAX_BOUNCES {
        let Some(hit) = ray_march(&field, &ray) else {
            break;
        };

        let material = resolve_material(scene, hit.id, hit.blend);
        if material.is_emissive() {
            radiance += throughput * material.emission;
            break;
        }

        let n = hit.normal;
        let v = -ray.direction;

        radiance += throughput * direct_light(&field, &scene.light, &material, hit.position, n, v, rng);

        let lobe = rng.next_f32();
        let (r1, r2) = (rng.next_f32(), rng.next_f32());
        let Some(next) = continue_path(&material, n, v, lobe, r1, r2) else {
            break;
        };

        let Some(weight) = russian_roulette(next.weight, rng) else {
            break;
        };
        throughput *= weight;

        ray = Ray::new(hit.position + n * RAY_OFFSET, next.direction);
    }

    radiance.min(Color::splat(FIREFLY_CLAMP))
}

/// One radiance sample for pixel (x, y): jittered primary ray, optional
/// per-channel lens traces, vignette.
pub fn render_sample(
    scene: &Scene,
    camera: &LensCamera,
    x: u32,
    y: u32,
    rng: &mut HashRng,
) -> Color {
    let offset = Vec2::new(rng.next_f32() - 0.5, rng.next_f32() - 0.5);
    let uv = camera.screen_uv(x, y, offset);
    let [k_red, k_green, k_blue] = camera.channel_distortion();

    let color = if camera.has_chromatic_aberration() {
        let red = trace_path(scene, camera.get_ray(uv, k_red, rng), rng).x;
        let green = trace_path(scene, camera.get_ray(uv, k_green, rng), rng).y;
        let blue = trace_path(scene, camera.get_ray(uv, k_blue, rng), rng).z;
        Color::new(red, green, blue)
    } else {
        trace_path(scene, camera.get_ray(uv, k_green, rng), rng)
    };

    color * camera.vignette(uv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use halo_core::{AreaLight, Camera, Material, Primitive};
    use halo_math::DVec3;

    fn lit_scene() -> Scene {
        Scene::new(
            Primitive::sphere(
                Vec3::new(-1.0, 0.0, 0.0),
                0.5,
                Material::new(Vec3::new(0.9, 0.1, 0.1), 0.5),
            ),
            Primitive::sphere(
                Vec3::new(1.0, 0.0, 0.0),
                0.5,
                Material::new(Vec3::new(0.1, 0.1, 0.9), 0.5),
            ),
        )
        .with_camera(Camera::default().with_position(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO))
        .with_light(AreaLight {
            position: Vec3::new(0.0, 3.0, 2.0),
            ..Default::default()
        })
    }

    /// Trace a single path from `origin` towards `target`.
    fn trace_towards(scene: &Scene, origin: Vec3, target: Vec3, rng: &mut HashRng) -> Color {
        trace_path(scene, Ray::new(origin, (target - origin).normalize()), rng)
    }

    /// Ground lit by a small overhead light, with `blocker` as the only
    /// primitive near the light path.
    fn shadow_scene(blocker: Vec3) -> Scene {
        Scene::new(
            Primitive::sphere(blocker, 0.5, Material::default()),
            Primitive::sphere(Vec3::new(20.0, 0.0, -20.0), 0.5, Material::default()),
        )
        .with_light(AreaLight {
            position: Vec3::new(0.0, 3.0, 0.0),
            size: Vec2::new(0.5, 0.5),
            ..Default::default()
        })
    }

    fn ground_light(scene: &Scene, n: Vec3, seed: u32) -> Color {
        let mut rng = HashRng::new([seed, 1, 2, 3]);
        direct_light(
            &SceneField::new(scene),
            &scene.light,
            &scene.ground,
            Vec3::new(0.0, scene.ground_height, 0.0),
            n,
            Vec3::new(0.0, 1.0, 1.0).normalize(),
            &mut rng,
        )
    }

    #[test]
    fn test_russian_roulette_unbiased() {
        let mut rng = HashRng::new([42, 0, 0, 0]);
        let weight = Color::new(0.3, 0.6, 0.9);
        let trials = 200_000;
        let mut sum = DVec3::ZERO;
        let mut survived = 0;
        for _ in 0..trials {
            if let Some(w) = russian_roulette(weight, &mut rng) {
                sum += w.as_dvec3();
                survived += 1;
            }
        }
        let mean = (sum / trials as f64).as_vec3();
        assert!((mean - weight).abs().max_element() < 0.01, "mean {:?}", mean);

        let survival = survived as f32 / trials as f32;
        assert!((survival - RR_SURVIVAL).abs() < 0.005, "survival {}", survival);
    }

    #[test]
    fn test_miss_contributes_nothing() {
        let scene = lit_scene();
        let mut rng = HashRng::new([1, 2, 3, 4]);
        let up = trace_path(&scene, Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::Y), &mut rng);
        assert_eq!(up, Color::ZERO);
    }

    #[test]
    fn test_emissive_hit_returns_emission() {
        let mut scene = lit_scene();
        scene.primitive_a.material.emission = Vec3::new(2.0, 1.0, 0.5);
        scene.primitive_b.material.emission = Vec3::new(2.0, 1.0, 0.5);

        let mut rng = HashRng::new([5, 5, 5, 5]);
        let radiance = trace_towards(
            &scene,
            Vec3::new(-1.0, 0.0, 3.0),
            Vec3::new(-1.0, 0.0, 0.0),
            &mut rng,
        );
        assert!((radiance - Vec3::new(2.0, 1.0, 0.5)).length() < 1e-5);
    }

    #[test]
    fn test_firefly_clamp() {
        let mut scene = lit_scene();
        scene.primitive_a.material.emission = Vec3::new(100.0, 3.0, 50.0);
        scene.primitive_b.material.emission = Vec3::new(100.0, 3.0, 50.0);

        let mut rng = HashRng::new([5, 5, 5, 5]);
        let radiance = trace_towards(
            &scene,
            Vec3::new(-1.0, 0.0, 3.0),
            Vec3::new(-1.0, 0.0, 0.0),
            &mut rng,
        );
        assert_eq!(radiance, Vec3::new(FIREFLY_CLAMP, 3.0, FIREFLY_CLAMP));
    }

    #[test]
    fn test_lit_sphere_takes_its_color() {
        let scene = lit_scene();
        let mut rng = HashRng::new([11, 22, 33, 44]);
        let mut red = Color::ZERO;
        let mut blue = Color::ZERO;
        for _ in 0..512 {
            red += trace_towards(&scene, Vec3::new(-1.0, 0.0, 3.0), Vec3::new(-1.0, 0.0, 0.0), &mut rng);
            blue += trace_towards(&scene, Vec3::new(1.0, 0.0, 3.0), Vec3::new(1.0, 0.0, 0.0), &mut rng);
        }
        assert!(red.x > red.z, "red sphere {:?}", red);
        assert!(blue.z > blue.x, "blue sphere {:?}", blue);
        assert!(red.max_element() <= FIREFLY_CLAMP * 512.0);
    }

    #[test]
    fn test_direct_light_unblocked() {
        let scene = shadow_scene(Vec3::new(-20.0, 0.0, -20.0));
        for seed in 0..16 {
            let c = ground_light(&scene, Vec3::Y, seed);
            assert!(c.min_element() > 0.0, "seed {}: {:?}", seed, c);
        }
    }

    #[test]
    fn test_direct_light_blocked() {
        let scene = shadow_scene(Vec3::new(0.0, 1.0, 0.0));
        for seed in 0..16 {
            assert_eq!(ground_light(&scene, Vec3::Y, seed), Color::ZERO);
        }
    }

    #[test]
    fn test_direct_light_ignores_hits_beyond_light() {
        let open = shadow_scene(Vec3::new(-20.0, 0.0, -20.0));
        let behind = shadow_scene(Vec3::new(0.0, 5.0, 0.0));
        for seed in 0..16 {
            assert_eq!(ground_light(&behind, Vec3::Y, seed), ground_light(&open, Vec3::Y, seed));
        }
    }

    #[test]
    fn test_direct_light_facing_away() {
        let scene = shadow_scene(Vec3::new(-20.0, 0.0, -20.0));
        assert_eq!(ground_light(&scene, -Vec3::Y, 0), Color::ZERO);
    }

    #[test]
    fn test_continuation_below_surface_ends_path() {
        // Grazing view on a rough metal: the reflected direction ends up
        // under the horizon.
        let metal = Material::new(Vec3::ONE, 1.0).with_metalness(1.0);
        let v = Vec3::new(1.0, 0.05, 0.0).normalize();
        assert_eq!(continue_path(&metal, Vec3::Y, v, 0.1, 0.0, 0.99), None);
    }

    #[test]
    fn test_continuation_diffuse_lobe() {
        let material = Material::new(Vec3::splat(0.5), 0.5);
        let next = continue_path(&material, Vec3::Y, Vec3::Y, 0.1, 0.3, 0.4)
            .expect("diffuse sample above the surface");
        assert!(next.direction.dot(Vec3::Y) >= SURFACE_EPSILON);
        assert!((next.direction.length() - 1.0).abs() < 1e-5);
        assert!(next.weight.is_finite() && next.weight.min_element() > 0.0);
    }

    #[test]
    fn test_chromatic_aberration_channel_per_trace() {
        let mut scene = lit_scene();
        scene.camera.chromatic_aberration = 0.2;
        scene.camera.vignette = 0.3;
        let camera = LensCamera::new(&scene.camera, 16, 8);
        assert!(camera.has_chromatic_aberration());

        let start = HashRng::new([3, 1, 4, 1]);
        let mut rng = start;
        let sample = render_sample(&scene, &camera, 4, 4, &mut rng);

        // Replay: red from the first trace, green from the second, blue from
        // the third.
        let mut rng = start;
        let offset = Vec2::new(rng.next_f32() - 0.5, rng.next_f32() - 0.5);
        let uv = camera.screen_uv(4, 4, offset);
        let [k_red, k_green, k_blue] = camera.channel_distortion();
        let red = trace_path(&scene, camera.get_ray(uv, k_red, &mut rng), &mut rng);
        let green = trace_path(&scene, camera.get_ray(uv, k_green, &mut rng), &mut rng);
        let blue = trace_path(&scene, camera.get_ray(uv, k_blue, &mut rng), &mut rng);

        assert_ne!(red, blue);
        assert_eq!(sample, Color::new(red.x, green.y, blue.z) * camera.vignette(uv));
    }

    #[test]
    fn test_single_trace_without_chromatic_aberration() {
        let scene = lit_scene();
        let camera = LensCamera::new(&scene.camera, 16, 8);
        assert!(!camera.has_chromatic_aberration());

        let start = HashRng::new([2, 7, 1, 8]);
        let mut rng = start;
        let sample = render_sample(&scene, &camera, 4, 4, &mut rng);

        let mut rng = start;
        let offset = Vec2::new(rng.next_f32() - 0.5, rng.next_f32() - 0.5);
        let uv = camera.screen_uv(4, 4, offset);
        let k_green = camera.channel_distortion()[1];
        let color = trace_path(&scene, camera.get_ray(uv, k_green, &mut rng), &mut rng);

        assert_eq!(sample, color * camera.vignette(uv));
    }

    #[test]
    fn test_render_sample_is_deterministic() {
        let scene = lit_scene();
        let camera = LensCamera::new(&scene.camera, 16, 8);
        let seed = Vec4::new(0.1, 0.2, 0.3, 0.4);

        let mut a = pixel_rng(seed, Vec2::new(0.25, 0.5), 3, 0.05);
        let mut b = pixel_rng(seed, Vec2::new(0.25, 0.5), 3, 0.05);
        assert_eq!(
            render_sample(&scene, &camera, 4, 4, &mut a),
            render_sample(&scene, &camera, 4, 4, &mut b)
        );
    }

    #[test]
    fn test_chromatic_aberration_samples_are_bounded() {
        let mut scene = lit_scene();
        scene.camera.chromatic_aberration = 0.1;
        scene.camera.vignette = 0.3;
        let camera = LensCamera::new(&scene.camera, 16, 8);

        let mut rng = HashRng::new([9, 9, 9, 9]);
        for y in 0..8 {
            for x in 0..16 {
                let c = render_sample(&scene, &camera, x, y, &mut rng);
                assert!(c.min_element() >= 0.0 && c.max_element() <= FIREFLY_CLAMP);
            }
        }
    }
}
