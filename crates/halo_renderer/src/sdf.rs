//! Signed distance field geometry and sphere tracing.
//!
//! The scene is a smooth union of two primitives plus a ground plane. Every
//! field sample carries the id of the closest surface and the smooth-min
//! blend factor so the shader can interpolate the two primitive materials.

use halo_core::{Primitive, Scene, Shape};
use halo_math::{Ray, Vec3};

/// Hit threshold and self-intersection offset.
pub const SURFACE_EPSILON: f32 = 1e-4;

/// Rays that travel further than this are misses.
pub const MAX_DISTANCE: f32 = 50.0;

/// Iteration bound for sphere tracing.
pub const MAX_MARCH_STEPS: u32 = 256;

/// Central-difference step for normals.
pub const NORMAL_STEP: f32 = 0.005;

/// Which surface a field sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveId {
    /// The smooth union of the two blended primitives
    Blob = 1,
    /// The ground plane
    Ground = 2,
}

/// Result of evaluating the field at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    pub distance: f32,
    pub id: PrimitiveId,
    /// Material interpolation factor, 0 = primitive A, 1 = primitive B
    pub blend: f32,
}

/// Trait for anything that can be sphere traced.
pub trait DistanceField: Send + Sync {
    /// Signed distance (and surface identity) at `p`.
    fn sample(&self, p: Vec3) -> FieldSample;

    /// Signed distance only.
    fn distance(&self, p: Vec3) -> f32 {
        self.sample(p).distance
    }
}

/// A ray-march hit. Lives for one ray evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHit {
    /// Surface position
    pub position: Vec3,
    /// Unit normal from the field gradient
    pub normal: Vec3,
    /// Distance travelled along the ray
    pub t: f32,
    pub id: PrimitiveId,
    pub blend: f32,
}

/// Polynomial smooth minimum. Returns `(distance, h)` where `h` is 1 when
/// `d1` dominates and 0 when `d2` dominates.
#[inline]
pub fn smooth_min(d1: f32, d2: f32, k: f32) -> (f32, f32) {
    let h = (0.5 + 0.5 * (d2 - d1) / k).clamp(0.0, 1.0);
    let d = d2 + (d1 - d2) * h - k * h * (1.0 - h);
    (d, h)
}

#[inline]
fn sphere_distance(p: Vec3, radius: f32) -> f32 {
    p.length() - radius
}

#[inline]
fn round_box_distance(p: Vec3, half_extent: Vec3, rounding: f32) -> f32 {
    let q = p.abs() - half_extent;
    q.max(Vec3::ZERO).length() + q.max_element().min(0.0) - rounding
}

/// Distance from `p` to a primitive.
pub fn primitive_distance(primitive: &Primitive, p: Vec3) -> f32 {
    let local = p - primitive.position;
    match primitive.shape {
        Shape::Sphere { radius } => sphere_distance(local, radius),
        Shape::RoundBox {
            half_extent,
            rounding,
        } => round_box_distance(local, half_extent, rounding),
    }
}

/// The distance field of a [`Scene`].
#[derive(Clone, Copy)]
pub struct SceneField<'a> {
    scene: &'a Scene,
}

impl<'a> SceneField<'a> {
    pub fn new(scene: &'a Scene) -> Self {
        Self { scene }
    }
}

impl DistanceField for SceneField<'_> {
    fn sample(&self, p: Vec3) -> FieldSample {
        let scene = self.scene;
        let d_a = primitive_distance(&scene.primitive_a, p);
        let d_b = primitive_distance(&scene.primitive_b, p);
        let (distance, blend) = smooth_min(d_b, d_a, scene.blend_smoothness);

        let ground = p.y - scene.ground_height;
        if ground < distance {
            FieldSample {
                distance: ground,
                id: PrimitiveId::Ground,
                blend: 0.0,
            }
        } else {
            FieldSample {
                distance,
                id: PrimitiveId::Blob,
                blend,
            }
        }
    }
}

/// Normalized central-difference gradient of the field.
pub fn calc_normal<F: DistanceField + ?Sized>(field: &F, p: Vec3) -> Vec3 {
    let h = NORMAL_STEP;
    let dx = Vec3::new(h, 0.0, 0.0);
    let dy = Vec3::new(0.0, h, 0.0);
    let dz = Vec3::new(0.0, 0.0, h);
    Vec3::new(
        field.distance(p + dx) - field.distance(p - dx),
        field.distance(p + dy) - field.distance(p - dy),
        field.distance(p + dz) - field.distance(p - dz),
    )
    .normalize_or_zero()
}

/// Sphere trace `ray` through `field`.
///
/// Returns `None` when the ray leaves [`MAX_DISTANCE`] or the step budget runs
/// out before reaching the surface.
pub fn ray_march<F: DistanceField + ?Sized>(field: &F, ray: &Ray) -> Option<SceneHit> {
    let mut t = 0.0;
    for _ in 0..MAX_MARCH_STEPS {
        let p = ray.at(t);
        let sample = field.sample(p);
        if sample.distance < SURFACE_EPSILON {
            return Some(SceneHit {
                position: p,
                normal: calc_normal(field, p),
                t,
                id: sample.id,
                blend: sample.blend,
            });
        }
        if t > MAX_DISTANCE {
            break;
        }
        t += sample.distance;
    }
    None
}
