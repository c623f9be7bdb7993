//! Halo Renderer - progressive SDF path tracing on the CPU.
//!
//! A Monte Carlo path tracer over a signed distance field scene, run as a
//! per-frame pipeline of full-image passes:
//! path tracing, temporal accumulation, edge-aware denoise and display.
//!
//! Every pass is a data-parallel map over image rows (rayon); per-pixel
//! randomness comes from a counter-based hash so frames are reproducible.

mod accumulate;
mod camera;
mod denoise;
mod display;
mod image;
mod integrator;
mod pipeline;
mod sampling;
mod sdf;
mod shading;

pub use accumulate::{running_mean, PingPong};
pub use camera::{distort_uv, LensCamera};
pub use denoise::{denoise_into, denoise_pixel, DENOISE_RADIUS};
pub use display::{display_into, gamma_encode, GAMMA};
pub use image::{Color, ImageBuffer};
pub use integrator::{
    continue_path, direct_light, pixel_rng, render_sample, russian_roulette, trace_path,
    Continuation, FIREFLY_CLAMP, MAX_BOUNCES, RR_SURVIVAL,
};
pub use pipeline::{FrameStage, FrameUniforms, Pipeline, PipelineError, PipelineResult};
pub use sampling::{
    area_light_pdf, reflect, sample_area_light, sample_cosine_hemisphere, sample_ggx_half_vector,
    sample_ggx_reflection, sample_unit_disk,
};
pub use sdf::{
    calc_normal, primitive_distance, ray_march, smooth_min, DistanceField, FieldSample,
    PrimitiveId, SceneField, SceneHit, MAX_DISTANCE, MAX_MARCH_STEPS, NORMAL_STEP,
    SURFACE_EPSILON,
};
pub use shading::{
    eval_bsdf, eval_subsurface, ggx_distribution, resolve_material, smith_visibility, BsdfEval,
};

/// Re-export common math types from halo_math
pub use halo_math::{HashRng, Ray, Vec2, Vec3, Vec4};
