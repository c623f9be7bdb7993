//! Halo Core - scene model, settings and configuration.
//!
//! This crate provides:
//!
//! - **Scene types**: `Scene`, `Camera`, `AreaLight`, `Primitive`, `Material`
//! - **Parameter interface**: named, arity-checked edits between frames
//! - **Configuration**: JSON session files with defaults for every field
//!
//! # Example
//!
//! ```ignore
//! use halo_core::{load_session, ParamValue};
//!
//! let mut session = load_session("session.json")?;
//! session.scene.set_parameter("a_roughness", ParamValue::Float(0.3))?;
//! ```

pub mod config;
pub mod material;
pub mod params;
pub mod scene;
pub mod settings;

// Re-export commonly used types
pub use config::{load_session, ConfigError, ConfigResult, SessionConfig};
pub use material::{Material, SubsurfaceFalloff};
pub use params::{ParamError, ParamValue, PassName};
pub use scene::{AmbientLight, AreaLight, Camera, Primitive, Scene, SceneError, Shape, Volume};
pub use settings::{DenoiseSettings, RenderSettings};
