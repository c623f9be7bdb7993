//! JSON session loading.
//!
//! A session file holds the scene and the render settings. Every field is
//! optional; anything missing takes its default.
//!
//! ```json
//! {
//!   "scene": { "camera": { "position": [0, 0, 3] }, "blend_smoothness": 0.3 },
//!   "settings": { "width": 320, "height": 180, "seed": 1 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::params::ParamError;
use crate::scene::{Scene, SceneError};
use crate::settings::RenderSettings;

/// Errors that can occur while loading a session.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid scene: {0}")]
    Invalid(#[from] SceneError),

    #[error("Invalid settings: {0}")]
    Settings(#[from] ParamError),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Scene plus render settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub scene: Scene,
    pub settings: RenderSettings,
}

impl SessionConfig {
    /// Parse and validate a session from a JSON string.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let session: SessionConfig = serde_json::from_str(json)?;
        session.scene.validate()?;
        session.settings.denoise.validate()?;
        Ok(session)
    }
}

/// Load a session file from disk.
pub fn load_session<P: AsRef<Path>>(path: P) -> ConfigResult<SessionConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let session = SessionConfig::from_json_str(&text)?;
    log::info!(
        "Loaded session {} ({}x{})",
        path.display(),
        session.settings.width,
        session.settings.height
    );
    Ok(session)
}
