//! Headless front end for the progressive renderer.
//!
//! Usage: `halo_viewer [session.json] [frames] [output.png]`
//!
//! Loads a session (scene + render settings), runs the frame pipeline the
//! requested number of times and writes the displayed image as PNG.

use anyhow::{anyhow, Context, Result};
use halo_core::{load_session, SessionConfig};
use halo_renderer::Pipeline;
use std::path::PathBuf;
use std::time::Instant;

const DEFAULT_FRAMES: u32 = 64;
const DEFAULT_OUTPUT: &str = "halo.png";

/// Command line arguments, all positional and optional
struct Args {
    session: Option<PathBuf>,
    frames: u32,
    output: PathBuf,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = std::env::args().skip(1);

        // "-" skips the session file and renders the default scene
        let session = args
            .next()
            .filter(|s| s != "-")
            .map(PathBuf::from);
        let frames = match args.next() {
            Some(s) => s
                .parse()
                .with_context(|| format!("Invalid frame count: {}", s))?,
            None => DEFAULT_FRAMES,
        };
        let output = args
            .next()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

        Ok(Self {
            session,
            frames,
            output,
        })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting Halo");

    let args = Args::parse()?;

    let config = match &args.session {
        Some(path) => load_session(path)
            .with_context(|| format!("Failed to load session {}", path.display()))?,
        None => {
            log::info!("No session given, using the default scene");
            SessionConfig::default()
        }
    };

    let mut pipeline =
        Pipeline::new(config.scene, config.settings).context("Failed to create pipeline")?;
    let (width, height) = pipeline.resolution();
    log::info!("Rendering {}x{} for {} frames", width, height, args.frames);

    let start = Instant::now();
    let report_every = (args.frames / 10).max(1);
    for _ in 0..args.frames {
        pipeline.render_frame();
        let frame = pipeline.frame_count();
        if frame % report_every == 0 {
            log::info!("Frame {}/{} ({:.2?})", frame, args.frames, start.elapsed());
        }
    }
    log::info!("Rendered {} frames in {:.2?}", pipeline.frame_count(), start.elapsed());

    let rgba = pipeline.display().to_rgba8();
    let image = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| anyhow!("Display buffer does not match {}x{}", width, height))?;
    image
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    log::info!("Saved to {}", args.output.display());
    Ok(())
}
