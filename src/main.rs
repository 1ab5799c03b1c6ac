use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use scene3d::{CommandRecorder, RenderConfig, SceneRenderer, SoftwareRasterizer};

mod demo;
mod engine;

use demo::DemoState;

/// Renders the demo scene to PNG files with the software rasterizer.
#[derive(Debug, Parser)]
#[command(name = "scene3d", about)]
struct Args {
    /// Output image. With more than one frame, the frame number is appended.
    #[arg(short, long, default_value = "scene.png")]
    output: PathBuf,

    /// TOML render configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Animation time of the first frame, in seconds
    #[arg(short, long, default_value_t = 0.0)]
    time: f32,

    #[arg(short, long, default_value_t = 1)]
    frames: u32,

    #[arg(long, default_value_t = 30.0)]
    fps: f32,

    /// Log every backend command of each frame at debug level
    #[arg(long)]
    dump_commands: bool,
}

fn frame_path(output: &Path, frame: u32, frames: u32) -> PathBuf {
    if frames <= 1 {
        return output.to_path_buf();
    }

    let stem = output
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("frame");
    let extension = output
        .extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or("png");

    output.with_file_name(format!("{}_{:04}.{}", stem, frame, extension))
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RenderConfig::default(),
    };

    if let Some(width) = args.width {
        config.viewport_width = width;
    }
    if let Some(height) = args.height {
        config.viewport_height = height;
    }
    config.validate()?;

    let mut state = DemoState::new().context("Failed to build demo scene")?;
    let mut rasterizer = SoftwareRasterizer::new(config.viewport_width, config.viewport_height)
        .with_polygon_offset(config.polygon_offset);
    let renderer = SceneRenderer::new(config);

    log::info!(
        "Rendering {} frame(s) of {} nodes",
        args.frames,
        state.scene.len()
    );

    for frame in 0..args.frames {
        let time = args.time + frame as f32 / args.fps;
        engine::update(&mut state, time)?;

        let stats = renderer.render(&state.scene, state.root, &mut rasterizer)?;

        if args.dump_commands {
            let mut recorder = CommandRecorder::new();
            renderer.render(&state.scene, state.root, &mut recorder)?;
            recorder.log_commands();
        }

        let path = frame_path(&args.output, frame, args.frames);
        rasterizer
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        log::info!(
            "Frame {} (t = {:.2}s): {} draw calls, {} triangles -> {}",
            frame,
            time,
            stats.draw_calls,
            stats.triangles,
            path.display()
        );
    }

    Ok(())
}
