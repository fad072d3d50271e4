//! facet: software rasterizer viewer
//!
//! Usage:
//!   facet [--config facet.ron] [--model mesh.obj] [--parallel]
//!   facet --headless out.png [--frames N]
//!
//! Without `--headless` a window opens and the mesh can be flown around.
//! With it, the frame is rendered offscreen and written as a PNG; `--frames`
//! renders N frames on an orbiting camera and reports the average time.

mod app;
#[cfg(not(target_arch = "wasm32"))]
mod headless;

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use facet_raster::config::{load_config, AppConfig};
use tracing::info;

const DEFAULT_CONFIG: &str = "facet.ron";

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    model: Option<PathBuf>,
    headless: Option<PathBuf>,
    frames: usize,
    parallel: bool,
}

fn parse_args() -> Args {
    let mut args = Args { frames: 1, ..Default::default() };
    let argv: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--config" if i + 1 < argv.len() => {
                args.config = Some(PathBuf::from(&argv[i + 1]));
                i += 2;
            }
            "--model" if i + 1 < argv.len() => {
                args.model = Some(PathBuf::from(&argv[i + 1]));
                i += 2;
            }
            "--headless" if i + 1 < argv.len() => {
                args.headless = Some(PathBuf::from(&argv[i + 1]));
                i += 2;
            }
            "--frames" if i + 1 < argv.len() => {
                args.frames = argv[i + 1].parse().unwrap_or(1).max(1);
                i += 2;
            }
            "--parallel" => {
                args.parallel = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    args
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args();

    // An explicit --config must exist; the default path is optional
    let mut config = match &args.config {
        Some(path) => load_config(path).with_context(|| format!("load config {}", path.display()))?,
        None => AppConfig::load_or_default(DEFAULT_CONFIG).context("load default config")?,
    };
    if let Some(model) = args.model {
        config.model = Some(model);
    }
    if args.parallel {
        config.raster.parallel = true;
    }

    info!(
        version = facet_raster::VERSION,
        width = config.width,
        height = config.height,
        model = ?config.model,
        parallel = config.raster.parallel,
        "Starting"
    );

    #[cfg(not(target_arch = "wasm32"))]
    if let Some(out) = args.headless {
        return headless::run(&config, &out, args.frames);
    }

    app::run(config);
    Ok(())
}
