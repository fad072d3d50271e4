//! Offscreen rendering: PNG output and a frame-time benchmark

use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context};
use facet_raster::config::AppConfig;
use facet_raster::rasterizer::{Camera, Vec3};
use facet_raster::viewer::Viewer;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Render `frames` frames (orbiting the camera when more than one) and save
/// the last one to `out`
pub fn run(config: &AppConfig, out: &Path, frames: usize) -> anyhow::Result<()> {
    let mut viewer = Viewer::from_config(config);
    if config.model.is_some() && viewer.scene.mesh().is_empty() {
        bail!("mesh is empty, nothing to render");
    }

    // Orbit around the mesh center; the camera's own target is only one unit ahead
    let target = viewer
        .scene
        .mesh()
        .bounds()
        .map(|(lo, hi)| (lo + hi) * 0.5)
        .unwrap_or(Vec3::ZERO);
    let start_eye = viewer.camera.eye();
    let offset = start_eye - target;
    let radius = (offset.x * offset.x + offset.z * offset.z).sqrt();
    let start_angle = offset.x.atan2(offset.z);

    let pb = ProgressBar::new(frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({per_sec})")
            .context("progress template")?,
    );

    let started = Instant::now();
    for frame in 0..frames {
        if frames > 1 {
            let angle = start_angle + std::f32::consts::TAU * frame as f32 / frames as f32;
            let eye = Vec3::new(target.x + radius * angle.sin(), start_eye.y, target.z + radius * angle.cos());
            viewer.camera = Camera::looking_at(eye, target, viewer.camera.settings.clone());
        }
        viewer.render_frame();
        pb.inc(1);
    }
    pb.finish_and_clear();

    let elapsed = started.elapsed();
    let stats = viewer.stats();
    info!(
        frames,
        total_ms = elapsed.as_secs_f64() * 1000.0,
        avg_ms = elapsed.as_secs_f64() * 1000.0 / frames as f64,
        triangles = stats.faces,
        rasterized = stats.rasterized,
        clipped = stats.clipped,
        "Render finished"
    );

    let fb = viewer.framebuffer();
    let image = image::RgbaImage::from_raw(fb.width as u32, fb.height as u32, fb.to_rgba8())
        .context("framebuffer size does not match its pixel data")?;
    image.save(out).with_context(|| format!("write {}", out.display()))?;
    info!(path = %out.display(), covered = fb.covered_pixels(), "Saved frame");

    Ok(())
}
