//! facet: a software 3D rasterizer
//!
//! Meshes go through model, view, projection and viewport transforms, are
//! scan-converted with perspective-correct attributes against a z-buffer,
//! and shaded per pixel from sampled textures with a single-sun Phong model.
//! The window shell lives in the `facet` binary; everything here is
//! headless.

pub mod config;
pub mod error;
pub mod parser;
pub mod rasterizer;
pub mod scene;
pub mod viewer;

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
