//! Software rasterizer
//!
//! Features:
//! - Perspective-correct texture, normal and position interpolation
//! - Z-buffered scanline triangle fill
//! - Ambient + diffuse + specular shading with optional normal/specular maps
//! - Optional row-band parallelism on the rayon pool

mod math;
mod types;
mod camera;
mod shading;
mod render;

pub use math::*;
pub use types::*;
pub use camera::*;
pub use shading::*;
pub use render::*;

/// Default window / framebuffer dimensions
pub const WIDTH: usize = 1600;
pub const HEIGHT: usize = 900;
