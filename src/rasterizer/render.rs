//! Core rendering: projection, triangle setup, scanline rasterization
//!
//! Triangles are filled with the sloped-edge ("Bresenham triangle") scan:
//! vertices sorted by screen Y, each row split at the middle vertex, edge
//! endpoints interpolated, then a horizontal span with a z-test per pixel.
//! UV, normal and world position are interpolated perspective-correct:
//! `attr / w` is interpolated linearly in screen space and divided by the
//! interpolated `1 / w` at each pixel.
//!
//! Known limitation: a triangle with any vertex outside the depth range is
//! dropped whole (no near-plane subdivision), so geometry crossing the near
//! plane pops in and out.

use std::cmp::Ordering;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::camera::Camera;
use super::math::{lerp, Mat4, Vec2, Vec3, Vec4, EPSILON};
use super::shading::Shader;
use super::types::Color;
use crate::scene::Scene;

/// Color + depth buffers, row-major, row 0 at the top
pub struct Framebuffer {
    /// Packed colors (see `Color::to_u32`)
    pub color: Vec<u32>,
    /// Depth in `[0, 1]`, lower is nearer
    pub depth: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub const CLEAR_DEPTH: f32 = 1.0;

    pub fn new(width: usize, height: usize) -> Self {
        Self {
            color: vec![0; width * height],
            depth: vec![Self::CLEAR_DEPTH; width * height],
            width,
            height,
        }
    }

    /// Color 0, depth 1.0
    pub fn clear(&mut self) {
        self.clear_color(Color::TRANSPARENT);
    }

    pub fn clear_color(&mut self, color: Color) {
        self.color.fill(color.to_u32());
        self.depth.fill(Self::CLEAR_DEPTH);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        (x < self.width && y < self.height).then(|| Color::from_u32(self.color[y * self.width + x]))
    }

    pub fn depth_at(&self, x: usize, y: usize) -> Option<f32> {
        (x < self.width && y < self.height).then(|| self.depth[y * self.width + x])
    }

    /// Number of pixels written since the last clear
    pub fn covered_pixels(&self) -> usize {
        self.depth.iter().filter(|&&z| z < Self::CLEAR_DEPTH).count()
    }

    /// Inclusive pixel bounds `(min_x, min_y, max_x, max_y)` of everything drawn
    pub fn coverage_bounds(&self) -> Option<(usize, usize, usize, usize)> {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for (i, &z) in self.depth.iter().enumerate() {
            if z < Self::CLEAR_DEPTH {
                let (x, y) = (i % self.width, i / self.width);
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bounds
    }

    /// RGBA8 bytes, ready for display upload or PNG encoding
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.color.len() * 4);
        self.write_rgba8(&mut out);
        out
    }

    pub fn write_rgba8(&self, out: &mut Vec<u8>) {
        out.clear();
        out.extend(self.color.iter().flat_map(|&c| Color::from_u32(c).to_bytes()));
    }
}

/// Rasterizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterSettings {
    /// Rasterize horizontal bands on the rayon pool
    pub parallel: bool,
    /// Rows per band in parallel mode
    pub band_height: usize,
    /// Skip triangles wound clockwise on screen
    pub backface_cull: bool,
    pub clear_color: Color,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            parallel: false,
            band_height: 32,
            backface_cull: false,
            clear_color: Color::TRANSPARENT,
        }
    }
}

/// Pipeline vertex. `screen` holds pixel x/y and depth after the divide,
/// and the pre-divide clip w.
#[derive(Debug, Clone, Copy, Default)]
pub struct Point {
    pub world: Vec3,
    pub screen: Vec4,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Point {
    pub fn is_clipped(&self) -> bool {
        is_clipped(self.screen)
    }
}

/// A triangle ready for scan conversion
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub points: [Point; 3],
    pub material: usize,
}

/// Apply the screen matrix and the perspective divide. x, y, z are divided
/// by w when it is nonzero; w keeps its pre-divide value.
pub fn project(matrix: &Mat4, world: Vec3) -> Vec4 {
    let mut s = matrix.transform(Vec4::point(world));
    if s.w != 0.0 {
        s.x /= s.w;
        s.y /= s.w;
        s.z /= s.w;
    }
    s
}

/// Behind the eye, outside `[0, 1]` depth, or non-finite
pub fn is_clipped(screen: Vec4) -> bool {
    !(screen.w > EPSILON)
        || !(0.0..=1.0).contains(&screen.z)
        || !screen.x.is_finite()
        || !screen.y.is_finite()
}

/// Per-frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub faces: usize,
    pub clipped: usize,
    pub culled: usize,
    pub rasterized: usize,
}

/// Owns the framebuffer and per-frame scratch arrays
pub struct Renderer {
    framebuffer: Framebuffer,
    pub settings: RasterSettings,
    points: Vec<Vec4>,
    triangles: Vec<Triangle>,
    stats: RenderStats,
}

impl Renderer {
    pub fn new(width: usize, height: usize, settings: RasterSettings) -> Self {
        Self {
            framebuffer: Framebuffer::new(width, height),
            settings,
            points: Vec::new(),
            triangles: Vec::new(),
            stats: RenderStats::default(),
        }
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Render one complete frame. Blocks until every pixel is final.
    pub fn render(&mut self, scene: &mut Scene, camera: &Camera, shader: &mut Shader) -> &Framebuffer {
        scene.update();
        shader.begin_frame(camera.eye());
        self.framebuffer.clear_color(self.settings.clear_color);

        let matrix = camera.screen_matrix(self.framebuffer.width, self.framebuffer.height);
        self.project_points(scene.world_vertices(), &matrix);
        self.setup_triangles(scene);

        rasterize(&mut self.framebuffer, &self.triangles, shader, &self.settings);

        debug!(
            faces = self.stats.faces,
            clipped = self.stats.clipped,
            culled = self.stats.culled,
            rasterized = self.stats.rasterized,
            "Frame rendered"
        );
        &self.framebuffer
    }

    /// World vertices -> screen space (post-divide x/y/z, pre-divide w)
    fn project_points(&mut self, world: &[Vec3], matrix: &Mat4) {
        self.points.clear();
        self.points.extend(world.iter().map(|&v| project(matrix, v)));
    }

    /// Assemble per-corner attributes, dropping triangles with a clipped vertex
    fn setup_triangles(&mut self, scene: &Scene) {
        let mesh = scene.mesh();
        let world = scene.world_vertices();
        let normals = scene.world_normals();
        let uvs = mesh.uvs();

        self.triangles.clear();
        let mut stats = RenderStats { faces: mesh.faces().len(), ..Default::default() };

        for face in mesh.faces() {
            let [c1, c2, c3] = face.corners;
            let screens = [self.points[c1.vertex], self.points[c2.vertex], self.points[c3.vertex]];
            if screens.iter().any(|&s| is_clipped(s)) {
                stats.clipped += 1;
                continue;
            }

            if self.settings.backface_cull && signed_area(&screens) > 0.0 {
                stats.culled += 1;
                continue;
            }

            let positions = [world[c1.vertex], world[c2.vertex], world[c3.vertex]];
            let geometric = (positions[1] - positions[0]).cross(positions[2] - positions[0]).normalize();

            let mut points = [Point::default(); 3];
            for (k, corner) in face.corners.iter().enumerate() {
                points[k] = Point {
                    world: positions[k],
                    screen: screens[k],
                    normal: corner.normal.map(|n| normals[n]).unwrap_or(geometric),
                    uv: corner.uv.map(|t| uvs[t]).unwrap_or(Vec2::ZERO),
                };
            }

            self.triangles.push(Triangle { points, material: face.material });
        }

        stats.rasterized = self.triangles.len();
        self.stats = stats;
    }
}

/// Twice the signed screen-space area. Negative for triangles that are
/// counter-clockwise in world space (the viewport flips Y).
fn signed_area(s: &[Vec4; 3]) -> f32 {
    (s[1].x - s[0].x) * (s[2].y - s[0].y) - (s[2].x - s[0].x) * (s[1].y - s[0].y)
}

/// Rasterize `triangles` into `fb`, sequentially or in parallel row bands.
/// Both paths produce identical output: each band owns its rows exclusively
/// and sees the triangles in the same order.
pub fn rasterize(fb: &mut Framebuffer, triangles: &[Triangle], shader: &Shader, settings: &RasterSettings) {
    let width = fb.width;
    let height = fb.height;
    if width == 0 || height == 0 {
        return;
    }

    let band_rows = settings.band_height.max(1);
    if settings.parallel && height > band_rows {
        let chunk = band_rows * width;
        fb.color
            .par_chunks_mut(chunk)
            .zip(fb.depth.par_chunks_mut(chunk))
            .enumerate()
            .for_each(|(i, (color, depth))| {
                let y_start = i * band_rows;
                let mut band = Band {
                    y_start: y_start as i32,
                    y_end: (y_start + color.len() / width) as i32,
                    color,
                    depth,
                    width,
                };
                for tri in triangles {
                    draw_triangle(&mut band, tri, shader);
                }
            });
    } else {
        let mut band = Band {
            color: &mut fb.color,
            depth: &mut fb.depth,
            width,
            y_start: 0,
            y_end: height as i32,
        };
        for tri in triangles {
            draw_triangle(&mut band, tri, shader);
        }
    }
}

/// A horizontal slice of the framebuffer, rows `y_start..y_end`
struct Band<'a> {
    color: &'a mut [u32],
    depth: &'a mut [f32],
    width: usize,
    y_start: i32,
    y_end: i32,
}

/// Attributes carried along edges and spans, pre-divided by w
#[derive(Clone, Copy)]
struct Varying {
    inv_w: f32,
    z: f32,
    world: Vec3,
    normal: Vec3,
    uv: Vec2,
}

impl Varying {
    fn from_point(p: &Point) -> Self {
        let inv_w = 1.0 / p.screen.w;
        Self {
            inv_w,
            z: p.screen.z,
            world: p.world * inv_w,
            normal: p.normal * inv_w,
            uv: p.uv * inv_w,
        }
    }

    fn lerp(&self, other: &Varying, t: f32) -> Varying {
        Varying {
            inv_w: lerp(self.inv_w, other.inv_w, t),
            z: lerp(self.z, other.z, t),
            world: self.world.lerp(other.world, t),
            normal: self.normal.lerp(other.normal, t),
            uv: self.uv.lerp(other.uv, t),
        }
    }
}

/// Scan-convert one triangle into the band.
///
/// Edge and span arithmetic stays in f32 on whole-pixel values: unclipped
/// vertices can sit far outside the screen, past the range of `i32`. Only
/// rows and columns already clamped to the band are converted to integers.
fn draw_triangle(band: &mut Band, tri: &Triangle, shader: &Shader) {
    let mut pts = [&tri.points[0], &tri.points[1], &tri.points[2]];
    pts.sort_by(|a, b| a.screen.y.partial_cmp(&b.screen.y).unwrap_or(Ordering::Equal));

    let (x1, y1) = (pts[0].screen.x.round(), pts[0].screen.y.round());
    let (x2, y2) = (pts[1].screen.x.round(), pts[1].screen.y.round());
    let (x3, y3) = (pts[2].screen.x.round(), pts[2].screen.y.round());

    let total_height = y3 - y1;
    if !(total_height > 0.0) || !total_height.is_finite() {
        return;
    }

    let row_start = y1.max(band.y_start as f32);
    let row_end = y3.min(band.y_end as f32);
    if !(row_start < row_end) {
        return;
    }

    let v1 = Varying::from_point(pts[0]);
    let v2 = Varying::from_point(pts[1]);
    let v3 = Varying::from_point(pts[2]);
    let upper_height = y2 - y1;
    let width = band.width as f32;

    for y in row_start as i32..row_end as i32 {
        let i = y as f32 - y1;
        let second_half = i > upper_height || y2 == y1;
        let segment_height = if second_half { y3 - y2 } else { upper_height };
        if segment_height == 0.0 {
            continue;
        }

        let alpha = i / total_height;
        let beta = (if second_half { i - upper_height } else { i }) / segment_height;

        let mut ax = lerp(x1, x3, alpha).trunc();
        let mut a = v1.lerp(&v3, alpha);
        let (mut bx, mut b) = if second_half {
            (lerp(x2, x3, beta).trunc(), v2.lerp(&v3, beta))
        } else {
            (lerp(x1, x2, beta).trunc(), v1.lerp(&v2, beta))
        };

        if ax > bx {
            std::mem::swap(&mut ax, &mut bx);
            std::mem::swap(&mut a, &mut b);
        }

        let span = bx - ax;
        let min_x = ax.max(0.0).min(width) as usize;
        let max_x = bx.min(width).max(0.0) as usize;
        let row = (y - band.y_start) as usize * band.width;

        for x in min_x..max_x {
            let t = if span == 0.0 { 0.0 } else { (x as f32 - ax) / span };
            let z = lerp(a.z, b.z, t);
            let idx = row + x;

            if z < band.depth[idx] {
                let inv_w = lerp(a.inv_w, b.inv_w, t);
                if !(inv_w.abs() > EPSILON) {
                    continue;
                }
                let w = 1.0 / inv_w;

                let uv = a.uv.lerp(b.uv, t) * w;
                let normal = (a.normal.lerp(b.normal, t) * w).normalize();
                let world = a.world.lerp(b.world, t) * w;

                let color = shader.shade(tri.material, world, normal, (uv.x, uv.y));
                band.color[idx] = color.to_u32();
                band.depth[idx] = z;
            }
        }
    }
}
