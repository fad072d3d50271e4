//! Core types for the rasterizer: packed colors and textures

use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::LoadError;

/// RGBA color (0-255 per channel)
///
/// Packs as `(a << 24) | (b << 16) | (g << 8) | r`, the layout raw texture
/// files and the display upload both expect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };
    pub const GRAY: Color = Color { r: 128, g: 128, b: 128, a: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn to_u32(self) -> u32 {
        ((self.a as u32) << 24) | ((self.b as u32) << 16) | ((self.g as u32) << 8) | (self.r as u32)
    }

    pub const fn from_u32(packed: u32) -> Self {
        Self {
            r: (packed & 0xFF) as u8,
            g: ((packed >> 8) & 0xFF) as u8,
            b: ((packed >> 16) & 0xFF) as u8,
            a: ((packed >> 24) & 0xFF) as u8,
        }
    }

    /// Scale RGB by `factor`, saturating at 255. Alpha becomes opaque.
    pub fn multiply(self, factor: f32) -> Self {
        let f = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
        let scale = |c: u8| (c as f32 * f).round().min(255.0) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }

    /// Channel-wise sum, saturating at 255. Alpha becomes opaque.
    pub fn add(self, other: Color) -> Self {
        Self::new(
            self.r.saturating_add(other.r),
            self.g.saturating_add(other.g),
            self.b.saturating_add(other.b),
        )
    }

    /// Average of the RGB channels in `0.0..=1.0`
    pub fn luminance(self) -> f32 {
        (self.r as f32 + self.g as f32 + self.b as f32) / (3.0 * 255.0)
    }

    /// Convert to [u8; 4] for framebuffer
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Texture: a fixed grid of colors, row 0 at the top of the image
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Color>,
    pub name: String,
}

impl Texture {
    /// Uniform placeholder texture
    pub fn solid(width: usize, height: usize, color: Color) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![color; width * height],
            name: "solid".to_string(),
        }
    }

    /// Decode headerless RGB bytes (3 per pixel, row-major, top row first)
    pub fn from_raw_rgb(bytes: &[u8], width: usize, height: usize, name: &str) -> Result<Self, LoadError> {
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(3))
            .ok_or_else(|| LoadError::TextureDimensions { name: name.to_string(), width, height })?;
        if width == 0 || height == 0 || bytes.len() < expected {
            return Err(LoadError::TextureSize {
                name: name.to_string(),
                expected,
                actual: bytes.len(),
            });
        }

        let pixels = bytes[..expected]
            .chunks_exact(3)
            .map(|p| Color::new(p[0], p[1], p[2]))
            .collect();

        Ok(Self {
            width,
            height,
            pixels,
            name: name.to_string(),
        })
    }

    /// Load a raw RGB file of known dimensions
    pub fn from_raw_file<P: AsRef<Path>>(path: P, width: usize, height: usize) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| LoadError::io(path, e))?;
        Self::from_raw_rgb(&bytes, width, height, &file_stem(path))
    }

    /// Load texture from an image file (PNG, JPEG, BMP)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        use image::GenericImageView;

        let path = path.as_ref();
        let img = image::open(path)?;

        let (width, height) = img.dimensions();
        let rgba = img.to_rgba8();

        let pixels: Vec<Color> = rgba
            .pixels()
            .map(|p| Color::with_alpha(p[0], p[1], p[2], p[3]))
            .collect();

        Ok(Self {
            width: width as usize,
            height: height as usize,
            pixels,
            name: file_stem(path),
        })
    }

    /// Load by extension: `.raw` uses `raw_size`, anything else goes through `image`
    pub fn load<P: AsRef<Path>>(path: P, raw_size: (usize, usize)) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let is_raw = path
            .extension()
            .map(|ext| ext.to_ascii_lowercase() == "raw")
            .unwrap_or(false);

        if is_raw {
            Self::from_raw_file(path, raw_size.0, raw_size.1)
        } else {
            Self::from_file(path)
        }
    }

    /// Create a checkerboard test texture
    pub fn checkerboard(width: usize, height: usize, color1: Color, color2: Color) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / 4) + (y / 4)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 });
            }
        }
        Self { width, height, pixels, name: "checkerboard".to_string() }
    }

    /// Point-sample at UV. UV is clamped to [0, 1] (no tiling) and V is
    /// flipped (`v' = 1 - v`): UV space grows upward, rows grow downward.
    pub fn sample(&self, u: f32, v: f32) -> Color {
        if self.pixels.is_empty() {
            return Color::BLACK;
        }
        let u = if u.is_nan() { 0.0 } else { u.clamp(0.0, 1.0) };
        let v = 1.0 - if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };

        let tx = ((u * self.width as f32) as usize).min(self.width - 1);
        let ty = ((v * self.height as f32) as usize).min(self.height - 1);
        self.get_pixel(tx, ty)
    }

    /// Pixel at x,y; black outside the image
    pub fn get_pixel(&self, x: usize, y: usize) -> Color {
        if x < self.width && y < self.height {
            self.pixels.get(y * self.width + x).copied().unwrap_or(Color::BLACK)
        } else {
            Color::BLACK
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
