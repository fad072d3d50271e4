//! Viewer core: owns camera, scene, shader and renderer, and turns one
//! frame of input deltas into one rendered framebuffer. Knows nothing
//! about windows or input devices.

use std::path::Path;
use tracing::{info, warn};

use crate::config::{AppConfig, ControlSettings};
use crate::error::LoadError;
use crate::parser;
use crate::rasterizer::{Camera, Color, Framebuffer, Material, RenderStats, Renderer, Shader, Texture, Vec3};
use crate::scene::{Mesh, Scene};

/// Control deltas gathered over one frame
#[derive(Debug, Clone, Copy, Default)]
pub struct InputFrame {
    /// Camera pan: x = left, y = forward, z = world up. Unit rates.
    pub camera_move: Vec3,
    /// Look deltas in pixels: +x turns left, +y tilts up
    pub look: (f32, f32),
    /// `Some(true)` zooms in one step, `Some(false)` out
    pub zoom: Option<bool>,
    /// Model rotation direction per axis (-1, 0, 1)
    pub model_rotate: Vec3,
    /// Model translation direction per axis (-1, 0, 1)
    pub model_move: Vec3,
    /// Seconds since the previous frame
    pub dt: f32,
    pub reset_model: bool,
}

pub struct Viewer {
    pub camera: Camera,
    pub scene: Scene,
    pub shader: Shader,
    renderer: Renderer,
    config: AppConfig,
}

impl Viewer {
    /// Build everything from config. Missing or broken assets degrade to
    /// placeholders with a warning; this never fails.
    pub fn from_config(config: &AppConfig) -> Self {
        let mesh = load_mesh(config);
        let shader = Shader::new(config.lighting.clone(), build_materials(&mesh, config));
        let camera = frame_camera(&mesh, config);
        let renderer = Renderer::new(config.width, config.height, config.raster.clone());

        Self {
            camera,
            scene: Scene::new(mesh),
            shader,
            renderer,
            config: config.clone(),
        }
    }

    /// Assemble from prebuilt parts, default controls
    pub fn with_parts(camera: Camera, scene: Scene, shader: Shader, renderer: Renderer) -> Self {
        let fb = renderer.framebuffer();
        let config = AppConfig {
            width: fb.width,
            height: fb.height,
            camera: camera.settings.clone(),
            lighting: shader.settings.clone(),
            raster: renderer.settings.clone(),
            ..Default::default()
        };
        Self { camera, scene, shader, renderer, config }
    }

    pub fn controls(&self) -> &ControlSettings {
        &self.config.controls
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        self.renderer.framebuffer()
    }

    pub fn stats(&self) -> RenderStats {
        self.renderer.stats()
    }

    /// Forward one frame of input to the camera and scene
    pub fn apply(&mut self, input: &InputFrame) {
        let controls = &self.config.controls;
        let dt = if input.dt.is_finite() { input.dt.max(0.0) } else { 0.0 };

        if input.camera_move != Vec3::ZERO {
            self.camera.move_by(input.camera_move, dt);
        }

        let (dx, dy) = input.look;
        if dx != 0.0 || dy != 0.0 {
            self.camera.rotate(dx * controls.mouse_sensitivity, dy * controls.mouse_sensitivity);
        }

        if let Some(zoom_in) = input.zoom {
            self.camera.scale(zoom_in);
        }

        if input.reset_model {
            self.scene.reset_model();
        } else {
            self.scene.rotate_model(input.model_rotate * controls.model_rotation_speed, dt);
            self.scene.move_model(input.model_move * controls.model_move_speed, dt);
        }
    }

    pub fn render_frame(&mut self) -> &Framebuffer {
        self.renderer.render(&mut self.scene, &self.camera, &mut self.shader)
    }

    /// Swap the mesh: rebinds materials by name, resets the model transform
    /// and reframes the camera around the new bounds
    pub fn replace_mesh(&mut self, mesh: Mesh) {
        let materials = build_materials(&mesh, &self.config);
        self.shader = Shader::new(self.shader.settings.clone(), materials);
        self.camera = frame_camera(&mesh, &self.config);
        self.scene.set_mesh(mesh);
        self.scene.reset_model();
    }

    /// Parse a mesh file and swap it in. On error the current mesh stays.
    pub fn open_model<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        let mesh = parser::parse_file(path.as_ref())?;
        self.config.model = Some(path.as_ref().to_path_buf());
        self.replace_mesh(mesh);
        Ok(())
    }
}

/// The configured model, the unit cube when none is set, or an empty mesh
/// when loading fails
pub fn load_mesh(config: &AppConfig) -> Mesh {
    match &config.model {
        None => Mesh::cube(),
        Some(path) => parser::parse_file(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Failed to load model, scene will be empty");
            Mesh::default()
        }),
    }
}

/// One material per mesh material name (at least one). Unconfigured
/// materials get a checkerboard; textures that fail to load get a flat
/// placeholder.
pub fn build_materials(mesh: &Mesh, config: &AppConfig) -> Vec<Material> {
    let names: Vec<&str> = if mesh.materials().is_empty() {
        vec!["default"]
    } else {
        mesh.materials().iter().map(String::as_str).collect()
    };

    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let Some(entry) = config.material_for(name, i) else {
                return Material::new(name, Texture::checkerboard(64, 64, Color::WHITE, Color::GRAY));
            };

            let load = |path: &Path| match Texture::load(path, config.raw_texture_size) {
                Ok(tex) => {
                    info!(material = *name, path = %path.display(), width = tex.width, height = tex.height, "Loaded texture");
                    Some(tex)
                }
                Err(e) => {
                    warn!(material = *name, path = %path.display(), error = %e, "Texture failed to load");
                    None
                }
            };

            let mut material = match entry.diffuse.as_deref().and_then(load) {
                Some(tex) => Material::new(name, tex),
                None => Material::placeholder(name),
            };
            material.normal = entry.normal.as_deref().and_then(load);
            material.specular = entry.specular.as_deref().and_then(load);
            material
        })
        .collect()
}

/// Camera on +Z looking at the mesh center, far enough back to fit the
/// bounding sphere and never closer than the default eye distance
pub fn frame_camera(mesh: &Mesh, config: &AppConfig) -> Camera {
    const DEFAULT_DISTANCE: f32 = 5.0;

    let settings = config.camera.clone();
    let Some((lo, hi)) = mesh.bounds() else {
        return Camera::new(settings);
    };

    let center = (lo + hi) * 0.5;
    let radius = (hi - lo).len() * 0.5;
    let fit = radius / (settings.fov * 0.5).tan() * 1.25;
    let distance = if fit.is_finite() { fit.max(DEFAULT_DISTANCE) } else { DEFAULT_DISTANCE };

    Camera::looking_at(center + Vec3::new(0.0, 0.0, distance), center, settings)
}

/// Frames per second over a rolling one-second window
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    frames: u32,
    elapsed: f32,
    fps: f32,
    frame_time: f32,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame that took `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        if !(dt >= 0.0) || !dt.is_finite() {
            return;
        }
        self.frames += 1;
        self.elapsed += dt;
        self.frame_time = dt;

        if self.elapsed >= 1.0 {
            self.fps = self.frames as f32 / self.elapsed;
            self.frames = 0;
            self.elapsed = 0.0;
        }
    }

    /// Average over the last completed window, 0 before the first one
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Duration of the most recent frame, milliseconds
    pub fn frame_ms(&self) -> f32 {
        self.frame_time * 1000.0
    }
}
