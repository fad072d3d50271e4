//! Per-pixel shading: texture lookup plus a single-sun Phong approximation

use serde::{Deserialize, Serialize};
use super::math::Vec3;
use super::types::{Color, Texture};

/// Where the light sits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SunMode {
    /// Headlamp: the sun follows the camera eye
    Eye,
    /// Fixed world-space position
    Fixed([f32; 3]),
}

/// How the lighting terms combine into the final color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadingModel {
    /// Diffuse term only (ambient when the light is behind the surface)
    Diffuse,
    /// Ambient + diffuse + specular, saturating
    Phong,
}

/// Lighting constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSettings {
    pub ka: f32,
    pub kd: f32,
    pub ks: f32,
    pub shininess: f32,
    pub diffuse_boost: f32,
    pub specular_color: Color,
    pub sun: SunMode,
    pub model: ShadingModel,
    pub use_normal_maps: bool,
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            ka: 0.1,
            kd: 0.5,
            ks: 0.3,
            shininess: 250.0,
            diffuse_boost: 2.0,
            specular_color: Color::WHITE,
            sun: SunMode::Eye,
            model: ShadingModel::Phong,
            use_normal_maps: true,
        }
    }
}

/// Texture set for one `usemtl` group
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub diffuse: Texture,
    pub normal: Option<Texture>,
    pub specular: Option<Texture>,
}

impl Material {
    pub fn new(name: &str, diffuse: Texture) -> Self {
        Self {
            name: name.to_string(),
            diffuse,
            normal: None,
            specular: None,
        }
    }

    /// Flat white surface, used when textures are missing
    pub fn placeholder(name: &str) -> Self {
        Self::new(name, Texture::solid(1, 1, Color::WHITE))
    }
}

/// Decode a tangent-style normal stored as color (`c / 255 * 2 - 1`)
pub fn normal_from_color(color: Color) -> Vec3 {
    let decode = |c: u8| c as f32 / 255.0 * 2.0 - 1.0;
    Vec3::new(decode(color.r), decode(color.g), decode(color.b)).normalize()
}

/// Shading state for one frame: settings, materials, eye and sun positions
#[derive(Debug, Clone)]
pub struct Shader {
    pub settings: LightingSettings,
    materials: Vec<Material>,
    fallback: Material,
    eye: Vec3,
    sun: Vec3,
}

impl Shader {
    pub fn new(settings: LightingSettings, materials: Vec<Material>) -> Self {
        Self {
            settings,
            materials,
            fallback: Material::placeholder("fallback"),
            eye: Vec3::ZERO,
            sun: Vec3::ZERO,
        }
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Material by index; out of range falls back to the first one
    pub fn material(&self, index: usize) -> &Material {
        self.materials
            .get(index)
            .or_else(|| self.materials.first())
            .unwrap_or(&self.fallback)
    }

    /// Latch the eye (and the sun, in headlamp mode) for this frame
    pub fn begin_frame(&mut self, eye: Vec3) {
        self.eye = eye;
        self.sun = match self.settings.sun {
            SunMode::Eye => eye,
            SunMode::Fixed(p) => Vec3::from(p),
        };
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn sun(&self) -> Vec3 {
        self.sun
    }

    /// Color of a surface point. Deterministic for identical inputs.
    pub fn shade(&self, material: usize, world: Vec3, normal: Vec3, uv: (f32, f32)) -> Color {
        let s = &self.settings;
        let mat = self.material(material);
        let (u, v) = uv;

        let diffuse = mat.diffuse.sample(u, v);

        let n = match (&mat.normal, s.use_normal_maps) {
            (Some(map), true) => (normal.normalize() + normal_from_color(map.sample(u, v))).normalize(),
            _ => normal.normalize(),
        };
        let l = (self.sun - world).normalize();
        let view = (self.eye - world).normalize();

        let ambient = diffuse.multiply(s.ka);

        let nl = n.dot(l);
        if !(nl > 0.0) {
            return ambient;
        }

        let lit = diffuse.multiply(s.kd * nl * s.diffuse_boost);

        match s.model {
            ShadingModel::Diffuse => lit,
            ShadingModel::Phong => {
                let h = (l + view).normalize();
                let intensity = mat
                    .specular
                    .as_ref()
                    .map(|map| map.sample(u, v).luminance())
                    .unwrap_or(1.0);
                let spec = s.ks * intensity * n.dot(h).max(0.0).powf(s.shininess);
                let highlight = s.specular_color.multiply(spec);
                ambient.add(lit).add(highlight)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shader(model: ShadingModel) -> Shader {
        let settings = LightingSettings { model, ..Default::default() };
        let mut shader = Shader::new(settings, vec![Material::new("gray", Texture::solid(2, 2, Color::GRAY))]);
        shader.begin_frame(Vec3::new(0.0, 0.0, 5.0));
        shader
    }

    #[test]
    fn test_back_lit_returns_ambient() {
        let s = shader(ShadingModel::Phong);
        let c = s.shade(0, Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), (0.5, 0.5));
        assert_eq!(c, Color::GRAY.multiply(0.1));
    }

    #[test]
    fn test_diffuse_facing_light() {
        let s = shader(ShadingModel::Diffuse);
        let c = s.shade(0, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), (0.5, 0.5));
        // kd * N.L * boost = 0.5 * 1 * 2
        assert_eq!(c, Color::GRAY);
    }

    #[test]
    fn test_phong_adds_highlight() {
        let s = shader(ShadingModel::Phong);
        let c = s.shade(0, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), (0.5, 0.5));
        // Headlamp straight on: H == N, full specular
        let expected = Color::GRAY.multiply(0.1).add(Color::GRAY).add(Color::WHITE.multiply(0.3));
        assert_eq!(c, expected);
        assert!(c.r > Color::GRAY.r);
    }

    #[test]
    fn test_shading_is_deterministic() {
        let s = shader(ShadingModel::Phong);
        let args = (Vec3::new(0.3, -0.2, 0.1), Vec3::new(0.2, 0.4, 0.9), (0.3, 0.7));
        let a = s.shade(0, args.0, args.1, args.2);
        let b = s.shade(0, args.0, args.1, args.2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_normal_does_not_produce_nan_color() {
        let s = shader(ShadingModel::Phong);
        // Falls back to +Z, which faces the headlamp
        let c = s.shade(0, Vec3::ZERO, Vec3::ZERO, (0.5, 0.5));
        assert!(c.r >= Color::GRAY.r);
    }

    #[test]
    fn test_fixed_sun() {
        let settings = LightingSettings {
            sun: SunMode::Fixed([0.0, 0.0, -10.0]),
            ..Default::default()
        };
        let mut s = Shader::new(settings, vec![Material::new("w", Texture::solid(1, 1, Color::WHITE))]);
        s.begin_frame(Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(s.sun(), Vec3::new(0.0, 0.0, -10.0));
        // Surface faces the eye but the sun is behind it
        let c = s.shade(0, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), (0.5, 0.5));
        assert_eq!(c, Color::WHITE.multiply(0.1));
    }

    #[test]
    fn test_normal_map_decode() {
        let n = normal_from_color(Color::new(128, 128, 255));
        assert!(n.z > 0.99);
        let n = normal_from_color(Color::new(255, 128, 128));
        assert!(n.x > 0.99);
    }

    fn mapped_shader(model: ShadingModel, use_normal_maps: bool, material: Material) -> Shader {
        let settings = LightingSettings { model, use_normal_maps, ..Default::default() };
        let mut shader = Shader::new(settings, vec![material]);
        shader.begin_frame(Vec3::new(0.0, 0.0, 5.0));
        shader
    }

    #[test]
    fn test_normal_map_tilts_diffuse() {
        // Map points along +X: blended with the +Z surface normal it leans
        // about 45 degrees away from the headlamp
        let mut material = Material::new("gray", Texture::solid(2, 2, Color::GRAY));
        material.normal = Some(Texture::solid(2, 2, Color::new(255, 128, 128)));

        let facing = Vec3::new(0.0, 0.0, 1.0);
        let mapped = mapped_shader(ShadingModel::Diffuse, true, material.clone())
            .shade(0, Vec3::ZERO, facing, (0.5, 0.5));
        assert!(mapped.r < Color::GRAY.r, "{:?}", mapped);
        assert!(mapped.r > Color::GRAY.multiply(0.1).r);
        // 128 * cos(45deg) = 90.5
        assert!((mapped.r as i32 - 91).abs() <= 2, "{:?}", mapped);

        let unmapped = mapped_shader(ShadingModel::Diffuse, false, material)
            .shade(0, Vec3::ZERO, facing, (0.5, 0.5));
        assert_eq!(unmapped, Color::GRAY);
    }

    #[test]
    fn test_black_specular_map_removes_highlight() {
        let mut material = Material::new("gray", Texture::solid(2, 2, Color::GRAY));
        material.specular = Some(Texture::solid(2, 2, Color::BLACK));
        let s = mapped_shader(ShadingModel::Phong, true, material);

        let c = s.shade(0, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), (0.5, 0.5));
        assert_eq!(c, Color::GRAY.multiply(0.1).add(Color::GRAY));

        let plain = shader(ShadingModel::Phong).shade(0, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), (0.5, 0.5));
        assert!(plain.r > c.r);
    }

    #[test]
    fn test_unknown_material_falls_back() {
        let s = shader(ShadingModel::Diffuse);
        assert_eq!(s.material(7).name, "gray");

        let mut empty = Shader::new(LightingSettings::default(), Vec::new());
        empty.begin_frame(Vec3::new(0.0, 0.0, 5.0));
        let c = empty.shade(3, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), (0.0, 0.0));
        assert_eq!(c.a, 255);
    }
}
