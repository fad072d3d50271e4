//! Fly camera: eye/target/up plus a zoom factor
//!
//! Orientation is tracked as yaw/pitch. Pitch is clamped short of the
//! poles, which is what keeps the look-at basis from degenerating; there
//! is no quaternion math.

use serde::{Deserialize, Serialize};
use super::math::{Mat4, Vec3};

/// Tunables for the camera, loaded from the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view (radians)
    pub fov: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// World units per second of `move_by`
    pub speed: f32,
    /// Radians of yaw/pitch per unit of rotate delta
    pub rotation_sensitivity: f32,
    /// Zoom multiplier per `scale` step
    pub scale_sensitivity: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub max_pitch_degrees: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: std::f32::consts::FRAC_PI_4,
            z_near: 0.4,
            z_far: 1000.0,
            speed: 1.0,
            rotation_sensitivity: 0.1,
            scale_sensitivity: 1.1,
            min_scale: 0.2,
            max_scale: 5.0,
            max_pitch_degrees: 89.0,
        }
    }
}

impl CameraSettings {
    /// Pitch limit in radians. A NaN limit falls back to the default.
    pub fn max_pitch(&self) -> f32 {
        let degrees = if self.max_pitch_degrees.is_nan() {
            Self::default().max_pitch_degrees
        } else {
            self.max_pitch_degrees
        };
        degrees.clamp(0.0, 89.9).to_radians()
    }

    /// Zoom bounds as an ordered, finite, positive `(min, max)` pair.
    /// Unusable bounds fall back to the defaults.
    pub fn scale_range(&self) -> (f32, f32) {
        let defaults = Self::default();
        let usable = |s: f32| s.is_finite() && s > 0.0;
        let lo = if usable(self.min_scale) { self.min_scale } else { defaults.min_scale };
        let hi = if usable(self.max_scale) { self.max_scale } else { defaults.max_scale };
        (lo.min(hi), lo.max(hi))
    }

    /// Problems that would make the camera unusable, if any
    pub fn validate(&self) -> Result<(), String> {
        let finite = [
            ("fov", self.fov),
            ("z_near", self.z_near),
            ("z_far", self.z_far),
            ("speed", self.speed),
            ("rotation_sensitivity", self.rotation_sensitivity),
            ("scale_sensitivity", self.scale_sensitivity),
            ("min_scale", self.min_scale),
            ("max_scale", self.max_scale),
            ("max_pitch_degrees", self.max_pitch_degrees),
        ];
        if let Some((name, value)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("camera.{} must be finite, got {}", name, value));
        }
        if !(self.fov > 0.0 && self.fov < std::f32::consts::PI) {
            return Err(format!("camera.fov must be in (0, pi), got {}", self.fov));
        }
        if !(self.z_near > 0.0 && self.z_far > self.z_near) {
            return Err(format!("camera needs 0 < z_near < z_far, got {} and {}", self.z_near, self.z_far));
        }
        if !(self.scale_sensitivity > 0.0) {
            return Err(format!("camera.scale_sensitivity must be positive, got {}", self.scale_sensitivity));
        }
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale) {
            return Err(format!(
                "camera needs 0 < min_scale <= max_scale, got {} and {}",
                self.min_scale, self.max_scale
            ));
        }
        Ok(())
    }
}

/// Camera state
#[derive(Debug, Clone)]
pub struct Camera {
    eye: Vec3,
    target: Vec3,
    up: Vec3,
    scale_factor: f32,
    yaw: f32,
    pitch: f32,
    pub settings: CameraSettings,
}

impl Camera {
    /// Camera at (0, 0, 5) looking at the origin
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::UP,
            scale_factor: 1.0,
            yaw: -std::f32::consts::FRAC_PI_2,
            pitch: 0.0,
            settings,
        }
    }

    /// Camera at `eye` facing `target`, yaw/pitch derived from the view direction
    pub fn looking_at(eye: Vec3, target: Vec3, settings: CameraSettings) -> Self {
        let mut cam = Self::new(settings);
        cam.eye = eye;
        let forward = (target - eye).normalize();
        let max_pitch = cam.settings.max_pitch();
        cam.yaw = forward.z.atan2(forward.x);
        cam.pitch = forward.y.clamp(-1.0, 1.0).asin().clamp(-max_pitch, max_pitch);
        cam.update_orientation();
        cam
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Pan eye and target together. `direction.x` moves left, `.y` forward,
    /// `.z` along world up; the step is `speed * dt`.
    pub fn move_by(&mut self, direction: Vec3, dt: f32) {
        let forward = (self.target - self.eye).normalize();
        let left = self.up.cross(forward).normalize();
        let step = self.settings.speed * dt;

        let offset = left * (direction.x * step)
            + forward * (direction.y * step)
            + Vec3::UP * (direction.z * step);

        if offset.is_finite() {
            self.eye += offset;
            self.target += offset;
        }
    }

    /// Mouse-look. `delta_x` turns (yaw), `delta_y` tilts (pitch).
    pub fn rotate(&mut self, delta_x: f32, delta_y: f32) {
        let max_pitch = self.settings.max_pitch();
        self.yaw -= delta_x * self.settings.rotation_sensitivity;
        self.pitch = (self.pitch + delta_y * self.settings.rotation_sensitivity)
            .clamp(-max_pitch, max_pitch);
        self.update_orientation();
    }

    /// Zoom in (multiply) or out (divide) by the sensitivity, clamped
    pub fn scale(&mut self, zoom_in: bool) {
        let s = self.settings.scale_sensitivity;
        let next = if zoom_in {
            self.scale_factor * s
        } else {
            self.scale_factor / s
        };
        if !next.is_finite() {
            return;
        }
        let (min, max) = self.settings.scale_range();
        self.scale_factor = next.clamp(min, max);
    }

    /// Rebuild forward/up/target from yaw and pitch
    fn update_orientation(&mut self) {
        let forward = Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize();

        let right = forward.cross(Vec3::UP).normalize();
        self.up = right.cross(forward).normalize();
        self.target = self.eye + forward;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective(self.settings.fov, aspect, self.settings.z_near, self.settings.z_far)
    }

    pub fn viewport_matrix(&self, width: usize, height: usize) -> Mat4 {
        Mat4::viewport(width, height)
    }

    pub fn scale_matrix(&self) -> Mat4 {
        Mat4::scale(self.scale_factor)
    }

    /// World -> screen: `Viewport · Projection · View · Scale`
    pub fn screen_matrix(&self, width: usize, height: usize) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        self.viewport_matrix(width, height)
            .mul(&self.projection_matrix(aspect))
            .mul(&self.view_matrix())
            .mul(&self.scale_matrix())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::math::Vec4;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_view_matrix_target_at_minus_five() {
        let cam = Camera::default();
        let p = cam.view_matrix().transform(Vec4::point(Vec3::ZERO));
        assert!(close(p.x, 0.0) && close(p.y, 0.0) && close(p.z, -5.0) && close(p.w, 1.0));
    }

    #[test]
    fn test_target_projects_to_viewport_center() {
        let cam = Camera::default();
        let clip = cam.screen_matrix(320, 240).transform(Vec4::point(cam.target()));
        let (x, y) = (clip.x / clip.w, clip.y / clip.w);
        assert!((x - 160.0).abs() < 0.5 && (y - 120.0).abs() < 0.5, "({}, {})", x, y);

        // Any point straight ahead lands on the center too
        let ahead = cam.eye() + (cam.target() - cam.eye()).normalize() * 3.0;
        let clip = cam.screen_matrix(320, 240).transform(Vec4::point(ahead));
        assert!((clip.x / clip.w - 160.0).abs() < 0.5);
        assert!((clip.y / clip.w - 120.0).abs() < 0.5);
    }

    #[test]
    fn test_first_rotate_keeps_initial_direction() {
        let mut cam = Camera::default();
        cam.rotate(0.0, 0.0);
        assert!(close(cam.target().z, 4.0));
        assert!(close(cam.up().y, 1.0));
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut cam = Camera::default();
        let max_pitch = cam.settings.max_pitch();
        for _ in 0..1000 {
            cam.rotate(0.0, 50.0);
            assert!(cam.pitch() <= max_pitch + 1e-6);
        }
        for _ in 0..1000 {
            cam.rotate(3.0, -50.0);
            assert!(cam.pitch() >= -max_pitch - 1e-6);
        }
        // Basis stays well defined at the clamp
        let up = cam.up();
        assert!(up.is_finite() && close(up.len(), 1.0));
    }

    #[test]
    fn test_scale_stays_in_range() {
        let mut cam = Camera::default();
        for _ in 0..200 {
            cam.scale(true);
            assert!(cam.scale_factor() <= cam.settings.max_scale);
        }
        assert!(close(cam.scale_factor(), cam.settings.max_scale));
        for _ in 0..200 {
            cam.scale(false);
            assert!(cam.scale_factor() >= cam.settings.min_scale);
        }
        assert!(close(cam.scale_factor(), cam.settings.min_scale));
    }

    #[test]
    fn test_inverted_scale_bounds_do_not_panic() {
        let mut cam = Camera::new(CameraSettings { min_scale: 5.0, max_scale: 0.2, ..Default::default() });
        assert_eq!(cam.settings.scale_range(), (0.2, 5.0));
        cam.scale(true);
        assert!(close(cam.scale_factor(), 1.1));

        let mut cam = Camera::new(CameraSettings { min_scale: f32::NAN, max_scale: f32::INFINITY, ..Default::default() });
        for _ in 0..100 {
            cam.scale(true);
        }
        assert!(close(cam.scale_factor(), 5.0));

        let mut cam = Camera::new(CameraSettings { scale_sensitivity: f32::NAN, ..Default::default() });
        cam.scale(false);
        assert_eq!(cam.scale_factor(), 1.0);
    }

    #[test]
    fn test_nan_pitch_limit_uses_default() {
        let mut cam = Camera::new(CameraSettings { max_pitch_degrees: f32::NAN, ..Default::default() });
        assert!(close(cam.settings.max_pitch(), 89.0f32.to_radians()));
        cam.rotate(0.0, 1000.0);
        assert!(cam.pitch() <= 89.0f32.to_radians() + 1e-6);
        assert!(cam.up().is_finite());
    }

    #[test]
    fn test_settings_validation() {
        assert!(CameraSettings::default().validate().is_ok());
        let bad = [
            CameraSettings { min_scale: 5.0, max_scale: 0.2, ..Default::default() },
            CameraSettings { max_pitch_degrees: f32::NAN, ..Default::default() },
            CameraSettings { z_near: 10.0, z_far: 1.0, ..Default::default() },
            CameraSettings { fov: 0.0, ..Default::default() },
            CameraSettings { scale_sensitivity: -1.0, ..Default::default() },
        ];
        for settings in bad {
            assert!(settings.validate().is_err(), "{:?}", settings);
        }
    }

    #[test]
    fn test_move_forward_and_left() {
        let mut cam = Camera::default();
        cam.move_by(Vec3::new(0.0, 1.0, 0.0), 2.0);
        assert!(close(cam.eye().z, 3.0));
        assert!(close(cam.target().z, -2.0));

        cam.move_by(Vec3::new(1.0, 0.0, 0.0), 1.0);
        // Looking down -Z, left is -X
        assert!(close(cam.eye().x, -1.0));

        cam.move_by(Vec3::new(0.0, 0.0, 1.0), 0.5);
        assert!(close(cam.eye().y, 0.5));
        assert!(close(cam.target().y, 0.5));
    }

    #[test]
    fn test_looking_at_matches_default() {
        let cam = Camera::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, CameraSettings::default());
        let def = Camera::default();
        assert!(close(cam.yaw(), def.yaw()));
        assert!(close(cam.pitch(), 0.0));
        let dir = (cam.target() - cam.eye()).normalize();
        assert!(close(dir.z, -1.0));
    }

    #[test]
    fn test_looking_straight_down_is_clamped() {
        let cam = Camera::looking_at(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, CameraSettings::default());
        assert!(cam.pitch() >= -cam.settings.max_pitch() - 1e-6);
        assert!(cam.view_matrix().m.iter().flatten().all(|v| v.is_finite()));
    }
}
