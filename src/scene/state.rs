//! Model transform state and the cached world-space arrays derived from it

use crate::rasterizer::{Mat4, Vec3};
use super::mesh::Mesh;

/// Scene state: the base mesh plus accumulated model position/rotation
pub struct Scene {
    mesh: Mesh,
    model_position: Vec3,
    model_rotation: Vec3,
    world_vertices: Vec<Vec3>,
    world_normals: Vec<Vec3>,
    dirty: bool,
}

impl Scene {
    pub fn new(mesh: Mesh) -> Self {
        let mut scene = Self {
            world_vertices: Vec::with_capacity(mesh.vertices().len()),
            world_normals: Vec::with_capacity(mesh.normals().len()),
            mesh,
            model_position: Vec3::ZERO,
            model_rotation: Vec3::ZERO,
            dirty: true,
        };
        scene.update();
        scene
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Swap in a new mesh, keeping the current model transform
    pub fn set_mesh(&mut self, mesh: Mesh) {
        self.mesh = mesh;
        self.dirty = true;
        self.update();
    }

    pub fn model_position(&self) -> Vec3 {
        self.model_position
    }

    pub fn model_rotation(&self) -> Vec3 {
        self.model_rotation
    }

    /// Accumulate `rates * dt` radians of rotation
    pub fn rotate_model(&mut self, rates: Vec3, dt: f32) {
        let delta = rates * dt;
        if delta.is_finite() && delta != Vec3::ZERO {
            self.model_rotation += delta;
            self.dirty = true;
        }
    }

    /// Accumulate `rates * dt` of translation
    pub fn move_model(&mut self, rates: Vec3, dt: f32) {
        let delta = rates * dt;
        if delta.is_finite() && delta != Vec3::ZERO {
            self.model_position += delta;
            self.dirty = true;
        }
    }

    pub fn reset_model(&mut self) {
        self.model_position = Vec3::ZERO;
        self.model_rotation = Vec3::ZERO;
        self.dirty = true;
    }

    /// `move · rotation`
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::translation(self.model_position).mul(&Mat4::rotation(self.model_rotation))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Recompute the world-space arrays if the model transform changed.
    /// Normals get the rotation only, never the translation.
    pub fn update(&mut self) {
        if !self.dirty {
            return;
        }

        let rotation = Mat4::rotation(self.model_rotation);
        let model = Mat4::translation(self.model_position).mul(&rotation);

        self.world_vertices.clear();
        self.world_vertices
            .extend(self.mesh.vertices().iter().map(|&v| model.transform_point(v)));

        self.world_normals.clear();
        self.world_normals
            .extend(self.mesh.normals().iter().map(|&n| rotation.transform_direction(n).normalize()));

        self.dirty = false;
    }

    /// World-space vertices as of the last `update`
    pub fn world_vertices(&self) -> &[Vec3] {
        &self.world_vertices
    }

    /// World-space normals as of the last `update`
    pub fn world_normals(&self) -> &[Vec3] {
        &self.world_normals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).len() < 1e-4
    }

    #[test]
    fn test_move_translates_vertices_not_normals() {
        let mut scene = Scene::new(Mesh::cube());
        let before = scene.world_normals().to_vec();

        scene.move_model(Vec3::new(2.0, 0.0, -4.0), 0.5);
        assert!(scene.is_dirty());
        scene.update();

        assert!(close(scene.world_vertices()[0], Vec3::new(0.5, -0.5, -1.5)));
        for (a, b) in before.iter().zip(scene.world_normals()) {
            assert!(close(*a, *b));
        }
    }

    #[test]
    fn test_rotation_turns_normals_and_keeps_them_unit() {
        let mut scene = Scene::new(Mesh::cube());
        scene.move_model(Vec3::new(10.0, 10.0, 10.0), 1.0);
        scene.rotate_model(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0), 1.0);
        scene.update();

        // Front normal (+Z) rotated a quarter turn about Y points along +X
        let front = scene.world_normals()[0];
        assert!(close(front, Vec3::new(1.0, 0.0, 0.0)), "{:?}", front);
        for n in scene.world_normals() {
            assert!((n.len() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_accumulates_across_updates() {
        let mut scene = Scene::new(Mesh::cube());
        scene.move_model(Vec3::new(1.0, 0.0, 0.0), 1.0);
        scene.update();
        scene.move_model(Vec3::new(1.0, 0.0, 0.0), 1.0);
        scene.update();
        assert!(close(scene.model_position(), Vec3::new(2.0, 0.0, 0.0)));
        assert!(close(scene.world_vertices()[0], Vec3::new(1.5, -0.5, 0.5)));

        scene.reset_model();
        scene.update();
        assert!(close(scene.world_vertices()[0], Vec3::new(-0.5, -0.5, 0.5)));
    }

    #[test]
    fn test_update_is_noop_when_clean() {
        let mut scene = Scene::new(Mesh::cube());
        assert!(!scene.is_dirty());
        scene.move_model(Vec3::ZERO, 1.0);
        assert!(!scene.is_dirty());
        scene.update();
        assert_eq!(scene.world_vertices().len(), 8);
    }
}
