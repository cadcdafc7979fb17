//! Orbit camera for viewing the tree.

use glam::{Mat4, Vec3};

const DEFAULT_DISTANCE: f32 = 28.0;
const DEFAULT_PITCH: f32 = 0.15;
const MIN_DISTANCE: f32 = 8.0;
const MAX_DISTANCE: f32 = 80.0;
/// Radians per pixel of mouse drag.
const ORBIT_SENSITIVITY: f32 = 0.005;
/// Slow idle spin, in rad/s.
const AUTO_ROTATE_RATE: f32 = 0.1;

/// Orbit camera circling the tree's centre.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub auto_rotate: bool,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: DEFAULT_PITCH,
            distance: DEFAULT_DISTANCE,
            target: Vec3::ZERO,
            fov_y: 45.0_f32.to_radians(),
            auto_rotate: false,
        }
    }

    /// Back to the starting view, keeping the auto-rotate setting.
    pub fn reset(&mut self) {
        *self = Self {
            auto_rotate: self.auto_rotate,
            ..Self::new()
        };
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), 0.1, 300.0)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }

    /// Camera right and up vectors in world space, for billboards.
    pub fn basis(&self) -> (Vec3, Vec3) {
        let forward = (self.target - self.position()).normalize_or(Vec3::NEG_Z);
        let right = forward.cross(Vec3::Y).normalize_or(Vec3::X);
        let up = right.cross(forward);
        (right, up)
    }

    /// Rotate around the target by a mouse drag in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * ORBIT_SENSITIVITY;
        self.pitch = (self.pitch + dy * ORBIT_SENSITIVITY).clamp(-1.5, 1.5);
    }

    /// Dolly toward (positive `scroll`) or away from the target.
    pub fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance * (1.0 - scroll * 0.1)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Advance the idle spin.
    pub fn advance(&mut self, delta: f32) {
        if self.auto_rotate {
            self.yaw += delta * AUTO_ROTATE_RATE;
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
