//! WGSL sources and the uniform block they share.

use crate::config::Palette;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

pub const MESH_SHADER: &str = include_str!("mesh.wgsl");
pub const PHOTO_SHADER: &str = include_str!("photo.wgsl");
pub const SNOW_SHADER: &str = include_str!("snow.wgsl");

/// Direction light travels, before normalisation.
const LIGHT_DIRECTION: Vec3 = Vec3::new(-0.4, -1.0, -0.6);
const AMBIENT: f32 = 0.35;
/// Peak opacity at a flake's centre.
const SNOW_OPACITY: f32 = 0.8;

/// Matches `struct Camera` in every shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub right: [f32; 4],
    pub up: [f32; 4],
    pub light: [f32; 4],
    pub snow: [f32; 4],
}

impl SceneUniforms {
    pub fn new(view_proj: Mat4, right: Vec3, up: Vec3) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            right: right.extend(0.0).to_array(),
            up: up.extend(0.0).to_array(),
            light: LIGHT_DIRECTION.normalize().extend(AMBIENT).to_array(),
            snow: Palette::SNOW.extend(SNOW_OPACITY).to_array(),
        }
    }
}
