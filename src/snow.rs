//! Ambient snow drifting through the scene.
//!
//! Flakes fall slowly, are pushed along +X by a gusty wind, and wrap around
//! the edges of a box so the field never empties.

use crate::layout::LayoutRng;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Half-extents of the snow box.
pub const SNOW_BOUNDS: Vec3 = Vec3::new(50.0, 40.0, 40.0);
/// Spawn spread is wider on X so wind has room to carry flakes in.
const SPAWN_EXTENT: Vec3 = Vec3::new(100.0, 80.0, 80.0);
const BASE_WIND: f32 = 2.5;
/// Rendered flake size.
pub const FLAKE_SIZE: f32 = 0.15;

/// One flake as consumed by the renderer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SnowInstance {
    pub position: [f32; 3],
    pub size: f32,
}

/// Every flake position.
pub struct SnowField {
    positions: Vec<Vec3>,
    rng: LayoutRng,
}

impl SnowField {
    pub fn new(count: u32, mut rng: LayoutRng) -> Self {
        let positions = (0..count)
            .map(|_| {
                Vec3::new(
                    (rng.unit() - 0.5) * SPAWN_EXTENT.x,
                    (rng.unit() - 0.5) * SPAWN_EXTENT.y,
                    (rng.unit() - 0.5) * SPAWN_EXTENT.z,
                )
            })
            .collect();
        Self { positions, rng }
    }

    pub fn update(&mut self, elapsed: f32, delta: f32) {
        let bounds = SNOW_BOUNDS;
        for (i, p) in self.positions.iter_mut().enumerate() {
            let seed = i as f32 * 0.1;

            // Per-flake fall speed so they don't drop in sheets.
            let fall = 1.0 + seed.sin() * 0.5 + 0.5;
            p.y -= delta * fall;

            let turbulence = (elapsed * 0.5 + p.y * 0.05 + seed).sin() * 2.0;
            let flutter = (elapsed * 2.0 + seed).cos() * 0.5;
            let wind_x = BASE_WIND + turbulence + flutter;
            let wind_z = (elapsed * 0.3 + p.x * 0.02).sin() * 0.5;
            p.x += delta * wind_x;
            p.z += delta * wind_z;

            if p.y < -bounds.y {
                p.y = bounds.y;
                p.x = (self.rng.unit() - 0.5) * bounds.x * 2.0;
                p.z = (self.rng.unit() - 0.5) * bounds.z * 2.0;
            }
            if p.x > bounds.x {
                p.x = -bounds.x;
                p.y = (self.rng.unit() - 0.5) * bounds.y * 2.0;
            }
            if p.z > bounds.z {
                p.z -= bounds.z * 2.0;
            }
            if p.z < -bounds.z {
                p.z += bounds.z * 2.0;
            }
        }
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn write_instances(&self, out: &mut Vec<SnowInstance>) {
        out.extend(self.positions.iter().map(|p| SnowInstance {
            position: p.to_array(),
            size: FLAKE_SIZE,
        }));
    }
}
