//! Procedural placement for the tree formation.
//!
//! Every curve function here is pure: the same `(t, extents)` always gives the
//! same point. Randomness (radial jitter, noisy rotations, scatter points) is
//! drawn separately through [`LayoutRng`] and passed in, so the primary curves
//! can be tested and reasoned about on their own.
//!
//! # Curve families
//!
//! | Family | Turns | Radius at height `y` |
//! |--------|-------|----------------------|
//! | Cone spiral (apples) | 15 | `(H/2 - y) / H * R * 1.2` |
//! | Ribbon spiral (peel) | 6 | `(H/2 - y) / H * R * 1.15 + 0.5` |
//! | Photo spiral | 3 + per-index phase | `(H/2 - y) / H * R * 1.4 + 1.5` |
//!
//! `y` runs from `-H/2` (base, `t = 0`) to `+H/2` (apex, `t = 1`).

use glam::{EulerRot, Mat3, Quat, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Angle swept by the apple spiral over `t = 0..1`.
pub const CONE_SWEEP: f32 = 30.0 * PI;
const CONE_RADIUS_SCALE: f32 = 1.2;

/// Angle swept by the peel ribbon over `t = 0..1`.
pub const RIBBON_SWEEP: f32 = 12.0 * PI;
const RIBBON_RADIUS_SCALE: f32 = 1.15;
const RIBBON_RADIUS_OFFSET: f32 = 0.5;
/// Look-ahead used to approximate the ribbon tangent.
const RIBBON_EPSILON: f32 = 0.01;

/// Angle swept by the photo spiral over `t = 0..1`.
pub const PHOTO_SWEEP: f32 = 6.0 * PI;
const PHOTO_HEIGHT_FRACTION: f32 = 0.8;
const PHOTO_LIFT: f32 = 2.0;
const PHOTO_RADIUS_SCALE: f32 = 1.4;
const PHOTO_RADIUS_OFFSET: f32 = 1.5;
/// Extra angle per photo index so panels do not stack.
const PHOTO_PHASE: f32 = 0.5;

/// Height of the star above the apex.
pub const TOPPER_LIFT: f32 = 1.0;
/// Where the star drifts to when the tree is scattered.
pub const TOPPER_SCATTER_POSITION: Vec3 = Vec3::new(10.0, 20.0, -10.0);

/// Size of the formation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extents {
    /// Total height `H`.
    pub height: f32,
    /// Base radius `R`.
    pub base_radius: f32,
}

impl Extents {
    pub const fn new(height: f32, base_radius: f32) -> Self {
        Self { height, base_radius }
    }

    #[inline]
    pub fn half_height(&self) -> f32 {
        self.height * 0.5
    }

    /// Vertical position for a fraction `t` along the full height.
    #[inline]
    pub fn height_at(&self, t: f32) -> f32 {
        t * self.height - self.half_height()
    }

    /// Fraction of the remaining height above `y`, 1 at the base and 0 at the apex.
    #[inline]
    fn taper(&self, y: f32) -> f32 {
        if self.height <= 0.0 {
            return 0.0;
        }
        (self.half_height() - y) / self.height
    }
}

/// A position and orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

/// Small random tilt that makes a hung photo look hand-placed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhotoTilt {
    /// Rotation about the panel's local Z, in radians.
    pub roll: f32,
    /// Rotation about the panel's local X, in radians.
    pub pitch: f32,
}

/// Fraction along a spiral for particle `index` of `count`.
///
/// Spans `0..=1` inclusive so the last particle reaches the apex. Sets of
/// zero or one particle map to `0`.
#[inline]
pub fn spiral_fraction(index: u32, count: u32) -> f32 {
    if count <= 1 {
        0.0
    } else {
        index as f32 / (count - 1) as f32
    }
}

/// Cone radius at height `y`. Shrinks linearly to zero at the apex.
#[inline]
pub fn cone_radius(y: f32, extents: Extents) -> f32 {
    (extents.taper(y) * extents.base_radius * CONE_RADIUS_SCALE).max(0.0)
}

/// Point on the apple spiral for fraction `t`, before radial jitter.
pub fn cone_spiral_position(t: f32, extents: Extents) -> Vec3 {
    let y = extents.height_at(t);
    let radius = cone_radius(y, extents);
    let angle = t * CONE_SWEEP;
    Vec3::new(angle.cos() * radius, y, angle.sin() * radius)
}

/// Apple pose: the spiral point pushed in or out by `jitter` in the XZ plane,
/// with the given (random) Euler orientation.
pub fn cone_spiral_pose(t: f32, extents: Extents, jitter: f32, euler: Vec3) -> Pose {
    let p = cone_spiral_position(t, extents);
    Pose::new(
        Vec3::new(p.x * jitter, p.y, p.z * jitter),
        euler_to_quat(euler),
    )
}

/// Ribbon radius at height `y`. Sits just outside the apple layer.
#[inline]
pub fn ribbon_radius(y: f32, extents: Extents) -> f32 {
    extents.taper(y) * extents.base_radius * RIBBON_RADIUS_SCALE + RIBBON_RADIUS_OFFSET
}

/// Point on the peel ribbon for fraction `t`.
pub fn ribbon_spiral_position(t: f32, extents: Extents) -> Vec3 {
    let y = extents.height_at(t);
    let radius = ribbon_radius(y, extents);
    let angle = t * RIBBON_SWEEP;
    Vec3::new(angle.cos() * radius, y, angle.sin() * radius)
}

/// Ribbon segment orientation: aligned with the curve tangent, flat face out.
pub fn ribbon_orientation(t: f32, extents: Extents) -> Quat {
    let here = ribbon_spiral_position(t, extents);
    let ahead = ribbon_spiral_position(t + RIBBON_EPSILON, extents);
    look_rotation(here, ahead)
        * Quat::from_rotation_z(FRAC_PI_2)
        * Quat::from_rotation_y(FRAC_PI_2)
}

/// Peel pose for fraction `t`. Fully deterministic.
pub fn ribbon_spiral_pose(t: f32, extents: Extents) -> Pose {
    Pose::new(ribbon_spiral_position(t, extents), ribbon_orientation(t, extents))
}

/// Point on the photo spiral for photo `index` of `count`.
///
/// Photos cover the lower 80% of the height, lifted slightly, and hang
/// outside the apple shell.
pub fn photo_spiral_position(index: u32, count: u32, extents: Extents) -> Vec3 {
    let t = spiral_fraction(index, count);
    let y = t * extents.height * PHOTO_HEIGHT_FRACTION - extents.half_height() + PHOTO_LIFT;
    let radius = extents.taper(y) * extents.base_radius * PHOTO_RADIUS_SCALE + PHOTO_RADIUS_OFFSET;
    let angle = t * PHOTO_SWEEP + index as f32 * PHOTO_PHASE;
    Vec3::new(angle.cos() * radius, y, angle.sin() * radius)
}

/// Photo orientation: facing away from the trunk at its own height, then tilted.
pub fn photo_orientation(position: Vec3, tilt: PhotoTilt) -> Quat {
    let axis_point = Vec3::new(0.0, position.y, 0.0);
    look_rotation(position, axis_point)
        * Quat::from_rotation_y(PI)
        * Quat::from_rotation_z(tilt.roll)
        * Quat::from_rotation_x(tilt.pitch)
}

/// Tree pose for photo `index` of `count`.
pub fn photo_spiral_pose(index: u32, count: u32, extents: Extents, tilt: PhotoTilt) -> Pose {
    let position = photo_spiral_position(index, count, extents);
    Pose::new(position, photo_orientation(position, tilt))
}

/// Star position in the assembled tree.
#[inline]
pub fn topper_position(extents: Extents) -> Vec3 {
    Vec3::new(0.0, extents.half_height() + TOPPER_LIFT, 0.0)
}

/// Rotation that points the local +Z axis from `eye` toward `target`, +Y up.
///
/// Degenerate inputs (coincident points, or a direction parallel to +Y) fall
/// back to a nudged direction so the result is always a unit quaternion.
pub fn look_rotation(eye: Vec3, target: Vec3) -> Quat {
    let mut z = target - eye;
    if z.length_squared() < 1e-12 {
        z = Vec3::Z;
    }
    z = z.normalize();

    let mut x = Vec3::Y.cross(z);
    if x.length_squared() < 1e-12 {
        // Looking straight up or down: tilt off the pole.
        z.z += 1e-4;
        z = z.normalize();
        x = Vec3::Y.cross(z);
    }
    x = x.normalize();
    let y = z.cross(x);

    Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize()
}

/// Euler angles (radians, XYZ order) to a quaternion.
#[inline]
pub fn euler_to_quat(euler: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z)
}

/// Source of every random draw used while building a formation.
///
/// Each method is one named draw, so the random parts of a layout are easy to
/// spot and to replace with fixed values in tests.
pub struct LayoutRng {
    rng: SmallRng,
}

impl LayoutRng {
    /// Different every run.
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Reproducible stream, for tests and benchmarks.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Uniform in `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Uniform in `[min, max)`.
    #[inline]
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.unit()
    }

    /// Uniform point inside a sphere of `radius`, centered at the origin.
    ///
    /// Polar angle by inverse CDF and cube-root radius, so density is uniform
    /// through the volume rather than piling up at the center.
    pub fn scatter_point(&mut self, radius: f32) -> Vec3 {
        let theta = TAU * self.unit();
        let phi = (2.0 * self.unit() - 1.0).clamp(-1.0, 1.0).acos();
        let r = radius * self.unit().cbrt();
        let sin_phi = phi.sin();
        Vec3::new(
            r * sin_phi * theta.cos(),
            r * sin_phi * theta.sin(),
            r * phi.cos(),
        )
    }

    /// Radial jitter for apples, in `[0.8, 1.2)`.
    #[inline]
    pub fn radial_jitter(&mut self) -> f32 {
        self.range(0.8, 1.2)
    }

    /// Size jitter, in `[0.8, 1.2)`.
    #[inline]
    pub fn scale_jitter(&mut self) -> f32 {
        self.range(0.8, 1.2)
    }

    /// Per-particle blend rate multiplier, in `[0.5, 2.0)`.
    #[inline]
    pub fn speed(&mut self) -> f32 {
        self.range(0.5, 2.0)
    }

    /// Euler angles with every axis in `[0, PI)`.
    pub fn random_euler(&mut self) -> Vec3 {
        Vec3::new(
            self.unit() * PI,
            self.unit() * PI,
            self.unit() * PI,
        )
    }

    /// Euler angles with X and Y in `[0, PI)` and no Z.
    pub fn random_euler_xy(&mut self) -> Vec3 {
        Vec3::new(self.unit() * PI, self.unit() * PI, 0.0)
    }

    /// Photo tilt: roll in `±0.15`, pitch in `±0.1` radians.
    pub fn photo_tilt(&mut self) -> PhotoTilt {
        PhotoTilt {
            roll: (self.unit() - 0.5) * 0.3,
            pitch: (self.unit() - 0.5) * 0.2,
        }
    }
}

impl Default for LayoutRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
