//! Static configuration for a tree scene.
//!
//! Everything here is fixed once a [`TreeScene`](crate::TreeScene) is built.
//! Use the `with_*` chain to override the defaults:
//!
//! ```ignore
//! use appletree::prelude::*;
//!
//! let config = TreeConfig::new()
//!     .with_height(24.0)
//!     .with_base_radius(5.0)
//!     .with_green_apples(400)
//!     .with_animation_speed(1.5);
//! ```

use crate::layout::Extents;
use glam::Vec3;

/// Tree and animation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeConfig {
    /// Total height of the cone formation.
    pub height: f32,
    /// Cone radius at the base.
    pub base_radius: f32,
    /// Number of green apples (the tree body).
    pub green_apples: u32,
    /// Number of red apples (ornaments).
    pub red_apples: u32,
    /// Number of ribbon segments in the peel garland.
    pub peel_segments: u32,
    /// Global multiplier on every blend rate.
    pub animation_speed: f32,
    /// Radius of the scatter sphere for instanced particles.
    pub scatter_radius: f32,
    /// Radius of the scatter sphere for photo panels.
    pub photo_scatter_radius: f32,
    /// Photo panels blend slower than particles by this factor.
    pub photo_speed_factor: f32,
    /// Upper bound on a single frame delta, in seconds.
    pub max_delta: f32,
    /// Number of snow flakes.
    pub snow_flakes: u32,
    /// Rotation rate of the whole formation about Y, in rad/s.
    pub spin_rate: f32,
}

impl TreeConfig {
    /// Configuration with the default tall, narrow tree.
    pub fn new() -> Self {
        Self {
            height: 18.0,
            base_radius: 3.6,
            green_apples: 260,
            red_apples: 55,
            peel_segments: 600,
            animation_speed: 2.0,
            scatter_radius: 35.0,
            photo_scatter_radius: 40.0,
            photo_speed_factor: 0.8,
            max_delta: 0.1,
            snow_flakes: 3500,
            spin_rate: 0.05,
        }
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height.max(0.0);
        self
    }

    pub fn with_base_radius(mut self, radius: f32) -> Self {
        self.base_radius = radius.max(0.0);
        self
    }

    pub fn with_green_apples(mut self, count: u32) -> Self {
        self.green_apples = count;
        self
    }

    pub fn with_red_apples(mut self, count: u32) -> Self {
        self.red_apples = count;
        self
    }

    pub fn with_peel_segments(mut self, count: u32) -> Self {
        self.peel_segments = count;
        self
    }

    /// Set all three instanced counts at once.
    pub fn with_counts(self, green: u32, red: u32, peel: u32) -> Self {
        self.with_green_apples(green)
            .with_red_apples(red)
            .with_peel_segments(peel)
    }

    /// Set the global animation speed.
    ///
    /// - `2.0` = default
    /// - `1.0` = half as fast
    pub fn with_animation_speed(mut self, speed: f32) -> Self {
        self.animation_speed = speed.max(0.0);
        self
    }

    pub fn with_scatter_radius(mut self, radius: f32) -> Self {
        self.scatter_radius = radius.max(0.0);
        self
    }

    pub fn with_photo_scatter_radius(mut self, radius: f32) -> Self {
        self.photo_scatter_radius = radius.max(0.0);
        self
    }

    /// Clamp applied to frame deltas after a stall (tab switch, debugger).
    pub fn with_max_delta(mut self, seconds: f32) -> Self {
        self.max_delta = seconds.max(0.0);
        self
    }

    pub fn with_snow_flakes(mut self, count: u32) -> Self {
        self.snow_flakes = count;
        self
    }

    pub fn with_spin_rate(mut self, rate: f32) -> Self {
        self.spin_rate = rate;
        self
    }

    /// Formation extents passed to the layout functions.
    #[inline]
    pub fn extents(&self) -> Extents {
        Extents::new(self.height, self.base_radius)
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Scene colours, linear RGB unless noted.
pub struct Palette;

impl Palette {
    pub const APPLE_GREEN: Vec3 = hex(0x6A9E24);
    pub const APPLE_RED: Vec3 = hex(0xB80F0A);
    pub const PEEL_SKIN: Vec3 = hex(0xD95E5E);
    pub const GOLD_STAR: Vec3 = hex(0xFFD700);
    pub const PHOTO_FRAME: Vec3 = hex(0xFFFFFF);
    /// Photo placeholder, as sRGB texel bytes.
    pub const PLACEHOLDER: [u8; 4] = [0x33, 0x33, 0x33, 0xFF];
    pub const SNOW: Vec3 = hex(0xE0F7FA);
    pub const VOID: Vec3 = hex(0x050202);
}

/// Convert a `0xRRGGBB` sRGB colour to linear RGB.
const fn hex(rgb: u32) -> Vec3 {
    Vec3::new(
        srgb_to_linear(((rgb >> 16) & 0xFF) as u8),
        srgb_to_linear(((rgb >> 8) & 0xFF) as u8),
        srgb_to_linear((rgb & 0xFF) as u8),
    )
}

/// Gamma 2.2 approximation of the sRGB transfer curve.
///
/// `const` because the palette lives in associated constants; float `powf`
/// is not const, so square the normalised channel and blend toward the cube.
const fn srgb_to_linear(c: u8) -> f32 {
    let x = c as f32 / 255.0;
    let sq = x * x;
    sq * 0.8 + sq * x * 0.2
}
