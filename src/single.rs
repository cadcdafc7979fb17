//! Animation for objects that are drawn one at a time: photo panels and the star.
//!
//! Both use the same blend as instanced particles, with their own secondary
//! motion layered on top.

use crate::animator::{blend_alpha, blend_pose, FrameContext};
use crate::config::TreeConfig;
use crate::layout::{
    euler_to_quat, photo_spiral_pose, topper_position, Extents, LayoutRng, PhotoTilt, Pose,
    TOPPER_SCATTER_POSITION,
};
use glam::{EulerRot, Quat, Vec3};
use std::f32::consts::TAU;

const PHOTO_SWAY_RATE: f32 = 2.0;
const PHOTO_SWAY_AMPLITUDE: f32 = 0.05;
/// Scattered tumble about X and Y, in rad/s.
const PHOTO_TUMBLE: (f32, f32) = (0.2, 0.1);

/// Assembled spin about Y, in rad/s.
const TOPPER_SPIN_RATE: f32 = 0.5;
/// Scattered tumble about X and Z, in rad/s.
const TOPPER_TUMBLE_RATE: f32 = 1.0;

/// Live state of one photo panel.
///
/// The tree pose is recomputed from `(index, count)` every frame, so a change
/// in list length reflows every panel immediately.
#[derive(Debug, Clone)]
pub struct PhotoAnimator {
    index: u32,
    count: u32,
    tilt: PhotoTilt,
    scatter: Pose,
    position: Vec3,
    rotation: Quat,
}

impl PhotoAnimator {
    /// New panel at its scatter pose.
    pub fn new(index: u32, count: u32, config: &TreeConfig, rng: &mut LayoutRng) -> Self {
        let tilt = rng.photo_tilt();
        let scatter = Pose::new(
            rng.scatter_point(config.photo_scatter_radius),
            euler_to_quat(rng.random_euler()),
        );
        Self {
            index,
            count,
            tilt,
            scatter,
            position: scatter.position,
            rotation: scatter.rotation,
        }
    }

    /// Update this panel's slot in the photo list.
    #[inline]
    pub fn set_slot(&mut self, index: u32, count: u32) {
        self.index = index;
        self.count = count;
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Pose in the assembled tree for the current slot.
    pub fn tree_pose(&self, extents: Extents) -> Pose {
        photo_spiral_pose(self.index, self.count, extents, self.tilt)
    }

    #[inline]
    pub fn scatter_pose(&self) -> Pose {
        self.scatter
    }

    /// Where the panel is heading in `frame`'s mode.
    pub fn target_pose(&self, frame: &FrameContext, extents: Extents) -> Pose {
        if frame.is_assembled() {
            self.tree_pose(extents)
        } else {
            self.scatter
        }
    }

    /// Current pose.
    #[inline]
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation)
    }

    pub fn update(&mut self, frame: &FrameContext, config: &TreeConfig) {
        let target = self.target_pose(frame, config.extents());
        let alpha = blend_alpha(
            frame.delta,
            config.animation_speed,
            config.photo_speed_factor,
        );
        blend_pose(&mut self.position, &mut self.rotation, target, alpha);

        if frame.is_assembled() {
            // Wind sway about the panel's own Z.
            let sway = (frame.elapsed * PHOTO_SWAY_RATE + self.index as f32).sin()
                * PHOTO_SWAY_AMPLITUDE;
            self.rotation = (self.rotation * Quat::from_rotation_z(sway * frame.delta)).normalize();
        } else {
            let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
            self.rotation = Quat::from_euler(
                EulerRot::XYZ,
                x + frame.delta * PHOTO_TUMBLE.0,
                y + frame.delta * PHOTO_TUMBLE.1,
                z,
            )
            .normalize();
        }
    }
}

/// Live state of the star on top of the tree.
#[derive(Debug, Clone)]
pub struct TopperAnimator {
    position: Vec3,
    /// Euler angles, XYZ order. Wrapped to one turn.
    euler: Vec3,
}

impl TopperAnimator {
    /// Start at the scattered position, unrotated.
    pub fn new() -> Self {
        Self {
            position: TOPPER_SCATTER_POSITION,
            euler: Vec3::ZERO,
        }
    }

    pub fn target_position(frame: &FrameContext, extents: Extents) -> Vec3 {
        if frame.is_assembled() {
            topper_position(extents)
        } else {
            TOPPER_SCATTER_POSITION
        }
    }

    pub fn update(&mut self, frame: &FrameContext, config: &TreeConfig) {
        let target = Self::target_position(frame, config.extents());
        let alpha = blend_alpha(frame.delta, config.animation_speed, 1.0);
        self.position = self.position.lerp(target, alpha);

        if frame.is_assembled() {
            self.euler = Vec3::new(0.0, self.euler.y + frame.delta * TOPPER_SPIN_RATE, 0.0);
        } else {
            self.euler.x += frame.delta * TOPPER_TUMBLE_RATE;
            self.euler.z += frame.delta * TOPPER_TUMBLE_RATE;
        }
        self.euler = Vec3::new(
            self.euler.x.rem_euclid(TAU),
            self.euler.y.rem_euclid(TAU),
            self.euler.z.rem_euclid(TAU),
        );
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        euler_to_quat(self.euler)
    }

    #[inline]
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation())
    }
}

impl Default for TopperAnimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::FormationMode;

    const DT: f32 = 1.0 / 60.0;

    fn frames(mode: FormationMode, n: u32) -> impl Iterator<Item = FrameContext> {
        (1..=n).map(move |i| FrameContext::new(mode, i as f32 * DT, DT))
    }

    #[test]
    fn test_photo_starts_scattered() {
        let mut rng = LayoutRng::seeded(1);
        let photo = PhotoAnimator::new(0, 3, &TreeConfig::new(), &mut rng);
        assert_eq!(photo.pose(), photo.scatter_pose());
        assert!(photo.scatter_pose().position.length() <= 40.0 + 1e-3);
    }

    #[test]
    fn test_photo_settles_near_tree_pose() {
        let config = TreeConfig::new();
        let mut rng = LayoutRng::seeded(2);
        let mut photo = PhotoAnimator::new(2, 5, &config, &mut rng);
        for frame in frames(FormationMode::Assembled, 2000) {
            photo.update(&frame, &config);
        }
        let tree = photo.tree_pose(config.extents());
        assert!(photo.pose().position.distance(tree.position) < 1e-3);
        // Sway keeps it close to, not exactly on, the settled orientation.
        assert!(photo.pose().rotation.angle_between(tree.rotation) < 0.05);
    }

    #[test]
    fn test_photo_reflows_with_count() {
        let config = TreeConfig::new();
        let mut rng = LayoutRng::seeded(3);
        let mut photo = PhotoAnimator::new(3, 5, &config, &mut rng);
        let before = photo.tree_pose(config.extents());
        photo.set_slot(3, 6);
        let after = photo.tree_pose(config.extents());
        assert!(before.position.distance(after.position) > 1e-3);
        assert_eq!((photo.index(), photo.count()), (3, 6));
    }

    #[test]
    fn test_photo_tumbles_when_scattered() {
        let config = TreeConfig::new();
        let mut rng = LayoutRng::seeded(4);
        let mut photo = PhotoAnimator::new(0, 1, &config, &mut rng);
        for frame in frames(FormationMode::Scattered, 600) {
            photo.update(&frame, &config);
        }
        let pose = photo.pose();
        assert!(pose.position.distance(photo.scatter_pose().position) < 1e-3);
        assert!(pose.rotation.is_normalized());
    }

    #[test]
    fn test_scattered_photo_turns_away_from_scatter_rotation() {
        let config = TreeConfig::new();
        let mut rng = LayoutRng::seeded(5);
        let mut photo = PhotoAnimator::new(1, 2, &config, &mut rng);
        let scatter = photo.scatter_pose().rotation;

        // Position and target already agree, so any turning is the tumble.
        let mut last = photo.pose().rotation;
        for frame in frames(FormationMode::Scattered, 10) {
            photo.update(&frame, &config);
            let rotation = photo.pose().rotation;
            assert!(rotation.angle_between(last) > 1e-5);
            last = rotation;
        }

        for frame in frames(FormationMode::Scattered, 600) {
            photo.update(&frame, &config);
        }
        let offset = photo.pose().rotation.angle_between(scatter);
        assert!(offset > 0.05, "tumble offset {offset}");
        assert!(offset < 0.5, "tumble offset {offset}");
    }

    #[test]
    fn test_assembled_photo_sways_both_ways() {
        let config = TreeConfig::new();
        let mut rng = LayoutRng::seeded(6);
        let mut photo = PhotoAnimator::new(0, 4, &config, &mut rng);
        for frame in frames(FormationMode::Assembled, 2000) {
            photo.update(&frame, &config);
        }
        let tree = photo.tree_pose(config.extents()).rotation;

        let (mut low, mut high) = (f32::MAX, f32::MIN);
        for i in 2001..2301 {
            let frame = FrameContext::new(FormationMode::Assembled, i as f32 * DT, DT);
            photo.update(&frame, &config);
            let mut offset = tree.inverse() * photo.pose().rotation;
            if offset.w < 0.0 {
                offset = -offset;
            }
            // Sway only turns about the panel's own Z.
            assert!(offset.x.abs() < 1e-3 && offset.y.abs() < 1e-3);
            let roll = 2.0 * offset.z.atan2(offset.w);
            low = low.min(roll);
            high = high.max(roll);
        }
        assert!(low < -0.005 && high > 0.005, "roll range {low}..{high}");
        assert!(low > -0.1 && high < 0.1, "roll range {low}..{high}");
    }

    #[test]
    fn test_topper_assembles_and_spins_upright() {
        let config = TreeConfig::new();
        let mut topper = TopperAnimator::new();
        assert_eq!(topper.position(), TOPPER_SCATTER_POSITION);

        for frame in frames(FormationMode::Scattered, 100) {
            topper.update(&frame, &config);
        }
        for frame in frames(FormationMode::Assembled, 1000) {
            topper.update(&frame, &config);
        }
        assert!(topper.position().distance(Vec3::new(0.0, 10.0, 0.0)) < 1e-3);

        // Only Y rotation survives in the assembled state.
        let up = topper.rotation() * Vec3::Y;
        assert!((up - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn test_topper_tumbles_when_scattered() {
        let config = TreeConfig::new();
        let mut topper = TopperAnimator::new();
        for frame in frames(FormationMode::Scattered, 60) {
            topper.update(&frame, &config);
        }
        let up = topper.rotation() * Vec3::Y;
        assert!((up - Vec3::Y).length() > 0.1);
    }
}
