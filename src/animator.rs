//! Per-frame blending of instanced particles toward their target poses.
//!
//! Each frame every particle moves a fraction `alpha` of the way to its target
//! (exponential approach), so particles with different `speed` values arrive
//! at different times and the morph looks staggered rather than lockstep.
//!
//! ```ignore
//! let mut apples = InstanceAnimator::new(ParticleKind::GreenApple, 260, &config, &mut rng);
//! let frame = FrameContext::new(FormationMode::Assembled, time.elapsed(), time.delta());
//! apples.update(&frame, config.animation_speed);
//! ```

use crate::config::TreeConfig;
use crate::formation::FormationMode;
use crate::layout::{LayoutRng, Pose};
use crate::particle::{ParticleCache, ParticleKind, ParticleSet};
use crate::transform::TransformBuffer;
use glam::{Quat, Vec3};

/// Peak vertical bob added per frame while scattered.
pub const SCATTER_BOB_AMPLITUDE: f32 = 0.03;
/// Angular frequency of the scattered bob.
pub const SCATTER_BOB_FREQUENCY: f32 = 0.5;
/// Roll about X while scattered, in rad/s.
pub const SCATTER_ROLL_RATE: f32 = 0.6;

/// Timing and mode for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub mode: FormationMode,
    /// Seconds since the scene started.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
}

impl FrameContext {
    pub fn new(mode: FormationMode, elapsed: f32, delta: f32) -> Self {
        Self {
            mode,
            elapsed,
            delta,
        }
    }

    #[inline]
    pub fn is_assembled(&self) -> bool {
        self.mode.is_assembled()
    }
}

/// Blend factor for one frame, clamped to `[0, 1]`.
///
/// A long stall (large `delta`) saturates at 1 and lands exactly on the
/// target instead of overshooting.
#[inline]
pub fn blend_alpha(delta: f32, animation_speed: f32, particle_speed: f32) -> f32 {
    let alpha = delta * animation_speed * particle_speed;
    if alpha.is_nan() {
        0.0
    } else {
        alpha.clamp(0.0, 1.0)
    }
}

/// Move a pose `alpha` of the way toward `target`.
#[inline]
pub fn blend_pose(position: &mut Vec3, rotation: &mut Quat, target: Pose, alpha: f32) {
    *position = position.lerp(target.position, alpha);
    *rotation = rotation.slerp(target.rotation, alpha).normalize();
}

/// Drives one instanced particle set.
#[derive(Debug)]
pub struct InstanceAnimator {
    kind: ParticleKind,
    cache: ParticleCache,
    transforms: TransformBuffer,
}

impl InstanceAnimator {
    /// Build the set and seed every slot at its scatter pose.
    pub fn new(kind: ParticleKind, count: u32, config: &TreeConfig, rng: &mut LayoutRng) -> Self {
        let mut animator = Self {
            kind,
            cache: ParticleCache::new(),
            transforms: TransformBuffer::new(),
        };
        animator.rebuild(kind, count, config, rng);
        animator
    }

    /// Regenerate the set if `(kind, count)` changed. Returns `true` if it did.
    ///
    /// A rebuilt set discards all live state and restarts from scatter poses.
    pub fn rebuild(
        &mut self,
        kind: ParticleKind,
        count: u32,
        config: &TreeConfig,
        rng: &mut LayoutRng,
    ) -> bool {
        self.kind = kind;
        let (set, built) = self.cache.get_or_build(kind, count, config, rng);
        if built {
            self.transforms = TransformBuffer::seeded(set);
        }
        built
    }

    /// Advance every particle by one frame.
    pub fn update(&mut self, frame: &FrameContext, animation_speed: f32) {
        let Some(set) = self.cache.get() else {
            return;
        };
        let mode = frame.mode;
        let scattered = !frame.is_assembled();
        let roll = Quat::from_rotation_x(SCATTER_ROLL_RATE * frame.delta);

        let positions = self.transforms.positions.iter_mut();
        let rotations = self.transforms.rotations.iter_mut();
        for (i, (record, (position, rotation))) in set
            .records()
            .iter()
            .zip(positions.zip(rotations))
            .enumerate()
        {
            let alpha = blend_alpha(frame.delta, animation_speed, record.speed);
            blend_pose(position, rotation, record.target(mode), alpha);

            if scattered {
                position.y += (frame.elapsed * SCATTER_BOB_FREQUENCY + i as f32).sin()
                    * SCATTER_BOB_AMPLITUDE;
                *rotation = (roll * *rotation).normalize();
            }
        }
    }

    #[inline]
    pub fn kind(&self) -> ParticleKind {
        self.kind
    }

    pub fn set(&self) -> Option<&ParticleSet> {
        self.cache.get()
    }

    #[inline]
    pub fn transforms(&self) -> &TransformBuffer {
        &self.transforms
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn animator(kind: ParticleKind, count: u32, seed: u64) -> InstanceAnimator {
        let mut rng = LayoutRng::seeded(seed);
        InstanceAnimator::new(kind, count, &TreeConfig::new(), &mut rng)
    }

    fn run(animator: &mut InstanceAnimator, mode: FormationMode, frames: u32, start: f32) -> f32 {
        let mut elapsed = start;
        for _ in 0..frames {
            elapsed += DT;
            animator.update(&FrameContext::new(mode, elapsed, DT), 2.0);
        }
        elapsed
    }

    #[test]
    fn test_blend_alpha_clamps() {
        assert!((blend_alpha(0.016, 2.0, 1.0) - 0.032).abs() < 1e-6);
        assert_eq!(blend_alpha(5.0, 2.0, 2.0), 1.0);
        assert_eq!(blend_alpha(-1.0, 2.0, 1.0), 0.0);
        assert_eq!(blend_alpha(f32::NAN, 2.0, 1.0), 0.0);
    }

    #[test]
    fn test_blend_converges_monotonically() {
        let target = Pose::new(Vec3::new(3.0, -2.0, 7.0), Quat::from_rotation_y(1.2));
        for alpha in [0.01, 0.1, 0.5, 1.0] {
            let mut position = Vec3::new(-10.0, 4.0, 0.5);
            let mut rotation = Quat::from_rotation_x(2.0);
            let mut last = position.distance(target.position);
            for _ in 0..2000 {
                blend_pose(&mut position, &mut rotation, target, alpha);
                let d = position.distance(target.position);
                if last > 1e-4 {
                    assert!(d < last, "distance did not shrink at alpha {alpha}");
                }
                last = d;
            }
            assert!(last < 1e-3);
            assert!(rotation.angle_between(target.rotation) < 1e-2);
        }
    }

    #[test]
    fn test_alpha_one_lands_on_target() {
        let target = Pose::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_z(0.7));
        let mut position = Vec3::ZERO;
        let mut rotation = Quat::IDENTITY;
        blend_pose(&mut position, &mut rotation, target, 1.0);
        assert!(position.distance(target.position) < 1e-6);
        assert!(rotation.angle_between(target.rotation) < 1e-2);
    }

    #[test]
    fn test_first_frame_starts_at_scatter() {
        let a = animator(ParticleKind::GreenApple, 20, 1);
        let set = a.set().unwrap();
        for (i, r) in set.records().iter().enumerate() {
            assert_eq!(a.transforms().pose(i), r.scatter_pose());
        }
    }

    #[test]
    fn test_assembles_onto_tree_pose() {
        let mut a = animator(ParticleKind::Peel, 40, 2);
        run(&mut a, FormationMode::Assembled, 1500, 0.0);
        let set = a.set().unwrap();
        for (i, r) in set.records().iter().enumerate() {
            let pose = a.transforms().pose(i);
            assert!(pose.position.distance(r.tree_position) < 1e-3);
            assert!(pose.rotation.angle_between(r.tree_rotation) < 1e-2);
        }
    }

    #[test]
    fn test_mode_round_trip() {
        let mut a = animator(ParticleKind::GreenApple, 30, 3);
        let t = run(&mut a, FormationMode::Assembled, 1500, 0.0);
        let assembled: Vec<_> = (0..a.len()).map(|i| a.transforms().pose(i)).collect();

        let t = run(&mut a, FormationMode::Scattered, 600, t);
        run(&mut a, FormationMode::Assembled, 1500, t);

        for (i, before) in assembled.iter().enumerate() {
            let after = a.transforms().pose(i);
            assert!(after.position.distance(before.position) < 1e-3);
            assert!(after.rotation.angle_between(before.rotation) < 1e-2);
        }
    }

    #[test]
    fn test_scattered_motion_stays_bounded() {
        let mut a = animator(ParticleKind::RedApple, 25, 4);
        run(&mut a, FormationMode::Scattered, 3000, 0.0);
        let set = a.set().unwrap();
        for (i, r) in set.records().iter().enumerate() {
            let pose = a.transforms().pose(i);
            assert!(pose.position.is_finite());
            // Bob drift stays within a couple of units of the scatter point.
            assert!(pose.position.distance(r.scatter_position) < 2.0);
            assert!((pose.rotation.length() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_scattered_roll_turns_about_x() {
        let mut a = animator(ParticleKind::GreenApple, 15, 7);
        run(&mut a, FormationMode::Scattered, 600, 0.0);
        let set = a.set().unwrap();
        for (i, r) in set.records().iter().enumerate() {
            let rotation = a.transforms().pose(i).rotation;
            // Roll holds every particle off its scatter orientation...
            assert!(rotation.angle_between(r.scatter_rotation) > 0.1);
            // ...and the offset is a turn about world X.
            let offset = rotation * r.scatter_rotation.inverse();
            assert!((offset * Vec3::X - Vec3::X).length() < 1e-3);
        }
    }

    #[test]
    fn test_scattered_bob_rises_and_falls() {
        let mut a = animator(ParticleKind::RedApple, 10, 8);
        let mut elapsed = run(&mut a, FormationMode::Scattered, 600, 0.0);
        let set = a.set().unwrap().clone();

        let mut low = vec![f32::MAX; a.len()];
        let mut high = vec![f32::MIN; a.len()];
        for _ in 0..900 {
            elapsed = run(&mut a, FormationMode::Scattered, 1, elapsed);
            for (i, r) in set.records().iter().enumerate() {
                let dy = a.transforms().pose(i).position.y - r.scatter_position.y;
                low[i] = low[i].min(dy);
                high[i] = high[i].max(dy);
            }
        }
        for i in 0..a.len() {
            assert!(low[i] < 0.0 && high[i] > 0.0, "particle {i} did not bob");
            assert!(high[i] - low[i] > 0.1);
        }
    }

    #[test]
    fn test_assembled_particles_hold_still() {
        let mut a = animator(ParticleKind::GreenApple, 10, 9);
        let t = run(&mut a, FormationMode::Assembled, 1500, 0.0);
        let settled: Vec<_> = (0..a.len()).map(|i| a.transforms().pose(i)).collect();
        run(&mut a, FormationMode::Assembled, 120, t);
        for (i, before) in settled.iter().enumerate() {
            let after = a.transforms().pose(i);
            assert!(after.position.distance(before.position) < 1e-4);
        }
    }

    #[test]
    fn test_huge_delta_is_stable() {
        let mut a = animator(ParticleKind::GreenApple, 10, 5);
        a.update(&FrameContext::new(FormationMode::Assembled, 1.0, 1000.0), 2.0);
        let set = a.set().unwrap();
        for (i, r) in set.records().iter().enumerate() {
            let pose = a.transforms().pose(i);
            assert!(pose.position.is_finite());
            assert!(pose.position.distance(r.tree_position) < 1e-4);
        }
    }

    #[test]
    fn test_rebuild_only_on_key_change() {
        let mut rng = LayoutRng::seeded(6);
        let config = TreeConfig::new();
        let mut a = InstanceAnimator::new(ParticleKind::GreenApple, 10, &config, &mut rng);
        run(&mut a, FormationMode::Assembled, 10, 0.0);
        let moved = a.transforms().pose(0);

        assert!(!a.rebuild(ParticleKind::GreenApple, 10, &config, &mut rng));
        assert_eq!(a.transforms().pose(0), moved);

        assert!(a.rebuild(ParticleKind::GreenApple, 14, &config, &mut rng));
        assert_eq!(a.len(), 14);
        assert!(a.rebuild(ParticleKind::Peel, 14, &config, &mut rng));
        assert_eq!(a.kind(), ParticleKind::Peel);
    }

    #[test]
    fn test_empty_set_is_noop() {
        let mut a = animator(ParticleKind::GreenApple, 0, 7);
        assert!(a.is_empty());
        a.update(&FrameContext::new(FormationMode::Assembled, 0.0, DT), 2.0);
        assert!(a.is_empty());
    }
}
