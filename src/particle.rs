//! Particle records: the two end poses of every instanced particle.
//!
//! A [`ParticleSet`] is generated once per `(kind, count)` and never edited.
//! Changing either rebuilds the whole set through [`ParticleCache`].

use crate::config::{Palette, TreeConfig};
use crate::formation::FormationMode;
use crate::layout::{
    cone_spiral_pose, euler_to_quat, ribbon_spiral_pose, spiral_fraction, LayoutRng, Pose,
};
use glam::{Quat, Vec3};

/// Which instanced set a particle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    /// Body of the tree.
    GreenApple,
    /// Ornaments, scattered over the full height.
    RedApple,
    /// Ribbon segments of the peel garland.
    Peel,
}

impl ParticleKind {
    pub const ALL: [ParticleKind; 3] = [
        ParticleKind::GreenApple,
        ParticleKind::RedApple,
        ParticleKind::Peel,
    ];

    /// Size before per-particle jitter.
    pub fn scale_base(self) -> f32 {
        match self {
            ParticleKind::GreenApple => 0.9,
            ParticleKind::RedApple => 0.7,
            ParticleKind::Peel => 1.0,
        }
    }

    /// Configured count for this kind.
    pub fn count(self, config: &TreeConfig) -> u32 {
        match self {
            ParticleKind::GreenApple => config.green_apples,
            ParticleKind::RedApple => config.red_apples,
            ParticleKind::Peel => config.peel_segments,
        }
    }

    pub fn color(self) -> Vec3 {
        match self {
            ParticleKind::GreenApple => Palette::APPLE_GREEN,
            ParticleKind::RedApple => Palette::APPLE_RED,
            ParticleKind::Peel => Palette::PEEL_SKIN,
        }
    }

    /// Anisotropic scale for a particle with the given size.
    ///
    /// Apples are squashed vertically; peel segments are thin flat strips.
    #[inline]
    pub fn instance_scale(self, size: f32) -> Vec3 {
        match self {
            ParticleKind::GreenApple | ParticleKind::RedApple => {
                Vec3::new(size, size * 0.85, size)
            }
            ParticleKind::Peel => Vec3::new(size * 0.2, 0.02, size * 0.5),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ParticleKind::GreenApple => "green apples",
            ParticleKind::RedApple => "red apples",
            ParticleKind::Peel => "peel",
        }
    }
}

/// Immutable per-particle data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleRecord {
    pub scatter_position: Vec3,
    pub tree_position: Vec3,
    pub scatter_rotation: Quat,
    pub tree_rotation: Quat,
    /// Size multiplier (kind base times jitter).
    pub scale: f32,
    /// Blend rate multiplier in `[0.5, 2.0)`.
    pub speed: f32,
}

impl ParticleRecord {
    /// Pose this particle is heading for in `mode`.
    #[inline]
    pub fn target(&self, mode: FormationMode) -> Pose {
        match mode {
            FormationMode::Assembled => Pose::new(self.tree_position, self.tree_rotation),
            FormationMode::Scattered => Pose::new(self.scatter_position, self.scatter_rotation),
        }
    }

    #[inline]
    pub fn scatter_pose(&self) -> Pose {
        self.target(FormationMode::Scattered)
    }

    #[inline]
    pub fn tree_pose(&self) -> Pose {
        self.target(FormationMode::Assembled)
    }
}

/// Identity of a particle set. A new key means a new set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SetKey {
    pub kind: ParticleKind,
    pub count: u32,
}

/// All records for one kind.
#[derive(Debug, Clone)]
pub struct ParticleSet {
    kind: ParticleKind,
    records: Vec<ParticleRecord>,
}

impl ParticleSet {
    /// Build `count` records for `kind`.
    pub fn generate(
        kind: ParticleKind,
        count: u32,
        config: &TreeConfig,
        rng: &mut LayoutRng,
    ) -> Self {
        let extents = config.extents();
        let records = (0..count)
            .map(|i| {
                let t = spiral_fraction(i, count);
                let tree = match kind {
                    ParticleKind::Peel => ribbon_spiral_pose(t, extents),
                    ParticleKind::GreenApple | ParticleKind::RedApple => {
                        // Red ornaments pick a random height instead of their index.
                        let t = if kind == ParticleKind::RedApple {
                            rng.unit()
                        } else {
                            t
                        };
                        let jitter = rng.radial_jitter();
                        let euler = rng.random_euler();
                        cone_spiral_pose(t, extents, jitter, euler)
                    }
                };

                ParticleRecord {
                    scatter_position: rng.scatter_point(config.scatter_radius),
                    tree_position: tree.position,
                    scatter_rotation: euler_to_quat(rng.random_euler_xy()),
                    tree_rotation: tree.rotation,
                    scale: kind.scale_base() * rng.scale_jitter(),
                    speed: rng.speed(),
                }
            })
            .collect();

        Self { kind, records }
    }

    #[inline]
    pub fn kind(&self) -> ParticleKind {
        self.kind
    }

    #[inline]
    pub fn key(&self) -> SetKey {
        SetKey {
            kind: self.kind,
            count: self.records.len() as u32,
        }
    }

    #[inline]
    pub fn records(&self) -> &[ParticleRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Memoised particle set, rebuilt only when its key changes.
#[derive(Debug, Default)]
pub struct ParticleCache {
    set: Option<ParticleSet>,
}

impl ParticleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the set for `(kind, count)`, generating it if the key changed.
    ///
    /// The flag is `true` when the set was (re)built by this call.
    pub fn get_or_build(
        &mut self,
        kind: ParticleKind,
        count: u32,
        config: &TreeConfig,
        rng: &mut LayoutRng,
    ) -> (&ParticleSet, bool) {
        let key = SetKey { kind, count };
        let stale = self.set.as_ref().map_or(true, |set| set.key() != key);
        if stale {
            log::debug!("generating {} {}", count, kind.label());
            self.set = None;
        }
        let set = self
            .set
            .get_or_insert_with(|| ParticleSet::generate(kind, count, config, rng));
        (set, stale)
    }

    pub fn get(&self) -> Option<&ParticleSet> {
        self.set.as_ref()
    }
}
