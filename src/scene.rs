//! The whole tree: every particle set, the photo panels, the star and the snow.
//!
//! [`TreeScene::update`] is the single per-frame entry point. It reads the
//! formation mode and photo list, advances every animator in order, and
//! leaves the results ready for the renderer to read.

use crate::animator::{FrameContext, InstanceAnimator};
use crate::config::TreeConfig;
use crate::formation::FormationMode;
use crate::layout::{LayoutRng, Pose};
use crate::particle::ParticleKind;
use crate::photo::{PanelTexture, PhotoId, PhotoLoader, PhotoRef};
use crate::single::{PhotoAnimator, TopperAnimator};
use crate::snow::SnowField;
use crate::transform::InstanceRaw;
use glam::{EulerRot, Mat4, Quat, Vec3};
use std::collections::HashMap;

/// Rate of the whole-tree float, in rad/s of its phase.
const FLOAT_SPEED: f32 = 0.25;
/// Peak vertical drift of the whole tree.
const FLOAT_HEIGHT: f32 = 0.02;
/// Peak tilt of the whole tree about X and Y, and about Z.
const FLOAT_TILT: (f32, f32) = (0.0125, 0.005);

/// External inputs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub mode: FormationMode,
    pub photos: &'a [PhotoRef],
    pub elapsed: f32,
    pub delta: f32,
}

/// A framed photo hanging on the tree.
#[derive(Debug)]
pub struct PhotoPanel {
    photo: PhotoRef,
    texture: PanelTexture,
    animator: PhotoAnimator,
}

impl PhotoPanel {
    fn new(
        photo: PhotoRef,
        index: u32,
        count: u32,
        config: &TreeConfig,
        rng: &mut LayoutRng,
        loader: &mut PhotoLoader,
    ) -> Self {
        loader.request(&photo);
        Self {
            photo,
            texture: PanelTexture::Loading,
            animator: PhotoAnimator::new(index, count, config, rng),
        }
    }

    #[inline]
    pub fn id(&self) -> PhotoId {
        self.photo.id()
    }

    #[inline]
    pub fn photo(&self) -> &PhotoRef {
        &self.photo
    }

    #[inline]
    pub fn texture(&self) -> &PanelTexture {
        &self.texture
    }

    #[inline]
    pub fn animator(&self) -> &PhotoAnimator {
        &self.animator
    }

    #[inline]
    pub fn pose(&self) -> Pose {
        self.animator.pose()
    }
}

/// Everything that moves.
pub struct TreeScene {
    config: TreeConfig,
    rng: LayoutRng,
    sets: Vec<InstanceAnimator>,
    photos: Vec<PhotoPanel>,
    loader: PhotoLoader,
    /// Bumped whenever the panel list changes shape or a texture arrives.
    photo_generation: u64,
    topper: TopperAnimator,
    snow: SnowField,
    mode: FormationMode,
    elapsed: f32,
}

impl TreeScene {
    pub fn new(config: TreeConfig) -> Self {
        Self::with_rng(config, LayoutRng::from_entropy())
    }

    /// Build with a specific random stream, for reproducible layouts.
    pub fn with_rng(config: TreeConfig, mut rng: LayoutRng) -> Self {
        let sets = ParticleKind::ALL
            .iter()
            .map(|&kind| InstanceAnimator::new(kind, kind.count(&config), &config, &mut rng))
            .collect();
        let snow_rng = LayoutRng::seeded((rng.unit() * u32::MAX as f32) as u64);
        let snow = SnowField::new(config.snow_flakes, snow_rng);
        log::info!(
            "tree scene: {} green, {} red, {} peel, {} snow",
            config.green_apples,
            config.red_apples,
            config.peel_segments,
            config.snow_flakes
        );

        Self {
            config,
            rng,
            sets,
            photos: Vec::new(),
            loader: PhotoLoader::new(),
            photo_generation: 0,
            topper: TopperAnimator::new(),
            snow,
            mode: FormationMode::default(),
            elapsed: 0.0,
        }
    }

    /// Advance one frame.
    pub fn update(&mut self, input: &FrameInput<'_>) {
        let delta = if input.delta.is_finite() {
            input.delta.clamp(0.0, self.config.max_delta)
        } else {
            0.0
        };
        self.mode = input.mode;
        self.elapsed = input.elapsed;
        self.receive_textures();
        self.sync_photos(input.photos);

        let frame = FrameContext::new(input.mode, input.elapsed, delta);
        for set in &mut self.sets {
            set.update(&frame, self.config.animation_speed);
        }

        let count = self.photos.len() as u32;
        for (i, panel) in self.photos.iter_mut().enumerate() {
            panel.animator.set_slot(i as u32, count);
            panel.animator.update(&frame, &self.config);
        }

        self.topper.update(&frame, &self.config);
        self.snow.update(input.elapsed, delta);
    }

    /// Match panels to the photo list, keeping live state for known photos.
    fn sync_photos(&mut self, photos: &[PhotoRef]) {
        let unchanged = photos.len() == self.photos.len()
            && photos.iter().zip(&self.photos).all(|(p, panel)| p.id() == panel.id());
        if unchanged {
            return;
        }

        let count = photos.len() as u32;
        let mut previous: HashMap<PhotoId, PhotoPanel> =
            self.photos.drain(..).map(|panel| (panel.id(), panel)).collect();
        self.photos = photos
            .iter()
            .enumerate()
            .map(|(i, photo)| match previous.remove(&photo.id()) {
                Some(panel) => panel,
                None => PhotoPanel::new(
                    photo.clone(),
                    i as u32,
                    count,
                    &self.config,
                    &mut self.rng,
                    &mut self.loader,
                ),
            })
            .collect();
        self.photo_generation += 1;
        log::debug!("photo panels: {}", self.photos.len());
    }

    /// Swap in textures the decoder has finished since last frame.
    fn receive_textures(&mut self) {
        let photos = &mut self.photos;
        let mut arrived = false;
        self.loader.poll(|id, texture| {
            arrived |= attach_texture(photos, id, texture);
        });
        if arrived {
            self.photo_generation += 1;
        }
    }

    /// Block until every requested photo is decoded (or has failed).
    ///
    /// The viewer never calls this; it's for headless use and tests that
    /// need textures settled.
    pub fn finish_loading(&mut self) {
        let photos = &mut self.photos;
        let mut arrived = false;
        self.loader.wait(|id, texture| {
            arrived |= attach_texture(photos, id, texture);
        });
        if arrived {
            self.photo_generation += 1;
        }
    }

    /// Photos still being decoded.
    #[inline]
    pub fn pending_photos(&self) -> usize {
        self.loader.pending()
    }

    #[inline]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    #[inline]
    pub fn mode(&self) -> FormationMode {
        self.mode
    }

    #[inline]
    pub fn sets(&self) -> &[InstanceAnimator] {
        &self.sets
    }

    pub fn set(&self, kind: ParticleKind) -> Option<&InstanceAnimator> {
        self.sets.iter().find(|s| s.kind() == kind)
    }

    #[inline]
    pub fn photos(&self) -> &[PhotoPanel] {
        &self.photos
    }

    #[inline]
    pub fn photo_generation(&self) -> u64 {
        self.photo_generation
    }

    #[inline]
    pub fn topper(&self) -> &TopperAnimator {
        &self.topper
    }

    #[inline]
    pub fn snow(&self) -> &SnowField {
        &self.snow
    }

    /// Rotation of the whole formation: a slow spin about Y under a
    /// gentle floating tilt.
    pub fn group_rotation(&self) -> Quat {
        let phase = self.elapsed * FLOAT_SPEED;
        let tilt = Quat::from_euler(
            EulerRot::XYZ,
            phase.cos() * FLOAT_TILT.0,
            phase.sin() * FLOAT_TILT.0,
            phase.sin() * FLOAT_TILT.1,
        );
        tilt * Quat::from_rotation_y(self.elapsed * self.config.spin_rate)
    }

    /// Vertical float of the whole formation.
    #[inline]
    pub fn group_offset(&self) -> Vec3 {
        Vec3::new(0.0, (self.elapsed * FLOAT_SPEED).sin() * FLOAT_HEIGHT, 0.0)
    }

    #[inline]
    pub fn group_transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.group_rotation(), self.group_offset())
    }

    /// Total number of instanced particles.
    pub fn particle_count(&self) -> usize {
        self.sets.iter().map(InstanceAnimator::len).sum()
    }

    /// Append one set's instances, tinted with its colour.
    pub fn write_instances(&self, kind: ParticleKind, out: &mut Vec<InstanceRaw>) {
        if let Some(set) = self.set(kind) {
            set.transforms()
                .write_instances(self.group_transform(), kind.color(), out);
        }
    }
}

/// Give the panel for `id` its texture. Returns `false` if the photo was
/// removed while it was decoding.
fn attach_texture(photos: &mut [PhotoPanel], id: PhotoId, texture: PanelTexture) -> bool {
    match photos.iter_mut().find(|panel| panel.id() == id) {
        Some(panel) => {
            panel.texture = texture;
            true
        }
        None => false,
    }
}
