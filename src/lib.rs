//! # appletree
//!
//! A particle tree that morphs between a scattered cloud and an assembled
//! cone: apples, a spiralling peel ribbon, framed photos and a star on top.
//!
//! Every object has two precomputed poses. Each frame it moves a fraction of
//! the way toward the pose for the current [`FormationMode`], so toggling the
//! mode sends everything flying to the other formation.
//!
//! ## Quick Start
//!
//! ```ignore
//! use appletree::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     Viewer::new()
//!         .with_config(TreeConfig::new().with_counts(300, 60, 600))
//!         .with_photos([PhotoSource::File("family.jpg".into())])
//!         .run()
//! }
//! ```
//!
//! ## Headless use
//!
//! The scene runs without a window, which is how the tests drive it:
//!
//! ```ignore
//! let mut scene = TreeScene::new(TreeConfig::default());
//! let mut controller = FormationController::new();
//! controller.set_mode(FormationMode::Assembled);
//!
//! scene.update(&FrameInput {
//!     mode: controller.mode(),
//!     photos: controller.photos(),
//!     elapsed: 0.016,
//!     delta: 0.016,
//! });
//! ```
//!
//! ## Layout
//!
//! | Object | Assembled | Scattered |
//! |--------|-----------|-----------|
//! | Apples | jittered cone spiral | random point in a sphere |
//! | Peel | ribbon spiral, wider than the cone | random point in a sphere |
//! | Photos | sparse spiral facing outward | random point in a wider sphere |
//! | Star | tree top, spinning | fixed point off to the side, tumbling |
//!
//! Set `RUST_LOG=debug` to see cache rebuilds and photo loading.

pub mod animator;
pub mod config;
pub mod error;
pub mod formation;
mod gpu;
pub mod input;
pub mod layout;
pub mod particle;
pub mod photo;
pub mod scene;
pub mod single;
pub mod snow;
pub mod time;
pub mod transform;
mod viewer;

pub use animator::{FrameContext, InstanceAnimator};
pub use config::{Palette, TreeConfig};
pub use error::{GpuError, TextureError, ViewerError};
pub use formation::{FormationController, FormationMode};
pub use glam::{Quat, Vec3};
pub use gpu::Camera;
pub use layout::{Extents, LayoutRng, Pose};
pub use particle::{ParticleKind, ParticleRecord, ParticleSet};
pub use photo::{PanelTexture, PhotoId, PhotoLoader, PhotoRef, PhotoSource, PhotoTexture};
pub use scene::{FrameInput, PhotoPanel, TreeScene};
pub use single::{PhotoAnimator, TopperAnimator};
pub use snow::SnowField;
pub use time::Time;
pub use transform::{InstanceRaw, TransformBuffer};
pub use viewer::Viewer;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use appletree::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{Palette, TreeConfig};
    pub use crate::error::ViewerError;
    pub use crate::formation::{FormationController, FormationMode};
    pub use crate::input::{Input, KeyCode, MouseButton};
    pub use crate::particle::ParticleKind;
    pub use crate::photo::{PhotoId, PhotoSource};
    pub use crate::scene::{FrameInput, TreeScene};
    pub use crate::time::Time;
    pub use crate::viewer::Viewer;
    pub use crate::{Quat, Vec3};
}
