//! Integration tests driving a whole tree through formation changes.
//!
//! These use only the public API, the same way the viewer does: a
//! `FormationController` owns the mode and photo list and a `TreeScene` is
//! stepped once per frame.

use appletree::layout::{cone_radius, cone_spiral_position, spiral_fraction};
use appletree::prelude::*;
use appletree::{Extents, LayoutRng, PhotoId};

const DT: f32 = 1.0 / 60.0;

fn small_config() -> TreeConfig {
    TreeConfig::new().with_counts(40, 8, 60).with_snow_flakes(20)
}

struct Harness {
    scene: TreeScene,
    controller: FormationController,
    elapsed: f32,
}

impl Harness {
    fn new(config: TreeConfig, seed: u64) -> Self {
        Self {
            scene: TreeScene::with_rng(config, LayoutRng::seeded(seed)),
            controller: FormationController::new(),
            elapsed: 0.0,
        }
    }

    fn run(&mut self, frames: u32) {
        for _ in 0..frames {
            self.elapsed += DT;
            self.scene.update(&FrameInput {
                mode: self.controller.mode(),
                photos: self.controller.photos(),
                elapsed: self.elapsed,
                delta: DT,
            });
        }
    }

    fn max_distance_to_tree(&self) -> f32 {
        let mut worst: f32 = 0.0;
        for animator in self.scene.sets() {
            let set = animator.set().expect("set is built");
            for (i, record) in set.records().iter().enumerate() {
                let pose = animator.transforms().pose(i);
                worst = worst.max(pose.position.distance(record.tree_position));
            }
        }
        worst
    }
}

// ============================================================================
// Layout scenarios
// ============================================================================

#[test]
fn test_three_apple_cone_scenario() {
    let extents = Extents::new(18.0, 3.6);

    let bottom = cone_spiral_position(spiral_fraction(0, 3), extents);
    assert!((bottom.y + 9.0).abs() < 1e-5);
    let expected = ((9.0 - bottom.y) / 18.0) * 3.6 * 1.2;
    assert!((cone_radius(bottom.y, extents) - expected).abs() < 1e-5);
    assert!((Vec3::new(bottom.x, 0.0, bottom.z).length() - expected).abs() < 1e-4);

    let apex = cone_spiral_position(spiral_fraction(2, 3), extents);
    assert!((apex.y - 9.0).abs() < 1e-5);
    assert!(Vec3::new(apex.x, 0.0, apex.z).length() < 1e-5);
}

#[test]
fn test_single_and_empty_counts_are_safe() {
    assert_eq!(spiral_fraction(0, 0), 0.0);
    assert_eq!(spiral_fraction(0, 1), 0.0);

    let mut harness = Harness::new(TreeConfig::new().with_counts(0, 1, 0).with_snow_flakes(0), 1);
    harness.controller.set_mode(FormationMode::Assembled);
    harness.run(10);
    assert_eq!(harness.scene.particle_count(), 1);
    assert!(harness.scene.photos().is_empty());
}

// ============================================================================
// Formation changes
// ============================================================================

#[test]
fn test_toggle_assembles_then_scatters() {
    let mut harness = Harness::new(small_config(), 7);
    harness.run(5);
    let scattered_distance = harness.max_distance_to_tree();
    assert!(scattered_distance > 1.0);

    harness.controller.toggle();
    harness.run(1500);
    assert!(harness.max_distance_to_tree() < 1e-3);

    // Topper parks on the tree top.
    let top = harness.scene.topper().position();
    assert!((top - Vec3::new(0.0, 10.0, 0.0)).length() < 1e-3);

    harness.controller.toggle();
    harness.run(600);
    assert!(harness.max_distance_to_tree() > 1.0);
}

#[test]
fn test_round_trip_returns_to_tree_pose() {
    let mut harness = Harness::new(small_config(), 11);
    harness.controller.set_mode(FormationMode::Assembled);
    harness.run(1500);
    assert!(harness.max_distance_to_tree() < 1e-3);

    harness.controller.set_mode(FormationMode::Scattered);
    harness.run(300);
    harness.controller.set_mode(FormationMode::Assembled);
    harness.run(1500);
    assert!(harness.max_distance_to_tree() < 1e-3);
}

#[test]
fn test_stall_does_not_explode() {
    let mut harness = Harness::new(small_config(), 13);
    harness.controller.set_mode(FormationMode::Assembled);
    for delta in [5.0, f32::INFINITY, f32::NAN, -1.0, 0.0] {
        harness.scene.update(&FrameInput {
            mode: harness.controller.mode(),
            photos: harness.controller.photos(),
            elapsed: 1.0,
            delta,
        });
    }
    for animator in harness.scene.sets() {
        for p in animator.transforms().positions() {
            assert!(p.is_finite());
        }
    }
}

// ============================================================================
// Photos
// ============================================================================

fn tree_targets(harness: &Harness) -> Vec<(PhotoId, Vec3)> {
    let extents = harness.scene.config().extents();
    harness
        .scene
        .photos()
        .iter()
        .map(|p| (p.id(), p.animator().tree_pose(extents).position))
        .collect()
}

#[test]
fn test_sixth_photo_reflows_all_five() {
    let mut harness = Harness::new(small_config(), 17);
    harness
        .controller
        .add_photos((0..5u8).map(|i| PhotoSource::Bytes(vec![i])));
    harness.controller.set_mode(FormationMode::Assembled);
    harness.run(1);
    let before = tree_targets(&harness);
    assert_eq!(before.len(), 5);

    let newest = harness.controller.add_photo(PhotoSource::Bytes(vec![42]));
    harness.run(1);
    let after = tree_targets(&harness);
    assert_eq!(after.len(), 6);
    assert_eq!(after[0].0, newest);

    for (id, old) in &before {
        let (_, new) = after.iter().find(|(other, _)| other == id).expect("photo kept");
        assert!(old.distance(*new) > 1e-3, "photo {id} did not reflow");
    }
}

#[test]
fn test_photo_list_climbs_from_the_bottom() {
    let mut harness = Harness::new(small_config(), 29);
    harness
        .controller
        .add_photos((0..4u8).map(|i| PhotoSource::Bytes(vec![i])));
    harness.run(1);

    let targets = tree_targets(&harness);
    assert_eq!(targets.len(), 4);
    assert_eq!(targets[0].0, harness.controller.photos()[0].id());
    assert!((targets[0].1.y + 7.0).abs() < 1e-4, "first photo at {}", targets[0].1.y);
    for pair in targets.windows(2) {
        assert!(pair[0].1.y < pair[1].1.y);
    }
}

#[test]
fn test_removing_photo_keeps_others_animating() {
    let mut harness = Harness::new(small_config(), 19);
    let ids = harness
        .controller
        .add_photos((0..3u8).map(|i| PhotoSource::Bytes(vec![i])));
    harness.controller.set_mode(FormationMode::Assembled);
    harness.run(30);

    assert!(harness.controller.remove_photo(ids[1]));
    harness.run(2000);
    assert_eq!(harness.scene.photos().len(), 2);

    let extents = harness.scene.config().extents();
    for panel in harness.scene.photos() {
        let target = panel.animator().tree_pose(extents);
        assert!(panel.pose().position.distance(target.position) < 1e-3);
    }
}

#[test]
fn test_broken_photo_on_disk_is_isolated() {
    let dir = std::env::temp_dir().join(format!("appletree-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let good = dir.join("good.png");
    image::RgbaImage::from_pixel(4, 3, image::Rgba([200, 10, 10, 255]))
        .save(&good)
        .unwrap();
    let corrupt = dir.join("corrupt.png");
    std::fs::write(&corrupt, b"not a png").unwrap();
    let missing = dir.join("missing.jpg");

    let mut harness = Harness::new(small_config(), 23);
    harness.controller = FormationController::new().with_photos([
        PhotoSource::File(good),
        PhotoSource::File(corrupt),
        PhotoSource::File(missing),
    ]);
    harness.controller.set_mode(FormationMode::Assembled);
    harness.run(2000);
    harness.scene.finish_loading();

    let panels = harness.scene.photos();
    assert_eq!(panels.len(), 3);
    let good_texture = panels[0].texture().texture().expect("good photo decodes");
    assert_eq!((good_texture.width, good_texture.height), (4, 3));
    assert!(panels[1].texture().is_placeholder());
    assert!(panels[2].texture().is_placeholder());

    // Every panel reached its slot, broken or not.
    let extents = harness.scene.config().extents();
    for panel in panels {
        let target = panel.animator().tree_pose(extents);
        assert!(panel.pose().position.distance(target.position) < 1e-3);
    }
    assert!(harness.max_distance_to_tree() < 1e-3);

    std::fs::remove_dir_all(&dir).ok();
}
