//! Integration tests: scene files mounted on a stage and driven frame by frame

use std::io::Write;

use atmosfx::geometry::Rect;
use atmosfx::host::headless::HeadlessScene;
use atmosfx::host::SceneHost;
use atmosfx::{ConfigError, EffectKind, EffectStage, SceneConfig, StageError};
use glam::Vec2;
use tempfile::NamedTempFile;

const SCENE: &str = r#"
seed = 7
viewport = [800.0, 600.0]

[[effects]]
name = "flare"
type = "lens_flare"
source = "sun"
falloff = 0.5

[[effects.elements]]
offset = 1.0
size = 40.0
alpha = 0.5

[[effects]]
name = "sun"
type = "sun"
radius = 40.0

[effects.motion]
mode = "circular"
center = [400.0, 300.0]
radius = 250.0
angular_speed_deg = 45.0
phase_deg = 180.0
clockwise = true

[[effects]]
name = "embers"
type = "embers"
pool_size = 16
budget = 6

[[effects]]
name = "glow"
type = "fireflies"
count = 20

[[effects]]
name = "leaves"
type = "autumn_leaves"

[effects.spawn]
max = 8
start_filled = true

[[effects]]
name = "disabled"
type = "embers"
enabled = false
"#;

fn write_scene(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn run(stage: &mut EffectStage, host: &mut HeadlessScene, frames: u32) {
    let dt = 1.0 / 60.0;
    for frame in 0..frames {
        stage.update(host, frame as f32 * dt, dt);
    }
}

#[test]
fn test_scene_file_mounts_in_order() {
    let file = write_scene(SCENE);
    let scene = SceneConfig::load(file.path()).unwrap();
    assert_eq!(scene.effects.len(), 6);

    let mut host = HeadlessScene::new(scene.viewport);
    let mut stage = EffectStage::new();
    assert_eq!(stage.mount_scene(&mut host, &scene).unwrap(), 5);

    let names: Vec<&str> = stage.names().collect();
    assert_eq!(names, vec!["flare", "sun", "embers", "glow", "leaves"]);
    assert_eq!(stage.get("sun").unwrap().kind(), EffectKind::Sun);
    assert!(stage.get("disabled").is_none());
}

#[test]
fn test_flare_tracks_sun_mounted_after_it() {
    let file = write_scene(SCENE);
    let scene = SceneConfig::load(file.path()).unwrap();
    let mut host = HeadlessScene::new(scene.viewport);
    let mut stage = EffectStage::new();
    stage.mount_scene(&mut host, &scene).unwrap();

    run(&mut stage, &mut host, 90);

    let sun = stage.get("sun").unwrap().as_sun().unwrap();
    let flare = stage.get("flare").unwrap().as_lens_flare().unwrap();
    assert!(flare.is_visible());

    // The flare reads this frame's sun center, not last frame's
    let center = Vec2::new(400.0, 300.0);
    let element = flare.elements_state()[0];
    let expected = center + (center - sun.center());
    assert!((element.position - expected).length() < 1e-2);
}

#[test]
fn test_budget_and_bounds_routing() {
    let scene = SceneConfig::from_toml_str(SCENE).unwrap();
    let mut host = HeadlessScene::new(scene.viewport);
    let mut stage = EffectStage::new();
    stage.mount_scene(&mut host, &scene).unwrap();

    let embers = stage.get("embers").unwrap().as_embers().unwrap();
    assert_eq!(embers.visible_count(), 0);

    stage
        .update_container_bounds(&mut host, "embers", Rect::new(0.0, 0.0, 800.0, 600.0))
        .unwrap();
    assert_eq!(stage.get("embers").unwrap().as_embers().unwrap().visible_count(), 6);

    stage.set_budget(&mut host, "embers", 100).unwrap();
    assert_eq!(stage.get("embers").unwrap().as_embers().unwrap().visible_count(), 16);

    stage.set_budget(&mut host, "glow", 80).unwrap();
    assert_eq!(stage.get("glow").unwrap().as_fireflies().unwrap().visible_count(), 10);

    assert!(matches!(
        stage.set_budget(&mut host, "leaves", 3),
        Err(StageError::NotPooled(_))
    ));
    assert!(matches!(
        stage.update_container_bounds(&mut host, "glow", Rect::default()),
        Err(StageError::NotPooled(_))
    ));
}

#[test]
fn test_resize_and_destroy() {
    let scene = SceneConfig::from_toml_str(SCENE).unwrap();
    let mut host = HeadlessScene::new(scene.viewport);
    let mut stage = EffectStage::new();
    stage.mount_scene(&mut host, &scene).unwrap();
    run(&mut stage, &mut host, 30);

    host.resize(Vec2::new(1024.0, 768.0));
    stage.resize(&mut host, Vec2::new(1024.0, 768.0));
    run(&mut stage, &mut host, 30);
    let leaves = stage.get("leaves").unwrap().as_leaves().unwrap().leaf_count();
    assert!((4..=8).contains(&leaves), "leaf count {leaves}");

    stage.unmount(&mut host, "sun").unwrap();
    run(&mut stage, &mut host, 1);
    assert!(!stage.get("flare").unwrap().as_lens_flare().unwrap().is_visible());
    assert!(matches!(
        stage.unmount(&mut host, "sun"),
        Err(StageError::UnknownEffect(_))
    ));

    stage.destroy(&mut host);
    assert!(stage.is_empty());
    assert_eq!(host.node_count(), 0);
}

#[test]
fn test_same_seed_same_frames() {
    let scene = SceneConfig::from_toml_str(SCENE).unwrap();
    let snapshot = || {
        let mut host = HeadlessScene::new(scene.viewport);
        let mut stage = EffectStage::new();
        stage.mount_scene(&mut host, &scene).unwrap();
        run(&mut stage, &mut host, 120);
        serde_json::to_string(&host.snapshot()).unwrap()
    };
    assert_eq!(snapshot(), snapshot());
}

#[test]
fn test_demo_scene_round_trips_through_toml() {
    let demo = SceneConfig::demo();
    let text = demo.to_toml_string().unwrap();
    let parsed = SceneConfig::from_toml_str(&text).unwrap();
    assert_eq!(parsed, demo);
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("scene.toml");
    let demo = SceneConfig::demo();
    demo.save(&path).unwrap();
    assert_eq!(SceneConfig::load(&path).unwrap(), demo);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SceneConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_duplicate_names_in_scene_rejected() {
    let scene = SceneConfig::from_toml_str(
        r#"
        [[effects]]
        name = "a"
        type = "fireflies"

        [[effects]]
        name = "a"
        type = "embers"
        "#,
    )
    .unwrap();
    let mut host = HeadlessScene::new(scene.viewport);
    let mut stage = EffectStage::new();
    assert!(matches!(
        stage.mount_scene(&mut host, &scene),
        Err(StageError::DuplicateName(_))
    ));
    assert!(host.find_by_name("a").is_some());
}
