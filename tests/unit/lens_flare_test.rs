//! Unit tests for the lens flare

use atmosfx::effects::lens_flare::{FlareElement, LensFlareConfig, LensFlareSystem, OCCLUDED_FACTOR};
use atmosfx::effects::sun::{SunConfig, SunMotion, SunSystem};
use atmosfx::host::headless::HeadlessScene;
use atmosfx::host::{NodeSpec, SceneHost, Shape};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn scene_with_sun(position: Vec2) -> (HeadlessScene, SunSystem) {
    let mut scene = HeadlessScene::new(Vec2::new(800.0, 600.0));
    let sun = SunSystem::new(
        &mut scene,
        "sun",
        SunConfig {
            motion: SunMotion::Static { position },
            ..Default::default()
        },
        StdRng::seed_from_u64(1),
    );
    (scene, sun)
}

fn flare_config(offset: f32, occluders: Vec<String>) -> LensFlareConfig {
    LensFlareConfig {
        elements: vec![FlareElement {
            offset,
            alpha: 0.8,
            ..Default::default()
        }],
        global_alpha: 1.0,
        falloff: 0.6,
        occluders,
        ..Default::default()
    }
}

#[test]
fn test_element_lands_opposite_the_source() {
    let source = Vec2::new(150.0, 220.0);
    let (mut scene, _sun) = scene_with_sun(source);
    let mut flare = LensFlareSystem::new(&mut scene, "flare", flare_config(1.0, Vec::new()));
    flare.update(&mut scene, 0.0);

    let center = Vec2::new(400.0, 300.0);
    let state = flare.elements_state()[0];
    assert!(flare.is_visible());
    assert!(state.position.x > center.x);
    assert!(((state.position - center).length() - (source - center).length()).abs() < 1e-3);
}

#[test]
fn test_occluder_dims_by_fixed_factor() {
    let (mut scene, _sun) = scene_with_sun(Vec2::new(100.0, 300.0));
    scene.spawn(
        NodeSpec::new(Shape::Rect {
            size: Vec2::new(20.0, 200.0),
        })
        .named("tree")
        .at(Vec2::new(250.0, 300.0)),
    );

    let mut clear = LensFlareSystem::new(&mut scene, "flare_clear", flare_config(1.0, Vec::new()));
    let mut blocked = LensFlareSystem::new(
        &mut scene,
        "flare_blocked",
        flare_config(1.0, vec!["tree".to_string()]),
    );
    clear.update(&mut scene, 0.5);
    blocked.update(&mut scene, 0.5);

    let a = clear.elements_state()[0];
    let b = blocked.elements_state()[0];
    assert!(!a.occluded);
    assert!(b.occluded);
    assert!(a.alpha > 0.0);
    assert!((b.alpha - a.alpha * OCCLUDED_FACTOR).abs() < 1e-6);
}

#[test]
fn test_occluder_off_the_line_has_no_effect() {
    let (mut scene, _sun) = scene_with_sun(Vec2::new(100.0, 300.0));
    scene.spawn(
        NodeSpec::new(Shape::Rect {
            size: Vec2::new(20.0, 20.0),
        })
        .named("rock")
        .at(Vec2::new(250.0, 550.0)),
    );
    let mut flare = LensFlareSystem::new(&mut scene, "flare", flare_config(1.0, vec!["rock".to_string()]));
    flare.update(&mut scene, 0.0);
    assert!(!flare.elements_state()[0].occluded);
}

#[test]
fn test_flare_follows_source_lifecycle() {
    let (mut scene, mut sun) = scene_with_sun(Vec2::new(100.0, 100.0));
    let mut flare = LensFlareSystem::new(&mut scene, "flare", flare_config(1.4, Vec::new()));

    flare.update(&mut scene, 0.0);
    assert!(flare.is_visible());

    sun.destroy(&mut scene);
    flare.update(&mut scene, 0.1);
    assert!(!flare.is_visible());
    assert!(!scene.is_effectively_visible(flare.node()));

    let _sun = SunSystem::new(&mut scene, "sun", SunConfig::default(), StdRng::seed_from_u64(2));
    flare.update(&mut scene, 0.2);
    assert!(flare.is_visible());
}

#[test]
fn test_occlusion_ratio_holds_when_alpha_saturates() {
    let (mut scene, _sun) = scene_with_sun(Vec2::new(100.0, 300.0));
    scene.spawn(
        NodeSpec::new(Shape::Rect {
            size: Vec2::new(20.0, 200.0),
        })
        .named("tree")
        .at(Vec2::new(250.0, 300.0)),
    );

    let bright = |occluders: Vec<String>| LensFlareConfig {
        elements: vec![FlareElement {
            offset: 1.0,
            alpha: 1.0,
            ..Default::default()
        }],
        global_alpha: 2.0,
        falloff: 0.0,
        occluders,
        ..Default::default()
    };
    let mut clear = LensFlareSystem::new(&mut scene, "flare_clear", bright(Vec::new()));
    let mut blocked = LensFlareSystem::new(&mut scene, "flare_blocked", bright(vec!["tree".to_string()]));
    clear.update(&mut scene, 0.0);
    blocked.update(&mut scene, 0.0);

    let a = clear.elements_state()[0].alpha;
    let b = blocked.elements_state()[0].alpha;
    assert!((a - 1.0).abs() < 1e-6);
    assert!((b - OCCLUDED_FACTOR).abs() < 1e-6);
}

#[test]
fn test_update_after_destroy_does_not_panic() {
    let (mut scene, _sun) = scene_with_sun(Vec2::new(100.0, 300.0));
    let mut flare = LensFlareSystem::new(&mut scene, "flare", flare_config(1.0, Vec::new()));
    flare.destroy(&mut scene);
    flare.update(&mut scene, 0.0);
    assert!(!flare.is_visible());
    assert!(scene.find_by_name("flare").is_none());
}
