//! Unit tests for the sun system

use std::f32::consts::{FRAC_PI_2, PI};

use atmosfx::effects::sun::aura::AuraConfig;
use atmosfx::effects::sun::speckle::SpeckleConfig;
use atmosfx::effects::sun::{SunConfig, SunMotion, SunSystem};
use atmosfx::host::headless::HeadlessScene;
use atmosfx::host::SceneHost;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn circular(clockwise: bool) -> SunConfig {
    SunConfig {
        motion: SunMotion::Circular {
            center: Vec2::new(400.0, 300.0),
            radius: 200.0,
            angular_speed_deg: 90.0,
            phase_deg: 0.0,
            clockwise,
        },
        aura: AuraConfig {
            enabled: false,
            ..Default::default()
        },
        speckle: SpeckleConfig {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn test_clockwise_quarter_turn_in_one_second() {
    let mut scene = HeadlessScene::new(Vec2::new(800.0, 600.0));
    let mut sun = SunSystem::new(&mut scene, "sun", circular(true), StdRng::seed_from_u64(1));
    let initial = sun.theta();

    for _ in 0..4 {
        sun.update(&mut scene, 0.25);
    }

    assert!((sun.theta() - initial - FRAC_PI_2).abs() < 1e-5);
    // y-down screen: a clockwise quarter turn from the right ends below the center
    assert!((sun.center() - Vec2::new(400.0, 500.0)).length() < 1e-3);
    assert_eq!(scene.world_position(sun.node()), Some(sun.center()));
}

#[test]
fn test_counter_clockwise_turns_the_other_way() {
    let mut scene = HeadlessScene::new(Vec2::new(800.0, 600.0));
    let mut sun = SunSystem::new(&mut scene, "sun", circular(false), StdRng::seed_from_u64(1));

    for _ in 0..60 {
        sun.update(&mut scene, 1.0 / 60.0);
    }

    assert!((sun.theta() - 3.0 * PI / 2.0).abs() < 1e-3);
    assert!((sun.center() - Vec2::new(400.0, 100.0)).length() < 0.05);
}

#[test]
fn test_speckle_respects_max_alive() {
    let mut scene = HeadlessScene::new(Vec2::new(800.0, 600.0));
    let config = SunConfig {
        speckle: SpeckleConfig {
            rate: 60.0,
            max_alive: 5,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut sun = SunSystem::new(&mut scene, "sun", config, StdRng::seed_from_u64(4));

    for _ in 0..240 {
        sun.update(&mut scene, 1.0 / 60.0);
        assert!(sun.alive_speckles() <= 5);
    }
    assert!(sun.alive_speckles() > 0);
}

#[test]
fn test_destroy_unregisters_name() {
    let mut scene = HeadlessScene::new(Vec2::new(800.0, 600.0));
    let mut sun = SunSystem::new(&mut scene, "sun", SunConfig::default(), StdRng::seed_from_u64(4));
    for _ in 0..30 {
        sun.update(&mut scene, 1.0 / 60.0);
    }
    sun.destroy(&mut scene);
    assert!(scene.find_by_name("sun").is_none());
    assert_eq!(scene.node_count(), 0);
}

#[test]
fn test_update_after_destroy_spawns_nothing() {
    let mut scene = HeadlessScene::new(Vec2::new(800.0, 600.0));
    let mut sun = SunSystem::new(&mut scene, "sun", SunConfig::default(), StdRng::seed_from_u64(5));
    sun.destroy(&mut scene);

    for _ in 0..120 {
        sun.update(&mut scene, 1.0 / 60.0);
    }
    sun.resize(&mut scene, Vec2::new(1024.0, 768.0));
    assert_eq!(sun.alive_speckles(), 0);
    assert_eq!(sun.alive_wisps(), 0);
    assert_eq!(scene.node_count(), 0);
}
