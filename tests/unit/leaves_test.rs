//! Unit tests for the falling-leaves system

use atmosfx::effects::leaves::{
    integrate, leaf_mass, LeafPhysicsConfig, LeafPhysicsMode, LeafSpawnConfig, LeafSystem,
    LeavesConfig,
};
use atmosfx::effects::random::Range;
use atmosfx::host::headless::HeadlessScene;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn scene() -> HeadlessScene {
    HeadlessScene::new(Vec2::new(1280.0, 720.0))
}

#[test]
fn test_single_leaf_after_initial_delay() {
    let mut scene = scene();
    let config = LeavesConfig {
        spawn: LeafSpawnConfig {
            max: 1,
            start_filled: false,
            initial_delay: Range::new(0.0, 0.8),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut leaves = LeafSystem::new(&mut scene, "leaves", config, StdRng::seed_from_u64(11));
    assert_eq!(leaves.leaf_count(), 0);

    let dt = 1.0 / 60.0;
    let mut elapsed = 0.0;
    while elapsed < 0.8 + dt {
        leaves.update(&mut scene, dt);
        elapsed += dt;
    }
    assert_eq!(leaves.leaf_count(), 1);

    for _ in 0..600 {
        leaves.update(&mut scene, dt);
        assert_eq!(leaves.leaf_count(), 1);
    }
    assert_eq!(scene.children_of(leaves.node()).len(), 1);
}

#[test]
fn test_population_and_mass_invariants() {
    let mut scene = scene();
    let config = LeavesConfig {
        spawn: LeafSpawnConfig {
            max: 6,
            start_filled: true,
            interval: Range::new(0.05, 0.1),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut leaves = LeafSystem::new(&mut scene, "leaves", config, StdRng::seed_from_u64(2));
    assert_eq!(leaves.leaf_count(), 3);

    for _ in 0..1800 {
        leaves.update(&mut scene, 1.0 / 60.0);
        assert!(leaves.leaf_count() <= 6);
        for leaf in leaves.leaves() {
            assert!(leaf.size > 0.0);
            assert!((leaf.mass - leaf_mass(leaf.size)).abs() < 1e-6);
            assert!(leaf.mass >= 0.6);
        }
    }
    assert_eq!(leaves.leaf_count(), 6);
}

#[test]
fn test_leaves_fall_in_still_air() {
    let mut scene = scene();
    let mut leaves = LeafSystem::new(
        &mut scene,
        "leaves",
        LeavesConfig {
            spawn: LeafSpawnConfig {
                max: 4,
                start_filled: true,
                burst: Some(4),
                ..Default::default()
            },
            ..Default::default()
        },
        StdRng::seed_from_u64(4),
    );
    let mut leaf = leaves.leaves()[0].clone();
    let physics = LeafPhysicsConfig::default();
    let y0 = leaf.position.y;
    for _ in 0..60 {
        integrate(&mut leaf, Vec2::ZERO, &physics, 1.0 / 60.0);
    }
    assert!(leaf.position.y > y0);
    assert!(leaf.velocity.y <= physics.terminal_vy + 1e-3);

    leaves.destroy(&mut scene);
    assert_eq!(scene.node_count(), 0);
}

#[test]
fn test_drag_mode_follows_wind() {
    let mut scene = scene();
    let leaves = LeafSystem::new(
        &mut scene,
        "leaves",
        LeavesConfig {
            spawn: LeafSpawnConfig {
                max: 1,
                start_filled: true,
                burst: Some(1),
                ..Default::default()
            },
            ..Default::default()
        },
        StdRng::seed_from_u64(8),
    );
    let mut leaf = leaves.leaves()[0].clone();
    leaf.velocity = Vec2::ZERO;
    let physics = LeafPhysicsConfig {
        mode: LeafPhysicsMode::Drag2,
        ..Default::default()
    };
    for _ in 0..240 {
        integrate(&mut leaf, Vec2::new(120.0, 0.0), &physics, 1.0 / 60.0);
    }
    assert!(leaf.velocity.x > 60.0, "vx was {}", leaf.velocity.x);
}

#[test]
fn test_update_after_destroy_spawns_nothing() {
    let mut scene = scene();
    let mut leaves = LeafSystem::new(&mut scene, "leaves", LeavesConfig::default(), StdRng::seed_from_u64(6));
    leaves.destroy(&mut scene);

    for _ in 0..120 {
        leaves.update(&mut scene, 1.0 / 60.0);
    }
    assert_eq!(leaves.leaf_count(), 0);
    assert_eq!(scene.node_count(), 0);
}
