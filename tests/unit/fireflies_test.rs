//! Unit tests for the firefly swarm

use atmosfx::effects::fireflies::{visible_for_budget, wrap_axis, FirefliesConfig, SwarmSystem};
use atmosfx::host::headless::HeadlessScene;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_boundary_value_is_stable() {
    let mut x = 50.0;
    for _ in 0..100 {
        x = wrap_axis(x, 100.0);
        assert!((-50.0..=50.0).contains(&x));
    }
    assert_eq!(x, 50.0);
}

#[test]
fn test_points_stay_inside_area() {
    let mut scene = HeadlessScene::new(Vec2::new(800.0, 600.0));
    let area = Vec2::new(100.0, 60.0);
    let mut swarm = SwarmSystem::new(
        &mut scene,
        "fireflies",
        FirefliesConfig {
            count: 30,
            area,
            speed: 400.0,
            ..Default::default()
        },
        StdRng::seed_from_u64(13),
    );

    let dt = 1.0 / 30.0;
    for frame in 0..900 {
        swarm.update(&mut scene, frame as f32 * dt, dt);
        for point in swarm.points() {
            assert!(point.position.x.abs() <= area.x * 0.5 + 1e-3);
            assert!(point.position.y.abs() <= area.y * 0.5 + 1e-3);
        }
    }
}

#[test]
fn test_budget_never_changes_point_count() {
    let mut scene = HeadlessScene::new(Vec2::new(800.0, 600.0));
    let mut swarm = SwarmSystem::new(
        &mut scene,
        "fireflies",
        FirefliesConfig {
            count: 100,
            ..Default::default()
        },
        StdRng::seed_from_u64(1),
    );
    for &n in &[0usize, 64, 400, 10_000] {
        swarm.set_budget(&mut scene, n);
        assert_eq!(swarm.points().len(), 100);
        assert_eq!(swarm.visible_count(), visible_for_budget(n));
        assert_eq!(scene.visible_count(swarm.node()), visible_for_budget(n));
    }
}
