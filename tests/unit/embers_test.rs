//! Unit tests for the ember pool

use atmosfx::effects::embers::{EmberPool, EmbersConfig};
use atmosfx::geometry::Rect;
use atmosfx::host::headless::HeadlessScene;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn pool(scene: &mut HeadlessScene, pool_size: usize, budget: usize) -> EmberPool {
    EmberPool::new(
        scene,
        "embers",
        EmbersConfig {
            pool_size,
            budget,
            ..Default::default()
        },
        StdRng::seed_from_u64(21),
    )
}

#[test]
fn test_shrinking_budget_hides_most_recent() {
    let mut scene = HeadlessScene::new(Vec2::new(800.0, 600.0));
    let mut embers = pool(&mut scene, 10, 0);

    embers.set_budget(&mut scene, 5);
    let activated: Vec<usize> = embers.active_indices().to_vec();
    assert_eq!(activated.len(), 5);

    embers.set_budget(&mut scene, 2);
    assert_eq!(embers.visible_count(), 2);
    assert_eq!(embers.active_indices(), &activated[..2]);
    for &index in &activated[2..] {
        assert!(!embers.is_visible(index));
    }
    assert_eq!(embers.pool_size(), 10);
    assert_eq!(scene.visible_count(embers.node()), 2);
}

#[test]
fn test_budget_invariant_over_sequence() {
    let mut scene = HeadlessScene::new(Vec2::new(800.0, 600.0));
    let mut embers = pool(&mut scene, 12, 0);

    for &n in &[3usize, 9, 0, 40, 7, 12, 1] {
        embers.set_budget(&mut scene, n);
        for _ in 0..30 {
            embers.update(&mut scene, 1.0 / 60.0);
        }
        assert_eq!(embers.visible_count(), n.min(12));
        assert_eq!(embers.active_indices().len(), n.min(12));
    }
}

#[test]
fn test_initial_budget_waits_for_bounds() {
    let mut scene = HeadlessScene::new(Vec2::new(800.0, 600.0));
    let mut embers = pool(&mut scene, 20, 8);
    assert_eq!(embers.visible_count(), 0);

    embers.update_container_bounds(&mut scene, Rect::new(0.0, 0.0, 800.0, 600.0));
    assert_eq!(embers.visible_count(), 8);

    // Later bounds updates do not re-apply the initial budget
    embers.set_budget(&mut scene, 3);
    embers.update_container_bounds(&mut scene, Rect::new(0.0, 0.0, 1024.0, 768.0));
    assert_eq!(embers.visible_count(), 3);
}

#[test]
fn test_embers_rise_over_a_cycle() {
    let mut scene = HeadlessScene::new(Vec2::new(800.0, 600.0));
    let mut embers = pool(&mut scene, 4, 4);
    embers.set_budget(&mut scene, 1);
    let index = embers.active_indices()[0];
    let cycle = *embers.cycle(index).unwrap();

    assert!(cycle.position(1.0).y < cycle.position(0.0).y);
    assert!(cycle.scale(1.0) < cycle.scale(0.0));

    // Runs well past one cycle; the ember restarts and stays visible
    for _ in 0..300 {
        embers.update(&mut scene, 1.0 / 60.0);
    }
    assert!(embers.is_visible(index));
    assert!(embers.cycle(index).is_some());
}

#[test]
fn test_budget_after_destroy_is_ignored() {
    let mut scene = HeadlessScene::new(Vec2::new(800.0, 600.0));
    let mut embers = pool(&mut scene, 10, 5);
    embers.update_container_bounds(&mut scene, Rect::new(0.0, 0.0, 800.0, 600.0));
    embers.destroy(&mut scene);

    embers.set_budget(&mut scene, 8);
    for _ in 0..60 {
        embers.update(&mut scene, 1.0 / 60.0);
    }
    assert_eq!(embers.visible_count(), 0);
    assert_eq!(scene.node_count(), 0);
}
