//! Unit tests for the wind field

use atmosfx::effects::wind::{height_factor, RangeWindConfig, WindConfig, WindField, WindMode};
use glam::Vec2;

#[test]
fn test_calm_noise_wind_is_constant() {
    let mut wind = WindField::new(WindConfig {
        mode: WindMode::Noise,
        base: 60.0,
        variance: 0.0,
        height_influence: 0.0,
        ..Default::default()
    });

    for step in 0..200 {
        wind.update(0.05);
        for &(x, y) in &[(0.0, 0.0), (640.0, 360.0), (1279.0, 719.0), (-50.0, 900.0)] {
            let v = wind.sample(x + step as f32, y, 720.0);
            assert!((v.x - 60.0).abs() < 1e-4, "x was {}", v.x);
        }
    }
}

#[test]
fn test_noise_gusts_stay_within_variance() {
    let mut wind = WindField::new(WindConfig {
        base: 50.0,
        variance: 20.0,
        height_influence: 0.0,
        ..Default::default()
    });
    for _ in 0..500 {
        wind.update(0.1);
        let v = wind.sample(300.0, 300.0, 600.0);
        assert!(v.x >= 30.0 - 1e-3 && v.x <= 70.0 + 1e-3, "x was {}", v.x);
    }
}

#[test]
fn test_range_wind_respects_x_floor() {
    let config = WindConfig {
        mode: WindMode::Range,
        height_influence: 0.0,
        range: RangeWindConfig {
            from: Vec2::new(5.0, -5.0),
            to: Vec2::new(40.0, 5.0),
            keep_x_min: Some(15.0),
            jitter_amplitude: 0.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut wind = WindField::new(config);

    for _ in 0..2000 {
        wind.update(1.0 / 30.0);
        let v = wind.sample(100.0, 100.0, 600.0);
        assert!(v.x >= 15.0 - 1e-4, "x was {}", v.x);
        assert!(v.y >= -5.0 - 1e-4 && v.y <= 5.0 + 1e-4);
    }
}

#[test]
fn test_range_wind_eventually_moves() {
    let config = WindConfig {
        mode: WindMode::Range,
        seed: 3,
        range: RangeWindConfig {
            jitter_amplitude: 0.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut wind = WindField::new(config);
    let start = wind.current_vector().unwrap();
    let mut moved = false;
    for _ in 0..600 {
        wind.update(0.05);
        if (wind.current_vector().unwrap() - start).length() > 1.0 {
            moved = true;
            break;
        }
    }
    assert!(moved);
}

#[test]
fn test_height_factor_symmetry() {
    let up = height_factor(100.0, 600.0, 0.8) - 1.0;
    let down = height_factor(500.0, 600.0, 0.8) - 1.0;
    assert!((up + down).abs() < 1e-5);
    assert!(up > 0.0);
}

#[test]
fn test_range_vector_holds_between_sweeps() {
    let mut wind = WindField::new(WindConfig {
        mode: WindMode::Range,
        range: RangeWindConfig {
            from: Vec2::new(20.0, -5.0),
            to: Vec2::new(90.0, 15.0),
            duration: atmosfx::effects::random::Range::new(1.0, 1.0),
            hold: atmosfx::effects::random::Range::new(2.0, 2.0),
            keep_x_min: None,
            jitter_amplitude: 0.0,
            ..Default::default()
        },
        ..Default::default()
    });

    // One full sweep lands on the target and starts the hold
    wind.update(1.0);
    let held = wind.current_vector().unwrap();

    for _ in 0..3 {
        wind.update(0.5);
        assert_eq!(wind.current_vector().unwrap(), held);
        assert_eq!(wind.sample(100.0, 300.0, 600.0), held);
    }

    // Hold expires; the next sweep starts from the held vector
    wind.update(0.5);
    assert_eq!(wind.current_vector().unwrap(), held);
    wind.update(0.5);
    assert_ne!(wind.current_vector().unwrap(), held);
}
