//! Procedural 2D wind field.
//!
//! Two modes:
//! - **noise**: gusts from two independent smooth value-noise channels drifting
//!   over time, offset by position so neighbouring leaves feel slightly
//!   different air.
//! - **range**: a single wind vector that sweeps between randomly chosen
//!   targets inside a configured box, holds, then sweeps again.
//!
//! Both modes strengthen with altitude (smaller `y`). [`WindField::sample`]
//! only reads state; [`WindField::update`] is the only mutator.

use std::f32::consts::TAU;

use glam::Vec2;
use noise::{NoiseFn, Value};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::random::{rand_range, Range};
use crate::anim::Ease;

/// Pixels to noise-space units for the positional offset
const POSITION_SCALE: f32 = 0.0025;
/// Share of the vertical noise blend that reaches the output
const VERTICAL_FRACTION: f32 = 0.35;
/// Altitude term is clamped to this many "half heights" either side of mid-screen
const ALTITUDE_CLAMP: f32 = 0.35;
/// Horizontal/vertical split of the gust blend
const PRIMARY_WEIGHT: f32 = 0.75;

/// Wind sampling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindMode {
    #[default]
    Noise,
    Range,
}

/// Range-sweep parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeWindConfig {
    /// One corner of the target box (px/s)
    pub from: Vec2,
    /// Opposite corner of the target box (px/s)
    pub to: Vec2,
    /// Sweep duration in seconds
    pub duration: Range,
    /// Hold duration in seconds once a target is reached
    pub hold: Range,
    /// Floor applied to every target's x component
    pub keep_x_min: Option<f32>,
    /// Sweep interpolation (`linear` or `smoothstep`)
    pub ease: Ease,
    /// Jitter amplitude (px/s)
    pub jitter_amplitude: f32,
    /// Jitter frequency (Hz)
    pub jitter_frequency: f32,
}

impl Default for RangeWindConfig {
    fn default() -> Self {
        Self {
            from: Vec2::new(25.0, -8.0),
            to: Vec2::new(110.0, 18.0),
            duration: Range::new(2.5, 6.0),
            hold: Range::new(1.0, 3.5),
            keep_x_min: Some(15.0),
            ease: Ease::Smoothstep,
            jitter_amplitude: 6.0,
            jitter_frequency: 0.7,
        }
    }
}

/// Wind field configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindConfig {
    pub mode: WindMode,
    pub seed: u32,
    /// Mean horizontal wind (px/s, positive = rightwards)
    pub base: f32,
    /// Gust strength added on top of `base`
    pub variance: f32,
    /// Mean vertical drift before scaling (positive = downwards)
    pub vertical_bias: f32,
    /// Noise-time advance per second
    pub gust_speed: f32,
    /// How much altitude strengthens the wind (0..1)
    pub height_influence: f32,
    pub range: RangeWindConfig,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            mode: WindMode::Noise,
            seed: 7,
            base: 60.0,
            variance: 40.0,
            vertical_bias: 10.0,
            gust_speed: 0.35,
            height_influence: 0.4,
            range: RangeWindConfig::default(),
        }
    }
}

/// Multiplier applied to wind at height `y` in a scene of height `scene_height`.
///
/// `1 + influence * (altitude - 0.5)` with altitude measured from the bottom
/// edge, the altitude term clamped to `±0.35`.
pub fn height_factor(y: f32, scene_height: f32, influence: f32) -> f32 {
    if scene_height <= 0.0 {
        return 1.0;
    }
    let altitude = ((scene_height - y) / scene_height).clamp(0.0, 1.0);
    let term = (altitude - 0.5).clamp(-ALTITUDE_CLAMP, ALTITUDE_CLAMP);
    1.0 + influence.clamp(0.0, 1.0) * term
}

enum WindState {
    Noise {
        gust_x: Value,
        gust_y: Value,
        time: f32,
    },
    Range(Sweep),
}

#[derive(Debug, Clone)]
struct Sweep {
    current: Vec2,
    from: Vec2,
    to: Vec2,
    elapsed: f32,
    duration: f32,
    hold_remaining: f32,
    holding: bool,
    jitter_time: f32,
}

/// Procedural wind field
pub struct WindField {
    config: WindConfig,
    state: WindState,
    rng: StdRng,
}

impl std::fmt::Debug for WindField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_struct("WindField");
        d.field("mode", &self.config.mode);
        match &self.state {
            WindState::Noise { time, .. } => d.field("noise_time", time),
            WindState::Range(sweep) => d.field("sweep", sweep),
        };
        d.finish()
    }
}

impl WindField {
    pub fn new(config: WindConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed as u64);
        let state = match config.mode {
            WindMode::Noise => WindState::Noise {
                gust_x: Value::new(config.seed),
                gust_y: Value::new(config.seed.wrapping_add(0x9e37)),
                time: 0.0,
            },
            WindMode::Range => {
                let start = pick_target(&config.range, &mut rng);
                let mut sweep = Sweep {
                    current: start,
                    from: start,
                    to: start,
                    elapsed: 0.0,
                    duration: 0.0,
                    hold_remaining: 0.0,
                    holding: false,
                    jitter_time: 0.0,
                };
                begin_sweep(&mut sweep, &config.range, &mut rng);
                WindState::Range(sweep)
            }
        };

        Self { config, state, rng }
    }

    pub fn config(&self) -> &WindConfig {
        &self.config
    }

    pub fn mode(&self) -> WindMode {
        self.config.mode
    }

    /// Advance noise time or the sweep/hold cycle by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        match &mut self.state {
            WindState::Noise { time, .. } => {
                *time += self.config.gust_speed * dt;
            }
            WindState::Range(sweep) => {
                sweep.jitter_time += dt;
                let range = &self.config.range;

                if sweep.holding {
                    sweep.hold_remaining -= dt;
                    if sweep.hold_remaining <= 0.0 {
                        begin_sweep(sweep, range, &mut self.rng);
                    }
                    return;
                }

                sweep.elapsed += dt;
                let t = if sweep.duration > 0.0 {
                    (sweep.elapsed / sweep.duration).min(1.0)
                } else {
                    1.0
                };
                sweep.current = sweep.from.lerp(sweep.to, range.ease.apply(t));

                if t >= 1.0 {
                    sweep.current = sweep.to;
                    sweep.holding = true;
                    sweep.hold_remaining = range.hold.sample(&mut self.rng);
                }
            }
        }
    }

    /// Instantaneous wind velocity (px/s) at `(x, y)` in a scene `scene_height` tall
    pub fn sample(&self, x: f32, y: f32, scene_height: f32) -> Vec2 {
        let hf = height_factor(y, scene_height, self.config.height_influence);
        match &self.state {
            WindState::Noise {
                gust_x,
                gust_y,
                time,
            } => {
                let nx = gust_x.get([(*time + x * POSITION_SCALE) as f64, 0.5]) as f32;
                let ny = gust_y.get([(*time * 0.8 + y * POSITION_SCALE) as f64, 0.5]) as f32;
                let blend = self.config.variance * (PRIMARY_WEIGHT * nx + (1.0 - PRIMARY_WEIGHT) * ny);

                Vec2::new(
                    (self.config.base + blend) * hf,
                    VERTICAL_FRACTION * (self.config.vertical_bias + self.config.variance * 0.5 * ny),
                )
            }
            WindState::Range(sweep) => {
                let range = &self.config.range;
                let phase = sweep.jitter_time * range.jitter_frequency * TAU;
                let jitter = Vec2::new(phase.sin(), 0.5 * (phase * 1.37 + 1.3).sin())
                    * range.jitter_amplitude;
                sweep.current + jitter * hf
            }
        }
    }

    /// Current swept vector without jitter (range mode only)
    pub fn current_vector(&self) -> Option<Vec2> {
        match &self.state {
            WindState::Range(sweep) => Some(sweep.current),
            WindState::Noise { .. } => None,
        }
    }
}

/// Pick a new sweep target inside the configured box
fn pick_target(range: &RangeWindConfig, rng: &mut StdRng) -> Vec2 {
    let axis = |a: f32, b: f32, rng: &mut StdRng| {
        // Degenerate axis stays constant
        if (a - b).abs() <= f32::EPSILON {
            a
        } else {
            rand_range(rng, a, b)
        }
    };
    let mut target = Vec2::new(
        axis(range.from.x, range.to.x, rng),
        axis(range.from.y, range.to.y, rng),
    );
    if let Some(floor) = range.keep_x_min {
        target.x = target.x.max(floor);
    }
    target
}

fn begin_sweep(sweep: &mut Sweep, range: &RangeWindConfig, rng: &mut StdRng) {
    sweep.from = sweep.current;
    sweep.to = pick_target(range, rng);
    sweep.elapsed = 0.0;
    sweep.duration = range.duration.sample(rng).max(0.0);
    sweep.holding = false;
    sweep.hold_remaining = 0.0;
    tracing::debug!(from = ?sweep.from, to = ?sweep.to, duration = sweep.duration, "Wind sweep retargeted");
}
