//! Firefly swarm.
//!
//! A fixed set of glow points wander with trig functions of their own seed
//! and position (the position feedback keeps the paths from looking
//! periodic) and wrap around a toroidal area. Alpha pulses run as
//! independent looping tweens set up once at construction.

use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::random::{rand_range, Range};
use crate::anim::{Ease, Repeat, Tween, TweenEvent, TweenScheduler, Tweens};
use crate::host::texture::{ensure_texture, TextureKey};
use crate::host::{BlendMode, NodeId, NodeSpec, SceneHost, Shape};

/// Budget units per visible firefly
const BUDGET_DIVISOR: usize = 8;
const MIN_VISIBLE: usize = 8;
const MAX_VISIBLE: usize = 80;
/// How strongly position feeds back into the wander direction
const POSITION_FEEDBACK: f32 = 0.012;

/// Firefly swarm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirefliesConfig {
    pub count: usize,
    /// Width and height of the wrap area, centered on `center`
    pub area: Vec2,
    pub center: Vec2,
    /// Wander speed (px/s)
    pub speed: f32,
    /// Glow radius (px)
    pub radius: f32,
    pub color: Vec3,
    /// Pulse alpha range
    pub alpha: Range,
    /// Seconds for one half of a pulse
    pub pulse_period: Range,
    pub depth: i32,
}

impl Default for FirefliesConfig {
    fn default() -> Self {
        Self {
            count: 40,
            area: Vec2::new(800.0, 400.0),
            center: Vec2::new(400.0, 360.0),
            speed: 18.0,
            radius: 5.0,
            color: Vec3::new(0.85, 1.0, 0.45),
            alpha: Range::new(0.15, 0.95),
            pulse_period: Range::new(1.2, 2.4),
            depth: 25,
        }
    }
}

/// Number of visible fireflies for a budget
pub fn visible_for_budget(budget: usize) -> usize {
    (budget / BUDGET_DIVISOR).clamp(MIN_VISIBLE, MAX_VISIBLE)
}

/// Wrap a coordinate into `[-extent/2, extent/2)`
pub fn wrap_axis(value: f32, extent: f32) -> f32 {
    if extent <= 0.0 {
        return 0.0;
    }
    let half = extent * 0.5;
    if (-half..=half).contains(&value) {
        return value;
    }
    (value + half).rem_euclid(extent) - half
}

/// One wandering glow point
#[derive(Debug, Clone)]
pub struct Firefly {
    /// Position relative to the swarm center
    pub position: Vec2,
    pub seed: f32,
    pub visible: bool,
    node: NodeId,
}

impl Firefly {
    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// Firefly swarm effect
pub struct SwarmSystem {
    config: FirefliesConfig,
    root: NodeId,
    points: Vec<Firefly>,
    tweens: Box<dyn TweenScheduler<usize>>,
    events: Vec<TweenEvent<usize>>,
}

impl std::fmt::Debug for SwarmSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwarmSystem")
            .field("count", &self.points.len())
            .field("visible", &self.visible_count())
            .finish()
    }
}

impl SwarmSystem {
    pub fn new(host: &mut dyn SceneHost, name: &str, config: FirefliesConfig, rng: StdRng) -> Self {
        Self::with_scheduler(host, name, config, rng, Box::new(Tweens::new()))
    }

    pub fn with_scheduler(
        host: &mut dyn SceneHost,
        name: &str,
        config: FirefliesConfig,
        mut rng: StdRng,
        mut tweens: Box<dyn TweenScheduler<usize>>,
    ) -> Self {
        let root = host.spawn(
            NodeSpec::container()
                .named(name)
                .at(config.center)
                .depth(config.depth),
        );
        let texture = ensure_texture(
            host,
            TextureKey::Glow {
                radius: config.radius.max(1.0).round() as u32,
            },
        );
        let size = Vec2::splat(config.radius.max(1.0) * 2.0);
        let half = config.area * 0.5;

        let mut points = Vec::with_capacity(config.count);
        for index in 0..config.count {
            let position = Vec2::new(
                rand_range(&mut rng, -half.x, half.x),
                rand_range(&mut rng, -half.y, half.y),
            );
            let node = host.spawn(
                NodeSpec::new(Shape::Image {
                    texture: texture.clone(),
                    size,
                })
                .child_of(root)
                .at(position)
                .color(config.color)
                .blend(BlendMode::Add)
                .alpha(config.alpha.min),
            );

            let period = config.pulse_period.sample(&mut rng).max(0.05);
            tweens.schedule(
                index,
                Tween::new(period)
                    .ease(Ease::SineInOut)
                    .yoyo(true)
                    .repeat(Repeat::Forever),
            );

            points.push(Firefly {
                position,
                seed: rand_range(&mut rng, 0.0, 1000.0),
                visible: true,
                node,
            });
        }

        tracing::debug!(name, count = points.len(), "Firefly swarm created");

        Self {
            config,
            root,
            points,
            tweens,
            events: Vec::new(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.root
    }

    pub fn points(&self) -> &[Firefly] {
        &self.points
    }

    pub fn visible_count(&self) -> usize {
        self.points.iter().filter(|p| p.visible).count()
    }

    /// Show the first `clamp(n / 8, 8, 80)` points; never creates or destroys points
    pub fn set_budget(&mut self, host: &mut dyn SceneHost, n: usize) {
        let visible = visible_for_budget(n).min(self.points.len());
        for (i, point) in self.points.iter_mut().enumerate() {
            point.visible = i < visible;
            host.set_visible(point.node, point.visible);
        }
        tracing::debug!(budget = n, visible, "Firefly budget set");
    }

    /// Wander every point and apply pulse progress
    pub fn update(&mut self, host: &mut dyn SceneHost, elapsed: f32, dt: f32) {
        let speed = self.config.speed;
        let area = self.config.area;

        for point in &mut self.points {
            let s = point.seed;
            let dir = Vec2::new(
                (elapsed * 0.6 + s + point.position.y * POSITION_FEEDBACK).sin(),
                (elapsed * 0.5 + s * 1.3 + point.position.x * POSITION_FEEDBACK).cos(),
            );
            point.position += dir * speed * dt;
            point.position.x = wrap_axis(point.position.x, area.x);
            point.position.y = wrap_axis(point.position.y, area.y);
            host.set_position(point.node, point.position);
        }

        self.events.clear();
        self.tweens.advance(dt, &mut self.events);
        for event in &self.events {
            if let Some(point) = self.points.get(event.key) {
                host.set_alpha(point.node, self.config.alpha.lerp(event.progress));
            }
        }
    }

    /// Move the swarm origin
    pub fn set_center(&mut self, host: &mut dyn SceneHost, center: Vec2) {
        self.config.center = center;
        host.set_position(self.root, center);
    }

    pub fn destroy(&mut self, host: &mut dyn SceneHost) {
        self.tweens.clear();
        host.despawn(self.root);
        self.points.clear();
    }
}
