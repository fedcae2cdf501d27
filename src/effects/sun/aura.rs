//! Aura wisps: wobbling translucent rings drifting off the sun's disk.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::SunTween;
use crate::anim::{Ease, Tween, TweenScheduler};
use crate::effects::random::{rand_range, Range};
use crate::host::{BlendMode, NodeId, NodeSpec, SceneHost, Shape};

/// Noise-space radius of the ring sampling circle
const RING_NOISE_SCALE: f64 = 1.3;
/// How fast the edge wiggle evolves (noise units per second)
const WIGGLE_SPEED: f64 = 0.9;
/// Spawn catch-up limit per frame
const MAX_SPAWNS_PER_FRAME: usize = 4;

/// Aura wisp configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuraConfig {
    pub enabled: bool,
    /// Wisps per second
    pub rate: f32,
    /// Lifetime in seconds
    pub life: Range,
    /// Ring radii as multiples of the sun radius
    pub outer_radius: f32,
    pub inner_radius: f32,
    /// Vertices per ring
    pub edges: usize,
    /// Relative radial jitter amplitude
    pub jitter: f32,
    /// Degrees per second, sign picked at random
    pub rotation_speed: Range,
    pub alpha: Range,
    /// Final scale at end of life
    pub scale_to: f32,
    pub color: Vec3,
    pub blend: BlendMode,
}

impl Default for AuraConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: 1.5,
            life: Range::new(1.6, 3.2),
            outer_radius: 1.0,
            inner_radius: 0.72,
            edges: 28,
            jitter: 0.08,
            rotation_speed: Range::new(10.0, 35.0),
            alpha: Range::new(0.12, 0.3),
            scale_to: 1.25,
            color: Vec3::new(1.0, 0.8, 0.45),
            blend: BlendMode::Screen,
        }
    }
}

#[derive(Debug, Clone)]
struct Wisp {
    id: u64,
    node: NodeId,
    life: f32,
    rotation: f32,
    /// Radians per second
    rotation_speed: f32,
    start_alpha: f32,
    noise_offset: f64,
}

/// Spawns and animates aura wisps
pub struct AuraEmitter {
    config: AuraConfig,
    noise: Perlin,
    wisps: Vec<Wisp>,
    accumulator: f32,
    next_id: u64,
}

impl std::fmt::Debug for AuraEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuraEmitter")
            .field("alive", &self.wisps.len())
            .field("accumulator", &self.accumulator)
            .finish()
    }
}

impl AuraEmitter {
    pub fn new(config: AuraConfig, seed: u32) -> Self {
        Self {
            config,
            noise: Perlin::new(seed),
            wisps: Vec::new(),
            accumulator: 0.0,
            next_id: 1,
        }
    }

    pub fn alive(&self) -> usize {
        self.wisps.len()
    }

    /// Advance the spawn timer; returns how many wisps are due this frame
    pub fn tick(&mut self, dt: f32) -> usize {
        if !self.config.enabled || self.config.rate <= 0.0 {
            return 0;
        }
        let interval = 1.0 / self.config.rate;
        self.accumulator += dt.max(0.0);

        let mut due = 0;
        while self.accumulator >= interval && due < MAX_SPAWNS_PER_FRAME {
            self.accumulator -= interval;
            due += 1;
        }
        // Drop any backlog beyond the catch-up limit
        self.accumulator = self.accumulator.min(interval);
        due
    }

    /// Create one wisp under `layer` and schedule its life tween
    pub fn spawn(
        &mut self,
        host: &mut dyn SceneHost,
        layer: NodeId,
        sun_radius: f32,
        rng: &mut StdRng,
        tweens: &mut dyn TweenScheduler<SunTween>,
    ) {
        let id = self.next_id;
        self.next_id += 1;

        let sign = if rand_range(rng, -1.0, 1.0) < 0.0 { -1.0 } else { 1.0 };
        let mut wisp = Wisp {
            id,
            node: NodeId(0),
            life: self.config.life.sample(rng).max(0.05),
            rotation: rand_range(rng, 0.0, TAU),
            rotation_speed: sign * self.config.rotation_speed.sample(rng).to_radians(),
            start_alpha: self.config.alpha.sample(rng).clamp(0.0, 1.0),
            noise_offset: rand_range(rng, 0.0, 512.0) as f64,
        };

        let points = self.ring_polygon(&wisp, sun_radius, 0.0);
        wisp.node = host.spawn(
            NodeSpec::new(Shape::Polygon { points })
                .child_of(layer)
                .color(self.config.color)
                .alpha(wisp.start_alpha)
                .blend(self.config.blend),
        );
        host.set_rotation(wisp.node, wisp.rotation);

        tweens.schedule(SunTween::Wisp(id), Tween::new(wisp.life).ease(Ease::QuadOut));
        tracing::trace!(id, life = wisp.life, "Aura wisp spawned");
        self.wisps.push(wisp);
    }

    /// Apply a life-tween progress report; the wisp self-destructs when finished
    pub fn on_progress(
        &mut self,
        host: &mut dyn SceneHost,
        id: u64,
        sun_radius: f32,
        progress: f32,
        finished: bool,
    ) {
        let Some(index) = self.wisps.iter().position(|w| w.id == id) else {
            return;
        };

        if finished {
            let wisp = self.wisps.swap_remove(index);
            host.despawn(wisp.node);
            return;
        }

        let wisp = &self.wisps[index];
        let age = wisp.life * progress;
        let points = self.ring_polygon(wisp, sun_radius, age);
        let (node, rotation, alpha) = (
            wisp.node,
            wisp.rotation + wisp.rotation_speed * age,
            wisp.start_alpha * (1.0 - progress),
        );

        host.set_polygon(node, &points);
        host.set_rotation(node, rotation);
        host.set_alpha(node, alpha);
        host.set_scale(node, 1.0 + (self.config.scale_to - 1.0) * progress);
    }

    /// Remove every wisp node (tweens are cleared by the owner)
    pub fn clear(&mut self, host: &mut dyn SceneHost) {
        for wisp in self.wisps.drain(..) {
            host.despawn(wisp.node);
        }
        self.accumulator = 0.0;
    }

    /// Closed outline: the jittered outer ring followed by the jittered inner ring reversed
    fn ring_polygon(&self, wisp: &Wisp, sun_radius: f32, age: f32) -> Vec<Vec2> {
        let edges = self.config.edges.max(3);
        let outer = self.config.outer_radius.max(self.config.inner_radius) * sun_radius;
        let inner = self.config.outer_radius.min(self.config.inner_radius) * sun_radius;
        let t = age as f64 * WIGGLE_SPEED;

        let ring = |radius: f32, lane: f64| {
            (0..edges).map(move |i| {
                let a = i as f32 / edges as f32 * TAU;
                let (s, c) = a.sin_cos();
                let n = self.noise.get([
                    c as f64 * RING_NOISE_SCALE + wisp.noise_offset,
                    s as f64 * RING_NOISE_SCALE + lane,
                    t,
                ]) as f32;
                Vec2::new(c, s) * radius * (1.0 + self.config.jitter * n)
            })
        };

        let mut points: Vec<Vec2> = ring(outer, 0.0).collect();
        let inner_ring: Vec<Vec2> = ring(inner, 17.0).collect();
        points.extend(inner_ring.into_iter().rev());
        points
    }
}
