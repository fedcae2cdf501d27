//! Pooled rising embers.
//!
//! A fixed pool of particles is allocated up front; a budget decides how many
//! are visible. Each visible ember runs one tween per cycle (rise, sway,
//! shrink and fade) and restarts itself on completion while it is still
//! visible. There is no per-frame integration: the tween is the only source
//! of ember motion.

use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::random::{rand_range, Range};
use crate::anim::{Ease, Tween, TweenEvent, TweenId, TweenScheduler, Tweens};
use crate::geometry::Rect;
use crate::host::texture::{ensure_texture, TextureKey};
use crate::host::{BlendMode, NodeId, NodeSpec, SceneHost, Shape};

/// Inset applied to the spawn rectangle (px)
const SPAWN_MARGIN: f32 = 6.0;
/// End scale as a fraction of the start scale
const END_SCALE_FACTOR: f32 = 0.25;
const START_SCALE: Range = Range::new(0.6, 1.0);
const START_ALPHA: Range = Range::new(0.55, 0.9);
/// Rise distance per cycle (px)
const RISE: Range = Range::new(140.0, 280.0);
/// Cycle duration (ms)
const DURATION_MS: Range = Range::new(1500.0, 2600.0);
/// Lateral sway per cycle (px)
const SWAY: f32 = 30.0;

/// Ember pool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbersConfig {
    /// Fixed number of particles
    pub pool_size: usize,
    /// Budget applied once container bounds are known
    pub budget: usize,
    /// Spawn area, relative to `anchor`
    pub spawn_rect: Rect,
    /// Parent origin in screen space
    pub anchor: Vec2,
    /// Glow radius of one ember (px)
    pub radius: f32,
    pub color: Vec3,
    pub depth: i32,
}

impl Default for EmbersConfig {
    fn default() -> Self {
        Self {
            pool_size: 48,
            budget: 24,
            spawn_rect: Rect::new(-120.0, -20.0, 240.0, 40.0),
            anchor: Vec2::new(400.0, 560.0),
            radius: 4.0,
            color: Vec3::new(1.0, 0.55, 0.18),
            depth: 30,
        }
    }
}

/// Randomized parameters of one rise cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmberCycle {
    pub start: Vec2,
    pub rise: f32,
    pub sway: f32,
    pub start_scale: f32,
    pub end_scale: f32,
    pub start_alpha: f32,
    /// Seconds
    pub duration: f32,
}

impl EmberCycle {
    /// Local position at eased progress `t`
    pub fn position(&self, t: f32) -> Vec2 {
        self.start + Vec2::new(self.sway * t, -self.rise * t)
    }

    pub fn scale(&self, t: f32) -> f32 {
        self.start_scale + (self.end_scale - self.start_scale) * t
    }

    pub fn alpha(&self, t: f32) -> f32 {
        self.start_alpha * (1.0 - t)
    }
}

#[derive(Debug)]
struct Ember {
    node: NodeId,
    visible: bool,
    tween: Option<TweenId>,
    cycle: Option<EmberCycle>,
}

/// Pooled ember effect
pub struct EmberPool {
    config: EmbersConfig,
    root: NodeId,
    embers: Vec<Ember>,
    /// Activated indices in activation order; the tail is deactivated first
    active: Vec<usize>,
    requested_budget: usize,
    bounds: Option<Rect>,
    tweens: Box<dyn TweenScheduler<usize>>,
    events: Vec<TweenEvent<usize>>,
    rng: StdRng,
}

impl std::fmt::Debug for EmberPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmberPool")
            .field("pool_size", &self.embers.len())
            .field("active", &self.active.len())
            .field("requested_budget", &self.requested_budget)
            .field("bounds", &self.bounds)
            .finish()
    }
}

impl EmberPool {
    pub fn new(host: &mut dyn SceneHost, name: &str, config: EmbersConfig, rng: StdRng) -> Self {
        Self::with_scheduler(host, name, config, rng, Box::new(Tweens::new()))
    }

    /// Create the pool with a host-provided tween scheduler.
    ///
    /// Every particle is allocated hidden; nothing activates until the first
    /// [`EmberPool::update_container_bounds`] call or an explicit budget.
    pub fn with_scheduler(
        host: &mut dyn SceneHost,
        name: &str,
        config: EmbersConfig,
        rng: StdRng,
        tweens: Box<dyn TweenScheduler<usize>>,
    ) -> Self {
        let root = host.spawn(
            NodeSpec::container()
                .named(name)
                .at(config.anchor)
                .depth(config.depth),
        );
        let texture = ensure_texture(
            host,
            TextureKey::Glow {
                radius: config.radius.max(1.0).round() as u32,
            },
        );
        let size = Vec2::splat(config.radius.max(1.0) * 2.0);

        let embers = (0..config.pool_size)
            .map(|_| {
                let node = host.spawn(
                    NodeSpec::new(Shape::Image {
                        texture: texture.clone(),
                        size,
                    })
                    .child_of(root)
                    .color(config.color)
                    .blend(BlendMode::Add)
                    .alpha(0.0),
                );
                host.set_visible(node, false);
                Ember {
                    node,
                    visible: false,
                    tween: None,
                    cycle: None,
                }
            })
            .collect();

        let requested_budget = config.budget;
        tracing::debug!(name, pool_size = config.pool_size, budget = requested_budget, "Ember pool created");

        Self {
            config,
            root,
            embers,
            active: Vec::new(),
            requested_budget,
            bounds: None,
            tweens,
            events: Vec::new(),
            rng,
        }
    }

    pub fn node(&self) -> NodeId {
        self.root
    }

    pub fn pool_size(&self) -> usize {
        self.embers.len()
    }

    pub fn requested_budget(&self) -> usize {
        self.requested_budget
    }

    pub fn visible_count(&self) -> usize {
        self.embers.iter().filter(|e| e.visible).count()
    }

    /// Indices of visible particles, oldest activation first
    pub fn active_indices(&self) -> &[usize] {
        &self.active
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.embers.get(index).is_some_and(|e| e.visible)
    }

    /// Current cycle parameters of a particle, if it has started one
    pub fn cycle(&self, index: usize) -> Option<&EmberCycle> {
        self.embers.get(index).and_then(|e| e.cycle.as_ref())
    }

    pub fn container_bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Supply outer bounds; the first call applies the deferred initial budget
    pub fn update_container_bounds(&mut self, host: &mut dyn SceneHost, bounds: Rect) {
        let first = self.bounds.is_none();
        self.bounds = Some(bounds);
        if first {
            tracing::debug!(budget = self.requested_budget, "Applying deferred ember budget");
            self.set_budget(host, self.requested_budget);
        }
    }

    /// Show `n` particles (clamped to the pool size), activating or hiding the difference
    pub fn set_budget(&mut self, host: &mut dyn SceneHost, n: usize) {
        let target = n.min(self.embers.len());
        self.requested_budget = target;

        while self.active.len() > target {
            if let Some(index) = self.active.pop() {
                self.deactivate(host, index);
            }
        }

        while self.active.len() < target {
            let Some(index) = self.embers.iter().position(|e| !e.visible) else {
                break;
            };
            self.activate(host, index);
        }

        tracing::debug!(budget = target, visible = self.active.len(), "Ember budget set");
    }

    /// Advance tweens and apply their progress to the particles
    pub fn update(&mut self, host: &mut dyn SceneHost, dt: f32) {
        self.events.clear();
        self.tweens.advance(dt, &mut self.events);

        let events = std::mem::take(&mut self.events);
        for event in &events {
            let Some(ember) = self.embers.get_mut(event.key) else {
                continue;
            };
            if ember.tween != Some(event.id) {
                continue;
            }
            if let Some(cycle) = ember.cycle {
                host.set_position(ember.node, cycle.position(event.progress));
                host.set_scale(ember.node, cycle.scale(event.progress));
                host.set_alpha(ember.node, cycle.alpha(event.progress));
            }
            if event.finished {
                ember.tween = None;
                if ember.visible {
                    self.reset_and_tween(host, event.key);
                }
            }
        }
        self.events = events;
    }

    pub fn destroy(&mut self, host: &mut dyn SceneHost) {
        self.tweens.clear();
        host.despawn(self.root);
        self.active.clear();
        // An empty pool makes later budget and bounds calls no-ops
        self.embers.clear();
    }

    fn activate(&mut self, host: &mut dyn SceneHost, index: usize) {
        let node = self.embers[index].node;
        self.embers[index].visible = true;
        host.set_visible(node, true);
        self.active.push(index);
        self.reset_and_tween(host, index);
    }

    fn deactivate(&mut self, host: &mut dyn SceneHost, index: usize) {
        let ember = &mut self.embers[index];
        ember.visible = false;
        host.set_visible(ember.node, false);
        // No grace period: the in-flight cycle is dropped
        if let Some(id) = ember.tween.take() {
            self.tweens.cancel(id);
        }
    }

    /// Randomize a fresh cycle and schedule its tween
    fn reset_and_tween(&mut self, host: &mut dyn SceneHost, index: usize) {
        // Sample inside the configured rect only; deliberately not clamped to the container bounds
        let area = self.config.spawn_rect.inset(SPAWN_MARGIN);
        let (min, max) = (area.min(), area.max());
        let start = Vec2::new(
            rand_range(&mut self.rng, min.x, max.x),
            rand_range(&mut self.rng, min.y, max.y),
        );

        let start_scale = START_SCALE.sample(&mut self.rng);
        let cycle = EmberCycle {
            start,
            rise: RISE.sample(&mut self.rng),
            sway: rand_range(&mut self.rng, -SWAY, SWAY),
            start_scale,
            end_scale: start_scale * END_SCALE_FACTOR,
            start_alpha: START_ALPHA.sample(&mut self.rng),
            duration: DURATION_MS.sample(&mut self.rng) / 1000.0,
        };

        let ember = &mut self.embers[index];
        host.set_position(ember.node, cycle.start);
        host.set_scale(ember.node, cycle.start_scale);
        host.set_alpha(ember.node, cycle.start_alpha);

        ember.cycle = Some(cycle);
        ember.tween = Some(
            self.tweens
                .schedule(index, Tween::new(cycle.duration).ease(Ease::QuadOut)),
        );
    }
}
