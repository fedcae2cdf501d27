//! Wind-driven falling leaves.
//!
//! Leaves are spawned on a random-interval schedule up to a fixed maximum and
//! are never destroyed: a leaf that drifts out of the extended viewport is
//! recycled in place with fresh position, velocity, spin, flutter and look.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::random::{rand_range, Range};
use super::wind::{WindConfig, WindField};
use crate::host::texture::{ensure_texture, TextureKey};
use crate::host::{NodeId, NodeSpec, SceneHost, Shape};

/// Unscaled edge length of a leaf sprite; nodes are scaled to the leaf size
const LEAF_SPRITE_SIZE: f32 = 32.0;
/// Scale from flutter amplitude to lateral velocity
const FLUTTER_GAIN: f32 = 1.5;
/// Minimum leaf mass
const MIN_MASS: f32 = 0.6;
/// Mass per pixel of leaf size
const MASS_PER_SIZE: f32 = 0.05;
/// Cross-sectional area per squared pixel of size
const AREA_FACTOR: f32 = 0.5;
/// Horizontal overhang of the spawn band, as a fraction of width
const SPAWN_OVERHANG: f32 = 0.05;

/// Where new leaves appear vertically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpawnArea {
    /// Anywhere on screen
    Full,
    /// Upper third of the screen
    Top,
    /// Just above the top edge
    #[default]
    TopEdge,
}

/// Leaf integration model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafPhysicsMode {
    /// Exponential pull toward the local wind plus gravity
    #[default]
    Blend,
    /// Quadratic drag and flutter-driven lift
    Drag2,
}

/// Spawn scheduling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeafSpawnConfig {
    /// Maximum concurrent leaves
    pub max: usize,
    /// Seconds between spawns
    pub interval: Range,
    /// Delay before the first scheduled spawn
    pub initial_delay: Range,
    /// Create a burst of leaves across the whole screen at start
    pub start_filled: bool,
    /// Burst size; defaults to half of `max`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burst: Option<usize>,
    pub area: SpawnArea,
    /// Random positional jitter (px)
    pub jitter: f32,
}

impl Default for LeafSpawnConfig {
    fn default() -> Self {
        Self {
            max: 24,
            interval: Range::new(0.35, 1.2),
            initial_delay: Range::new(0.0, 0.8),
            start_filled: false,
            burst: None,
            area: SpawnArea::TopEdge,
            jitter: 12.0,
        }
    }
}

/// Integration tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeafPhysicsConfig {
    pub mode: LeafPhysicsMode,
    /// Blend rate toward the wind (1/s)
    pub follow: f32,
    /// Extra damping of the vertical blend
    pub vertical_damping: f32,
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    /// Vertical speed limit (px/s)
    pub terminal_vy: f32,
    /// Empirical tuning constants for `drag2`
    pub air_density: f32,
    pub drag_coefficient: f32,
    pub lift_coefficient: f32,
}

impl Default for LeafPhysicsConfig {
    fn default() -> Self {
        Self {
            mode: LeafPhysicsMode::Blend,
            follow: 1.4,
            vertical_damping: 0.6,
            gravity: 32.0,
            terminal_vy: 140.0,
            air_density: 0.0015,
            drag_coefficient: 1.1,
            lift_coefficient: 0.3,
        }
    }
}

/// Side-to-side flutter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeafFlutterConfig {
    /// Hz
    pub frequency: Range,
    /// px
    pub amplitude: Range,
}

impl Default for LeafFlutterConfig {
    fn default() -> Self {
        Self {
            frequency: Range::new(0.5, 1.4),
            amplitude: Range::new(6.0, 18.0),
        }
    }
}

/// Autumn leaves effect configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeavesConfig {
    pub spawn: LeafSpawnConfig,
    pub physics: LeafPhysicsConfig,
    pub flutter: LeafFlutterConfig,
    /// Leaf size in px
    pub size: Range,
    /// Spin rate in degrees per second
    pub spin: Range,
    pub alpha: Range,
    /// Texture keys to pick from; a procedural disk is used when empty
    pub textures: Vec<String>,
    /// Tints to pick from
    pub palette: Vec<Vec3>,
    pub wind: WindConfig,
    pub depth: i32,
}

impl Default for LeavesConfig {
    fn default() -> Self {
        Self {
            spawn: LeafSpawnConfig::default(),
            physics: LeafPhysicsConfig::default(),
            flutter: LeafFlutterConfig::default(),
            size: Range::new(10.0, 22.0),
            spin: Range::new(-120.0, 120.0),
            alpha: Range::new(0.75, 1.0),
            textures: Vec::new(),
            palette: vec![
                Vec3::new(0.85, 0.42, 0.12),
                Vec3::new(0.78, 0.22, 0.10),
                Vec3::new(0.93, 0.68, 0.20),
                Vec3::new(0.55, 0.30, 0.12),
            ],
            wind: WindConfig::default(),
            depth: 20,
        }
    }
}

/// A single leaf
#[derive(Debug, Clone)]
pub struct Leaf {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Radians
    pub rotation: f32,
    /// Degrees per second
    pub spin_rate: f32,
    pub flutter_phase: f32,
    pub flutter_frequency: f32,
    pub flutter_amplitude: f32,
    pub size: f32,
    pub mass: f32,
    pub area: f32,
    pub alpha: f32,
    pub tint: Vec3,
    node: NodeId,
}

impl Leaf {
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Give the leaf a new size, recomputing mass and area
    fn set_size(&mut self, size: f32) {
        self.size = size.max(1.0);
        self.mass = leaf_mass(self.size);
        self.area = self.size * self.size * AREA_FACTOR;
    }
}

/// Mass of a leaf of the given size
pub fn leaf_mass(size: f32) -> f32 {
    (size * MASS_PER_SIZE).max(MIN_MASS)
}

/// Falling-leaves effect
#[derive(Debug)]
pub struct LeafSystem {
    config: LeavesConfig,
    wind: WindField,
    leaves: Vec<Leaf>,
    rng: StdRng,
    root: NodeId,
    textures: Vec<String>,
    elapsed: f32,
    next_spawn_at: f32,
    /// Set by `destroy`; updates become no-ops
    destroyed: bool,
}

impl LeafSystem {
    /// Create the effect under a container node registered as `name`
    pub fn new(host: &mut dyn SceneHost, name: &str, config: LeavesConfig, mut rng: StdRng) -> Self {
        let root = host.spawn(NodeSpec::container().named(name).depth(config.depth));

        let textures = if config.textures.is_empty() {
            let key = TextureKey::Disk {
                radius: (LEAF_SPRITE_SIZE * 0.5) as u32,
            };
            vec![ensure_texture(host, key)]
        } else {
            config.textures.clone()
        };

        let next_spawn_at = config.spawn.initial_delay.sample(&mut rng);
        let wind = WindField::new(config.wind.clone());

        let mut system = Self {
            config,
            wind,
            leaves: Vec::new(),
            rng,
            root,
            textures,
            elapsed: 0.0,
            next_spawn_at,
            destroyed: false,
        };

        if system.config.spawn.start_filled {
            let max = system.config.spawn.max;
            let burst = system.config.spawn.burst.unwrap_or(max / 2).min(max);
            for _ in 0..burst {
                system.spawn_leaf(host, SpawnArea::Full);
            }
        }

        tracing::debug!(
            name,
            max = system.config.spawn.max,
            mode = ?system.config.physics.mode,
            initial = system.leaves.len(),
            "Leaf system created"
        );

        system
    }

    pub fn node(&self) -> NodeId {
        self.root
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn wind(&self) -> &WindField {
        &self.wind
    }

    pub fn config(&self) -> &LeavesConfig {
        &self.config
    }

    /// Spawn on schedule, integrate every leaf, recycle leaves that left the screen
    pub fn update(&mut self, host: &mut dyn SceneHost, dt: f32) {
        if self.destroyed {
            return;
        }
        let dt = dt.max(0.0);
        self.elapsed += dt;
        self.wind.update(dt);

        while self.leaves.len() < self.config.spawn.max && self.elapsed >= self.next_spawn_at {
            let area = self.config.spawn.area;
            self.spawn_leaf(host, area);
            self.next_spawn_at = self.elapsed + self.config.spawn.interval.sample(&mut self.rng);
        }

        let viewport = host.viewport();
        for leaf in &mut self.leaves {
            let wind = self.wind.sample(leaf.position.x, leaf.position.y, viewport.y);
            integrate(leaf, wind, &self.config.physics, dt);

            if is_out_of_bounds(leaf, viewport) {
                respawn(leaf, &self.config, self.config.spawn.area, viewport, &mut self.rng);
                host.set_scale(leaf.node, leaf.size / LEAF_SPRITE_SIZE);
                host.set_tint(leaf.node, leaf.tint);
            }

            host.set_position(leaf.node, leaf.position);
            host.set_rotation(leaf.node, leaf.rotation);
            host.set_alpha(leaf.node, leaf.alpha);
        }
    }

    /// Leaves keep flying after a resize and recycle into the new bounds
    pub fn resize(&mut self, _viewport: Vec2) {}

    pub fn destroy(&mut self, host: &mut dyn SceneHost) {
        host.despawn(self.root);
        self.leaves.clear();
        self.destroyed = true;
    }

    fn spawn_leaf(&mut self, host: &mut dyn SceneHost, area: SpawnArea) {
        let viewport = host.viewport();
        let texture = self.textures[self.rng.gen_range(0..self.textures.len())].clone();

        let node = host.spawn(
            NodeSpec::new(Shape::Image {
                texture,
                size: Vec2::splat(LEAF_SPRITE_SIZE),
            })
            .child_of(self.root),
        );

        let mut leaf = Leaf {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            spin_rate: 0.0,
            flutter_phase: 0.0,
            flutter_frequency: 0.0,
            flutter_amplitude: 0.0,
            size: 1.0,
            mass: MIN_MASS,
            area: 0.0,
            alpha: 1.0,
            tint: Vec3::ONE,
            node,
        };
        respawn(&mut leaf, &self.config, area, viewport, &mut self.rng);

        host.set_scale(node, leaf.size / LEAF_SPRITE_SIZE);
        host.set_tint(node, leaf.tint);
        host.set_position(node, leaf.position);
        host.set_rotation(node, leaf.rotation);
        host.set_alpha(node, leaf.alpha);

        tracing::trace!(x = leaf.position.x, y = leaf.position.y, size = leaf.size, "Leaf spawned");
        self.leaves.push(leaf);
    }
}

/// Spawn position for the given area policy
fn spawn_position(area: SpawnArea, viewport: Vec2, size: f32, jitter: f32, rng: &mut StdRng) -> Vec2 {
    let x = rand_range(
        rng,
        -SPAWN_OVERHANG * viewport.x,
        (1.0 + SPAWN_OVERHANG) * viewport.x,
    ) + rand_range(rng, -jitter, jitter);

    let y = match area {
        SpawnArea::Full => rand_range(rng, 0.0, viewport.y),
        SpawnArea::Top => rand_range(rng, 0.0, viewport.y * 0.3),
        SpawnArea::TopEdge => -size - rand_range(rng, 0.0, jitter.max(0.0)),
    };

    Vec2::new(x, y)
}

/// Re-randomize every per-leaf parameter in place
fn respawn(leaf: &mut Leaf, config: &LeavesConfig, area: SpawnArea, viewport: Vec2, rng: &mut StdRng) {
    leaf.set_size(config.size.sample(rng));
    leaf.position = spawn_position(area, viewport, leaf.size, config.spawn.jitter, rng);
    leaf.velocity = Vec2::new(rand_range(rng, 10.0, 40.0), rand_range(rng, 10.0, 35.0));
    leaf.rotation = rand_range(rng, 0.0, TAU);
    leaf.spin_rate = config.spin.sample(rng);
    leaf.flutter_phase = rand_range(rng, 0.0, TAU);
    leaf.flutter_frequency = config.flutter.frequency.sample(rng);
    leaf.flutter_amplitude = config.flutter.amplitude.sample(rng);
    leaf.alpha = config.alpha.sample(rng).clamp(0.0, 1.0);
    if !config.palette.is_empty() {
        leaf.tint = config.palette[rng.gen_range(0..config.palette.len())];
    }
}

/// Advance one leaf by `dt` against the local wind
pub fn integrate(leaf: &mut Leaf, wind: Vec2, physics: &LeafPhysicsConfig, dt: f32) {
    match physics.mode {
        LeafPhysicsMode::Blend => {
            let k = (physics.follow * dt).min(1.0);
            leaf.velocity.x += (wind.x - leaf.velocity.x) * k;
            leaf.velocity.y += (wind.y - leaf.velocity.y) * k * physics.vertical_damping;
            leaf.velocity.y += physics.gravity * dt;
        }
        LeafPhysicsMode::Drag2 => {
            let rel = wind - leaf.velocity;
            let speed = rel.length();
            if speed > 1e-4 {
                let dir = rel / speed;
                let dynamic_pressure = 0.5 * physics.air_density * speed * speed * leaf.area;

                let drag = dir * dynamic_pressure * physics.drag_coefficient;
                let lift = dir.perp()
                    * dynamic_pressure
                    * physics.lift_coefficient
                    * leaf.flutter_phase.sin();

                // A single step never carries the leaf past the air speed
                let dv = ((drag + lift) / leaf.mass * dt).clamp_length_max(speed);
                leaf.velocity += dv;
            }
            leaf.velocity.y += physics.gravity * dt;
        }
    }

    leaf.flutter_phase = (leaf.flutter_phase + leaf.flutter_frequency * dt * TAU) % TAU;
    let flutter = leaf.flutter_phase.sin() * leaf.flutter_amplitude * FLUTTER_GAIN;

    let terminal = physics.terminal_vy.abs();
    leaf.velocity.y = leaf.velocity.y.clamp(-terminal, terminal);

    leaf.position += (leaf.velocity + Vec2::new(flutter, 0.0)) * dt;
    leaf.rotation = (leaf.rotation + leaf.spin_rate.to_radians() * dt) % TAU;
}

/// Outside the viewport extended by the spawn band and a size-proportional margin
fn is_out_of_bounds(leaf: &Leaf, viewport: Vec2) -> bool {
    let margin = leaf.size * 2.0;
    let overhang = viewport.x * SPAWN_OVERHANG * 2.0;
    leaf.position.x < -overhang - margin
        || leaf.position.x > viewport.x + overhang + margin
        || leaf.position.y > viewport.y + margin
        || leaf.position.y < -viewport.y * 0.5 - margin
}
