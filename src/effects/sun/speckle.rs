//! Surface speckle: short-lived tinted spots scattered over the sun's disk.

use glam::Vec3;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::SunTween;
use crate::anim::{Ease, Tween, TweenScheduler};
use crate::effects::random::{point_in_disk, Range};
use crate::host::texture::{ensure_texture, CentroidCache, TextureKey};
use crate::host::{BlendMode, NodeId, NodeSpec, SceneHost, Shape};

/// Edge length of the procedural spot texture (px)
const DEFAULT_SPOT_TEXTURE: u32 = 16;
const MAX_SPAWNS_PER_FRAME: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeckleConfig {
    pub enabled: bool,
    /// Spots per second
    pub rate: f32,
    /// Ceiling on concurrently alive spots
    pub max_alive: usize,
    /// Lifetime in seconds
    pub life: Range,
    /// On-screen spot size (px)
    pub size: Range,
    pub alpha: Range,
    pub color: Vec3,
    /// Host texture key; a procedural dot is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    /// Shift spots so the texture's visible content sits on the sampled point
    pub recenter: bool,
    pub blend: BlendMode,
}

impl Default for SpeckleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: 6.0,
            max_alive: 24,
            life: Range::new(0.6, 1.6),
            size: Range::new(2.0, 5.0),
            alpha: Range::new(0.25, 0.6),
            color: Vec3::new(1.0, 0.6, 0.25),
            texture: None,
            recenter: true,
            blend: BlendMode::Add,
        }
    }
}

#[derive(Debug, Clone)]
struct Spot {
    id: u64,
    node: NodeId,
    start_alpha: f32,
}

/// Spawns and fades speckle spots
#[derive(Debug)]
pub struct SpeckleEmitter {
    config: SpeckleConfig,
    centroids: CentroidCache,
    spots: Vec<Spot>,
    accumulator: f32,
    next_id: u64,
    warned_missing: bool,
}

impl SpeckleEmitter {
    pub fn new(config: SpeckleConfig) -> Self {
        Self {
            config,
            centroids: CentroidCache::new(),
            spots: Vec::new(),
            accumulator: 0.0,
            next_id: 1,
            warned_missing: false,
        }
    }

    pub fn alive(&self) -> usize {
        self.spots.len()
    }

    /// Advance the spawn timer; returns how many spots are due, capacity permitting
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
        self.accumulator = self.accumulator.min(interval);
        due.min(self.config.max_alive.saturating_sub(self.spots.len()))
    }

    /// Create one spot inside a disk of `sun_radius` under `layer`
    pub fn spawn(
        &mut self,
        host: &mut dyn SceneHost,
        layer: NodeId,
        sun_radius: f32,
        rng: &mut StdRng,
        tweens: &mut dyn TweenScheduler<SunTween>,
    ) {
        if self.spots.len() >= self.config.max_alive {
            return;
        }

        let texture = match &self.config.texture {
            Some(key) => key.clone(),
            None => ensure_texture(
                host,
                TextureKey::Dot {
                    size: DEFAULT_SPOT_TEXTURE,
                },
            ),
        };

        let size = self.config.size.sample(rng).max(0.5);
        let mut position = point_in_disk(rng, sun_radius);

        if self.config.recenter {
            let dim = host.texture(&texture).map(|img| img.width.max(img.height));
            match (self.centroids.offset(host, &texture), dim) {
                (Some(offset), Some(dim)) if dim > 0 => {
                    position -= offset * (size / dim as f32);
                }
                _ => {
                    if !self.warned_missing {
                        tracing::warn!(texture = %texture, "Speckle texture missing, spots not recentered");
                        self.warned_missing = true;
                    }
                }
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        let start_alpha = self.config.alpha.sample(rng).clamp(0.0, 1.0);
        let node = host.spawn(
            NodeSpec::new(Shape::Image {
                texture,
                size: glam::Vec2::splat(size),
            })
            .child_of(layer)
            .at(position)
            .color(self.config.color)
            .alpha(start_alpha)
            .blend(self.config.blend),
        );

        let life = self.config.life.sample(rng).max(0.05);
        tweens.schedule(SunTween::Speckle(id), Tween::new(life).ease(Ease::QuadIn));
        tracing::trace!(id, life, "Speckle spawned");

        self.spots.push(Spot {
            id,
            node,
            start_alpha,
        });
    }

    /// Fade a spot; destroy it and free its slot when finished
    pub fn on_progress(&mut self, host: &mut dyn SceneHost, id: u64, progress: f32, finished: bool) {
        let Some(index) = self.spots.iter().position(|s| s.id == id) else {
            return;
        };

        if finished {
            let spot = self.spots.swap_remove(index);
            host.despawn(spot.node);
        } else {
            let spot = &self.spots[index];
            host.set_alpha(spot.node, spot.start_alpha * (1.0 - progress));
        }
    }

    pub fn clear(&mut self, host: &mut dyn SceneHost) {
        for spot in self.spots.drain(..) {
            host.despawn(spot.node);
        }
        self.accumulator = 0.0;
    }
}
