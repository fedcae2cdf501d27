//! The sun: a glowing disk that moves along a configured path (or sits pinned
//! to a viewport corner) and carries two kinds of short-lived decoration,
//! aura wisps and surface speckle, clipped to the disk.
//!
//! The container node is registered under the effect name so other systems
//! (the lens flare) can find it by name every frame.

pub mod aura;
pub mod speckle;

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use self::aura::{AuraConfig, AuraEmitter};
use self::speckle::{SpeckleConfig, SpeckleEmitter};
use crate::anim::{Ease, Repeat, Tween, TweenEvent, TweenId, TweenScheduler, Tweens};
use crate::geometry::Corner;
use crate::host::texture::{ensure_texture, TextureKey};
use crate::host::{BlendMode, NodeId, NodeSpec, SceneHost, Shape};

/// Tween tags used by the sun's scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SunTween {
    /// Linear motion path
    Path,
    Wisp(u64),
    Speckle(u64),
}

/// How the sun moves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SunMotion {
    Static {
        position: Vec2,
    },
    Linear {
        from: Vec2,
        to: Vec2,
        /// Seconds per leg
        #[serde(default = "default_linear_duration")]
        duration: f32,
        #[serde(default)]
        yoyo: bool,
        #[serde(default)]
        repeat: Repeat,
        #[serde(default)]
        ease: Ease,
    },
    Circular {
        center: Vec2,
        radius: f32,
        #[serde(default = "default_angular_speed")]
        angular_speed_deg: f32,
        #[serde(default)]
        phase_deg: f32,
        #[serde(default)]
        clockwise: bool,
    },
}

fn default_linear_duration() -> f32 {
    30.0
}

fn default_angular_speed() -> f32 {
    6.0
}

impl Default for SunMotion {
    fn default() -> Self {
        Self::Static {
            position: Vec2::new(640.0, 140.0),
        }
    }
}

/// Pin the sun to a viewport corner, overriding the motion path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinConfig {
    #[serde(default)]
    pub corner: Corner,
    /// Inward offset from the corner (px)
    pub offset: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlowConfig {
    pub radius: f32,
    pub alpha: f32,
    pub color: Vec3,
}

impl Default for GlowConfig {
    fn default() -> Self {
        Self {
            radius: 110.0,
            alpha: 0.35,
            color: Vec3::new(1.0, 0.78, 0.4),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlickerConfig {
    /// Relative scale swing
    pub amplitude: f32,
    /// Hz
    pub frequency: f32,
}

impl Default for FlickerConfig {
    fn default() -> Self {
        Self {
            amplitude: 0.02,
            frequency: 0.6,
        }
    }
}

/// Sun configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunConfig {
    pub radius: f32,
    pub color: Vec3,
    pub alpha: f32,
    pub glow: GlowConfig,
    pub motion: SunMotion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<PinConfig>,
    pub flicker: FlickerConfig,
    pub aura: AuraConfig,
    pub speckle: SpeckleConfig,
    pub depth: i32,
}

impl Default for SunConfig {
    fn default() -> Self {
        Self {
            radius: 48.0,
            color: Vec3::new(1.0, 0.86, 0.45),
            alpha: 1.0,
            glow: GlowConfig::default(),
            motion: SunMotion::default(),
            pin: None,
            flicker: FlickerConfig::default(),
            aura: AuraConfig::default(),
            speckle: SpeckleConfig::default(),
            depth: 10,
        }
    }
}

/// Flicker scale at time `t` seconds
pub fn flicker_scale(t: f32, flicker: &FlickerConfig) -> f32 {
    1.0 + (t * flicker.frequency * TAU).sin() * flicker.amplitude
}

/// Sun effect
pub struct SunSystem {
    config: SunConfig,
    root: NodeId,
    disk: NodeId,
    halo: NodeId,
    /// Masked layer holding wisps and speckle
    decorations: NodeId,
    center: Vec2,
    theta: f32,
    elapsed: f32,
    path_tween: Option<TweenId>,
    aura: AuraEmitter,
    speckle: SpeckleEmitter,
    rng: StdRng,
    tweens: Box<dyn TweenScheduler<SunTween>>,
    events: Vec<TweenEvent<SunTween>>,
    destroyed: bool,
}

impl std::fmt::Debug for SunSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SunSystem")
            .field("center", &self.center)
            .field("theta", &self.theta)
            .field("wisps", &self.aura.alive())
            .field("speckles", &self.speckle.alive())
            .finish()
    }
}

impl SunSystem {
    pub fn new(host: &mut dyn SceneHost, name: &str, config: SunConfig, rng: StdRng) -> Self {
        Self::with_scheduler(host, name, config, rng, Box::new(Tweens::new()))
    }

    pub fn with_scheduler(
        host: &mut dyn SceneHost,
        name: &str,
        config: SunConfig,
        mut rng: StdRng,
        mut tweens: Box<dyn TweenScheduler<SunTween>>,
    ) -> Self {
        let mut theta = 0.0;
        let mut path_tween = None;
        let mut center = match &config.motion {
            SunMotion::Static { position } => *position,
            SunMotion::Linear {
                from,
                duration,
                yoyo,
                repeat,
                ease,
                ..
            } => {
                path_tween = Some(tweens.schedule(
                    SunTween::Path,
                    Tween::new(*duration)
                        .ease(*ease)
                        .yoyo(*yoyo)
                        .repeat(*repeat),
                ));
                *from
            }
            SunMotion::Circular {
                center,
                radius,
                phase_deg,
                ..
            } => {
                theta = phase_deg.to_radians();
                *center + Vec2::new(theta.cos(), theta.sin()) * *radius
            }
        };
        if let Some(pin) = &config.pin {
            center = pin.corner.resolve(host.viewport(), pin.offset);
        }

        let root = host.spawn(
            NodeSpec::container()
                .named(name)
                .at(center)
                .depth(config.depth),
        );

        let glow_radius = config.glow.radius.max(config.radius).max(1.0);
        let glow_texture = ensure_texture(
            host,
            TextureKey::Glow {
                radius: glow_radius.round() as u32,
            },
        );
        let halo = host.spawn(
            NodeSpec::new(Shape::Image {
                texture: glow_texture,
                size: Vec2::splat(glow_radius * 2.0),
            })
            .child_of(root)
            .color(config.glow.color)
            .alpha(config.glow.alpha)
            .blend(BlendMode::Add),
        );
        let disk = host.spawn(
            NodeSpec::new(Shape::Circle {
                radius: config.radius,
            })
            .child_of(root)
            .color(config.color)
            .alpha(config.alpha),
        );
        let decorations = host.spawn(NodeSpec::container().child_of(root));
        host.set_circle_mask(decorations, Vec2::ZERO, config.radius);

        let aura = AuraEmitter::new(config.aura.clone(), rng.gen());
        let speckle = SpeckleEmitter::new(config.speckle.clone());

        tracing::debug!(name, ?center, "Sun created");

        Self {
            config,
            root,
            disk,
            halo,
            decorations,
            center,
            theta,
            elapsed: 0.0,
            path_tween,
            aura,
            speckle,
            rng,
            tweens,
            events: Vec::new(),
            destroyed: false,
        }
    }

    /// Container node, registered under the effect name
    pub fn node(&self) -> NodeId {
        self.root
    }

    /// Current screen-space center
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Angular phase in radians (circular motion), wrapped to `[0, 2π)`
    pub fn theta(&self) -> f32 {
        self.theta
    }

    pub fn alive_speckles(&self) -> usize {
        self.speckle.alive()
    }

    pub fn alive_wisps(&self) -> usize {
        self.aura.alive()
    }

    /// Whether a linear path is still playing
    pub fn is_moving(&self) -> bool {
        self.path_tween.is_some_and(|id| self.tweens.is_active(id))
    }

    pub fn config(&self) -> &SunConfig {
        &self.config
    }

    pub fn update(&mut self, host: &mut dyn SceneHost, dt: f32) {
        if self.destroyed {
            return;
        }
        let dt = dt.max(0.0);
        self.elapsed += dt;

        match &self.config.motion {
            SunMotion::Static { position } => self.center = *position,
            SunMotion::Circular {
                center,
                radius,
                angular_speed_deg,
                clockwise,
                ..
            } => {
                // y-down screen: increasing angle turns clockwise
                let direction = if *clockwise { 1.0 } else { -1.0 };
                self.theta = (self.theta + direction * angular_speed_deg.to_radians() * dt)
                    .rem_euclid(TAU);
                self.center = *center + Vec2::new(self.theta.cos(), self.theta.sin()) * *radius;
            }
            SunMotion::Linear { .. } => {}
        }

        self.events.clear();
        self.tweens.advance(dt, &mut self.events);
        let radius = self.config.radius;
        for event in &self.events {
            match event.key {
                SunTween::Path => {
                    if let SunMotion::Linear { from, to, .. } = &self.config.motion {
                        self.center = from.lerp(*to, event.progress);
                    }
                    if event.finished {
                        self.path_tween = None;
                    }
                }
                SunTween::Wisp(id) => {
                    self.aura
                        .on_progress(host, id, radius, event.progress, event.finished)
                }
                SunTween::Speckle(id) => {
                    self.speckle
                        .on_progress(host, id, event.progress, event.finished)
                }
            }
        }

        if let Some(pin) = &self.config.pin {
            self.center = pin.corner.resolve(host.viewport(), pin.offset);
        }
        host.set_position(self.root, self.center);

        let scale = flicker_scale(self.elapsed, &self.config.flicker);
        host.set_scale(self.disk, scale);
        host.set_scale(self.halo, scale);

        for _ in 0..self.aura.tick(dt) {
            self.aura.spawn(
                host,
                self.decorations,
                radius,
                &mut self.rng,
                self.tweens.as_mut(),
            );
        }
        for _ in 0..self.speckle.tick(dt) {
            self.speckle.spawn(
                host,
                self.decorations,
                radius,
                &mut self.rng,
                self.tweens.as_mut(),
            );
        }
    }

    /// Re-apply the corner pin for a new viewport
    pub fn resize(&mut self, host: &mut dyn SceneHost, viewport: Vec2) {
        if self.destroyed {
            return;
        }
        if let Some(pin) = &self.config.pin {
            self.center = pin.corner.resolve(viewport, pin.offset);
            host.set_position(self.root, self.center);
        }
    }

    /// Cancel every animation and remove the sun with its decorations
    pub fn destroy(&mut self, host: &mut dyn SceneHost) {
        self.tweens.clear();
        self.path_tween = None;
        self.aura.clear(host);
        self.speckle.clear(host);
        host.despawn(self.root);
        self.destroyed = true;
    }
}
