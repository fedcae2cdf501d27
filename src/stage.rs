//! Effect registry and frame driver.
//!
//! The stage mounts named effects onto a host, forwards frames, resizes and
//! budget changes to them, and tears them down. Effects never reference each
//! other directly; the lens flare finds the sun through the host's name
//! registry every frame.

use glam::Vec2;

use crate::config::{EffectConfig, SceneConfig};
use crate::effects::embers::EmberPool;
use crate::effects::fireflies::SwarmSystem;
use crate::effects::leaves::LeafSystem;
use crate::effects::lens_flare::LensFlareSystem;
use crate::effects::random::derived_rng;
use crate::effects::sun::SunSystem;
use crate::geometry::Rect;
use crate::host::{NodeId, SceneHost};

/// Kind of an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    AutumnLeaves,
    Embers,
    Fireflies,
    Sun,
    LensFlare,
}

const EFFECT_KINDS: &[(&str, EffectKind)] = &[
    ("autumn_leaves", EffectKind::AutumnLeaves),
    ("embers", EffectKind::Embers),
    ("fireflies", EffectKind::Fireflies),
    ("sun", EffectKind::Sun),
    ("lens_flare", EffectKind::LensFlare),
];

impl EffectKind {
    /// Look up a kind by its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        EFFECT_KINDS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, kind)| *kind)
    }

    pub fn name(&self) -> &'static str {
        EFFECT_KINDS
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(n, _)| *n)
            .unwrap_or("unknown")
    }

    pub fn all() -> impl Iterator<Item = Self> {
        EFFECT_KINDS.iter().map(|(_, kind)| *kind)
    }

    /// Whether the effect accepts a particle budget
    pub fn is_pooled(&self) -> bool {
        matches!(self, Self::Embers | Self::Fireflies)
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl EffectConfig {
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::AutumnLeaves(_) => EffectKind::AutumnLeaves,
            Self::Embers(_) => EffectKind::Embers,
            Self::Fireflies(_) => EffectKind::Fireflies,
            Self::Sun(_) => EffectKind::Sun,
            Self::LensFlare(_) => EffectKind::LensFlare,
        }
    }
}

/// Values every effect constructor receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectContext {
    /// Scene seed; each effect's RNG is derived from it and the effect name
    pub seed: u64,
}

/// A mounted effect system
#[derive(Debug)]
pub enum Effect {
    Leaves(LeafSystem),
    Embers(EmberPool),
    Fireflies(SwarmSystem),
    Sun(SunSystem),
    LensFlare(LensFlareSystem),
}

impl Effect {
    /// Construct the system matching `config`
    pub fn build(
        host: &mut dyn SceneHost,
        ctx: &EffectContext,
        name: &str,
        config: &EffectConfig,
    ) -> Self {
        let rng = derived_rng(ctx.seed, name);
        match config {
            EffectConfig::AutumnLeaves(c) => Self::Leaves(LeafSystem::new(host, name, c.clone(), rng)),
            EffectConfig::Embers(c) => Self::Embers(EmberPool::new(host, name, c.clone(), rng)),
            EffectConfig::Fireflies(c) => {
                Self::Fireflies(SwarmSystem::new(host, name, c.clone(), rng))
            }
            EffectConfig::Sun(c) => Self::Sun(SunSystem::new(host, name, c.clone(), rng)),
            EffectConfig::LensFlare(c) => {
                Self::LensFlare(LensFlareSystem::new(host, name, c.clone()))
            }
        }
    }

    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Leaves(_) => EffectKind::AutumnLeaves,
            Self::Embers(_) => EffectKind::Embers,
            Self::Fireflies(_) => EffectKind::Fireflies,
            Self::Sun(_) => EffectKind::Sun,
            Self::LensFlare(_) => EffectKind::LensFlare,
        }
    }

    /// Root node of the effect
    pub fn node(&self) -> NodeId {
        match self {
            Self::Leaves(e) => e.node(),
            Self::Embers(e) => e.node(),
            Self::Fireflies(e) => e.node(),
            Self::Sun(e) => e.node(),
            Self::LensFlare(e) => e.node(),
        }
    }

    pub fn update(&mut self, host: &mut dyn SceneHost, elapsed: f32, dt: f32) {
        match self {
            Self::Leaves(e) => e.update(host, dt),
            Self::Embers(e) => e.update(host, dt),
            Self::Fireflies(e) => e.update(host, elapsed, dt),
            Self::Sun(e) => e.update(host, dt),
            Self::LensFlare(e) => e.update(host, elapsed),
        }
    }

    pub fn resize(&mut self, host: &mut dyn SceneHost, viewport: Vec2) {
        match self {
            Self::Leaves(e) => e.resize(viewport),
            Self::Sun(e) => e.resize(host, viewport),
            Self::LensFlare(e) => e.resize(host, viewport),
            Self::Embers(_) | Self::Fireflies(_) => {}
        }
    }

    pub fn destroy(&mut self, host: &mut dyn SceneHost) {
        match self {
            Self::Leaves(e) => e.destroy(host),
            Self::Embers(e) => e.destroy(host),
            Self::Fireflies(e) => e.destroy(host),
            Self::Sun(e) => e.destroy(host),
            Self::LensFlare(e) => e.destroy(host),
        }
    }

    pub fn as_leaves(&self) -> Option<&LeafSystem> {
        match self {
            Self::Leaves(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_embers(&self) -> Option<&EmberPool> {
        match self {
            Self::Embers(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_fireflies(&self) -> Option<&SwarmSystem> {
        match self {
            Self::Fireflies(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_sun(&self) -> Option<&SunSystem> {
        match self {
            Self::Sun(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_lens_flare(&self) -> Option<&LensFlareSystem> {
        match self {
            Self::LensFlare(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Mounted {
    name: String,
    effect: Effect,
}

/// Ordered collection of mounted effects
#[derive(Debug, Default)]
pub struct EffectStage {
    mounted: Vec<Mounted>,
}

impl EffectStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }

    /// Names in mount order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.mounted.iter().map(|m| m.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Effect> {
        self.mounted
            .iter()
            .find(|m| m.name == name)
            .map(|m| &m.effect)
    }

    /// Mount one effect under a unique name
    pub fn mount(
        &mut self,
        host: &mut dyn SceneHost,
        ctx: &EffectContext,
        name: &str,
        config: &EffectConfig,
    ) -> Result<(), StageError> {
        if self.get(name).is_some() {
            return Err(StageError::DuplicateName(name.to_string()));
        }
        let effect = Effect::build(host, ctx, name, config);
        tracing::info!(name, kind = %effect.kind(), "Effect mounted");
        self.mounted.push(Mounted {
            name: name.to_string(),
            effect,
        });
        Ok(())
    }

    /// Mount every enabled entry of a scene, in order. Returns how many were mounted.
    pub fn mount_scene(
        &mut self,
        host: &mut dyn SceneHost,
        scene: &SceneConfig,
    ) -> Result<usize, StageError> {
        let ctx = EffectContext { seed: scene.seed };
        let mut count = 0;
        for entry in scene.enabled_effects() {
            self.mount(host, &ctx, &entry.name, &entry.config)?;
            count += 1;
        }
        Ok(count)
    }

    /// Advance every effect by one frame.
    ///
    /// Effects run in mount order, except that lens flares run after
    /// everything else so they see this frame's sun position.
    pub fn update(&mut self, host: &mut dyn SceneHost, elapsed: f32, dt: f32) {
        for m in self
            .mounted
            .iter_mut()
            .filter(|m| m.effect.kind() != EffectKind::LensFlare)
        {
            m.effect.update(host, elapsed, dt);
        }
        for m in self
            .mounted
            .iter_mut()
            .filter(|m| m.effect.kind() == EffectKind::LensFlare)
        {
            m.effect.update(host, elapsed, dt);
        }
    }

    pub fn resize(&mut self, host: &mut dyn SceneHost, viewport: Vec2) {
        for m in &mut self.mounted {
            m.effect.resize(host, viewport);
        }
    }

    /// Route a particle budget to a pooled effect
    pub fn set_budget(
        &mut self,
        host: &mut dyn SceneHost,
        name: &str,
        n: usize,
    ) -> Result<(), StageError> {
        let mounted = self.find_mut(name)?;
        match &mut mounted.effect {
            Effect::Embers(pool) => pool.set_budget(host, n),
            Effect::Fireflies(swarm) => swarm.set_budget(host, n),
            _ => return Err(StageError::NotPooled(name.to_string())),
        }
        Ok(())
    }

    /// Forward container bounds to an ember pool
    pub fn update_container_bounds(
        &mut self,
        host: &mut dyn SceneHost,
        name: &str,
        bounds: Rect,
    ) -> Result<(), StageError> {
        let mounted = self.find_mut(name)?;
        match &mut mounted.effect {
            Effect::Embers(pool) => {
                pool.update_container_bounds(host, bounds);
                Ok(())
            }
            _ => Err(StageError::NotPooled(name.to_string())),
        }
    }

    /// Destroy and forget one effect
    pub fn unmount(&mut self, host: &mut dyn SceneHost, name: &str) -> Result<(), StageError> {
        let index = self
            .mounted
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| StageError::UnknownEffect(name.to_string()))?;
        let mut mounted = self.mounted.remove(index);
        mounted.effect.destroy(host);
        tracing::info!(name, "Effect unmounted");
        Ok(())
    }

    /// Destroy every effect
    pub fn destroy(&mut self, host: &mut dyn SceneHost) {
        for mut m in self.mounted.drain(..) {
            m.effect.destroy(host);
            tracing::info!(name = %m.name, "Effect unmounted");
        }
    }

    fn find_mut(&mut self, name: &str) -> Result<&mut Mounted, StageError> {
        match self.mounted.iter_mut().find(|m| m.name == name) {
            Some(m) => Ok(m),
            None => {
                tracing::warn!(name, "No effect with this name");
                Err(StageError::UnknownEffect(name.to_string()))
            }
        }
    }
}

/// Stage errors.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("Unknown effect: {0}")]
    UnknownEffect(String),

    #[error("An effect named {0} is already mounted")]
    DuplicateName(String),

    #[error("Effect {0} has no particle budget")]
    NotPooled(String),
}
