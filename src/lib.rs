//! atmosfx - procedural atmospheric effects for 2D scenes
//!
//! Wind-driven leaves, pooled rising embers, firefly swarms, a moving sun
//! with an aura and surface speckle, and a lens flare that tracks the sun.
//! Every system renders through the [`host::SceneHost`] trait, so any 2D
//! scene graph can drive them; [`host::headless::HeadlessScene`] is the
//! in-memory host used by the runner and the tests.

pub mod anim;
pub mod config;
pub mod effects;
pub mod geometry;
pub mod host;
pub mod stage;

// Re-export commonly used types
pub use config::{ConfigError, EffectConfig, EffectEntry, SceneConfig};
pub use effects::embers::EmberPool;
pub use effects::fireflies::SwarmSystem;
pub use effects::leaves::LeafSystem;
pub use effects::lens_flare::LensFlareSystem;
pub use effects::sun::SunSystem;
pub use effects::wind::WindField;
pub use stage::{Effect, EffectContext, EffectKind, EffectStage, StageError};
