//! Scene configuration.
//!
//! A scene is a seed, a viewport and an ordered list of named effects, each
//! tagged with its kind:
//!
//! ```toml
//! seed = 42
//! viewport = [1280.0, 720.0]
//!
//! [[effects]]
//! name = "sun"
//! type = "sun"
//! radius = 56.0
//!
//! [[effects]]
//! name = "flare"
//! type = "lens_flare"
//! source = "sun"
//! ```

use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::effects::embers::EmbersConfig;
use crate::effects::fireflies::FirefliesConfig;
use crate::effects::leaves::LeavesConfig;
use crate::effects::lens_flare::LensFlareConfig;
use crate::effects::sun::SunConfig;

/// Per-kind effect configuration, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectConfig {
    AutumnLeaves(LeavesConfig),
    Embers(EmbersConfig),
    Fireflies(FirefliesConfig),
    Sun(SunConfig),
    LensFlare(LensFlareConfig),
}

/// One named effect in a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectEntry {
    /// Registry name; also the name of the effect's root node
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(flatten)]
    pub config: EffectConfig,
}

fn default_enabled() -> bool {
    true
}

impl EffectEntry {
    pub fn new(name: impl Into<String>, config: EffectConfig) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            config,
        }
    }
}

/// A full scene description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Root seed; per-effect randomness derives from it and the effect name
    pub seed: u64,
    pub viewport: Vec2,
    pub effects: Vec<EffectEntry>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            viewport: Vec2::new(1280.0, 720.0),
            effects: Vec::new(),
        }
    }
}

impl SceneConfig {
    /// Parse a scene from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Err(ConfigError::Empty);
        }
        Ok(toml::from_str(content)?)
    }

    /// Load a scene file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scene = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), effects = scene.effects.len(), "Scene loaded");
        Ok(scene)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the scene to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Per-user scene file location
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "atmosfx", "atmosfx")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scene.toml")
    }

    /// Entries that will actually be mounted
    pub fn enabled_effects(&self) -> impl Iterator<Item = &EffectEntry> {
        self.effects.iter().filter(|e| e.enabled)
    }

    /// Built-in scene used when no file is given
    pub fn demo() -> Self {
        Self {
            seed: 42,
            viewport: Vec2::new(1280.0, 720.0),
            effects: vec![
                EffectEntry::new("sun", EffectConfig::Sun(SunConfig::default())),
                EffectEntry::new(
                    "autumn_leaves",
                    EffectConfig::AutumnLeaves(LeavesConfig::default()),
                ),
                EffectEntry::new(
                    "embers",
                    EffectConfig::Embers(EmbersConfig {
                        anchor: Vec2::new(640.0, 680.0),
                        ..Default::default()
                    }),
                ),
                EffectEntry::new(
                    "fireflies",
                    EffectConfig::Fireflies(FirefliesConfig {
                        center: Vec2::new(640.0, 480.0),
                        ..Default::default()
                    }),
                ),
                EffectEntry::new("lens_flare", EffectConfig::LensFlare(LensFlareConfig::default())),
            ],
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Scene file is empty")]
    Empty,
}
