//! Lens flare following a named light source.
//!
//! Elements are laid out along the line from the source through the viewport
//! center. The source is looked up by name every frame and never owned: when
//! it disappears the flare hides itself and comes back once it reappears.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::host::texture::{ensure_texture, TextureKey};
use crate::host::{BlendMode, NodeId, NodeSpec, SceneHost, Shape};

/// Alpha multiplier while the line of sight is blocked
pub const OCCLUDED_FACTOR: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlareShape {
    #[default]
    Dot,
    Ring,
}

/// One flare sprite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlareElement {
    /// Position along source -> center, in multiples of that distance
    pub offset: f32,
    /// Diameter (px)
    pub size: f32,
    pub shape: FlareShape,
    pub color: Vec3,
    pub alpha: f32,
}

impl Default for FlareElement {
    fn default() -> Self {
        Self {
            offset: 1.0,
            size: 48.0,
            shape: FlareShape::Dot,
            color: Vec3::new(1.0, 0.9, 0.7),
            alpha: 0.4,
        }
    }
}

impl FlareElement {
    fn new(offset: f32, size: f32, shape: FlareShape, color: Vec3, alpha: f32) -> Self {
        Self {
            offset,
            size,
            shape,
            color,
            alpha,
        }
    }
}

/// Lens flare configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LensFlareConfig {
    /// Registry name of the light source node
    pub source: String,
    pub elements: Vec<FlareElement>,
    pub global_alpha: f32,
    /// Distance falloff coefficient
    pub falloff: f32,
    /// Registry names of nodes that block the line of sight
    pub occluders: Vec<String>,
    /// Relative tint shimmer per element
    pub shimmer: f32,
    pub depth: i32,
}

impl Default for LensFlareConfig {
    fn default() -> Self {
        Self {
            source: "sun".to_string(),
            elements: vec![
                FlareElement::new(0.35, 28.0, FlareShape::Dot, Vec3::new(1.0, 0.85, 0.6), 0.35),
                FlareElement::new(0.7, 54.0, FlareShape::Ring, Vec3::new(0.7, 0.9, 1.0), 0.25),
                FlareElement::new(1.0, 20.0, FlareShape::Dot, Vec3::new(1.0, 0.7, 0.5), 0.4),
                FlareElement::new(1.4, 72.0, FlareShape::Ring, Vec3::new(0.8, 0.7, 1.0), 0.2),
                FlareElement::new(1.8, 36.0, FlareShape::Dot, Vec3::new(0.6, 1.0, 0.8), 0.3),
            ],
            global_alpha: 0.8,
            falloff: 0.6,
            occluders: Vec::new(),
            shimmer: 0.08,
            depth: 40,
        }
    }
}

/// Per-element result of the last update
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElementState {
    pub position: Vec2,
    pub alpha: f32,
    pub tint: Vec3,
    pub visible: bool,
    pub occluded: bool,
}

impl Default for ElementState {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            alpha: 0.0,
            tint: Vec3::ONE,
            visible: false,
            occluded: false,
        }
    }
}

/// `clamp(1 - (distance / half_diagonal) * coefficient, 0, 1)`
pub fn distance_falloff(distance: f32, half_diagonal: f32, coefficient: f32) -> f32 {
    if half_diagonal <= 0.0 {
        return 1.0;
    }
    (1.0 - (distance / half_diagonal) * coefficient).clamp(0.0, 1.0)
}

/// Lens flare effect
#[derive(Debug)]
pub struct LensFlareSystem {
    config: LensFlareConfig,
    root: NodeId,
    nodes: Vec<NodeId>,
    states: Vec<ElementState>,
    visible: bool,
    /// Last lookup outcome, for edge-triggered logging
    source_found: Option<bool>,
    destroyed: bool,
}

impl LensFlareSystem {
    pub fn new(host: &mut dyn SceneHost, name: &str, config: LensFlareConfig) -> Self {
        let root = host.spawn(NodeSpec::container().named(name).depth(config.depth));

        let nodes = config
            .elements
            .iter()
            .map(|element| {
                let size = element.size.max(1.0);
                let dim = size.round() as u32;
                let key = match element.shape {
                    FlareShape::Dot => TextureKey::Dot { size: dim },
                    FlareShape::Ring => TextureKey::Ring {
                        size: dim,
                        thickness: (dim / 10).max(1),
                    },
                };
                let texture = ensure_texture(host, key);
                host.spawn(
                    NodeSpec::new(Shape::Image {
                        texture,
                        size: Vec2::splat(size),
                    })
                    .child_of(root)
                    .color(element.color)
                    .alpha(0.0)
                    .blend(BlendMode::Add),
                )
            })
            .collect();

        // Hidden until the source has been resolved once
        host.set_visible(root, false);
        tracing::debug!(name, source = %config.source, elements = config.elements.len(), "Lens flare created");

        Self {
            states: vec![ElementState::default(); config.elements.len()],
            config,
            root,
            nodes,
            visible: false,
            source_found: None,
            destroyed: false,
        }
    }

    pub fn node(&self) -> NodeId {
        self.root
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn elements_state(&self) -> &[ElementState] {
        &self.states
    }

    /// Reposition and fade every element for this frame
    pub fn update(&mut self, host: &mut dyn SceneHost, elapsed: f32) {
        if self.destroyed {
            return;
        }
        let source = host
            .find_by_name(&self.config.source)
            .and_then(|id| host.world_position(id));

        let found = source.is_some();
        if self.source_found != Some(found) {
            if found {
                tracing::debug!(source = %self.config.source, "Lens flare source found");
            } else {
                tracing::debug!(source = %self.config.source, "Lens flare source lost, hiding flare");
            }
            self.source_found = Some(found);
        }

        let Some(source) = source else {
            if self.visible {
                host.set_visible(self.root, false);
                self.visible = false;
            }
            for state in &mut self.states {
                state.visible = false;
            }
            return;
        };

        if !self.visible {
            host.set_visible(self.root, true);
            self.visible = true;
        }

        let viewport = host.viewport();
        let center = viewport * 0.5;
        let half_diagonal = center.length();
        let to_center = center - source;
        let distance = to_center.length();
        let direction = to_center.normalize_or_zero();
        let falloff = distance_falloff(distance, half_diagonal, self.config.falloff);

        let occluders: Vec<Rect> = self
            .config
            .occluders
            .iter()
            .filter_map(|name| host.find_by_name(name))
            .filter_map(|id| host.world_bounds(id))
            .collect();

        let elements = self.config.elements.iter().zip(&self.nodes).zip(&mut self.states);
        for (i, ((element, &node), state)) in elements.enumerate() {
            let position = center + direction * distance * element.offset;
            let occluded = occluders
                .iter()
                .any(|rect| rect.intersects_segment(source, position));
            // Occlusion scales the clamped alpha so it stays an exact ratio
            let occlusion = if occluded { OCCLUDED_FACTOR } else { 1.0 };
            let alpha = (element.alpha * self.config.global_alpha * falloff).clamp(0.0, 1.0) * occlusion;

            let shimmer = 1.0 + self.config.shimmer * (elapsed * 1.7 + i as f32 * 2.1).sin();
            let tint = (element.color * shimmer).clamp(Vec3::ZERO, Vec3::ONE);

            host.set_position(node, position);
            host.set_alpha(node, alpha);
            host.set_tint(node, tint);

            *state = ElementState {
                position,
                alpha,
                tint,
                visible: true,
                occluded,
            };
        }
    }

    pub fn resize(&mut self, _host: &mut dyn SceneHost, _viewport: Vec2) {}

    pub fn destroy(&mut self, host: &mut dyn SceneHost) {
        host.despawn(self.root);
        self.nodes.clear();
        self.states.clear();
        self.visible = false;
        self.destroyed = true;
    }
}
