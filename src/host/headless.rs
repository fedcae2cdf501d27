//! In-memory retained scene used for headless runs and tests.

use std::collections::{BTreeMap, HashMap};

use glam::{Vec2, Vec3};
use serde::Serialize;

use super::{AlphaImage, BlendMode, NodeId, NodeSpec, SceneHost, Shape};
use crate::geometry::Rect;

/// A node as stored by the headless scene
#[derive(Debug, Clone, Serialize)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: Option<String>,
    pub parent: Option<NodeId>,
    pub shape: Shape,
    pub position: Vec2,
    pub rotation: f32,
    pub scale: f32,
    pub alpha: f32,
    pub tint: Vec3,
    pub visible: bool,
    pub blend: BlendMode,
    pub depth: i32,
    /// Circle mask (parent-local center, radius)
    pub mask: Option<(Vec2, f32)>,
}

/// Flattened, screen-space view of a node for inspection and JSON dumps
#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub id: u64,
    pub name: Option<String>,
    pub kind: &'static str,
    pub position: [f32; 2],
    pub scale: f32,
    pub rotation: f32,
    pub alpha: f32,
    pub tint: [f32; 3],
}

/// Headless [`SceneHost`] implementation
#[derive(Debug)]
pub struct HeadlessScene {
    viewport: Vec2,
    nodes: BTreeMap<NodeId, SceneNode>,
    names: HashMap<String, NodeId>,
    textures: HashMap<String, AlphaImage>,
    next_id: u64,
}

impl HeadlessScene {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            nodes: BTreeMap::new(),
            names: HashMap::new(),
            textures: HashMap::new(),
            next_id: 1,
        }
    }

    /// Change the viewport size; effects are told separately via their resize hooks
    pub fn resize(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn children_of(&self, parent: NodeId) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.parent == Some(parent))
            .map(|n| n.id)
            .collect()
    }

    /// Whether a node and every ancestor are visible
    pub fn is_effectively_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(cid) = current {
            match self.nodes.get(&cid) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Number of direct children of `parent` whose own visible flag is set
    pub fn visible_count(&self, parent: NodeId) -> usize {
        self.nodes
            .values()
            .filter(|n| n.parent == Some(parent) && n.visible)
            .count()
    }

    /// Screen-space snapshot of every effectively visible node, in draw order
    pub fn snapshot(&self) -> Vec<NodeSnapshot> {
        let mut out: Vec<(i32, NodeSnapshot)> = self
            .nodes
            .values()
            .filter(|n| self.is_effectively_visible(n.id))
            .map(|n| {
                let pos = self.world_position(n.id).unwrap_or(n.position);
                let kind = match n.shape {
                    Shape::Container => "container",
                    Shape::Circle { .. } => "circle",
                    Shape::Image { .. } => "image",
                    Shape::Polygon { .. } => "polygon",
                    Shape::Rect { .. } => "rect",
                };
                (
                    n.depth,
                    NodeSnapshot {
                        id: n.id.0,
                        name: n.name.clone(),
                        kind,
                        position: pos.to_array(),
                        scale: n.scale,
                        rotation: n.rotation,
                        alpha: n.alpha,
                        tint: n.tint.to_array(),
                    },
                )
            })
            .collect();
        out.sort_by_key(|(depth, _)| *depth);
        out.into_iter().map(|(_, s)| s).collect()
    }

    fn world_scale(&self, id: NodeId) -> f32 {
        let mut scale = 1.0;
        let mut current = Some(id);
        while let Some(cid) = current {
            match self.nodes.get(&cid) {
                Some(node) => {
                    scale *= node.scale;
                    current = node.parent;
                }
                None => break,
            }
        }
        scale
    }

    fn with_node(&mut self, id: NodeId, f: impl FnOnce(&mut SceneNode)) {
        if let Some(node) = self.nodes.get_mut(&id) {
            f(node);
        }
    }
}

impl SceneHost for HeadlessScene {
    fn viewport(&self) -> Vec2 {
        self.viewport
    }

    fn spawn(&mut self, spec: NodeSpec) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        if let Some(name) = &spec.name {
            // Latest registration wins, matching scene-graph name lookups
            self.names.insert(name.clone(), id);
        }
        tracing::trace!(id = id.0, name = ?spec.name, parent = ?spec.parent.map(|p| p.0), "Node spawned");

        self.nodes.insert(
            id,
            SceneNode {
                id,
                name: spec.name,
                parent: spec.parent,
                shape: spec.shape,
                position: spec.position,
                rotation: 0.0,
                scale: 1.0,
                alpha: spec.alpha,
                tint: spec.color,
                visible: true,
                blend: spec.blend,
                depth: spec.depth,
                mask: None,
            },
        );
        id
    }

    fn despawn(&mut self, id: NodeId) {
        let mut stack = vec![id];
        let mut removed = 0usize;
        while let Some(current) = stack.pop() {
            stack.extend(self.children_of(current));
            if let Some(node) = self.nodes.remove(&current) {
                removed += 1;
                if let Some(name) = node.name {
                    if self.names.get(&name) == Some(&current) {
                        self.names.remove(&name);
                    }
                }
            }
        }
        tracing::trace!(id = id.0, removed, "Node despawned");
    }

    fn set_position(&mut self, id: NodeId, position: Vec2) {
        self.with_node(id, |n| n.position = position);
    }

    fn set_rotation(&mut self, id: NodeId, radians: f32) {
        self.with_node(id, |n| n.rotation = radians);
    }

    fn set_scale(&mut self, id: NodeId, scale: f32) {
        self.with_node(id, |n| n.scale = scale);
    }

    fn set_alpha(&mut self, id: NodeId, alpha: f32) {
        self.with_node(id, |n| n.alpha = alpha.clamp(0.0, 1.0));
    }

    fn set_tint(&mut self, id: NodeId, color: Vec3) {
        self.with_node(id, |n| n.tint = color);
    }

    fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.with_node(id, |n| n.visible = visible);
    }

    fn set_polygon(&mut self, id: NodeId, points: &[Vec2]) {
        self.with_node(id, |n| {
            if let Shape::Polygon { points: current } = &mut n.shape {
                current.clear();
                current.extend_from_slice(points);
            }
        });
    }

    fn set_circle_mask(&mut self, id: NodeId, center: Vec2, radius: f32) {
        self.with_node(id, |n| n.mask = Some((center, radius)));
    }

    fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    fn world_position(&self, id: NodeId) -> Option<Vec2> {
        let node = self.nodes.get(&id)?;
        let mut pos = node.position;
        let mut parent = node.parent;
        while let Some(pid) = parent {
            let Some(p) = self.nodes.get(&pid) else {
                break;
            };
            pos = p.position + pos * p.scale;
            parent = p.parent;
        }
        Some(pos)
    }

    fn world_bounds(&self, id: NodeId) -> Option<Rect> {
        let node = self.nodes.get(&id)?;
        let center = self.world_position(id)?;
        let half = node.shape.half_extents() * self.world_scale(id);
        Some(Rect::from_center(center, half * 2.0))
    }

    fn has_texture(&self, key: &str) -> bool {
        self.textures.contains_key(key)
    }

    fn register_texture(&mut self, key: &str, image: AlphaImage) {
        self.textures.insert(key.to_string(), image);
    }

    fn texture(&self, key: &str) -> Option<&AlphaImage> {
        self.textures.get(key)
    }
}
