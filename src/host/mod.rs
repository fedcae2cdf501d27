//! Host scene abstraction.
//!
//! The effect systems never draw anything themselves. They create renderable
//! nodes through a [`SceneHost`], push positions/scales/alphas into them every
//! frame, and look up other nodes by name. Any 2D scene graph can implement
//! the trait; [`headless::HeadlessScene`] is an in-memory implementation used
//! by the runner binary and the tests.

pub mod headless;
pub mod texture;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Opaque handle to a node owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Geometry of a renderable node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Grouping node with no visual of its own
    Container,
    /// Filled circle
    Circle { radius: f32 },
    /// Textured quad; `size` is the unscaled on-screen size
    Image { texture: String, size: Vec2 },
    /// Closed filled polygon in node-local coordinates
    Polygon { points: Vec<Vec2> },
    /// Axis-aligned rectangle centered on the node position
    Rect { size: Vec2 },
}

impl Shape {
    /// Half-extents of the unscaled shape around the node origin
    pub fn half_extents(&self) -> Vec2 {
        match self {
            Self::Container => Vec2::ZERO,
            Self::Circle { radius } => Vec2::splat(radius.abs()),
            Self::Image { size, .. } | Self::Rect { size } => size.abs() * 0.5,
            Self::Polygon { points } => points
                .iter()
                .fold(Vec2::ZERO, |acc, p| acc.max(p.abs())),
        }
    }
}

/// How a node is composited onto what is behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Add,
    Screen,
}

/// Everything needed to create a node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub shape: Shape,
    /// Registry name; named nodes can be found with [`SceneHost::find_by_name`]
    pub name: Option<String>,
    /// Parent node; positions are relative to the parent origin
    pub parent: Option<NodeId>,
    pub position: Vec2,
    pub color: Vec3,
    pub alpha: f32,
    pub blend: BlendMode,
    /// Draw order; higher values draw on top
    pub depth: i32,
}

impl NodeSpec {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            name: None,
            parent: None,
            position: Vec2::ZERO,
            color: Vec3::ONE,
            alpha: 1.0,
            blend: BlendMode::Normal,
            depth: 0,
        }
    }

    pub fn container() -> Self {
        Self::new(Shape::Container)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn child_of(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }
}

/// Single-channel alpha mask backing a texture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphaImage {
    pub width: u32,
    pub height: u32,
    /// Row-major alpha values, `width * height` bytes
    pub data: Vec<u8>,
}

impl AlphaImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// Alpha at pixel (x, y); zero outside the image
    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x < self.width && y < self.height {
            self.data[y as usize * self.width as usize + x as usize]
        } else {
            0
        }
    }

    pub fn set(&mut self, x: u32, y: u32, alpha: u8) {
        if x < self.width && y < self.height {
            self.data[y as usize * self.width as usize + x as usize] = alpha;
        }
    }
}

/// The rendering/scene-graph API the effect systems are driven through.
///
/// All setters silently ignore unknown node ids: a node destroyed by the host
/// behind an effect's back must not fail the frame.
pub trait SceneHost {
    /// Current viewport size in pixels
    fn viewport(&self) -> Vec2;

    /// Create a node and return its handle
    fn spawn(&mut self, spec: NodeSpec) -> NodeId;

    /// Destroy a node and all of its children
    fn despawn(&mut self, id: NodeId);

    fn set_position(&mut self, id: NodeId, position: Vec2);

    /// Rotation in radians, clockwise on screen
    fn set_rotation(&mut self, id: NodeId, radians: f32);

    fn set_scale(&mut self, id: NodeId, scale: f32);

    fn set_alpha(&mut self, id: NodeId, alpha: f32);

    fn set_tint(&mut self, id: NodeId, color: Vec3);

    fn set_visible(&mut self, id: NodeId, visible: bool);

    /// Replace the outline of a polygon node
    fn set_polygon(&mut self, id: NodeId, points: &[Vec2]);

    /// Clip a node (and its children) to a circle in parent-local coordinates
    fn set_circle_mask(&mut self, id: NodeId, center: Vec2, radius: f32);

    /// Resolve a registry name to a node, if one currently exists
    fn find_by_name(&self, name: &str) -> Option<NodeId>;

    /// Position of the node origin in screen space
    fn world_position(&self, id: NodeId) -> Option<Vec2>;

    /// Screen-space bounding rectangle of the node's own shape
    fn world_bounds(&self, id: NodeId) -> Option<Rect>;

    fn has_texture(&self, key: &str) -> bool;

    fn register_texture(&mut self, key: &str, image: AlphaImage);

    fn texture(&self, key: &str) -> Option<&AlphaImage>;
}
