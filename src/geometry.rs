//! Screen-space geometry helpers shared by the effect systems.
//!
//! All coordinates are y-down: the top edge of the viewport is `y = 0`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle given by its top-left corner and size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width (may be stored negative; use [`Rect::normalized`])
    pub width: f32,
    /// Height (may be stored negative; use [`Rect::normalized`])
    pub height: f32,
}

impl Default for Rect {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of `size` centered on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::new(center.x - size.x * 0.5, center.y - size.y * 0.5, size.x, size.y)
    }

    /// Same rectangle with non-negative width and height
    pub fn normalized(&self) -> Self {
        let (x, width) = if self.width < 0.0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0.0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        Self::new(x, y, width, height)
    }

    pub fn min(&self) -> Vec2 {
        let r = self.normalized();
        Vec2::new(r.x, r.y)
    }

    pub fn max(&self) -> Vec2 {
        let r = self.normalized();
        Vec2::new(r.x + r.width, r.y + r.height)
    }

    pub fn center(&self) -> Vec2 {
        (self.min() + self.max()) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max() - self.min()
    }

    /// Shrink by `margin` on every side, collapsing to the center if too small
    pub fn inset(&self, margin: f32) -> Self {
        let r = self.normalized();
        let mx = margin.min(r.width * 0.5).max(0.0);
        let my = margin.min(r.height * 0.5).max(0.0);
        Self::new(r.x + mx, r.y + my, r.width - 2.0 * mx, r.height - 2.0 * my)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }

    /// Whether the segment `a -> b` touches this rectangle.
    ///
    /// Liang-Barsky clipping: the segment is parameterized as `a + t * (b - a)`
    /// and clipped against each slab; it intersects if a non-empty `t` range survives.
    pub fn intersects_segment(&self, a: Vec2, b: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        let d = b - a;
        let mut t0 = 0.0_f32;
        let mut t1 = 1.0_f32;

        let checks = [
            (-d.x, a.x - min.x),
            (d.x, max.x - a.x),
            (-d.y, a.y - min.y),
            (d.y, max.y - a.y),
        ];

        for (p, q) in checks {
            if p.abs() < f32::EPSILON {
                // Parallel to this slab: reject if outside it
                if q < 0.0 {
                    return false;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                if t > t1 {
                    return false;
                }
                t0 = t0.max(t);
            } else {
                if t < t0 {
                    return false;
                }
                t1 = t1.min(t);
            }
        }

        t0 <= t1
    }
}

/// Viewport corner used for pinning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Resolve a corner plus an inward offset into a screen position.
    ///
    /// Offsets always point into the viewport, so `(40, 40)` on `BottomRight`
    /// lands 40px left of and 40px above the corner.
    pub fn resolve(&self, viewport: Vec2, offset: Vec2) -> Vec2 {
        match self {
            Self::TopLeft => offset,
            Self::TopRight => Vec2::new(viewport.x - offset.x, offset.y),
            Self::BottomLeft => Vec2::new(offset.x, viewport.y - offset.y),
            Self::BottomRight => viewport - offset,
        }
    }
}
