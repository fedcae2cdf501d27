//! Lazily generated procedural textures shared across effect instances.
//!
//! Textures are keyed by the parameters that produced them. Once registered
//! with the host they are read-only: nothing here mutates or evicts them.

use std::collections::HashMap;

use glam::Vec2;

use super::{AlphaImage, SceneHost};

/// Alpha threshold used when scanning texture content bounds
const CONTENT_ALPHA_THRESHOLD: u8 = 8;
/// Largest generated edge length; bigger requests are rasterized at this size
pub const MAX_TEXTURE_DIMENSION: u32 = 4096;

/// Parameters of a procedurally generated alpha mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKey {
    /// Soft round dot, `size` pixels across
    Dot { size: u32 },
    /// Hollow ring with the given stroke thickness
    Ring { size: u32, thickness: u32 },
    /// Radial glow with quadratic falloff
    Glow { radius: u32 },
    /// Hard-edged disk
    Disk { radius: u32 },
}

impl TextureKey {
    /// Deterministic registry key for the host texture store
    pub fn cache_key(&self) -> String {
        match self {
            Self::Dot { size } => format!("atmosfx/dot-{size}"),
            Self::Ring { size, thickness } => format!("atmosfx/ring-{size}-{thickness}"),
            Self::Glow { radius } => format!("atmosfx/glow-{radius}"),
            Self::Disk { radius } => format!("atmosfx/disk-{radius}"),
        }
    }

    /// Edge length of the generated image in pixels
    pub fn dimension(&self) -> u32 {
        let dim = match self {
            Self::Dot { size } | Self::Ring { size, .. } => *size,
            Self::Glow { radius } | Self::Disk { radius } => radius.saturating_mul(2),
        };
        dim.clamp(1, MAX_TEXTURE_DIMENSION)
    }

    /// Rasterize the alpha mask
    pub fn generate(&self) -> AlphaImage {
        let dim = self.dimension();
        let mut image = AlphaImage::new(dim, dim);
        let half = dim as f32 * 0.5;

        for y in 0..dim {
            for x in 0..dim {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - Vec2::splat(half);
                let r = p.length() / half;
                let a = match self {
                    Self::Dot { .. } => {
                        // Smooth shoulder over the outer 30%
                        1.0 - smoothstep(0.7, 1.0, r)
                    }
                    Self::Ring { thickness, .. } => {
                        let t = (*thickness as f32 / half).max(1e-3);
                        let d = (r - (1.0 - t * 0.5)).abs();
                        1.0 - smoothstep(t * 0.35, t * 0.5, d)
                    }
                    Self::Glow { .. } => {
                        let f = (1.0 - r).max(0.0);
                        f * f
                    }
                    Self::Disk { .. } => {
                        if r <= 1.0 {
                            1.0
                        } else {
                            0.0
                        }
                    }
                };
                image.set(x, y, (a.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }

        image
    }
}

/// Register the texture for `key` with the host unless it already exists.
/// Returns the host registry key.
pub fn ensure_texture(host: &mut dyn SceneHost, key: TextureKey) -> String {
    let cache_key = key.cache_key();
    if !host.has_texture(&cache_key) {
        tracing::trace!(texture = %cache_key, "Generating procedural texture");
        host.register_texture(&cache_key, key.generate());
    }
    cache_key
}

/// Offset of the visible content center from the image center, per texture.
///
/// Sprites whose art is not centered in the canvas drift off their anchor
/// when scaled; subtracting this offset recenters them. Computed once per
/// distinct texture by scanning the alpha bounding box.
#[derive(Debug, Default)]
pub struct CentroidCache {
    offsets: HashMap<String, Vec2>,
}

impl CentroidCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached content offset for `key`, computing it on first use.
    /// Returns `None` when the host has no such texture.
    pub fn offset(&mut self, host: &dyn SceneHost, key: &str) -> Option<Vec2> {
        if let Some(offset) = self.offsets.get(key) {
            return Some(*offset);
        }
        let image = host.texture(key)?;
        let offset = content_offset(image);
        self.offsets.insert(key.to_string(), offset);
        Some(offset)
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Center of the alpha bounding box relative to the image center, in pixels
pub fn content_offset(image: &AlphaImage) -> Vec2 {
    let mut min = (u32::MAX, u32::MAX);
    let mut max = (0u32, 0u32);
    let mut found = false;

    for y in 0..image.height {
        for x in 0..image.width {
            if image.get(x, y) > CONTENT_ALPHA_THRESHOLD {
                found = true;
                min = (min.0.min(x), min.1.min(y));
                max = (max.0.max(x), max.1.max(y));
            }
        }
    }

    if !found {
        return Vec2::ZERO;
    }

    let bbox_center = Vec2::new(
        (min.0 + max.0 + 1) as f32 * 0.5,
        (min.1 + max.1 + 1) as f32 * 0.5,
    );
    let image_center = Vec2::new(image.width as f32 * 0.5, image.height as f32 * 0.5);
    bbox_center - image_center
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::headless::HeadlessScene;

    #[test]
    fn test_cache_key_is_deterministic() {
        let a = TextureKey::Ring {
            size: 64,
            thickness: 6,
        };
        assert_eq!(a.cache_key(), "atmosfx/ring-64-6");
        assert_eq!(a.cache_key(), a.cache_key());
    }

    #[test]
    fn test_ensure_texture_registers_once() {
        let mut scene = HeadlessScene::new(Vec2::new(100.0, 100.0));
        let k1 = ensure_texture(&mut scene, TextureKey::Dot { size: 16 });
        let k2 = ensure_texture(&mut scene, TextureKey::Dot { size: 16 });
        assert_eq!(k1, k2);
        assert_eq!(scene.texture_count(), 1);

        ensure_texture(&mut scene, TextureKey::Dot { size: 32 });
        assert_eq!(scene.texture_count(), 2);
    }

    #[test]
    fn test_centered_disk_has_zero_offset() {
        let img = TextureKey::Disk { radius: 8 }.generate();
        let off = content_offset(&img);
        assert!(off.length() < 0.01, "offset was {off:?}");
    }

    #[test]
    fn test_off_center_content_offset() {
        let mut img = AlphaImage::new(10, 10);
        // Content occupies the right-hand 4 columns, rows 0..2
        for y in 0..2 {
            for x in 6..10 {
                img.set(x, y, 255);
            }
        }
        let off = content_offset(&img);
        assert!((off.x - 3.0).abs() < 1e-6);
        assert!((off.y + 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_huge_radius_dimension_clamped() {
        let key = TextureKey::Glow { radius: 40_000 };
        assert_eq!(key.dimension(), MAX_TEXTURE_DIMENSION);
        assert_eq!(TextureKey::Disk { radius: u32::MAX }.dimension(), MAX_TEXTURE_DIMENSION);
        assert_eq!(TextureKey::Dot { size: 0 }.dimension(), 1);
    }

    #[test]
    fn test_alpha_image_large_buffer() {
        let img = AlphaImage::new(70_000, 1);
        assert_eq!(img.data.len(), 70_000);
        assert_eq!(img.get(69_999, 0), 0);
    }

    #[test]
    fn test_centroid_cache_missing_texture() {
        let scene = HeadlessScene::new(Vec2::new(100.0, 100.0));
        let mut cache = CentroidCache::new();
        assert!(cache.offset(&scene, "nope").is_none());
        assert!(cache.is_empty());
    }
}
