//! Drawing surface geometry and high-DPI handling
//!
//! Three coordinate spaces are involved:
//! - viewport: CSS pixels relative to the page (pointer events)
//! - local: logical game pixels, `(0,0)..(logical_width, logical_height)`
//! - backing: physical pixels of the canvas buffer (`rect * dpr`)

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH};

/// Bounding rectangle of the surface in viewport space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewportRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMetrics {
    /// Logical size the game simulates in
    pub logical: Vec2,
    /// Where the surface sits on the page
    pub rect: ViewportRect,
    pub device_pixel_ratio: f32,
}

impl Default for SurfaceMetrics {
    fn default() -> Self {
        Self::new(DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT)
    }
}

impl SurfaceMetrics {
    /// Surface shown 1:1 at the page origin
    pub fn new(logical_width: f32, logical_height: f32) -> Self {
        Self {
            logical: Vec2::new(logical_width, logical_height),
            rect: ViewportRect {
                left: 0.0,
                top: 0.0,
                width: logical_width,
                height: logical_height,
            },
            device_pixel_ratio: 1.0,
        }
    }

    pub fn with_rect(mut self, rect: ViewportRect) -> Self {
        self.rect = rect;
        self
    }

    pub fn with_device_pixel_ratio(mut self, dpr: f32) -> Self {
        self.device_pixel_ratio = dpr;
        self
    }

    fn dpr(&self) -> f32 {
        if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }

    /// Displayed CSS size, falling back to the logical size when the
    /// element has not been laid out yet
    fn displayed_size(&self) -> Vec2 {
        let w = if self.rect.width > 0.0 { self.rect.width } else { self.logical.x };
        let h = if self.rect.height > 0.0 { self.rect.height } else { self.logical.y };
        Vec2::new(w, h)
    }

    /// Viewport (client) coordinates to logical surface coordinates
    pub fn viewport_to_local(&self, x: f32, y: f32) -> Vec2 {
        let offset = Vec2::new(x - self.rect.left, y - self.rect.top);
        let displayed = self.displayed_size();
        if displayed.x <= 0.0 || displayed.y <= 0.0 {
            return offset;
        }
        offset * (self.logical / displayed)
    }

    /// Backing-buffer size the surface should have: `rect * dpr`
    pub fn backing_size(&self) -> (u32, u32) {
        let size = (self.displayed_size() * self.dpr()).round().max(Vec2::ONE);
        (size.x as u32, size.y as u32)
    }

    /// New backing size if `current` no longer matches the displayed size
    pub fn needs_resize(&self, current: (u32, u32)) -> Option<(u32, u32)> {
        let wanted = self.backing_size();
        (wanted != current).then_some(wanted)
    }

    /// Scale from logical to backing pixels (the draw transform)
    pub fn logical_to_backing_scale(&self) -> Vec2 {
        let (w, h) = self.backing_size();
        if self.logical.x <= 0.0 || self.logical.y <= 0.0 {
            return Vec2::splat(self.dpr());
        }
        Vec2::new(w as f32, h as f32) / self.logical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_to_local_offsets_and_scales() {
        let metrics = SurfaceMetrics::new(480.0, 640.0).with_rect(ViewportRect {
            left: 100.0,
            top: 50.0,
            width: 240.0,
            height: 320.0,
        });
        // Canvas displayed at half size: one CSS pixel is two logical pixels
        assert_eq!(metrics.viewport_to_local(100.0, 50.0), Vec2::ZERO);
        assert_eq!(metrics.viewport_to_local(220.0, 210.0), Vec2::new(240.0, 320.0));
    }

    #[test]
    fn test_backing_size_uses_dpr() {
        let metrics = SurfaceMetrics::new(480.0, 640.0).with_device_pixel_ratio(2.0);
        assert_eq!(metrics.backing_size(), (960, 1280));
        assert_eq!(metrics.needs_resize((480, 640)), Some((960, 1280)));
        assert_eq!(metrics.needs_resize((960, 1280)), None);
        assert_eq!(metrics.logical_to_backing_scale(), Vec2::splat(2.0));
    }

    #[test]
    fn test_bad_dpr_and_unlaid_rect() {
        let metrics = SurfaceMetrics::new(300.0, 200.0)
            .with_rect(ViewportRect::default())
            .with_device_pixel_ratio(f32::NAN);
        assert_eq!(metrics.backing_size(), (300, 200));
        assert_eq!(metrics.viewport_to_local(30.0, 20.0), Vec2::new(30.0, 20.0));
    }
}
