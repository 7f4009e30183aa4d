//! Pan/zoom viewport.
//!
//! `screen = world * zoom + pan`. Zoom is always clamped to
//! `[min_zoom, max_zoom]`, and every zoom about a focal point solves for the
//! new pan so the world point under the focal point stays put.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Factor used by the zoom-in / zoom-out commands.
pub const ZOOM_STEP: f64 = 1.2;

/// Relative zoom change per wheel notch.
pub const WHEEL_STEP: f64 = 0.1;

/// Configuration for the viewport.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Lower zoom bound (default: 0.2).
    pub min_zoom: f64,
    /// Upper zoom bound (default: 5.0).
    pub max_zoom: f64,
    /// Screen size in CSS pixels (default: 1000 x 800).
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.2,
            max_zoom: 5.0,
            width: 1000.0,
            height: 800.0,
        }
    }
}

/// Viewport transform state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub pan_x: f64,
    pub pan_y: f64,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    width: f64,
    height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(&ViewportConfig::default())
    }
}

impl Viewport {
    pub fn new(config: &ViewportConfig) -> Self {
        let (min_zoom, max_zoom) = if config.min_zoom <= config.max_zoom {
            (config.min_zoom, config.max_zoom)
        } else {
            (config.max_zoom, config.min_zoom)
        };
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0_f64.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
            width: config.width,
            height: config.height,
        }
    }

    #[inline]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn zoom_bounds(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Screen-space centre of the viewport.
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    #[inline]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(world.x * self.zoom + self.pan_x, world.y * self.zoom + self.pan_y)
    }

    #[inline]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new((screen.x - self.pan_x) / self.zoom, (screen.y - self.pan_y) / self.zoom)
    }

    /// Convert a screen-space distance to world space.
    #[inline]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Pan by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Multiply zoom by `factor` about a focal screen point.
    ///
    /// Non-finite or non-positive factors are ignored.
    pub fn zoom_by(&mut self, factor: f64, focal_x: f64, focal_y: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.zoom_to(self.zoom * factor, focal_x, focal_y);
    }

    /// Set zoom (clamped) about a focal screen point.
    pub fn zoom_to(&mut self, zoom: f64, focal_x: f64, focal_y: f64) {
        let focal = Point::new(focal_x, focal_y);
        let world = self.screen_to_world(focal);
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.pan_x = focal.x - world.x * self.zoom;
        self.pan_y = focal.y - world.y * self.zoom;
    }

    pub fn zoom_in(&mut self) {
        let c = self.center();
        self.zoom_by(ZOOM_STEP, c.x, c.y);
    }

    pub fn zoom_out(&mut self) {
        let c = self.center();
        self.zoom_by(1.0 / ZOOM_STEP, c.x, c.y);
    }

    /// Wheel zoom about the pointer: scrolling up (negative delta) zooms in.
    pub fn wheel(&mut self, delta_y: f64, x: f64, y: f64) {
        if delta_y == 0.0 || delta_y.is_nan() {
            return;
        }
        self.zoom_by(1.0 - WHEEL_STEP * delta_y.signum(), x, y);
    }

    /// Restore `zoom = 1`, `pan = (0, 0)`.
    pub fn reset(&mut self) {
        self.pan_x = 0.0;
        self.pan_y = 0.0;
        self.zoom = 1.0_f64.clamp(self.min_zoom, self.max_zoom);
    }
}
