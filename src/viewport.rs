//! Logical design space to on-screen pixels.
//!
//! The project has fixed logical dimensions. The viewport fits them into the
//! container without ever upscaling, and applies the device pixel ratio only to
//! the backing store resolution.

use egui::{Pos2, Rect, Vec2};
use log::debug;

/// Smallest display scale handed out, so a collapsed container cannot produce
/// a zero or negative scale.
pub const MIN_SCALE: f32 = 0.01;

/// `min(container.x / logical.x, container.y / logical.y, 1.0)`
pub fn compute_scale(container: Vec2, logical: Vec2) -> f32 {
    if logical.x <= 0.0 || logical.y <= 0.0 {
        return 1.0;
    }
    let scale_x = container.x / logical.x;
    let scale_y = container.y / logical.y;
    scale_x.min(scale_y).min(1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    logical: Vec2,
    padding: f32,
    container: Vec2,
    scale: f32,
    pixels_per_point: f32,
}

impl Viewport {
    pub fn new(logical: Vec2, padding: f32) -> Self {
        Self {
            logical,
            padding,
            container: logical + Vec2::splat(padding),
            scale: 1.0,
            pixels_per_point: 1.0,
        }
    }

    /// Recompute after the container changed size. The only way the scale
    /// ever changes.
    pub fn resize(&mut self, container: Vec2, pixels_per_point: f32) -> f32 {
        self.container = container;
        self.pixels_per_point = if pixels_per_point > 0.0 { pixels_per_point } else { 1.0 };
        let available = container - Vec2::splat(self.padding);
        self.scale = compute_scale(available, self.logical).max(MIN_SCALE);
        debug!(
            "Viewport resized to {:?} (dpr {}), scale {}",
            container, self.pixels_per_point, self.scale
        );
        self.scale
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn pixels_per_point(&self) -> f32 {
        self.pixels_per_point
    }

    pub fn logical_size(&self) -> Vec2 {
        self.logical
    }

    pub fn container_size(&self) -> Vec2 {
        self.container
    }

    /// On-screen size of the canvas
    pub fn display_size(&self) -> Vec2 {
        self.logical * self.scale
    }

    /// Resolution of the drawing buffer. High density displays get a buffer
    /// of logical size times the pixel ratio; object coordinates never change.
    pub fn backing_size(&self) -> Vec2 {
        if self.pixels_per_point > 1.0 {
            self.logical * self.pixels_per_point
        } else {
            self.logical
        }
    }

    /// Canvas rectangle centered in a container whose top-left is `origin`
    pub fn canvas_rect(&self, origin: Pos2) -> Rect {
        let offset = (self.container - self.display_size()) * 0.5;
        Rect::from_min_size(origin + offset, self.display_size())
    }

    /// Screen position (relative to the canvas' top-left) to logical space
    pub fn screen_to_logical(&self, screen: Pos2) -> Pos2 {
        Pos2::new(screen.x / self.scale, screen.y / self.scale)
    }

    /// Logical position to screen space relative to the canvas' top-left
    pub fn logical_to_screen(&self, logical: Pos2) -> Pos2 {
        Pos2::new(logical.x * self.scale, logical.y * self.scale)
    }
}
