//! Crop mode: a resizable overlay over the target image, optionally locked
//! to an aspect ratio, applied as a new source region of the image on commit.
//!
//! While a session is active the target image is passive (not selectable, not
//! evented) and its original geometry is kept in a snapshot so `cancel` can
//! put it back exactly.

use egui::{Pos2, Rect, Vec2};
use log::{debug, info, warn};

use crate::config::EditorConfig;
use crate::element::{
    Geometry, Interactivity, ObjectId, ObjectKind, SourceRect, VisualObject, calculate_bounds, factory,
    rotate, validate_size,
};
use crate::error::{CropError, TransitionError};
use crate::scene::{Scene, SceneBlob};
use crate::state::ToolMode;
use crate::tool::Tool;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectPreset {
    pub label: &'static str,
    /// Width divided by height, `None` for free-form
    pub ratio: Option<f32>,
    pub display: &'static str,
}

pub const ASPECT_RATIOS: [AspectPreset; 5] = [
    AspectPreset { label: "Freeform", ratio: None, display: "" },
    AspectPreset { label: "Square", ratio: Some(1.0), display: "1:1" },
    AspectPreset { label: "Widescreen", ratio: Some(16.0 / 9.0), display: "16:9" },
    AspectPreset { label: "Portrait", ratio: Some(4.0 / 5.0), display: "4:5" },
    AspectPreset { label: "Story", ratio: Some(9.0 / 16.0), display: "9:16" },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSettings {
    /// Margin on each side of the target bounds for a new overlay, as a fraction
    pub inset: f32,
    /// Relative tolerance of the aspect constraint
    pub tolerance: f32,
    /// Smallest region that can be committed, in logical pixels
    pub min_size: f32,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self::from(&EditorConfig::default())
    }
}

impl From<&EditorConfig> for CropSettings {
    fn from(config: &EditorConfig) -> Self {
        Self {
            inset: config.crop_inset,
            tolerance: config.aspect_tolerance,
            min_size: config.min_crop_size,
        }
    }
}

/// What the target looked like before the session started
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSnapshot {
    pub geometry: Geometry,
    pub interactivity: Interactivity,
}

#[derive(Debug, Clone, Copy)]
struct ActiveCrop {
    target: ObjectId,
    overlay: ObjectId,
    snapshot: CropSnapshot,
}

#[derive(Debug)]
pub struct CropSession {
    settings: CropSettings,
    active: Option<ActiveCrop>,
    aspect_ratio: Option<f32>,
}

impl CropSession {
    pub fn new(settings: CropSettings) -> Self {
        Self {
            settings,
            active: None,
            aspect_ratio: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn target(&self) -> Option<ObjectId> {
        self.active.map(|active| active.target)
    }

    pub fn overlay(&self) -> Option<ObjectId> {
        self.active.map(|active| active.overlay)
    }

    pub fn snapshot(&self) -> Option<CropSnapshot> {
        self.active.map(|active| active.snapshot)
    }

    pub fn aspect_ratio(&self) -> Option<f32> {
        self.aspect_ratio
    }

    /// Current overlay region in logical space
    pub fn overlay_rect(&self, scene: &Scene) -> Option<Rect> {
        let overlay = scene.object(self.overlay()?)?;
        Some(overlay.bounding_rect())
    }

    /// Start cropping `target`. Returns false, doing nothing, when a session
    /// is already running or `target` is not an image in the scene.
    pub fn begin(&mut self, scene: &mut Scene, target: Option<ObjectId>) -> bool {
        if self.active.is_some() {
            debug!("Crop already active");
            return false;
        }
        let Some(image) = target.and_then(|id| scene.object(id)).filter(|o| o.is_image()) else {
            debug!("No image to crop");
            return false;
        };

        let target = image.id();
        let snapshot = CropSnapshot {
            geometry: image.geometry,
            interactivity: image.interactivity,
        };
        let bounds = image.bounding_rect();

        Self::remove_stray_overlays(scene);
        scene.modify(target, |object| object.interactivity = Interactivity::PASSIVE);

        let inset = self.settings.inset;
        let region = Rect::from_min_size(
            bounds.min + bounds.size() * inset,
            bounds.size() * (1.0 - 2.0 * inset),
        );
        let overlay = scene.add_object(factory::crop_overlay(region));
        scene.set_active_object(Some(overlay));

        info!("Crop started on {} with region {:?}", target, region);
        self.active = Some(ActiveCrop {
            target,
            overlay,
            snapshot,
        });
        self.aspect_ratio = None;
        true
    }

    /// Remove every crop overlay in the scene. There may only ever be one.
    pub fn remove_stray_overlays(scene: &mut Scene) -> usize {
        let strays: Vec<ObjectId> = scene
            .objects()
            .iter()
            .filter(|object| object.is_crop_overlay())
            .map(VisualObject::id)
            .collect();
        for id in &strays {
            scene.remove_object(*id);
        }
        if !strays.is_empty() {
            debug!("Removed {} stray crop overlays", strays.len());
        }
        strays.len()
    }

    /// Lock the overlay to `ratio` (width / height), or unlock with `None`.
    ///
    /// A new ratio reshapes the overlay right away around its center, taking
    /// the height from the width and shrinking the width if the height would
    /// not fit over the target.
    pub fn set_aspect_ratio(&mut self, scene: &mut Scene, ratio: Option<f32>) {
        let ratio = ratio.filter(|r| r.is_finite() && *r > 0.0);
        self.aspect_ratio = ratio;

        let (Some(ratio), Some(active)) = (ratio, self.active) else {
            return;
        };
        let max_height = scene
            .object(active.target)
            .map(|target| target.bounding_rect().height())
            .unwrap_or(f32::INFINITY);
        let min_size = self.settings.min_size;

        scene.modify(active.overlay, |overlay| {
            let center = overlay.center();
            let size = overlay.scaled_size();
            let mut width = size.x;
            let mut height = width / ratio;
            if height > max_height {
                height = max_height;
                width = height * ratio;
            }
            let size = clamp_to_min(Vec2::new(width, height), min_size, Some(ratio));
            set_displayed_size(overlay, size);
            overlay.set_center(center);
        });
    }

    /// The user dragged a resize handle: new scale factors for the overlay,
    /// relative to its current rectangle. Returns the resulting displayed size.
    ///
    /// The scale is folded into the rectangle, so the overlay always keeps unit
    /// scale and never shrinks below the minimum crop size.
    pub fn scale_overlay(&mut self, scene: &mut Scene, scale_x: f32, scale_y: f32) -> Option<Vec2> {
        let overlay = self.overlay()?;
        let size = scene.object(overlay)?.kind.intrinsic_size();
        self.resize_overlay(scene, size.x * scale_x.abs(), size.y * scale_y.abs())
    }

    /// Resize the overlay to `width` x `height` logical units, subject to the
    /// aspect constraint. Width wins when the two disagree.
    pub fn resize_overlay(&mut self, scene: &mut Scene, width: f32, height: f32) -> Option<Vec2> {
        let overlay = self.overlay()?;
        let ratio = self.aspect_ratio;
        let mut size = Vec2::new(width, height);
        if let Some(ratio) = ratio {
            size = enforce_ratio(size, ratio, self.settings.tolerance);
        }
        let size = clamp_to_min(size, self.settings.min_size, ratio);
        scene.modify(overlay, |overlay| {
            overlay.geometry.scale_x = 1.0;
            overlay.geometry.scale_y = 1.0;
            set_displayed_size(overlay, size);
            overlay.scaled_size()
        })
    }

    /// Drag of a corner handle: span the overlay between the fixed `anchor`
    /// corner and `pointer`, subject to the aspect constraint. The anchor stays
    /// in place. Returns the new overlay bounds.
    pub fn resize_from_corner(&mut self, scene: &mut Scene, anchor: Pos2, pointer: Pos2) -> Option<Rect> {
        let delta = pointer - anchor;
        let size = self.resize_overlay(scene, delta.x.abs(), delta.y.abs())?;
        let left = if delta.x < 0.0 { anchor.x - size.x } else { anchor.x };
        let top = if delta.y < 0.0 { anchor.y - size.y } else { anchor.y };
        self.move_overlay(scene, left, top);
        self.overlay_rect(scene)
    }

    pub fn move_overlay(&mut self, scene: &mut Scene, left: f32, top: f32) -> bool {
        let Some(overlay) = self.overlay() else {
            return false;
        };
        scene
            .modify(overlay, |overlay| {
                overlay.geometry.left = left;
                overlay.geometry.top = top;
            })
            .is_some()
    }

    /// Drop the overlay and put the target back exactly as it was. Safe to
    /// call at any time.
    pub fn cancel(&mut self, scene: &mut Scene) -> bool {
        self.aspect_ratio = None;
        let Some(active) = self.active.take() else {
            return false;
        };

        scene.remove_object(active.overlay);
        Self::remove_stray_overlays(scene);
        let restored = scene
            .modify(active.target, |target| {
                target.geometry = active.snapshot.geometry;
                target.interactivity = active.snapshot.interactivity;
            })
            .is_some();
        if restored {
            scene.set_active_object(Some(active.target));
        }
        info!("Crop cancelled");
        true
    }

    /// Apply the overlay region as the image's new visible source region and
    /// end the session.
    ///
    /// The overlay is mapped into the image's source pixels through its
    /// rotation and scale and clipped to what is currently visible. The image
    /// is moved so the kept part stays where the overlay was.
    pub fn commit(&mut self, scene: &mut Scene) -> Result<ObjectId, CropError> {
        let active = self.active.ok_or(CropError::NotActive)?;

        let Some(target) = scene.object(active.target) else {
            warn!("Crop target {} vanished", active.target);
            self.cancel(scene);
            return Err(CropError::TargetMissing);
        };
        let overlay = scene
            .object(active.overlay)
            .map(VisualObject::corners)
            .ok_or(CropError::NotActive)?;

        let (crop, center) = self.cropped_region(target, &overlay)?;

        scene.remove_object(active.overlay);
        Self::remove_stray_overlays(scene);
        scene.modify(active.target, |image| {
            if let ObjectKind::Image(data) = &mut image.kind {
                data.crop = crop;
            }
            image.interactivity = active.snapshot.interactivity;
            image.set_center(center);
        });
        scene.set_active_object(Some(active.target));

        info!("Crop committed on {}: {:?}", active.target, crop);
        self.active = None;
        self.aspect_ratio = None;
        Ok(active.target)
    }

    /// New source region and new center of `image` for an overlay with the
    /// given corners
    fn cropped_region(&self, image: &VisualObject, overlay: &[Pos2; 4]) -> Result<(SourceRect, Pos2), CropError> {
        let Some(data) = image.as_image() else {
            return Err(CropError::TargetMissing);
        };

        let local: Vec<Pos2> = overlay.iter().map(|corner| image.to_local(*corner)).collect();
        let visible = Rect::from_min_size(Pos2::ZERO, Vec2::new(data.crop.width, data.crop.height));
        let region = calculate_bounds(&local).intersect(visible);

        let scale = Vec2::new(image.geometry.scale_x.abs(), image.geometry.scale_y.abs());
        let displayed = Vec2::new(region.width() * scale.x, region.height() * scale.y);
        if !region.is_positive() || !validate_size(displayed, self.settings.min_size) {
            return Err(CropError::InvalidRegion {
                width: displayed.x.max(0.0),
                height: displayed.y.max(0.0),
            });
        }

        let crop = SourceRect {
            x: data.crop.x + region.min.x,
            y: data.crop.y + region.min.y,
            width: region.width(),
            height: region.height(),
        };

        let half = visible.size() * 0.5;
        let offset = region.center() - Pos2::new(half.x, half.y);
        let center = image.center() + rotate(Vec2::new(offset.x * scale.x, offset.y * scale.y), image.geometry.angle);
        Ok((crop, center))
    }
}

/// Set the displayed size of a rectangle shape without touching its scale
fn set_displayed_size(object: &mut VisualObject, size: Vec2) {
    let scale_x = object.geometry.scale_x.abs().max(f32::EPSILON);
    let scale_y = object.geometry.scale_y.abs().max(f32::EPSILON);
    if let ObjectKind::Shape(shape) = &mut object.kind {
        shape.width = size.x / scale_x;
        shape.height = size.y / scale_y;
    }
}

/// Bring `width / height` back to `ratio` by recomputing the height
fn enforce_ratio(size: Vec2, ratio: f32, tolerance: f32) -> Vec2 {
    if size.y <= 0.0 || ((size.x / size.y) - ratio).abs() / ratio > tolerance {
        Vec2::new(size.x, size.x / ratio)
    } else {
        size
    }
}

/// Grow `size` so neither side is below `min_size`, keeping `ratio` if set.
/// Non-finite sides count as too small.
fn clamp_to_min(size: Vec2, min_size: f32, ratio: Option<f32>) -> Vec2 {
    let min_size = min_size.max(f32::EPSILON);
    match ratio {
        Some(ratio) => {
            let mut width = size.x.max(min_size);
            let mut height = width / ratio;
            if height < min_size {
                height = min_size;
                width = height * ratio;
            }
            Vec2::new(width, height)
        }
        None => Vec2::new(size.x.max(min_size), size.y.max(min_size)),
    }
}

impl Tool for CropSession {
    fn name(&self) -> &'static str {
        "crop"
    }

    fn activate(&mut self, scene: &mut Scene) -> Result<(), TransitionError> {
        let target = scene.primary_image().map(VisualObject::id);
        if self.begin(scene, target) {
            Ok(())
        } else {
            Err(TransitionError::NoTargetImage { mode: ToolMode::Crop })
        }
    }

    fn deactivate(&mut self, scene: &mut Scene) {
        self.cancel(scene);
    }

    fn sanitize_blob(&self, blob: &mut SceneBlob) {
        if let Some(active) = self.active {
            if let Some(target) = blob.object_mut(active.target) {
                target.geometry = active.snapshot.geometry;
                target.interactivity = active.snapshot.interactivity;
            }
        }
    }
}
