use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod common;
pub(crate) mod image;
pub(crate) mod shape;
pub(crate) mod text;

pub(crate) use common::{calculate_bounds, rotate, validate_size};
pub use self::image::{Filter, FilterKind, ImageData, SourceRect};
pub use shape::{ShapeData, StrokeStyle};
pub use text::{TextAlign, TextData, TextStyle};

/// Stable identifier of a visual object, kept across save and restore
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which point of the object `left`/`top` refer to. Rotation happens about
/// that same point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    #[default]
    TopLeft,
    Center,
}

/// Placement of an object in logical canvas space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub left: f32,
    pub top: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Clockwise rotation in degrees
    pub angle: f32,
    pub origin: Origin,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            origin: Origin::TopLeft,
        }
    }
}

impl Geometry {
    pub fn at(left: f32, top: f32) -> Self {
        Self {
            left,
            top,
            ..Self::default()
        }
    }

    pub fn centered(center: Pos2, scale: f32) -> Self {
        Self {
            left: center.x,
            top: center.y,
            scale_x: scale,
            scale_y: scale,
            angle: 0.0,
            origin: Origin::Center,
        }
    }
}

/// Whether the user can pick and drag an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interactivity {
    pub selectable: bool,
    pub evented: bool,
}

impl Default for Interactivity {
    fn default() -> Self {
        Self {
            selectable: true,
            evented: true,
        }
    }
}

impl Interactivity {
    pub const PASSIVE: Interactivity = Interactivity {
        selectable: false,
        evented: false,
    };
}

/// Kind-specific payload of a visual object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectKind {
    Image(ImageData),
    Shape(ShapeData),
    Text(TextData),
}

impl ObjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Image(_) => "image",
            ObjectKind::Shape(_) => "shape",
            ObjectKind::Text(_) => "text",
        }
    }

    /// Unscaled size in logical units
    pub fn intrinsic_size(&self) -> Vec2 {
        match self {
            ObjectKind::Image(image) => Vec2::new(image.crop.width, image.crop.height),
            ObjectKind::Shape(shape) => Vec2::new(shape.width, shape.height),
            ObjectKind::Text(text) => {
                let (width, height) = text.measure();
                Vec2::new(width, height)
            }
        }
    }
}

/// One entry of the scene: an image, a shape or a text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualObject {
    id: ObjectId,
    pub geometry: Geometry,
    pub interactivity: Interactivity,
    pub kind: ObjectKind,
}

impl VisualObject {
    pub fn new(kind: ObjectKind, geometry: Geometry) -> Self {
        Self {
            id: crate::id_generator::generate_id(),
            geometry,
            interactivity: Interactivity::default(),
            kind,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub(crate) fn with_fresh_id(mut self) -> Self {
        self.id = crate::id_generator::generate_id();
        self
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn as_image(&self) -> Option<&ImageData> {
        match &self.kind {
            ObjectKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageData> {
        match &mut self.kind {
            ObjectKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextData> {
        match &self.kind {
            ObjectKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, ObjectKind::Image(_))
    }

    pub fn is_crop_overlay(&self) -> bool {
        matches!(&self.kind, ObjectKind::Shape(shape) if shape.crop_overlay)
    }

    /// Displayed size (intrinsic size times scale), ignoring rotation
    pub fn scaled_size(&self) -> Vec2 {
        let size = self.kind.intrinsic_size();
        Vec2::new(
            size.x * self.geometry.scale_x.abs(),
            size.y * self.geometry.scale_y.abs(),
        )
    }

    pub fn center(&self) -> Pos2 {
        let anchor = Pos2::new(self.geometry.left, self.geometry.top);
        match self.geometry.origin {
            Origin::Center => anchor,
            Origin::TopLeft => anchor + rotate(self.scaled_size() * 0.5, self.geometry.angle),
        }
    }

    /// Move the object so its center lands on `center`, keeping its origin mode
    pub fn set_center(&mut self, center: Pos2) {
        let anchor = match self.geometry.origin {
            Origin::Center => center,
            Origin::TopLeft => center - rotate(self.scaled_size() * 0.5, self.geometry.angle),
        };
        self.geometry.left = anchor.x;
        self.geometry.top = anchor.y;
    }

    /// Corners in logical space: top-left, top-right, bottom-right, bottom-left
    pub fn corners(&self) -> [Pos2; 4] {
        let center = self.center();
        let half = self.scaled_size() * 0.5;
        let angle = self.geometry.angle;
        [
            center + rotate(Vec2::new(-half.x, -half.y), angle),
            center + rotate(Vec2::new(half.x, -half.y), angle),
            center + rotate(Vec2::new(half.x, half.y), angle),
            center + rotate(Vec2::new(-half.x, half.y), angle),
        ]
    }

    /// Axis-aligned bounds of the rotated object
    pub fn bounding_rect(&self) -> Rect {
        calculate_bounds(&self.corners())
    }

    /// Map a logical point into the object's unrotated, unscaled frame,
    /// measured from its top-left corner
    pub fn to_local(&self, pos: Pos2) -> Pos2 {
        let offset = rotate(pos - self.center(), -self.geometry.angle);
        let size = self.kind.intrinsic_size();
        let scale_x = if self.geometry.scale_x == 0.0 { 1.0 } else { self.geometry.scale_x.abs() };
        let scale_y = if self.geometry.scale_y == 0.0 { 1.0 } else { self.geometry.scale_y.abs() };
        Pos2::new(
            offset.x / scale_x + size.x * 0.5,
            offset.y / scale_y + size.y * 0.5,
        )
    }

    /// Test if the object contains the given logical position
    pub fn hit_test(&self, pos: Pos2) -> bool {
        let local = self.to_local(pos);
        let size = self.kind.intrinsic_size();
        local.x >= 0.0 && local.y >= 0.0 && local.x <= size.x && local.y <= size.y
    }
}

/// Factory functions for creating objects
pub mod factory {
    use super::*;
    use crate::element::shape::{CROP_OVERLAY_COLOR, CROP_OVERLAY_DASH, CROP_OVERLAY_STROKE_WIDTH};

    /// An image fitted into a `canvas` sized area: scaled by width when the
    /// image is relatively wider than the canvas, else by height, and centered.
    pub fn fitted_image(src: &str, width: u32, height: u32, canvas: Vec2) -> VisualObject {
        let scale = fit_scale(Vec2::new(width as f32, height as f32), canvas);
        VisualObject::new(
            ObjectKind::Image(ImageData::new(src, width, height)),
            Geometry::centered(Pos2::new(canvas.x / 2.0, canvas.y / 2.0), scale),
        )
    }

    pub fn image(src: &str, width: u32, height: u32, geometry: Geometry) -> VisualObject {
        VisualObject::new(ObjectKind::Image(ImageData::new(src, width, height)), geometry)
    }

    pub fn rect(width: f32, height: f32, geometry: Geometry) -> VisualObject {
        VisualObject::new(ObjectKind::Shape(ShapeData::rect(width, height)), geometry)
    }

    pub fn text(content: &str, style: TextStyle, center: Pos2) -> VisualObject {
        VisualObject::new(
            ObjectKind::Text(TextData::new(content, style)),
            Geometry::centered(center, 1.0),
        )
    }

    /// Dashed, transparent crop region covering `region`
    pub fn crop_overlay(region: Rect) -> VisualObject {
        let shape = ShapeData {
            width: region.width(),
            height: region.height(),
            fill: None,
            stroke: Some(StrokeStyle {
                color: CROP_OVERLAY_COLOR.to_owned(),
                width: CROP_OVERLAY_STROKE_WIDTH,
                dash: CROP_OVERLAY_DASH.to_vec(),
            }),
            crop_overlay: true,
        };
        VisualObject::new(
            ObjectKind::Shape(shape),
            Geometry::at(region.min.x, region.min.y),
        )
    }

    /// Uniform scale that fits `content` inside `canvas`
    pub fn fit_scale(content: Vec2, canvas: Vec2) -> f32 {
        if content.x <= 0.0 || content.y <= 0.0 {
            return 1.0;
        }
        let content_aspect = content.x / content.y;
        let canvas_aspect = canvas.x / canvas.y;
        if content_aspect > canvas_aspect {
            canvas.x / content.x
        } else {
            canvas.y / content.y
        }
    }

    /// Uniform scale that makes `content` cover all of `canvas`
    pub fn cover_scale(content: Vec2, canvas: Vec2) -> f32 {
        if content.x <= 0.0 || content.y <= 0.0 {
            return 1.0;
        }
        (canvas.x / content.x).max(canvas.y / content.y)
    }
}
