use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: String,
    pub width: f32,
    /// Dash pattern, empty for a solid line
    #[serde(default)]
    pub dash: Vec<f32>,
}

/// A rectangle. The only shape the editor draws today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeData {
    pub width: f32,
    pub height: f32,
    pub fill: Option<String>,
    pub stroke: Option<StrokeStyle>,
    /// Marks the transient crop region. Overlays never reach the store.
    #[serde(default)]
    pub crop_overlay: bool,
}

impl ShapeData {
    pub fn rect(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            fill: None,
            stroke: None,
            crop_overlay: false,
        }
    }
}

pub const CROP_OVERLAY_COLOR: &str = "#00bcd4";
pub const CROP_OVERLAY_STROKE_WIDTH: f32 = 2.0;
pub const CROP_OVERLAY_DASH: [f32; 2] = [5.0, 5.0];
