use serde::{Deserialize, Serialize};

/// Region of the source bitmap that is shown, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SourceRect {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Brightness,
    Contrast,
    Saturation,
    /// Hue rotation in degrees
    Hue,
    Blur,
}

impl FilterKind {
    pub const ALL: [FilterKind; 5] = [
        FilterKind::Brightness,
        FilterKind::Contrast,
        FilterKind::Saturation,
        FilterKind::Hue,
        FilterKind::Blur,
    ];

    /// Accepted value range. Zero is neutral for every kind.
    pub fn range(self) -> (f32, f32) {
        match self {
            FilterKind::Brightness | FilterKind::Contrast | FilterKind::Saturation => (-1.0, 1.0),
            FilterKind::Hue => (-180.0, 180.0),
            FilterKind::Blur => (0.0, 1.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterKind::Brightness => "Brightness",
            FilterKind::Contrast => "Contrast",
            FilterKind::Saturation => "Saturation",
            FilterKind::Hue => "Hue",
            FilterKind::Blur => "Blur",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub kind: FilterKind,
    pub value: f32,
}

/// Payload of an image object. The bitmap itself lives with the renderer;
/// the scene only knows where it comes from and how big it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    pub src: String,
    pub natural_width: u32,
    pub natural_height: u32,
    pub crop: SourceRect,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl ImageData {
    pub fn new(src: impl Into<String>, natural_width: u32, natural_height: u32) -> Self {
        Self {
            src: src.into(),
            natural_width,
            natural_height,
            crop: SourceRect::full(natural_width, natural_height),
            filters: Vec::new(),
        }
    }

    pub fn filter(&self, kind: FilterKind) -> Option<f32> {
        self.filters
            .iter()
            .find(|filter| filter.kind == kind)
            .map(|filter| filter.value)
    }

    /// Set a filter, clamped to its range. A neutral value removes it.
    pub fn set_filter(&mut self, kind: FilterKind, value: f32) {
        let (min, max) = kind.range();
        let value = value.clamp(min, max);
        self.filters.retain(|filter| filter.kind != kind);
        if value.abs() > f32::EPSILON {
            self.filters.push(Filter { kind, value });
        }
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }
}
