use serde::{Deserialize, Serialize};

use crate::element::Geometry;

/// Image painted behind every object, placed in logical space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundImage {
    pub src: String,
    pub natural_width: u32,
    pub natural_height: u32,
    pub geometry: Geometry,
}

/// Canvas fill. Color and image are independent; the image paints over the color.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Background {
    pub color: Option<String>,
    pub image: Option<BackgroundImage>,
}

impl Background {
    pub fn solid(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            image: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.image.is_none()
    }
}
