use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f32,
    pub color: String,
    pub align: TextAlign,
    pub bold: bool,
    pub italic: bool,
    pub line_height: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_owned(),
            font_size: 24.0,
            color: "#ffffff".to_owned(),
            align: TextAlign::Center,
            bold: false,
            italic: false,
            line_height: 1.16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    pub content: String,
    pub style: TextStyle,
}

// Average glyph advance as a fraction of the font size. Layout is the
// renderer's job; this only has to be close enough for bounds and hit testing.
const AVERAGE_ADVANCE: f32 = 0.6;

impl TextData {
    pub fn new(content: impl Into<String>, style: TextStyle) -> Self {
        Self {
            content: content.into(),
            style,
        }
    }

    /// Approximate unscaled size of the laid-out text
    pub fn measure(&self) -> (f32, f32) {
        let lines = self.content.lines().count().max(1);
        let longest = self
            .content
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0)
            .max(1);
        let width = longest as f32 * self.style.font_size * AVERAGE_ADVANCE;
        let height = lines as f32 * self.style.font_size * self.style.line_height;
        (width, height)
    }
}
