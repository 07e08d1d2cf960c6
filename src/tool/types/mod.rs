pub mod adjust;
pub mod background;
pub mod crop;
pub mod text;

use adjust::AdjustTool;
use background::BackgroundTool;
use crop::{CropSession, CropSettings};
use text::TextTool;

use super::Tool;
use crate::error::TransitionError;
use crate::scene::{Scene, SceneBlob};
use crate::state::ToolMode;

/// Enum representing all tool controllers, one per non-default mode
#[derive(Debug)]
pub enum ToolType {
    Crop(CropSession),
    Adjust(AdjustTool),
    Text(TextTool),
    Background(BackgroundTool),
}

impl ToolType {
    /// Controller for `mode`. The default mode has none.
    pub fn for_mode(mode: ToolMode, crop: CropSettings) -> Option<Self> {
        match mode {
            ToolMode::Default => None,
            ToolMode::Crop => Some(Self::Crop(CropSession::new(crop))),
            ToolMode::Adjust => Some(Self::Adjust(AdjustTool::new())),
            ToolMode::Text => Some(Self::Text(TextTool::new())),
            ToolMode::Background => Some(Self::Background(BackgroundTool::new())),
        }
    }

    pub fn as_crop(&self) -> Option<&CropSession> {
        match self {
            Self::Crop(tool) => Some(tool),
            _ => None,
        }
    }

    pub fn as_crop_mut(&mut self) -> Option<&mut CropSession> {
        match self {
            Self::Crop(tool) => Some(tool),
            _ => None,
        }
    }

    pub fn as_adjust_mut(&mut self) -> Option<&mut AdjustTool> {
        match self {
            Self::Adjust(tool) => Some(tool),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextTool> {
        match self {
            Self::Text(tool) => Some(tool),
            _ => None,
        }
    }

    pub fn as_background_mut(&mut self) -> Option<&mut BackgroundTool> {
        match self {
            Self::Background(tool) => Some(tool),
            _ => None,
        }
    }
}

impl Tool for ToolType {
    fn name(&self) -> &'static str {
        match self {
            Self::Crop(tool) => tool.name(),
            Self::Adjust(tool) => tool.name(),
            Self::Text(tool) => tool.name(),
            Self::Background(tool) => tool.name(),
        }
    }

    fn activate(&mut self, scene: &mut Scene) -> Result<(), TransitionError> {
        match self {
            Self::Crop(tool) => tool.activate(scene),
            Self::Adjust(tool) => tool.activate(scene),
            Self::Text(tool) => tool.activate(scene),
            Self::Background(tool) => tool.activate(scene),
        }
    }

    fn deactivate(&mut self, scene: &mut Scene) {
        match self {
            Self::Crop(tool) => tool.deactivate(scene),
            Self::Adjust(tool) => tool.deactivate(scene),
            Self::Text(tool) => tool.deactivate(scene),
            Self::Background(tool) => tool.deactivate(scene),
        }
    }

    fn sanitize_blob(&self, blob: &mut SceneBlob) {
        match self {
            Self::Crop(tool) => tool.sanitize_blob(blob),
            Self::Adjust(tool) => tool.sanitize_blob(blob),
            Self::Text(tool) => tool.sanitize_blob(blob),
            Self::Background(tool) => tool.sanitize_blob(blob),
        }
    }
}
