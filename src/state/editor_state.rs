//! The tool mode state machine.
//!
//! Exactly one mode is active at a time. Modes only change through
//! [`ToolModeMachine::select_tool`]; leaving a mode always runs its
//! controller's teardown, so leaving crop mode cancels the crop.
//!
//! ```text
//!              select_tool(m)
//!   ┌─────────┐ ───────────► ┌───────────────────────────────────┐
//!   │ Default │              │ Crop | Adjust | Text | Background │
//!   └─────────┘ ◄─────────── └───────────────────────────────────┘
//!              deactivate, then activate the next one
//! ```

use egui::CursorIcon;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::scene::{Scene, SceneBlob};
use crate::tool::{AdjustTool, BackgroundTool, CropSession, CropSettings, TextTool, Tool, ToolType};

/// Interactive modes of the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    #[default]
    Default,
    Crop,
    Adjust,
    Text,
    Background,
}

impl ToolMode {
    pub const ALL: [ToolMode; 5] = [
        ToolMode::Default,
        ToolMode::Crop,
        ToolMode::Adjust,
        ToolMode::Text,
        ToolMode::Background,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ToolMode::Default => "default",
            ToolMode::Crop => "crop",
            ToolMode::Adjust => "adjust",
            ToolMode::Text => "text",
            ToolMode::Background => "background",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.id() == id)
    }

    pub fn label(self) -> &'static str {
        match self {
            ToolMode::Default => "Select",
            ToolMode::Crop => "Crop",
            ToolMode::Adjust => "Adjust",
            ToolMode::Text => "Text",
            ToolMode::Background => "AI Background",
        }
    }

    /// (default cursor, cursor when hovering an object)
    pub fn cursors(self) -> (CursorIcon, CursorIcon) {
        match self {
            ToolMode::Crop => (CursorIcon::Crosshair, CursorIcon::Crosshair),
            _ => (CursorIcon::Default, CursorIcon::Move),
        }
    }
}

impl std::fmt::Display for ToolMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug)]
pub struct ToolModeMachine {
    mode: ToolMode,
    active_tool: Option<ToolType>,
    crop_settings: CropSettings,
}

impl ToolModeMachine {
    pub fn new(crop_settings: CropSettings) -> Self {
        Self {
            mode: ToolMode::Default,
            active_tool: None,
            crop_settings,
        }
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    /// Switch modes. The current controller is torn down first, then the new
    /// one is activated.
    ///
    /// Activation can fail (e.g. crop with no image). The new mode is still
    /// entered so its panel can explain why; the error is for the caller to
    /// show.
    pub fn select_tool(&mut self, mode: ToolMode, scene: &mut Scene) -> Result<(), TransitionError> {
        if mode == self.mode {
            return Ok(());
        }

        if let Some(mut tool) = self.active_tool.take() {
            tool.deactivate(scene);
        }
        info!("Tool mode {} -> {}", self.mode, mode);
        self.mode = mode;

        let Some(mut tool) = ToolType::for_mode(mode, self.crop_settings) else {
            return Ok(());
        };
        let result = tool.activate(scene);
        if let Err(e) = &result {
            warn!("Activating {}: {}", mode, e);
        }
        self.active_tool = Some(tool);
        result
    }

    /// Tear down whatever mode is active and go back to default. Runs on
    /// every session exit path.
    pub fn teardown(&mut self, scene: &mut Scene) {
        if let Some(mut tool) = self.active_tool.take() {
            info!("Tearing down {} mode", tool.name());
            tool.deactivate(scene);
        }
        self.mode = ToolMode::Default;
    }

    /// Undo transient effects of the active mode on a blob about to be saved
    pub fn sanitize_blob(&self, blob: &mut SceneBlob) {
        if let Some(tool) = &self.active_tool {
            tool.sanitize_blob(blob);
        }
    }

    pub fn crop(&self) -> Option<&CropSession> {
        self.active_tool.as_ref().and_then(ToolType::as_crop)
    }

    pub fn crop_mut(&mut self) -> Option<&mut CropSession> {
        self.active_tool.as_mut().and_then(ToolType::as_crop_mut)
    }

    pub fn adjust_mut(&mut self) -> Option<&mut AdjustTool> {
        self.active_tool.as_mut().and_then(ToolType::as_adjust_mut)
    }

    pub fn text_mut(&mut self) -> Option<&mut TextTool> {
        self.active_tool.as_mut().and_then(ToolType::as_text_mut)
    }

    pub fn background_mut(&mut self) -> Option<&mut BackgroundTool> {
        self.active_tool.as_mut().and_then(ToolType::as_background_mut)
    }
}
