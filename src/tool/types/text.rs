use egui::Pos2;
use log::debug;

use crate::element::{ObjectId, ObjectKind, TextStyle, factory};
use crate::error::TransitionError;
use crate::scene::Scene;
use crate::tool::Tool;

/// Inserts and edits text layers
#[derive(Debug, Default)]
pub struct TextTool {
    style: TextStyle,
    editing: Option<ObjectId>,
}

impl TextTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// Style used for the next inserted text
    pub fn set_style(&mut self, style: TextStyle) {
        self.style = style;
    }

    pub fn editing(&self) -> Option<ObjectId> {
        self.editing
    }

    /// Add a text layer centered at `at`, select it and start editing it
    pub fn add_text(&mut self, scene: &mut Scene, content: &str, at: Pos2) -> ObjectId {
        let id = scene.add_object(factory::text(content, self.style.clone(), at));
        scene.set_active_object(Some(id));
        self.editing = Some(id);
        id
    }

    pub fn set_content(&mut self, scene: &mut Scene, id: ObjectId, content: &str) -> bool {
        scene
            .modify(id, |object| match &mut object.kind {
                ObjectKind::Text(text) => {
                    text.content = content.to_owned();
                    true
                }
                _ => false,
            })
            .unwrap_or(false)
    }

    pub fn restyle(&mut self, scene: &mut Scene, id: ObjectId, style: TextStyle) -> bool {
        scene
            .modify(id, |object| match &mut object.kind {
                ObjectKind::Text(text) => {
                    text.style = style;
                    true
                }
                _ => false,
            })
            .unwrap_or(false)
    }
}

impl Tool for TextTool {
    fn name(&self) -> &'static str {
        "text"
    }

    fn activate(&mut self, _scene: &mut Scene) -> Result<(), TransitionError> {
        self.editing = None;
        Ok(())
    }

    /// Text layers left empty are dropped when the tool is put away
    fn deactivate(&mut self, scene: &mut Scene) {
        if let Some(id) = self.editing.take() {
            let empty = scene
                .object(id)
                .and_then(|object| object.as_text())
                .is_some_and(|text| text.content.trim().is_empty());
            if empty {
                debug!("Dropping empty text {}", id);
                scene.remove_object(id);
            }
        }
    }
}
