use egui::Vec2;

use crate::element::ObjectId;

/// Notifications emitted by [`crate::scene::Scene`] on every mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    ObjectAdded { id: ObjectId },
    ObjectRemoved { id: ObjectId },
    ObjectModified { id: ObjectId },
    BackgroundChanged,
    Cleared,
    /// The whole scene was replaced from a persisted blob
    Restored,
    SelectionChanged { id: Option<ObjectId> },
}

impl SceneEvent {
    /// Whether this change should end up in the project store.
    ///
    /// Selection is not persisted, and a restore reproduces what the store
    /// already holds.
    pub fn is_persistent_change(&self) -> bool {
        !matches!(
            self,
            SceneEvent::SelectionChanged { .. } | SceneEvent::Restored
        )
    }
}

/// Events from whatever hosts the canvas on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContainerEvent {
    Resized {
        size: Vec2,
        pixels_per_point: f32,
    },
}
