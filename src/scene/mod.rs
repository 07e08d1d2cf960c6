//! In-memory scene: background, paint-ordered objects and the active selection.
//!
//! Every mutation goes through a method on [`Scene`] and emits a
//! [`SceneEvent`] on the scene's [`EventBus`]. The scene knows nothing about
//! persistence; the synchronizer listens on the bus.

use egui::{Pos2, Vec2};
use log::{debug, info};

mod background;
mod blob;

pub use background::{Background, BackgroundImage};
pub use blob::{SCENE_BLOB_VERSION, SceneBlob};

use crate::element::{ObjectId, VisualObject};
use crate::error::DeserializationError;
use crate::event::{EventBus, SceneEvent};

#[derive(Debug)]
pub struct Scene {
    width: u32,
    height: u32,
    background: Background,
    objects: Vec<VisualObject>,
    active: Option<ObjectId>,
    events: EventBus<SceneEvent>,
}

impl Scene {
    /// An empty scene with fixed logical dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: Background::default(),
            objects: Vec::new(),
            active: None,
            events: EventBus::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn logical_size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn center(&self) -> Pos2 {
        Pos2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// Bus carrying this scene's change notifications
    pub fn events(&self) -> &EventBus<SceneEvent> {
        &self.events
    }

    pub fn objects(&self) -> &[VisualObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn object(&self, id: ObjectId) -> Option<&VisualObject> {
        self.objects.iter().find(|object| object.id() == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.object(id).is_some()
    }

    fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|object| object.id() == id)
    }

    /// Append an object on top of the paint order
    pub fn add_object(&mut self, object: VisualObject) -> ObjectId {
        let object = if self.contains(object.id()) {
            object.with_fresh_id()
        } else {
            object
        };
        let id = object.id();
        debug!("Adding {} {}", object.kind_name(), id);
        self.objects.push(object);
        self.events.emit(SceneEvent::ObjectAdded { id });
        id
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<VisualObject> {
        let index = self.index_of(id)?;
        let object = self.objects.remove(index);
        debug!("Removed {} {}", object.kind_name(), id);
        self.events.emit(SceneEvent::ObjectRemoved { id });
        if self.active == Some(id) {
            self.active = None;
            self.events.emit(SceneEvent::SelectionChanged { id: None });
        }
        Some(object)
    }

    /// Swap `id` for `replacement` at the same paint position
    pub fn replace_object(&mut self, id: ObjectId, replacement: VisualObject) -> Option<VisualObject> {
        let index = self.index_of(id)?;
        let replacement = if self.contains(replacement.id()) && replacement.id() != id {
            replacement.with_fresh_id()
        } else {
            replacement
        };
        let new_id = replacement.id();
        let old = std::mem::replace(&mut self.objects[index], replacement);
        self.events.emit(SceneEvent::ObjectRemoved { id });
        self.events.emit(SceneEvent::ObjectAdded { id: new_id });
        if self.active == Some(id) {
            self.active = None;
            self.events.emit(SceneEvent::SelectionChanged { id: None });
        }
        Some(old)
    }

    /// Mutate one object in place and announce it
    pub fn modify<R>(&mut self, id: ObjectId, f: impl FnOnce(&mut VisualObject) -> R) -> Option<R> {
        let index = self.index_of(id)?;
        let result = f(&mut self.objects[index]);
        self.events.emit(SceneEvent::ObjectModified { id });
        Some(result)
    }

    pub fn active_id(&self) -> Option<ObjectId> {
        self.active
    }

    pub fn active_object(&self) -> Option<&VisualObject> {
        self.active.and_then(|id| self.object(id))
    }

    /// Select an object, or clear the selection with `None`. Selecting an id
    /// that is not in the scene does nothing and returns false.
    pub fn set_active_object(&mut self, id: Option<ObjectId>) -> bool {
        if let Some(id) = id {
            if !self.contains(id) {
                return false;
            }
        }
        if self.active != id {
            self.active = id;
            self.events.emit(SceneEvent::SelectionChanged { id });
        }
        true
    }

    /// Selected image, else the first image in paint order
    pub fn primary_image(&self) -> Option<&VisualObject> {
        self.active_object()
            .filter(|object| object.is_image())
            .or_else(|| self.first_image())
    }

    pub fn first_image(&self) -> Option<&VisualObject> {
        self.objects.iter().find(|object| object.is_image())
    }

    /// Topmost interactive object under `pos`
    pub fn hit_test(&self, pos: Pos2) -> Option<ObjectId> {
        self.objects
            .iter()
            .rev()
            .filter(|object| object.interactivity.evented && object.interactivity.selectable)
            .find(|object| object.hit_test(pos))
            .map(VisualObject::id)
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn set_background_color(&mut self, color: Option<String>) {
        self.background.color = color;
        self.events.emit(SceneEvent::BackgroundChanged);
    }

    pub fn set_background_image(&mut self, image: Option<BackgroundImage>) {
        self.background.image = image;
        self.events.emit(SceneEvent::BackgroundChanged);
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
        self.events.emit(SceneEvent::BackgroundChanged);
    }

    /// Drop every object, the selection and the background
    pub fn clear(&mut self) {
        self.objects.clear();
        self.active = None;
        self.background = Background::default();
        self.events.emit(SceneEvent::Cleared);
    }

    /// Snapshot of the persistable state. Crop overlays are left out.
    pub fn to_blob(&self) -> SceneBlob {
        SceneBlob {
            version: SCENE_BLOB_VERSION,
            width: self.width,
            height: self.height,
            background: self.background.clone(),
            objects: self
                .objects
                .iter()
                .filter(|object| !object.is_crop_overlay())
                .cloned()
                .collect(),
        }
    }

    pub fn serialize(&self) -> Result<String, serde_json::Error> {
        self.to_blob().to_json()
    }

    /// Replace the scene contents with a persisted blob.
    ///
    /// All or nothing: on error the scene is untouched.
    pub fn restore(&mut self, json: &str) -> Result<(), DeserializationError> {
        let blob = SceneBlob::parse(json)?;
        self.restore_blob(blob)
    }

    pub fn restore_blob(&mut self, blob: SceneBlob) -> Result<(), DeserializationError> {
        if blob.width != self.width || blob.height != self.height {
            return Err(DeserializationError::DimensionMismatch {
                width: self.width,
                height: self.height,
                found_width: blob.width,
                found_height: blob.height,
            });
        }

        info!("Restoring scene with {} objects", blob.objects.len());
        self.objects = blob.objects;
        self.background = blob.background;
        self.active = None;
        self.events.emit(SceneEvent::Restored);
        Ok(())
    }
}
