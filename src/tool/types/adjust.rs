use log::debug;

use crate::element::{FilterKind, ObjectId, VisualObject};
use crate::error::TransitionError;
use crate::scene::Scene;
use crate::state::ToolMode;
use crate::tool::Tool;

/// Filter adjustments on the primary image
#[derive(Debug, Default)]
pub struct AdjustTool {
    target: Option<ObjectId>,
}

impl AdjustTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Option<ObjectId> {
        self.target
    }

    /// The image being adjusted, re-resolved if the previous one is gone
    fn resolve_target(&mut self, scene: &Scene) -> Option<ObjectId> {
        let still_there = self
            .target
            .and_then(|id| scene.object(id))
            .is_some_and(VisualObject::is_image);
        if !still_there {
            self.target = scene.primary_image().map(VisualObject::id);
        }
        self.target
    }

    pub fn value(&mut self, scene: &Scene, kind: FilterKind) -> f32 {
        self.resolve_target(scene)
            .and_then(|id| scene.object(id))
            .and_then(VisualObject::as_image)
            .and_then(|image| image.filter(kind))
            .unwrap_or(0.0)
    }

    pub fn set_filter(&mut self, scene: &mut Scene, kind: FilterKind, value: f32) -> Result<(), TransitionError> {
        let target = self
            .resolve_target(scene)
            .ok_or(TransitionError::NoTargetImage { mode: ToolMode::Adjust })?;
        debug!("Setting {:?} to {} on {}", kind, value, target);
        scene.modify(target, |object| {
            if let Some(image) = object.as_image_mut() {
                image.set_filter(kind, value);
            }
        });
        Ok(())
    }

    pub fn reset(&mut self, scene: &mut Scene) -> Result<(), TransitionError> {
        let target = self
            .resolve_target(scene)
            .ok_or(TransitionError::NoTargetImage { mode: ToolMode::Adjust })?;
        scene.modify(target, |object| {
            if let Some(image) = object.as_image_mut() {
                image.clear_filters();
            }
        });
        Ok(())
    }
}

impl Tool for AdjustTool {
    fn name(&self) -> &'static str {
        "adjust"
    }

    fn activate(&mut self, scene: &mut Scene) -> Result<(), TransitionError> {
        self.target = scene.primary_image().map(VisualObject::id);
        Ok(())
    }

    fn deactivate(&mut self, _scene: &mut Scene) {
        self.target = None;
    }
}
