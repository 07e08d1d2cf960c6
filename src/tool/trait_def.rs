use crate::error::TransitionError;
use crate::scene::{Scene, SceneBlob};

/// Controller behind one tool mode.
///
/// `activate` runs when the mode is entered, `deactivate` when it is left for
/// any reason, including session teardown. Controllers only ever touch the
/// scene they are handed.
pub trait Tool {
    fn name(&self) -> &'static str;

    fn activate(&mut self, _scene: &mut Scene) -> Result<(), TransitionError> {
        Ok(())
    }

    fn deactivate(&mut self, scene: &mut Scene);

    /// Undo transient effects of this tool on a blob about to be persisted
    fn sanitize_blob(&self, _blob: &mut SceneBlob) {}
}
