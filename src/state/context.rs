//! The editing session: one open project and everything that acts on it.
//!
//! `EditorSession` is the context value passed around instead of globals. It
//! owns the scene, the viewport, the tool mode machine and the persistence
//! synchronizer, and wires the event subscriptions between them.
//!
//! # Lifecycle
//!
//! - [`EditorSession::open`] builds the scene from the saved blob, or fits the
//!   project image into a fresh one, then starts listening for changes. The
//!   initial population is never written back.
//! - Mutations go through the session, which routes them to the active tool.
//! - [`EditorSession::tick`] performs a debounced save once it is due.
//! - [`EditorSession::close`] (also run on drop) tears the active mode down,
//!   cancels any pending save and unsubscribes every listener.
//!
//! # Example
//!
//! ```rust,no_run
//! use futures::executor::block_on;
//! use photo_canvas::{EditorConfig, EditorSession, ToolMode};
//! # fn demo(project: photo_canvas::store::Project, services: photo_canvas::EditorServices) {
//! let mut session = block_on(EditorSession::open(project, EditorConfig::default(), services));
//! session.select_tool(ToolMode::Crop).ok();
//! session.set_crop_aspect_ratio(Some(1.0)).ok();
//! session.commit_crop().ok();
//! block_on(session.tick());
//! # }
//! ```

use egui::{Pos2, Rect, Vec2};
use log::{error, info, warn};
use parking_lot::Mutex;
use std::rc::Rc;
use std::sync::Arc;

use super::editor_state::{ToolMode, ToolModeMachine};
use super::persistence::PersistenceSynchronizer;
use crate::config::EditorConfig;
use crate::element::{FilterKind, ObjectId, TextStyle, VisualObject, factory};
use crate::error::{EditorError, EditorResult, PersistenceWriteError, TransitionError};
use crate::event::{ContainerEvent, EventBus, EventHandler, SubscriptionId};
use crate::image::{ImageLoader, ImageTransformer, LoadedImage};
use crate::notice::Notice;
use crate::scene::{Background, Scene};
use crate::store::{Project, ProjectId, ProjectPatch, ProjectStore};
use crate::tool::{BackgroundTool, CropSession, CropSettings};
use crate::util::time::{Clock, SystemClock};
use crate::viewport::Viewport;

const SAVE_FAILED: &str = "Failed to save project. Please try again.";
const REMOVING_BACKGROUND: &str = "Removing background with AI...";
const RESETTING: &str = "Resetting canvas...";

/// External collaborators of a session
#[derive(Clone)]
pub struct EditorServices {
    pub store: Rc<dyn ProjectStore>,
    pub loader: Rc<dyn ImageLoader>,
    pub transformer: Rc<dyn ImageTransformer>,
}

impl std::fmt::Debug for EditorServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EditorServices { .. }")
    }
}

/// Feeds container resizes into the shared viewport
struct ViewportListener {
    viewport: Arc<Mutex<Viewport>>,
}

impl EventHandler<ContainerEvent> for ViewportListener {
    fn handle_event(&mut self, event: &ContainerEvent) {
        match *event {
            ContainerEvent::Resized { size, pixels_per_point } => {
                self.viewport.lock().resize(size, pixels_per_point);
            }
        }
    }
}

#[derive(Debug)]
pub struct EditorSession {
    project: Project,
    config: EditorConfig,
    scene: Scene,
    viewport: Arc<Mutex<Viewport>>,
    container: Option<(EventBus<ContainerEvent>, SubscriptionId)>,
    modes: ToolModeMachine,
    sync: PersistenceSynchronizer,
    services: EditorServices,
    notices: Vec<Notice>,
    processing: Option<&'static str>,
    closed: bool,
}

fn crop_of(modes: &mut ToolModeMachine) -> Result<&mut CropSession, TransitionError> {
    modes
        .crop_mut()
        .ok_or(TransitionError::ModeNotActive { mode: ToolMode::Crop })
}

fn background_of(modes: &mut ToolModeMachine) -> Result<&mut BackgroundTool, TransitionError> {
    modes
        .background_mut()
        .ok_or(TransitionError::ModeNotActive { mode: ToolMode::Background })
}

impl EditorSession {
    /// Open `project` using the system clock
    pub async fn open(project: Project, config: EditorConfig, services: EditorServices) -> Self {
        Self::open_with_clock(project, config, services, Arc::new(SystemClock)).await
    }

    /// Fetch a project from the store and open it
    pub async fn open_from_store(
        id: &ProjectId,
        config: EditorConfig,
        services: EditorServices,
        clock: Arc<dyn Clock>,
    ) -> EditorResult<Self> {
        let project = services.store.get(id).await?;
        Ok(Self::open_with_clock(project, config, services, clock).await)
    }

    pub async fn open_with_clock(
        project: Project,
        config: EditorConfig,
        services: EditorServices,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut scene = Scene::new(project.width, project.height);
        let mut notices = Vec::new();

        let restored = match project.canvas_state.as_deref() {
            Some(blob) => match scene.restore(blob) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Saved canvas of {} is unusable: {}", project.id, e);
                    notices.push(Notice::error("Saved canvas could not be restored"));
                    false
                }
            },
            None => false,
        };

        if !restored {
            scene.set_background_color(Some(config.default_background.clone()));
            if let Some(url) = project.display_image_url() {
                match services.loader.load(url).await {
                    Ok(image) => {
                        let id = scene.add_object(fitted(&image, scene.logical_size()));
                        scene.set_active_object(Some(id));
                    }
                    Err(e) => {
                        error!("Loading project image failed: {}", e);
                        notices.push(Notice::error("Failed to load project image"));
                    }
                }
            }
        }

        let viewport = Viewport::new(scene.logical_size(), config.viewport_padding);
        let mut sync = PersistenceSynchronizer::new(project.id.clone(), config.save_debounce(), clock);
        sync.attach(scene.events());

        info!(
            "Opened project {} ({}x{}) with {} objects",
            project.id,
            project.width,
            project.height,
            scene.len()
        );

        Self {
            modes: ToolModeMachine::new(CropSettings::from(&config)),
            project,
            config,
            scene,
            viewport: Arc::new(Mutex::new(viewport)),
            container: None,
            sync,
            services,
            notices,
            processing: None,
            closed: false,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Direct scene access. Changes made here are saved like any other.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn mode(&self) -> ToolMode {
        self.modes.mode()
    }

    pub fn crop(&self) -> Option<&CropSession> {
        self.modes.crop()
    }

    pub fn synchronizer(&self) -> &PersistenceSynchronizer {
        &self.sync
    }

    /// Current viewport state
    pub fn viewport(&self) -> Viewport {
        self.viewport.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Status text while a long operation runs
    pub fn processing_message(&self) -> Option<&'static str> {
        self.processing
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ---- Viewport ----

    /// Follow resizes published on `bus` until the session closes
    pub fn attach_container(&mut self, bus: &EventBus<ContainerEvent>) {
        self.detach_container();
        let id = bus.subscribe(Box::new(ViewportListener {
            viewport: Arc::clone(&self.viewport),
        }));
        self.container = Some((bus.clone(), id));
    }

    fn detach_container(&mut self) {
        if let Some((bus, id)) = self.container.take() {
            bus.unsubscribe(id);
        }
    }

    /// Apply a container size directly. Returns the new display scale.
    pub fn handle_resize(&mut self, size: Vec2, pixels_per_point: f32) -> f32 {
        self.viewport.lock().resize(size, pixels_per_point)
    }

    // ---- Modes and selection ----

    /// Switch tool mode. A failed activation is also queued as a notice.
    pub fn select_tool(&mut self, mode: ToolMode) -> Result<(), TransitionError> {
        let result = self.modes.select_tool(mode, &mut self.scene);
        if let Err(e) = &result {
            self.notices.push(Notice::error(e.to_string()));
        }
        result
    }

    /// Select the topmost interactive object at a logical position, or clear
    /// the selection when there is none
    pub fn select_at(&mut self, pos: Pos2) -> Option<ObjectId> {
        let hit = self.scene.hit_test(pos);
        self.scene.set_active_object(hit);
        hit
    }

    /// Drag an object by `delta` logical units
    pub fn move_object(&mut self, id: ObjectId, delta: Vec2) -> bool {
        let movable = self
            .scene
            .object(id)
            .is_some_and(|object| object.interactivity.selectable && !object.is_crop_overlay());
        if !movable {
            return false;
        }
        self.scene
            .modify(id, |object| {
                object.geometry.left += delta.x;
                object.geometry.top += delta.y;
            })
            .is_some()
    }

    // ---- Crop ----

    /// Start a crop on the primary image while in crop mode. Returns false
    /// when a crop is already running or there is nothing to crop; the latter
    /// also queues a notice.
    pub fn begin_crop(&mut self) -> Result<bool, TransitionError> {
        let target = self.scene.primary_image().map(VisualObject::id);
        let crop = crop_of(&mut self.modes)?;
        if crop.begin(&mut self.scene, target) {
            return Ok(true);
        }
        if !crop.is_active() {
            let e = TransitionError::NoTargetImage { mode: ToolMode::Crop };
            warn!("{}", e);
            self.notices.push(Notice::error(e.to_string()));
        }
        Ok(false)
    }

    pub fn set_crop_aspect_ratio(&mut self, ratio: Option<f32>) -> Result<(), TransitionError> {
        crop_of(&mut self.modes)?.set_aspect_ratio(&mut self.scene, ratio);
        Ok(())
    }

    pub fn resize_crop(&mut self, width: f32, height: f32) -> Result<Option<Vec2>, TransitionError> {
        Ok(crop_of(&mut self.modes)?.resize_overlay(&mut self.scene, width, height))
    }

    pub fn scale_crop(&mut self, scale_x: f32, scale_y: f32) -> Result<Option<Vec2>, TransitionError> {
        Ok(crop_of(&mut self.modes)?.scale_overlay(&mut self.scene, scale_x, scale_y))
    }

    /// Drag of an overlay corner handle, `anchor` being the opposite corner
    pub fn drag_crop_corner(&mut self, anchor: Pos2, pointer: Pos2) -> Result<Option<Rect>, TransitionError> {
        Ok(crop_of(&mut self.modes)?.resize_from_corner(&mut self.scene, anchor, pointer))
    }

    pub fn move_crop(&mut self, left: f32, top: f32) -> Result<bool, TransitionError> {
        Ok(crop_of(&mut self.modes)?.move_overlay(&mut self.scene, left, top))
    }

    pub fn commit_crop(&mut self) -> EditorResult<ObjectId> {
        let crop = crop_of(&mut self.modes)?;
        match crop.commit(&mut self.scene) {
            Ok(id) => {
                self.notices.push(Notice::success("Image cropped"));
                Ok(id)
            }
            Err(e) => {
                self.notices.push(Notice::error(e.to_string()));
                Err(e.into())
            }
        }
    }

    pub fn cancel_crop(&mut self) -> Result<bool, TransitionError> {
        Ok(crop_of(&mut self.modes)?.cancel(&mut self.scene))
    }

    // ---- Adjust ----

    pub fn filter_value(&mut self, kind: FilterKind) -> Result<f32, TransitionError> {
        let adjust = self
            .modes
            .adjust_mut()
            .ok_or(TransitionError::ModeNotActive { mode: ToolMode::Adjust })?;
        Ok(adjust.value(&self.scene, kind))
    }

    pub fn set_filter(&mut self, kind: FilterKind, value: f32) -> Result<(), TransitionError> {
        self.modes
            .adjust_mut()
            .ok_or(TransitionError::ModeNotActive { mode: ToolMode::Adjust })?
            .set_filter(&mut self.scene, kind, value)
    }

    pub fn reset_filters(&mut self) -> Result<(), TransitionError> {
        self.modes
            .adjust_mut()
            .ok_or(TransitionError::ModeNotActive { mode: ToolMode::Adjust })?
            .reset(&mut self.scene)
    }

    // ---- Text ----

    /// Insert text at the canvas center
    pub fn add_text(&mut self, content: &str) -> Result<ObjectId, TransitionError> {
        let center = self.scene.center();
        let text = self
            .modes
            .text_mut()
            .ok_or(TransitionError::ModeNotActive { mode: ToolMode::Text })?;
        Ok(text.add_text(&mut self.scene, content, center))
    }

    pub fn update_text(&mut self, id: ObjectId, content: &str) -> Result<bool, TransitionError> {
        let text = self
            .modes
            .text_mut()
            .ok_or(TransitionError::ModeNotActive { mode: ToolMode::Text })?;
        Ok(text.set_content(&mut self.scene, id, content))
    }

    pub fn restyle_text(&mut self, id: ObjectId, style: TextStyle) -> Result<bool, TransitionError> {
        let text = self
            .modes
            .text_mut()
            .ok_or(TransitionError::ModeNotActive { mode: ToolMode::Text })?;
        Ok(text.restyle(&mut self.scene, id, style))
    }

    // ---- Background ----

    pub fn apply_background_color(&mut self, color: &str) -> Result<(), TransitionError> {
        background_of(&mut self.modes)?.apply_color(&mut self.scene, color);
        Ok(())
    }

    pub fn clear_background(&mut self) -> Result<(), TransitionError> {
        background_of(&mut self.modes)?.clear(&mut self.scene);
        Ok(())
    }

    /// Load `url` and use it as a canvas-covering background image. The scene
    /// is only touched once the image has loaded.
    pub async fn apply_background_image(&mut self, url: &str) -> EditorResult<()> {
        self.ensure_open()?;
        background_of(&mut self.modes)?;
        let loader = Rc::clone(&self.services.loader);
        let image = match loader.load(url).await {
            Ok(image) => image,
            Err(e) => {
                error!("Background image {} failed to load: {}", url, e);
                self.notices
                    .push(Notice::error("Failed to set background image. Please try again."));
                return Err(e.into());
            }
        };
        background_of(&mut self.modes)?.apply_image(&mut self.scene, &image);
        Ok(())
    }

    /// Replace the main image with its background-removed variant, keeping
    /// its placement, then save at once.
    pub async fn remove_background(&mut self) -> EditorResult<ObjectId> {
        self.ensure_open()?;
        background_of(&mut self.modes)?;
        if self.scene.first_image().is_none() {
            return Err(EditorError::NoImage);
        }

        self.processing = Some(REMOVING_BACKGROUND);
        let result = self.swap_in_removed_background().await;
        self.processing = None;

        if let Err(e) = &result {
            error!("Background removal failed: {}", e);
            if !matches!(e, EditorError::PersistenceWrite(_)) {
                self.notices
                    .push(Notice::error("Failed to remove background. Please try again."));
            }
        }
        result
    }

    async fn swap_in_removed_background(&mut self) -> EditorResult<ObjectId> {
        let source = self
            .project
            .display_image_url()
            .map(str::to_owned)
            .ok_or(EditorError::NoOriginalImage)?;

        let transformer = Rc::clone(&self.services.transformer);
        let loader = Rc::clone(&self.services.loader);
        let url = transformer.remove_background(&source).await?;
        let image = loader.load(&url).await?;

        // Re-resolve: the main image may have changed while loading
        let target = self
            .scene
            .first_image()
            .map(VisualObject::id)
            .ok_or(EditorError::NoImage)?;
        let id = BackgroundTool::swap_image(&mut self.scene, target, &image)
            .ok_or(EditorError::NoImage)?;

        self.project.current_image_url = Some(url.clone());
        self.project.background_removed = true;
        let patch = ProjectPatch {
            current_image_url: Some(Some(url)),
            background_removed: Some(true),
            ..ProjectPatch::default()
        };
        self.save_with(patch).await?;
        info!("Background removed from {}", id);
        Ok(id)
    }

    // ---- Reset ----

    /// Throw away every edit and start over from the project's original image
    pub async fn reset_to_original(&mut self) -> EditorResult<ObjectId> {
        self.ensure_open()?;
        let Some(url) = self.project.original_image_url.clone() else {
            self.notices.push(Notice::error("No original image found to reset to"));
            return Err(EditorError::NoOriginalImage);
        };

        self.processing = Some(RESETTING);
        let loader = Rc::clone(&self.services.loader);
        let loaded = loader.load(&url).await;
        self.processing = None;

        let image = match loaded {
            Ok(image) => image,
            Err(e) => {
                error!("Reset failed to load {}: {}", url, e);
                self.notices
                    .push(Notice::error("Failed to reset canvas. Please try again."));
                return Err(e.into());
            }
        };

        if let Some(crop) = self.modes.crop_mut() {
            crop.cancel(&mut self.scene);
        }
        self.scene.clear();
        self.scene
            .set_background(Background::solid(&self.config.default_background));
        let id = self
            .scene
            .add_object(fitted(&image, self.scene.logical_size()));
        self.scene.set_active_object(Some(id));

        self.project.current_image_url = Some(url.clone());
        self.project.active_transformations = None;
        self.project.background_removed = false;
        let patch = ProjectPatch {
            current_image_url: Some(Some(url)),
            active_transformations: Some(None),
            background_removed: Some(false),
            ..ProjectPatch::default()
        };
        self.save_with(patch).await?;
        self.notices.push(Notice::success("Canvas reset to original image"));
        Ok(id)
    }

    // ---- Persistence ----

    /// Serialized scene as it should be stored: no crop overlay, and the crop
    /// target as it was before the crop started
    pub fn build_blob(&self) -> Result<String, serde_json::Error> {
        let mut blob = self.scene.to_blob();
        self.modes.sanitize_blob(&mut blob);
        blob.to_json()
    }

    /// Manual save
    pub async fn save(&mut self) -> Result<(), PersistenceWriteError> {
        self.save_with(ProjectPatch::default()).await?;
        self.notices.push(Notice::success("Project saved"));
        Ok(())
    }

    /// Immediate save of the scene plus `extra` fields
    async fn save_with(&mut self, extra: ProjectPatch) -> Result<(), PersistenceWriteError> {
        if self.closed {
            warn!("Save of closed project {} refused", self.project.id);
            return Err(PersistenceWriteError::Closed(self.project.id.clone()));
        }
        let blob = self.build_blob();
        let store = Rc::clone(&self.services.store);
        let result = self.sync.save_now(&*store, blob, extra).await;
        if result.is_err() {
            self.notices.push(Notice::error(SAVE_FAILED));
        }
        result
    }

    /// Perform the debounced save if its deadline has passed. Returns `None`
    /// when nothing was due.
    pub async fn tick(&mut self) -> Option<Result<(), PersistenceWriteError>> {
        if self.closed || !self.sync.take_due() {
            return None;
        }
        let blob = self.build_blob();
        let store = Rc::clone(&self.services.store);
        let result = self.sync.write(&*store, blob, ProjectPatch::default()).await;
        if result.is_err() {
            self.notices.push(Notice::error(SAVE_FAILED));
        }
        Some(result)
    }

    /// Write a pending debounced save right away, e.g. before closing
    pub async fn flush(&mut self) -> Option<Result<(), PersistenceWriteError>> {
        if self.closed || !self.sync.has_pending() {
            return None;
        }
        Some(self.save_with(ProjectPatch::default()).await)
    }

    fn ensure_open(&self) -> EditorResult<()> {
        if self.closed {
            warn!("Project {} is closed", self.project.id);
            return Err(EditorError::Closed);
        }
        Ok(())
    }

    /// End the session: tear down the active mode, drop any pending save and
    /// unsubscribe all listeners. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.modes.teardown(&mut self.scene);
        self.sync.detach();
        self.detach_container();
        self.closed = true;
        info!("Closed project {}", self.project.id);
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn fitted(image: &LoadedImage, canvas: Vec2) -> VisualObject {
    factory::fitted_image(&image.url, image.width, image.height, canvas)
}
