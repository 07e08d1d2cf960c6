use egui::{Pos2, Vec2};
use futures::executor::block_on;
use std::rc::Rc;
use std::sync::Arc;

use photo_canvas::element::FilterKind;
use photo_canvas::error::{EditorError, TransitionError};
use photo_canvas::event::{ContainerEvent, EventBus};
use photo_canvas::image::{ImageKitTransformer, MemoryImageLoader};
use photo_canvas::state::{EditorServices, EditorSession, ToolMode};
use photo_canvas::store::{MemoryStore, Project, ProjectId};
use photo_canvas::util::time::ManualClock;
use photo_canvas::{EditorConfig, NoticeLevel};

const ORIGINAL: &str = "https://ik.imagekit.io/demo/cat.jpg";
const PROCESSED: &str = "https://ik.imagekit.io/demo/cat.jpg?tr=e-bgremove";

fn project_id() -> ProjectId {
    ProjectId::new("cat-poster")
}

fn create_loader() -> Rc<MemoryImageLoader> {
    Rc::new(
        MemoryImageLoader::new()
            .with_image(ORIGINAL, 1600, 1200)
            .with_image(PROCESSED, 1600, 1200)
            .with_image("backgrounds/sky.jpg", 400, 400),
    )
}

fn services(store: &Rc<MemoryStore>, loader: &Rc<MemoryImageLoader>) -> EditorServices {
    EditorServices {
        store: store.clone(),
        loader: loader.clone(),
        transformer: Rc::new(ImageKitTransformer),
    }
}

fn open(project: Project) -> (EditorSession, Rc<MemoryStore>, Rc<MemoryImageLoader>) {
    let store = Rc::new(MemoryStore::new());
    store.insert(project.clone());
    let loader = create_loader();
    let session = block_on(EditorSession::open_with_clock(
        project,
        EditorConfig::default(),
        services(&store, &loader),
        Arc::new(ManualClock::new()),
    ));
    (session, store, loader)
}

fn cat_project() -> Project {
    Project::new(project_id(), "Cat poster", 800, 600).with_image(ORIGINAL)
}

#[test]
fn test_open_fits_project_image() {
    let (session, store, _) = open(cat_project());

    let scene = session.scene();
    assert_eq!(scene.len(), 1);
    let image = scene.first_image().unwrap();
    assert_eq!(image.as_image().unwrap().src, ORIGINAL);
    // 1600x1200 is exactly the canvas aspect: fit by height
    assert!((image.geometry.scale_x - 0.5).abs() < 1e-6);
    assert_eq!(image.center(), Pos2::new(400.0, 300.0));
    assert!(image.interactivity.selectable && image.interactivity.evented);
    assert_eq!(scene.background().color.as_deref(), Some("#ffffff"));
    assert_eq!(session.mode(), ToolMode::Default);
    assert_eq!(store.write_count(), 0);
}

#[test]
fn test_open_prefers_current_image() {
    let mut project = cat_project();
    project.current_image_url = Some(PROCESSED.to_owned());
    let (session, _, _) = open(project);

    let image = session.scene().first_image().unwrap();
    assert_eq!(image.as_image().unwrap().src, PROCESSED);
}

#[test]
fn test_open_restores_saved_scene() {
    let (mut first, _, _) = open(cat_project());
    first.select_tool(ToolMode::Text).unwrap();
    first.add_text("Meow").unwrap();
    let blob = first.build_blob().unwrap();

    let mut project = cat_project();
    project.canvas_state = Some(blob);
    let (session, store, _) = open(project);

    assert_eq!(session.scene().len(), 2);
    assert!(session.scene().objects()[1].as_text().is_some());
    assert_eq!(store.write_count(), 0);
}

#[test]
fn test_open_with_corrupt_scene_falls_back_to_image() {
    let mut project = cat_project();
    project.canvas_state = Some("not json".to_owned());
    let (mut session, _, _) = open(project);

    assert_eq!(session.scene().len(), 1);
    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[test]
fn test_open_from_store() {
    let store = Rc::new(MemoryStore::new());
    store.insert(cat_project());
    let loader = create_loader();

    let session = block_on(EditorSession::open_from_store(
        &project_id(),
        EditorConfig::default(),
        services(&store, &loader),
        Arc::new(ManualClock::new()),
    ))
    .unwrap();
    assert_eq!(session.project().title, "Cat poster");

    let missing = block_on(EditorSession::open_from_store(
        &ProjectId::new("nope"),
        EditorConfig::default(),
        services(&store, &loader),
        Arc::new(ManualClock::new()),
    ));
    assert!(matches!(missing, Err(EditorError::Store(_))));
}

#[test]
fn test_tool_operations_need_their_mode() {
    let (mut session, _, _) = open(cat_project());

    assert!(matches!(
        session.commit_crop(),
        Err(EditorError::Transition(TransitionError::ModeNotActive { mode: ToolMode::Crop }))
    ));
    assert_eq!(
        session.set_filter(FilterKind::Blur, 0.5),
        Err(TransitionError::ModeNotActive { mode: ToolMode::Adjust })
    );
    assert_eq!(
        session.add_text("hi"),
        Err(TransitionError::ModeNotActive { mode: ToolMode::Text })
    );
    assert_eq!(
        session.apply_background_color("#000000"),
        Err(TransitionError::ModeNotActive { mode: ToolMode::Background })
    );
}

#[test]
fn test_crop_flow_through_session() {
    let (mut session, _, _) = open(cat_project());
    let image = session.scene().first_image().unwrap().id();

    session.select_tool(ToolMode::Crop).unwrap();
    session.set_crop_aspect_ratio(Some(1.0)).unwrap();
    let size = session.resize_crop(300.0, 100.0).unwrap().unwrap();
    assert!((size.y - 300.0).abs() < 1e-3);

    assert_eq!(session.commit_crop().unwrap(), image);
    let crop = session.scene().object(image).unwrap().as_image().unwrap().crop;
    assert!((crop.width - crop.height).abs() < 1e-2);

    // Still in crop mode, ready for another round
    assert_eq!(session.mode(), ToolMode::Crop);
    assert!(session.begin_crop().unwrap());
    assert_eq!(session.begin_crop(), Ok(false));

    // Corner handles resize around the opposite corner
    let overlay = session.crop().unwrap().overlay_rect(session.scene()).unwrap();
    let rect = session
        .drag_crop_corner(overlay.left_top(), overlay.left_top() + Vec2::new(50.0, 30.0))
        .unwrap()
        .unwrap();
    assert_eq!(rect.min, overlay.min);
    assert!((rect.width() - 50.0).abs() < 1e-3);
    let size = session.scale_crop(2.0, 1.0).unwrap().unwrap();
    assert!((size.x - 100.0).abs() < 1e-3);

    assert!(session.take_notices().iter().all(|n| !n.is_error()));
    assert!(session.cancel_crop().unwrap());
}

#[test]
fn test_crop_mode_without_image_shows_notice() {
    let (mut session, _, _) = open(Project::new(project_id(), "Empty", 800, 600));

    let result = session.select_tool(ToolMode::Crop);
    assert_eq!(result, Err(TransitionError::NoTargetImage { mode: ToolMode::Crop }));
    assert!(session.take_notices().iter().any(|n| n.is_error()));

    // Retrying from the crop panel says why nothing happened
    assert_eq!(session.begin_crop(), Ok(false));
    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].is_error());
}

#[test]
fn test_adjust_and_text() {
    let (mut session, _, _) = open(cat_project());

    session.select_tool(ToolMode::Adjust).unwrap();
    session.set_filter(FilterKind::Saturation, -0.4).unwrap();
    assert_eq!(session.filter_value(FilterKind::Saturation), Ok(-0.4));
    session.reset_filters().unwrap();
    assert_eq!(session.filter_value(FilterKind::Saturation), Ok(0.0));

    session.select_tool(ToolMode::Text).unwrap();
    let id = session.add_text("Hello").unwrap();
    assert_eq!(session.scene().active_id(), Some(id));
    assert!(session.update_text(id, "Hello there").unwrap());
    let text = session.scene().object(id).unwrap().as_text().unwrap();
    assert_eq!(text.content, "Hello there");
    assert_eq!(session.scene().object(id).unwrap().center(), Pos2::new(400.0, 300.0));
}

#[test]
fn test_background_color_and_image() {
    let (mut session, _, _) = open(cat_project());
    session.select_tool(ToolMode::Background).unwrap();

    session.apply_background_color("#123456").unwrap();
    assert_eq!(session.scene().background().color.as_deref(), Some("#123456"));

    block_on(session.apply_background_image("backgrounds/sky.jpg")).unwrap();
    let image = session.scene().background().image.clone().unwrap();
    // Cover scale: max(800 / 400, 600 / 400)
    assert_eq!(image.geometry.scale_x, 2.0);
    assert_eq!(image.geometry.left, 400.0);
    assert_eq!(image.geometry.top, 300.0);

    session.apply_background_color("#ffffff").unwrap();
    assert!(session.scene().background().image.is_none());

    session.clear_background().unwrap();
    assert!(session.scene().background().is_empty());
}

#[test]
fn test_background_image_load_failure_leaves_scene() {
    let (mut session, _, _) = open(cat_project());
    session.select_tool(ToolMode::Background).unwrap();
    let before = session.scene().background().clone();

    let result = block_on(session.apply_background_image("backgrounds/missing.jpg"));
    assert!(matches!(result, Err(EditorError::Load(_))));
    assert_eq!(session.scene().background(), &before);
    assert!(session.take_notices().iter().any(|n| n.is_error()));
}

#[test]
fn test_remove_background_swaps_main_image() {
    let (mut session, store, _) = open(cat_project());
    let old = session.scene().first_image().unwrap().clone();
    session.select_tool(ToolMode::Background).unwrap();

    let id = block_on(session.remove_background()).unwrap();

    let image = session.scene().object(id).unwrap();
    assert_eq!(image.as_image().unwrap().src, PROCESSED);
    assert_eq!(image.geometry, old.geometry);
    assert!(!session.scene().contains(old.id()));
    assert_eq!(session.scene().active_id(), Some(id));
    assert!(session.processing_message().is_none());

    let project = store.project(&project_id()).unwrap();
    assert_eq!(project.current_image_url.as_deref(), Some(PROCESSED));
    assert!(project.background_removed);
    assert!(project.canvas_state.is_some());
    assert_eq!(store.write_count(), 1);
    assert!(!session.synchronizer().has_pending());
}

#[test]
fn test_remove_background_failure_keeps_image() {
    let (mut session, store, loader) = open(cat_project());
    loader.remove(PROCESSED);
    session.select_tool(ToolMode::Background).unwrap();
    let before = session.scene().objects().to_vec();

    let result = block_on(session.remove_background());
    assert!(matches!(result, Err(EditorError::Load(_))));
    assert_eq!(session.scene().objects(), before.as_slice());
    assert_eq!(store.write_count(), 0);
    assert!(session.processing_message().is_none());
}

#[test]
fn test_reset_to_original() {
    let mut project = cat_project();
    project.current_image_url = Some(PROCESSED.to_owned());
    project.active_transformations = Some("e-bgremove".to_owned());
    project.background_removed = true;
    let (mut session, store, _) = open(project);

    session.select_tool(ToolMode::Text).unwrap();
    session.add_text("Gone soon").unwrap();
    session.select_tool(ToolMode::Crop).unwrap();

    let id = block_on(session.reset_to_original()).unwrap();

    let scene = session.scene();
    assert_eq!(scene.len(), 1);
    let image = scene.object(id).unwrap();
    assert_eq!(image.as_image().unwrap().src, ORIGINAL);
    assert!(image.as_image().unwrap().filters.is_empty());
    assert_eq!(scene.active_id(), Some(id));
    assert_eq!(scene.background().color.as_deref(), Some("#ffffff"));
    assert!(scene.objects().iter().all(|o| !o.is_crop_overlay()));

    let stored = store.project(&project_id()).unwrap();
    assert_eq!(stored.current_image_url.as_deref(), Some(ORIGINAL));
    assert_eq!(stored.active_transformations, None);
    assert!(!stored.background_removed);
    assert_eq!(store.write_count(), 1);

    let notices = session.take_notices();
    assert!(notices
        .iter()
        .any(|n| n.level == NoticeLevel::Success && n.message == "Canvas reset to original image"));
}

#[test]
fn test_reset_without_original_image() {
    let (mut session, store, _) = open(Project::new(project_id(), "Blank", 800, 600));

    let result = block_on(session.reset_to_original());
    assert!(matches!(result, Err(EditorError::NoOriginalImage)));
    let notices = session.take_notices();
    assert_eq!(notices[0].message, "No original image found to reset to");
    assert_eq!(store.write_count(), 0);
}

#[test]
fn test_reset_load_failure_leaves_scene() {
    let (mut session, store, loader) = open(cat_project());
    let before = session.scene().objects().to_vec();
    loader.remove(ORIGINAL);

    let result = block_on(session.reset_to_original());
    assert!(matches!(result, Err(EditorError::Load(_))));
    assert_eq!(session.scene().objects(), before.as_slice());
    assert_eq!(store.write_count(), 0);
}

#[test]
fn test_container_resize_updates_viewport() {
    let (mut session, _, _) = open(cat_project());
    let bus: EventBus<ContainerEvent> = EventBus::new();
    session.attach_container(&bus);

    bus.emit(ContainerEvent::Resized {
        size: Vec2::new(440.0, 1000.0),
        pixels_per_point: 2.0,
    });
    let viewport = session.viewport();
    assert!((viewport.scale() - 0.5).abs() < 1e-6);
    assert_eq!(viewport.backing_size(), Vec2::new(1600.0, 1200.0));

    session.close();
    assert_eq!(bus.handler_count(), 0);
}

#[test]
fn test_select_and_move() {
    let (mut session, _, _) = open(cat_project());
    let id = session.scene().first_image().unwrap().id();

    assert_eq!(session.select_at(Pos2::new(5.0, 5.0)), Some(id));
    assert!(session.move_object(id, Vec2::new(10.0, -5.0)));
    assert_eq!(session.scene().object(id).unwrap().center(), Pos2::new(410.0, 295.0));

    // Clicking outside the moved image clears the selection
    assert_eq!(session.select_at(Pos2::new(5.0, 597.0)), None);
    assert_eq!(session.scene().active_id(), None);
}

#[test]
fn test_drop_tears_down_session() {
    let (mut session, _, _) = open(cat_project());
    session.select_tool(ToolMode::Crop).unwrap();
    let bus = session.scene().events().clone();
    assert_eq!(bus.handler_count(), 1);

    drop(session);
    assert_eq!(bus.handler_count(), 0);
}
