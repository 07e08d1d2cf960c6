use egui::{Pos2, Vec2};
use parking_lot::Mutex;
use std::sync::Arc;

use photo_canvas::element::{factory, FilterKind, Geometry, ObjectKind, TextStyle};
use photo_canvas::error::DeserializationError;
use photo_canvas::event::{EventBus, SceneEvent, SubscriptionId};
use photo_canvas::scene::{Background, BackgroundImage, Scene, SceneBlob, SCENE_BLOB_VERSION};

fn create_test_scene() -> Scene {
    let mut scene = Scene::new(800, 600);
    scene.set_background(Background::solid("#ffffff"));

    let mut image = factory::fitted_image("photos/beach.jpg", 1600, 900, scene.logical_size());
    if let ObjectKind::Image(data) = &mut image.kind {
        data.set_filter(FilterKind::Brightness, 0.2);
    }
    scene.add_object(image);

    let mut rect = factory::rect(120.0, 40.0, Geometry::at(10.0, 20.0));
    rect.geometry.angle = 30.0;
    scene.add_object(rect);

    scene.add_object(factory::text("Hello", TextStyle::default(), Pos2::new(400.0, 100.0)));
    scene
}

fn record_events(scene: &Scene) -> Arc<Mutex<Vec<SceneEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    scene
        .events()
        .subscribe(Box::new(move |event: &SceneEvent| sink.lock().push(event.clone())));
    events
}

#[test]
fn test_serialize_restore_round_trip() {
    let scene = create_test_scene();
    let json = scene.serialize().unwrap();

    let mut restored = Scene::new(800, 600);
    restored.restore(&json).unwrap();

    // Same objects in the same paint order, same background
    assert_eq!(restored.objects(), scene.objects());
    assert_eq!(restored.background(), scene.background());
    assert_eq!(restored.objects()[1].geometry.angle, 30.0);
}

#[test]
fn test_selection_is_not_persisted() {
    let mut scene = create_test_scene();
    let id = scene.objects()[2].id();
    assert!(scene.set_active_object(Some(id)));

    let mut restored = Scene::new(800, 600);
    restored.restore(&scene.serialize().unwrap()).unwrap();

    assert_eq!(restored.active_id(), None);
    assert!(restored.contains(id));
}

#[test]
fn test_restore_malformed_leaves_scene_untouched() {
    let mut scene = create_test_scene();
    let before = scene.objects().to_vec();

    let result = scene.restore("{\"width\": 800, \"height\": ");
    assert!(matches!(result, Err(DeserializationError::Malformed(_))));
    assert_eq!(scene.objects(), before.as_slice());
    assert_eq!(scene.background(), &Background::solid("#ffffff"));
}

#[test]
fn test_restore_rejects_newer_version_and_wrong_size() {
    let mut scene = Scene::new(800, 600);

    let mut blob = create_test_scene().to_blob();
    blob.version = SCENE_BLOB_VERSION + 1;
    let result = scene.restore(&blob.to_json().unwrap());
    assert!(matches!(result, Err(DeserializationError::UnsupportedVersion { .. })));

    let other = Scene::new(1080, 1080);
    let result = scene.restore(&other.serialize().unwrap());
    assert!(matches!(
        result,
        Err(DeserializationError::DimensionMismatch { found_width: 1080, .. })
    ));
    assert!(scene.is_empty());
}

#[test]
fn test_restore_rejects_duplicate_ids() {
    let scene = create_test_scene();
    let mut blob = scene.to_blob();
    blob.objects.push(blob.objects[0].clone());

    let result = SceneBlob::parse(&blob.to_json().unwrap());
    assert!(matches!(result, Err(DeserializationError::DuplicateObject(_))));
}

#[test]
fn test_blob_without_version_is_read_as_first_version() {
    let json = r##"{"width": 800, "height": 600, "background": {"color": "#000000", "image": null}}"##;
    let blob = SceneBlob::parse(json).unwrap();
    assert_eq!(blob.version, 1);
    assert!(blob.objects.is_empty());
}

#[test]
fn test_crop_overlays_are_not_serialized() {
    let mut scene = create_test_scene();
    let overlay = scene.add_object(factory::crop_overlay(egui::Rect::from_min_size(
        Pos2::new(10.0, 10.0),
        Vec2::new(50.0, 50.0),
    )));

    let blob = scene.to_blob();
    assert_eq!(blob.objects.len(), 3);
    assert!(blob.objects.iter().all(|object| object.id() != overlay));
}

#[test]
fn test_mutations_emit_events() {
    let mut scene = Scene::new(800, 600);
    let events = record_events(&scene);

    let id = scene.add_object(factory::rect(10.0, 10.0, Geometry::default()));
    scene.set_active_object(Some(id));
    scene.modify(id, |object| object.geometry.left = 5.0);
    scene.set_background_color(Some("#000000".to_owned()));
    scene.remove_object(id);

    let events = events.lock();
    assert_eq!(
        *events,
        vec![
            SceneEvent::ObjectAdded { id },
            SceneEvent::SelectionChanged { id: Some(id) },
            SceneEvent::ObjectModified { id },
            SceneEvent::BackgroundChanged,
            SceneEvent::ObjectRemoved { id },
            SceneEvent::SelectionChanged { id: None },
        ]
    );

    // Only selection changes are not saved
    let persistent: Vec<bool> = events.iter().map(SceneEvent::is_persistent_change).collect();
    assert_eq!(persistent, vec![true, false, true, true, true, false]);
}

#[test]
fn test_handler_can_unsubscribe_itself() {
    let bus: EventBus<SceneEvent> = EventBus::new();
    let own_id: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
    let calls = Arc::new(Mutex::new(0));

    let handle = bus.clone();
    let slot = Arc::clone(&own_id);
    let counter = Arc::clone(&calls);
    let id = bus.subscribe(Box::new(move |_: &SceneEvent| {
        *counter.lock() += 1;
        if let Some(id) = slot.lock().take() {
            handle.unsubscribe(id);
        }
    }));
    *own_id.lock() = Some(id);

    bus.emit(SceneEvent::BackgroundChanged);
    bus.emit(SceneEvent::BackgroundChanged);
    assert_eq!(*calls.lock(), 1);
    assert_eq!(bus.handler_count(), 0);
}

#[test]
fn test_handler_can_emit_and_subscribe() {
    let bus: EventBus<SceneEvent> = EventBus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let handle = bus.clone();
    bus.subscribe(Box::new(move |event: &SceneEvent| {
        if *event == SceneEvent::Cleared {
            handle.subscribe(Box::new(|_: &SceneEvent| {}));
            handle.emit(SceneEvent::BackgroundChanged);
        }
    }));
    let log = Arc::clone(&seen);
    bus.subscribe(Box::new(move |event: &SceneEvent| log.lock().push(event.clone())));

    bus.emit(SceneEvent::Cleared);

    // The nested event reaches the other handler first, then the outer one does
    assert_eq!(*seen.lock(), vec![SceneEvent::BackgroundChanged, SceneEvent::Cleared]);
    assert_eq!(bus.handler_count(), 3);
}

#[test]
fn test_restore_emits_only_restored() {
    let source = create_test_scene();
    let mut scene = Scene::new(800, 600);
    let events = record_events(&scene);

    scene.restore(&source.serialize().unwrap()).unwrap();
    assert_eq!(*events.lock(), vec![SceneEvent::Restored]);
    assert!(!SceneEvent::Restored.is_persistent_change());
}

#[test]
fn test_selecting_unknown_object_is_rejected() {
    let mut scene = create_test_scene();
    let stranger = factory::rect(1.0, 1.0, Geometry::default());
    assert!(!scene.set_active_object(Some(stranger.id())));
    assert_eq!(scene.active_id(), None);
}

#[test]
fn test_primary_image_prefers_selected_image() {
    let mut scene = create_test_scene();
    let first = scene.objects()[0].id();
    let second = scene.add_object(factory::image("photos/dog.png", 100, 100, Geometry::default()));

    assert_eq!(scene.primary_image().map(|o| o.id()), Some(first));

    scene.set_active_object(Some(second));
    assert_eq!(scene.primary_image().map(|o| o.id()), Some(second));

    // A selected non-image falls back to the first image
    let text = scene.objects()[2].id();
    scene.set_active_object(Some(text));
    assert_eq!(scene.primary_image().map(|o| o.id()), Some(first));
}

#[test]
fn test_fitted_image_scales_by_the_constraining_side() {
    let canvas = Vec2::new(800.0, 600.0);

    // Wider than the canvas: fit width
    let wide = factory::fitted_image("wide.jpg", 1600, 900, canvas);
    assert!((wide.geometry.scale_x - 0.5).abs() < 1e-6);
    assert_eq!(wide.center(), Pos2::new(400.0, 300.0));

    // Taller than the canvas: fit height
    let tall = factory::fitted_image("tall.jpg", 600, 1200, canvas);
    assert!((tall.geometry.scale_y - 0.5).abs() < 1e-6);
    assert!((tall.scaled_size().y - 600.0).abs() < 1e-3);
}

#[test]
fn test_hit_test_skips_passive_objects() {
    let mut scene = Scene::new(800, 600);
    let below = scene.add_object(factory::rect(100.0, 100.0, Geometry::at(0.0, 0.0)));
    let above = scene.add_object(factory::rect(100.0, 100.0, Geometry::at(50.0, 50.0)));

    assert_eq!(scene.hit_test(Pos2::new(75.0, 75.0)), Some(above));

    scene.modify(above, |object| {
        object.interactivity = photo_canvas::element::Interactivity::PASSIVE
    });
    assert_eq!(scene.hit_test(Pos2::new(75.0, 75.0)), Some(below));
    assert_eq!(scene.hit_test(Pos2::new(500.0, 500.0)), None);
}

#[test]
fn test_background_image_round_trip() {
    let mut scene = Scene::new(800, 600);
    scene.set_background_image(Some(BackgroundImage {
        src: "backgrounds/sky.jpg".to_owned(),
        natural_width: 400,
        natural_height: 400,
        geometry: Geometry::centered(Pos2::new(400.0, 300.0), 2.0),
    }));

    let mut restored = Scene::new(800, 600);
    restored.restore(&scene.serialize().unwrap()).unwrap();
    assert_eq!(restored.background(), scene.background());
}
