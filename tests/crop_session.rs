use egui::{Pos2, Rect, Vec2};

use photo_canvas::element::{factory, Geometry, Interactivity, ObjectId, SourceRect};
use photo_canvas::error::CropError;
use photo_canvas::scene::Scene;
use photo_canvas::tool::{CropSession, CropSettings, Tool};

const EPS: f32 = 1e-3;

fn assert_close(actual: f32, expected: f32) {
    assert!((actual - expected).abs() < EPS, "{} != {}", actual, expected);
}

/// 200x100 image at the origin with unit scale
fn create_test_scene() -> (Scene, ObjectId) {
    let mut scene = Scene::new(400, 300);
    let image = scene.add_object(factory::image("photos/cat.jpg", 200, 100, Geometry::at(0.0, 0.0)));
    (scene, image)
}

fn start_crop(scene: &mut Scene, target: ObjectId) -> CropSession {
    let mut crop = CropSession::new(CropSettings::default());
    assert!(crop.begin(scene, Some(target)));
    crop
}

fn overlay_count(scene: &Scene) -> usize {
    scene.objects().iter().filter(|o| o.is_crop_overlay()).count()
}

#[test]
fn test_begin_places_overlay_with_inset() {
    let (mut scene, image) = create_test_scene();
    let crop = start_crop(&mut scene, image);

    let rect = crop.overlay_rect(&scene).unwrap();
    assert_close(rect.min.x, 20.0);
    assert_close(rect.min.y, 10.0);
    assert_close(rect.width(), 160.0);
    assert_close(rect.height(), 80.0);

    // Overlay is selected, target is passive
    assert_eq!(scene.active_id(), crop.overlay());
    assert_eq!(scene.object(image).unwrap().interactivity, Interactivity::PASSIVE);
    assert_eq!(overlay_count(&scene), 1);
}

#[test]
fn test_begin_is_noop_when_active_or_without_image() {
    let (mut scene, image) = create_test_scene();
    let mut crop = start_crop(&mut scene, image);
    assert!(!crop.begin(&mut scene, Some(image)));
    assert_eq!(overlay_count(&scene), 1);

    let mut other = CropSession::new(CropSettings::default());
    let text = scene.add_object(factory::rect(10.0, 10.0, Geometry::default()));
    assert!(!other.begin(&mut scene, Some(text)));
    assert!(!other.begin(&mut scene, None));
    assert!(!other.is_active());
}

#[test]
fn test_begin_removes_stray_overlays() {
    let (mut scene, image) = create_test_scene();
    scene.add_object(factory::crop_overlay(Rect::from_min_size(Pos2::ZERO, Vec2::splat(5.0))));
    scene.add_object(factory::crop_overlay(Rect::from_min_size(Pos2::ZERO, Vec2::splat(7.0))));

    let _crop = start_crop(&mut scene, image);
    assert_eq!(overlay_count(&scene), 1);
}

#[test]
fn test_square_ratio_constrains_resize() {
    let (mut scene, image) = create_test_scene();
    let mut crop = start_crop(&mut scene, image);

    crop.set_aspect_ratio(&mut scene, Some(1.0));
    let size = crop.resize_overlay(&mut scene, 300.0, 150.0).unwrap();
    assert_close(size.x, 300.0);
    assert_close(size.y, 300.0);

    // Back to free-form: sizes are taken as given
    crop.set_aspect_ratio(&mut scene, None);
    let size = crop.resize_overlay(&mut scene, 300.0, 150.0).unwrap();
    assert_close(size.x, 300.0);
    assert_close(size.y, 150.0);
}

#[test]
fn test_collapsed_resize_keeps_minimum_size() {
    let (mut scene, image) = create_test_scene();
    let mut crop = start_crop(&mut scene, image);

    crop.set_aspect_ratio(&mut scene, Some(1.0));
    let size = crop.resize_overlay(&mut scene, 0.0, 0.0).unwrap();
    assert_close(size.x, 2.0);
    assert_close(size.y, 2.0);

    // The overlay can still be resized freely afterwards
    crop.set_aspect_ratio(&mut scene, None);
    let size = crop.resize_overlay(&mut scene, 50.0, 40.0).unwrap();
    assert_close(size.x, 50.0);
    assert_close(size.y, 40.0);

    // A zero scale factor is clamped the same way
    let size = crop.scale_overlay(&mut scene, 0.0, 2.0).unwrap();
    assert_close(size.x, 2.0);
    assert_close(size.y, 80.0);
    let size = crop.resize_overlay(&mut scene, 30.0, 30.0).unwrap();
    assert_close(size.x, 30.0);
}

#[test]
fn test_scale_is_relative_to_current_overlay() {
    let (mut scene, image) = create_test_scene();
    let mut crop = start_crop(&mut scene, image);

    let size = crop.scale_overlay(&mut scene, 0.5, 0.5).unwrap();
    assert_close(size.x, 80.0);
    assert_close(size.y, 40.0);

    crop.set_aspect_ratio(&mut scene, Some(1.0));
    let size = crop.scale_overlay(&mut scene, 1.5, 1.0).unwrap();
    assert_close(size.x, size.y);
}

#[test]
fn test_corner_drag_keeps_opposite_corner() {
    let (mut scene, image) = create_test_scene();
    let mut crop = start_crop(&mut scene, image);
    let start = crop.overlay_rect(&scene).unwrap();

    // Drag the top-left handle up and left; bottom-right stays put
    let anchor = start.right_bottom();
    let rect = crop
        .resize_from_corner(&mut scene, anchor, Pos2::new(0.0, 0.0))
        .unwrap();
    assert_close(rect.min.x, 0.0);
    assert_close(rect.min.y, 0.0);
    assert_close(rect.max.x, anchor.x);
    assert_close(rect.max.y, anchor.y);

    // With a square ratio the height follows the width, still anchored
    crop.set_aspect_ratio(&mut scene, Some(1.0));
    let rect = crop
        .resize_from_corner(&mut scene, anchor, Pos2::new(120.0, 0.0))
        .unwrap();
    assert_close(rect.width(), 60.0);
    assert_close(rect.height(), 60.0);
    assert_close(rect.max.x, anchor.x);
    assert_close(rect.max.y, anchor.y);
}

#[test]
fn test_ratio_within_tolerance_is_left_alone() {
    let (mut scene, image) = create_test_scene();
    let mut crop = start_crop(&mut scene, image);
    crop.set_aspect_ratio(&mut scene, Some(1.0));

    let size = crop.resize_overlay(&mut scene, 100.0, 100.5).unwrap();
    assert_close(size.y, 100.5);
}

#[test]
fn test_selecting_ratio_reshapes_around_center() {
    let (mut scene, image) = create_test_scene();
    let mut crop = start_crop(&mut scene, image);
    let before = crop.overlay_rect(&scene).unwrap();

    // 160 wide at 16:9 is 90 tall, which still fits the 100 px target
    crop.set_aspect_ratio(&mut scene, Some(16.0 / 9.0));
    let after = crop.overlay_rect(&scene).unwrap();
    assert_close(after.width(), 160.0);
    assert_close(after.height(), 90.0);
    assert_close(after.center().x, before.center().x);
    assert_close(after.center().y, before.center().y);

    // Square would need 160 px of height; it is capped at the target's 100
    crop.set_aspect_ratio(&mut scene, Some(1.0));
    let square = crop.overlay_rect(&scene).unwrap();
    assert_close(square.width(), 100.0);
    assert_close(square.height(), 100.0);
}

#[test]
fn test_cancel_restores_snapshot_exactly() {
    let (mut scene, image) = create_test_scene();
    scene.modify(image, |object| {
        object.geometry.angle = 12.5;
        object.geometry.scale_x = 0.75;
        object.interactivity.evented = false;
    });
    let original = scene.object(image).unwrap().clone();

    let mut crop = start_crop(&mut scene, image);
    crop.set_aspect_ratio(&mut scene, Some(4.0 / 5.0));
    crop.resize_overlay(&mut scene, 50.0, 20.0);
    crop.move_overlay(&mut scene, 3.0, 4.0);

    assert!(crop.cancel(&mut scene));
    let restored = scene.object(image).unwrap();
    assert_eq!(restored.geometry, original.geometry);
    assert_eq!(restored.interactivity, original.interactivity);
    assert_eq!(overlay_count(&scene), 0);
    assert_eq!(scene.active_id(), Some(image));
    assert!(!crop.is_active());

    // Nothing left to cancel
    assert!(!crop.cancel(&mut scene));
}

#[test]
fn test_commit_sets_source_region() {
    let (mut scene, image) = create_test_scene();
    let mut crop = start_crop(&mut scene, image);

    assert_eq!(crop.commit(&mut scene), Ok(image));

    let object = scene.object(image).unwrap();
    let data = object.as_image().unwrap();
    assert_eq!(
        data.crop,
        SourceRect {
            x: 20.0,
            y: 10.0,
            width: 160.0,
            height: 80.0
        }
    );

    // The kept pixels stay where the overlay was
    let bounds = object.bounding_rect();
    assert_close(bounds.min.x, 20.0);
    assert_close(bounds.min.y, 10.0);
    assert_close(bounds.width(), 160.0);
    assert_close(bounds.height(), 80.0);

    assert_eq!(object.interactivity, Interactivity::default());
    assert_eq!(overlay_count(&scene), 0);
    assert!(!crop.is_active());
}

#[test]
fn test_commit_maps_through_image_scale() {
    let mut scene = Scene::new(400, 300);
    let mut geometry = Geometry::at(0.0, 0.0);
    geometry.scale_x = 0.5;
    geometry.scale_y = 0.5;
    let image = scene.add_object(factory::image("photos/big.jpg", 400, 200, geometry));

    let mut crop = start_crop(&mut scene, image);
    crop.move_overlay(&mut scene, 0.0, 0.0);
    crop.commit(&mut scene).unwrap();

    let object = scene.object(image).unwrap();
    let data = object.as_image().unwrap();
    assert_close(data.crop.x, 0.0);
    assert_close(data.crop.y, 0.0);
    assert_close(data.crop.width, 320.0);
    assert_close(data.crop.height, 160.0);

    let bounds = object.bounding_rect();
    assert_close(bounds.min.x, 0.0);
    assert_close(bounds.max.x, 160.0);
    assert_close(bounds.max.y, 80.0);
}

#[test]
fn test_second_commit_crops_within_first() {
    let (mut scene, image) = create_test_scene();
    let mut crop = start_crop(&mut scene, image);
    crop.commit(&mut scene).unwrap();

    // The image is now 160x80 at (20, 10); a new overlay sits at 10% inset
    assert!(crop.begin(&mut scene, Some(image)));
    crop.commit(&mut scene).unwrap();

    let data = scene.object(image).unwrap().as_image().unwrap().clone();
    assert_close(data.crop.x, 36.0);
    assert_close(data.crop.y, 18.0);
    assert_close(data.crop.width, 128.0);
    assert_close(data.crop.height, 64.0);
}

#[test]
fn test_commit_outside_image_is_rejected() {
    let (mut scene, image) = create_test_scene();
    let mut crop = start_crop(&mut scene, image);
    crop.move_overlay(&mut scene, 1000.0, 1000.0);

    let result = crop.commit(&mut scene);
    assert!(matches!(result, Err(CropError::InvalidRegion { .. })));

    // Still cropping; the user can fix the region or cancel
    assert!(crop.is_active());
    assert_eq!(overlay_count(&scene), 1);
}

#[test]
fn test_commit_without_session() {
    let (mut scene, _) = create_test_scene();
    let mut crop = CropSession::new(CropSettings::default());
    assert_eq!(crop.commit(&mut scene), Err(CropError::NotActive));
}

#[test]
fn test_sanitized_blob_holds_original_target() {
    let (mut scene, image) = create_test_scene();
    let crop = start_crop(&mut scene, image);

    let mut blob = scene.to_blob();
    assert_eq!(blob.objects.len(), 1);
    assert_eq!(blob.objects[0].interactivity, Interactivity::PASSIVE);

    crop.sanitize_blob(&mut blob);
    assert_eq!(blob.objects[0].interactivity, Interactivity::default());
}
