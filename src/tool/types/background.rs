use log::info;

use crate::element::{Geometry, ImageData, ObjectId, ObjectKind, VisualObject, factory};
use crate::image::LoadedImage;
use crate::scene::{BackgroundImage, Scene};
use crate::tool::Tool;

/// Canvas background and main-image background removal
#[derive(Debug, Default)]
pub struct BackgroundTool;

impl BackgroundTool {
    pub fn new() -> Self {
        Self
    }

    /// Solid background. Replaces any background image.
    pub fn apply_color(&mut self, scene: &mut Scene, color: &str) {
        scene.set_background_image(None);
        scene.set_background_color(Some(color.to_owned()));
    }

    /// Background image scaled to cover the whole canvas, centered
    pub fn apply_image(&mut self, scene: &mut Scene, image: &LoadedImage) {
        let canvas = scene.logical_size();
        let scale = factory::cover_scale(egui::Vec2::new(image.width as f32, image.height as f32), canvas);
        scene.set_background_image(Some(BackgroundImage {
            src: image.url.clone(),
            natural_width: image.width,
            natural_height: image.height,
            geometry: Geometry::centered(scene.center(), scale),
        }));
    }

    /// No color, no image
    pub fn clear(&mut self, scene: &mut Scene) {
        scene.set_background(Default::default());
    }

    /// Swap the image `target` for `replacement`, keeping its placement and
    /// paint position. The visible source region carries over when the two
    /// images have the same pixel size.
    pub fn swap_image(scene: &mut Scene, target: ObjectId, replacement: &LoadedImage) -> Option<ObjectId> {
        let current = scene.object(target)?;
        let old = current.as_image()?;

        let mut data = ImageData::new(&replacement.url, replacement.width, replacement.height);
        if old.natural_width == replacement.width && old.natural_height == replacement.height {
            data.crop = old.crop;
        }
        let mut object = VisualObject::new(ObjectKind::Image(data), current.geometry);
        object.interactivity = current.interactivity;

        let id = object.id();
        scene.replace_object(target, object);
        scene.set_active_object(Some(id));
        info!("Swapped image {} for {}", target, replacement.url);
        Some(id)
    }
}

impl Tool for BackgroundTool {
    fn name(&self) -> &'static str {
        "background"
    }

    fn deactivate(&mut self, _scene: &mut Scene) {}
}
