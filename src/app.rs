use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, Vec2};
use futures::executor::block_on;
use std::time::Duration;

use crate::element::{FilterKind, ObjectId, ObjectKind, VisualObject};
use crate::event::{ContainerEvent, EventBus};
use crate::notice::{Notice, NoticeLevel};
use crate::state::{EditorSession, ToolMode};
use crate::tool::ASPECT_RATIOS;
use crate::viewport::Viewport;

const NOTICE_SECONDS: f64 = 4.0;
const HANDLE_RADIUS: f32 = 5.0;
const SELECTION_COLOR: Color32 = Color32::from_rgb(0, 188, 212);
const IMAGE_PLACEHOLDER: Color32 = Color32::from_gray(200);

/// What the current pointer drag acts on
#[derive(Clone, Copy, Debug)]
enum Drag {
    Object(ObjectId),
    /// A crop overlay corner; `anchor` is the opposite corner, in logical space
    CropCorner { anchor: Pos2 },
}

/// Native host for one editing session
pub struct PhotoEditorApp {
    session: EditorSession,
    container: EventBus<ContainerEvent>,
    last_container: Option<(Vec2, f32)>,
    notices: Vec<(Notice, f64)>,
    dragging: Option<Drag>,
    new_text: String,
    background_color: String,
    background_url: String,
}

impl PhotoEditorApp {
    /// Called once before the first frame.
    pub fn new(_cc: &eframe::CreationContext<'_>, mut session: EditorSession) -> Self {
        let container = EventBus::new();
        session.attach_container(&container);
        let background_color = session.config().default_background.clone();
        Self {
            session,
            container,
            last_container: None,
            notices: Vec::new(),
            dragging: None,
            new_text: "Edit this text".to_owned(),
            background_color,
            background_url: String::new(),
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(&self.session.project().title);
            ui.separator();
            let current = self.session.mode();
            for mode in ToolMode::ALL {
                if ui.selectable_label(current == mode, mode.label()).clicked() {
                    // Failures are queued as notices by the session
                    let _ = self.session.select_tool(mode);
                }
            }
            ui.separator();
            if ui.button("Reset").clicked() {
                let _ = block_on(self.session.reset_to_original());
            }
            if ui.button("Save").clicked() {
                let _ = block_on(self.session.save());
            }
            if let Some(message) = self.session.processing_message() {
                ui.spinner();
                ui.label(message);
            }
        });
    }

    fn tool_panel(&mut self, ui: &mut egui::Ui) {
        match self.session.mode() {
            ToolMode::Default => {
                ui.label("Click an object to select it, drag to move it.");
            }
            ToolMode::Crop => self.crop_panel(ui),
            ToolMode::Adjust => self.adjust_panel(ui),
            ToolMode::Text => self.text_panel(ui),
            ToolMode::Background => self.background_panel(ui),
        }
    }

    fn crop_panel(&mut self, ui: &mut egui::Ui) {
        let active = self.session.crop().is_some_and(|crop| crop.is_active());
        if !active {
            if ui.button("Start Cropping").clicked() {
                // Queues a notice when there is no image
                let _ = self.session.begin_crop();
            }
            return;
        }

        // Only shown in crop mode with an active crop, so the calls below
        // cannot fail
        ui.label("Crop Aspect Ratios");
        let current = self.session.crop().and_then(|crop| crop.aspect_ratio());
        for preset in ASPECT_RATIOS {
            let label = if preset.display.is_empty() {
                preset.label.to_owned()
            } else {
                format!("{} ({})", preset.label, preset.display)
            };
            if ui.selectable_label(current == preset.ratio, label).clicked() {
                let _ = self.session.set_crop_aspect_ratio(preset.ratio);
            }
        }
        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Apply Crop").clicked() {
                let _ = self.session.commit_crop();
            }
            if ui.button("Cancel").clicked() {
                let _ = self.session.cancel_crop();
            }
        });
    }

    fn adjust_panel(&mut self, ui: &mut egui::Ui) {
        if self.session.scene().first_image().is_none() {
            ui.label("Add an image to adjust it.");
            return;
        }
        for kind in FilterKind::ALL {
            let Ok(mut value) = self.session.filter_value(kind) else {
                return;
            };
            let (min, max) = kind.range();
            if ui
                .add(egui::Slider::new(&mut value, min..=max).text(kind.label()))
                .changed()
            {
                let _ = self.session.set_filter(kind, value);
            }
        }
        if ui.button("Reset Adjustments").clicked() {
            let _ = self.session.reset_filters();
        }
    }

    fn text_panel(&mut self, ui: &mut egui::Ui) {
        ui.text_edit_singleline(&mut self.new_text);
        if ui.button("Add Text").clicked() {
            let _ = self.session.add_text(&self.new_text);
        }

        let selected = self
            .session
            .scene()
            .active_object()
            .and_then(|object| object.as_text().map(|text| (object.id(), text.content.clone())));
        if let Some((id, mut content)) = selected {
            ui.separator();
            ui.label("Selected text");
            if ui.text_edit_multiline(&mut content).changed() {
                let _ = self.session.update_text(id, &content);
            }
        }
    }

    fn background_panel(&mut self, ui: &mut egui::Ui) {
        let has_image = self.session.scene().first_image().is_some();
        let busy = self.session.processing_message().is_some();
        if ui
            .add_enabled(has_image && !busy, egui::Button::new("Remove Image Background"))
            .clicked()
        {
            let _ = block_on(self.session.remove_background());
        }

        ui.separator();
        ui.horizontal(|ui| {
            ui.text_edit_singleline(&mut self.background_color);
            if ui.button("Apply Color").clicked() {
                let _ = self.session.apply_background_color(&self.background_color);
            }
        });
        ui.horizontal(|ui| {
            ui.text_edit_singleline(&mut self.background_url);
            if ui.button("Set Image").clicked() && !self.background_url.trim().is_empty() {
                let url = self.background_url.trim().to_owned();
                let _ = block_on(self.session.apply_background_image(&url));
            }
        });
        if ui.button("Remove Canvas Background").clicked() {
            let _ = self.session.clear_background();
        }
    }

    /// Publish the container size when it changed
    fn track_container(&mut self, size: Vec2, pixels_per_point: f32) {
        if self.last_container != Some((size, pixels_per_point)) {
            self.last_container = Some((size, pixels_per_point));
            self.container.emit(ContainerEvent::Resized {
                size,
                pixels_per_point,
            });
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let size = ui.available_size();
        let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
        let pixels_per_point = ui.ctx().pixels_per_point();
        self.track_container(response.rect.size(), pixels_per_point);

        let viewport = self.session.viewport();
        let canvas = viewport.canvas_rect(response.rect.min);
        let to_logical = |pos: Pos2| viewport.screen_to_logical((pos - canvas.min).to_pos2());

        self.handle_pointer(&response, &viewport, canvas);

        let hovered = response
            .hover_pos()
            .and_then(|pos| self.session.scene().hit_test(to_logical(pos)));
        let (default_cursor, hover_cursor) = self.session.mode().cursors();
        ui.ctx()
            .set_cursor_icon(if hovered.is_some() { hover_cursor } else { default_cursor });

        paint_scene(&painter, &self.session, &viewport, canvas);
    }

    fn handle_pointer(&mut self, response: &egui::Response, viewport: &Viewport, canvas: Rect) {
        let to_logical = |pos: Pos2| viewport.screen_to_logical((pos - canvas.min).to_pos2());

        if response.drag_started() {
            self.dragging = None;
            if let Some(pos) = response.interact_pointer_pos() {
                self.dragging = match self.crop_corner_at(pos, viewport, canvas) {
                    Some(anchor) => Some(Drag::CropCorner { anchor }),
                    None => self.session.select_at(to_logical(pos)).map(Drag::Object),
                };
            }
        }

        if response.dragged() {
            match self.dragging {
                Some(Drag::CropCorner { anchor }) => {
                    if let Some(pos) = response.interact_pointer_pos() {
                        let _ = self.session.drag_crop_corner(anchor, to_logical(pos));
                    }
                }
                Some(Drag::Object(id)) => {
                    let delta = response.drag_delta() / viewport.scale();
                    let overlay = self.session.crop().and_then(|crop| crop.overlay());
                    if overlay == Some(id) {
                        if let Some(geometry) = self.session.scene().object(id).map(|o| o.geometry) {
                            let _ = self
                                .session
                                .move_crop(geometry.left + delta.x, geometry.top + delta.y);
                        }
                    } else {
                        self.session.move_object(id, delta);
                    }
                }
                None => {}
            }
        }

        if response.drag_stopped() {
            self.dragging = None;
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.session.select_at(to_logical(pos));
            }
        }
    }

    /// Opposite corner of the crop overlay handle under `pos`, if any
    fn crop_corner_at(&self, pos: Pos2, viewport: &Viewport, canvas: Rect) -> Option<Pos2> {
        let rect = self.session.crop()?.overlay_rect(self.session.scene())?;
        let corners = [
            rect.left_top(),
            rect.right_top(),
            rect.right_bottom(),
            rect.left_bottom(),
        ];
        let grabbed = corners
            .iter()
            .position(|corner| to_screen(viewport, canvas, *corner).distance(pos) <= HANDLE_RADIUS * 2.0)?;
        Some(corners[(grabbed + 2) % corners.len()])
    }

    fn show_notices(&mut self, ctx: &egui::Context) {
        let now = ctx.input(|i| i.time);
        self.notices.extend(
            self.session
                .take_notices()
                .into_iter()
                .map(|notice| (notice, now + NOTICE_SECONDS)),
        );
        self.notices.retain(|(_, expires)| *expires > now);
        if self.notices.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("notices"))
            .anchor(Align2::RIGHT_BOTTOM, Vec2::new(-12.0, -12.0))
            .show(ctx, |ui| {
                for (notice, _) in &self.notices {
                    let color = match notice.level {
                        NoticeLevel::Info => ui.visuals().text_color(),
                        NoticeLevel::Success => Color32::from_rgb(76, 175, 80),
                        NoticeLevel::Error => ui.visuals().error_fg_color,
                    };
                    ui.colored_label(color, &notice.message);
                }
            });
        ctx.request_repaint_after(Duration::from_millis(500));
    }
}

impl eframe::App for PhotoEditorApp {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));
        egui::SidePanel::right("tool_panel")
            .default_width(220.0)
            .show(ctx, |ui| self.tool_panel(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.canvas(ui));

        let _ = block_on(self.session.tick());
        if self.session.synchronizer().has_pending() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
        self.show_notices(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        let _ = block_on(self.session.flush());
        self.session.close();
    }
}

fn color(hex: Option<&str>) -> Option<Color32> {
    hex.and_then(|hex| Color32::from_hex(hex).ok())
}

fn to_screen(viewport: &Viewport, canvas: Rect, pos: Pos2) -> Pos2 {
    canvas.min + viewport.logical_to_screen(pos).to_vec2()
}

fn paint_scene(painter: &egui::Painter, session: &EditorSession, viewport: &Viewport, canvas: Rect) {
    let scene = session.scene();
    let painter = painter.with_clip_rect(canvas);

    let background = scene.background();
    painter.rect_filled(
        canvas,
        0.0,
        color(background.color.as_deref()).unwrap_or(Color32::TRANSPARENT),
    );
    if let Some(image) = &background.image {
        let size = Vec2::new(image.natural_width as f32, image.natural_height as f32)
            * image.geometry.scale_x;
        let center = Pos2::new(image.geometry.left, image.geometry.top);
        let rect = Rect::from_center_size(to_screen(viewport, canvas, center), size * viewport.scale());
        painter.rect_filled(rect, 0.0, IMAGE_PLACEHOLDER.gamma_multiply(0.5));
    }

    for object in scene.objects() {
        paint_object(&painter, object, viewport, canvas);
    }

    if let Some(active) = scene.active_object() {
        let corners: Vec<Pos2> = active
            .corners()
            .iter()
            .map(|corner| to_screen(viewport, canvas, *corner))
            .collect();
        painter.add(Shape::closed_line(corners.clone(), Stroke::new(1.0, SELECTION_COLOR)));
        for corner in corners {
            painter.circle_filled(corner, HANDLE_RADIUS, SELECTION_COLOR);
        }
    }
}

fn paint_object(painter: &egui::Painter, object: &VisualObject, viewport: &Viewport, canvas: Rect) {
    let corners: Vec<Pos2> = object
        .corners()
        .iter()
        .map(|corner| to_screen(viewport, canvas, *corner))
        .collect();

    match &object.kind {
        ObjectKind::Image(image) => {
            painter.add(Shape::convex_polygon(
                corners,
                IMAGE_PLACEHOLDER,
                Stroke::new(1.0, Color32::from_gray(100)),
            ));
            let name = image.src.rsplit('/').next().unwrap_or(image.src.as_str());
            painter.text(
                to_screen(viewport, canvas, object.center()),
                Align2::CENTER_CENTER,
                name,
                FontId::proportional(12.0),
                Color32::from_gray(60),
            );
        }
        ObjectKind::Shape(shape) => {
            if let Some(fill) = color(shape.fill.as_deref()) {
                painter.add(Shape::convex_polygon(corners.clone(), fill, Stroke::NONE));
            }
            if let Some(stroke) = &shape.stroke {
                let line = Stroke::new(
                    stroke.width,
                    color(Some(&stroke.color)).unwrap_or(SELECTION_COLOR),
                );
                let mut outline = corners.clone();
                if let Some(first) = corners.first() {
                    outline.push(*first);
                }
                match stroke.dash.as_slice() {
                    [dash, gap, ..] => painter.extend(Shape::dashed_line(&outline, line, *dash, *gap)),
                    _ => {
                        painter.add(Shape::line(outline, line));
                    }
                }
            }
            if shape.crop_overlay {
                for corner in corners {
                    painter.circle_filled(corner, HANDLE_RADIUS, Color32::WHITE);
                }
            }
        }
        ObjectKind::Text(text) => {
            let size = text.style.font_size * object.geometry.scale_y.abs() * viewport.scale();
            painter.text(
                to_screen(viewport, canvas, object.center()),
                Align2::CENTER_CENTER,
                &text.content,
                FontId::proportional(size.max(1.0)),
                color(Some(&text.style.color)).unwrap_or(Color32::WHITE),
            );
        }
    }
}
