use egui::{
    Align2, Button, Color32, Context, CursorIcon, FontId, Pos2, Rect, RichText, Sense, Shape,
    Stroke, Vec2,
};
use std::future::Future;
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::config::PreviewSettings;
use crate::frame::{format_cm, format_hex_color, parse_hex_color, FrameId};
use crate::geometry::{from_pos2, to_pos2, CalibrationData, Point};
use crate::state::{AppState, AppStep, RoomImage};
use crate::widgets::{swatch, CentimeterDragValue};

const ACCENT: Color32 = Color32::from_rgb(59, 130, 246);
const PENDING: Color32 = Color32::from_rgb(239, 68, 68);

/// Inputs of the "add frame" form, kept between frames.
struct NewFrameForm {
    width_cm: f64,
    height_cm: f64,
    color: Color32,
    hex: String,
}

impl NewFrameForm {
    fn new(settings: &PreviewSettings) -> Self {
        let (width_cm, height_cm) = settings.default_frame_size_cm;
        Self {
            width_cm,
            height_cm,
            color: settings.default_frame_color,
            hex: format_hex_color(settings.default_frame_color),
        }
    }

    fn set_color(&mut self, color: Color32) {
        self.color = color;
        self.hex = format_hex_color(color);
    }
}

pub struct FramePreviewApp {
    img_channel: (Sender<Vec<u8>>, Receiver<Vec<u8>>),
    state: AppState,
    form: NewFrameForm,
    /// Central panel rectangle from the last layout; new frames start at its center.
    canvas_rect: Rect,
    alert: Option<String>,
}

impl FramePreviewApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>, settings: PreviewSettings) -> Self {
        let app = Self::with_settings(settings);
        let sender = app.img_channel.0.clone();

        if let Some(source) = app.state.settings().startup_image.clone() {
            load_startup_image(source, sender, cc.egui_ctx.clone());
        }

        app
    }

    fn with_settings(settings: PreviewSettings) -> Self {
        Self {
            img_channel: channel(),
            form: NewFrameForm::new(&settings),
            state: AppState::new(settings),
            canvas_rect: Rect::NOTHING,
            alert: None,
        }
    }

    fn open_file_dialog(&self, ctx: &Context) {
        let sender = self.img_channel.0.clone();
        let task = rfd::AsyncFileDialog::new()
            .add_filter("Image", &["png", "jpg", "jpeg", "gif", "bmp", "webp"])
            .pick_file();
        let ctx = ctx.clone();
        execute(async move {
            if let Some(file) = task.await {
                let image_data = file.read().await;
                let _ = sender.send(image_data);
                ctx.request_repaint();
            }
        });
    }

    fn receive_images(&mut self, ctx: &Context) {
        while let Ok(image_data) = self.img_channel.1.try_recv() {
            match RoomImage::decode(&image_data) {
                Ok(image) => self.state.load_image(image),
                Err(err) => log::warn!("Ignoring image: {err:#}"),
            }
        }

        let dropped = ctx.input(|i| i.raw.dropped_files.first().cloned());
        if let Some(file) = dropped {
            let bytes = match (file.bytes, file.path) {
                (Some(bytes), _) => Some(bytes.to_vec()),
                (None, Some(path)) => read_dropped_file(&path),
                (None, None) => None,
            };
            if let Some(bytes) = bytes {
                let _ = self.img_channel.0.send(bytes);
            }
            ctx.request_repaint();
        }
    }

    /// Drag tracking is window-wide: moves outside the frame and outside the
    /// canvas still move it, and release or focus loss always end it.
    fn track_drag(&mut self, ctx: &Context) {
        if self.state.drag().is_none() {
            return;
        }
        let (pos, released, focused) = ctx.input(|i| {
            (
                i.pointer.latest_pos(),
                i.pointer.primary_released() || !i.pointer.primary_down(),
                i.focused,
            )
        });
        if !focused {
            self.state.cancel_drag();
            return;
        }
        if let Some(pos) = pos {
            self.state.pointer_moved(from_pos2(pos));
        }
        if released {
            self.state.pointer_released();
        }
    }

    fn sidebar(&mut self, ui: &mut egui::Ui) {
        self.step_list(ui);
        ui.separator();

        match self.state.step() {
            AppStep::Upload => {
                ui.label("Open a photo of the wall you want to decorate.");
                if ui.button("📂 Open image file").clicked() {
                    self.open_file_dialog(ui.ctx());
                }
            }
            AppStep::Calibrate => self.calibration_controls(ui),
            AppStep::Visualize => self.frame_controls(ui),
        }
    }

    fn step_list(&mut self, ui: &mut egui::Ui) {
        for step in AppStep::ALL {
            let current = self.state.step() == step;
            let clickable = self.state.can_navigate_to(step);
            let mut text = RichText::new(format!("{}  {}", step.number(), step));
            if current {
                text = text.strong().color(ACCENT);
            } else if !clickable {
                text = text.weak();
            }

            let response = ui.selectable_label(current, text);
            let response = match step {
                AppStep::Upload if clickable => response.on_hover_text("Start over"),
                AppStep::Calibrate if clickable => response.on_hover_text("Recalibrate"),
                _ => response,
            };
            if clickable && response.clicked() {
                self.state.go_to_step(step);
            }
        }
    }

    fn calibration_controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Known distance");
        ui.label("1. Click both ends of an object in the photo.");
        ui.label("2. Enter its real length below.");

        let mut distance = self
            .state
            .calibration()
            .map(|c| c.real_distance_cm)
            .unwrap_or(self.state.settings().default_distance_cm);
        if CentimeterDragValue::new(&mut distance)
            .speed(0.5)
            .ui(ui)
            .changed()
        {
            self.state.set_real_distance(distance);
        }

        if let Some(calibration) = self.state.calibration() {
            if calibration.pixel_distance() > 0.0 {
                ui.label(format!("Segment: {:.1} px", calibration.pixel_distance()));
            }
        }

        let valid = self.state.calibration().is_some_and(CalibrationData::is_valid);
        if ui
            .add_enabled(valid, Button::new("✔ Apply calibration"))
            .clicked()
        {
            if let Err(err) = self.state.submit_calibration() {
                self.alert = Some(format!(
                    "Select two points and enter a positive length ({err})."
                ));
            }
        }

        ui.add_space(8.0);
        if ui.small_button("⬅ Back to photo upload").clicked() {
            self.state.reset();
        }
    }

    fn frame_controls(&mut self, ui: &mut egui::Ui) {
        if let Some(ratio) = self.state.ratio() {
            ui.label(format!("Scale: 1 px = {:.3} cm", ratio.cm_per_px()));
        }

        ui.heading("New frame");
        egui::Grid::new("new_frame")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label("Width");
                CentimeterDragValue::new(&mut self.form.width_cm).ui(ui);
                ui.end_row();

                ui.label("Height");
                CentimeterDragValue::new(&mut self.form.height_cm).ui(ui);
                ui.end_row();
            });

        ui.label("Frame color");
        ui.horizontal(|ui| {
            for color in self.state.settings().palette {
                if swatch(ui, color, self.form.color == color).clicked() {
                    self.form.set_color(color);
                }
            }
            let mut picked = self.form.color;
            if ui.color_edit_button_srgba(&mut picked).changed() {
                self.form.set_color(picked);
            }
            let hex = ui.add(egui::TextEdit::singleline(&mut self.form.hex).desired_width(64.0));
            if hex.lost_focus() {
                match parse_hex_color(&self.form.hex) {
                    Ok(color) => self.form.set_color(color),
                    Err(err) => {
                        log::warn!("{err}");
                        self.form.hex = format_hex_color(self.form.color);
                    }
                }
            }
        });

        if ui.button("➕ Place frame").clicked() {
            let anchor = if self.canvas_rect.is_positive() {
                self.canvas_rect.center()
            } else {
                Pos2::new(400.0, 300.0)
            };
            if let Err(err) = self.state.add_frame(
                self.form.width_cm,
                self.form.height_cm,
                self.form.color,
                from_pos2(anchor),
            ) {
                self.alert = Some(err.to_string());
            }
        }

        ui.separator();
        ui.horizontal(|ui| {
            ui.heading("Placed frames");
            ui.label(format!("({})", self.state.frames().len()));
        });

        let mut select: Option<FrameId> = None;
        let mut remove: Option<FrameId> = None;
        if self.state.frames().is_empty() {
            ui.label(RichText::new("No frames yet.").italics().weak());
        }
        for frame in self.state.frames().iter() {
            let active = self.state.frames().active() == Some(frame.id);
            ui.horizontal(|ui| {
                let (swatch_rect, _) = ui.allocate_exact_size(Vec2::splat(12.0), Sense::hover());
                ui.painter().rect_filled(swatch_rect, 2.0, frame.color);
                if ui.selectable_label(active, frame.label()).clicked() {
                    select = Some(frame.id);
                }
                if ui.small_button("🗑").on_hover_text("Remove").clicked() {
                    remove = Some(frame.id);
                }
            });
        }
        if let Some(id) = select {
            let _ = self.state.select_frame(id);
        }
        if let Some(id) = remove {
            self.state.remove_frame(id);
        }

        ui.separator();
        if ui.button("↩ Recalibrate (step 2)").clicked() {
            self.state.go_to_step(AppStep::Calibrate);
        }
        if ui.button("📂 Upload a new photo (step 1)").clicked() {
            self.state.reset();
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        self.canvas_rect = ui.max_rect();
        let ctx = ui.ctx().clone();

        if self.state.image().is_none() {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() / 3.0);
                ui.heading("Upload a photo of your room");
                ui.label("A piece of furniture or a wall of known size is needed as a reference.");
                if ui.button("📂 Choose photo").clicked() {
                    self.open_file_dialog(&ctx);
                }
            });
            return;
        }
        let Some(image) = self.state.image_mut() else {
            return;
        };

        let texture_id = image.texture(&ctx).id();
        let image_size = image.size();

        // Fit the photo into the panel, never enlarging past the configured scale.
        let available = ui.available_rect_before_wrap();
        let scale = (available.width() / image_size.x)
            .min(available.height() / image_size.y)
            .min(self.state.settings().max_display_scale);
        let image_rect = Rect::from_center_size(available.center(), image_size * scale);
        self.state.set_display_scale(scale);

        let response = ui.interact(image_rect, ui.id().with("room_photo"), Sense::click());
        let painter = ui.painter_at(self.canvas_rect);
        painter.image(
            texture_id,
            image_rect,
            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
            Color32::WHITE,
        );

        let to_image = |pos: Pos2| from_pos2(Pos2::ZERO + (pos - image_rect.min) / scale);
        let to_screen = |p: Point| image_rect.min + to_pos2(p).to_vec2() * scale;

        match self.state.step() {
            AppStep::Calibrate => {
                if let Some(pos) = response.hover_pos() {
                    self.state.calibration_hover(to_image(pos));
                    ctx.set_cursor_icon(CursorIcon::Crosshair);
                }
                if response.clicked() {
                    if let Some(pos) = response.interact_pointer_pos() {
                        self.state.calibration_click(to_image(pos));
                    }
                }
                if let Some(calibration) = self.state.calibration() {
                    let placing = self.state.calibration_tool().is_placing_second_point();
                    draw_calibration(&painter, calibration, placing, to_screen);
                }
            }
            AppStep::Visualize => self.frames_layer(ui, &painter),
            AppStep::Upload => {}
        }

        draw_instructions(&painter, self.canvas_rect, self.instruction());
    }

    fn frames_layer(&mut self, ui: &egui::Ui, painter: &egui::Painter) {
        let pointer_in_canvas = ui.rect_contains_pointer(self.canvas_rect);
        let pressed = ui.input(|i| {
            i.pointer
                .primary_pressed()
                .then(|| i.pointer.interact_pos())
                .flatten()
        });
        if let (Some(pos), true) = (pressed, pointer_in_canvas) {
            self.state.frame_pointer_down(from_pos2(pos));
        }

        let border = self.state.settings().frame_border;
        let active = self.state.frames().active();
        for frame in self.state.frames().in_stacking_order() {
            let Some(rect) = self.state.frame_screen_rect(frame) else {
                continue;
            };
            let outer = rect.expand(border);

            painter.rect_filled(
                outer.translate(Vec2::new(0.0, 6.0)).expand(2.0),
                2.0,
                Color32::from_black_alpha(50),
            );
            painter.rect_filled(outer, 0.0, frame.color);
            painter.rect_filled(rect, 0.0, Color32::WHITE);
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                frame.label(),
                FontId::proportional(10.0),
                Color32::from_gray(190),
            );
            if active == Some(frame.id) {
                painter.rect_stroke(outer.expand(6.0), 2.0, Stroke::new(3.0, ACCENT));
            }
        }

        if self.state.drag().is_some() {
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        } else if let (Some(pos), Some(ratio)) = (ui.ctx().pointer_hover_pos(), self.state.ratio()) {
            let hovered = self.state.frames().frame_at(
                from_pos2(pos),
                ratio,
                self.state.display_scale(),
                border,
            );
            if hovered.is_some() && pointer_in_canvas {
                ui.ctx().set_cursor_icon(CursorIcon::Grab);
            }
        }
    }

    fn instruction(&self) -> Option<&'static str> {
        match self.state.step() {
            AppStep::Upload => None,
            AppStep::Calibrate if self.state.calibration_tool().is_placing_second_point() => {
                Some("Click the end point (B) to fix the length")
            }
            AppStep::Calibrate => Some("Click the start point (A)"),
            AppStep::Visualize => Some("Drag frames where you want them"),
        }
    }

    fn alert_window(&mut self, ctx: &Context) {
        let Some(message) = self.alert.clone() else {
            return;
        };
        let mut close = false;
        egui::Window::new("Check your input")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    close = true;
                }
            });
        if close {
            self.alert = None;
        }
    }
}

impl eframe::App for FramePreviewApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.receive_images(ctx);
        self.track_drag(ctx);

        egui::SidePanel::left("controls")
            .resizable(false)
            .exact_width(280.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.sidebar(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| self.canvas(ui));

        self.alert_window(ctx);
    }
}

fn draw_calibration(
    painter: &egui::Painter,
    calibration: &CalibrationData,
    placing: bool,
    to_screen: impl Fn(Point) -> Pos2,
) {
    let a = to_screen(calibration.p1);
    let b = to_screen(calibration.p2);
    let stroke = Stroke::new(3.0, ACCENT);

    if placing {
        painter.extend(Shape::dashed_line(&[a, b], stroke, 6.0, 4.0));
    } else {
        painter.line_segment([a, b], stroke);
    }
    painter.circle(a, 6.0, ACCENT, Stroke::new(2.0, Color32::WHITE));
    painter.circle(
        b,
        6.0,
        if placing { PENDING } else { ACCENT },
        Stroke::new(2.0, Color32::WHITE),
    );

    if !placing && calibration.pixel_distance() > 0.0 {
        let galley = painter.layout_no_wrap(
            format!("{} cm", format_cm(calibration.real_distance_cm)),
            FontId::proportional(12.0),
            Color32::WHITE,
        );
        let center = to_screen(calibration.midpoint()) - Vec2::new(0.0, 14.0);
        let pill = Rect::from_center_size(center, galley.size() + Vec2::new(16.0, 6.0));
        painter.rect_filled(pill, 12.0, ACCENT.gamma_multiply(0.9));
        painter.galley(pill.center() - galley.size() / 2.0, galley, Color32::WHITE);
    }
}

fn draw_instructions(painter: &egui::Painter, canvas: Rect, text: Option<&str>) {
    let Some(text) = text else {
        return;
    };
    let galley = painter.layout_no_wrap(
        text.to_owned(),
        FontId::proportional(13.0),
        Color32::from_gray(70),
    );
    let size = galley.size() + Vec2::new(24.0, 12.0);
    let pill = Rect::from_min_size(
        canvas.right_top() + Vec2::new(-16.0 - size.x, 16.0),
        size,
    );
    painter.rect_filled(pill, size.y / 2.0, Color32::from_white_alpha(230));
    painter.galley(
        pill.center() - galley.size() / 2.0,
        galley,
        Color32::from_gray(70),
    );
}

#[cfg(not(target_arch = "wasm32"))]
fn read_dropped_file(path: &std::path::Path) -> Option<Vec<u8>> {
    std::fs::read(path)
        .map_err(|err| log::warn!("Cannot read {}: {err}", path.display()))
        .ok()
}

#[cfg(target_arch = "wasm32")]
fn read_dropped_file(_path: &std::path::Path) -> Option<Vec<u8>> {
    None
}

#[cfg(not(target_arch = "wasm32"))]
fn load_startup_image(path: String, sender: Sender<Vec<u8>>, _ctx: Context) {
    match std::fs::read(&path) {
        Ok(image_data) => {
            let _ = sender.send(image_data);
        }
        Err(err) => log::warn!("Cannot read startup image {path}: {err}"),
    }
}

#[cfg(target_arch = "wasm32")]
fn load_startup_image(url: String, sender: Sender<Vec<u8>>, ctx: Context) {
    wasm_bindgen_futures::spawn_local(async move {
        let request = ehttp::Request::get(&url);
        match ehttp::fetch_async(request).await {
            Ok(response) if response.ok => {
                let _ = sender.send(response.bytes);
                ctx.request_repaint();
            }
            Ok(response) => log::warn!("Startup image {url}: HTTP {}", response.status),
            Err(err) => log::warn!("Startup image {url}: {err}"),
        }
    });
}

#[cfg(not(target_arch = "wasm32"))]
fn execute<F: Future<Output = ()> + Send + 'static>(f: F) {
    std::thread::spawn(move || futures::executor::block_on(f));
}

#[cfg(target_arch = "wasm32")]
fn execute<F: Future<Output = ()> + 'static>(f: F) {
    wasm_bindgen_futures::spawn_local(f);
}
