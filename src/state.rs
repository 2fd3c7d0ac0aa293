use anyhow::Context as _;
use egui::{ColorImage, Context, Rect, TextureHandle, TextureOptions, Vec2};
use std::fmt;

use crate::config::PreviewSettings;
use crate::error::{CalibrationError, FrameError};
use crate::frame::{FrameConfig, FrameId, FrameList};
use crate::geometry::{CalibrationData, Point, Ratio};
use crate::interaction::{CalibrationTool, FrameDrag};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum AppStep {
    Upload,
    Calibrate,
    Visualize,
}

impl AppStep {
    pub const ALL: [AppStep; 3] = [AppStep::Upload, AppStep::Calibrate, AppStep::Visualize];

    pub fn number(&self) -> usize {
        match self {
            AppStep::Upload => 1,
            AppStep::Calibrate => 2,
            AppStep::Visualize => 3,
        }
    }
}

impl fmt::Display for AppStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppStep::Upload => write!(f, "Upload photo"),
            AppStep::Calibrate => write!(f, "Calibrate scale"),
            AppStep::Visualize => write!(f, "Place frames"),
        }
    }
}

/// The decoded room photo and, once shown, its GPU texture.
pub struct RoomImage {
    pixels: image::RgbaImage,
    texture: Option<TextureHandle>,
}

impl RoomImage {
    pub fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        let image = image::load_from_memory(bytes).context("failed to decode room photo")?;
        Ok(Self::from_rgba(image.to_rgba8()))
    }

    pub fn from_rgba(pixels: image::RgbaImage) -> Self {
        Self {
            pixels,
            texture: None,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.pixels.width() as f32, self.pixels.height() as f32)
    }

    pub fn texture(&mut self, ctx: &Context) -> &TextureHandle {
        self.texture.get_or_insert_with(|| {
            let size = [self.pixels.width() as _, self.pixels.height() as _];
            let color_image = ColorImage::from_rgba_unmultiplied(size, self.pixels.as_raw());
            ctx.load_texture("room_photo", color_image, TextureOptions::LINEAR)
        })
    }
}

/// Everything the wizard knows. All mutation goes through the methods here.
pub struct AppState {
    step: AppStep,
    image: Option<RoomImage>,
    calibration: Option<CalibrationData>,
    ratio: Option<Ratio>,
    frames: FrameList,
    tool: CalibrationTool,
    drag: Option<FrameDrag>,
    /// Screen points per image pixel of the photo as currently laid out.
    display_scale: f32,
    settings: PreviewSettings,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(PreviewSettings::default())
    }
}

impl AppState {
    pub fn new(settings: PreviewSettings) -> Self {
        Self {
            step: AppStep::Upload,
            image: None,
            calibration: None,
            ratio: None,
            frames: FrameList::new(),
            tool: CalibrationTool::default(),
            drag: None,
            display_scale: 1.0,
            settings,
        }
    }

    pub fn step(&self) -> AppStep {
        self.step
    }

    pub fn image(&self) -> Option<&RoomImage> {
        self.image.as_ref()
    }

    pub fn image_mut(&mut self) -> Option<&mut RoomImage> {
        self.image.as_mut()
    }

    pub fn calibration(&self) -> Option<&CalibrationData> {
        self.calibration.as_ref()
    }

    pub fn ratio(&self) -> Option<Ratio> {
        self.ratio
    }

    pub fn frames(&self) -> &FrameList {
        &self.frames
    }

    pub fn calibration_tool(&self) -> &CalibrationTool {
        &self.tool
    }

    pub fn drag(&self) -> Option<&FrameDrag> {
        self.drag.as_ref()
    }

    pub fn settings(&self) -> &PreviewSettings {
        &self.settings
    }

    pub fn display_scale(&self) -> f32 {
        self.display_scale
    }

    pub fn set_display_scale(&mut self, scale: f32) {
        if scale.is_finite() && scale > 0.0 {
            self.display_scale = scale;
        }
    }

    /// Replaces the photo and discards everything derived from the old one.
    pub fn load_image(&mut self, image: RoomImage) {
        let size = image.size();
        log::info!("Loaded room photo {}x{}", size.x, size.y);
        self.image = Some(image);
        self.clear_derived();
        self.step = AppStep::Calibrate;
    }

    pub fn reset(&mut self) {
        log::info!("Reset to {}", AppStep::Upload);
        self.image = None;
        self.clear_derived();
        self.step = AppStep::Upload;
    }

    fn clear_derived(&mut self) {
        self.calibration = None;
        self.ratio = None;
        self.frames.clear();
        self.tool.reset();
        self.drag = None;
    }

    /// Wizard navigation from the step list. Going back to upload starts over,
    /// going back to calibration keeps frames and ratio for recalibration.
    pub fn go_to_step(&mut self, target: AppStep) -> bool {
        if !self.can_navigate_to(target) {
            return false;
        }
        match target {
            AppStep::Upload => self.reset(),
            AppStep::Calibrate => {
                log::info!("Back to {}", AppStep::Calibrate);
                self.drag = None;
                self.tool.reset();
                self.step = AppStep::Calibrate;
            }
            AppStep::Visualize => return false,
        }
        true
    }

    pub fn can_navigate_to(&self, target: AppStep) -> bool {
        match target {
            AppStep::Upload => self.step != AppStep::Upload,
            AppStep::Calibrate => self.step == AppStep::Visualize,
            AppStep::Visualize => false,
        }
    }

    pub fn set_calibration(&mut self, calibration: CalibrationData) {
        self.calibration = Some(calibration);
    }

    /// Edits the known length. Without a segment yet, one is created at the
    /// origin so the value is kept for the first click.
    pub fn set_real_distance(&mut self, cm: f64) {
        match self.calibration.as_mut() {
            Some(calibration) => calibration.real_distance_cm = cm,
            None => {
                self.calibration = Some(CalibrationData::starting_at(Point::origin(), cm));
            }
        }
        log::debug!("Calibration distance set to {cm} cm");
    }

    /// Click on the photo at `point` (image pixels). Ignored outside calibration.
    pub fn calibration_click(&mut self, point: Point) {
        if self.step != AppStep::Calibrate || self.drag.is_some() {
            return;
        }
        let default_distance = self.settings.default_distance_cm;
        self.tool
            .click(point, &mut self.calibration, default_distance);
        log::debug!("Calibration click at ({:.1}, {:.1})", point.x, point.y);
    }

    pub fn calibration_hover(&mut self, point: Point) {
        if self.step != AppStep::Calibrate {
            return;
        }
        self.tool.hover(point, &mut self.calibration);
    }

    /// Derives the ratio from the current segment and moves on to placing
    /// frames. On error nothing changes.
    pub fn submit_calibration(&mut self) -> Result<Ratio, CalibrationError> {
        let calibration = self.calibration.ok_or(CalibrationError::NoSegment)?;
        let ratio = Ratio::from_calibration(&calibration).map_err(|e| {
            log::warn!("Calibration rejected: {e}");
            e
        })?;
        log::info!(
            "Calibrated {:.1} px = {} cm ({:.4} cm/px)",
            calibration.pixel_distance(),
            calibration.real_distance_cm,
            ratio.cm_per_px()
        );
        self.ratio = Some(ratio);
        self.tool.reset();
        self.step = AppStep::Visualize;
        Ok(ratio)
    }

    pub fn add_frame(
        &mut self,
        width_cm: f64,
        height_cm: f64,
        color: egui::Color32,
        anchor: Point,
    ) -> Result<FrameId, FrameError> {
        let id = self
            .frames
            .add(width_cm, height_cm, color, anchor)
            .map_err(|e| {
                log::warn!("Frame rejected: {e}");
                e
            })?;
        log::debug!("Added frame {id} ({width_cm} x {height_cm} cm)");
        Ok(id)
    }

    pub fn move_frame(&mut self, id: FrameId, position: Point) -> Result<(), FrameError> {
        self.frames.move_to(id, position)
    }

    pub fn remove_frame(&mut self, id: FrameId) -> Option<FrameConfig> {
        if self.drag.map(|d| d.target) == Some(id) {
            self.drag = None;
        }
        let removed = self.frames.remove(id);
        if removed.is_some() {
            log::debug!("Removed frame {id}");
        }
        removed
    }

    pub fn select_frame(&mut self, id: FrameId) -> Result<(), FrameError> {
        self.frames.select(id)
    }

    /// On-screen picture rectangle of `frame`, derived from the current ratio.
    pub fn frame_screen_rect(&self, frame: &FrameConfig) -> Option<Rect> {
        self.ratio
            .map(|ratio| frame.screen_rect(ratio, self.display_scale))
    }

    /// Pointer pressed at `pointer` (viewport coordinates). Starts dragging the
    /// top-most frame under it, if any.
    pub fn frame_pointer_down(&mut self, pointer: Point) -> Option<FrameId> {
        if self.step != AppStep::Visualize {
            return None;
        }
        let ratio = self.ratio?;
        let id = self.frames.frame_at(
            pointer,
            ratio,
            self.display_scale,
            self.settings.frame_border,
        )?;
        self.frame_pointer_down_on(id, pointer).ok()?;
        Some(id)
    }

    /// Starts dragging frame `id` grabbed at `pointer`. Only allowed while
    /// placing frames.
    pub fn frame_pointer_down_on(&mut self, id: FrameId, pointer: Point) -> Result<(), FrameError> {
        if self.step != AppStep::Visualize {
            return Err(FrameError::NotPlacingFrames);
        }
        let anchor = self
            .frames
            .get(id)
            .ok_or(FrameError::UnknownFrame(id))?
            .position;
        self.frames.select(id)?;
        self.drag = Some(FrameDrag::begin(id, pointer, anchor));
        Ok(())
    }

    /// Pointer moved anywhere in the window. Only a live drag reacts.
    pub fn pointer_moved(&mut self, pointer: Point) {
        let Some(drag) = self.drag else {
            return;
        };
        if self.move_frame(drag.target, drag.anchor_for(pointer)).is_err() {
            self.drag = None;
        }
    }

    pub fn pointer_released(&mut self) {
        self.drag = None;
    }

    /// Ends a drag without a pointer-up, e.g. when the window loses focus.
    pub fn cancel_drag(&mut self) {
        if self.drag.take().is_some() {
            log::debug!("Drag cancelled");
        }
    }
}
