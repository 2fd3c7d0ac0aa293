use egui::Color32;

use crate::frame::PALETTE;

/// Compiled-in defaults for the preview.
#[derive(Clone, Debug)]
pub struct PreviewSettings {
    /// Distance prefilled when the first calibration segment is drawn.
    pub default_distance_cm: f64,
    pub default_frame_size_cm: (f64, f64),
    pub default_frame_color: Color32,
    pub palette: [Color32; 4],
    /// Frame moulding thickness in screen points, drawn outside the picture area.
    pub frame_border: f32,
    /// Never show the room photo larger than its natural size times this.
    pub max_display_scale: f32,
    /// Image loaded at startup: a file path natively, a URL on the web.
    pub startup_image: Option<String>,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            default_distance_cm: 100.0,
            default_frame_size_cm: (50.0, 70.0),
            default_frame_color: PALETTE[0],
            palette: PALETTE,
            frame_border: 8.0,
            max_display_scale: 1.0,
            startup_image: None,
        }
    }
}

impl PreviewSettings {
    pub fn with_startup_image(mut self, source: impl Into<String>) -> Self {
        self.startup_image = Some(source.into());
        self
    }
}
