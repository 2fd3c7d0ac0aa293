use egui::{Color32, Rect};
use std::fmt;

use crate::error::FrameError;
use crate::geometry::{to_pos2, Point, Ratio};

/// The four preset frame colors offered next to the free color picker.
pub const PALETTE: [Color32; 4] = [
    Color32::from_rgb(0x22, 0x22, 0x22),
    Color32::from_rgb(0xF8, 0xF8, 0xF8),
    Color32::from_rgb(0x8B, 0x45, 0x13),
    Color32::from_rgb(0xFF, 0xD7, 0x00),
];

/// Identifier of a placed frame. Issued by a [`FrameList`] from a counter that
/// is never rewound, so ids are unique for the lifetime of the list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameConfig {
    pub id: FrameId,
    pub width_cm: f64,
    pub height_cm: f64,
    pub color: Color32,
    /// Center of the frame in viewport coordinates.
    pub position: Point,
}

impl FrameConfig {
    /// Inner (picture) rectangle on screen. Recomputed from `ratio` on every
    /// call so a new calibration rescales every frame.
    pub fn screen_rect(&self, ratio: Ratio, display_scale: f32) -> Rect {
        let size = ratio.size_px(self.width_cm, self.height_cm) * display_scale;
        Rect::from_center_size(to_pos2(self.position), size)
    }

    pub fn label(&self) -> String {
        format!("{} x {} cm", format_cm(self.width_cm), format_cm(self.height_cm))
    }
}

#[derive(Clone, Debug, Default)]
pub struct FrameList {
    frames: Vec<FrameConfig>,
    active: Option<FrameId>,
    next_id: u64,
}

impl FrameList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a frame centered on `position` and makes it the active frame.
    pub fn add(
        &mut self,
        width_cm: f64,
        height_cm: f64,
        color: Color32,
        position: Point,
    ) -> Result<FrameId, FrameError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width_cm) || !valid(height_cm) {
            return Err(FrameError::InvalidDimensions {
                width_cm,
                height_cm,
            });
        }

        let id = FrameId(self.next_id);
        self.next_id += 1;
        self.frames.push(FrameConfig {
            id,
            width_cm,
            height_cm,
            color,
            position,
        });
        self.active = Some(id);
        Ok(id)
    }

    pub fn get(&self, id: FrameId) -> Option<&FrameConfig> {
        self.frames.iter().find(|f| f.id == id)
    }

    pub fn move_to(&mut self, id: FrameId, position: Point) -> Result<(), FrameError> {
        let frame = self
            .frames
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(FrameError::UnknownFrame(id))?;
        frame.position = position;
        Ok(())
    }

    pub fn remove(&mut self, id: FrameId) -> Option<FrameConfig> {
        let index = self.frames.iter().position(|f| f.id == id)?;
        if self.active == Some(id) {
            self.active = None;
        }
        Some(self.frames.remove(index))
    }

    pub fn select(&mut self, id: FrameId) -> Result<(), FrameError> {
        if self.get(id).is_none() {
            return Err(FrameError::UnknownFrame(id));
        }
        self.active = Some(id);
        Ok(())
    }

    pub fn active(&self) -> Option<FrameId> {
        self.active
    }

    /// Removes every frame. The id counter keeps running.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.active = None;
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames in insertion order, as listed in the side panel.
    pub fn iter(&self) -> impl Iterator<Item = &FrameConfig> {
        self.frames.iter()
    }

    /// Frames bottom to top: insertion order with the active frame raised last.
    pub fn in_stacking_order(&self) -> impl Iterator<Item = &FrameConfig> {
        let active = self.active;
        self.frames
            .iter()
            .filter(move |f| Some(f.id) != active)
            .chain(self.frames.iter().filter(move |f| Some(f.id) == active))
    }

    /// Top-most frame whose bordered rectangle contains `pointer`.
    pub fn frame_at(
        &self,
        pointer: Point,
        ratio: Ratio,
        display_scale: f32,
        border: f32,
    ) -> Option<FrameId> {
        let pointer = to_pos2(pointer);
        self.in_stacking_order()
            .filter(|f| {
                f.screen_rect(ratio, display_scale)
                    .expand(border)
                    .contains(pointer)
            })
            .map(|f| f.id)
            .last()
    }
}

/// Parses `#RRGGBB` (the leading `#` is optional).
pub fn parse_hex_color(text: &str) -> Result<Color32, FrameError> {
    let text = text.trim();
    let with_hash = if text.starts_with('#') {
        text.to_owned()
    } else {
        format!("#{text}")
    };
    Color32::from_hex(&with_hash).map_err(|_| FrameError::InvalidColor(text.to_owned()))
}

pub fn format_hex_color(color: Color32) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r(), color.g(), color.b())
}

/// Whole centimeters print without a fraction, everything else with one digit.
pub fn format_cm(cm: f64) -> String {
    if cm.fract() == 0.0 {
        format!("{cm:.0}")
    } else {
        format!("{cm:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_ratio() -> Ratio {
        Ratio::from_cm_per_px(1.0)
    }

    #[test]
    fn ids_are_distinct_and_never_reused() {
        let mut frames = FrameList::new();
        let a = frames.add(50.0, 70.0, PALETTE[0], Point::origin()).unwrap();
        let b = frames.add(30.0, 40.0, PALETTE[1], Point::origin()).unwrap();
        assert_ne!(a, b);

        frames.remove(b);
        let c = frames.add(30.0, 40.0, PALETTE[1], Point::origin()).unwrap();
        assert_ne!(b, c);

        frames.clear();
        let d = frames.add(10.0, 10.0, PALETTE[2], Point::origin()).unwrap();
        assert!(![a, b, c].contains(&d));
    }

    #[test]
    fn remove_leaves_the_other_frame() {
        let mut frames = FrameList::new();
        let a = frames.add(50.0, 70.0, PALETTE[0], Point::origin()).unwrap();
        let b = frames.add(30.0, 40.0, PALETTE[1], Point::origin()).unwrap();

        let removed = frames.remove(a).unwrap();
        assert_eq!(removed.id, a);
        let remaining: Vec<FrameId> = frames.iter().map(|f| f.id).collect();
        assert_eq!(remaining, vec![b]);
        assert!(frames.remove(a).is_none());
    }

    #[test]
    fn removing_active_frame_clears_selection() {
        let mut frames = FrameList::new();
        let a = frames.add(50.0, 70.0, PALETTE[0], Point::origin()).unwrap();
        assert_eq!(frames.active(), Some(a));
        frames.remove(a);
        assert_eq!(frames.active(), None);
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        let mut frames = FrameList::new();
        assert!(frames.add(0.0, 70.0, PALETTE[0], Point::origin()).is_err());
        assert!(frames.add(50.0, -1.0, PALETTE[0], Point::origin()).is_err());
        assert!(frames.add(f64::NAN, 1.0, PALETTE[0], Point::origin()).is_err());
        assert!(frames.is_empty());
    }

    #[test]
    fn active_frame_is_raised_to_top() {
        let mut frames = FrameList::new();
        let a = frames.add(50.0, 50.0, PALETTE[0], Point::new(100.0, 100.0)).unwrap();
        let b = frames.add(50.0, 50.0, PALETTE[1], Point::new(110.0, 110.0)).unwrap();
        let c = frames.add(50.0, 50.0, PALETTE[2], Point::new(500.0, 500.0)).unwrap();

        frames.select(a).unwrap();
        let order: Vec<FrameId> = frames.in_stacking_order().map(|f| f.id).collect();
        assert_eq!(order, vec![b, c, a]);

        // a and b overlap at (105, 105); the raised one wins.
        let hit = frames.frame_at(Point::new(105.0, 105.0), unit_ratio(), 1.0, 0.0);
        assert_eq!(hit, Some(a));
        frames.select(b).unwrap();
        let hit = frames.frame_at(Point::new(105.0, 105.0), unit_ratio(), 1.0, 0.0);
        assert_eq!(hit, Some(b));
    }

    #[test]
    fn hit_test_includes_border() {
        let mut frames = FrameList::new();
        let a = frames.add(20.0, 20.0, PALETTE[0], Point::new(50.0, 50.0)).unwrap();
        let edge = Point::new(64.0, 50.0);
        assert_eq!(frames.frame_at(edge, unit_ratio(), 1.0, 0.0), None);
        assert_eq!(frames.frame_at(edge, unit_ratio(), 1.0, 8.0), Some(a));
    }

    #[test]
    fn screen_rect_follows_ratio() {
        let mut frames = FrameList::new();
        let a = frames.add(50.0, 70.0, PALETTE[0], Point::new(200.0, 200.0)).unwrap();
        let frame = frames.get(a).unwrap();

        let rect = frame.screen_rect(unit_ratio(), 1.0);
        assert_eq!(rect.size(), egui::vec2(50.0, 70.0));
        assert_eq!(rect.center(), egui::pos2(200.0, 200.0));

        let rect = frame.screen_rect(Ratio::from_cm_per_px(2.0), 1.0);
        assert_eq!(rect.size(), egui::vec2(25.0, 35.0));
    }

    #[test]
    fn move_unknown_frame_errors() {
        let mut frames = FrameList::new();
        let a = frames.add(50.0, 70.0, PALETTE[0], Point::origin()).unwrap();
        frames.remove(a);
        assert_eq!(
            frames.move_to(a, Point::new(1.0, 1.0)),
            Err(FrameError::UnknownFrame(a))
        );
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#8B4513").unwrap(), PALETTE[2]);
        assert_eq!(parse_hex_color(" ffd700 ").unwrap(), PALETTE[3]);
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("walnut").is_err());
        assert_eq!(format_hex_color(PALETTE[1]), "#F8F8F8");
    }

    #[test]
    fn labels() {
        let mut frames = FrameList::new();
        let a = frames.add(50.0, 70.5, PALETTE[0], Point::origin()).unwrap();
        assert_eq!(frames.get(a).unwrap().label(), "50 x 70.5 cm");
    }
}
