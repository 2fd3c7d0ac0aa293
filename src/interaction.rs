//! Pointer handling for the two interactive steps: drawing the calibration
//! segment and dragging frames around the viewport.

use crate::frame::FrameId;
use crate::geometry::{CalibrationData, Offset, Point};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CalibrationPhase {
    #[default]
    AwaitingP1,
    AwaitingP2,
}

/// Two-click segment tool. The first click anchors both ends, hovering drags
/// the second end along as a rubber band, the second click commits it.
#[derive(Clone, Debug, Default)]
pub struct CalibrationTool {
    phase: CalibrationPhase,
}

impl CalibrationTool {
    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn is_placing_second_point(&self) -> bool {
        self.phase == CalibrationPhase::AwaitingP2
    }

    pub fn reset(&mut self) {
        self.phase = CalibrationPhase::AwaitingP1;
    }

    /// Applies a click at `point`. A new segment keeps the previously entered
    /// distance, or `default_distance_cm` when there was none or it was zero.
    /// A negative distance is kept so submitting reports it.
    pub fn click(
        &mut self,
        point: Point,
        calibration: &mut Option<CalibrationData>,
        default_distance_cm: f64,
    ) {
        match self.phase {
            CalibrationPhase::AwaitingP1 => {
                let distance = calibration
                    .as_ref()
                    .map(|c| c.real_distance_cm)
                    .filter(|d| *d != 0.0 && !d.is_nan())
                    .unwrap_or(default_distance_cm);
                *calibration = Some(CalibrationData::starting_at(point, distance));
                self.phase = CalibrationPhase::AwaitingP2;
            }
            CalibrationPhase::AwaitingP2 => {
                // A segment discarded mid-draw just ends the gesture.
                if let Some(segment) = calibration.as_mut() {
                    segment.p2 = point;
                }
                self.phase = CalibrationPhase::AwaitingP1;
            }
        }
    }

    pub fn hover(&self, point: Point, calibration: &mut Option<CalibrationData>) {
        if self.phase != CalibrationPhase::AwaitingP2 {
            return;
        }
        if let Some(segment) = calibration.as_mut() {
            segment.p2 = point;
        }
    }
}

/// A drag in progress. Exists only between pointer-down and pointer-up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameDrag {
    pub target: FrameId,
    /// Pointer position minus frame anchor at pointer-down.
    pub offset: Offset,
}

impl FrameDrag {
    pub fn begin(target: FrameId, pointer: Point, anchor: Point) -> Self {
        Self {
            target,
            offset: pointer - anchor,
        }
    }

    /// New anchor for the dragged frame with the pointer at `pointer`.
    pub fn anchor_for(&self, pointer: Point) -> Point {
        pointer - self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_clicks_draw_a_segment() {
        let mut tool = CalibrationTool::default();
        let mut calibration = None;

        tool.click(Point::new(50.0, 50.0), &mut calibration, 100.0);
        assert!(tool.is_placing_second_point());
        let segment = calibration.unwrap();
        assert_eq!(segment.p1, segment.p2);
        assert_eq!(segment.real_distance_cm, 100.0);

        tool.hover(Point::new(90.0, 60.0), &mut calibration);
        assert_eq!(calibration.unwrap().p2, Point::new(90.0, 60.0));

        tool.click(Point::new(150.0, 50.0), &mut calibration, 100.0);
        assert_eq!(tool.phase(), CalibrationPhase::AwaitingP1);
        let segment = calibration.unwrap();
        assert_eq!(segment.p1, Point::new(50.0, 50.0));
        assert_eq!(segment.p2, Point::new(150.0, 50.0));
    }

    #[test]
    fn hover_is_ignored_before_first_click() {
        let tool = CalibrationTool::default();
        let mut calibration = Some(CalibrationData::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            100.0,
        ));
        tool.hover(Point::new(99.0, 99.0), &mut calibration);
        assert_eq!(calibration.unwrap().p2, Point::new(10.0, 0.0));
    }

    #[test]
    fn new_segment_keeps_previous_distance() {
        let mut tool = CalibrationTool::default();
        let mut calibration = Some(CalibrationData::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            42.0,
        ));
        tool.click(Point::new(5.0, 5.0), &mut calibration, 100.0);
        let segment = calibration.unwrap();
        assert_eq!(segment.p1, Point::new(5.0, 5.0));
        assert_eq!(segment.p2, Point::new(5.0, 5.0));
        assert_eq!(segment.real_distance_cm, 42.0);
    }

    #[test]
    fn only_zero_or_nan_distance_falls_back_to_default() {
        for (previous, expected) in [(-20.0, -20.0), (0.0, 100.0)] {
            let mut tool = CalibrationTool::default();
            let mut calibration = Some(CalibrationData::starting_at(Point::origin(), previous));
            tool.click(Point::new(5.0, 5.0), &mut calibration, 100.0);
            assert_eq!(calibration.unwrap().real_distance_cm, expected);
        }

        let mut tool = CalibrationTool::default();
        let mut calibration = Some(CalibrationData::starting_at(Point::origin(), f64::NAN));
        tool.click(Point::new(5.0, 5.0), &mut calibration, 100.0);
        assert_eq!(calibration.unwrap().real_distance_cm, 100.0);
    }

    #[test]
    fn drag_preserves_grab_offset() {
        let mut frames = crate::frame::FrameList::new();
        let id = frames
            .add(10.0, 10.0, crate::frame::PALETTE[0], Point::new(100.0, 100.0))
            .unwrap();

        let drag = FrameDrag::begin(id, Point::new(110.0, 105.0), Point::new(100.0, 100.0));
        assert_eq!(drag.offset, Offset::new(10.0, 5.0));
        assert_eq!(drag.anchor_for(Point::new(200.0, 150.0)), Point::new(190.0, 145.0));
    }
}
