//! Scale calibration: turning a drawn reference segment of known length into a
//! centimeters-per-pixel ratio, and converting real-world sizes back to pixels.
//!
//! The photo is assumed to have no perspective distortion and uniform pixel
//! density, so a single scalar is enough.

use egui::{Pos2, Vec2};
use nalgebra::{Point2, Vector2};

use crate::error::CalibrationError;

pub type Point = Point2<f64>;
pub type Offset = Vector2<f64>;

pub fn to_pos2(p: Point) -> Pos2 {
    Pos2::new(p.x as f32, p.y as f32)
}

pub fn from_pos2(p: Pos2) -> Point {
    Point::new(p.x as f64, p.y as f64)
}

/// One user-drawn reference segment and its known real-world length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationData {
    pub p1: Point,
    pub p2: Point,
    pub real_distance_cm: f64,
}

impl CalibrationData {
    pub fn new(p1: Point, p2: Point, real_distance_cm: f64) -> Self {
        Self {
            p1,
            p2,
            real_distance_cm,
        }
    }

    /// A zero-length segment at `p`, as created by the first calibration click.
    pub fn starting_at(p: Point, real_distance_cm: f64) -> Self {
        Self::new(p, p, real_distance_cm)
    }

    pub fn pixel_distance(&self) -> f64 {
        nalgebra::distance(&self.p1, &self.p2)
    }

    pub fn midpoint(&self) -> Point {
        nalgebra::center(&self.p1, &self.p2)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    fn validate(&self) -> Result<f64, CalibrationError> {
        let pixel_distance = self.pixel_distance();
        if pixel_distance.is_nan() || pixel_distance <= 0.0 {
            return Err(CalibrationError::ZeroLengthSegment);
        }
        if !self.real_distance_cm.is_finite() || self.real_distance_cm <= 0.0 {
            return Err(CalibrationError::NonPositiveDistance(self.real_distance_cm));
        }
        Ok(pixel_distance)
    }
}

/// Centimeters represented by one image pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ratio(f64);

impl Ratio {
    pub fn from_calibration(calibration: &CalibrationData) -> Result<Self, CalibrationError> {
        let pixel_distance = calibration.validate()?;
        Ok(Self(calibration.real_distance_cm / pixel_distance))
    }

    #[cfg(test)]
    pub(crate) fn from_cm_per_px(cm_per_px: f64) -> Self {
        Self(cm_per_px)
    }

    pub fn cm_per_px(&self) -> f64 {
        self.0
    }

    pub fn cm_to_px(&self, cm: f64) -> f64 {
        cm / self.0
    }

    pub fn px_to_cm(&self, px: f64) -> f64 {
        px * self.0
    }

    /// On-image pixel size of a `width_cm` x `height_cm` rectangle.
    pub fn size_px(&self, width_cm: f64, height_cm: f64) -> Vec2 {
        Vec2::new(
            self.cm_to_px(width_cm) as f32,
            self.cm_to_px(height_cm) as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn ratio_is_distance_over_pixels() {
        let calibration = CalibrationData::new(Point::new(0.0, 0.0), Point::new(30.0, 40.0), 100.0);
        assert_eq!(calibration.pixel_distance(), 50.0);
        let ratio = Ratio::from_calibration(&calibration).unwrap();
        assert!(close(ratio.cm_per_px(), 2.0));
        assert!(close(ratio.cm_to_px(50.0), 25.0));
    }

    #[test]
    fn cm_to_px_round_trips_across_scales() {
        for (p2, distance) in [
            (Point::new(1.0, 0.0), 0.5),
            (Point::new(123.4, -56.7), 250.0),
            (Point::new(-3000.0, 2000.0), 12.5),
        ] {
            let calibration = CalibrationData::new(Point::origin(), p2, distance);
            let ratio = Ratio::from_calibration(&calibration).unwrap();
            for width_cm in [0.1, 50.0, 333.3] {
                let px = ratio.cm_to_px(width_cm);
                assert!(close(ratio.px_to_cm(px), width_cm));
            }
        }
    }

    #[test]
    fn zero_length_segment_is_rejected() {
        let calibration = CalibrationData::starting_at(Point::new(12.0, 12.0), 100.0);
        assert!(!calibration.is_valid());
        assert_eq!(
            Ratio::from_calibration(&calibration),
            Err(CalibrationError::ZeroLengthSegment)
        );
    }

    #[test]
    fn non_positive_distance_is_rejected() {
        for distance in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let calibration =
                CalibrationData::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0), distance);
            assert!(Ratio::from_calibration(&calibration).is_err());
        }
    }

    #[test]
    fn vertical_segment_is_valid() {
        let calibration =
            CalibrationData::new(Point::new(40.0, 10.0), Point::new(40.0, 110.0), 100.0);
        assert!(calibration.is_valid());
        assert_eq!(calibration.midpoint(), Point::new(40.0, 60.0));
    }

    #[test]
    fn pos2_conversion() {
        let p = Point::new(1.5, -2.0);
        assert_eq!(to_pos2(p), Pos2::new(1.5, -2.0));
        assert_eq!(from_pos2(to_pos2(p)), p);
    }
}
