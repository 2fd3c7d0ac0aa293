use thiserror::Error;

use crate::frame::FrameId;

/// Reasons a calibration segment cannot produce a ratio.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("no calibration segment has been drawn")]
    NoSegment,

    #[error("the two calibration points coincide")]
    ZeroLengthSegment,

    #[error("real-world distance must be positive, got {0} cm")]
    NonPositiveDistance(f64),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("frame dimensions must be positive, got {width_cm} x {height_cm} cm")]
    InvalidDimensions { width_cm: f64, height_cm: f64 },

    #[error("invalid color '{0}', expected #RRGGBB")]
    InvalidColor(String),

    #[error("no frame with id {0}")]
    UnknownFrame(FrameId),

    #[error("frames can only be moved while placing them")]
    NotPlacingFrames,
}
