#![warn(clippy::all, rust_2018_idioms)]

mod app;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod interaction;
pub mod state;
mod widgets;

pub use app::FramePreviewApp;
pub use config::PreviewSettings;
