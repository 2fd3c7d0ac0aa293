#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use wall_frame_preview::{FramePreviewApp, PreviewSettings};

#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt::init();

    // Optional photo to open right away: `wall_frame_preview room.jpg`
    let settings = match std::env::args().nth(1) {
        Some(path) => PreviewSettings::default().with_startup_image(path),
        None => PreviewSettings::default(),
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "Wall Frame Preview",
        native_options,
        Box::new(|cc| Ok(Box::new(FramePreviewApp::new(cc, settings)))),
    )
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Redirect `log` message to `console.log` and friends:
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        eframe::WebRunner::new()
            .start(
                "egui_canvas",
                web_options,
                Box::new(|cc| Ok(Box::new(FramePreviewApp::new(cc, PreviewSettings::default())))),
            )
            .await
            .expect("failed to start eframe");
    });
}
