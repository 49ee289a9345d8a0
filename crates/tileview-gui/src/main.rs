mod app;
mod egui_backend;
mod messages;
mod panels;
mod progress;
mod states;
mod worker;

use std::path::PathBuf;

use clap::Parser;
use tileview_core::config::ViewerConfig;
use tracing::warn;

use crate::messages::WorkerCommand;

#[derive(Parser)]
#[command(name = "tileview-gui", version, about = "Interactive tiled image viewer")]
struct Args {
    /// Image to open at startup
    file: Option<PathBuf>,

    /// Viewer config (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ViewerConfig::load(path).unwrap_or_else(|e| {
            warn!("Ignoring config {}: {e}", path.display());
            ViewerConfig::default()
        }),
        None => ViewerConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("TileView"),
        ..Default::default()
    };

    eframe::run_native(
        "TileView",
        options,
        Box::new(move |cc| {
            let mut app = app::TileViewApp::new(&cc.egui_ctx, config, args.config);
            if let Some(path) = args.file {
                app.send_command(WorkerCommand::OpenImage { path });
            }
            Ok(Box::new(app))
        }),
    )
}
