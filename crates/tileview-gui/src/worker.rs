use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use tileview_core::config::ViewerConfig;
use tileview_core::source::{MemoryImage, SourceImage};
use tracing::{debug, error, info};

use crate::messages::{WorkerCommand, WorkerResult};

/// Spawn the decode thread. Returns the command sender; results arrive on
/// `result_tx` and each one requests a repaint.
pub fn spawn_worker(
    result_tx: mpsc::Sender<WorkerResult>,
    ctx: egui::Context,
) -> mpsc::Sender<WorkerCommand> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<WorkerCommand>();

    let spawned = std::thread::Builder::new()
        .name("tileview-worker".into())
        .spawn(move || {
            while let Ok(cmd) = cmd_rx.recv() {
                let result = handle_command(cmd);
                if result_tx.send(result).is_err() {
                    break;
                }
                ctx.request_repaint();
            }
            debug!("Worker thread exiting");
        });
    if let Err(e) = spawned {
        error!("Failed to start worker thread: {e}");
    }

    cmd_tx
}

fn handle_command(cmd: WorkerCommand) -> WorkerResult {
    match cmd {
        WorkerCommand::OpenImage { path } => {
            let start = Instant::now();
            match MemoryImage::open(&path) {
                Ok(image) => {
                    let spec = image.spec();
                    info!(
                        path = %path.display(),
                        width = spec.width,
                        height = spec.height,
                        channels = spec.channel_count(),
                        "Decoded image"
                    );
                    WorkerResult::ImageLoaded {
                        path,
                        image: Arc::new(image),
                        elapsed: start.elapsed(),
                    }
                }
                Err(e) => WorkerResult::Error {
                    message: format!("Failed to open {}: {e}", path.display()),
                },
            }
        }
        WorkerCommand::LoadConfig { path } => match ViewerConfig::load(&path) {
            Ok(config) => WorkerResult::ConfigLoaded { path, config },
            Err(e) => WorkerResult::Error {
                message: format!("Failed to load {}: {e}", path.display()),
            },
        },
    }
}
