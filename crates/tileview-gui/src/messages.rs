use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tileview_core::config::ViewerConfig;
use tileview_core::source::MemoryImage;

/// Commands sent from UI thread to worker thread.
pub enum WorkerCommand {
    /// Decode an image file.
    OpenImage { path: PathBuf },

    /// Read and validate a viewer config file.
    LoadConfig { path: PathBuf },
}

/// Results sent from worker thread back to UI thread.
pub enum WorkerResult {
    ImageLoaded {
        path: PathBuf,
        image: Arc<MemoryImage>,
        elapsed: Duration,
    },
    ConfigLoaded {
        path: PathBuf,
        config: ViewerConfig,
    },
    Error {
        message: String,
    },
}
