use std::path::PathBuf;

/// Overall UI state.
#[derive(Default)]
pub struct UIState {
    pub file_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,

    /// One-line description of the loaded image.
    pub image_summary: Option<String>,

    /// A decode is in flight on the worker.
    pub loading: bool,

    /// Fit the next image to the window once the viewport size is known.
    pub fit_pending: bool,

    /// Log messages.
    pub log_messages: Vec<String>,
}

impl UIState {
    pub fn add_log(&mut self, msg: String) {
        self.log_messages.push(msg);
    }
}
