/// Receives per-frame feedback from the compositor: tile progress and the
/// busy indicator. All methods default to no-ops.
pub trait FrameProgress {
    /// A frame that visits `total_tiles` tiles has started.
    fn begin(&self, _total_tiles: usize) {}

    /// Percentage (0..=100) of the frame's tiles visited so far. Only called
    /// when a tile has to be uploaded.
    fn report_progress(&self, _percent: u32) {}

    /// Show or clear the busy indicator (wait cursor).
    fn set_busy(&self, _busy: bool) {}

    /// The frame is complete.
    fn finish(&self) {}
}

pub struct NoOpProgress;
impl FrameProgress for NoOpProgress {}
