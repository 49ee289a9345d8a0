use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use tileview_core::progress::FrameProgress;

/// Frame feedback shared between the display surface and the status bar.
#[derive(Default)]
pub struct FrameStatus {
    tiles_total: AtomicUsize,
    percent: AtomicU32,
    busy: AtomicBool,
    uploading: AtomicBool,
}

impl FrameStatus {
    pub fn tiles_total(&self) -> usize {
        self.tiles_total.load(Ordering::Relaxed)
    }

    /// Upload progress of the last frame that had to upload tiles.
    pub fn percent(&self) -> Option<u32> {
        self.uploading
            .load(Ordering::Relaxed)
            .then(|| self.percent.load(Ordering::Relaxed))
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Relaxed)
    }
}

/// Reports tile progress into a [`FrameStatus`] and shows the wait cursor
/// while tiles are being uploaded.
pub struct ViewerProgress {
    status: Arc<FrameStatus>,
    ctx: egui::Context,
}

impl ViewerProgress {
    pub fn new(status: Arc<FrameStatus>, ctx: egui::Context) -> Self {
        Self { status, ctx }
    }
}

impl FrameProgress for ViewerProgress {
    fn begin(&self, total_tiles: usize) {
        self.status.tiles_total.store(total_tiles, Ordering::Relaxed);
        self.status.uploading.store(false, Ordering::Relaxed);
    }

    fn report_progress(&self, percent: u32) {
        self.status.percent.store(percent, Ordering::Relaxed);
        self.status.uploading.store(true, Ordering::Relaxed);
    }

    fn set_busy(&self, busy: bool) {
        self.status.busy.store(busy, Ordering::Relaxed);
        if busy {
            self.ctx.set_cursor_icon(egui::CursorIcon::Wait);
        }
    }

    fn finish(&self) {
        if self.status.uploading.load(Ordering::Relaxed) {
            self.status.percent.store(100, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_tracks_uploads() {
        let status = Arc::new(FrameStatus::default());
        let progress = ViewerProgress::new(status.clone(), egui::Context::default());

        progress.begin(4);
        assert_eq!(status.tiles_total(), 4);
        assert_eq!(status.percent(), None);

        progress.report_progress(50);
        progress.set_busy(true);
        assert_eq!(status.percent(), Some(50));
        assert!(status.is_busy());

        progress.finish();
        progress.set_busy(false);
        assert_eq!(status.percent(), Some(100));
        assert!(!status.is_busy());
    }

    #[test]
    fn test_cache_hit_frame_reports_no_upload() {
        let status = Arc::new(FrameStatus::default());
        let progress = ViewerProgress::new(status.clone(), egui::Context::default());
        progress.begin(2);
        progress.report_progress(0);
        progress.finish();

        progress.begin(2);
        progress.finish();
        assert_eq!(status.percent(), None);
    }
}
