use tileview_core::color::DisplayParams;
use tileview_core::input::MouseMode;
use tileview_core::view::Orientation;

/// Display settings edited in the controls panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    pub display: DisplayParams,
    /// `None` keeps the orientation stored in the image.
    pub orientation: Option<Orientation>,
    pub mouse_mode: MouseMode,
    pub inspector_enabled: bool,
    pub inspector_follows_mouse: bool,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            display: DisplayParams::default(),
            orientation: None,
            mouse_mode: MouseMode::Zoom,
            inspector_enabled: false,
            inspector_follows_mouse: true,
        }
    }
}
