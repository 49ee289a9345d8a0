/// Upper bound applied to the driver-reported texture limit.
pub const MAX_TEXTURE_CEILING: u32 = 4096;

/// Number of tile slots in the texture pool.
pub const DEFAULT_TILE_POOL_SIZE: usize = 4;

/// Number of double-buffered transfer buffers used for async uploads.
pub const TRANSFER_BUFFER_COUNT: usize = 2;

/// Smallest zoom factor reachable through input.
pub const MIN_ZOOM: f32 = 0.01;

/// Largest zoom factor reachable through input.
pub const MAX_ZOOM: f32 = 256.0;

/// Zoom change per pixel of modifier-drag and per degree of wheel rotation.
pub const ZOOM_SENSITIVITY: f32 = 0.005;

/// Wheel delta units per degree (one notch = 120 units = 15 degrees).
pub const WHEEL_UNITS_PER_DEGREE: f32 = 8.0;

/// Side length (in source pixels) of the pixel-view neighborhood. Must be odd.
pub const CLOSEUP_PIXELS: u32 = 11;

/// Side length of the dedicated pixel-view texture.
pub const CLOSEUP_TEXTURE_SIZE: u32 = 16;

/// On-screen side length (window pixels) of the pixel-view patch.
pub const CLOSEUP_WINDOW_SIZE: f32 = 160.0;

/// Gap between the window corner and the pixel-view patch when it does not
/// follow the mouse.
pub const CLOSEUP_CORNER_INSET: f32 = 5.0;

/// Vertical distance between readout lines beneath the pixel view.
pub const READOUT_LINE_SPACING: f32 = 18.0;

/// Fraction of a texel treated as grid seam on each side in pixel-view mode.
pub const PIXEL_GRID_SEAM: f32 = 0.05;

/// Fractional texel position where the far seam starts.
pub const PIXEL_GRID_SEAM_END: f32 = 0.95;

/// Gray level of the pixel-view grid and of the window background.
pub const BACKGROUND_GRAY: f32 = 0.05;

/// Gray level of the inspector placeholder and backing panel.
pub const PANEL_GRAY: f32 = 0.1;

/// Opacity of the inspector backing panel.
pub const PANEL_ALPHA: f32 = 0.5;

/// Rec. 709 luminance coefficient for the red channel.
pub const LUMINANCE_R: f32 = 0.2126;

/// Rec. 709 luminance coefficient for the green channel.
pub const LUMINANCE_G: f32 = 0.7152;

/// Rec. 709 luminance coefficient for the blue channel.
pub const LUMINANCE_B: f32 = 0.0722;

/// Minimum window pixel count to rasterize rows in parallel.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;
