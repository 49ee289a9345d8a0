use super::orientation::Orientation;
use crate::backend::Viewport;
use crate::source::{ImageSpec, Region};

/// Where the view looks and how far it is zoomed. The centre is in
/// displayed (oriented) image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    pub center_x: f32,
    pub center_y: f32,
    pub zoom: f32,
    pub orientation: Orientation,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            zoom: 1.0,
            orientation: Orientation::Normal,
        }
    }
}

impl ViewState {
    /// Centre expressed in the stored image's own pixel coordinates.
    pub fn real_center(&self, spec: &ImageSpec) -> (f32, f32) {
        self.orientation
            .real_center((self.center_x, self.center_y), spec.width, spec.height)
    }

    /// Keep the zoomed image intersecting the viewport. An axis on which
    /// the zoomed display window is smaller than the viewport is centred on
    /// the display window instead.
    pub fn clamp_to_window(&mut self, spec: &ImageSpec, viewport: Viewport) {
        let ext = spec.oriented(self.orientation);
        self.center_x = clamp_axis(
            self.center_x,
            self.zoom,
            viewport.width as f32,
            ext.x,
            ext.width,
            ext.full_x,
            ext.full_width,
        );
        self.center_y = clamp_axis(
            self.center_y,
            self.zoom,
            viewport.height as f32,
            ext.y,
            ext.height,
            ext.full_y,
            ext.full_height,
        );
    }
}

fn clamp_axis(
    center: f32,
    zoom: f32,
    window: f32,
    origin: i32,
    extent: u32,
    full_origin: i32,
    full_extent: u32,
) -> f32 {
    let zoomed = zoom * full_extent as f32;
    if zoomed >= window {
        let min = origin.min(full_origin) as f32;
        let max = (origin + extent as i32).max(full_origin + full_extent as i32) as f32;
        let half = 0.5 * window / zoom;
        center.clamp(min + half, (max - half).max(min + half))
    } else {
        (full_origin + (full_extent / 2) as i32) as f32
    }
}

/// Affine image → window mapping for one frame:
/// `window = window_center + zoom · O · (p − real_center)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    matrix: [[f32; 2]; 2],
    zoom: f32,
    real_center: (f32, f32),
    window_center: [f32; 2],
}

impl ViewTransform {
    pub fn new(view: &ViewState, spec: &ImageSpec, viewport: Viewport) -> Self {
        Self {
            matrix: view.orientation.matrix(),
            zoom: view.zoom,
            real_center: view.real_center(spec),
            window_center: viewport.center(),
        }
    }

    pub fn image_to_window(&self, x: f32, y: f32) -> [f32; 2] {
        let dx = x - self.real_center.0;
        let dy = y - self.real_center.1;
        let m = &self.matrix;
        [
            self.window_center[0] + self.zoom * (m[0][0] * dx + m[0][1] * dy),
            self.window_center[1] + self.zoom * (m[1][0] * dx + m[1][1] * dy),
        ]
    }

    /// Window corners of an image rectangle, in [`crate::backend::Quad`] order.
    pub fn rect_to_window(&self, rect: &Region) -> [[f32; 2]; 4] {
        let (x0, y0) = (rect.x as f32, rect.y as f32);
        let (x1, y1) = (rect.x_end() as f32, rect.y_end() as f32);
        [
            self.image_to_window(x0, y0),
            self.image_to_window(x1, y0),
            self.image_to_window(x1, y1),
            self.image_to_window(x0, y1),
        ]
    }
}

/// Texture coordinates for the four quad corners. Corner `i` takes texture
/// corner `(i + rotate) mod 4`.
pub fn quad_tex_coords(smin: f32, tmin: f32, smax: f32, tmax: f32, rotate: u8) -> [[f32; 2]; 4] {
    let tex = [[smin, tmin], [smax, tmin], [smax, tmax], [smin, tmax]];
    std::array::from_fn(|i| tex[(i + rotate as usize) % 4])
}

/// Image pixel under a window position. Ignores orientation.
pub fn window_to_image_pixel(window: [f32; 2], view: &ViewState, viewport: Viewport) -> (i32, i32) {
    let (w, h) = (viewport.width as f32, viewport.height as f32);
    let left = view.center_x - 0.5 * w / view.zoom;
    let right = view.center_x + 0.5 * w / view.zoom;
    let top = view.center_y - 0.5 * h / view.zoom;
    let bottom = view.center_y + 0.5 * h / view.zoom;
    let nx = (window[0] + 0.5) / w;
    let ny = (window[1] + 0.5) / h;
    let x = left + (right - left) * nx;
    let y = top + (bottom - top) * ny;
    (x as i32, y as i32)
}
