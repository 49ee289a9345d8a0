//! Pixel-view magnifier: a blown-up neighbourhood of the pixel under the
//! pointer, with numeric readouts of that pixel.

use tracing::debug;

use crate::backend::{rect_corners, FilterMode, GraphicsBackend, Quad, TextRun, TextureDesc, TextureId, Viewport};
use crate::caps::RenderCapabilities;
use crate::color::{ColorParams, ColorStrategy, DisplayParams};
use crate::config::InspectorConfig;
use crate::consts::{
    BACKGROUND_GRAY, CLOSEUP_CORNER_INSET, PANEL_ALPHA, PANEL_GRAY, PIXEL_GRID_SEAM,
    READOUT_LINE_SPACING,
};
use crate::error::Result;
use crate::format::{negotiate, TextureFormat};
use crate::source::convert::read_raw;
use crate::source::{ImageSpec, PixelFormat, Region, SourceImage};
use crate::tiles::{bake_region, TileCache};
use crate::view::{quad_tex_coords, window_to_image_pixel, ViewState};

/// Last pointer position and the image pixel under it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InspectorState {
    pub window_pos: [f32; 2],
    pub pixel: (i32, i32),
}

/// Clamped neighbourhood around an inspected pixel, relative to the data
/// window origin. `*_end` are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighborhood {
    pub x_begin: i32,
    pub y_begin: i32,
    pub x_end: i32,
    pub y_end: i32,
}

/// Keep an `n × n` window around `(xp, yp)` inside a `width × height` image.
pub fn neighborhood(xp: i32, yp: i32, width: u32, height: u32, n: u32) -> Neighborhood {
    let half = n as i32 / 2;
    let (w, h) = (width as i32, height as i32);
    let xpp = xp.max(half).min(w - half - 1);
    let ypp = yp.max(half).min(h - half - 1);
    Neighborhood {
        x_begin: (xpp - half).max(0),
        y_begin: (ypp - half).max(0),
        x_end: (xpp + half + 1).min(w),
        y_end: (ypp + half + 1).min(h),
    }
}

/// One readout line per channel. `raw` is the pixel in its native format,
/// `normalized` the values from [`SourceImage::get_pixel`].
pub fn format_readouts(spec: &ImageSpec, raw: &[u8], normalized: &[f32]) -> Vec<String> {
    let sample_bytes = spec.format.bytes();
    spec.channel_names
        .iter()
        .zip(normalized)
        .enumerate()
        .map(|(c, (name, value))| match spec.format {
            PixelFormat::U8 | PixelFormat::U16 => {
                let stored = read_raw(spec.format, &raw[c * sample_bytes..(c + 1) * sample_bytes]);
                format!("{name}: {:3}  ({value:5.3})", stored as i64)
            }
            _ => format!("{name}: {value:5.3}"),
        })
        .collect()
}

pub struct PixelInspector {
    config: InspectorConfig,
    enabled: bool,
    follows_mouse: bool,
    texture: Option<TextureId>,
    format: TextureFormat,
    state: Option<InspectorState>,
    staging: Vec<u8>,
    scratch: Vec<u8>,
}

impl PixelInspector {
    pub fn new(config: InspectorConfig) -> Self {
        Self {
            follows_mouse: config.follows_mouse,
            config,
            enabled: false,
            texture: None,
            format: TextureFormat::BAKED_RGBA8,
            state: None,
            staging: Vec::new(),
            scratch: Vec::new(),
        }
    }

    fn texture_desc(&self) -> TextureDesc {
        TextureDesc {
            width: self.config.texture_size,
            height: self.config.texture_size,
            format: self.format,
            filter: FilterMode::Nearest,
        }
    }

    /// Allocate the dedicated inspector texture.
    pub fn create_texture(&mut self, backend: &mut dyn GraphicsBackend) -> Result<()> {
        self.texture = Some(backend.create_texture(&self.texture_desc())?);
        Ok(())
    }

    /// Re-specify the texture in the format tiles of `spec` use.
    pub fn configure(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        spec: &ImageSpec,
        caps: &RenderCapabilities,
        bakes_color: bool,
    ) -> Result<()> {
        self.format = if bakes_color {
            TextureFormat::BAKED_RGBA8
        } else {
            negotiate(spec, caps)
        };
        if let Some(texture) = self.texture {
            backend.respecify_texture(texture, &self.texture_desc())?;
        }
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool, follows_mouse: bool) {
        self.enabled = enabled;
        self.follows_mouse = follows_mouse;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn follows_mouse(&self) -> bool {
        self.follows_mouse
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    pub fn state(&self) -> Option<InspectorState> {
        self.state
    }

    /// Recompute the inspected pixel for a pointer position.
    pub fn refresh(&mut self, window_pos: [f32; 2], view: &ViewState, viewport: Viewport) -> InspectorState {
        let state = InspectorState {
            window_pos,
            pixel: window_to_image_pixel(window_pos, view, viewport),
        };
        self.state = Some(state);
        state
    }

    /// Centre of the magnified patch in window coordinates.
    pub fn patch_center(&self) -> [f32; 2] {
        match (self.follows_mouse, self.state) {
            (true, Some(state)) => state.window_pos,
            _ => {
                let c = self.config.window_size * 0.5 + CLOSEUP_CORNER_INSET;
                [c, c]
            }
        }
    }

    /// Draw the panel, the magnified patch and the readouts.
    #[allow(clippy::too_many_arguments)]
    pub fn paint(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        image: &dyn SourceImage,
        view: &ViewState,
        viewport: Viewport,
        pipeline: &dyn ColorStrategy,
        cache: &TileCache,
        display: &DisplayParams,
    ) -> Result<()> {
        let pos = self.state.map_or([0.0, 0.0], |s| s.window_pos);
        let state = self.refresh(pos, view, viewport);
        let spec = image.spec();
        let nchannels = spec.channel_count();
        let half = self.config.window_size * 0.5;
        let [cx, cy] = self.patch_center();
        let (xp, yp) = state.pixel;
        let ext = spec.oriented(view.orientation);
        let in_bounds = xp >= 0 && xp < ext.width as i32 && yp >= 0 && yp < ext.height as i32;

        pipeline.unbind(backend);
        let extra = READOUT_LINE_SPACING * (1 + nchannels) as f32 + 4.0;
        backend.draw_quad(&Quad::solid(
            rect_corners(cx - half - 2.0, cy - half - 2.0, cx + half + 2.0, cy + half + extra),
            [PANEL_GRAY, PANEL_GRAY, PANEL_GRAY, PANEL_ALPHA],
        ));

        let patch = rect_corners(cx - half, cy - half, cx + half, cy + half);
        let Some(texture) = self.texture.filter(|_| in_bounds) else {
            let mut placeholder = Quad::solid(patch, [PANEL_GRAY, PANEL_GRAY, PANEL_GRAY, 1.0]);
            placeholder.opaque = true;
            backend.draw_quad(&placeholder);
            return Ok(());
        };

        let nb = neighborhood(xp, yp, spec.width, spec.height, self.config.pixels);
        let region = Region::new(
            spec.x + nb.x_begin,
            spec.y + nb.y_begin,
            (nb.x_end - nb.x_begin) as u32,
            (nb.y_end - nb.y_begin) as u32,
        );
        let ts = self.config.texture_size;
        match cache.bake_settings() {
            Some(bake) => {
                bake_region(image, region, bake, &mut self.scratch, &mut self.staging)?;
                backend.upload_region(
                    texture,
                    region.width,
                    region.height,
                    region.width as usize * 4,
                    &self.staging,
                )?;
            }
            None => {
                let row_bytes = region.width as usize * self.format.pixel_bytes();
                self.staging.resize(row_bytes * region.height as usize, 0);
                image.copy_pixels(region, self.format.upload_format, &mut self.staging)?;
                backend.upload_region(texture, region.width, region.height, row_bytes, &self.staging)?;
            }
        }

        let smax = region.width as f32 / ts as f32;
        let tmax = region.height as f32 / ts as f32;
        let params = ColorParams::new(display, nchannels, ts, ts).with_pixel_view(ts, ts);
        pipeline.bind(backend, &params, &cache.textures());
        backend.set_filter(texture, FilterMode::Nearest);
        let mut quad = Quad::textured(patch, quad_tex_coords(0.0, 0.0, smax, tmax, 0), texture);
        quad.opaque = true;
        backend.draw_quad(&quad);
        pipeline.unbind(backend);

        if pipeline.bakes_color() {
            draw_grid(backend, patch[0], 2.0 * half, region.width, region.height);
        }

        self.draw_readouts(backend, image, xp, yp, [cx - half + 4.0, cy + half]);
        Ok(())
    }

    fn draw_readouts(
        &self,
        backend: &mut dyn GraphicsBackend,
        image: &dyn SourceImage,
        xp: i32,
        yp: i32,
        origin: [f32; 2],
    ) {
        let spec = image.spec();
        let (x, y) = (xp + spec.x, yp + spec.y);
        let mut lines = vec![format!("({x}, {y})")];

        let mut normalized = vec![0.0f32; spec.channel_count()];
        let mut raw = vec![0u8; spec.pixel_bytes()];
        let fetched = image
            .get_pixel(x, y, &mut normalized)
            .and_then(|_| image.copy_pixels(Region::new(x, y, 1, 1), spec.format, &mut raw));
        match fetched {
            Ok(()) => lines.extend(format_readouts(spec, &raw, &normalized)),
            Err(e) => debug!(x, y, "No readout for inspected pixel: {e}"),
        }

        for (i, text) in lines.into_iter().enumerate() {
            backend.draw_text(TextRun {
                position: [origin[0], origin[1] + READOUT_LINE_SPACING * (i + 1) as f32],
                text,
            });
        }
    }
}

/// Grid lines over a patch of `columns × rows` texels, for paths without a
/// programmable stage. Each line covers the seam on both sides of a texel
/// boundary.
fn draw_grid(backend: &mut dyn GraphicsBackend, top_left: [f32; 2], size: f32, columns: u32, rows: u32) {
    let color = [BACKGROUND_GRAY, BACKGROUND_GRAY, BACKGROUND_GRAY, 1.0];
    let [x0, y0] = top_left;
    let (x1, y1) = (x0 + size, y0 + size);
    let cell_w = size / columns.max(1) as f32;
    let cell_h = size / rows.max(1) as f32;
    let (sw, sh) = (cell_w * PIXEL_GRID_SEAM, cell_h * PIXEL_GRID_SEAM);

    let mut draw = |corners| {
        let mut quad = Quad::solid(corners, color);
        quad.opaque = true;
        backend.draw_quad(&quad);
    };
    for i in 0..=columns {
        let x = x0 + cell_w * i as f32;
        draw(rect_corners((x - sw).max(x0), y0, (x + sw).min(x1), y1));
    }
    for j in 0..=rows {
        let y = y0 + cell_h * j as f32;
        draw(rect_corners(x0, (y - sh).max(y0), x1, (y + sh).min(y1)));
    }
}
