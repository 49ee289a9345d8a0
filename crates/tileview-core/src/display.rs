use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::{GraphicsBackend, Viewport};
use crate::caps::{probe, RenderCapabilities};
use crate::color::{self, ColorPipeline, DisplayParams, PipelineKind};
use crate::config::ViewerConfig;
use crate::error::{Result, TileViewError};
use crate::input::{InputAction, InputController, Modifiers, MouseMode, PointerButton};
use crate::inspector::PixelInspector;
use crate::progress::{FrameProgress, NoOpProgress};
use crate::source::SourceImage;
use crate::tiles::{CacheStats, TileCache};
use crate::view::{draw_image, visible_tiles, FrameReport, Orientation, ViewState, VisibleTile};

/// State created once the graphics context exists.
struct Runtime {
    caps: RenderCapabilities,
    pipeline: ColorPipeline,
    cache: TileCache,
}

/// An interactive view of one image on a graphics backend.
///
/// Owns the tile pool, the inspector texture, the view and input state.
/// The image itself is shared with whoever loaded it.
pub struct DisplaySurface<B: GraphicsBackend> {
    backend: B,
    config: ViewerConfig,
    runtime: Option<Runtime>,
    image: Option<Arc<dyn SourceImage>>,
    display: DisplayParams,
    view: ViewState,
    viewport: Viewport,
    input: InputController,
    inspector: PixelInspector,
    progress: Box<dyn FrameProgress>,
    needs_redraw: bool,
    last_frame: FrameReport,
}

impl<B: GraphicsBackend> DisplaySurface<B> {
    pub fn new(backend: B, config: ViewerConfig) -> Self {
        Self {
            backend,
            input: InputController::new(config.zoom),
            inspector: PixelInspector::new(config.inspector.clone()),
            config,
            runtime: None,
            image: None,
            display: DisplayParams::default(),
            view: ViewState::default(),
            viewport: Viewport::default(),
            progress: Box::new(NoOpProgress),
            needs_redraw: true,
            last_frame: FrameReport::default(),
        }
    }

    pub fn set_progress(&mut self, progress: Box<dyn FrameProgress>) {
        self.progress = progress;
    }

    // -- lifecycle -----------------------------------------------------------

    /// Probe the backend and allocate GPU state. Safe to call repeatedly;
    /// only the first call does work.
    pub fn context_ready(&mut self) -> Result<&RenderCapabilities> {
        if self.runtime.is_none() {
            let caps = probe(&self.backend, &self.config);
            let cache = TileCache::new(&mut self.backend, self.config.tile_pool_size)?;
            self.inspector.create_texture(&mut self.backend)?;
            let pipeline = color::build(&mut self.backend, &caps);
            info!(
                backend = self.backend.name(),
                pipeline = %pipeline.kind(),
                max_texture = caps.max_texture_dimension,
                "Display surface ready"
            );
            self.runtime = Some(Runtime {
                caps,
                pipeline,
                cache,
            });
            self.configure_image()?;
            self.needs_redraw = true;
        }
        self.runtime
            .as_ref()
            .map(|rt| &rt.caps)
            .ok_or(TileViewError::NotReady)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
        self.clamp_view();
        self.needs_redraw = true;
    }

    /// Draw a frame: visible tiles, then the inspector overlay.
    pub fn redraw(&mut self) -> Result<FrameReport> {
        let rt = self.runtime.as_mut().ok_or(TileViewError::NotReady)?;
        self.backend.begin_frame(self.viewport, self.config.clear_color);

        let mut report = FrameReport::default();
        let has_area = self.viewport.width > 0 && self.viewport.height > 0;
        if let Some(image) = self.image.as_ref().filter(|_| has_area) {
            report = draw_image(
                &mut self.backend,
                &mut rt.cache,
                rt.pipeline.as_ref(),
                image.as_ref(),
                &self.view,
                self.viewport,
                &self.display,
                self.progress.as_ref(),
            );
            if self.inspector.is_enabled() {
                if let Err(e) = self.inspector.paint(
                    &mut self.backend,
                    image.as_ref(),
                    &self.view,
                    self.viewport,
                    rt.pipeline.as_ref(),
                    &rt.cache,
                    &self.display,
                ) {
                    warn!("Pixel view not drawn: {e}");
                }
            }
        }

        self.progress.finish();
        self.progress.set_busy(false);
        self.backend.end_frame()?;
        self.needs_redraw = false;
        self.last_frame = report;
        Ok(report)
    }

    // -- image and colour ----------------------------------------------------

    /// Show `image`, or nothing. Reallocates the tile pool and clears every
    /// tag before any tile of the new image is resolved.
    pub fn set_image(&mut self, image: Option<Arc<dyn SourceImage>>) -> Result<()> {
        if let Some(img) = &image {
            let spec = img.spec();
            if spec.width == 0 || spec.height == 0 {
                return Err(TileViewError::InvalidDimensions {
                    width: spec.width,
                    height: spec.height,
                });
            }
            if spec.channel_count() == 0 {
                return Err(TileViewError::UnsupportedChannels(0));
            }
            self.view.orientation = spec.orientation;
            debug!(
                width = spec.width,
                height = spec.height,
                channels = spec.channel_count(),
                format = %spec.format,
                orientation = %spec.orientation,
                "Displaying image"
            );
        }
        self.image = image;
        if let Err(e) = self.configure_image() {
            self.image = None;
            return Err(e);
        }
        self.clamp_view();
        self.needs_redraw = true;
        Ok(())
    }

    fn configure_image(&mut self) -> Result<()> {
        let (Some(rt), Some(image)) = (self.runtime.as_mut(), self.image.as_ref()) else {
            return Ok(());
        };
        let bakes = rt.pipeline.bakes_color();
        rt.cache
            .configure(&mut self.backend, image.as_ref(), &rt.caps, bakes, &self.display)?;
        self.inspector
            .configure(&mut self.backend, image.spec(), &rt.caps, bakes)?;
        Ok(())
    }

    pub fn set_display_params(&mut self, params: DisplayParams) {
        self.display = params;
        if let Some(rt) = &mut self.runtime {
            if rt.cache.update_bake(&params) {
                debug!("Colour change invalidated baked tiles");
            }
        }
        self.needs_redraw = true;
    }

    /// Override the image's orientation tag.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.view.orientation = orientation;
        self.clamp_view();
        self.needs_redraw = true;
    }

    // -- view ----------------------------------------------------------------

    pub fn set_view(&mut self, center_x: f32, center_y: f32, zoom: f32, redraw: bool) {
        self.view.center_x = center_x;
        self.view.center_y = center_y;
        self.view.zoom = self.config.zoom.clamp(zoom);
        self.clamp_view();
        if redraw {
            self.needs_redraw = true;
        }
    }

    /// Move the centre by `(dx, dy)` image pixels.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let v = self.view;
        self.set_view(v.center_x + dx, v.center_y + dy, v.zoom, true);
    }

    /// Change the zoom, keeping the centre.
    pub fn set_zoom(&mut self, zoom: f32) {
        let v = self.view;
        self.set_view(v.center_x, v.center_y, zoom, true);
    }

    /// Change the zoom, keeping the image point under window position `at`
    /// in place.
    pub fn zoom_about(&mut self, at: [f32; 2], zoom: f32) {
        let zoom = self.config.zoom.clamp(zoom);
        let [wcx, wcy] = self.viewport.center();
        let v = self.view;
        let px = v.center_x + (at[0] - wcx) / v.zoom;
        let py = v.center_y + (at[1] - wcy) / v.zoom;
        self.set_view(px - (at[0] - wcx) / zoom, py - (at[1] - wcy) / zoom, zoom, true);
    }

    pub fn zoom_in_at(&mut self, at: [f32; 2]) {
        self.zoom_about(at, self.view.zoom * 2.0);
    }

    pub fn zoom_out_at(&mut self, at: [f32; 2]) {
        self.zoom_about(at, self.view.zoom * 0.5);
    }

    /// Largest zoom showing the whole display window, centred.
    pub fn fit_to_window(&mut self) {
        let Some(image) = &self.image else {
            return;
        };
        let ext = image.spec().oriented(self.view.orientation);
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return;
        }
        let zoom = (self.viewport.width as f32 / ext.full_width.max(1) as f32)
            .min(self.viewport.height as f32 / ext.full_height.max(1) as f32);
        let cx = ext.full_x as f32 + ext.full_width as f32 * 0.5;
        let cy = ext.full_y as f32 + ext.full_height as f32 * 0.5;
        self.set_view(cx, cy, zoom, true);
    }

    fn clamp_view(&mut self) {
        if let Some(image) = &self.image {
            self.view.clamp_to_window(image.spec(), self.viewport);
        }
    }

    // -- input ---------------------------------------------------------------

    pub fn set_mouse_mode(&mut self, mode: MouseMode) {
        self.input.set_mode(mode);
    }

    pub fn pointer_pressed(&mut self, pos: [f32; 2], button: PointerButton, mods: Modifiers) {
        let action = self.input.press(pos, button, mods);
        self.apply(action);
    }

    pub fn pointer_moved(&mut self, pos: [f32; 2], mods: Modifiers) {
        let action = self.input.motion(pos, mods, self.view.zoom);
        self.apply(action);
        if self.inspector.is_enabled() {
            self.inspector.refresh(pos, &self.view, self.viewport);
            self.needs_redraw = true;
        }
    }

    pub fn pointer_released(&mut self, pos: [f32; 2]) {
        self.input.release(pos);
    }

    /// Wheel rotated by `delta` units (120 per notch).
    pub fn wheel(&mut self, delta: f32) {
        let action = self.input.wheel(delta, self.view.zoom);
        self.apply(action);
    }

    fn apply(&mut self, action: InputAction) {
        match action {
            InputAction::None => {}
            InputAction::ZoomIn { at } => self.zoom_in_at(at),
            InputAction::ZoomOut { at } => self.zoom_out_at(at),
            InputAction::Pan { dx, dy } => self.pan(dx, dy),
            InputAction::SetZoom(zoom) => self.set_zoom(zoom),
        }
    }

    pub fn set_inspector(&mut self, enabled: bool, follows_mouse: bool) {
        self.inspector.set_enabled(enabled, follows_mouse);
        if enabled {
            self.inspector
                .refresh(self.input.last_position(), &self.view, self.viewport);
        }
        self.needs_redraw = true;
    }

    // -- accessors -----------------------------------------------------------

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Option<&RenderCapabilities> {
        self.runtime.as_ref().map(|rt| &rt.caps)
    }

    pub fn pipeline_kind(&self) -> Option<PipelineKind> {
        self.runtime.as_ref().map(|rt| rt.pipeline.kind())
    }

    pub fn tile_cache(&self) -> Option<&TileCache> {
        self.runtime.as_ref().map(|rt| &rt.cache)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.runtime
            .as_ref()
            .map(|rt| rt.cache.stats())
            .unwrap_or_default()
    }

    /// Tiles the current view needs.
    pub fn visible_tiles(&self) -> Vec<VisibleTile> {
        match (&self.runtime, &self.image) {
            (Some(rt), Some(image)) => {
                let (tw, th) = rt.cache.tile_size();
                visible_tiles(&self.view, self.viewport, image.spec(), tw, th)
            }
            _ => Vec::new(),
        }
    }

    pub fn image(&self) -> Option<&Arc<dyn SourceImage>> {
        self.image.as_ref()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn display_params(&self) -> &DisplayParams {
        &self.display
    }

    pub fn mouse_mode(&self) -> MouseMode {
        self.input.mode()
    }

    pub fn inspector(&self) -> &PixelInspector {
        &self.inspector
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn last_frame(&self) -> FrameReport {
        self.last_frame
    }
}
