use tracing::{trace, warn};

use super::transform::{quad_tex_coords, ViewState, ViewTransform};
use crate::backend::{GraphicsBackend, Quad, Viewport};
use crate::color::{ColorParams, ColorStrategy, DisplayParams};
use crate::progress::FrameProgress;
use crate::source::{ImageSpec, Region, SourceImage};
use crate::tiles::{TileCache, TileKey};

/// One tile of the visible set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibleTile {
    pub key: TileKey,
    /// Used fraction of the tile texture: `(used_w / tile_w, used_h / tile_h)`.
    pub tex_max: [f32; 2],
}

/// Tile-aligned window of image coordinates covering the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileWindow {
    pub x_begin: i32,
    pub x_end: i32,
    pub y_begin: i32,
    pub y_end: i32,
}

pub fn visible_window(
    view: &ViewState,
    viewport: Viewport,
    spec: &ImageSpec,
    tile_width: u32,
    tile_height: u32,
) -> TileWindow {
    let mut half_w = (viewport.width as f32 / (2.0 * view.zoom)).ceil() as i32;
    let mut half_h = (viewport.height as f32 / (2.0 * view.zoom)).ceil() as i32;
    if view.orientation.is_transposed() {
        std::mem::swap(&mut half_w, &mut half_h);
    }
    let (rcx, rcy) = view.real_center(spec);
    let (cx, cy) = (rcx.floor() as i32, rcy.floor() as i32);
    let (tw, th) = (tile_width.max(1) as i32, tile_height.max(1) as i32);

    let x_begin = cx - half_w;
    let x_end = cx + half_w;
    let y_begin = cy - half_h;
    let y_end = cy + half_h;

    TileWindow {
        x_begin: (x_begin - x_begin.rem_euclid(tw)).max(spec.x),
        x_end: (x_end + tw - x_end.rem_euclid(tw)).min(spec.x + spec.width as i32),
        y_begin: (y_begin - y_begin.rem_euclid(th)).max(spec.y),
        y_end: (y_end + th - y_end.rem_euclid(th)).min(spec.y + spec.height as i32),
    }
}

/// Tiles needed to cover the viewport, row-major from the top-left of the
/// window.
pub fn visible_tiles(
    view: &ViewState,
    viewport: Viewport,
    spec: &ImageSpec,
    tile_width: u32,
    tile_height: u32,
) -> Vec<VisibleTile> {
    let win = visible_window(view, viewport, spec, tile_width, tile_height);
    let (tw, th) = (tile_width.max(1) as i32, tile_height.max(1) as i32);

    let mut tiles = Vec::new();
    let mut y = win.y_begin;
    while y < win.y_end {
        let h = (win.y_end - y).min(th);
        let mut x = win.x_begin;
        while x < win.x_end {
            let w = (win.x_end - x).min(tw);
            tiles.push(VisibleTile {
                key: Region::new(x, y, w as u32, h as u32),
                tex_max: [w as f32 / tw as f32, h as f32 / th as f32],
            });
            x += tw;
        }
        y += th;
    }
    tiles
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub tiles_total: usize,
    pub tiles_drawn: usize,
    pub tiles_skipped: usize,
}

/// Draw every visible tile of `image`: resolve it through the cache, bind
/// the colour parameters and emit one quad.
#[allow(clippy::too_many_arguments)]
pub fn draw_image(
    backend: &mut dyn GraphicsBackend,
    cache: &mut TileCache,
    pipeline: &dyn ColorStrategy,
    image: &dyn SourceImage,
    view: &ViewState,
    viewport: Viewport,
    display: &DisplayParams,
    progress: &dyn FrameProgress,
) -> FrameReport {
    let spec = image.spec();
    let (tile_width, tile_height) = cache.tile_size();
    let tiles = visible_tiles(view, viewport, spec, tile_width, tile_height);
    let transform = ViewTransform::new(view, spec, viewport);
    let params = ColorParams::new(display, spec.channel_count(), tile_width, tile_height);
    let textures = cache.textures();

    let mut report = FrameReport {
        tiles_total: tiles.len(),
        ..Default::default()
    };
    progress.begin(tiles.len());
    let total = tiles.len().max(1) as f32;

    for (i, tile) in tiles.iter().enumerate() {
        // Tile i reports the share of the frame done once it is resolved.
        let percent = (i + 1) as f32 / total;
        match cache.resolve_tile(backend, image, tile.key, percent, progress) {
            Ok(texture) => {
                pipeline.bind(backend, &params, &textures);
                backend.draw_quad(&Quad::textured(
                    transform.rect_to_window(&tile.key),
                    quad_tex_coords(0.0, 0.0, tile.tex_max[0], tile.tex_max[1], 0),
                    texture,
                ));
                report.tiles_drawn += 1;
            }
            Err(e) => {
                warn!(x = tile.key.x, y = tile.key.y, "Skipping tile: {e}");
                report.tiles_skipped += 1;
            }
        }
    }
    pipeline.unbind(backend);

    trace!(
        tiles = report.tiles_total,
        drawn = report.tiles_drawn,
        skipped = report.tiles_skipped,
        stats = ?cache.stats(),
        "Frame tiles"
    );
    report
}
