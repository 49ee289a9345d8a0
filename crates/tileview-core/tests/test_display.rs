mod common;

use approx::assert_relative_eq;

use tileview_core::backend::{SoftwareBackend, SoftwareFeatures};
use tileview_core::color::{ChannelView, DisplayParams, PipelineKind};
use tileview_core::config::{ViewerConfig, ZoomLimits};
use tileview_core::input::{Modifiers, PointerButton};
use tileview_core::source::{ImageSpec, MemoryImage, PixelFormat};
use tileview_core::view::Orientation;
use tileview_core::{DisplaySurface, TileViewError};

use common::{blank_u8, gradient_rgb8, shared, surface_with, RecordingProgress};

fn fixed_config() -> ViewerConfig {
    ViewerConfig {
        force_fixed_function: true,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_redraw_before_context_fails() {
    let mut surface = DisplaySurface::new(SoftwareBackend::default(), ViewerConfig::default());
    assert!(matches!(surface.redraw(), Err(TileViewError::NotReady)));
}

#[test]
fn test_context_ready_is_idempotent() {
    let mut surface = DisplaySurface::new(SoftwareBackend::default(), ViewerConfig::default());
    surface.context_ready().unwrap();
    let created = surface.backend().stats().textures_created;
    surface.context_ready().unwrap();
    assert_eq!(surface.backend().stats().textures_created, created);
    assert_eq!(surface.pipeline_kind(), Some(PipelineKind::Shaded));
}

#[test]
fn test_image_set_before_context_is_configured_later() {
    let mut surface = DisplaySurface::new(SoftwareBackend::default(), ViewerConfig::default());
    surface.resize(64, 64);
    surface.set_image(Some(shared(gradient_rgb8(64, 64)))).unwrap();
    surface.context_ready().unwrap();
    assert_eq!(surface.tile_cache().unwrap().tile_size(), (64, 64));
    assert_eq!(surface.redraw().unwrap().tiles_drawn, 1);
}

#[test]
fn test_empty_surface_draws_nothing() {
    let mut surface = DisplaySurface::new(SoftwareBackend::default(), ViewerConfig::default());
    surface.resize(32, 32);
    surface.context_ready().unwrap();
    let report = surface.redraw().unwrap();
    assert_eq!(report.tiles_total, 0);
    assert!(!surface.needs_redraw());
    assert_relative_eq!(surface.backend().pixel(3, 3)[0], 0.05);
}

#[test]
fn test_zero_area_viewport() {
    let mut surface = surface_with(
        SoftwareFeatures::full(),
        ViewerConfig::default(),
        gradient_rgb8(64, 64),
        0,
        0,
    );
    assert_eq!(surface.redraw().unwrap().tiles_total, 0);
}

#[test]
fn test_zero_channel_image_rejected() {
    let mut surface = surface_with(
        SoftwareFeatures::full(),
        ViewerConfig::default(),
        gradient_rgb8(8, 8),
        8,
        8,
    );
    let spec = ImageSpec::new(4, 4, 0, PixelFormat::U8);
    assert!(MemoryImage::from_raw(spec, Vec::new()).is_err());
    assert!(surface.image().is_some());
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

#[test]
fn test_fixed_and_shaded_paths_agree() {
    let display = DisplayParams {
        channel: ChannelView::Green,
        linear_interpolation: false,
        ..Default::default()
    };
    let mut frames = Vec::new();
    for config in [ViewerConfig::default(), fixed_config()] {
        let mut surface = surface_with(SoftwareFeatures::full(), config, gradient_rgb8(64, 64), 64, 64);
        surface.set_display_params(display);
        surface.redraw().unwrap();
        frames.push(surface.into_backend());
    }
    let (shaded, fixed) = (&frames[0], &frames[1]);

    for y in 0..64 {
        for x in 0..64 {
            let (a, b) = (shaded.pixel(x, y), fixed.pixel(x, y));
            for c in 0..4 {
                assert_relative_eq!(a[c], b[c], epsilon = 1e-6);
            }
        }
    }
    assert_relative_eq!(shaded.pixel(10, 20)[0], 20.0 / 255.0, epsilon = 1e-6);
}

#[test]
fn test_second_frame_reuses_tiles() {
    let mut surface = surface_with(
        SoftwareFeatures::full(),
        ViewerConfig::default(),
        gradient_rgb8(64, 64),
        64,
        64,
    );
    surface.redraw().unwrap();
    let uploads = surface.backend().stats().uploads;
    surface.redraw().unwrap();
    assert_eq!(surface.backend().stats().uploads, uploads);
    assert_eq!(surface.cache_stats().hits, 1);
}

#[test]
fn test_failed_transfer_skips_tile_then_recovers() {
    let mut surface = surface_with(
        SoftwareFeatures::full(),
        ViewerConfig::default(),
        gradient_rgb8(64, 64),
        64,
        64,
    );
    surface.backend_mut().fail_next_transfer_maps(1);

    let report = surface.redraw().unwrap();
    assert_eq!((report.tiles_drawn, report.tiles_skipped), (0, 1));
    assert_relative_eq!(surface.backend().pixel(32, 32)[0], 0.05);

    let report = surface.redraw().unwrap();
    assert_eq!((report.tiles_drawn, report.tiles_skipped), (1, 0));
    assert_relative_eq!(surface.backend().pixel(32, 32)[0], 32.0 / 255.0, epsilon = 1e-6);
}

#[test]
fn test_baked_colour_change_reuploads() {
    let mut surface = surface_with(SoftwareFeatures::full(), fixed_config(), gradient_rgb8(64, 64), 64, 64);
    assert_eq!(surface.pipeline_kind(), Some(PipelineKind::FixedFunction));
    surface.redraw().unwrap();
    let uploads = surface.backend().stats().uploads;

    surface.set_display_params(DisplayParams {
        exposure: 1.0,
        ..Default::default()
    });
    surface.redraw().unwrap();
    assert_eq!(surface.backend().stats().uploads, uploads + 1);
    assert_relative_eq!(surface.backend().pixel(10, 20)[0], 20.0 / 255.0, epsilon = 1e-6);
}

#[test]
fn test_filter_change_keeps_baked_tiles() {
    let mut surface = surface_with(SoftwareFeatures::full(), fixed_config(), gradient_rgb8(64, 64), 64, 64);
    surface.redraw().unwrap();
    let uploads = surface.backend().stats().uploads;

    surface.set_display_params(DisplayParams {
        linear_interpolation: false,
        ..Default::default()
    });
    surface.redraw().unwrap();
    assert_eq!(surface.backend().stats().uploads, uploads);
    let textures = surface.tile_cache().unwrap().textures();
    for t in textures {
        assert_eq!(
            surface.backend().texture_filter(t),
            Some(tileview_core::backend::FilterMode::Nearest)
        );
    }
}

#[test]
fn test_shaded_colour_change_keeps_tiles() {
    let mut surface = surface_with(
        SoftwareFeatures::full(),
        ViewerConfig::default(),
        gradient_rgb8(64, 64),
        64,
        64,
    );
    surface.redraw().unwrap();
    let uploads = surface.backend().stats().uploads;
    surface.set_display_params(DisplayParams {
        exposure: 1.0,
        ..Default::default()
    });
    surface.redraw().unwrap();
    assert_eq!(surface.backend().stats().uploads, uploads);
    assert_relative_eq!(surface.backend().pixel(10, 20)[1], 40.0 / 255.0, epsilon = 1e-6);
}

#[test]
fn test_new_image_clears_tags() {
    let mut surface = surface_with(
        SoftwareFeatures::full(),
        ViewerConfig::default(),
        gradient_rgb8(64, 64),
        64,
        64,
    );
    surface.redraw().unwrap();
    assert!(surface.tile_cache().unwrap().slots()[0].tag.is_some());

    surface.set_image(Some(shared(blank_u8(64, 64, 1)))).unwrap();
    let cache = surface.tile_cache().unwrap();
    assert!(cache.slots().iter().all(|s| s.tag.is_none()));
    assert_eq!(cache.next_victim(), 0);

    surface.redraw().unwrap();
    assert_relative_eq!(surface.backend().pixel(10, 20)[0], 0.0);
}

#[test]
fn test_progress_callbacks() {
    let mut surface = surface_with(
        SoftwareFeatures::full(),
        ViewerConfig::default(),
        gradient_rgb8(64, 64),
        64,
        64,
    );
    let progress = RecordingProgress::default();
    surface.set_progress(Box::new(progress.clone()));

    surface.redraw().unwrap();
    assert_eq!(
        progress.take(),
        ["begin 1", "progress 100", "busy true", "finish", "busy false"]
    );
    surface.redraw().unwrap();
    assert_eq!(progress.take(), ["begin 1", "finish", "busy false"]);
}

#[test]
fn test_progress_follows_row_major_tiles() {
    let config = ViewerConfig {
        max_texture_ceiling: 32,
        ..ViewerConfig::default()
    };
    let mut surface = surface_with(SoftwareFeatures::full(), config, gradient_rgb8(64, 64), 64, 64);
    let progress = RecordingProgress::default();
    surface.set_progress(Box::new(progress.clone()));

    let report = surface.redraw().unwrap();
    assert_eq!(report.tiles_total, 4);

    let events = progress.take();
    assert_eq!(events.first().map(String::as_str), Some("begin 4"));
    let percents: Vec<&str> = events
        .iter()
        .filter(|e| e.starts_with("progress"))
        .map(String::as_str)
        .collect();
    assert_eq!(
        percents,
        ["progress 25", "progress 50", "progress 75", "progress 100"]
    );
}

#[test]
fn test_orientation_rotates_output() {
    let spec = ImageSpec::new(2, 1, 1, PixelFormat::U8);
    let image = MemoryImage::from_raw(spec, vec![0, 255])
        .unwrap()
        .with_orientation(Orientation::Rotate90Cw);
    let mut surface = surface_with(SoftwareFeatures::full(), ViewerConfig::default(), image, 1, 2);
    assert_eq!(surface.view().orientation, Orientation::Rotate90Cw);
    surface.set_display_params(DisplayParams {
        linear_interpolation: false,
        ..Default::default()
    });
    surface.redraw().unwrap();

    // The stored left pixel ends up on top.
    assert_relative_eq!(surface.backend().pixel(0, 0)[0], 0.0);
    assert_relative_eq!(surface.backend().pixel(0, 1)[0], 1.0);
}

// ---------------------------------------------------------------------------
// View changes
// ---------------------------------------------------------------------------

fn large_surface() -> DisplaySurface<SoftwareBackend> {
    let mut surface = surface_with(
        SoftwareFeatures::full(),
        ViewerConfig::default(),
        blank_u8(1000, 1000, 1),
        200,
        200,
    );
    surface.set_view(500.0, 500.0, 1.0, true);
    surface
}

#[test]
fn test_zoom_about_keeps_point_fixed() {
    let mut surface = large_surface();
    surface.zoom_about([150.0, 100.0], 2.0);
    let v = surface.view();
    assert_relative_eq!(v.zoom, 2.0);
    assert_relative_eq!(v.center_x, 525.0);
    assert_relative_eq!(v.center_y, 500.0);
}

#[test]
fn test_zoom_is_clamped() {
    let mut surface = large_surface();
    surface.set_zoom(1e9);
    assert_relative_eq!(surface.view().zoom, 256.0);
    surface.set_zoom(0.0);
    assert_relative_eq!(surface.view().zoom, 0.01);
}

#[test]
fn test_pan_is_clamped_to_image() {
    let mut surface = large_surface();
    surface.pan(-10_000.0, 250.0);
    assert_relative_eq!(surface.view().center_x, 100.0);
    assert_relative_eq!(surface.view().center_y, 750.0);
}

#[test]
fn test_fit_to_window() {
    let mut surface = surface_with(
        SoftwareFeatures::full(),
        ViewerConfig::default(),
        blank_u8(400, 200, 3),
        200,
        200,
    );
    surface.fit_to_window();
    let v = surface.view();
    assert_relative_eq!(v.zoom, 0.5);
    assert_relative_eq!(v.center_x, 200.0);
    assert_relative_eq!(v.center_y, 100.0);
}

#[test]
fn test_click_and_wheel_zoom() {
    let mut surface = large_surface();
    surface.pointer_pressed([100.0, 100.0], PointerButton::Primary, Modifiers::NONE);
    surface.pointer_released([100.0, 100.0]);
    assert_relative_eq!(surface.view().zoom, 2.0);

    surface.pointer_pressed([100.0, 100.0], PointerButton::Secondary, Modifiers::NONE);
    surface.pointer_released([100.0, 100.0]);
    assert_relative_eq!(surface.view().zoom, 1.0);

    surface.wheel(120.0);
    assert_relative_eq!(surface.view().zoom, 1.075, epsilon = 1e-6);
}

#[test]
fn test_middle_drag_pans_view() {
    let mut surface = large_surface();
    surface.pointer_pressed([100.0, 100.0], PointerButton::Middle, Modifiers::NONE);
    surface.pointer_moved([90.0, 120.0], Modifiers::NONE);
    surface.pointer_released([90.0, 120.0]);
    assert_relative_eq!(surface.view().center_x, 510.0);
    assert_relative_eq!(surface.view().center_y, 480.0);
}

#[test]
fn test_unvalidated_zoom_limits_do_not_panic() {
    let config = ViewerConfig {
        zoom: ZoomLimits { min: 4.0, max: 2.0 },
        ..ViewerConfig::default()
    };
    let mut surface = surface_with(SoftwareFeatures::full(), config, gradient_rgb8(64, 64), 64, 64);
    surface.set_view(32.0, 32.0, 1.0, true);
    assert_relative_eq!(surface.view().zoom, 2.0);
    surface.wheel(120.0);
    assert_relative_eq!(surface.view().zoom, 2.0);
    surface.redraw().unwrap();
}
