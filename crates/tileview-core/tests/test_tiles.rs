mod common;

use tileview_core::backend::{GraphicsBackend, SoftwareBackend, SoftwareFeatures};
use tileview_core::caps::RenderCapabilities;
use tileview_core::color::{ChannelView, DisplayParams};
use tileview_core::progress::NoOpProgress;
use tileview_core::source::{MemoryImage, Region};
use tileview_core::tiles::TileCache;
use tileview_core::TileViewError;

use common::{gradient_rgb8, RecordingProgress};

fn caps(max_texture_dimension: u32, transfer_buffers: bool) -> RenderCapabilities {
    RenderCapabilities {
        supports_shading: true,
        supports_shading_via_extension: false,
        supports_srgb: true,
        supports_half_float: true,
        supports_float_textures: true,
        supports_async_transfer_buffers: transfer_buffers,
        max_texture_dimension,
    }
}

/// Pool of `slots` 4×4 tiles over an 8×8 gradient.
fn setup(slots: usize, transfer_buffers: bool, bakes: bool) -> (SoftwareBackend, TileCache, MemoryImage) {
    let mut backend = SoftwareBackend::new(SoftwareFeatures::full());
    let image = gradient_rgb8(8, 8);
    let mut cache = TileCache::new(&mut backend, slots).unwrap();
    cache
        .configure(
            &mut backend,
            &image,
            &caps(4, transfer_buffers),
            bakes,
            &DisplayParams::default(),
        )
        .unwrap();
    (backend, cache, image)
}

const A: Region = Region { x: 0, y: 0, width: 4, height: 4 };
const B: Region = Region { x: 4, y: 0, width: 4, height: 4 };
const C: Region = Region { x: 0, y: 4, width: 4, height: 4 };

// ---------------------------------------------------------------------------
// Residency and replacement
// ---------------------------------------------------------------------------

#[test]
fn test_configure_sizes_tiles_and_clears_tags() {
    let (backend, cache, _) = setup(3, false, false);
    assert_eq!(cache.tile_size(), (4, 4));
    assert_eq!(cache.slots().len(), 3);
    assert!(cache.slots().iter().all(|s| s.tag.is_none()));
    for texture in cache.textures() {
        let desc = backend.texture_desc(texture).unwrap();
        assert_eq!((desc.width, desc.height), (4, 4));
    }
}

#[test]
fn test_hit_does_not_upload() {
    let (mut backend, mut cache, image) = setup(2, false, false);
    let first = cache.resolve_tile(&mut backend, &image, A, 0.0, &NoOpProgress).unwrap();
    let uploads = backend.stats().uploads;

    let again = cache.resolve_tile(&mut backend, &image, A, 0.5, &NoOpProgress).unwrap();
    assert_eq!(first, again);
    assert_eq!(backend.stats().uploads, uploads);
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn test_round_robin_replacement() {
    let (mut backend, mut cache, image) = setup(2, false, false);
    let ta = cache.resolve_tile(&mut backend, &image, A, 0.0, &NoOpProgress).unwrap();
    let tb = cache.resolve_tile(&mut backend, &image, B, 0.0, &NoOpProgress).unwrap();
    assert_ne!(ta, tb);
    assert_eq!(cache.next_victim(), 0);

    // C evicts A, the oldest slot.
    let tc = cache.resolve_tile(&mut backend, &image, C, 0.0, &NoOpProgress).unwrap();
    assert_eq!(tc, ta);
    assert_eq!(cache.lookup(&A), None);
    assert_eq!(cache.lookup(&B), Some(1));
    assert_eq!(cache.lookup(&C), Some(0));

    // A comes back into slot 1 even though B was used more recently.
    cache.resolve_tile(&mut backend, &image, B, 0.0, &NoOpProgress).unwrap();
    let ta2 = cache.resolve_tile(&mut backend, &image, A, 0.0, &NoOpProgress).unwrap();
    assert_eq!(ta2, tb);
    assert_eq!(cache.lookup(&B), None);
}

#[test]
fn test_at_most_one_slot_per_key() {
    let (mut backend, mut cache, image) = setup(4, false, false);
    for key in [A, B, A, C, B, A, C] {
        cache.resolve_tile(&mut backend, &image, key, 0.0, &NoOpProgress).unwrap();
    }
    for key in [A, B, C] {
        let n = cache.slots().iter().filter(|s| s.tag == Some(key)).count();
        assert_eq!(n, 1);
    }
    assert_eq!(cache.stats().uploads, 3);
}

#[test]
fn test_reconfigure_resets_pool() {
    let (mut backend, mut cache, image) = setup(2, false, false);
    cache.resolve_tile(&mut backend, &image, A, 0.0, &NoOpProgress).unwrap();
    assert_eq!(cache.next_victim(), 1);

    cache
        .configure(&mut backend, &image, &caps(8, false), false, &DisplayParams::default())
        .unwrap();
    assert_eq!(cache.tile_size(), (8, 8));
    assert_eq!(cache.next_victim(), 0);
    assert_eq!(cache.lookup(&A), None);
}

#[test]
fn test_oversized_key_rejected() {
    let (mut backend, mut cache, image) = setup(2, false, false);
    let key = Region::new(0, 0, 5, 4);
    let err = cache
        .resolve_tile(&mut backend, &image, key, 0.0, &NoOpProgress)
        .unwrap_err();
    assert!(matches!(err, TileViewError::RegionOutOfBounds { .. }));
    assert_eq!(cache.next_victim(), 0);
}

// ---------------------------------------------------------------------------
// Upload paths
// ---------------------------------------------------------------------------

#[test]
fn test_staging_upload_contents() {
    let (mut backend, mut cache, image) = setup(2, false, false);
    let texture = cache.resolve_tile(&mut backend, &image, B, 0.0, &NoOpProgress).unwrap();
    // Texel (1, 2) of tile B is image pixel (5, 2).
    let texel = backend.texel(texture, 1, 2).unwrap();
    assert_eq!(texel, [5.0 / 255.0, 2.0 / 255.0, 7.0 / 255.0, 1.0]);
}

#[test]
fn test_partial_edge_tile_fills_top_left() {
    let mut backend = SoftwareBackend::new(SoftwareFeatures::full());
    let image = gradient_rgb8(6, 6);
    let mut cache = TileCache::new(&mut backend, 2).unwrap();
    cache
        .configure(&mut backend, &image, &caps(4, false), false, &DisplayParams::default())
        .unwrap();
    let key = Region::new(4, 4, 2, 2);
    let texture = cache.resolve_tile(&mut backend, &image, key, 0.0, &NoOpProgress).unwrap();
    assert_eq!(backend.texel(texture, 1, 1).unwrap()[0], 5.0 / 255.0);
    assert_eq!(backend.stats().texels_uploaded, 4);
}

#[test]
fn test_transfer_buffer_upload() {
    let (mut backend, mut cache, image) = setup(2, true, false);
    let texture = cache.resolve_tile(&mut backend, &image, A, 0.0, &NoOpProgress).unwrap();
    assert_eq!(backend.stats().transfer_maps, 1);
    assert_eq!(backend.texel(texture, 3, 3).unwrap()[2], 6.0 / 255.0);

    cache.resolve_tile(&mut backend, &image, B, 0.0, &NoOpProgress).unwrap();
    assert_eq!(backend.stats().transfer_maps, 2);
}

#[test]
fn test_failed_transfer_map_leaves_slot_untagged() {
    let (mut backend, mut cache, image) = setup(2, true, false);
    backend.fail_next_transfer_maps(1);

    let err = cache
        .resolve_tile(&mut backend, &image, A, 0.0, &NoOpProgress)
        .unwrap_err();
    assert!(matches!(err, TileViewError::TransferMap { .. }));
    assert_eq!(cache.lookup(&A), None);
    assert_eq!(cache.next_victim(), 0);
    assert_eq!(cache.stats().failed_uploads, 1);

    // The next attempt retries and succeeds.
    cache.resolve_tile(&mut backend, &image, A, 0.0, &NoOpProgress).unwrap();
    assert_eq!(cache.lookup(&A), Some(0));
    assert_eq!(cache.stats().uploads, 1);
}

#[test]
fn test_progress_reported_only_on_miss() {
    let (mut backend, mut cache, image) = setup(2, false, false);
    let progress = RecordingProgress::default();

    cache.resolve_tile(&mut backend, &image, A, 0.5, &progress).unwrap();
    assert_eq!(progress.take(), vec!["progress 50", "busy true"]);

    cache.resolve_tile(&mut backend, &image, A, 0.75, &progress).unwrap();
    assert!(progress.take().is_empty());
}

// ---------------------------------------------------------------------------
// Baked colour
// ---------------------------------------------------------------------------

#[test]
fn test_baked_tiles_carry_colour() {
    let mut backend = SoftwareBackend::new(SoftwareFeatures::legacy());
    let image = gradient_rgb8(8, 8);
    let mut cache = TileCache::new(&mut backend, 2).unwrap();
    let display = DisplayParams {
        channel: ChannelView::Green,
        ..Default::default()
    };
    cache
        .configure(&mut backend, &image, &RenderCapabilities::legacy(4), true, &display)
        .unwrap();
    assert!(cache.bakes_color());

    let texture = cache.resolve_tile(&mut backend, &image, C, 0.0, &NoOpProgress).unwrap();
    // Pixel (2, 5) isolated to green shows 5/255 on every channel.
    let texel = backend.texel(texture, 2, 1).unwrap();
    let g = 5.0 / 255.0;
    assert_eq!(texel, [g, g, g, 1.0]);
}

#[test]
fn test_bake_invalidated_by_colour_change_only() {
    let (mut backend, mut cache, image) = setup(2, false, true);
    cache.resolve_tile(&mut backend, &image, A, 0.0, &NoOpProgress).unwrap();

    let filter_only = DisplayParams {
        linear_interpolation: false,
        ..Default::default()
    };
    assert!(!cache.update_bake(&filter_only));
    assert_eq!(cache.lookup(&A), Some(0));

    let brighter = DisplayParams {
        exposure: 1.0,
        ..filter_only
    };
    assert!(cache.update_bake(&brighter));
    assert_eq!(cache.lookup(&A), None);
}

#[test]
fn test_unbaked_cache_ignores_colour_change() {
    let (mut backend, mut cache, image) = setup(2, false, false);
    cache.resolve_tile(&mut backend, &image, A, 0.0, &NoOpProgress).unwrap();
    let changed = DisplayParams {
        gamma: 2.2,
        ..Default::default()
    };
    assert!(!cache.update_bake(&changed));
    assert_eq!(cache.lookup(&A), Some(0));
    assert_eq!(backend.name(), "software");
}
