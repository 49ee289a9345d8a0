mod common;

use approx::assert_relative_eq;
use image::{DynamicImage, Rgb, RgbImage};

use tileview_core::caps::RenderCapabilities;
use tileview_core::format::{negotiate, TexelLayout, TextureStorage};
use tileview_core::source::{ImageSpec, Linearity, MemoryImage, PixelFormat, Region, SourceImage};
use tileview_core::view::Orientation;
use tileview_core::TileViewError;

use common::{gradient_rgb8, ramp_gray_f32};

// ---------------------------------------------------------------------------
// MemoryImage
// ---------------------------------------------------------------------------

#[test]
fn test_from_raw_checks_length() {
    let spec = ImageSpec::new(4, 4, 3, PixelFormat::U16);
    let err = MemoryImage::from_raw(spec, vec![0; 10]).unwrap_err();
    assert!(matches!(err, TileViewError::BufferTooSmall { needed: 96, got: 10 }));
}

#[test]
fn test_default_channel_names() {
    assert_eq!(ImageSpec::default_channel_names(1), ["Y"]);
    assert_eq!(ImageSpec::default_channel_names(2), ["Y", "A"]);
    assert_eq!(ImageSpec::default_channel_names(4), ["R", "G", "B", "A"]);
    assert_eq!(ImageSpec::default_channel_names(5)[4], "channel4");
}

#[test]
fn test_copy_pixels_converts_format() {
    let image = gradient_rgb8(16, 16);
    let region = Region::new(3, 5, 2, 1);
    let mut out = vec![0u8; 2 * 3 * 2];
    image.copy_pixels(region, PixelFormat::U16, &mut out).unwrap();
    let samples: Vec<u16> = out
        .chunks_exact(2)
        .map(|b| u16::from_ne_bytes([b[0], b[1]]))
        .collect();
    // 8-bit 3 widens to 3 * 257.
    assert_eq!(samples, [771, 1285, 2056, 1028, 1285, 2313]);
}

#[test]
fn test_copy_pixels_rejects_bad_regions() {
    let image = gradient_rgb8(8, 8);
    let mut out = vec![0u8; 1024];
    let outside = image.copy_pixels(Region::new(6, 6, 4, 4), PixelFormat::U8, &mut out);
    assert!(matches!(outside, Err(TileViewError::RegionOutOfBounds { .. })));

    let mut small = vec![0u8; 5];
    let short = image.copy_pixels(Region::new(0, 0, 2, 1), PixelFormat::U8, &mut small);
    assert!(matches!(short, Err(TileViewError::BufferTooSmall { needed: 6, got: 5 })));
}

#[test]
fn test_offset_data_window_uses_absolute_coordinates() {
    let image = gradient_rgb8(8, 8).with_windows(100, 50, Region::new(0, 0, 200, 100));
    let mut px = [0.0f32; 3];
    image.get_pixel(102, 53, &mut px).unwrap();
    assert_relative_eq!(px[0], 2.0 / 255.0);
    assert_relative_eq!(px[1], 3.0 / 255.0);
    assert!(image.get_pixel(2, 3, &mut px).is_err());

    let rows = image.pixel_rows(Region::new(104, 50, 2, 2)).unwrap();
    assert_eq!(rows.row(1)[..3], [4, 1, 5]);
}

#[test]
fn test_float_pixels() {
    let image = ramp_gray_f32(8, 2);
    let mut px = [0.0f32; 1];
    image.get_pixel(6, 1, &mut px).unwrap();
    assert_relative_eq!(px[0], 0.75);

    let mut out = [0u8; 1];
    image.copy_pixels(Region::new(6, 0, 1, 1), PixelFormat::U8, &mut out).unwrap();
    assert_eq!(out[0], 191);
}

#[test]
fn test_channel_names_must_match() {
    let image = gradient_rgb8(2, 2);
    assert!(image.clone().with_channel_names(vec!["X".into()]).is_err());
    let named = image
        .with_channel_names(vec!["L".into(), "a".into(), "b".into()])
        .unwrap();
    assert_eq!(named.spec().channel_names[2], "b");
}

#[test]
fn test_from_dynamic_tags_linearity() {
    let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, Rgb([1, 2, 3])));
    let image = MemoryImage::from_dynamic(rgb).unwrap();
    assert_eq!(image.spec().format, PixelFormat::U8);
    assert_eq!(image.spec().linearity, Linearity::Srgb);
    assert_eq!(image.spec().channel_count(), 3);

    let float = DynamicImage::ImageRgb32F(image::Rgb32FImage::new(2, 2));
    let image = MemoryImage::from_dynamic(float).unwrap();
    assert_eq!(image.spec().format, PixelFormat::F32);
    assert_eq!(image.spec().linearity, Linearity::Linear);
}

#[test]
fn test_open_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gradient.png");
    RgbImage::from_fn(5, 4, |x, y| Rgb([x as u8 * 10, y as u8 * 10, 0]))
        .save(&path)
        .unwrap();

    let image = MemoryImage::open(&path).unwrap();
    assert_eq!((image.spec().width, image.spec().height), (5, 4));
    let mut px = [0.0f32; 3];
    image.get_pixel(4, 3, &mut px).unwrap();
    assert_relative_eq!(px[0], 40.0 / 255.0);
    assert_relative_eq!(px[1], 30.0 / 255.0);
}

#[test]
fn test_oriented_extent_swaps_axes() {
    let mut spec = ImageSpec::new(300, 200, 1, PixelFormat::U8);
    spec.x = 5;
    let ext = spec.oriented(Orientation::Transpose);
    assert_eq!((ext.width, ext.height), (200, 300));
    assert_eq!((ext.x, ext.y), (0, 5));
    let ext = spec.oriented(Orientation::Rotate180);
    assert_eq!((ext.width, ext.height, ext.x), (300, 200, 5));
}

// ---------------------------------------------------------------------------
// Texture format negotiation
// ---------------------------------------------------------------------------

fn all_caps() -> RenderCapabilities {
    RenderCapabilities {
        supports_shading: true,
        supports_shading_via_extension: false,
        supports_srgb: true,
        supports_half_float: true,
        supports_float_textures: true,
        supports_async_transfer_buffers: false,
        max_texture_dimension: 4096,
    }
}

#[test]
fn test_negotiate_native_formats() {
    let caps = all_caps();
    let spec = ImageSpec::new(4, 4, 2, PixelFormat::U16);
    let f = negotiate(&spec, &caps);
    assert_eq!(f.layout, TexelLayout::LuminanceAlpha);
    assert_eq!(f.upload_format, PixelFormat::U16);
    assert_eq!(f.storage, TextureStorage::Unorm16);

    let spec = ImageSpec::new(4, 4, 4, PixelFormat::F16);
    assert_eq!(negotiate(&spec, &caps).storage, TextureStorage::Float16);
}

#[test]
fn test_negotiate_float_without_support() {
    let caps = RenderCapabilities {
        supports_float_textures: false,
        ..all_caps()
    };
    let spec = ImageSpec::new(4, 4, 3, PixelFormat::F32);
    let f = negotiate(&spec, &caps);
    assert_eq!(f.upload_format, PixelFormat::U8);
    assert_eq!(f.storage, TextureStorage::Unorm8);
}

#[test]
fn test_negotiate_srgb_storage() {
    let mut spec = ImageSpec::new(4, 4, 3, PixelFormat::U8);
    spec.linearity = Linearity::Srgb;
    assert_eq!(negotiate(&spec, &all_caps()).storage, TextureStorage::Srgb8);

    let caps = RenderCapabilities {
        supports_srgb: false,
        ..all_caps()
    };
    assert_eq!(negotiate(&spec, &caps).storage, TextureStorage::Unorm8);
}

#[test]
fn test_negotiate_many_channels() {
    let spec = ImageSpec::new(4, 4, 7, PixelFormat::U8);
    let f = negotiate(&spec, &all_caps());
    assert_eq!(f.source_channels, 7);
    assert_eq!(f.layout.channels(), 1);
}
