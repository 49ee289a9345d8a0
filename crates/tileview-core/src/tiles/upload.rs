use crate::color::reference::apply_color;
use crate::color::ColorParams;
use crate::error::Result;
use crate::format::TexelLayout;
use crate::source::convert::{read_sample, srgb_to_linear};
use crate::source::{PixelRows, Region, SourceImage};

/// Colour settings baked into texels on the fixed-function path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BakeSettings {
    pub params: ColorParams,
    /// Decode sRGB-encoded samples before applying colour.
    pub decode_srgb: bool,
}

/// Fill `out` with tightly packed RGBA8 texels for `region`, with colour
/// applied. Pixels come from the source's row access when available,
/// otherwise through `scratch`. Returns the number of source bytes read.
pub fn bake_region(
    image: &dyn SourceImage,
    region: Region,
    settings: &BakeSettings,
    scratch: &mut Vec<u8>,
    out: &mut Vec<u8>,
) -> Result<usize> {
    let spec = image.spec();
    let pixel_bytes = spec.pixel_bytes();
    let rows = match image.pixel_rows(region) {
        Some(rows) => rows,
        None => {
            scratch.resize(region.area() * pixel_bytes, 0);
            image.copy_pixels(region, spec.format, scratch)?;
            PixelRows {
                data: scratch,
                row_stride: region.width as usize * pixel_bytes,
                width: region.width,
                height: region.height,
                format: spec.format,
                channels: spec.channel_count(),
            }
        }
    };

    let layout = TexelLayout::for_channels(rows.channels);
    let used = layout.channels();
    let sample_bytes = rows.format.bytes();
    let mut samples = [0.0f32; 4];

    out.clear();
    out.reserve(region.area() * 4);
    for y in 0..rows.height as usize {
        for pixel in rows.row(y).chunks_exact(pixel_bytes) {
            for (c, s) in samples.iter_mut().enumerate().take(used) {
                *s = read_sample(rows.format, &pixel[c * sample_bytes..(c + 1) * sample_bytes]);
            }
            let mut texel = layout.expand(&samples);
            if settings.decode_srgb {
                for v in &mut texel[..3] {
                    *v = srgb_to_linear(v.clamp(0.0, 1.0));
                }
            }
            let shown = apply_color(texel, &settings.params);
            out.extend(shown.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8));
        }
    }
    Ok(region.area() * pixel_bytes)
}
