//! Texture format negotiation: which layout, storage class and upload type a
//! tile texture gets for a given image on a given driver.

use tracing::warn;

use crate::caps::RenderCapabilities;
use crate::error::{Result, TileViewError};
use crate::source::convert::read_sample;
use crate::source::{ImageSpec, Linearity, PixelFormat};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TexelLayout {
    Luminance,
    LuminanceAlpha,
    Rgb,
    Rgba,
}

impl TexelLayout {
    pub fn for_channels(channels: usize) -> Self {
        match channels {
            2 => Self::LuminanceAlpha,
            3 => Self::Rgb,
            4 => Self::Rgba,
            _ => Self::Luminance,
        }
    }

    pub fn channels(self) -> usize {
        match self {
            Self::Luminance => 1,
            Self::LuminanceAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Expand the first samples of a pixel into RGBA the way the driver
    /// does for this layout.
    pub fn expand(self, samples: &[f32]) -> [f32; 4] {
        match self {
            Self::Luminance => [samples[0], samples[0], samples[0], 1.0],
            Self::LuminanceAlpha => [samples[0], samples[0], samples[0], samples[1]],
            Self::Rgb => [samples[0], samples[1], samples[2], 1.0],
            Self::Rgba => [samples[0], samples[1], samples[2], samples[3]],
        }
    }
}

/// Internal storage class of a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureStorage {
    /// Driver default: 8-bit normalised.
    Default,
    Unorm8,
    Unorm16,
    Float16,
    Float32,
    /// 8-bit sRGB-encoded; sampling decodes to linear.
    Srgb8,
    /// sRGB-encoded at the driver's preferred precision.
    Srgb,
}

impl TextureStorage {
    pub fn is_srgb(self) -> bool {
        matches!(self, Self::Srgb8 | Self::Srgb)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureFormat {
    pub layout: TexelLayout,
    /// Sample type of the data handed to the driver.
    pub upload_format: PixelFormat,
    /// Samples per pixel in the uploaded data. Exceeds
    /// `layout.channels()` when extra channels are skipped.
    pub source_channels: usize,
    pub storage: TextureStorage,
}

impl TextureFormat {
    /// Format of colour-baked texels on the fixed-function path.
    pub const BAKED_RGBA8: Self = Self {
        layout: TexelLayout::Rgba,
        upload_format: PixelFormat::U8,
        source_channels: 4,
        storage: TextureStorage::Unorm8,
    };

    pub fn pixel_bytes(&self) -> usize {
        self.upload_format.bytes() * self.source_channels
    }
}

/// Pick the tile texture format for `spec` on a shading-capable driver.
pub fn negotiate(spec: &ImageSpec, caps: &RenderCapabilities) -> TextureFormat {
    let channels = spec.channel_count();
    if channels > 4 {
        warn!(
            channels,
            "Displaying only the first channel of an image with more than 4 channels"
        );
    }
    let layout = TexelLayout::for_channels(channels);

    let upload_format = match spec.format {
        PixelFormat::F16 if !caps.supports_half_float => {
            warn!("Half-float pixels unsupported by the driver; uploading as 8-bit");
            PixelFormat::U8
        }
        PixelFormat::F16 | PixelFormat::F32 if !caps.supports_float_textures => {
            warn!(format = %spec.format, "Float textures unsupported by the driver; uploading as 8-bit");
            PixelFormat::U8
        }
        other => other,
    };

    let storage = if caps.supports_srgb && spec.linearity == Linearity::Srgb {
        if upload_format == PixelFormat::U8 {
            TextureStorage::Srgb8
        } else {
            TextureStorage::Srgb
        }
    } else {
        match upload_format {
            PixelFormat::U8 => TextureStorage::Unorm8,
            PixelFormat::U16 => TextureStorage::Unorm16,
            PixelFormat::F16 => TextureStorage::Float16,
            PixelFormat::F32 => TextureStorage::Float32,
            _ => TextureStorage::Default,
        }
    };

    TextureFormat {
        layout,
        upload_format,
        source_channels: channels.max(1),
        storage,
    }
}

/// Decode `height` rows of `width` uploaded pixels into RGBA, expanding
/// the layout the way the driver does before storage.
pub fn decode_texels(
    format: &TextureFormat,
    width: u32,
    height: u32,
    row_stride: usize,
    data: &[u8],
) -> Result<Vec<[f32; 4]>> {
    let pixel_bytes = format.pixel_bytes();
    let sample_bytes = format.upload_format.bytes();
    let used = format.layout.channels().min(format.source_channels);
    let row_bytes = width as usize * pixel_bytes;
    let needed = row_stride * (height as usize).saturating_sub(1) + row_bytes;
    if data.len() < needed {
        return Err(TileViewError::BufferTooSmall {
            needed,
            got: data.len(),
        });
    }

    let mut texels = Vec::with_capacity(width as usize * height as usize);
    let mut samples = [0.0f32; 4];
    for y in 0..height as usize {
        let row = &data[y * row_stride..y * row_stride + row_bytes];
        for pixel in row.chunks_exact(pixel_bytes) {
            for (c, s) in samples.iter_mut().enumerate().take(used) {
                *s = read_sample(
                    format.upload_format,
                    &pixel[c * sample_bytes..(c + 1) * sample_bytes],
                );
            }
            texels.push(format.layout.expand(&samples));
        }
    }
    Ok(texels)
}

/// Whether baked texels must be decoded from sRGB so the fixed-function
/// path matches what [`negotiate`] gives the shaded path.
pub fn bake_decodes_srgb(spec: &ImageSpec, caps: &RenderCapabilities) -> bool {
    caps.supports_srgb && spec.linearity == Linearity::Srgb
}
