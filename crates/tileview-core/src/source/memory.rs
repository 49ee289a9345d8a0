use std::path::Path;

use image::DynamicImage;
use tracing::debug;

use super::convert::{convert_samples, read_sample};
use super::spec::{ImageSpec, Linearity, PixelFormat, Region};
use super::{PixelRows, SourceImage};
use crate::error::{Result, TileViewError};
use crate::view::Orientation;

/// Fully resident image: one contiguous buffer of native samples covering
/// the data window.
#[derive(Clone, Debug)]
pub struct MemoryImage {
    spec: ImageSpec,
    data: Vec<u8>,
}

impl MemoryImage {
    /// Wrap native pixel data. `data` must hold exactly
    /// `width * height * channels` samples of `spec.format`.
    pub fn from_raw(spec: ImageSpec, data: Vec<u8>) -> Result<Self> {
        if spec.width == 0 || spec.height == 0 {
            return Err(TileViewError::InvalidDimensions {
                width: spec.width,
                height: spec.height,
            });
        }
        if spec.channel_count() == 0 {
            return Err(TileViewError::UnsupportedChannels(0));
        }
        let needed = spec.width as usize * spec.height as usize * spec.pixel_bytes();
        if data.len() != needed {
            return Err(TileViewError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self { spec, data })
    }

    /// Build from f32 samples, stored as `F32`.
    pub fn from_f32(width: u32, height: u32, channels: usize, samples: &[f32]) -> Result<Self> {
        let spec = ImageSpec::new(width, height, channels, PixelFormat::F32);
        Self::from_raw(spec, bytemuck::cast_slice(samples).to_vec())
    }

    /// Take over a decoded image. 8- and 16-bit images are tagged sRGB,
    /// float images linear.
    pub fn from_dynamic(img: DynamicImage) -> Result<Self> {
        let (width, height) = (img.width(), img.height());
        let (channels, format, data) = match img {
            DynamicImage::ImageLuma8(buf) => (1, PixelFormat::U8, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => (2, PixelFormat::U8, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (3, PixelFormat::U8, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (4, PixelFormat::U8, buf.into_raw()),
            DynamicImage::ImageLuma16(buf) => (1, PixelFormat::U16, u16_bytes(&buf.into_raw())),
            DynamicImage::ImageLumaA16(buf) => (2, PixelFormat::U16, u16_bytes(&buf.into_raw())),
            DynamicImage::ImageRgb16(buf) => (3, PixelFormat::U16, u16_bytes(&buf.into_raw())),
            DynamicImage::ImageRgba16(buf) => (4, PixelFormat::U16, u16_bytes(&buf.into_raw())),
            DynamicImage::ImageRgb32F(buf) => (3, PixelFormat::F32, f32_bytes(&buf.into_raw())),
            DynamicImage::ImageRgba32F(buf) => (4, PixelFormat::F32, f32_bytes(&buf.into_raw())),
            other => (
                4,
                PixelFormat::F32,
                f32_bytes(&other.into_rgba32f().into_raw()),
            ),
        };

        let mut spec = ImageSpec::new(width, height, channels, format);
        spec.linearity = if format.is_float() {
            Linearity::Linear
        } else {
            Linearity::Srgb
        };
        Self::from_raw(spec, data)
    }

    /// Decode a file with the `image` crate.
    pub fn open(path: &Path) -> Result<Self> {
        let img = image::open(path)?;
        debug!(
            path = %path.display(),
            width = img.width(),
            height = img.height(),
            "Decoded image"
        );
        Self::from_dynamic(img)
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.spec.orientation = orientation;
        self
    }

    pub fn with_linearity(mut self, linearity: Linearity) -> Self {
        self.spec.linearity = linearity;
        self
    }

    /// Move the data window to `(x, y)` and set the display window.
    pub fn with_windows(mut self, x: i32, y: i32, full: Region) -> Self {
        self.spec.x = x;
        self.spec.y = y;
        self.spec.full_x = full.x;
        self.spec.full_y = full.y;
        self.spec.full_width = full.width;
        self.spec.full_height = full.height;
        self
    }

    pub fn with_channel_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.spec.channel_count() {
            return Err(TileViewError::UnsupportedChannels(names.len()));
        }
        self.spec.channel_names = names;
        Ok(self)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn row_stride(&self) -> usize {
        self.spec.width as usize * self.spec.pixel_bytes()
    }

    fn offset_of(&self, x: i32, y: i32) -> usize {
        let col = (x - self.spec.x) as usize;
        let row = (y - self.spec.y) as usize;
        row * self.row_stride() + col * self.spec.pixel_bytes()
    }

    fn check_region(&self, region: Region) -> Result<()> {
        if region.is_empty() || !self.spec.data_window().contains_region(&region) {
            return Err(TileViewError::RegionOutOfBounds {
                x: region.x,
                y: region.y,
                width: region.width,
                height: region.height,
            });
        }
        Ok(())
    }
}

impl SourceImage for MemoryImage {
    fn spec(&self) -> &ImageSpec {
        &self.spec
    }

    fn copy_pixels(&self, region: Region, format: PixelFormat, dst: &mut [u8]) -> Result<()> {
        self.check_region(region)?;
        let channels = self.spec.channel_count();
        let src_row_bytes = region.width as usize * self.spec.pixel_bytes();
        let dst_row_bytes = region.width as usize * channels * format.bytes();
        let needed = dst_row_bytes * region.height as usize;
        if dst.len() < needed {
            return Err(TileViewError::BufferTooSmall {
                needed,
                got: dst.len(),
            });
        }

        for row in 0..region.height as usize {
            let start = self.offset_of(region.x, region.y + row as i32);
            let src = &self.data[start..start + src_row_bytes];
            let out = &mut dst[row * dst_row_bytes..(row + 1) * dst_row_bytes];
            convert_samples(
                src,
                self.spec.format,
                out,
                format,
                region.width as usize * channels,
            );
        }
        Ok(())
    }

    fn pixel_rows(&self, region: Region) -> Option<PixelRows<'_>> {
        self.check_region(region).ok()?;
        let start = self.offset_of(region.x, region.y);
        Some(PixelRows {
            data: &self.data[start..],
            row_stride: self.row_stride(),
            width: region.width,
            height: region.height,
            format: self.spec.format,
            channels: self.spec.channel_count(),
        })
    }

    fn get_pixel(&self, x: i32, y: i32, out: &mut [f32]) -> Result<()> {
        if !self.spec.data_window().contains_point(x, y) {
            return Err(TileViewError::RegionOutOfBounds {
                x,
                y,
                width: 1,
                height: 1,
            });
        }
        let start = self.offset_of(x, y);
        let sb = self.spec.format.bytes();
        let pixel = &self.data[start..start + self.spec.pixel_bytes()];
        for (value, sample) in out.iter_mut().zip(pixel.chunks_exact(sb)) {
            *value = read_sample(self.spec.format, sample);
        }
        Ok(())
    }
}

fn u16_bytes(samples: &[u16]) -> Vec<u8> {
    bytemuck::cast_slice(samples).to_vec()
}

fn f32_bytes(samples: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(samples).to_vec()
}
