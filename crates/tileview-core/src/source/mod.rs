pub mod convert;
pub mod memory;
pub mod spec;

pub use memory::MemoryImage;
pub use spec::{ImageSpec, Linearity, OrientedExtent, PixelFormat, Region};

use crate::error::Result;

/// Borrowed view of a rectangle of native pixels.
#[derive(Clone, Copy, Debug)]
pub struct PixelRows<'a> {
    /// Starts at the first pixel of the region.
    pub data: &'a [u8],
    /// Bytes between the starts of consecutive rows.
    pub row_stride: usize,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub channels: usize,
}

impl<'a> PixelRows<'a> {
    /// The `width` pixels of row `y` of the region.
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.row_stride;
        let len = self.width as usize * self.channels * self.format.bytes();
        &self.data[start..start + len]
    }
}

/// Read-only pixel source the display surface pulls from.
///
/// All coordinates are absolute, so regions start at `spec().x` / `spec().y`.
pub trait SourceImage: Send + Sync {
    fn spec(&self) -> &ImageSpec;

    /// Copy `region` into `dst` as tightly packed rows of every channel,
    /// converting samples to `format`.
    fn copy_pixels(&self, region: Region, format: PixelFormat, dst: &mut [u8]) -> Result<()>;

    /// Direct access to native pixels when the storage allows it.
    fn pixel_rows(&self, _region: Region) -> Option<PixelRows<'_>> {
        None
    }

    /// Normalised value of every channel of one pixel.
    fn get_pixel(&self, x: i32, y: i32, out: &mut [f32]) -> Result<()>;
}
