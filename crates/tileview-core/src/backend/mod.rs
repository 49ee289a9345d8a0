//! The graphics-driver seam.
//!
//! Everything the display surface needs from a driver goes through
//! [`GraphicsBackend`]: feature queries, texture management, transfer
//! buffers, colour programs and quad/text drawing.

pub mod software;
#[cfg(feature = "gpu")]
pub mod wgpu_backend;

pub use software::{SoftwareBackend, SoftwareFeatures, SoftwareStats};
#[cfg(feature = "gpu")]
pub use wgpu_backend::WgpuBackend;

use crate::color::ColorParams;
use crate::error::Result;
use crate::format::TextureFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Optional driver capabilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriverFeature {
    /// Programmable shading as a core feature.
    CoreShading,
    /// Programmable shading through extensions.
    ShadingExtension,
    SrgbTextures,
    HalfFloatPixels,
    FloatTextures,
    /// Mappable buffers that textures can be updated from.
    TransferBuffers,
}

/// Size and format of a texture's backing store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub filter: FilterMode,
}

/// Size of the window being drawn into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> [f32; 2] {
        [self.width as f32 * 0.5, self.height as f32 * 0.5]
    }
}

/// One textured or flat-coloured quad in window coordinates (y down).
///
/// Corners run top-left, top-right, bottom-right, bottom-left of the source
/// rectangle; `tex_coords[i]` is sampled at `corners[i]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    pub corners: [[f32; 2]; 4],
    pub tex_coords: [[f32; 2]; 4],
    /// `None` draws `color` without a texture.
    pub texture: Option<TextureId>,
    pub color: [f32; 4],
    /// Replace the framebuffer instead of blending.
    pub opaque: bool,
}

impl Quad {
    pub fn solid(corners: [[f32; 2]; 4], color: [f32; 4]) -> Self {
        Self {
            corners,
            tex_coords: [[0.0; 2]; 4],
            texture: None,
            color,
            opaque: false,
        }
    }

    pub fn textured(corners: [[f32; 2]; 4], tex_coords: [[f32; 2]; 4], texture: TextureId) -> Self {
        Self {
            corners,
            tex_coords,
            texture: Some(texture),
            color: [1.0; 4],
            opaque: false,
        }
    }
}

/// Axis-aligned rectangle as quad corners.
pub fn rect_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> [[f32; 2]; 4] {
    [[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
}

/// A line of overlay text; `position` is the left end of the baseline.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub position: [f32; 2],
    pub text: String,
}

/// Colour program source handed to [`GraphicsBackend::compile_program`].
#[derive(Clone, Copy, Debug)]
pub struct ProgramSource {
    pub label: &'static str,
    pub wgsl: &'static str,
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
}

pub trait GraphicsBackend {
    fn name(&self) -> &str;

    fn has_feature(&self, feature: DriverFeature) -> bool;

    /// Largest texture side the driver accepts.
    fn max_texture_dimension(&self) -> u32;

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId>;

    /// Replace a texture's backing store. Contents become undefined.
    fn respecify_texture(&mut self, texture: TextureId, desc: &TextureDesc) -> Result<()>;

    fn set_filter(&mut self, texture: TextureId, filter: FilterMode);

    /// Update the `width × height` block at (0, 0). `data` holds rows of
    /// `row_stride` bytes in the texture's upload format.
    fn upload_region(
        &mut self,
        texture: TextureId,
        width: u32,
        height: u32,
        row_stride: usize,
        data: &[u8],
    ) -> Result<()>;

    /// Map transfer buffer `index` for writing at least `size` bytes.
    fn map_transfer_buffer(&mut self, index: usize, size: usize) -> Result<&mut [u8]>;

    fn unmap_transfer_buffer(&mut self, index: usize);

    /// Update the `width × height` block at (0, 0) from an unmapped
    /// transfer buffer holding tightly packed rows.
    fn upload_from_transfer_buffer(
        &mut self,
        texture: TextureId,
        index: usize,
        width: u32,
        height: u32,
    ) -> Result<()>;

    /// Compile and link a colour program. Failures carry the driver log.
    fn compile_program(&mut self, source: &ProgramSource) -> Result<ProgramId>;

    /// `None` selects fixed-function texturing.
    fn use_program(&mut self, program: Option<ProgramId>);

    fn set_color_params(&mut self, program: ProgramId, params: &ColorParams);

    fn begin_frame(&mut self, viewport: Viewport, clear: [f32; 4]);

    fn draw_quad(&mut self, quad: &Quad);

    /// Text rendering belongs to the host; backends without it drop runs.
    fn draw_text(&mut self, _run: TextRun) {}

    fn end_frame(&mut self) -> Result<()>;
}
