//! CPU rasteriser implementing [`GraphicsBackend`].
//!
//! Its feature set is configurable, so it can stand in for a driver with or
//! without any optional capability. Colour programs run through the CPU
//! reference shader.

use rayon::prelude::*;
use tracing::{debug, trace};

use super::{
    DriverFeature, FilterMode, GraphicsBackend, ProgramId, ProgramSource, Quad, TextRun,
    TextureDesc, TextureId, Viewport,
};
use crate::color::reference::shade;
use crate::color::ColorParams;
use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{Result, TileViewError};
use crate::format::{decode_texels, TextureStorage};
use crate::source::convert::srgb_to_linear;

/// Optional features the software driver advertises.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoftwareFeatures {
    pub core_shading: bool,
    pub shading_extension: bool,
    pub srgb_textures: bool,
    pub half_float: bool,
    pub float_textures: bool,
    pub transfer_buffers: bool,
    pub max_texture_dimension: u32,
}

impl SoftwareFeatures {
    pub fn full() -> Self {
        Self {
            core_shading: true,
            shading_extension: true,
            srgb_textures: true,
            half_float: true,
            float_textures: true,
            transfer_buffers: true,
            max_texture_dimension: 16384,
        }
    }

    /// A driver with nothing optional.
    pub fn legacy() -> Self {
        Self {
            core_shading: false,
            shading_extension: false,
            srgb_textures: false,
            half_float: false,
            float_textures: false,
            transfer_buffers: false,
            max_texture_dimension: 2048,
        }
    }
}

impl Default for SoftwareFeatures {
    fn default() -> Self {
        Self::full()
    }
}

/// Work counters, for tests and diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SoftwareStats {
    pub textures_created: usize,
    pub texture_respecs: usize,
    pub uploads: usize,
    pub texels_uploaded: usize,
    pub transfer_maps: usize,
    pub quads_drawn: usize,
    pub frames: usize,
}

struct SoftTexture {
    desc: TextureDesc,
    texels: Vec<[f32; 4]>,
}

impl SoftTexture {
    fn new(desc: TextureDesc) -> Self {
        Self {
            texels: vec![[0.0; 4]; desc.width as usize * desc.height as usize],
            desc,
        }
    }

    fn texel(&self, x: i64, y: i64) -> [f32; 4] {
        let w = self.desc.width as i64;
        let h = self.desc.height as i64;
        let x = x.clamp(0, w - 1) as usize;
        let y = y.clamp(0, h - 1) as usize;
        self.texels[y * w as usize + x]
    }

    fn sample(&self, st: [f32; 2]) -> [f32; 4] {
        let w = self.desc.width as f32;
        let h = self.desc.height as f32;
        match self.desc.filter {
            FilterMode::Nearest => {
                self.texel((st[0] * w).floor() as i64, (st[1] * h).floor() as i64)
            }
            FilterMode::Linear => {
                let u = st[0] * w - 0.5;
                let v = st[1] * h - 0.5;
                let (x0, y0) = (u.floor(), v.floor());
                let (fx, fy) = (u - x0, v - y0);
                let (x0, y0) = (x0 as i64, y0 as i64);
                let t00 = self.texel(x0, y0);
                let t10 = self.texel(x0 + 1, y0);
                let t01 = self.texel(x0, y0 + 1);
                let t11 = self.texel(x0 + 1, y0 + 1);
                let mut out = [0.0; 4];
                for c in 0..4 {
                    let top = t00[c] + (t10[c] - t00[c]) * fx;
                    let bottom = t01[c] + (t11[c] - t01[c]) * fx;
                    out[c] = top + (bottom - top) * fy;
                }
                out
            }
        }
    }
}

/// Quantise a texel the way the texture's storage class holds it.
fn store(storage: TextureStorage, v: [f32; 4]) -> [f32; 4] {
    let quantize = |x: f32, levels: f32| (x.clamp(0.0, 1.0) * levels).round() / levels;
    match storage {
        TextureStorage::Default | TextureStorage::Unorm8 => v.map(|x| quantize(x, 255.0)),
        TextureStorage::Unorm16 => v.map(|x| quantize(x, 65535.0)),
        TextureStorage::Float16 => v.map(|x| half::f16::from_f32(x).to_f32()),
        TextureStorage::Float32 => v,
        TextureStorage::Srgb8 => {
            let q = v.map(|x| quantize(x, 255.0));
            [srgb_to_linear(q[0]), srgb_to_linear(q[1]), srgb_to_linear(q[2]), q[3]]
        }
        TextureStorage::Srgb => {
            let c = v.map(|x| x.clamp(0.0, 1.0));
            [srgb_to_linear(c[0]), srgb_to_linear(c[1]), srgb_to_linear(c[2]), c[3]]
        }
    }
}

pub struct SoftwareBackend {
    features: SoftwareFeatures,
    textures: Vec<SoftTexture>,
    programs: Vec<Option<ColorParams>>,
    active_program: Option<ProgramId>,
    transfer_buffers: Vec<Vec<u8>>,
    mapped: Option<usize>,
    failing_maps: usize,
    compile_failure: Option<String>,
    viewport: Viewport,
    framebuffer: Vec<[f32; 4]>,
    text_runs: Vec<TextRun>,
    stats: SoftwareStats,
}

impl SoftwareBackend {
    pub fn new(features: SoftwareFeatures) -> Self {
        Self {
            features,
            textures: Vec::new(),
            programs: Vec::new(),
            active_program: None,
            transfer_buffers: Vec::new(),
            mapped: None,
            failing_maps: 0,
            compile_failure: None,
            viewport: Viewport::default(),
            framebuffer: Vec::new(),
            text_runs: Vec::new(),
            stats: SoftwareStats::default(),
        }
    }

    /// Make the next `count` transfer-buffer maps fail.
    pub fn fail_next_transfer_maps(&mut self, count: usize) {
        self.failing_maps = count;
    }

    /// Make program compilation fail with `log` as the driver diagnostic.
    pub fn fail_program_compilation(&mut self, log: impl Into<String>) {
        self.compile_failure = Some(log.into());
    }

    pub fn stats(&self) -> &SoftwareStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SoftwareStats::default();
    }

    /// Text runs drawn since the last `begin_frame`.
    pub fn text_runs(&self) -> &[TextRun] {
        &self.text_runs
    }

    pub fn texture_filter(&self, texture: TextureId) -> Option<FilterMode> {
        self.textures
            .get(texture.0 as usize)
            .map(|t| t.desc.filter)
    }

    pub fn texture_desc(&self, texture: TextureId) -> Option<TextureDesc> {
        self.textures.get(texture.0 as usize).map(|t| t.desc)
    }

    /// Stored value of one texel.
    pub fn texel(&self, texture: TextureId, x: u32, y: u32) -> Option<[f32; 4]> {
        let t = self.textures.get(texture.0 as usize)?;
        (x < t.desc.width && y < t.desc.height).then(|| t.texel(x as i64, y as i64))
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.framebuffer[(y * self.viewport.width + x) as usize]
    }

    /// Framebuffer as 8-bit RGBA.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let mut img = image::RgbaImage::new(self.viewport.width, self.viewport.height);
        for (dst, src) in img.pixels_mut().zip(&self.framebuffer) {
            dst.0 = src.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8);
        }
        img
    }

    fn texture_mut(&mut self, texture: TextureId) -> Result<&mut SoftTexture> {
        self.textures
            .get_mut(texture.0 as usize)
            .ok_or_else(|| TileViewError::Backend(format!("unknown texture {}", texture.0)))
    }

    fn check_dimensions(&self, desc: &TextureDesc) -> Result<()> {
        let max = self.features.max_texture_dimension;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(TileViewError::InvalidDimensions {
                width: desc.width,
                height: desc.height,
            });
        }
        Ok(())
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new(SoftwareFeatures::default())
    }
}

impl GraphicsBackend for SoftwareBackend {
    fn name(&self) -> &str {
        "software"
    }

    fn has_feature(&self, feature: DriverFeature) -> bool {
        let f = &self.features;
        match feature {
            DriverFeature::CoreShading => f.core_shading,
            DriverFeature::ShadingExtension => f.shading_extension,
            DriverFeature::SrgbTextures => f.srgb_textures,
            DriverFeature::HalfFloatPixels => f.half_float,
            DriverFeature::FloatTextures => f.float_textures,
            DriverFeature::TransferBuffers => f.transfer_buffers,
        }
    }

    fn max_texture_dimension(&self) -> u32 {
        self.features.max_texture_dimension
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId> {
        self.check_dimensions(desc)?;
        self.textures.push(SoftTexture::new(*desc));
        self.stats.textures_created += 1;
        Ok(TextureId(self.textures.len() as u32 - 1))
    }

    fn respecify_texture(&mut self, texture: TextureId, desc: &TextureDesc) -> Result<()> {
        self.check_dimensions(desc)?;
        *self.texture_mut(texture)? = SoftTexture::new(*desc);
        self.stats.texture_respecs += 1;
        debug!(
            texture = texture.0,
            width = desc.width,
            height = desc.height,
            storage = ?desc.format.storage,
            "Respecified texture"
        );
        Ok(())
    }

    fn set_filter(&mut self, texture: TextureId, filter: FilterMode) {
        if let Some(t) = self.textures.get_mut(texture.0 as usize) {
            t.desc.filter = filter;
        }
    }

    fn upload_region(
        &mut self,
        texture: TextureId,
        width: u32,
        height: u32,
        row_stride: usize,
        data: &[u8],
    ) -> Result<()> {
        let tex = self.texture_mut(texture)?;
        if width > tex.desc.width || height > tex.desc.height {
            return Err(TileViewError::RegionOutOfBounds {
                x: 0,
                y: 0,
                width,
                height,
            });
        }
        if width == 0 || height == 0 {
            return Ok(());
        }
        let texels = decode_texels(&tex.desc.format, width, height, row_stride, data)?;
        let storage = tex.desc.format.storage;
        let tex_width = tex.desc.width as usize;
        for (y, row) in texels.chunks_exact(width as usize).enumerate() {
            for (x, texel) in row.iter().enumerate() {
                tex.texels[y * tex_width + x] = store(storage, *texel);
            }
        }

        self.stats.uploads += 1;
        self.stats.texels_uploaded += width as usize * height as usize;
        Ok(())
    }

    fn map_transfer_buffer(&mut self, index: usize, size: usize) -> Result<&mut [u8]> {
        if !self.features.transfer_buffers {
            return Err(TileViewError::Backend(
                "transfer buffers are not supported".into(),
            ));
        }
        if self.failing_maps > 0 {
            self.failing_maps -= 1;
            return Err(TileViewError::TransferMap { index });
        }
        if self.transfer_buffers.len() <= index {
            self.transfer_buffers.resize_with(index + 1, Vec::new);
        }
        self.mapped = Some(index);
        self.stats.transfer_maps += 1;
        let buffer = &mut self.transfer_buffers[index];
        buffer.resize(size, 0);
        Ok(&mut buffer[..size])
    }

    fn unmap_transfer_buffer(&mut self, index: usize) {
        if self.mapped == Some(index) {
            self.mapped = None;
        }
    }

    fn upload_from_transfer_buffer(
        &mut self,
        texture: TextureId,
        index: usize,
        width: u32,
        height: u32,
    ) -> Result<()> {
        if self.mapped == Some(index) {
            return Err(TileViewError::Backend(format!(
                "transfer buffer {index} is still mapped"
            )));
        }
        let pixel_bytes = self
            .textures
            .get(texture.0 as usize)
            .map(|t| t.desc.format.pixel_bytes())
            .ok_or_else(|| TileViewError::Backend(format!("unknown texture {}", texture.0)))?;
        let Some(slot) = self.transfer_buffers.get_mut(index) else {
            return Err(TileViewError::TransferMap { index });
        };
        let buffer = std::mem::take(slot);
        let result = self.upload_region(
            texture,
            width,
            height,
            width as usize * pixel_bytes,
            &buffer,
        );
        self.transfer_buffers[index] = buffer;
        result
    }

    fn compile_program(&mut self, source: &ProgramSource) -> Result<ProgramId> {
        if let Some(log) = &self.compile_failure {
            return Err(TileViewError::ShaderCompile(format!(
                "{}: {log}",
                source.label
            )));
        }
        for entry in [source.vertex_entry, source.fragment_entry] {
            if !source.wgsl.contains(&format!("fn {entry}(")) {
                return Err(TileViewError::ShaderCompile(format!(
                    "{}: entry point `{entry}` not found",
                    source.label
                )));
            }
        }
        self.programs.push(None);
        Ok(ProgramId(self.programs.len() as u32 - 1))
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.active_program = program;
    }

    fn set_color_params(&mut self, program: ProgramId, params: &ColorParams) {
        if let Some(slot) = self.programs.get_mut(program.0 as usize) {
            *slot = Some(*params);
        }
    }

    fn begin_frame(&mut self, viewport: Viewport, clear: [f32; 4]) {
        self.viewport = viewport;
        self.framebuffer.clear();
        self.framebuffer
            .resize(viewport.width as usize * viewport.height as usize, clear);
        self.text_runs.clear();
    }

    fn draw_quad(&mut self, quad: &Quad) {
        let (vw, vh) = (self.viewport.width as usize, self.viewport.height as usize);
        if vw == 0 || vh == 0 {
            return;
        }
        let [c0, c1, _, c3] = quad.corners;
        let e1 = [c1[0] - c0[0], c1[1] - c0[1]];
        let e2 = [c3[0] - c0[0], c3[1] - c0[1]];
        let det = e1[0] * e2[1] - e1[1] * e2[0];
        if det.abs() < f32::EPSILON {
            return;
        }

        let xs = quad.corners.map(|c| c[0]);
        let ys = quad.corners.map(|c| c[1]);
        let min_x = xs.iter().copied().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().copied().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let x0 = (min_x.floor().max(0.0) as usize).min(vw);
        let x1 = (max_x.ceil().max(0.0) as usize).min(vw);
        let y0 = (min_y.floor().max(0.0) as usize).min(vh);
        let y1 = (max_y.ceil().max(0.0) as usize).min(vh);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let texture = quad.texture.and_then(|t| self.textures.get(t.0 as usize));
        let params = self
            .active_program
            .and_then(|p| self.programs.get(p.0 as usize).copied().flatten());
        let [t0, t1, _, t3] = quad.tex_coords;

        let raster = |(y, row): (usize, &mut [[f32; 4]])| {
            let py = y as f32 + 0.5;
            for (x, dst) in row.iter_mut().enumerate().take(x1).skip(x0) {
                let d = [x as f32 + 0.5 - c0[0], py - c0[1]];
                let a = (d[0] * e2[1] - d[1] * e2[0]) / det;
                let b = (e1[0] * d[1] - e1[1] * d[0]) / det;
                if !(0.0..1.0).contains(&a) || !(0.0..1.0).contains(&b) {
                    continue;
                }
                let src = match texture {
                    Some(tex) => {
                        let st = [
                            t0[0] + a * (t1[0] - t0[0]) + b * (t3[0] - t0[0]),
                            t0[1] + a * (t1[1] - t0[1]) + b * (t3[1] - t0[1]),
                        ];
                        match &params {
                            Some(p) => shade(|s| tex.sample(s), st, p),
                            None => tex.sample(st),
                        }
                    }
                    None => quad.color,
                };
                if quad.opaque {
                    *dst = src;
                } else {
                    let keep = 1.0 - src[3];
                    *dst = [
                        src[0] + dst[0] * keep,
                        src[1] + dst[1] * keep,
                        src[2] + dst[2] * keep,
                        src[3] + dst[3] * keep,
                    ];
                }
            }
        };

        let rows = y1 - y0;
        if rows * (x1 - x0) >= PARALLEL_PIXEL_THRESHOLD {
            self.framebuffer
                .par_chunks_mut(vw)
                .enumerate()
                .skip(y0)
                .take(rows)
                .for_each(raster);
        } else {
            self.framebuffer
                .chunks_mut(vw)
                .enumerate()
                .skip(y0)
                .take(rows)
                .for_each(raster);
        }
        self.stats.quads_drawn += 1;
    }

    fn draw_text(&mut self, run: TextRun) {
        self.text_runs.push(run);
    }

    fn end_frame(&mut self) -> Result<()> {
        self.stats.frames += 1;
        trace!(
            frames = self.stats.frames,
            quads = self.stats.quads_drawn,
            uploads = self.stats.uploads,
            "Software frame complete"
        );
        Ok(())
    }
}
