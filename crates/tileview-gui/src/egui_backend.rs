//! [`GraphicsBackend`] over egui's texture manager.
//!
//! egui has no programmable fragment stage, so the surface runs the
//! fixed-function colour path and every texture holds baked display values.
//! Each texture keeps a CPU shadow image; uploads write the shadow and dirty
//! textures are pushed to egui once per frame. Draw calls are recorded as
//! meshes in window pixels and replayed by the viewport panel.

use egui::epaint::{Vertex, WHITE_UV};
use egui::{Color32, ColorImage, Mesh, TextureHandle, TextureOptions};
use tracing::debug;

use tileview_core::backend::{
    DriverFeature, FilterMode, GraphicsBackend, ProgramId, ProgramSource, Quad, TextRun,
    TextureDesc, TextureId, Viewport,
};
use tileview_core::color::ColorParams;
use tileview_core::format::decode_texels;
use tileview_core::{Result, TileViewError};

/// Quad corner order as two triangles.
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

struct EguiTexture {
    desc: TextureDesc,
    shadow: ColorImage,
    handle: Option<TextureHandle>,
    dirty: bool,
}

impl EguiTexture {
    fn new(desc: TextureDesc) -> Self {
        let (w, h) = (desc.width as usize, desc.height as usize);
        Self {
            desc,
            shadow: ColorImage {
                size: [w, h],
                pixels: vec![Color32::TRANSPARENT; w * h],
                source_size: Default::default(),
            },
            handle: None,
            dirty: true,
        }
    }

    fn options(&self) -> TextureOptions {
        match self.desc.filter {
            FilterMode::Nearest => TextureOptions::NEAREST,
            FilterMode::Linear => TextureOptions::LINEAR,
        }
    }
}

fn to_color32(v: [f32; 4]) -> Color32 {
    let [r, g, b, a] = v.map(|x| (x.clamp(0.0, 1.0) * 255.0).round() as u8);
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

pub struct EguiBackend {
    ctx: egui::Context,
    textures: Vec<EguiTexture>,
    meshes: Vec<Mesh>,
    text_runs: Vec<TextRun>,
}

impl EguiBackend {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            ctx,
            textures: Vec::new(),
            meshes: Vec::new(),
            text_runs: Vec::new(),
        }
    }

    /// Meshes of the last frame, in window pixels.
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn text_runs(&self) -> &[TextRun] {
        &self.text_runs
    }

    /// Shadow copy of one texel.
    #[cfg(test)]
    pub fn texel(&self, texture: TextureId, x: u32, y: u32) -> Option<Color32> {
        let t = self.textures.get(texture.0 as usize)?;
        (x < t.desc.width && y < t.desc.height)
            .then(|| t.shadow.pixels[(y * t.desc.width + x) as usize])
    }

    fn texture_mut(&mut self, texture: TextureId) -> Result<&mut EguiTexture> {
        self.textures
            .get_mut(texture.0 as usize)
            .ok_or_else(|| TileViewError::Backend(format!("unknown texture {}", texture.0)))
    }

    fn check_dimensions(&self, desc: &TextureDesc) -> Result<()> {
        let max = self.max_texture_dimension();
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(TileViewError::InvalidDimensions {
                width: desc.width,
                height: desc.height,
            });
        }
        Ok(())
    }

    fn solid_mesh(corners: &[[f32; 2]; 4], color: Color32) -> Mesh {
        let mut mesh = Mesh::default();
        for c in corners {
            mesh.vertices.push(Vertex {
                pos: egui::pos2(c[0], c[1]),
                uv: WHITE_UV,
                color,
            });
        }
        mesh.indices.extend_from_slice(&QUAD_INDICES);
        mesh
    }

    /// Push every texture changed since the last flush to egui.
    fn flush_textures(&mut self) {
        for (i, t) in self.textures.iter_mut().enumerate() {
            if !t.dirty {
                continue;
            }
            let options = t.options();
            match &mut t.handle {
                Some(handle) => handle.set(t.shadow.clone(), options),
                None => {
                    t.handle = Some(self.ctx.load_texture(
                        format!("tileview-{i}"),
                        t.shadow.clone(),
                        options,
                    ));
                }
            }
            t.dirty = false;
        }
    }
}

impl GraphicsBackend for EguiBackend {
    fn name(&self) -> &str {
        "egui"
    }

    fn has_feature(&self, _feature: DriverFeature) -> bool {
        false
    }

    fn max_texture_dimension(&self) -> u32 {
        self.ctx.input(|i| i.max_texture_side) as u32
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId> {
        self.check_dimensions(desc)?;
        self.textures.push(EguiTexture::new(*desc));
        Ok(TextureId(self.textures.len() as u32 - 1))
    }

    fn respecify_texture(&mut self, texture: TextureId, desc: &TextureDesc) -> Result<()> {
        self.check_dimensions(desc)?;
        let t = self.texture_mut(texture)?;
        let handle = t.handle.take();
        *t = EguiTexture::new(*desc);
        t.handle = handle;
        debug!(texture = texture.0, width = desc.width, height = desc.height, "Respecified texture");
        Ok(())
    }

    fn set_filter(&mut self, texture: TextureId, filter: FilterMode) {
        if let Some(t) = self.textures.get_mut(texture.0 as usize) {
            if t.desc.filter != filter {
                t.desc.filter = filter;
                t.dirty = true;
            }
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
        let t = self.texture_mut(texture)?;
        if width > t.desc.width || height > t.desc.height {
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
        let texels = decode_texels(&t.desc.format, width, height, row_stride, data)?;
        let tex_width = t.desc.width as usize;
        for (y, row) in texels.chunks_exact(width as usize).enumerate() {
            let dst = &mut t.shadow.pixels[y * tex_width..y * tex_width + width as usize];
            for (d, texel) in dst.iter_mut().zip(row) {
                *d = to_color32(*texel);
            }
        }
        t.dirty = true;
        Ok(())
    }

    fn map_transfer_buffer(&mut self, _index: usize, _size: usize) -> Result<&mut [u8]> {
        Err(TileViewError::Backend(
            "egui textures have no transfer buffers".into(),
        ))
    }

    fn unmap_transfer_buffer(&mut self, _index: usize) {}

    fn upload_from_transfer_buffer(
        &mut self,
        _texture: TextureId,
        index: usize,
        _width: u32,
        _height: u32,
    ) -> Result<()> {
        Err(TileViewError::TransferMap { index })
    }

    fn compile_program(&mut self, source: &ProgramSource) -> Result<ProgramId> {
        Err(TileViewError::ShaderCompile(format!(
            "{}: the egui painter has no programmable stage",
            source.label
        )))
    }

    fn use_program(&mut self, _program: Option<ProgramId>) {}

    fn set_color_params(&mut self, _program: ProgramId, _params: &ColorParams) {}

    fn begin_frame(&mut self, viewport: Viewport, clear: [f32; 4]) {
        self.meshes.clear();
        self.text_runs.clear();
        let (w, h) = (viewport.width as f32, viewport.height as f32);
        let corners = [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]];
        self.meshes.push(Self::solid_mesh(&corners, to_color32(clear)));
    }

    fn draw_quad(&mut self, quad: &Quad) {
        let color = to_color32(quad.color);
        let Some(id) = quad.texture else {
            self.meshes.push(Self::solid_mesh(&quad.corners, color));
            return;
        };
        // Textures created during this frame get their handle on flush.
        if self.textures.get(id.0 as usize).is_some_and(|t| t.handle.is_none()) {
            self.flush_textures();
        }
        let Some(texture_id) = self
            .textures
            .get(id.0 as usize)
            .and_then(|t| t.handle.as_ref())
            .map(|h| h.id())
        else {
            return;
        };

        if quad.opaque {
            self.meshes.push(Self::solid_mesh(&quad.corners, Color32::BLACK));
        }
        let mut mesh = Mesh::with_texture(texture_id);
        for (c, uv) in quad.corners.iter().zip(&quad.tex_coords) {
            mesh.vertices.push(Vertex {
                pos: egui::pos2(c[0], c[1]),
                uv: egui::pos2(uv[0], uv[1]),
                color,
            });
        }
        mesh.indices.extend_from_slice(&QUAD_INDICES);
        self.meshes.push(mesh);
    }

    fn draw_text(&mut self, run: TextRun) {
        self.text_runs.push(run);
    }

    fn end_frame(&mut self) -> Result<()> {
        self.flush_textures();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tileview_core::backend::rect_corners;
    use tileview_core::color::PipelineKind;
    use tileview_core::config::ViewerConfig;
    use tileview_core::source::{ImageSpec, MemoryImage, PixelFormat, SourceImage};
    use tileview_core::DisplaySurface;

    use super::*;

    fn gradient(w: u32, h: u32) -> Arc<dyn SourceImage> {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 0]);
            }
        }
        let spec = ImageSpec::new(w, h, 3, PixelFormat::U8);
        Arc::new(MemoryImage::from_raw(spec, data).expect("buffer matches spec"))
    }

    fn surface(w: u32, h: u32) -> DisplaySurface<EguiBackend> {
        let mut surface =
            DisplaySurface::new(EguiBackend::new(egui::Context::default()), ViewerConfig::default());
        surface.resize(w, h);
        surface.context_ready().expect("context");
        surface
    }

    #[test]
    fn test_no_optional_features() {
        let backend = EguiBackend::new(egui::Context::default());
        for f in [
            DriverFeature::CoreShading,
            DriverFeature::ShadingExtension,
            DriverFeature::SrgbTextures,
            DriverFeature::HalfFloatPixels,
            DriverFeature::FloatTextures,
            DriverFeature::TransferBuffers,
        ] {
            assert!(!backend.has_feature(f));
        }
    }

    #[test]
    fn test_surface_runs_fixed_function() {
        let s = surface(64, 64);
        assert_eq!(s.pipeline_kind(), Some(PipelineKind::FixedFunction));
    }

    #[test]
    fn test_frame_records_clear_then_tiles() {
        let mut s = surface(32, 16);
        s.set_image(Some(gradient(32, 16))).expect("image");
        s.set_view(16.0, 8.0, 1.0, true);
        let report = s.redraw().expect("frame");

        assert_eq!(report.tiles_drawn, 1);
        let meshes = s.backend().meshes();
        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].texture_id, egui::TextureId::default());
        assert_ne!(meshes[1].texture_id, egui::TextureId::default());
        assert_eq!(meshes[1].indices, QUAD_INDICES.to_vec());
    }

    #[test]
    fn test_upload_fills_shadow() {
        let mut s = surface(32, 16);
        s.set_image(Some(gradient(32, 16))).expect("image");
        s.set_view(16.0, 8.0, 1.0, true);
        s.redraw().expect("frame");

        let slot = s
            .tile_cache()
            .map(|c| c.textures()[0])
            .expect("tile pool");
        let texel = s.backend().texel(slot, 7, 3).expect("texel in range");
        assert_eq!(texel, Color32::from_rgba_unmultiplied(7, 3, 0, 255));
    }

    #[test]
    fn test_inspector_text_is_recorded() {
        let mut s = surface(128, 128);
        s.set_image(Some(gradient(64, 64))).expect("image");
        s.set_view(32.0, 32.0, 2.0, true);
        s.set_inspector(true, true);
        s.pointer_moved([64.0, 64.0], Default::default());
        s.redraw().expect("frame");

        let texts: Vec<&str> = s.backend().text_runs().iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts.first(), Some(&"(32, 32)"));
    }

    #[test]
    fn test_transfer_buffers_unavailable() {
        let mut backend = EguiBackend::new(egui::Context::default());
        assert!(backend.map_transfer_buffer(0, 16).is_err());
    }

    #[test]
    fn test_solid_quad_uses_white_uv() {
        let mut backend = EguiBackend::new(egui::Context::default());
        backend.begin_frame(Viewport::new(4, 4), [0.0, 0.0, 0.0, 1.0]);
        backend.draw_quad(&Quad::solid(rect_corners(0.0, 0.0, 2.0, 2.0), [1.0, 0.0, 0.0, 1.0]));
        let mesh = &backend.meshes()[1];
        assert!(mesh.vertices.iter().all(|v| v.uv == WHITE_UV));
        assert_eq!(mesh.vertices[0].color, Color32::RED);
    }
}
