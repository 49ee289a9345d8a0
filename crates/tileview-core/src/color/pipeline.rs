use tracing::{error, info, warn};

use super::params::ColorParams;
use super::shader::COLOR_PROGRAM;
use crate::backend::{FilterMode, GraphicsBackend, ProgramId, TextureId};
use crate::caps::RenderCapabilities;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineKind {
    FixedFunction,
    Shaded,
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FixedFunction => write!(f, "fixed-function"),
            Self::Shaded => write!(f, "shaded"),
        }
    }
}

/// How colour parameters reach the screen.
pub trait ColorStrategy {
    fn kind(&self) -> PipelineKind;

    /// Make `params` current before drawing. `tile_textures` are the tile
    /// pool's textures.
    fn bind(&self, backend: &mut dyn GraphicsBackend, params: &ColorParams, tile_textures: &[TextureId]);

    fn unbind(&self, backend: &mut dyn GraphicsBackend) {
        backend.use_program(None);
    }

    /// Colour must be applied to texels at upload time.
    fn bakes_color(&self) -> bool {
        self.kind() == PipelineKind::FixedFunction
    }
}

pub type ColorPipeline = Box<dyn ColorStrategy>;

/// No programmable stage: colour is baked into the texels and sampling is
/// controlled through texture filtering.
#[derive(Debug, Default)]
pub struct FixedFunctionPipeline;

impl FixedFunctionPipeline {
    pub fn apply_filtering_mode(
        &self,
        backend: &mut dyn GraphicsBackend,
        tile_textures: &[TextureId],
        linear: bool,
    ) {
        let filter = if linear {
            FilterMode::Linear
        } else {
            FilterMode::Nearest
        };
        for &texture in tile_textures {
            backend.set_filter(texture, filter);
        }
    }
}

impl ColorStrategy for FixedFunctionPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::FixedFunction
    }

    fn bind(&self, backend: &mut dyn GraphicsBackend, params: &ColorParams, tile_textures: &[TextureId]) {
        backend.use_program(None);
        self.apply_filtering_mode(backend, tile_textures, params.linear_interpolation);
    }
}

/// Compiled colour program; parameters are uploaded on every bind.
#[derive(Debug)]
pub struct ShadedPipeline {
    program: ProgramId,
    via_extension: bool,
}

impl ShadedPipeline {
    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn via_extension(&self) -> bool {
        self.via_extension
    }
}

impl ColorStrategy for ShadedPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Shaded
    }

    fn bind(&self, backend: &mut dyn GraphicsBackend, params: &ColorParams, _tile_textures: &[TextureId]) {
        backend.use_program(Some(self.program));
        backend.set_color_params(self.program, params);
    }
}

/// Select the colour path for the probed capabilities. A program that fails
/// to compile falls back to fixed-function.
pub fn build(backend: &mut dyn GraphicsBackend, caps: &RenderCapabilities) -> ColorPipeline {
    if !caps.supports_shading {
        info!("Programmable shading unavailable; using fixed-function colour path");
        return Box::new(FixedFunctionPipeline);
    }

    match backend.compile_program(&COLOR_PROGRAM) {
        Ok(program) => {
            info!(
                backend = backend.name(),
                via_extension = caps.supports_shading_via_extension,
                "Using shaded colour path"
            );
            Box::new(ShadedPipeline {
                program,
                via_extension: caps.supports_shading_via_extension,
            })
        }
        Err(e) => {
            error!("{e}");
            warn!("Falling back to fixed-function colour path");
            Box::new(FixedFunctionPipeline)
        }
    }
}
