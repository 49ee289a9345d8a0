use tracing::debug;

use crate::backend::{DriverFeature, GraphicsBackend};
use crate::config::ViewerConfig;

/// What the driver offers, probed once after the context is ready.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderCapabilities {
    pub supports_shading: bool,
    /// Shading is available only through extensions.
    pub supports_shading_via_extension: bool,
    pub supports_srgb: bool,
    pub supports_half_float: bool,
    pub supports_float_textures: bool,
    pub supports_async_transfer_buffers: bool,
    /// Driver limit clamped to the configured ceiling; never below 1.
    pub max_texture_dimension: u32,
}

impl RenderCapabilities {
    /// Capabilities of a driver offering nothing optional.
    pub fn legacy(max_texture_dimension: u32) -> Self {
        Self {
            supports_shading: false,
            supports_shading_via_extension: false,
            supports_srgb: false,
            supports_half_float: false,
            supports_float_textures: false,
            supports_async_transfer_buffers: false,
            max_texture_dimension: max_texture_dimension.max(1),
        }
    }
}

/// Query the backend. Never fails: missing features select lesser paths.
pub fn probe(backend: &dyn GraphicsBackend, config: &ViewerConfig) -> RenderCapabilities {
    let max_texture_dimension = backend
        .max_texture_dimension()
        .min(config.max_texture_ceiling)
        .max(1);

    let caps = if config.force_fixed_function {
        RenderCapabilities::legacy(max_texture_dimension)
    } else {
        let core = backend.has_feature(DriverFeature::CoreShading);
        let via_extension = !core && backend.has_feature(DriverFeature::ShadingExtension);
        RenderCapabilities {
            supports_shading: core || via_extension,
            supports_shading_via_extension: via_extension,
            supports_srgb: backend.has_feature(DriverFeature::SrgbTextures),
            supports_half_float: backend.has_feature(DriverFeature::HalfFloatPixels),
            supports_float_textures: backend.has_feature(DriverFeature::FloatTextures),
            supports_async_transfer_buffers: backend.has_feature(DriverFeature::TransferBuffers),
            max_texture_dimension,
        }
    };

    debug!(
        backend = backend.name(),
        shading = caps.supports_shading,
        via_extension = caps.supports_shading_via_extension,
        srgb = caps.supports_srgb,
        half = caps.supports_half_float,
        float = caps.supports_float_textures,
        transfer_buffers = caps.supports_async_transfer_buffers,
        max_texture = caps.max_texture_dimension,
        forced_legacy = config.force_fixed_function,
        "Probed render capabilities"
    );
    caps
}
