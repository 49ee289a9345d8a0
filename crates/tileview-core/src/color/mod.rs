pub mod params;
pub mod pipeline;
pub mod reference;
pub mod shader;

pub use params::{ChannelView, ColorParams, DisplayParams};
pub use pipeline::{
    build, ColorPipeline, ColorStrategy, FixedFunctionPipeline, PipelineKind, ShadedPipeline,
};
