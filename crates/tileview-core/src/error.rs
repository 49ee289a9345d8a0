use thiserror::Error;

#[derive(Error, Debug)]
pub enum TileViewError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Region ({x}, {y}) {width}x{height} lies outside the image data window")]
    RegionOutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },

    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(usize),

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("Shader compilation failed: {0}")]
    ShaderCompile(String),

    #[error("Could not map transfer buffer {index}")]
    TransferMap { index: usize },

    #[error("Graphics backend error: {0}")]
    Backend(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Destination buffer holds {got} bytes, {needed} required")]
    BufferTooSmall { needed: usize, got: usize },

    #[error("Display surface used before context_ready()")]
    NotReady,
}

pub type Result<T> = std::result::Result<T, TileViewError>;
