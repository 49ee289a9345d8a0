pub mod backend;
pub mod caps;
pub mod color;
pub mod config;
pub mod consts;
pub mod display;
pub mod error;
pub mod format;
pub mod input;
pub mod inspector;
pub mod progress;
pub mod source;
pub mod tiles;
pub mod view;

pub use display::DisplaySurface;
pub use error::{Result, TileViewError};
