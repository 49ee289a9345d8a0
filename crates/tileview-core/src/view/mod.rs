pub mod compositor;
pub mod orientation;
pub mod transform;

pub use compositor::{draw_image, visible_tiles, visible_window, FrameReport, TileWindow, VisibleTile};
pub use orientation::Orientation;
pub use transform::{quad_tex_coords, window_to_image_pixel, ViewState, ViewTransform};
