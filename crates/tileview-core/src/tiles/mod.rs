pub mod cache;
pub mod upload;

pub use cache::{tile_extent, CacheStats, TileCache, TileKey, TileSlot};
pub use upload::{bake_region, BakeSettings};
