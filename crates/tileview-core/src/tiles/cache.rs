use tracing::{debug, warn};

use super::upload::{bake_region, BakeSettings};
use crate::backend::{FilterMode, GraphicsBackend, TextureDesc, TextureId};
use crate::caps::RenderCapabilities;
use crate::color::{ColorParams, DisplayParams};
use crate::consts::TRANSFER_BUFFER_COUNT;
use crate::error::{Result, TileViewError};
use crate::format::{bake_decodes_srgb, negotiate, TextureFormat};
use crate::progress::FrameProgress;
use crate::source::{Region, SourceImage};

/// Tag of a resident tile: its rectangle in absolute image coordinates.
pub type TileKey = Region;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSlot {
    pub texture: TextureId,
    /// `None` until the slot holds a tile.
    pub tag: Option<TileKey>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub uploads: usize,
    pub failed_uploads: usize,
    pub bytes_copied: usize,
}

/// Fixed pool of tile textures with round-robin replacement.
///
/// Every slot is backed by a `tile_width × tile_height` texture; tiles at
/// the image's right and bottom edges only fill the top-left part.
pub struct TileCache {
    slots: Vec<TileSlot>,
    next_victim: usize,
    tile_width: u32,
    tile_height: u32,
    format: TextureFormat,
    bake: Option<BakeSettings>,
    use_transfer_buffers: bool,
    next_transfer: usize,
    staging: Vec<u8>,
    scratch: Vec<u8>,
    stats: CacheStats,
}

impl TileCache {
    /// Allocate `pool_size` placeholder textures.
    pub fn new(backend: &mut dyn GraphicsBackend, pool_size: usize) -> Result<Self> {
        let desc = TextureDesc {
            width: 1,
            height: 1,
            format: TextureFormat::BAKED_RGBA8,
            filter: FilterMode::Linear,
        };
        let slots = (0..pool_size.max(1))
            .map(|_| {
                backend.create_texture(&desc).map(|texture| TileSlot {
                    texture,
                    tag: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            slots,
            next_victim: 0,
            tile_width: 1,
            tile_height: 1,
            format: TextureFormat::BAKED_RGBA8,
            bake: None,
            use_transfer_buffers: false,
            next_transfer: 0,
            staging: Vec::new(),
            scratch: Vec::new(),
            stats: CacheStats::default(),
        })
    }

    /// Prepare the pool for a new image: derive the tile size, negotiate the
    /// texture format, reallocate every slot and clear every tag.
    pub fn configure(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        image: &dyn SourceImage,
        caps: &RenderCapabilities,
        bakes_color: bool,
        display: &DisplayParams,
    ) -> Result<()> {
        let spec = image.spec();
        self.tile_width = tile_extent(spec.width, caps.max_texture_dimension);
        self.tile_height = tile_extent(spec.height, caps.max_texture_dimension);

        if bakes_color {
            self.format = TextureFormat::BAKED_RGBA8;
            self.bake = Some(BakeSettings {
                params: ColorParams::new(
                    display,
                    spec.channel_count(),
                    self.tile_width,
                    self.tile_height,
                ),
                decode_srgb: bake_decodes_srgb(spec, caps),
            });
            self.use_transfer_buffers = false;
        } else {
            self.format = negotiate(spec, caps);
            self.bake = None;
            self.use_transfer_buffers = caps.supports_async_transfer_buffers;
        }

        let desc = TextureDesc {
            width: self.tile_width,
            height: self.tile_height,
            format: self.format,
            filter: FilterMode::Linear,
        };
        for slot in &mut self.slots {
            backend.respecify_texture(slot.texture, &desc)?;
            slot.tag = None;
        }
        self.next_victim = 0;
        self.next_transfer = 0;

        let tile_bytes =
            self.tile_width as usize * self.tile_height as usize * self.format.pixel_bytes();
        if self.bake.is_none() && !self.use_transfer_buffers {
            self.staging.resize(tile_bytes, 0);
        } else {
            self.staging.clear();
        }

        debug!(
            tile_width = self.tile_width,
            tile_height = self.tile_height,
            format = ?self.format,
            slots = self.slots.len(),
            baked = bakes_color,
            transfer_buffers = self.use_transfer_buffers,
            "Configured tile pool"
        );
        Ok(())
    }

    /// Update the baked colour settings. Returns true when the change
    /// invalidated the resident tiles.
    pub fn update_bake(&mut self, display: &DisplayParams) -> bool {
        let Some(bake) = &mut self.bake else {
            return false;
        };
        let params = ColorParams::new(
            display,
            bake.params.image_channels as usize,
            self.tile_width,
            self.tile_height,
        );
        let changed = params.gain != bake.params.gain
            || params.gamma != bake.params.gamma
            || params.channel_view != bake.params.channel_view;
        bake.params = params;
        if changed {
            self.invalidate();
        }
        changed
    }

    /// Clear every tag; the next resolves re-upload.
    pub fn invalidate(&mut self) {
        for slot in &mut self.slots {
            slot.tag = None;
        }
    }

    /// Index of the slot carrying `key`.
    pub fn lookup(&self, key: &TileKey) -> Option<usize> {
        if key.is_empty() {
            return None;
        }
        self.slots.iter().position(|s| s.tag.as_ref() == Some(key))
    }

    /// Return the texture holding `key`, uploading it into the next
    /// round-robin slot on a miss. `percent` is the frame's progress once this
    /// tile is in place.
    pub fn resolve_tile(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        image: &dyn SourceImage,
        key: TileKey,
        percent: f32,
        progress: &dyn FrameProgress,
    ) -> Result<TextureId> {
        if let Some(index) = self.lookup(&key) {
            self.stats.hits += 1;
            return Ok(self.slots[index].texture);
        }
        if key.is_empty() || key.width > self.tile_width || key.height > self.tile_height {
            return Err(TileViewError::RegionOutOfBounds {
                x: key.x,
                y: key.y,
                width: key.width,
                height: key.height,
            });
        }

        self.stats.misses += 1;
        let victim = self.next_victim;
        let texture = self.slots[victim].texture;
        progress.report_progress((percent.clamp(0.0, 1.0) * 100.0).round() as u32);
        progress.set_busy(true);

        let (width, height) = (key.width, key.height);
        let pixel_bytes = self.format.pixel_bytes();
        let size = key.area() * pixel_bytes;

        let bytes_read = if let Some(bake) = &self.bake {
            let read = bake_region(image, key, bake, &mut self.scratch, &mut self.staging)?;
            backend.upload_region(texture, width, height, width as usize * 4, &self.staging)?;
            read
        } else if self.use_transfer_buffers {
            let index = self.next_transfer;
            let copied = match backend.map_transfer_buffer(index, size) {
                Ok(buffer) => image.copy_pixels(key, self.format.upload_format, buffer),
                Err(e) => {
                    self.stats.failed_uploads += 1;
                    warn!(x = key.x, y = key.y, "Tile upload abandoned: {e}");
                    return Err(e);
                }
            };
            backend.unmap_transfer_buffer(index);
            copied?;
            backend.upload_from_transfer_buffer(texture, index, width, height)?;
            self.next_transfer = (index + 1) % TRANSFER_BUFFER_COUNT;
            size
        } else {
            image.copy_pixels(key, self.format.upload_format, &mut self.staging[..size])?;
            backend.upload_region(
                texture,
                width,
                height,
                width as usize * pixel_bytes,
                &self.staging,
            )?;
            size
        };

        self.slots[victim].tag = Some(key);
        self.next_victim = (victim + 1) % self.slots.len();
        self.stats.uploads += 1;
        self.stats.bytes_copied += bytes_read;
        Ok(texture)
    }

    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    pub fn format(&self) -> &TextureFormat {
        &self.format
    }

    pub fn slots(&self) -> &[TileSlot] {
        &self.slots
    }

    pub fn textures(&self) -> Vec<TextureId> {
        self.slots.iter().map(|s| s.texture).collect()
    }

    /// Slot the next miss will overwrite.
    pub fn next_victim(&self) -> usize {
        self.next_victim
    }

    pub fn bakes_color(&self) -> bool {
        self.bake.is_some()
    }

    pub(crate) fn bake_settings(&self) -> Option<&BakeSettings> {
        self.bake.as_ref()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }
}

/// Texture extent for an image dimension: the next power of two, capped by
/// the texture limit.
pub fn tile_extent(image_extent: u32, max_texture_dimension: u32) -> u32 {
    image_extent
        .max(1)
        .checked_next_power_of_two()
        .unwrap_or(u32::MAX)
        .min(max_texture_dimension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_extent() {
        assert_eq!(tile_extent(5000, 2048), 2048);
        assert_eq!(tile_extent(3000, 4096), 4096);
        assert_eq!(tile_extent(600, 4096), 1024);
        assert_eq!(tile_extent(512, 4096), 512);
        assert_eq!(tile_extent(0, 4096), 1);
    }
}
