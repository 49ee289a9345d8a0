use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{
    CLOSEUP_PIXELS, CLOSEUP_TEXTURE_SIZE, CLOSEUP_WINDOW_SIZE, DEFAULT_TILE_POOL_SIZE,
    MAX_TEXTURE_CEILING, MAX_ZOOM, MIN_ZOOM,
};
use crate::error::{Result, TileViewError};

/// Tunables of the display surface. Every field has a default, so a TOML
/// file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Number of tile texture slots.
    pub tile_pool_size: usize,
    /// Upper bound applied to the driver's texture size limit.
    pub max_texture_ceiling: u32,
    /// Skip feature detection and run the fixed-function colour path.
    pub force_fixed_function: bool,
    pub clear_color: [f32; 4],
    pub zoom: ZoomLimits,
    pub inspector: InspectorConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            tile_pool_size: DEFAULT_TILE_POOL_SIZE,
            max_texture_ceiling: MAX_TEXTURE_CEILING,
            force_fixed_function: false,
            clear_color: [0.05, 0.05, 0.05, 1.0],
            zoom: ZoomLimits::default(),
            inspector: InspectorConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| TileViewError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TileViewError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_pool_size == 0 {
            return Err(TileViewError::Config(
                "tile_pool_size must be at least 1".into(),
            ));
        }
        if self.max_texture_ceiling == 0 {
            return Err(TileViewError::Config(
                "max_texture_ceiling must be at least 1".into(),
            ));
        }
        if !(self.zoom.min > 0.0 && self.zoom.min <= self.zoom.max) {
            return Err(TileViewError::Config(format!(
                "invalid zoom limits [{}, {}]",
                self.zoom.min, self.zoom.max
            )));
        }
        let insp = &self.inspector;
        if insp.pixels == 0 || insp.pixels % 2 == 0 {
            return Err(TileViewError::Config(format!(
                "inspector.pixels must be odd, got {}",
                insp.pixels
            )));
        }
        if insp.pixels > insp.texture_size {
            return Err(TileViewError::Config(format!(
                "inspector.pixels ({}) exceeds inspector.texture_size ({})",
                insp.pixels, insp.texture_size
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomLimits {
    pub min: f32,
    pub max: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: MIN_ZOOM,
            max: MAX_ZOOM,
        }
    }
}

impl ZoomLimits {
    pub fn clamp(&self, zoom: f32) -> f32 {
        if zoom.is_nan() {
            return self.min;
        }
        // Inverted limits from an unvalidated config resolve to `max`.
        zoom.max(self.min).min(self.max)
    }
}

/// Geometry of the pixel-view magnifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Side of the inspected neighbourhood in image pixels (odd).
    pub pixels: u32,
    /// Side of the dedicated inspector texture.
    pub texture_size: u32,
    /// Side of the magnified patch in window pixels.
    pub window_size: f32,
    pub follows_mouse: bool,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            pixels: CLOSEUP_PIXELS,
            texture_size: CLOSEUP_TEXTURE_SIZE,
            window_size: CLOSEUP_WINDOW_SIZE,
            follows_mouse: false,
        }
    }
}
