pub mod config;
pub mod info;
pub mod probe;
pub mod render;
pub mod tiles;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use tileview_core::backend::{SoftwareBackend, SoftwareFeatures};
use tileview_core::color::ChannelView;
use tileview_core::config::ViewerConfig;
use tileview_core::source::{ImageSpec, MemoryImage, PixelFormat, SourceImage};
use tileview_core::view::Orientation;

/// Where the pixels come from: a file, or a blank image of a given size.
#[derive(Args)]
pub struct SourceArgs {
    /// Input image file
    #[arg(required_unless_present = "blank")]
    pub file: Option<PathBuf>,

    /// Use a blank RGB image of this size instead of a file (e.g. 5000x3000)
    #[arg(long, value_parser = parse_size, conflicts_with = "file")]
    pub blank: Option<(u32, u32)>,

    /// Override the image's orientation tag
    #[arg(long, value_enum)]
    pub orientation: Option<OrientationArg>,
}

impl SourceArgs {
    pub fn load(&self) -> Result<Arc<dyn SourceImage>> {
        let image = match (&self.file, self.blank) {
            (Some(path), _) => MemoryImage::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?,
            (None, Some((w, h))) => {
                let spec = ImageSpec::new(w, h, 3, PixelFormat::U8);
                MemoryImage::from_raw(spec, vec![0; w as usize * h as usize * 3])?
            }
            (None, None) => bail!("no input image given"),
        };
        let image = match self.orientation {
            Some(o) => image.with_orientation(o.into()),
            None => image,
        };
        Ok(Arc::new(image))
    }

    pub fn label(&self) -> String {
        match (&self.file, self.blank) {
            (Some(path), _) => path.display().to_string(),
            (None, Some((w, h))) => format!("blank {w}x{h}"),
            (None, None) => String::new(),
        }
    }
}

/// Software driver options shared by the rendering commands.
#[derive(Args)]
pub struct DriverArgs {
    /// Viewer config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emulate a driver without any optional feature
    #[arg(long)]
    pub legacy: bool,

    /// Skip capability detection and use the fixed-function colour path
    #[arg(long)]
    pub fixed_function: bool,
}

impl DriverArgs {
    pub fn viewer_config(&self) -> Result<ViewerConfig> {
        let mut config = load_config(self.config.as_deref())?;
        config.force_fixed_function |= self.fixed_function;
        Ok(config)
    }

    pub fn software_backend(&self) -> SoftwareBackend {
        let features = if self.legacy {
            SoftwareFeatures::legacy()
        } else {
            SoftwareFeatures::full()
        };
        SoftwareBackend::new(features)
    }
}

pub fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    match path {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("Invalid viewer config {}", path.display())),
        None => Ok(ViewerConfig::default()),
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OrientationArg {
    Normal,
    FlipH,
    Rotate180,
    FlipV,
    Transpose,
    Rotate90Cw,
    Transverse,
    Rotate90Ccw,
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Normal => Orientation::Normal,
            OrientationArg::FlipH => Orientation::FlipHorizontal,
            OrientationArg::Rotate180 => Orientation::Rotate180,
            OrientationArg::FlipV => Orientation::FlipVertical,
            OrientationArg::Transpose => Orientation::Transpose,
            OrientationArg::Rotate90Cw => Orientation::Rotate90Cw,
            OrientationArg::Transverse => Orientation::Transverse,
            OrientationArg::Rotate90Ccw => Orientation::Rotate90Ccw,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ChannelArg {
    Rgb,
    Red,
    Green,
    Blue,
    Alpha,
    Luminance,
}

impl From<ChannelArg> for ChannelView {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Rgb => ChannelView::All,
            ChannelArg::Red => ChannelView::Red,
            ChannelArg::Green => ChannelView::Green,
            ChannelArg::Blue => ChannelView::Blue,
            ChannelArg::Alpha => ChannelView::Alpha,
            ChannelArg::Luminance => ChannelView::Luminance,
        }
    }
}

/// Parse `WIDTHxHEIGHT`.
pub fn parse_size(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{s}`"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    if w == 0 || h == 0 {
        return Err("width and height must be positive".into());
    }
    Ok((w, h))
}

/// Parse `X,Y`.
pub fn parse_point(s: &str) -> std::result::Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got `{s}`"))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad x: {e}"))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad y: {e}"))?;
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("800x600"), Ok((800, 600)));
        assert_eq!(parse_size("5000X3000"), Ok((5000, 3000)));
        assert!(parse_size("800").is_err());
        assert!(parse_size("0x10").is_err());
    }

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("2500,1500.5"), Ok((2500.0, 1500.5)));
        assert_eq!(parse_point(" -3 , 4 "), Ok((-3.0, 4.0)));
        assert!(parse_point("3;4").is_err());
    }

    #[test]
    fn test_blank_source() {
        let args = SourceArgs {
            file: None,
            blank: Some((16, 8)),
            orientation: Some(OrientationArg::Rotate90Cw),
        };
        let image = args.load().unwrap();
        assert_eq!((image.spec().width, image.spec().height), (16, 8));
        assert_eq!(image.spec().orientation, Orientation::Rotate90Cw);
        assert_eq!(args.label(), "blank 16x8");
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.toml");
        std::fs::write(&path, "tile_pool_size = 2\n").unwrap();
        assert_eq!(load_config(Some(&path)).unwrap().tile_pool_size, 2);
        assert!(load_config(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
