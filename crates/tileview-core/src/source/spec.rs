use serde::{Deserialize, Serialize};

use crate::view::Orientation;

/// Storage type of one channel sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F16,
    F32,
}

impl PixelFormat {
    /// Bytes per sample.
    pub const fn bytes(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 | Self::F16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::F16 | Self::F32)
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32)
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::U8 => "uint8",
            Self::I8 => "int8",
            Self::U16 => "uint16",
            Self::I16 => "int16",
            Self::U32 => "uint32",
            Self::I32 => "int32",
            Self::F16 => "half",
            Self::F32 => "float",
        };
        f.write_str(name)
    }
}

/// Transfer characteristic of the stored values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Linearity {
    #[default]
    Linear,
    Srgb,
}

/// Pixel rectangle in absolute image coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn x_end(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn y_end(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn contains_region(&self, other: &Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x_end() <= self.x_end()
            && other.y_end() <= self.y_end()
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x_end() && y < self.y_end()
    }
}

/// Data and display windows of an image as seen through an orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrientedExtent {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub full_x: i32,
    pub full_y: i32,
    pub full_width: u32,
    pub full_height: u32,
}

/// Description of a source image: data window, display window, channels,
/// sample format, orientation tag and linearity.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageSpec {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub full_x: i32,
    pub full_y: i32,
    pub full_width: u32,
    pub full_height: u32,
    pub channel_names: Vec<String>,
    pub format: PixelFormat,
    pub orientation: Orientation,
    pub linearity: Linearity,
}

impl ImageSpec {
    /// Spec whose data and display windows coincide at the origin.
    pub fn new(width: u32, height: u32, channels: usize, format: PixelFormat) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
            full_x: 0,
            full_y: 0,
            full_width: width,
            full_height: height,
            channel_names: Self::default_channel_names(channels),
            format,
            orientation: Orientation::Normal,
            linearity: Linearity::Linear,
        }
    }

    pub fn default_channel_names(channels: usize) -> Vec<String> {
        let base: &[&str] = match channels {
            1 => &["Y"],
            2 => &["Y", "A"],
            3 => &["R", "G", "B"],
            _ => &["R", "G", "B", "A"],
        };
        (0..channels)
            .map(|c| {
                base.get(c)
                    .map(|s| (*s).to_string())
                    .unwrap_or_else(|| format!("channel{c}"))
            })
            .collect()
    }

    pub fn channel_count(&self) -> usize {
        self.channel_names.len()
    }

    /// Bytes per pixel in the native format.
    pub fn pixel_bytes(&self) -> usize {
        self.channel_count() * self.format.bytes()
    }

    pub fn data_window(&self) -> Region {
        Region::new(self.x, self.y, self.width, self.height)
    }

    /// Windows as displayed under `orientation`: the axes swap for 5..=8.
    pub fn oriented(&self, orientation: Orientation) -> OrientedExtent {
        if orientation.is_transposed() {
            OrientedExtent {
                x: self.y,
                y: self.x,
                width: self.height,
                height: self.width,
                full_x: self.full_y,
                full_y: self.full_x,
                full_width: self.full_height,
                full_height: self.full_width,
            }
        } else {
            OrientedExtent {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
                full_x: self.full_x,
                full_y: self.full_y,
                full_width: self.full_width,
                full_height: self.full_height,
            }
        }
    }
}
