use serde::{Deserialize, Serialize};

/// Which channel(s) the colour program shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelView {
    #[default]
    All,
    Red,
    Green,
    Blue,
    Alpha,
    Luminance,
}

impl ChannelView {
    pub const ALL: [ChannelView; 6] = [
        Self::All,
        Self::Red,
        Self::Green,
        Self::Blue,
        Self::Alpha,
        Self::Luminance,
    ];

    /// Program encoding: -1 pass-through, 0..=3 single channel, -2 luminance.
    pub fn index(self) -> i32 {
        match self {
            Self::All => -1,
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
            Self::Alpha => 3,
            Self::Luminance => -2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "RGB",
            Self::Red => "Red",
            Self::Green => "Green",
            Self::Blue => "Blue",
            Self::Alpha => "Alpha",
            Self::Luminance => "Luminance",
        }
    }
}

/// Display settings supplied by the UI alongside the image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayParams {
    /// Stops; gain is `2^exposure`.
    pub exposure: f32,
    pub gamma: f32,
    pub channel: ChannelView,
    pub linear_interpolation: bool,
}

impl Default for DisplayParams {
    fn default() -> Self {
        Self {
            exposure: 0.0,
            gamma: 1.0,
            channel: ChannelView::All,
            linear_interpolation: true,
        }
    }
}

impl DisplayParams {
    /// True when the two settings produce different colours (sampling mode
    /// aside).
    pub fn color_differs(&self, other: &DisplayParams) -> bool {
        self.exposure != other.exposure || self.gamma != other.gamma || self.channel != other.channel
    }
}

/// Values of the colour program's named parameters for one draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorParams {
    pub gain: f32,
    pub gamma: f32,
    pub channel_view: i32,
    pub image_channels: i32,
    pub pixel_view: bool,
    pub linear_interpolation: bool,
    /// Size of the bound texture's backing store in texels.
    pub width: i32,
    pub height: i32,
}

impl ColorParams {
    pub fn new(display: &DisplayParams, image_channels: usize, width: u32, height: u32) -> Self {
        Self {
            gain: display.exposure.exp2(),
            gamma: display.gamma,
            channel_view: display.channel.index(),
            image_channels: image_channels as i32,
            pixel_view: false,
            linear_interpolation: display.linear_interpolation,
            width: width as i32,
            height: height as i32,
        }
    }

    pub fn with_pixel_view(mut self, width: u32, height: u32) -> Self {
        self.pixel_view = true;
        self.width = width as i32;
        self.height = height as i32;
        self
    }
}
