use serde::{Deserialize, Serialize};

/// EXIF orientation tag of a source image.
///
/// The discriminants are the EXIF codes. `Unknown` (0) and `Normal` (1) both
/// display the stored pixels as-is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Unknown = 0,
    Normal = 1,
    /// Mirrored left-to-right.
    FlipHorizontal = 2,
    /// Bottom-up, right-to-left.
    Rotate180 = 3,
    /// Mirrored top-to-bottom.
    FlipVertical = 4,
    /// Mirrored horizontally, then rotated 90° counter-clockwise.
    Transpose = 5,
    /// Rotated 90° clockwise.
    Rotate90Cw = 6,
    /// Mirrored horizontally, then rotated 90° clockwise.
    Transverse = 7,
    /// Rotated 90° counter-clockwise.
    Rotate90Ccw = 8,
}

impl Orientation {
    pub const ALL: [Orientation; 9] = [
        Self::Unknown,
        Self::Normal,
        Self::FlipHorizontal,
        Self::Rotate180,
        Self::FlipVertical,
        Self::Transpose,
        Self::Rotate90Cw,
        Self::Transverse,
        Self::Rotate90Ccw,
    ];

    /// Map an EXIF orientation code. Codes outside 0..=8 are `Unknown`.
    pub fn from_exif(code: u32) -> Self {
        match code {
            1 => Self::Normal,
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90Cw,
            7 => Self::Transverse,
            8 => Self::Rotate90Ccw,
            _ => Self::Unknown,
        }
    }

    pub fn exif_code(self) -> u32 {
        self as u32
    }

    /// True when the displayed image has width and height swapped.
    pub fn is_transposed(self) -> bool {
        matches!(
            self,
            Self::Transpose | Self::Rotate90Cw | Self::Transverse | Self::Rotate90Ccw
        )
    }

    /// Linear part of the image → window mapping, row-major, y pointing down.
    pub fn matrix(self) -> [[f32; 2]; 2] {
        match self {
            Self::Unknown | Self::Normal => [[1.0, 0.0], [0.0, 1.0]],
            Self::FlipHorizontal => [[-1.0, 0.0], [0.0, 1.0]],
            Self::Rotate180 => [[-1.0, 0.0], [0.0, -1.0]],
            Self::FlipVertical => [[1.0, 0.0], [0.0, -1.0]],
            Self::Transpose => [[0.0, 1.0], [1.0, 0.0]],
            Self::Rotate90Cw => [[0.0, -1.0], [1.0, 0.0]],
            Self::Transverse => [[0.0, -1.0], [-1.0, 0.0]],
            Self::Rotate90Ccw => [[0.0, 1.0], [-1.0, 0.0]],
        }
    }

    /// Convert a center given in displayed (oriented) coordinates into the
    /// stored image's own pixel coordinates. `width`/`height` are the stored
    /// (unoriented) dimensions.
    pub fn real_center(self, center: (f32, f32), width: u32, height: u32) -> (f32, f32) {
        let (cx, cy) = center;
        let (w, h) = (width as f32, height as f32);
        match self {
            Self::Unknown | Self::Normal => (cx, cy),
            Self::FlipHorizontal => (w - cx, cy),
            Self::Rotate180 => (w - cx, h - cy),
            Self::FlipVertical => (cx, h - cy),
            Self::Transpose => (cy, cx),
            Self::Rotate90Cw => (cy, h - cx),
            Self::Transverse => (w - cy, h - cx),
            Self::Rotate90Ccw => (w - cy, cx),
        }
    }

    /// Inverse of [`Orientation::real_center`].
    pub fn displayed_center(self, real: (f32, f32), width: u32, height: u32) -> (f32, f32) {
        let (rx, ry) = real;
        let (w, h) = (width as f32, height as f32);
        match self {
            Self::Unknown | Self::Normal => (rx, ry),
            Self::FlipHorizontal => (w - rx, ry),
            Self::Rotate180 => (w - rx, h - ry),
            Self::FlipVertical => (rx, h - ry),
            Self::Transpose => (ry, rx),
            Self::Rotate90Cw => (h - ry, rx),
            Self::Transverse => (h - ry, w - rx),
            Self::Rotate90Ccw => (ry, w - rx),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::Normal => write!(f, "Normal"),
            Self::FlipHorizontal => write!(f, "Flip horizontal"),
            Self::Rotate180 => write!(f, "Rotate 180°"),
            Self::FlipVertical => write!(f, "Flip vertical"),
            Self::Transpose => write!(f, "Transpose"),
            Self::Rotate90Cw => write!(f, "Rotate 90° CW"),
            Self::Transverse => write!(f, "Transverse"),
            Self::Rotate90Ccw => write!(f, "Rotate 90° CCW"),
        }
    }
}
