#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use tileview_core::backend::{SoftwareBackend, SoftwareFeatures};
use tileview_core::config::ViewerConfig;
use tileview_core::progress::FrameProgress;
use tileview_core::source::{ImageSpec, MemoryImage, PixelFormat, SourceImage};
use tileview_core::DisplaySurface;

/// 8-bit RGB image whose pixel (x, y) is `(x mod 256, y mod 256, (x + y) mod 256)`.
pub fn gradient_rgb8(width: u32, height: u32) -> MemoryImage {
    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8]);
        }
    }
    let spec = ImageSpec::new(width, height, 3, PixelFormat::U8);
    MemoryImage::from_raw(spec, data).unwrap()
}

/// Single-channel float image with value `x / width`.
pub fn ramp_gray_f32(width: u32, height: u32) -> MemoryImage {
    let samples: Vec<f32> = (0..height)
        .flat_map(|_| (0..width).map(move |x| x as f32 / width as f32))
        .collect();
    MemoryImage::from_f32(width, height, 1, &samples).unwrap()
}

/// Image of the given size without meaningful pixel content.
pub fn blank_u8(width: u32, height: u32, channels: usize) -> MemoryImage {
    let spec = ImageSpec::new(width, height, channels, PixelFormat::U8);
    let len = width as usize * height as usize * channels;
    MemoryImage::from_raw(spec, vec![0; len]).unwrap()
}

pub fn shared(image: MemoryImage) -> Arc<dyn SourceImage> {
    Arc::new(image)
}

/// A ready surface on a software driver, sized and showing `image`.
pub fn surface_with(
    features: SoftwareFeatures,
    config: ViewerConfig,
    image: MemoryImage,
    width: u32,
    height: u32,
) -> DisplaySurface<SoftwareBackend> {
    let mut surface = DisplaySurface::new(SoftwareBackend::new(features), config);
    surface.resize(width, height);
    surface.context_ready().unwrap();
    surface.set_image(Some(shared(image))).unwrap();
    surface
}

/// Records every progress callback. Clones share the event log.
#[derive(Clone, Default)]
pub struct RecordingProgress {
    pub events: Rc<RefCell<Vec<String>>>,
}

impl RecordingProgress {
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl FrameProgress for RecordingProgress {
    fn begin(&self, total_tiles: usize) {
        self.events.borrow_mut().push(format!("begin {total_tiles}"));
    }

    fn report_progress(&self, percent: u32) {
        self.events.borrow_mut().push(format!("progress {percent}"));
    }

    fn set_busy(&self, busy: bool) {
        self.events.borrow_mut().push(format!("busy {busy}"));
    }

    fn finish(&self) {
        self.events.borrow_mut().push("finish".into());
    }
}
