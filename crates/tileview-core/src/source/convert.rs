//! Per-format sample conversion. Samples are stored in native byte order.
//!
//! Normalised values: unsigned integers map to [0, 1], signed integers to
//! [-1, 1], floats pass through unchanged.

use half::f16;

use super::spec::PixelFormat;

/// Read one sample and normalise it.
pub fn read_sample(format: PixelFormat, bytes: &[u8]) -> f32 {
    match format {
        PixelFormat::U8 => bytes[0] as f32 / u8::MAX as f32,
        PixelFormat::I8 => (i8::from_ne_bytes([bytes[0]]) as f32 / i8::MAX as f32).max(-1.0),
        PixelFormat::U16 => u16::from_ne_bytes([bytes[0], bytes[1]]) as f32 / u16::MAX as f32,
        PixelFormat::I16 => {
            (i16::from_ne_bytes([bytes[0], bytes[1]]) as f32 / i16::MAX as f32).max(-1.0)
        }
        PixelFormat::U32 => {
            (u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
                / u32::MAX as f64) as f32
        }
        PixelFormat::I32 => ((i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            / i32::MAX as f64) as f32)
            .max(-1.0),
        PixelFormat::F16 => f16::from_ne_bytes([bytes[0], bytes[1]]).to_f32(),
        PixelFormat::F32 => f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

/// Read one sample without normalisation, for numeric readouts.
pub fn read_raw(format: PixelFormat, bytes: &[u8]) -> f64 {
    match format {
        PixelFormat::U8 => bytes[0] as f64,
        PixelFormat::I8 => i8::from_ne_bytes([bytes[0]]) as f64,
        PixelFormat::U16 => u16::from_ne_bytes([bytes[0], bytes[1]]) as f64,
        PixelFormat::I16 => i16::from_ne_bytes([bytes[0], bytes[1]]) as f64,
        PixelFormat::U32 => u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
        PixelFormat::I32 => i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
        PixelFormat::F16 => f16::from_ne_bytes([bytes[0], bytes[1]]).to_f64(),
        PixelFormat::F32 => f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
    }
}

/// Write one normalised sample, clamping integer targets to their range.
pub fn write_sample(format: PixelFormat, value: f32, out: &mut [u8]) {
    match format {
        PixelFormat::U8 => out[0] = (value.clamp(0.0, 1.0) * u8::MAX as f32).round() as u8,
        PixelFormat::I8 => {
            let v = (value.clamp(-1.0, 1.0) * i8::MAX as f32).round() as i8;
            out[..1].copy_from_slice(&v.to_ne_bytes());
        }
        PixelFormat::U16 => {
            let v = (value.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16;
            out[..2].copy_from_slice(&v.to_ne_bytes());
        }
        PixelFormat::I16 => {
            let v = (value.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
            out[..2].copy_from_slice(&v.to_ne_bytes());
        }
        PixelFormat::U32 => {
            let v = (value.clamp(0.0, 1.0) as f64 * u32::MAX as f64).round() as u32;
            out[..4].copy_from_slice(&v.to_ne_bytes());
        }
        PixelFormat::I32 => {
            let v = (value.clamp(-1.0, 1.0) as f64 * i32::MAX as f64).round() as i32;
            out[..4].copy_from_slice(&v.to_ne_bytes());
        }
        PixelFormat::F16 => out[..2].copy_from_slice(&f16::from_f32(value).to_ne_bytes()),
        PixelFormat::F32 => out[..4].copy_from_slice(&value.to_ne_bytes()),
    }
}

/// Convert `samples` consecutive samples from one format to another.
pub fn convert_samples(
    src: &[u8],
    src_format: PixelFormat,
    dst: &mut [u8],
    dst_format: PixelFormat,
    samples: usize,
) {
    if src_format == dst_format {
        let n = samples * src_format.bytes();
        dst[..n].copy_from_slice(&src[..n]);
        return;
    }
    let (sb, db) = (src_format.bytes(), dst_format.bytes());
    for (s, d) in src
        .chunks_exact(sb)
        .zip(dst.chunks_exact_mut(db))
        .take(samples)
    {
        write_sample(dst_format, read_sample(src_format, s), d);
    }
}

/// sRGB electro-optical transfer function.
pub fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}
