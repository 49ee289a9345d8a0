//! CPU reference implementation of the colour program. The WGSL program in
//! `shader.rs` computes the same function.

use super::params::ColorParams;
use crate::consts::{
    BACKGROUND_GRAY, LUMINANCE_B, LUMINANCE_G, LUMINANCE_R, PIXEL_GRID_SEAM, PIXEL_GRID_SEAM_END,
};

/// Full program: texel snapping, pixel-view grid, then [`apply_color`].
pub fn shade(sample: impl Fn([f32; 2]) -> [f32; 4], tex_coord: [f32; 2], p: &ColorParams) -> [f32; 4] {
    let mut st = tex_coord;
    let mut grid = 0.0;

    if p.pixel_view || !p.linear_interpolation {
        let wh = [p.width as f32, p.height as f32];
        let res = [st[0] * wh[0], st[1] * wh[1]];
        let pix = [res[0].floor(), res[1].floor()];
        let rem = [res[0] - pix[0], res[1] - pix[1]];
        st = [(pix[0] + 0.5) / wh[0], (pix[1] + 0.5) / wh[1]];
        if p.pixel_view
            && (st[0] < 0.0
                || st[0] >= 1.0
                || st[1] < 0.0
                || st[1] >= 1.0
                || rem[0] < PIXEL_GRID_SEAM
                || rem[1] < PIXEL_GRID_SEAM
                || rem[0] >= PIXEL_GRID_SEAM_END
                || rem[1] >= PIXEL_GRID_SEAM_END)
        {
            grid = 1.0;
        }
    }

    let mut c = sample(st);
    let background = [BACKGROUND_GRAY, BACKGROUND_GRAY, BACKGROUND_GRAY, 1.0];
    for (v, b) in c.iter_mut().zip(background) {
        *v = *v * (1.0 - grid) + b * grid;
    }
    if p.pixel_view {
        c[3] = 1.0;
    }
    apply_color(c, p)
}

/// Channel broadcast, channel isolation, gain and gamma.
pub fn apply_color(mut c: [f32; 4], p: &ColorParams) -> [f32; 4] {
    if p.image_channels <= 2 {
        c[1] = c[0];
        c[2] = c[0];
    }

    let shown = match p.channel_view {
        0..=3 => Some(c[p.channel_view as usize]),
        -2 => Some(c[0] * LUMINANCE_R + c[1] * LUMINANCE_G + c[2] * LUMINANCE_B),
        _ => None,
    };
    if let Some(v) = shown {
        c[0] = v;
        c[1] = v;
        c[2] = v;
    }

    let inv_gamma = 1.0 / p.gamma;
    for v in &mut c[..3] {
        *v *= p.gain;
        if inv_gamma != 1.0 {
            *v = v.max(0.0).powf(inv_gamma);
        }
    }
    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ChannelView, DisplayParams};

    fn params(display: DisplayParams, channels: usize) -> ColorParams {
        ColorParams::new(&display, channels, 4, 4)
    }

    #[test]
    fn test_defaults_are_identity() {
        let p = params(DisplayParams::default(), 4);
        let c = [0.1, 0.5, 0.9, 0.3];
        assert_eq!(apply_color(c, &p), c);
    }

    #[test]
    fn test_luminance_weights() {
        let display = DisplayParams {
            channel: ChannelView::Luminance,
            ..Default::default()
        };
        let out = apply_color([1.0, 0.0, 0.0, 1.0], &params(display, 3));
        assert!((out[0] - LUMINANCE_R).abs() < 1e-6);
        assert_eq!(out[0], out[2]);
    }

    #[test]
    fn test_exposure_doubles_gain() {
        let display = DisplayParams {
            exposure: 1.0,
            ..Default::default()
        };
        let out = apply_color([0.25, 0.25, 0.25, 1.0], &params(display, 3));
        assert_eq!(out[0], 0.5);
    }

    #[test]
    fn test_grid_on_texel_seam() {
        let p = params(DisplayParams::default(), 3).with_pixel_view(4, 4);
        let white = |_st: [f32; 2]| [1.0, 1.0, 1.0, 1.0];
        let seam = shade(white, [0.25, 0.6], &p);
        let inside = shade(white, [0.375, 0.625], &p);
        assert_eq!(seam[0], BACKGROUND_GRAY);
        assert_eq!(inside[0], 1.0);
    }
}
