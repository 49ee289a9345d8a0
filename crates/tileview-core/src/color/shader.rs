use crate::backend::ProgramSource;

/// The colour program. Group 0 holds the frame uniforms, group 1 the tile
/// texture and sampler, group 2 the colour parameters.
///
/// `fs_main` is the programmable colour path. `fs_texture` is plain
/// texturing for the fixed-function path and `fs_solid` draws flat quads.
pub const COLOR_PROGRAM_WGSL: &str = r"
struct FrameUniforms {
    viewport: vec2<f32>,
    _pad: vec2<f32>,
}

struct ColorUniforms {
    gain: f32,
    gamma: f32,
    channel_view: i32,
    image_channels: i32,
    pixel_view: u32,
    linear_interp: u32,
    width: i32,
    height: i32,
}

struct VertexIn {
    @location(0) position: vec2<f32>,
    @location(1) tex_coord: vec2<f32>,
    @location(2) color: vec4<f32>,
}

struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) st: vec2<f32>,
    @location(1) color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> frame: FrameUniforms;
@group(1) @binding(0) var tile: texture_2d<f32>;
@group(1) @binding(1) var tile_sampler: sampler;
@group(2) @binding(0) var<uniform> params: ColorUniforms;

@vertex
fn vs_main(v: VertexIn) -> VertexOut {
    var out: VertexOut;
    let ndc = vec2<f32>(
        v.position.x / frame.viewport.x * 2.0 - 1.0,
        1.0 - v.position.y / frame.viewport.y * 2.0,
    );
    out.clip = vec4<f32>(ndc, 0.0, 1.0);
    out.st = v.tex_coord;
    out.color = v.color;
    return out;
}

@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    var st = in.st;
    var black = 0.0;
    if params.pixel_view != 0u || params.linear_interp == 0u {
        let wh = vec2<f32>(f32(params.width), f32(params.height));
        let res = st * wh;
        let pix = floor(res);
        let rem = res - pix;
        st = (pix + vec2<f32>(0.5, 0.5)) / wh;
        if params.pixel_view != 0u &&
           (st.x < 0.0 || st.x >= 1.0 || st.y < 0.0 || st.y >= 1.0 ||
            rem.x < 0.05 || rem.y < 0.05 || rem.x >= 0.95 || rem.y >= 0.95) {
            black = 1.0;
        }
    }

    var c = textureSampleLevel(tile, tile_sampler, st, 0.0);
    c = mix(c, vec4<f32>(0.05, 0.05, 0.05, 1.0), black);
    if params.pixel_view != 0u {
        c.w = 1.0;
    }

    if params.image_channels <= 2 {
        c = vec4<f32>(c.x, c.x, c.x, c.w);
    }
    if params.channel_view == 0 {
        c = vec4<f32>(c.x, c.x, c.x, c.w);
    } else if params.channel_view == 1 {
        c = vec4<f32>(c.y, c.y, c.y, c.w);
    } else if params.channel_view == 2 {
        c = vec4<f32>(c.z, c.z, c.z, c.w);
    } else if params.channel_view == 3 {
        c = vec4<f32>(c.w, c.w, c.w, c.w);
    } else if params.channel_view == -2 {
        let lum = dot(c.xyz, vec3<f32>(0.2126, 0.7152, 0.0722));
        c = vec4<f32>(lum, lum, lum, c.w);
    }

    var rgb = c.xyz * params.gain;
    let inv_gamma = 1.0 / params.gamma;
    if inv_gamma != 1.0 {
        rgb = pow(max(rgb, vec3<f32>(0.0)), vec3<f32>(inv_gamma));
    }
    return vec4<f32>(rgb, c.w);
}

@fragment
fn fs_texture(in: VertexOut) -> @location(0) vec4<f32> {
    return textureSampleLevel(tile, tile_sampler, in.st, 0.0);
}

@fragment
fn fs_solid(in: VertexOut) -> @location(0) vec4<f32> {
    return in.color;
}
";

pub const COLOR_PROGRAM: ProgramSource = ProgramSource {
    label: "tileview-color",
    wgsl: COLOR_PROGRAM_WGSL,
    vertex_entry: "vs_main",
    fragment_entry: "fs_main",
};
