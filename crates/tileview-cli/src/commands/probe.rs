use anyhow::Result;
use clap::Args;
use console::Style;
use tileview_core::backend::GraphicsBackend;
use tileview_core::config::ViewerConfig;
use tileview_core::DisplaySurface;

use super::render::DeviceArg;
use super::DriverArgs;

#[derive(Args)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub driver: DriverArgs,

    /// Backend to probe
    #[arg(long, value_enum, default_value = "cpu")]
    pub device: DeviceArg,
}

pub fn run(args: &ProbeArgs) -> Result<()> {
    let config = args.driver.viewer_config()?;
    match args.device {
        DeviceArg::Cpu => report(args.driver.software_backend(), config),
        #[cfg(feature = "gpu")]
        DeviceArg::Gpu => report(tileview_core::backend::WgpuBackend::new()?, config),
        #[cfg(not(feature = "gpu"))]
        DeviceArg::Gpu => anyhow::bail!("built without the `gpu` feature"),
    }
}

fn report<B: GraphicsBackend>(backend: B, config: ViewerConfig) -> Result<()> {
    let mut surface = DisplaySurface::new(backend, config);
    let caps = surface.context_ready()?.clone();
    let on = Style::new().green();
    let off = Style::new().dim().yellow();
    let flag = |v: bool| {
        if v {
            on.apply_to("yes")
        } else {
            off.apply_to("no")
        }
    };

    println!(
        "{}",
        Style::new().cyan().bold().apply_to(format!("Backend: {}", surface.backend().name()))
    );
    println!("  {:<24}{}", "Shading", flag(caps.supports_shading));
    println!("  {:<24}{}", "  via extension", flag(caps.supports_shading_via_extension));
    println!("  {:<24}{}", "sRGB textures", flag(caps.supports_srgb));
    println!("  {:<24}{}", "Half-float pixels", flag(caps.supports_half_float));
    println!("  {:<24}{}", "Float textures", flag(caps.supports_float_textures));
    println!("  {:<24}{}", "Transfer buffers", flag(caps.supports_async_transfer_buffers));
    println!("  {:<24}{}", "Max texture", caps.max_texture_dimension);
    if let Some(kind) = surface.pipeline_kind() {
        println!("  {:<24}{}", "Colour path", kind);
    }
    Ok(())
}
