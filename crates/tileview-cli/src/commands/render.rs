use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use tileview_core::backend::GraphicsBackend;
use tileview_core::color::DisplayParams;
use tileview_core::config::ViewerConfig;
use tileview_core::input::Modifiers;
use tileview_core::progress::FrameProgress;
use tileview_core::source::SourceImage;
use tileview_core::view::FrameReport;
use tileview_core::DisplaySurface;

use super::{parse_point, parse_size, ChannelArg, DriverArgs, SourceArgs};

#[derive(Clone, Copy, ValueEnum)]
pub enum DeviceArg {
    /// Software rasteriser
    Cpu,
    /// wgpu (Metal / Vulkan / DX12); needs the `gpu` feature
    Gpu,
}

#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub driver: DriverArgs,

    /// Rendering device
    #[arg(long, value_enum, default_value = "cpu")]
    pub device: DeviceArg,

    /// Viewport size
    #[arg(long, value_parser = parse_size, default_value = "800x600")]
    pub size: (u32, u32),

    /// View centre in displayed image coordinates (default: image centre)
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub center: Option<(f32, f32)>,

    /// Zoom factor (default: fit the image to the viewport)
    #[arg(long)]
    pub zoom: Option<f32>,

    /// Exposure in stops
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    pub exposure: f32,

    /// Display gamma
    #[arg(long, default_value = "1.0")]
    pub gamma: f32,

    /// Channel to show
    #[arg(long, value_enum, default_value = "rgb")]
    pub channel: ChannelArg,

    /// Nearest-neighbour sampling instead of linear interpolation
    #[arg(long)]
    pub nearest: bool,

    /// Show the pixel inspector for the pixel under this window position
    #[arg(long, value_parser = parse_point)]
    pub inspect: Option<(f32, f32)>,

    /// Output PNG path
    #[arg(short, long, default_value = "view.png")]
    pub output: PathBuf,
}

/// Tile-upload progress on an indicatif bar.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg:14} [{bar:40}] {pos}%")?
                .progress_chars("=> "),
        );
        bar.set_message("Uploading tiles");
        Ok(Self { bar })
    }
}

impl FrameProgress for BarProgress {
    fn begin(&self, total_tiles: usize) {
        self.bar.set_message(format!("{total_tiles} tile(s)"));
        self.bar.set_position(0);
    }

    fn report_progress(&self, percent: u32) {
        self.bar.set_position(percent as u64);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

pub fn run(args: &RenderArgs) -> Result<()> {
    let config = args.driver.viewer_config()?;
    let image = args.source.load()?;

    let (rgba, report, summary) = match args.device {
        DeviceArg::Cpu => {
            let (backend, report, mut summary) =
                render(args.driver.software_backend(), config, image, args)?;
            summary.extend(
                backend
                    .text_runs()
                    .iter()
                    .map(|run| ("Readout", run.text.clone())),
            );
            (backend.to_rgba_image(), report, summary)
        }
        #[cfg(feature = "gpu")]
        DeviceArg::Gpu => {
            let backend = tileview_core::backend::WgpuBackend::new()?;
            let (backend, report, summary) = render(backend, config, image, args)?;
            (backend.read_pixels()?, report, summary)
        }
        #[cfg(not(feature = "gpu"))]
        DeviceArg::Gpu => anyhow::bail!("built without the `gpu` feature"),
    };

    rgba.save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let label = Style::new().dim();
    for (name, value) in summary {
        println!("  {:<14}{}", label.apply_to(name), value);
    }
    println!(
        "  {:<14}{} drawn, {} skipped",
        label.apply_to("Tiles"),
        report.tiles_drawn,
        report.tiles_skipped
    );
    println!("\nOutput saved to {}", args.output.display());
    Ok(())
}

type Summary = Vec<(&'static str, String)>;

fn render<B: GraphicsBackend>(
    backend: B,
    config: ViewerConfig,
    image: std::sync::Arc<dyn SourceImage>,
    args: &RenderArgs,
) -> Result<(B, FrameReport, Summary)> {
    let mut surface = DisplaySurface::new(backend, config);
    surface.set_progress(Box::new(BarProgress::new()?));
    surface.resize(args.size.0, args.size.1);
    surface.context_ready()?;
    surface.set_image(Some(image))?;
    surface.set_display_params(DisplayParams {
        exposure: args.exposure,
        gamma: args.gamma,
        channel: args.channel.into(),
        linear_interpolation: !args.nearest,
    });

    surface.fit_to_window();
    let view = *surface.view();
    let (cx, cy) = args.center.unwrap_or((view.center_x, view.center_y));
    surface.set_view(cx, cy, args.zoom.unwrap_or(view.zoom), true);

    if let Some((x, y)) = args.inspect {
        surface.set_inspector(true, false);
        surface.pointer_moved([x, y], Modifiers::NONE);
    }

    let report = surface.redraw()?;
    let view = *surface.view();
    let stats = surface.cache_stats();
    let mut summary: Summary = vec![
        ("Source", args.source.label()),
        ("Backend", surface.backend().name().to_string()),
        (
            "Colour path",
            surface
                .pipeline_kind()
                .map_or_else(String::new, |k| k.to_string()),
        ),
        (
            "View",
            format!(
                "centre ({:.1}, {:.1}) zoom {:.4} {}",
                view.center_x, view.center_y, view.zoom, view.orientation
            ),
        ),
        (
            "Uploads",
            format!("{} ({} bytes)", stats.uploads, stats.bytes_copied),
        ),
    ];
    if let Some(state) = surface.inspector().state() {
        summary.push(("Inspected", format!("{:?}", state.pixel)));
    }
    Ok((surface.into_backend(), report, summary))
}
