use anyhow::Result;
use clap::Args;
use console::Style;
use tileview_core::DisplaySurface;

use super::{parse_point, parse_size, DriverArgs, SourceArgs};

#[derive(Args)]
pub struct TilesArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub driver: DriverArgs,

    /// Viewport size
    #[arg(long, value_parser = parse_size, default_value = "800x600")]
    pub size: (u32, u32),

    /// View centre in displayed image coordinates (default: image centre)
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub center: Option<(f32, f32)>,

    /// Zoom factor
    #[arg(long, default_value = "1.0")]
    pub zoom: f32,
}

/// Print the tiles a view needs, in drawing order.
pub fn run(args: &TilesArgs) -> Result<()> {
    let image = args.source.load()?;
    let (cx, cy) = args.center.unwrap_or_else(|| {
        let spec = image.spec();
        let ext = spec.oriented(spec.orientation);
        (
            ext.x as f32 + ext.width as f32 * 0.5,
            ext.y as f32 + ext.height as f32 * 0.5,
        )
    });

    let mut surface = DisplaySurface::new(args.driver.software_backend(), args.driver.viewer_config()?);
    surface.resize(args.size.0, args.size.1);
    surface.context_ready()?;
    surface.set_image(Some(image))?;
    surface.set_view(cx, cy, args.zoom, false);

    let view = surface.view();
    let (tw, th) = surface
        .tile_cache()
        .map_or((0, 0), |cache| cache.tile_size());
    let dim = Style::new().dim();
    println!(
        "{} centre ({:.1}, {:.1}) zoom {} orientation {} tile {}x{}",
        dim.apply_to("view"),
        view.center_x,
        view.center_y,
        view.zoom,
        view.orientation,
        tw,
        th
    );

    let tiles = surface.visible_tiles();
    println!("{:>8} {:>8} {:>8} {:>8} {:>10}", "x", "y", "width", "height", "tex max");
    for tile in &tiles {
        println!(
            "{:>8} {:>8} {:>8} {:>8} {:>5.3},{:.3}",
            tile.key.x, tile.key.y, tile.key.width, tile.key.height, tile.tex_max[0], tile.tex_max[1]
        );
    }
    println!("{} tile(s)", Style::new().bold().apply_to(tiles.len()));
    Ok(())
}
