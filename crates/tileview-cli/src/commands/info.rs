use anyhow::Result;
use clap::Args;
use console::Style;
use tileview_core::tiles::tile_extent;

use super::{load_config, SourceArgs};

#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Viewer config file (TOML)
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let image = args.source.load()?;
    let config = load_config(args.config.as_deref())?;
    let spec = image.spec();
    let label = Style::new().dim();

    println!("{:<14}{}", label.apply_to("Source"), args.source.label());
    println!("{:<14}{}x{}", label.apply_to("Dimensions"), spec.width, spec.height);
    println!(
        "{:<14}{} ({})",
        label.apply_to("Channels"),
        spec.channel_count(),
        spec.channel_names.join(", ")
    );
    println!("{:<14}{}", label.apply_to("Format"), spec.format);
    println!("{:<14}{:?}", label.apply_to("Linearity"), spec.linearity);
    println!(
        "{:<14}{} (EXIF {})",
        label.apply_to("Orientation"),
        spec.orientation,
        spec.orientation.exif_code()
    );
    println!(
        "{:<14}{}x{} at ({}, {})",
        label.apply_to("Data window"),
        spec.width,
        spec.height,
        spec.x,
        spec.y
    );
    println!(
        "{:<14}{}x{} at ({}, {})",
        label.apply_to("Display"),
        spec.full_width,
        spec.full_height,
        spec.full_x,
        spec.full_y
    );

    let tw = tile_extent(spec.width, config.max_texture_ceiling);
    let th = tile_extent(spec.height, config.max_texture_ceiling);
    let across = spec.width.div_ceil(tw);
    let down = spec.height.div_ceil(th);
    println!(
        "{:<14}{}x{} ({} x {} tiles at ceiling {})",
        label.apply_to("Tile size"),
        tw,
        th,
        across,
        down,
        config.max_texture_ceiling
    );
    Ok(())
}
