use crate::app::TileViewApp;

pub fn show(ctx: &egui::Context, app: &mut TileViewApp) {
    egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
        ui.add_space(2.0);

        match app.frame_status.percent() {
            Some(percent) if percent < 100 || app.frame_status.is_busy() => {
                ui.add(
                    egui::ProgressBar::new(percent as f32 / 100.0)
                        .text(format!(
                            "Uploading {} tiles ({percent}%)",
                            app.frame_status.tiles_total()
                        ))
                        .animate(true),
                );
            }
            _ if app.ui_state.loading => {
                ui.add(egui::ProgressBar::new(0.0).text("Decoding...").animate(true));
            }
            _ => {
                ui.add(egui::ProgressBar::new(0.0).text(""));
            }
        }

        // Log area: fixed height for 3 lines, scrollable.
        let line_height = ui.text_style_height(&egui::TextStyle::Body);
        let spacing = ui.spacing().item_spacing.y;
        let log_height = line_height * 3.0 + spacing * 2.0;

        egui::ScrollArea::vertical()
            .max_height(log_height)
            .min_scrolled_height(log_height)
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for msg in &app.ui_state.log_messages {
                    ui.label(msg);
                }
            });

        ui.horizontal(|ui| {
            if let Some(summary) = &app.ui_state.image_summary {
                ui.label(summary);
                ui.separator();
            }
            let view = app.surface.view();
            ui.label(format!("Zoom: {:.0}%", view.zoom * 100.0));
            ui.separator();
            ui.label(format!("Centre: ({:.0}, {:.0})", view.center_x, view.center_y));
            ui.separator();
            let frame = app.surface.last_frame();
            let stats = app.surface.cache_stats();
            ui.label(format!(
                "Tiles: {}/{} drawn, {} hits, {} uploads",
                frame.tiles_drawn, frame.tiles_total, stats.hits, stats.uploads
            ));
            if let Some(kind) = app.surface.pipeline_kind() {
                ui.separator();
                ui.label(format!("Colour: {kind}"));
            }
        });

        ui.add_space(2.0);
    });
}
