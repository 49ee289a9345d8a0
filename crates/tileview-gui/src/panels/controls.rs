use tileview_core::color::ChannelView;
use tileview_core::input::MouseMode;
use tileview_core::view::Orientation;

use super::helpers::{enum_combo, section_header};
use crate::app::TileViewApp;
use crate::states::ViewportState;

const LEFT_PANEL_WIDTH: f32 = 240.0;

pub fn show(ctx: &egui::Context, app: &mut TileViewApp) {
    let before = app.viewport;

    egui::SidePanel::left("controls")
        .default_width(LEFT_PANEL_WIDTH)
        .resizable(true)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.set_min_width(LEFT_PANEL_WIDTH - 20.0);

                color_section(ui, &mut app.viewport);
                ui.separator();
                orientation_section(ui, app);
                ui.separator();
                mouse_section(ui, &mut app.viewport);
                ui.separator();
                inspector_section(ui, &mut app.viewport);
            });
        });

    if app.viewport != before {
        app.apply_settings();
    }
}

fn color_section(ui: &mut egui::Ui, state: &mut ViewportState) {
    let status = format!("gain x{:.2}", state.display.exposure.exp2());
    section_header(ui, "Colour", Some(&status));

    ui.add(
        egui::Slider::new(&mut state.display.exposure, -10.0..=10.0)
            .step_by(0.1)
            .text("Exposure"),
    );
    ui.add(
        egui::Slider::new(&mut state.display.gamma, 0.1..=4.0)
            .logarithmic(true)
            .text("Gamma"),
    );
    enum_combo(
        ui,
        "Channel",
        &mut state.display.channel,
        &ChannelView::ALL,
        |c| c.label().to_string(),
    );
    ui.checkbox(&mut state.display.linear_interpolation, "Linear interpolation");

    if ui.button("Reset").clicked() {
        state.display = Default::default();
    }
}

fn orientation_section(ui: &mut egui::Ui, app: &mut TileViewApp) {
    let stored = app
        .surface
        .image()
        .map(|i| i.spec().orientation)
        .unwrap_or_default();
    section_header(ui, "Orientation", Some(&format!("EXIF {}", stored.exif_code())));

    let mut choice = app.viewport.orientation.unwrap_or(stored);
    if enum_combo(ui, "Orientation", &mut choice, &Orientation::ALL[1..], |o| o.to_string()) {
        app.viewport.orientation = Some(choice);
    }
    if app.viewport.orientation.is_some() && ui.button("Use stored").clicked() {
        app.viewport.orientation = None;
    }
}

fn mouse_section(ui: &mut egui::Ui, state: &mut ViewportState) {
    section_header(ui, "Mouse", None);
    ui.horizontal_wrapped(|ui| {
        for mode in MouseMode::ALL {
            ui.selectable_value(&mut state.mouse_mode, mode, mode.label());
        }
    });
    ui.small("Middle drag or Alt+drag pans; Alt+right drag zooms.");
}

fn inspector_section(ui: &mut egui::Ui, state: &mut ViewportState) {
    section_header(ui, "Pixel View", None);
    ui.checkbox(&mut state.inspector_enabled, "Show pixel view");
    ui.add_enabled(
        state.inspector_enabled,
        egui::Checkbox::new(&mut state.inspector_follows_mouse, "Follow mouse"),
    );
}
