use tileview_core::backend::Viewport;
use tileview_core::input::{Modifiers, PointerButton};

use crate::app::TileViewApp;
use crate::egui_backend::EguiBackend;

/// Wheel units (120 per notch) per point of scroll. egui's native
/// backends turn one wheel line into about 40 points, so a notch lands near
/// 120 units; touchpads and other platforms scroll by different amounts.
const WHEEL_UNITS_PER_POINT: f32 = 3.0;

/// Scroll delta in points as wheel units.
fn wheel_units(scroll_points: f32) -> f32 {
    scroll_points * WHEEL_UNITS_PER_POINT
}

const READOUT_FONT_SIZE: f32 = 13.0;

pub fn show(ctx: &egui::Context, app: &mut TileViewApp) {
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE)
        .show(ctx, |ui| {
            let rect = ui.available_rect_before_wrap();
            let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
            let ppp = ctx.pixels_per_point();

            let size = Viewport::new(
                (rect.width() * ppp).round().max(0.0) as u32,
                (rect.height() * ppp).round().max(0.0) as u32,
            );
            if app.surface.viewport() != size {
                app.surface.resize(size.width, size.height);
            }
            if app.ui_state.fit_pending && size.width > 0 && size.height > 0 {
                app.surface.fit_to_window();
                app.ui_state.fit_pending = false;
            }

            forward_pointer(ui, &response, app, rect.min, ppp);

            if app.surface.needs_redraw() {
                if let Err(e) = app.surface.redraw() {
                    app.ui_state.add_log(format!("ERROR: redraw failed: {e}"));
                }
            }

            let painter = ui.painter_at(rect);
            paint_frame(&painter, app.surface.backend(), rect.min, ppp);

            if app.surface.image().is_none() {
                show_placeholder(&painter, rect, app.ui_state.loading);
            }
        });
}

/// Window position in surface pixels.
fn to_surface(pos: egui::Pos2, origin: egui::Pos2, ppp: f32) -> [f32; 2] {
    let local = (pos - origin) * ppp;
    [local.x, local.y]
}

fn map_button(button: egui::PointerButton) -> Option<PointerButton> {
    match button {
        egui::PointerButton::Primary => Some(PointerButton::Primary),
        egui::PointerButton::Secondary => Some(PointerButton::Secondary),
        egui::PointerButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

fn forward_pointer(
    ui: &egui::Ui,
    response: &egui::Response,
    app: &mut TileViewApp,
    origin: egui::Pos2,
    ppp: f32,
) {
    let (events, alt) = ui.input(|i| (i.events.clone(), i.modifiers.alt));
    let mods = if alt { Modifiers::ALT } else { Modifiers::NONE };

    for event in events {
        match event {
            egui::Event::PointerButton {
                pos,
                button,
                pressed,
                ..
            } => {
                let at = to_surface(pos, origin, ppp);
                if !pressed {
                    app.surface.pointer_released(at);
                } else if response.hovered() {
                    if let Some(button) = map_button(button) {
                        app.surface.pointer_pressed(at, button, mods);
                    }
                }
            }
            egui::Event::PointerMoved(pos) => {
                app.surface.pointer_moved(to_surface(pos, origin, ppp), mods);
            }
            _ => {}
        }
    }

    if response.hovered() {
        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll != 0.0 {
            app.surface.wheel(wheel_units(scroll));
        }
    }
}

/// Replay the backend's recorded frame inside the panel.
fn paint_frame(painter: &egui::Painter, backend: &EguiBackend, origin: egui::Pos2, ppp: f32) {
    for mesh in backend.meshes() {
        let mut mesh = mesh.clone();
        for v in &mut mesh.vertices {
            v.pos = origin + v.pos.to_vec2() / ppp;
        }
        painter.add(egui::Shape::mesh(mesh));
    }
    for run in backend.text_runs() {
        let pos = origin + egui::vec2(run.position[0], run.position[1]) / ppp;
        painter.text(
            pos,
            egui::Align2::LEFT_BOTTOM,
            &run.text,
            egui::FontId::monospace(READOUT_FONT_SIZE),
            egui::Color32::from_gray(230),
        );
    }
}

fn show_placeholder(painter: &egui::Painter, rect: egui::Rect, loading: bool) {
    let text = if loading {
        "Decoding..."
    } else {
        "Open an image to begin"
    };
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        text,
        egui::FontId::proportional(18.0),
        egui::Color32::from_gray(100),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_coordinates_scale_with_pixels_per_point() {
        let at = to_surface(egui::pos2(110.0, 60.0), egui::pos2(10.0, 20.0), 2.0);
        assert_eq!(at, [200.0, 80.0]);
    }

    #[test]
    fn test_one_line_of_scroll_is_one_notch() {
        assert_eq!(wheel_units(40.0), 120.0);
        assert_eq!(wheel_units(-40.0), -120.0);
    }

    #[test]
    fn test_extra_buttons_are_ignored() {
        assert_eq!(map_button(egui::PointerButton::Middle), Some(PointerButton::Middle));
        assert_eq!(map_button(egui::PointerButton::Extra1), None);
    }
}
