use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;

use tileview_core::config::ViewerConfig;
use tileview_core::source::SourceImage;
use tileview_core::DisplaySurface;
use tracing::{error, warn};

use crate::egui_backend::EguiBackend;
use crate::messages::{WorkerCommand, WorkerResult};
use crate::panels;
use crate::progress::{FrameStatus, ViewerProgress};
use crate::states::{UIState, ViewportState};
use crate::worker;

pub struct TileViewApp {
    pub cmd_tx: mpsc::Sender<WorkerCommand>,
    pub result_rx: mpsc::Receiver<WorkerResult>,
    pub surface: DisplaySurface<EguiBackend>,
    pub frame_status: Arc<FrameStatus>,
    pub ui_state: UIState,
    pub viewport: ViewportState,
    pub show_about: bool,
}

impl TileViewApp {
    pub fn new(ctx: &egui::Context, config: ViewerConfig, config_path: Option<PathBuf>) -> Self {
        let (result_tx, result_rx) = mpsc::channel();
        let cmd_tx = worker::spawn_worker(result_tx, ctx.clone());
        let frame_status = Arc::new(FrameStatus::default());

        let mut app = Self {
            cmd_tx,
            result_rx,
            surface: build_surface(ctx, config, &frame_status),
            frame_status,
            ui_state: UIState {
                config_path,
                ..Default::default()
            },
            viewport: ViewportState::default(),
            show_about: false,
        };
        app.start_surface();
        app
    }

    /// Probe the backend and log which colour path was chosen.
    fn start_surface(&mut self) {
        match self.surface.context_ready() {
            Ok(caps) => {
                let max = caps.max_texture_dimension;
                let kind = self
                    .surface
                    .pipeline_kind()
                    .map(|k| k.to_string())
                    .unwrap_or_default();
                self.ui_state
                    .add_log(format!("Display ready: {kind} colour path, tiles up to {max}px"));
            }
            Err(e) => self.ui_state.add_log(format!("ERROR: display setup failed: {e}")),
        }
        self.apply_settings();
    }

    /// Drain all pending results from the worker.
    fn poll_results(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.result_rx.try_recv() {
            match result {
                WorkerResult::ImageLoaded {
                    path,
                    image,
                    elapsed,
                } => {
                    self.ui_state.loading = false;
                    let spec = image.spec();
                    let summary = format!(
                        "{}x{} {}ch {} {}",
                        spec.width,
                        spec.height,
                        spec.channel_count(),
                        spec.format,
                        spec.orientation
                    );
                    self.ui_state.add_log(format!(
                        "Opened: {} ({summary}) in {}",
                        path.display(),
                        format_duration(elapsed)
                    ));
                    self.ui_state.image_summary = Some(summary);
                    self.ui_state.file_path = Some(path);
                    self.show_image(image);
                }
                WorkerResult::ConfigLoaded { path, config } => {
                    self.ui_state.add_log(format!("Config loaded: {}", path.display()));
                    self.ui_state.config_path = Some(path);
                    self.replace_config(ctx, config);
                }
                WorkerResult::Error { message } => {
                    self.ui_state.loading = false;
                    self.ui_state.add_log(format!("ERROR: {message}"));
                }
            }
        }
    }

    fn show_image(&mut self, image: Arc<dyn SourceImage>) {
        self.viewport.orientation = None;
        match self.surface.set_image(Some(image)) {
            Ok(()) => {
                self.apply_settings();
                self.ui_state.fit_pending = true;
            }
            Err(e) => {
                warn!("Image rejected: {e}");
                self.ui_state.image_summary = None;
                self.ui_state.add_log(format!("ERROR: cannot display image: {e}"));
            }
        }
    }

    /// Rebuild the surface under a new config, keeping the image.
    fn replace_config(&mut self, ctx: &egui::Context, config: ViewerConfig) {
        let image = self.surface.image().cloned();
        let view = *self.surface.view();
        self.surface = build_surface(ctx, config, &self.frame_status);
        self.start_surface();
        if let Some(image) = image {
            if let Err(e) = self.surface.set_image(Some(image)) {
                self.ui_state.add_log(format!("ERROR: cannot display image: {e}"));
                return;
            }
            self.apply_settings();
            self.surface
                .set_view(view.center_x, view.center_y, view.zoom, true);
        }
    }

    /// Push the controls panel state into the surface.
    pub fn apply_settings(&mut self) {
        let v = self.viewport;
        self.surface.set_display_params(v.display);
        if let Some(orientation) = v.orientation {
            self.surface.set_orientation(orientation);
        } else if let Some(stored) = self.surface.image().map(|i| i.spec().orientation) {
            self.surface.set_orientation(stored);
        }
        self.surface.set_mouse_mode(v.mouse_mode);
        self.surface
            .set_inspector(v.inspector_enabled, v.inspector_follows_mouse);
    }

    pub fn send_command(&mut self, cmd: WorkerCommand) {
        let opens_image = matches!(cmd, WorkerCommand::OpenImage { .. });
        match self.cmd_tx.send(cmd) {
            Ok(()) => self.ui_state.loading |= opens_image,
            Err(e) => {
                error!("Worker unavailable: {e}");
                self.ui_state.add_log(format!("ERROR: worker unavailable: {e}"));
            }
        }
    }
}

fn build_surface(
    ctx: &egui::Context,
    config: ViewerConfig,
    status: &Arc<FrameStatus>,
) -> DisplaySurface<EguiBackend> {
    let mut surface = DisplaySurface::new(EguiBackend::new(ctx.clone()), config);
    surface.set_progress(Box::new(ViewerProgress::new(status.clone(), ctx.clone())));
    surface
}

impl eframe::App for TileViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_results(ctx);

        panels::menu_bar::show(ctx, self);
        panels::status::show(ctx, self);
        panels::controls::show(ctx, self);
        panels::viewport::show(ctx, self);

        if self.show_about {
            egui::Window::new("About TileView")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.heading("TileView");
                        ui.label("Tiled image viewer");
                        ui.add_space(8.0);
                        ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                        ui.add_space(8.0);
                        if ui.button("Close").clicked() {
                            self.show_about = false;
                        }
                    });
                });
        }
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", d.as_millis())
    } else {
        format!("{secs:.1}s")
    }
}
