// src/visualization/window.rs

use super::plotter::TimingPlotter;
use super::{color32, egui_events, PainterCanvas};
use crate::config::DisplayConfig;
use crate::display::{DisplayEvent, Key, Rgb};
use crate::error::{Result, StimulusError};
use crate::glass::{generate, GlassImageConfig, GlassPattern};
use crate::timing::{Clock, PulseScheduler, TimingSummary};
use crate::utils::log::print_error;

use std::sync::{Arc, Mutex};

pub type SummarySlot = Arc<Mutex<Option<TimingSummary>>>;

fn native_options(display: &DisplayConfig, title: &str) -> eframe::NativeOptions {
    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([display.width as f32, display.height as f32])
            .with_fullscreen(display.fullscreen)
            .with_title(title),
        vsync: display.vsync,
        ..Default::default()
    }
}

// FLICKER WINDOW --------------------------------------------------------------

enum Phase {
    /// First frame: paint the background so the run starts from a blank screen.
    Clearing,
    Running { started: bool },
    Finished(TimingSummary),
}

/// Drives a `PulseScheduler` one frame per egui update. eframe's buffer swap
/// after `update` returns is the present (and the vsync wait), so a frame's
/// post-present time is taken at the start of the next update.
pub struct FlickerWindow<C: Clock> {
    scheduler: PulseScheduler<C>,
    plotter: TimingPlotter,
    background: Rgb,
    phase: Phase,
    awaiting_present: bool,
    result: SummarySlot,
}

impl<C: Clock + 'static> FlickerWindow<C> {
    pub fn new(scheduler: PulseScheduler<C>, result: SummarySlot) -> Self {
        let background = scheduler.options().background_color;
        Self {
            scheduler,
            plotter: TimingPlotter::new(5000),
            background,
            phase: Phase::Clearing,
            awaiting_present: false,
            result,
        }
    }

    /// Opens the stimulus window and blocks until it is closed. Returns the
    /// run summary if the run got far enough to produce one.
    pub fn run(scheduler: PulseScheduler<C>, display: &DisplayConfig) -> Result<Option<TimingSummary>> {
        let result: SummarySlot = Arc::new(Mutex::new(None));
        let app = FlickerWindow::new(scheduler, Arc::clone(&result));

        eframe::run_native(
            "Flicker",
            native_options(display, "Flicker"),
            Box::new(|_cc| Ok(Box::new(app))),
        )
        .map_err(|e| StimulusError::Window(e.to_string()))?;

        let summary = result
            .lock()
            .map_err(|_| StimulusError::Window("summary lock poisoned".to_string()))?
            .take();
        Ok(summary)
    }

    fn finish(&mut self) {
        let summary = self.scheduler.summary();
        if let Ok(mut slot) = self.result.lock() {
            *slot = Some(summary.clone());
        }
        self.phase = Phase::Finished(summary);
    }

    fn paint_background(&self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(color32(self.background)))
            .show(ctx, |_ui| {});
    }

    fn run_frame(&mut self, ctx: &egui::Context, started: bool) {
        if self.awaiting_present {
            let sample = self.scheduler.mark_presented();
            self.plotter.add_sample(&sample);
            self.awaiting_present = false;
        } else if !started {
            self.scheduler.mark_started();
            self.phase = Phase::Running { started: true };
        }

        if self.scheduler.is_finished() {
            self.finish();
            return;
        }
        if egui_events(ctx).iter().any(DisplayEvent::is_cancel) {
            self.scheduler.cancel();
            self.finish();
            return;
        }

        let background = self.background;
        let scheduler = &mut self.scheduler;
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(color32(background)))
            .show(ctx, |ui| {
                let mut canvas = PainterCanvas::new(ui.painter(), ctx.screen_rect(), ctx.pixels_per_point());
                scheduler.draw_frame(&mut canvas);
            });

        self.scheduler.wait_for_deadline();
        self.scheduler.mark_submitted();
        self.awaiting_present = true;
        ctx.request_repaint();
    }

    fn show_report(&self, ctx: &egui::Context, summary: &TimingSummary) {
        if egui_events(ctx).iter().any(|e| e.is_cancel()) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Flicker timing report");
            ui.label(format!(
                "{:.3} Hz frame rate, {} blank frames per flash, {} frames, {} pulses{}",
                summary.frame_rate_hz,
                summary.off_frames_per_on,
                summary.frames,
                summary.pulses,
                if summary.cancelled { " (cancelled)" } else { "" }
            ));
            ui.label(format!(
                "{} over-long flips, {} next to a flash",
                summary.anomalies, summary.flash_adjacent_anomalies
            ));
            ui.separator();

            egui::Grid::new("timing_summary").striped(true).show(ui, |ui| {
                for header in ["", "mean", "std", "min", "max", "n"] {
                    ui.strong(header);
                }
                ui.end_row();
                for (name, s) in summary.named_stats() {
                    ui.label(name);
                    ui.label(format!("{:.3}", s.mean));
                    ui.label(format!("{:.3}", s.stdev));
                    ui.label(format!("{:.3}", s.min));
                    ui.label(format!("{:.3}", s.max));
                    ui.label(s.n.to_string());
                    ui.end_row();
                }
            });
            ui.separator();

            if self.plotter.is_empty() {
                ui.label("No frames were presented.");
            } else {
                self.plot_timing(ui);
            }
            ui.label("Press Escape to close.");
        });
    }

    fn plot_timing(&self, ui: &mut egui::Ui) {
        use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

        let flip = Line::new(PlotPoints::from(self.plotter.flip_ms()))
            .name("flip ms")
            .color(egui::Color32::LIGHT_BLUE);
        let err_pre = Line::new(PlotPoints::from(self.plotter.err_pre()))
            .name("error pre ms")
            .color(egui::Color32::LIGHT_GREEN);
        let err_post = Line::new(PlotPoints::from(self.plotter.err_post()))
            .name("error post ms")
            .color(egui::Color32::LIGHT_RED);
        let flashes = Points::new(PlotPoints::from(self.plotter.on_frames()))
            .name("flash frames")
            .radius(2.5)
            .color(egui::Color32::WHITE);

        Plot::new("flicker_timing")
            .legend(Legend::default())
            .height(ui.available_height() - 24.0)
            .show_axes([true, true])
            .show_grid([true, true])
            .show(ui, |plot_ui| {
                plot_ui.line(flip);
                plot_ui.line(err_pre);
                plot_ui.line(err_post);
                plot_ui.points(flashes);
            });
    }
}

impl<C: Clock + 'static> eframe::App for FlickerWindow<C> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match &self.phase {
            Phase::Clearing => {
                self.paint_background(ctx);
                self.phase = Phase::Running { started: false };
                ctx.request_repaint();
            }
            Phase::Running { started } => {
                let started = *started;
                self.run_frame(ctx, started);
                if let Phase::Finished(_) = self.phase {
                    ctx.request_repaint();
                }
            }
            Phase::Finished(summary) => {
                let summary = summary.clone();
                self.show_report(ctx, &summary);
            }
        }
    }
}

// GLASS VIEWER ----------------------------------------------------------------

/// Interactive Glass pattern preview. Space draws a new seed, Up/Down step the
/// angle, H flips handedness, S saves a PNG, Escape closes.
pub struct GlassViewer {
    config: GlassImageConfig,
    pattern: Option<GlassPattern>,
    texture: Option<egui::TextureHandle>,
    dirty: bool,
    status: String,
}

impl GlassViewer {
    pub fn new(config: GlassImageConfig) -> Self {
        Self {
            config,
            pattern: None,
            texture: None,
            dirty: true,
            status: String::new(),
        }
    }

    pub fn run(config: GlassImageConfig) -> Result<()> {
        let side = config.size_px;
        let display = DisplayConfig {
            width: side,
            height: side,
            fullscreen: false,
            ..DisplayConfig::default()
        };
        let viewer = GlassViewer::new(config);

        eframe::run_native(
            "Glass pattern",
            native_options(&display, "Glass pattern"),
            Box::new(|_cc| Ok(Box::new(viewer))),
        )
        .map_err(|e| StimulusError::Window(e.to_string()))
    }

    fn title(&self) -> String {
        format!(
            "Glass pattern | angle={:.1}° ({})  SNR={:.2}  density={:.2}  shift={}px  dotsize={}px",
            self.config.angle_deg,
            self.config.handedness,
            self.config.snr,
            self.config.density,
            self.config.shift_px,
            self.config.dot_radius_px
        )
    }

    fn handle_event(&mut self, ctx: &egui::Context, event: DisplayEvent) {
        match event {
            DisplayEvent::Quit | DisplayEvent::KeyPressed(Key::Escape) => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            DisplayEvent::KeyPressed(Key::Space) => {
                self.config.seed = Some(rand::random());
                self.dirty = true;
            }
            DisplayEvent::KeyPressed(Key::Up) => {
                self.config.angle_deg = (self.config.angle_deg + 1.0).min(90.0);
                self.dirty = true;
            }
            DisplayEvent::KeyPressed(Key::Down) => {
                self.config.angle_deg = (self.config.angle_deg - 1.0).max(0.0);
                self.dirty = true;
            }
            DisplayEvent::KeyPressed(Key::Char('h')) => {
                self.config.handedness = self.config.handedness.toggled();
                self.dirty = true;
            }
            DisplayEvent::KeyPressed(Key::Char('s')) => self.save(),
            _ => {}
        }
    }

    fn save(&mut self) {
        let Some(pattern) = &self.pattern else {
            return;
        };
        let path = format!(
            "glass_{}_{}.png",
            self.config.angle_deg.round() as i64,
            self.config.handedness
        );
        match pattern.image.save_png(&path) {
            Ok(()) => {
                println!("Saved: {}", path);
                self.status = format!("Saved {}", path);
            }
            Err(e) => {
                print_error(&e.to_string());
                self.status = e.to_string();
            }
        }
    }

    fn regenerate(&mut self, ctx: &egui::Context) {
        self.dirty = false;
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(self.title()));

        match generate(&self.config) {
            Ok(pattern) => {
                // keep the drawn seed so S saves exactly what is on screen
                self.config.seed = Some(pattern.seed);
                let image = egui::ColorImage::from_rgb(
                    [pattern.image.width() as usize, pattern.image.height() as usize],
                    pattern.image.as_bytes(),
                );
                self.texture = Some(ctx.load_texture("glass", image, egui::TextureOptions::NEAREST));
                self.status = format!(
                    "seed {} | {} dipoles, {} drawn",
                    pattern.seed,
                    pattern.dipoles.len(),
                    pattern.rendered.len()
                );
                self.pattern = Some(pattern);
            }
            Err(e) => {
                print_error(&e.to_string());
                self.status = e.to_string();
            }
        }
    }
}

impl eframe::App for GlassViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for event in egui_events(ctx) {
            self.handle_event(ctx, event);
        }
        if self.dirty {
            self.regenerate(ctx);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                if let Some(texture) = &self.texture {
                    ui.image((texture.id(), texture.size_vec2()));
                }
                if !self.status.is_empty() {
                    ui.colored_label(egui::Color32::GRAY, &self.status);
                }
            });
    }
}
