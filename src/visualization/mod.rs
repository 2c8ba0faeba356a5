// src/visualization/mod.rs

pub mod plotter;
pub mod window;

use crate::display::{Canvas, DisplayEvent, Key, Rect, Rgb};

pub fn color32(color: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(color.0, color.1, color.2)
}

/// Translates this frame's egui input into stimulus events.
pub fn egui_events(ctx: &egui::Context) -> Vec<DisplayEvent> {
    const KEYS: [(egui::Key, Key); 8] = [
        (egui::Key::Escape, Key::Escape),
        (egui::Key::Space, Key::Space),
        (egui::Key::ArrowUp, Key::Up),
        (egui::Key::ArrowDown, Key::Down),
        (egui::Key::ArrowLeft, Key::Left),
        (egui::Key::ArrowRight, Key::Right),
        (egui::Key::H, Key::Char('h')),
        (egui::Key::S, Key::Char('s')),
    ];

    ctx.input(|input| {
        let mut events: Vec<DisplayEvent> = KEYS
            .iter()
            .filter(|(egui_key, _)| input.key_pressed(*egui_key))
            .map(|(_, key)| DisplayEvent::KeyPressed(*key))
            .collect();
        if input.viewport().close_requested() {
            events.push(DisplayEvent::Quit);
        }
        events
    })
}

/// `Canvas` over an egui painter. Coordinates are physical pixels relative to
/// the top-left of `origin`.
pub struct PainterCanvas<'a> {
    painter: &'a egui::Painter,
    origin: egui::Pos2,
    points_per_pixel: f32,
    size: (u32, u32),
}

impl<'a> PainterCanvas<'a> {
    pub fn new(painter: &'a egui::Painter, area: egui::Rect, pixels_per_point: f32) -> Self {
        let size = (
            (area.width() * pixels_per_point).round() as u32,
            (area.height() * pixels_per_point).round() as u32,
        );
        Self {
            painter,
            origin: area.min,
            points_per_pixel: 1.0 / pixels_per_point,
            size,
        }
    }
}

impl Canvas for PainterCanvas<'_> {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        let scale = self.points_per_pixel;
        let min = self.origin + egui::vec2(rect.x as f32 * scale, rect.y as f32 * scale);
        let size = egui::vec2(rect.width as f32 * scale, rect.height as f32 * scale);
        self.painter
            .rect_filled(egui::Rect::from_min_size(min, size), 0.0, color32(color));
    }
}
