// src/display/mod.rs

pub mod frame_buffer;
pub mod overlay;

use serde::{Deserialize, Serialize};

pub use frame_buffer::FrameBuffer;
pub use overlay::{FixationCross, OffFrameOverlay};

// COLOUR & GEOMETRY -----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
}

/// Axis-aligned pixel rectangle. The origin may be negative; drawing clips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A `side`×`side` square centred in a `outer_width`×`outer_height` area.
    pub fn centered_square(outer_width: u32, outer_height: u32, side: u32) -> Self {
        let x = (outer_width as i32 - side as i32) / 2;
        let y = (outer_height as i32 - side as i32) / 2;
        Self::new(x, y, side, side)
    }

    pub fn center(&self) -> (i32, i32) {
        (
            self.x + self.width as i32 / 2,
            self.y + self.height as i32 / 2,
        )
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && y >= self.y
            && x < self.x + self.width as i32
            && y < self.y + self.height as i32
    }
}

// DRAWING TARGETS -------------------------------------------------------------

/// Anything the stimulus code can paint solid colours onto.
pub trait Canvas {
    fn size(&self) -> (u32, u32);

    fn fill_rect(&mut self, rect: Rect, color: Rgb);

    fn fill(&mut self, color: Rgb) {
        let (width, height) = self.size();
        self.fill_rect(Rect::new(0, 0, width, height), color);
    }
}

/// A canvas that is shown on a display. `present` may block until the next
/// vertical blank when the display mode was opened with vsync.
pub trait DisplaySurface: Canvas {
    fn present(&mut self);
}

// INPUT EVENTS ----------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Space,
    Up,
    Down,
    Left,
    Right,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    Quit,
    KeyPressed(Key),
}

impl DisplayEvent {
    /// Window close and Escape both stop a running stimulus.
    pub fn is_cancel(&self) -> bool {
        matches!(
            self,
            DisplayEvent::Quit | DisplayEvent::KeyPressed(Key::Escape)
        )
    }
}

/// Non-blocking poll for pending input.
pub trait EventSource {
    fn poll_events(&mut self) -> Vec<DisplayEvent>;
}

/// Event source for headless runs; never reports anything.
pub struct NoEvents;

impl EventSource for NoEvents {
    fn poll_events(&mut self) -> Vec<DisplayEvent> {
        Vec::new()
    }
}
