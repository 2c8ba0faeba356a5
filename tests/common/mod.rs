#![allow(dead_code)]

use entrainment_stimuli::display::{
    Canvas, DisplayEvent, DisplaySurface, EventSource, FrameBuffer, Rect, Rgb,
};
use std::collections::VecDeque;

/// Frame buffer that remembers what the probe pixel looked like at every
/// present.
pub struct RecordingSurface {
    pub buffer: FrameBuffer,
    probe: (u32, u32),
    pub presented: Vec<Rgb>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32, probe: (u32, u32)) -> Self {
        Self {
            buffer: FrameBuffer::new(width, height),
            probe,
            presented: Vec::new(),
        }
    }

    /// Colours seen at each present after the initial clear.
    pub fn frames(&self) -> &[Rgb] {
        self.presented.get(1..).unwrap_or(&[])
    }
}

impl Canvas for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        self.buffer.size()
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.buffer.fill_rect(rect, color);
    }
}

impl DisplaySurface for RecordingSurface {
    fn present(&mut self) {
        let pixel = self
            .buffer
            .pixel(self.probe.0, self.probe.1)
            .unwrap_or(Rgb::BLACK);
        self.presented.push(pixel);
        self.buffer.present();
    }
}

/// Replays a fixed event list, one entry per poll.
pub struct ScriptedEvents {
    script: VecDeque<Vec<DisplayEvent>>,
}

impl ScriptedEvents {
    /// `events` are delivered on poll number `at` (zero based).
    pub fn at(at: usize, events: Vec<DisplayEvent>) -> Self {
        let mut script: VecDeque<Vec<DisplayEvent>> = (0..at).map(|_| Vec::new()).collect();
        script.push_back(events);
        Self { script }
    }
}

impl EventSource for ScriptedEvents {
    fn poll_events(&mut self) -> Vec<DisplayEvent> {
        self.script.pop_front().unwrap_or_default()
    }
}
