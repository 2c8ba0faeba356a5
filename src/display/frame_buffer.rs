use super::{Canvas, DisplaySurface, Rect, Rgb};
use crate::error::Result;

use std::path::Path;

/// Packed RGB8 image held in memory. Used as the Glass pattern output and as
/// the display surface for headless flicker runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
    presented: u64,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 3],
            presented: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw row-major RGB bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Number of times the buffer has been presented.
    pub fn presented_frames(&self) -> u64 {
        self.presented
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        Some(Rgb(self.data[i], self.data[i + 1], self.data[i + 2]))
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let i = self.offset(x as u32, y as u32);
        self.data[i] = color.0;
        self.data[i + 1] = color.1;
        self.data[i + 2] = color.2;
    }

    pub fn count_pixels(&self, color: Rgb) -> usize {
        self.data
            .chunks_exact(3)
            .filter(|px| px[0] == color.0 && px[1] == color.1 && px[2] == color.2)
            .count()
    }

    /// Filled disc of all pixels within `radius` of the centre.
    pub fn fill_disc(&mut self, cx: i32, cy: i32, radius: i32, color: Rgb) {
        let r2 = radius * radius;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= r2 {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        image::save_buffer(
            path,
            &self.data,
            self.width,
            self.height,
            image::ColorType::Rgb8,
        )?;
        Ok(())
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }
}

impl Canvas for FrameBuffer {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        let x0 = rect.x.max(0);
        let y0 = rect.y.max(0);
        let x1 = (rect.x + rect.width as i32).min(self.width as i32);
        let y1 = (rect.y + rect.height as i32).min(self.height as i32);
        for y in y0..y1 {
            for x in x0..x1 {
                let i = self.offset(x as u32, y as u32);
                self.data[i] = color.0;
                self.data[i + 1] = color.1;
                self.data[i + 2] = color.2;
            }
        }
    }
}

impl DisplaySurface for FrameBuffer {
    fn present(&mut self) {
        self.presented += 1;
    }
}
