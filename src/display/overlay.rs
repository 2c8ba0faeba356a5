use super::{Canvas, Rect, Rgb};

/// Drawn on every blank (off) frame of a flicker run, after the flash region
/// has been cleared.
pub trait OffFrameOverlay {
    fn draw(&mut self, canvas: &mut dyn Canvas);
}

impl<F> OffFrameOverlay for F
where
    F: FnMut(&mut dyn Canvas),
{
    fn draw(&mut self, canvas: &mut dyn Canvas) {
        self(canvas)
    }
}

/// Grey fixation cross.
#[derive(Debug, Clone, Copy)]
pub struct FixationCross {
    pub center: (i32, i32),
    pub half_arm: i32,
    pub stroke: u32,
    pub color: Rgb,
}

impl FixationCross {
    pub fn new(center: (i32, i32)) -> Self {
        Self {
            center,
            half_arm: 12,
            stroke: 2,
            color: Rgb(160, 160, 160),
        }
    }

    pub fn horizontal_arm(&self) -> Rect {
        let (x, y) = self.center;
        Rect::new(
            x - self.half_arm,
            y - self.stroke as i32 / 2,
            (2 * self.half_arm + 1) as u32,
            self.stroke,
        )
    }

    pub fn vertical_arm(&self) -> Rect {
        let (x, y) = self.center;
        Rect::new(
            x - self.stroke as i32 / 2,
            y - self.half_arm,
            self.stroke,
            (2 * self.half_arm + 1) as u32,
        )
    }
}

impl OffFrameOverlay for FixationCross {
    fn draw(&mut self, canvas: &mut dyn Canvas) {
        canvas.fill_rect(self.horizontal_arm(), self.color);
        canvas.fill_rect(self.vertical_arm(), self.color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::FrameBuffer;

    #[test]
    fn cross_is_centered() {
        let mut fb = FrameBuffer::new(64, 64);
        let mut cross = FixationCross::new((32, 32));
        cross.draw(&mut fb);

        let grey = Rgb(160, 160, 160);
        assert_eq!(fb.pixel(32, 32), Some(grey));
        assert_eq!(fb.pixel(20, 32), Some(grey));
        assert_eq!(fb.pixel(44, 32), Some(grey));
        assert_eq!(fb.pixel(32, 20), Some(grey));
        assert_eq!(fb.pixel(45, 32), Some(Rgb::BLACK));
        // two 25x2 arms sharing a 2x2 centre
        assert_eq!(fb.count_pixels(grey), 25 * 2 * 2 - 4);
    }

    #[test]
    fn closures_are_overlays() {
        let mut calls = 0;
        let mut fb = FrameBuffer::new(4, 4);
        {
            let mut overlay = |c: &mut dyn Canvas| {
                calls += 1;
                c.fill(Rgb::WHITE);
            };
            overlay.draw(&mut fb);
        }
        assert_eq!(calls, 1);
        assert_eq!(fb.count_pixels(Rgb::WHITE), 16);
    }
}
