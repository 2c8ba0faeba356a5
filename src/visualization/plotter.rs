// src/visualization/plotter.rs

use crate::timing::TimingSample;
use std::collections::VecDeque;

/// Bounded history of per-frame timing for the post-run plots.
pub struct TimingPlotter {
    buffer_size: usize,
    flip_ms: VecDeque<[f64; 2]>,
    err_pre: VecDeque<[f64; 2]>,
    err_post: VecDeque<[f64; 2]>,
    on_frames: VecDeque<[f64; 2]>,
}

impl TimingPlotter {
    pub fn new(buffer_size: usize) -> Self {
        let buffer_size = buffer_size.max(1);
        Self {
            buffer_size,
            flip_ms: VecDeque::with_capacity(buffer_size),
            err_pre: VecDeque::with_capacity(buffer_size),
            err_post: VecDeque::with_capacity(buffer_size),
            on_frames: VecDeque::with_capacity(buffer_size),
        }
    }

    pub fn add_sample(&mut self, sample: &TimingSample) {
        let frame = sample.frame as f64;
        push_bounded(&mut self.flip_ms, [frame, sample.flip_duration_ms], self.buffer_size);
        push_bounded(&mut self.err_pre, [frame, sample.error_pre_ms], self.buffer_size);
        push_bounded(&mut self.err_post, [frame, sample.error_post_ms], self.buffer_size);
        if sample.on {
            push_bounded(&mut self.on_frames, [frame, sample.flip_duration_ms], self.buffer_size);
        }
    }

    pub fn flip_ms(&self) -> Vec<[f64; 2]> {
        self.flip_ms.iter().copied().collect()
    }

    pub fn err_pre(&self) -> Vec<[f64; 2]> {
        self.err_pre.iter().copied().collect()
    }

    pub fn err_post(&self) -> Vec<[f64; 2]> {
        self.err_post.iter().copied().collect()
    }

    /// Flip durations of flash frames only.
    pub fn on_frames(&self) -> Vec<[f64; 2]> {
        self.on_frames.iter().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.flip_ms.is_empty()
    }

    pub fn clear(&mut self) {
        self.flip_ms.clear();
        self.err_pre.clear();
        self.err_post.clear();
        self.on_frames.clear();
    }
}

fn push_bounded(buffer: &mut VecDeque<[f64; 2]>, point: [f64; 2], capacity: usize) {
    buffer.push_back(point);
    if buffer.len() > capacity {
        buffer.pop_front();
    }
}
