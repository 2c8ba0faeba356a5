use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

// ROLLING STATISTIC -----------------------------------------------------------

/// Trailing window of samples. A `window` of `None` keeps everything.
#[derive(Debug, Clone)]
pub struct RollingStat {
    name: &'static str,
    window: Option<usize>,
    buffer: VecDeque<f64>,
}

impl RollingStat {
    pub fn new(name: &'static str, window: Option<usize>) -> Self {
        Self {
            name,
            window,
            buffer: VecDeque::with_capacity(window.unwrap_or(0)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn add(&mut self, value: f64) {
        self.buffer.push_back(value);
        if let Some(window) = self.window {
            while self.buffer.len() > window.max(1) {
                self.buffer.pop_front();
            }
        }
    }

    pub fn n(&self) -> usize {
        self.buffer.len()
    }

    pub fn mean(&self) -> f64 {
        if self.buffer.is_empty() {
            return 0.0;
        }
        self.buffer.iter().sum::<f64>() / self.buffer.len() as f64
    }

    /// Population standard deviation; 0 below two samples.
    pub fn stdev(&self) -> f64 {
        if self.buffer.len() < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .buffer
            .iter()
            .map(|&x| (x - mean).powi(2))
            .sum::<f64>()
            / self.buffer.len() as f64;
        variance.sqrt()
    }

    pub fn min(&self) -> f64 {
        self.buffer.iter().copied().reduce(f64::min).unwrap_or(0.0)
    }

    pub fn max(&self) -> f64 {
        self.buffer.iter().copied().reduce(f64::max).unwrap_or(0.0)
    }

    pub fn summary(&self) -> StatSummary {
        StatSummary {
            mean: self.mean(),
            stdev: self.stdev(),
            min: self.min(),
            max: self.max(),
            n: self.n(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatSummary {
    pub mean: f64,
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

// TIMING STATISTICS -----------------------------------------------------------

/// Flip duration and pre/post-flip timing error, tracked over all frames and
/// separately over flash frames.
#[derive(Debug, Clone)]
pub struct TimingStatistics {
    pub flip_ms: RollingStat,
    pub err_pre: RollingStat,
    pub err_post: RollingStat,
    pub flip_ms_on: RollingStat,
    pub err_pre_on: RollingStat,
    pub err_post_on: RollingStat,
}

pub const ON_FRAME_WINDOW: usize = 50;

impl TimingStatistics {
    /// All-frame windows cover roughly 50 flicker cycles; flash windows keep
    /// the last 50 flashes.
    pub fn for_cadence(off_frames_per_on: u32) -> Self {
        let all_window = Some(ON_FRAME_WINDOW * off_frames_per_on.max(1) as usize);
        let on_window = Some(ON_FRAME_WINDOW);
        Self {
            flip_ms: RollingStat::new("flip_ms", all_window),
            err_pre: RollingStat::new("err_pre", all_window),
            err_post: RollingStat::new("err_post", all_window),
            flip_ms_on: RollingStat::new("flip_ms_on", on_window),
            err_pre_on: RollingStat::new("err_pre_on", on_window),
            err_post_on: RollingStat::new("err_post_on", on_window),
        }
    }

    pub fn record(&mut self, flip_ms: f64, err_pre_ms: f64, err_post_ms: f64, on: bool) {
        self.flip_ms.add(flip_ms);
        self.err_pre.add(err_pre_ms);
        self.err_post.add(err_post_ms);

        if on {
            self.flip_ms_on.add(flip_ms);
            self.err_pre_on.add(err_pre_ms);
            self.err_post_on.add(err_post_ms);
        }
    }

    pub fn all_frames(&self) -> [&RollingStat; 3] {
        [&self.flip_ms, &self.err_pre, &self.err_post]
    }

    pub fn on_frames(&self) -> [&RollingStat; 3] {
        [&self.flip_ms_on, &self.err_pre_on, &self.err_post_on]
    }
}
