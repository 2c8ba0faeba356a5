use super::clock::{Clock, MonotonicClock, WaitStrategy};
use super::frame_clock::{FlickerConfig, FrameCadence};
use super::statistics::{StatSummary, TimingStatistics};
use crate::display::{Canvas, DisplayEvent, DisplaySurface, EventSource, OffFrameOverlay, Rect, Rgb};
use crate::error::Result;
use crate::utils::log::{log_to_file, print_anomaly, print_error, print_report, TimingLog};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// -----------------------------------------------------------------------------
// RUN OPTIONS & RECORDS
// -----------------------------------------------------------------------------

pub const DEFAULT_REPORT_INTERVAL: u64 = 300;
pub const DEFAULT_FLIP_WARNING_MS: f64 = 3.5;

pub struct SchedulerOptions {
    pub flash_region: Rect,
    pub flash_color: Rgb,
    pub background_color: Rgb,
    /// Stop after this many flashes, on the next blank frame. `None` runs
    /// until cancelled.
    pub max_pulses: Option<usize>,
    pub report_interval: u64,
    pub flip_warning_ms: f64,
    pub wait: WaitStrategy,
    pub verbose: bool,
    pub log_dir: PathBuf,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            flash_region: Rect::centered_square(1920, 1080, 600),
            flash_color: Rgb::WHITE,
            background_color: Rgb::BLACK,
            max_pulses: None,
            report_interval: DEFAULT_REPORT_INTERVAL,
            flip_warning_ms: DEFAULT_FLIP_WARNING_MS,
            wait: WaitStrategy::default(),
            verbose: false,
            log_dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleState {
    pub frame_count: u64,
    pub start_time: Duration,
    pub target_frame_interval: f64,
    pub off_frames_per_on: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSample {
    pub frame: u64,
    pub on: bool,
    pub flip_duration_ms: f64,
    pub error_pre_ms: f64,
    pub error_post_ms: f64,
}

/// A frame whose flip took longer than the warning threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingAnomaly {
    pub frame: u64,
    pub on: bool,
    pub previous_on: bool,
    pub flip_ms: f64,
    pub err_pre_ms: f64,
    pub err_post_ms: f64,
}

impl TimingAnomaly {
    /// The flash frame itself or the blank right after it.
    pub fn is_flash_adjacent(&self) -> bool {
        self.on || self.previous_on
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSummary {
    pub frame_rate_hz: f64,
    pub off_frames_per_on: u32,
    pub frames: u64,
    pub pulses: usize,
    pub anomalies: usize,
    pub flash_adjacent_anomalies: usize,
    pub cancelled: bool,
    pub flip_ms: StatSummary,
    pub err_pre: StatSummary,
    pub err_post: StatSummary,
    pub flip_ms_on: StatSummary,
    pub err_pre_on: StatSummary,
    pub err_post_on: StatSummary,
}

impl TimingSummary {
    /// True when any flip in the final window exceeded `threshold_ms`.
    pub fn flip_exceeds(&self, threshold_ms: f64) -> bool {
        self.flip_ms.max > threshold_ms
    }

    pub fn named_stats(&self) -> [(&'static str, &StatSummary); 6] {
        [
            ("flip_ms", &self.flip_ms),
            ("err_pre", &self.err_pre),
            ("err_post", &self.err_post),
            ("flip_ms_on", &self.flip_ms_on),
            ("err_pre_on", &self.err_pre_on),
            ("err_post_on", &self.err_post_on),
        ]
    }
}

// -----------------------------------------------------------------------------
// PULSE SCHEDULER
// -----------------------------------------------------------------------------

/// Frame-by-frame flicker driver. One instance covers exactly one run.
///
/// Each frame goes through `draw_frame` → `wait_for_deadline` →
/// `mark_submitted` → present → `mark_presented`. `run` strings these
/// together for surfaces that present synchronously; event-loop front ends
/// (the egui window) call the steps themselves.
pub struct PulseScheduler<C: Clock> {
    clock: C,
    options: SchedulerOptions,
    cadence: FrameCadence,
    frame_interval: Duration,
    state: ScheduleState,
    statistics: TimingStatistics,
    overlay: Option<Box<dyn OffFrameOverlay>>,
    timing_log: Option<TimingLog>,

    pulses_emitted: usize,
    rectangle_on: bool,
    previous_on: bool,
    submit_time: Duration,
    previous_submit_time: Duration,
    post_flip_time: Duration,
    anomalies: usize,
    flash_adjacent_anomalies: usize,
    finished: bool,
    cancelled: bool,
}

impl<C: Clock> PulseScheduler<C> {
    /// Validates the frequency envelope up front; a bad configuration never
    /// reaches the loop.
    pub fn new(config: &FlickerConfig, options: SchedulerOptions, clock: C) -> Result<Self> {
        let cadence = FrameCadence::for_config(config)?;
        let interval = cadence.frame_interval_secs();

        Ok(Self {
            clock,
            statistics: TimingStatistics::for_cadence(cadence.off_frames_per_on),
            state: ScheduleState {
                frame_count: 0,
                start_time: Duration::ZERO,
                target_frame_interval: interval,
                off_frames_per_on: cadence.off_frames_per_on,
            },
            frame_interval: Duration::from_secs_f64(interval),
            cadence,
            options,
            overlay: None,
            timing_log: None,
            pulses_emitted: 0,
            rectangle_on: false,
            previous_on: false,
            submit_time: Duration::ZERO,
            previous_submit_time: Duration::ZERO,
            post_flip_time: Duration::ZERO,
            anomalies: 0,
            flash_adjacent_anomalies: 0,
            finished: false,
            cancelled: false,
        })
    }

    pub fn with_overlay(mut self, overlay: Box<dyn OffFrameOverlay>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn with_timing_log(mut self, log: TimingLog) -> Self {
        self.timing_log = Some(log);
        self
    }

    pub fn cadence(&self) -> &FrameCadence {
        &self.cadence
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    pub fn statistics(&self) -> &TimingStatistics {
        &self.statistics
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    pub fn pulses_emitted(&self) -> usize {
        self.pulses_emitted
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Clears to the background, presents once and starts the run clock.
    pub fn begin(&mut self, surface: &mut dyn DisplaySurface) {
        surface.fill(self.options.background_color);
        surface.present();
        self.mark_started();
    }

    /// Starts the run clock without drawing; for front ends that cleared the
    /// screen themselves.
    pub fn mark_started(&mut self) {
        let now = self.clock.now();
        self.state.start_time = now;
        self.submit_time = now;
        self.previous_submit_time = now;
        self.post_flip_time = now;
    }

    /// Draws the current frame and returns whether it is a flash frame.
    pub fn draw_frame(&mut self, canvas: &mut dyn Canvas) -> bool {
        self.previous_on = self.rectangle_on;
        self.rectangle_on = self.cadence.is_on_frame(self.state.frame_count);

        if self.rectangle_on {
            self.pulses_emitted += 1;
            canvas.fill_rect(self.options.flash_region, self.options.flash_color);
        } else {
            canvas.fill_rect(self.options.flash_region, self.options.background_color);
            if let Some(overlay) = self.overlay.as_mut() {
                overlay.draw(canvas);
            }
        }
        self.rectangle_on
    }

    /// Absolute deadline of the current frame, anchored to the run start so
    /// late frames do not push later ones back.
    pub fn next_deadline(&self) -> Duration {
        self.state.start_time + self.frame_interval.mul_f64((self.state.frame_count + 1) as f64)
    }

    pub fn wait_for_deadline(&self) {
        self.options
            .wait
            .wait_until(&self.clock, self.next_deadline());
    }

    pub fn mark_submitted(&mut self) {
        self.previous_submit_time = self.submit_time;
        self.submit_time = self.clock.now();
    }

    /// Records timing for the frame just presented and advances the frame
    /// counter.
    pub fn mark_presented(&mut self) -> TimingSample {
        let previous_post_flip = self.post_flip_time;
        self.post_flip_time = self.clock.now();

        let interval = self.state.target_frame_interval;
        let flip_duration_ms = secs_between(self.submit_time, self.post_flip_time) * 1000.0;
        let error_pre_ms =
            (secs_between(self.previous_submit_time, self.submit_time) - interval) * 1000.0;
        let error_post_ms =
            (secs_between(previous_post_flip, self.post_flip_time) - interval) * 1000.0;

        let sample = TimingSample {
            frame: self.state.frame_count,
            on: self.rectangle_on,
            flip_duration_ms,
            error_pre_ms,
            error_post_ms,
        };

        self.statistics
            .record(flip_duration_ms, error_pre_ms, error_post_ms, sample.on);
        self.write_timing_log(&sample);

        if flip_duration_ms > self.options.flip_warning_ms {
            self.handle_anomaly(TimingAnomaly {
                frame: sample.frame,
                on: sample.on,
                previous_on: self.previous_on,
                flip_ms: flip_duration_ms,
                err_pre_ms: error_pre_ms,
                err_post_ms: error_post_ms,
            });
        }

        let frame = self.state.frame_count;
        if frame != 0 && self.options.report_interval > 0 && frame % self.options.report_interval == 0 {
            print_report(&self.statistics);
        }

        self.state.frame_count += 1;

        // end on a blank frame once enough flashes were shown
        if let Some(max_pulses) = self.options.max_pulses {
            if !self.rectangle_on && self.pulses_emitted >= max_pulses {
                self.finish();
            }
        }

        sample
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.finish();
    }

    /// One full iteration on a synchronously presenting surface. Returns
    /// `false` once the run is over.
    pub fn step<S, E>(&mut self, surface: &mut S, events: &mut E) -> bool
    where
        S: DisplaySurface,
        E: EventSource,
    {
        if self.finished {
            return false;
        }
        if events.poll_events().iter().any(DisplayEvent::is_cancel) {
            self.cancel();
            return false;
        }

        self.draw_frame(surface);
        self.wait_for_deadline();
        self.mark_submitted();
        surface.present();
        self.mark_presented();

        !self.finished
    }

    pub fn run<S, E>(mut self, surface: &mut S, events: &mut E) -> TimingSummary
    where
        S: DisplaySurface,
        E: EventSource,
    {
        self.begin(surface);
        while self.step(surface, events) {}
        self.summary()
    }

    pub fn summary(&self) -> TimingSummary {
        let s = &self.statistics;
        TimingSummary {
            frame_rate_hz: self.cadence.frame_rate_hz,
            off_frames_per_on: self.cadence.off_frames_per_on,
            frames: self.state.frame_count,
            pulses: self.pulses_emitted,
            anomalies: self.anomalies,
            flash_adjacent_anomalies: self.flash_adjacent_anomalies,
            cancelled: self.cancelled,
            flip_ms: s.flip_ms.summary(),
            err_pre: s.err_pre.summary(),
            err_post: s.err_post.summary(),
            flip_ms_on: s.flip_ms_on.summary(),
            err_pre_on: s.err_pre_on.summary(),
            err_post_on: s.err_post_on.summary(),
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Some(log) = self.timing_log.as_mut() {
            if let Err(e) = log.flush() {
                print_error(&format!("Failed to flush timing log: {}", e));
            }
        }
    }

    fn handle_anomaly(&mut self, anomaly: TimingAnomaly) {
        self.anomalies += 1;
        if anomaly.is_flash_adjacent() {
            self.flash_adjacent_anomalies += 1;
            print_anomaly(&anomaly);
        }
        if self.options.verbose {
            let message = format!(
                "frame: {}, on: {}, previous_on: {}, flip_ms: {:.3}, err_pre_ms: {:.3}, err_post_ms: {:.3}",
                anomaly.frame,
                anomaly.on,
                anomaly.previous_on,
                anomaly.flip_ms,
                anomaly.err_pre_ms,
                anomaly.err_post_ms
            );
            if let Err(e) = log_to_file(&self.options.log_dir, "flicker_anomalies.log", &message) {
                print_error(&format!("Failed to write to log file: {}", e));
            }
        }
    }

    fn write_timing_log(&mut self, sample: &TimingSample) {
        if let Some(log) = self.timing_log.as_mut() {
            if let Err(e) = log.record(sample) {
                // keep the run going, but only complain once
                print_error(&format!("Timing log disabled: {}", e));
                self.timing_log = None;
            }
        }
    }
}

fn secs_between(earlier: Duration, later: Duration) -> f64 {
    later.as_secs_f64() - earlier.as_secs_f64()
}

/// Runs a complete flicker train on the monotonic clock.
pub fn run_flicker<S, E>(
    surface: &mut S,
    events: &mut E,
    config: &FlickerConfig,
    options: SchedulerOptions,
    overlay: Option<Box<dyn OffFrameOverlay>>,
) -> Result<TimingSummary>
where
    S: DisplaySurface,
    E: EventSource,
{
    let mut scheduler = PulseScheduler::new(config, options, MonotonicClock::new())?;
    if let Some(overlay) = overlay {
        scheduler = scheduler.with_overlay(overlay);
    }
    Ok(scheduler.run(surface, events))
}
