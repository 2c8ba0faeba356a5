mod common;

use common::{RecordingSurface, ScriptedEvents};
use entrainment_stimuli::display::{DisplayEvent, FixationCross, Key, NoEvents, Rect, Rgb};
use entrainment_stimuli::timing::{
    FlickerConfig, PulseScheduler, SchedulerOptions, SimulatedClock, WaitStrategy,
};
use entrainment_stimuli::utils::log::TimingLog;
use std::time::Duration;

const SIDE: u32 = 40;
const PROBE: (u32, u32) = (20, 20);
const CROSS_GREY: Rgb = Rgb(160, 160, 160);

fn options(max_pulses: Option<usize>) -> SchedulerOptions {
    SchedulerOptions {
        flash_region: Rect::centered_square(SIDE, SIDE, 10),
        max_pulses,
        report_interval: 0,
        ..SchedulerOptions::default()
    }
}

// 10 Hz inside 48..60 Hz -> 60 Hz frame rate, 5 blank frames per flash
fn ten_hz() -> FlickerConfig {
    FlickerConfig::new(10.0, 48.0, 60.0)
}

#[test]
fn bounded_run_shows_exactly_k_flashes() {
    let clock = SimulatedClock::new(Duration::from_micros(10));
    let scheduler = PulseScheduler::new(&ten_hz(), options(Some(3)), &clock).unwrap();
    let mut surface = RecordingSurface::new(SIDE, SIDE, PROBE);

    let summary = scheduler.run(&mut surface, &mut NoEvents);

    let frames = surface.frames();
    let flashes: Vec<usize> = frames
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == Rgb::WHITE)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(flashes, vec![5, 11, 17]);
    assert_eq!(summary.pulses, 3);
    assert_eq!(summary.frames, frames.len() as u64);
    // the run always ends on a blank frame
    assert_eq!(frames.last(), Some(&Rgb::BLACK));
    assert_eq!(summary.frames, 19);
    assert!(!summary.cancelled);
}

#[test]
fn initial_clear_is_presented_before_first_frame() {
    let clock = SimulatedClock::new(Duration::from_micros(10));
    let scheduler = PulseScheduler::new(&ten_hz(), options(Some(1)), &clock).unwrap();
    let mut surface = RecordingSurface::new(SIDE, SIDE, PROBE);

    scheduler.run(&mut surface, &mut NoEvents);

    assert_eq!(surface.presented[0], Rgb::BLACK);
    assert_eq!(surface.presented.len(), surface.frames().len() + 1);
}

#[test]
fn escape_cancels_between_frames() {
    let clock = SimulatedClock::new(Duration::from_micros(10));
    let scheduler = PulseScheduler::new(&ten_hz(), options(None), &clock).unwrap();
    let mut surface = RecordingSurface::new(SIDE, SIDE, PROBE);
    let mut events = ScriptedEvents::at(8, vec![DisplayEvent::KeyPressed(Key::Escape)]);

    let summary = scheduler.run(&mut surface, &mut events);

    assert!(summary.cancelled);
    assert_eq!(summary.frames, 8);
    assert_eq!(summary.pulses, 1);
    assert_eq!(surface.frames().len(), 8);
}

#[test]
fn window_close_cancels_before_any_frame() {
    let clock = SimulatedClock::new(Duration::from_micros(10));
    let scheduler = PulseScheduler::new(&ten_hz(), options(Some(5)), &clock).unwrap();
    let mut surface = RecordingSurface::new(SIDE, SIDE, PROBE);
    let mut events = ScriptedEvents::at(0, vec![DisplayEvent::Quit]);

    let summary = scheduler.run(&mut surface, &mut events);

    assert!(summary.cancelled);
    assert_eq!(summary.frames, 0);
    assert_eq!(summary.pulses, 0);
    assert_eq!(summary.flip_ms.n, 0);
}

#[test]
fn other_keys_do_not_stop_the_run() {
    let clock = SimulatedClock::new(Duration::from_micros(10));
    let scheduler = PulseScheduler::new(&ten_hz(), options(Some(1)), &clock).unwrap();
    let mut surface = RecordingSurface::new(SIDE, SIDE, PROBE);
    let mut events = ScriptedEvents::at(2, vec![DisplayEvent::KeyPressed(Key::Space)]);

    let summary = scheduler.run(&mut surface, &mut events);

    assert!(!summary.cancelled);
    assert_eq!(summary.pulses, 1);
}

#[test]
fn overlay_only_on_blank_frames() {
    let clock = SimulatedClock::new(Duration::from_micros(10));
    let cross = FixationCross::new((PROBE.0 as i32, PROBE.1 as i32));
    let scheduler = PulseScheduler::new(&ten_hz(), options(Some(2)), &clock)
        .unwrap()
        .with_overlay(Box::new(cross));
    let mut surface = RecordingSurface::new(SIDE, SIDE, PROBE);

    let summary = scheduler.run(&mut surface, &mut NoEvents);

    for (frame, color) in surface.frames().iter().enumerate() {
        if frame % 6 == 5 {
            assert_eq!(*color, Rgb::WHITE, "frame {}", frame);
        } else {
            assert_eq!(*color, CROSS_GREY, "frame {}", frame);
        }
    }
    assert_eq!(summary.pulses, 2);
}

#[test]
fn closure_overlay_counts_blank_frames() {
    use std::cell::Cell;
    use std::rc::Rc;

    let clock = SimulatedClock::new(Duration::from_micros(10));
    let calls = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&calls);
    let scheduler = PulseScheduler::new(&ten_hz(), options(Some(2)), &clock)
        .unwrap()
        .with_overlay(Box::new(move |_: &mut dyn entrainment_stimuli::display::Canvas| {
            counter.set(counter.get() + 1)
        }));
    let mut surface = RecordingSurface::new(SIDE, SIDE, PROBE);

    let summary = scheduler.run(&mut surface, &mut NoEvents);

    assert_eq!(calls.get() as u64, summary.frames - summary.pulses as u64);
}

#[test]
fn steady_run_has_no_anomalies_and_small_errors() {
    let clock = SimulatedClock::new(Duration::from_micros(10));
    let scheduler = PulseScheduler::new(&ten_hz(), options(Some(4)), &clock).unwrap();
    let mut surface = RecordingSurface::new(SIDE, SIDE, PROBE);

    let summary = scheduler.run(&mut surface, &mut NoEvents);

    assert_eq!(summary.anomalies, 0);
    assert!(!summary.flip_exceeds(3.5));
    assert!(summary.err_pre.mean.abs() < 0.1, "{:?}", summary.err_pre);
    assert!(summary.err_post.mean.abs() < 0.1, "{:?}", summary.err_post);
    assert_eq!(summary.flip_ms_on.n, 4);
    assert!((summary.frame_rate_hz - 60.0).abs() < 1e-9);
    assert_eq!(summary.off_frames_per_on, 5);
}

#[test]
fn coarse_sleep_is_used_for_long_waits() {
    let clock = SimulatedClock::new(Duration::from_micros(10));
    let scheduler = PulseScheduler::new(&ten_hz(), options(Some(1)), &clock).unwrap();
    let mut surface = RecordingSurface::new(SIDE, SIDE, PROBE);
    scheduler.run(&mut surface, &mut NoEvents);
    assert!(clock.sleep_count() > 0);

    let spin_clock = SimulatedClock::new(Duration::from_micros(10));
    let spin_options = SchedulerOptions {
        wait: WaitStrategy::busy_wait(),
        ..options(Some(1))
    };
    let scheduler = PulseScheduler::new(&ten_hz(), spin_options, &spin_clock).unwrap();
    scheduler.run(&mut surface, &mut NoEvents);
    assert_eq!(spin_clock.sleep_count(), 0);
}

#[test]
fn slow_flash_frame_is_counted_as_anomaly() {
    let clock = SimulatedClock::new(Duration::from_micros(10));
    let mut scheduler = PulseScheduler::new(&ten_hz(), options(None), &clock).unwrap();
    let mut surface = RecordingSurface::new(SIDE, SIDE, PROBE);
    scheduler.begin(&mut surface);

    for frame in 0..7 {
        let on = scheduler.draw_frame(&mut surface);
        assert_eq!(on, frame == 5);
        scheduler.wait_for_deadline();
        scheduler.mark_submitted();
        if on {
            // present blocks for 5 ms on the flash frame
            clock.advance(Duration::from_millis(5));
        }
        let sample = scheduler.mark_presented();
        assert_eq!(sample.frame, frame);
    }

    let summary = scheduler.summary();
    assert_eq!(summary.anomalies, 1);
    assert_eq!(summary.flash_adjacent_anomalies, 1);
    assert!(summary.flip_exceeds(3.5));
}

#[test]
fn timing_log_has_one_row_per_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timing").join("run.csv");
    let clock = SimulatedClock::new(Duration::from_micros(10));
    let scheduler = PulseScheduler::new(&ten_hz(), options(Some(2)), &clock)
        .unwrap()
        .with_timing_log(TimingLog::create(&path).unwrap());
    let mut surface = RecordingSurface::new(SIDE, SIDE, PROBE);

    let summary = scheduler.run(&mut surface, &mut NoEvents);

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], "frame,on,flip_ms,err_pre_ms,err_post_ms");
    assert_eq!(lines.len() as u64, summary.frames + 1);
    assert!(lines[6].starts_with("5,1,"));
    assert!(lines[1].starts_with("0,0,"));
}

#[test]
fn run_flicker_on_the_real_clock() {
    use entrainment_stimuli::timing::run_flicker;

    let mut surface = RecordingSurface::new(SIDE, SIDE, PROBE);
    let summary = run_flicker(&mut surface, &mut NoEvents, &ten_hz(), options(Some(1)), None).unwrap();

    assert_eq!(summary.pulses, 1);
    assert_eq!(summary.frames, 7);
    assert_eq!(surface.frames()[5], Rgb::WHITE);
}

#[test]
fn non_finite_refresh_range_fails_at_setup() {
    use entrainment_stimuli::StimulusError;

    let clock = SimulatedClock::new(Duration::from_micros(10));
    for config in [
        FlickerConfig::new(10.0, 48.0, f64::NAN),
        FlickerConfig::new(10.0, 48.0, f64::INFINITY),
        FlickerConfig::new(10.0, f64::NAN, 60.0),
    ] {
        assert!(matches!(
            PulseScheduler::new(&config, options(Some(1)), &clock),
            Err(StimulusError::InvalidRefreshRange { .. })
        ));
    }
}
