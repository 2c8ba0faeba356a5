// src/timing/mod.rs

pub mod clock;
pub mod frame_clock;
pub mod scheduler;
pub mod statistics;

pub use clock::{Clock, MonotonicClock, SimulatedClock, WaitStrategy};
pub use frame_clock::{find_target_frame_rate, possible_flicker_rates, FlickerConfig, FlickerRate, FrameCadence};
pub use scheduler::{
    run_flicker, PulseScheduler, ScheduleState, SchedulerOptions, TimingAnomaly, TimingSample,
    TimingSummary,
};
pub use statistics::{RollingStat, StatSummary, TimingStatistics};
