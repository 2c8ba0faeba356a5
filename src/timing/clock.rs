use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic time source for the flicker loop. Timestamps are offsets from
/// the clock's own origin.
pub trait Clock {
    fn now(&self) -> Duration;
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

// MONOTONIC CLOCK -------------------------------------------------------------

pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

// SIMULATED CLOCK -------------------------------------------------------------

/// Deterministic clock for offline runs and tests. Every `now()` call moves
/// time forward by `tick` so busy-waits terminate; `sleep` jumps ahead.
pub struct SimulatedClock {
    now: Cell<Duration>,
    tick: Duration,
    sleeps: Cell<u64>,
}

impl SimulatedClock {
    pub fn new(tick: Duration) -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            tick,
            sleeps: Cell::new(0),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }

    /// Current time without advancing.
    pub fn peek(&self) -> Duration {
        self.now.get()
    }

    pub fn sleep_count(&self) -> u64 {
        self.sleeps.get()
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> Duration {
        let t = self.now.get();
        self.now.set(t + self.tick);
        t
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
        self.advance(duration);
    }
}

// WAIT STRATEGY ---------------------------------------------------------------

/// Hybrid wait: sleep through `coarse_sleep_ratio` of the remaining delay
/// (only when more than `coarse_sleep_min` is left), then spin until the
/// deadline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitStrategy {
    coarse_sleep_ratio: f64,
    coarse_sleep_min: Duration,
}

impl WaitStrategy {
    pub fn new(coarse_sleep_ratio: f64, coarse_sleep_min: Duration) -> Self {
        let coarse_sleep_ratio = if coarse_sleep_ratio.is_finite() {
            coarse_sleep_ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            coarse_sleep_ratio,
            coarse_sleep_min,
        }
    }

    /// Pure spinning, no OS sleep at all.
    pub fn busy_wait() -> Self {
        Self::new(0.0, Duration::ZERO)
    }

    pub fn coarse_sleep_ratio(&self) -> f64 {
        self.coarse_sleep_ratio
    }

    /// Blocks until `clock.now() >= deadline`. Returns immediately when the
    /// deadline has already passed.
    pub fn wait_until<C: Clock + ?Sized>(&self, clock: &C, deadline: Duration) {
        let now = clock.now();
        if deadline <= now {
            return;
        }
        let delay = deadline - now;
        if self.coarse_sleep_ratio > 0.0 && delay > self.coarse_sleep_min {
            clock.sleep(delay.mul_f64(self.coarse_sleep_ratio));
        }
        while clock.now() < deadline {
            std::hint::spin_loop();
        }
    }
}

impl Default for WaitStrategy {
    fn default() -> Self {
        Self::new(0.75, Duration::from_millis(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_clock_ticks_on_read() {
        let clock = SimulatedClock::new(Duration::from_micros(10));
        assert_eq!(clock.now(), Duration::ZERO);
        assert_eq!(clock.now(), Duration::from_micros(10));
        clock.sleep(Duration::from_millis(1));
        assert_eq!(clock.peek(), Duration::from_micros(1020));
        assert_eq!(clock.sleep_count(), 1);
    }

    #[test]
    fn long_delay_sleeps_then_spins_to_deadline() {
        let clock = SimulatedClock::new(Duration::from_micros(5));
        let deadline = Duration::from_millis(8);
        WaitStrategy::default().wait_until(&clock, deadline);
        assert_eq!(clock.sleep_count(), 1);
        assert!(clock.peek() >= deadline);
        assert!(clock.peek() < deadline + Duration::from_micros(20));
    }

    #[test]
    fn short_delay_only_spins() {
        let clock = SimulatedClock::new(Duration::from_micros(5));
        WaitStrategy::default().wait_until(&clock, Duration::from_micros(500));
        assert_eq!(clock.sleep_count(), 0);
        assert!(clock.peek() >= Duration::from_micros(500));
    }

    #[test]
    fn past_deadline_returns_immediately() {
        let clock = SimulatedClock::new(Duration::from_micros(5));
        clock.advance(Duration::from_millis(3));
        WaitStrategy::default().wait_until(&clock, Duration::from_millis(1));
        assert_eq!(clock.sleep_count(), 0);
        assert_eq!(clock.peek(), Duration::from_millis(3) + Duration::from_micros(5));
    }

    #[test]
    fn ratio_is_clamped() {
        assert_eq!(WaitStrategy::new(3.0, Duration::ZERO).coarse_sleep_ratio(), 1.0);
        assert_eq!(WaitStrategy::new(-1.0, Duration::ZERO).coarse_sleep_ratio(), 0.0);
        assert_eq!(WaitStrategy::new(f64::NAN, Duration::ZERO).coarse_sleep_ratio(), 0.0);
    }
}
