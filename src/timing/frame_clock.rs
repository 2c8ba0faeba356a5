use crate::error::{Result, StimulusError};

use serde::{Deserialize, Serialize};

/// Desired flicker frequency and the refresh-rate envelope the monitor can be
/// driven at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlickerConfig {
    pub flicker_frequency_hz: f64,
    pub min_refresh_hz: f64,
    pub max_refresh_hz: f64,
}

impl FlickerConfig {
    pub fn new(flicker_frequency_hz: f64, min_refresh_hz: f64, max_refresh_hz: f64) -> Self {
        Self {
            flicker_frequency_hz,
            min_refresh_hz,
            max_refresh_hz,
        }
    }

    pub fn cadence(&self) -> Result<FrameCadence> {
        FrameCadence::for_config(self)
    }
}

/// Largest integer multiple of `flicker_hz` that does not exceed `max_refresh`.
///
/// Fails with `FrequencyTooLow` when that multiple is still below
/// `min_refresh`, and with `FrequencyTooHigh` when `flicker_hz` alone is
/// already above `max_refresh`. Non-finite or non-positive refresh bounds are
/// `InvalidRefreshRange`.
pub fn find_target_frame_rate(flicker_hz: f64, min_refresh: f64, max_refresh: f64) -> Result<f64> {
    if !(flicker_hz.is_finite() && flicker_hz > 0.0) {
        return Err(StimulusError::InvalidFrequency(flicker_hz));
    }
    let valid = |hz: f64| hz.is_finite() && hz > 0.0;
    if !(valid(min_refresh) && valid(max_refresh)) {
        return Err(StimulusError::InvalidRefreshRange {
            min_refresh_hz: min_refresh,
            max_refresh_hz: max_refresh,
        });
    }

    let frame_rate = (max_refresh / flicker_hz).floor() * flicker_hz;

    // a zero multiple means the flicker does not fit under max_refresh at all
    if frame_rate <= 0.0 {
        return Err(StimulusError::FrequencyTooHigh {
            frequency_hz: flicker_hz,
            max_refresh_hz: max_refresh,
        });
    }
    if frame_rate < min_refresh {
        return Err(StimulusError::FrequencyTooLow {
            frequency_hz: flicker_hz,
            frame_rate,
            min_refresh_hz: min_refresh,
        });
    }
    Ok(frame_rate)
}

/// Display frame rate plus the number of blank frames between two flash frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameCadence {
    pub flicker_frequency_hz: f64,
    pub frame_rate_hz: f64,
    pub off_frames_per_on: u32,
}

impl FrameCadence {
    pub fn for_config(config: &FlickerConfig) -> Result<Self> {
        let frame_rate_hz = find_target_frame_rate(
            config.flicker_frequency_hz,
            config.min_refresh_hz,
            config.max_refresh_hz,
        )?;
        let f = config.flicker_frequency_hz;
        // rounding guards against 120/10 landing on 11.999...
        let off_frames_per_on = ((frame_rate_hz - f) / f + 1e-9).floor().max(0.0) as u32;

        Ok(Self {
            flicker_frequency_hz: f,
            frame_rate_hz,
            off_frames_per_on,
        })
    }

    /// Frames per flash cycle (one on frame plus the blanks).
    pub fn cycle_frames(&self) -> u64 {
        self.off_frames_per_on as u64 + 1
    }

    pub fn frame_interval_secs(&self) -> f64 {
        1.0 / self.frame_rate_hz
    }

    /// The flash falls on the last frame of each cycle, so the first frames of
    /// a run (the ones drivers like to drop) are blank.
    pub fn is_on_frame(&self, frame_count: u64) -> bool {
        frame_count % self.cycle_frames() == self.off_frames_per_on as u64
    }

    /// Flash-to-flash rate actually produced on screen.
    pub fn effective_flicker_hz(&self) -> f64 {
        self.frame_rate_hz / self.cycle_frames() as f64
    }
}

// FLICKER RATE TABLE ----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlickerRate {
    pub flicker_hz: f64,
    pub refresh_hz: u32,
    pub off_frames: u32,
}

pub const DEFAULT_REFRESH_RATES: [u32; 4] = [165, 144, 120, 100];

/// Every "1 on, k off" flicker rate reachable at the given refresh rates that
/// lies within `[min_hz, max_hz]`, fastest first.
pub fn possible_flicker_rates(refresh_rates: &[u32], min_hz: f64, max_hz: f64) -> Vec<FlickerRate> {
    let mut rates: Vec<FlickerRate> = refresh_rates
        .iter()
        .flat_map(|&refresh_hz| {
            (1..refresh_hz).filter_map(move |off_frames| {
                let flicker_hz = refresh_hz as f64 / (off_frames + 1) as f64;
                if flicker_hz >= min_hz && flicker_hz <= max_hz {
                    Some(FlickerRate {
                        flicker_hz,
                        refresh_hz,
                        off_frames,
                    })
                } else {
                    None
                }
            })
        })
        .collect();

    rates.sort_by(|a, b| {
        b.flicker_hz
            .partial_cmp(&a.flicker_hz)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.refresh_hz.cmp(&a.refresh_hz))
            .then(b.off_frames.cmp(&a.off_frames))
    });
    rates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_hz_on_sixty_hz_monitor() {
        let config = FlickerConfig::new(10.0, 48.0, 60.0);
        let cadence = config.cadence().unwrap();
        assert_eq!(cadence.frame_rate_hz, 60.0);
        assert_eq!(cadence.off_frames_per_on, 5);
        assert_eq!(cadence.cycle_frames(), 6);
        assert!((cadence.effective_flicker_hz() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn flash_is_last_frame_of_cycle() {
        let cadence = FlickerConfig::new(10.0, 48.0, 60.0).cadence().unwrap();
        let on: Vec<u64> = (0..18).filter(|&f| cadence.is_on_frame(f)).collect();
        assert_eq!(on, vec![5, 11, 17]);
    }

    #[test]
    fn frequency_above_max_refresh_is_too_high() {
        let err = find_target_frame_rate(200.0, 48.0, 165.0).unwrap_err();
        assert!(matches!(err, StimulusError::FrequencyTooHigh { .. }));
        assert!(err.to_string().starts_with("Frequency too high"));
    }

    #[test]
    fn multiple_below_min_refresh_is_too_low() {
        // 35 Hz: largest multiple under 60 is 35, below 48
        let err = find_target_frame_rate(35.0, 48.0, 60.0).unwrap_err();
        assert!(matches!(err, StimulusError::FrequencyTooLow { .. }));
    }

    #[test]
    fn non_positive_frequency_is_rejected() {
        assert!(matches!(
            find_target_frame_rate(0.0, 48.0, 60.0),
            Err(StimulusError::InvalidFrequency(_))
        ));
        assert!(find_target_frame_rate(f64::NAN, 48.0, 60.0).is_err());
    }

    #[test]
    fn non_finite_refresh_bounds_are_rejected() {
        for (min, max) in [
            (48.0, f64::NAN),
            (48.0, f64::INFINITY),
            (f64::NAN, 60.0),
            (0.0, 60.0),
            (48.0, -60.0),
        ] {
            assert!(
                matches!(
                    find_target_frame_rate(10.0, min, max),
                    Err(StimulusError::InvalidRefreshRange { .. })
                ),
                "{}..{}",
                min,
                max
            );
        }
    }

    #[test]
    fn too_high_message_names_the_limit() {
        let err = find_target_frame_rate(200.0, 48.0, 165.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Frequency too high: 200 Hz does not fit under the maximum refresh rate 165 Hz"
        );
    }

    #[test]
    fn rate_table_is_sorted_and_bounded() {
        let rates = possible_flicker_rates(&[120], 6.0, 14.0);
        assert_eq!(rates.first().unwrap().flicker_hz, 120.0 / 9.0);
        assert_eq!(rates.first().unwrap().off_frames, 8);
        assert_eq!(rates.last().unwrap().flicker_hz, 6.0);
        assert!(rates.windows(2).all(|w| w[0].flicker_hz >= w[1].flicker_hz));
        assert!(rates.iter().any(|r| r.flicker_hz == 10.0 && r.off_frames == 11));
    }
}
