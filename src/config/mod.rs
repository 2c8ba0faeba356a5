// src/config/mod.rs
use crate::display::{FixationCross, Rect, Rgb};
use crate::error::{Result, StimulusError};
use crate::glass::GlassImageConfig;
use crate::timing::{FlickerConfig, SchedulerOptions, WaitStrategy};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub flicker: FlickerSettings,
    pub glass: GlassImageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub flash_side_px: u32,
    pub vsync: bool,
    pub fullscreen: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            flash_side_px: 600,
            vsync: true,
            fullscreen: true,
        }
    }
}

impl DisplayConfig {
    pub fn flash_region(&self) -> Rect {
        Rect::centered_square(self.width, self.height, self.flash_side_px)
    }

    pub fn center(&self) -> (i32, i32) {
        (self.width as i32 / 2, self.height as i32 / 2)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FlickerSettings {
    pub frequency_hz: f64,
    pub min_refresh_hz: f64,
    pub max_refresh_hz: f64,
    pub max_pulses: Option<usize>,
    pub report_interval: u64,
    pub flip_warning_ms: f64,
    pub coarse_sleep_ratio: f64,
    pub coarse_sleep_min_ms: f64,
    pub flash_color: Rgb,
    pub background_color: Rgb,
    pub fixation: bool,
}

impl Default for FlickerSettings {
    fn default() -> Self {
        Self {
            frequency_hz: 10.0,
            min_refresh_hz: 120.0,
            max_refresh_hz: 120.0,
            max_pulses: None,
            report_interval: 300,
            flip_warning_ms: 3.5,
            coarse_sleep_ratio: 0.75,
            coarse_sleep_min_ms: 1.0,
            flash_color: Rgb::WHITE,
            background_color: Rgb::BLACK,
            fixation: false,
        }
    }
}

impl FlickerSettings {
    pub fn flicker_config(&self) -> FlickerConfig {
        FlickerConfig::new(self.frequency_hz, self.min_refresh_hz, self.max_refresh_hz)
    }

    pub fn wait_strategy(&self) -> Result<WaitStrategy> {
        let coarse_sleep_min = Duration::try_from_secs_f64(self.coarse_sleep_min_ms / 1000.0)
            .map_err(|e| {
                StimulusError::Config(format!(
                    "Invalid coarse_sleep_min_ms {}: {}",
                    self.coarse_sleep_min_ms, e
                ))
            })?;
        Ok(WaitStrategy::new(self.coarse_sleep_ratio, coarse_sleep_min))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub log_dir: PathBuf,
    pub timing_csv: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_dir: PathBuf::from("logs"),
            timing_csv: None,
        }
    }
}

impl Config {
    /// Scheduler options for a flicker run on this display.
    pub fn scheduler_options(&self) -> Result<SchedulerOptions> {
        Ok(SchedulerOptions {
            flash_region: self.display.flash_region(),
            flash_color: self.flicker.flash_color,
            background_color: self.flicker.background_color,
            max_pulses: self.flicker.max_pulses,
            report_interval: self.flicker.report_interval,
            flip_warning_ms: self.flicker.flip_warning_ms,
            wait: self.flicker.wait_strategy()?,
            verbose: self.logging.verbose,
            log_dir: self.logging.log_dir.clone(),
        })
    }

    pub fn fixation_cross(&self) -> Option<FixationCross> {
        self.flicker
            .fixation
            .then(|| FixationCross::new(self.display.center()))
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| StimulusError::Config(format!("Failed to read config file: {}", e)))?;

    serde_yaml::from_str(&config_str)
        .map_err(|e| StimulusError::Config(format!("Failed to parse config file: {}", e)))
}

pub fn save_config<P: AsRef<Path>>(config: &Config, path: P) -> Result<()> {
    let yaml = serde_yaml::to_string(config)
        .map_err(|e| StimulusError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(path, yaml)
        .map_err(|e| StimulusError::Config(format!("Failed to write config file: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.flicker.frequency_hz, 10.0);
        assert_eq!(config.glass.size_px, 800);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "flicker:\n  frequency_hz: 12.0\n  max_pulses: 15\nglass:\n  handedness: ccw\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.flicker.frequency_hz, 12.0);
        assert_eq!(config.flicker.max_pulses, Some(15));
        assert_eq!(config.flicker.max_refresh_hz, 120.0);
        assert_eq!(
            config.glass.handedness,
            crate::glass::Handedness::CounterClockwise
        );
    }

    #[test]
    fn scheduler_options_follow_display() {
        let config = Config::default();
        let options = config.scheduler_options().unwrap();
        assert_eq!(options.flash_region, Rect::new(660, 240, 600, 600));
        assert_eq!(options.report_interval, 300);
        assert!(config.fixation_cross().is_none());
    }

    #[test]
    fn unusable_coarse_sleep_min_is_a_config_error() {
        for bad in [f64::MAX, f64::NAN, -1.0] {
            let mut config = Config::default();
            config.flicker.coarse_sleep_min_ms = bad;
            assert!(matches!(
                config.scheduler_options(),
                Err(StimulusError::Config(_))
            ));
        }
    }
}
