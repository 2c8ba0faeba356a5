use thiserror::Error;

/// Errors raised before or around a stimulus run. Per-frame timing problems are
/// never errors; they end up in the run's `TimingSummary`.
#[derive(Debug, Error)]
pub enum StimulusError {
    /// No multiple of the flicker frequency reaches the minimum refresh rate.
    #[error(
        "Frequency too low: {frequency_hz} Hz gives a frame rate of {frame_rate} Hz, below the minimum refresh rate {min_refresh_hz} Hz"
    )]
    FrequencyTooLow {
        frequency_hz: f64,
        frame_rate: f64,
        min_refresh_hz: f64,
    },

    /// The flicker frequency does not fit under the maximum refresh rate.
    #[error("Frequency too high: {frequency_hz} Hz does not fit under the maximum refresh rate {max_refresh_hz} Hz")]
    FrequencyTooHigh {
        frequency_hz: f64,
        max_refresh_hz: f64,
    },

    #[error("Refresh rate range must be finite and positive, got {min_refresh_hz}..{max_refresh_hz} Hz")]
    InvalidRefreshRange {
        min_refresh_hz: f64,
        max_refresh_hz: f64,
    },

    #[error("Flicker frequency must be a positive number, got {0}")]
    InvalidFrequency(f64),

    #[error("Invalid Glass pattern configuration: {0}")]
    InvalidGlassConfig(String),

    #[error("{0}")]
    Config(String),

    #[error("Display window error: {0}")]
    Window(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, StimulusError>;
