use crate::glass::{generate, GlassImageConfig, Handedness};
use crate::timing::FlickerConfig;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

/// Returns `(frame_rate_hz, off_frames_per_on)` or raises `ValueError`.
#[pyfunction]
pub fn find_target_frame_rate(
    flicker_hz: f64,
    min_refresh_hz: f64,
    max_refresh_hz: f64,
) -> PyResult<(f64, u32)> {
    let cadence = FlickerConfig::new(flicker_hz, min_refresh_hz, max_refresh_hz)
        .cadence()
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok((cadence.frame_rate_hz, cadence.off_frames_per_on))
}

/// Returns `(width, height, rgb_bytes, seed)`.
#[pyfunction]
#[pyo3(signature = (
    size_px = 800,
    angle_deg = 0.0,
    snr = 0.24,
    density = 0.03,
    shift_px = 8.0,
    dot_radius_px = 2,
    handedness = "cw",
    seed = None
))]
#[allow(clippy::too_many_arguments)]
pub fn generate_glass(
    size_px: u32,
    angle_deg: f64,
    snr: f64,
    density: f64,
    shift_px: f64,
    dot_radius_px: u32,
    handedness: &str,
    seed: Option<u64>,
) -> PyResult<(u32, u32, Vec<u8>, u64)> {
    let handedness: Handedness = handedness.parse().map_err(PyValueError::new_err)?;
    let config = GlassImageConfig {
        angle_deg,
        snr,
        density,
        shift_px,
        dot_radius_px,
        handedness,
        size_px,
        seed,
        ..GlassImageConfig::default()
    };
    let pattern = generate(&config).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let (width, height) = (pattern.image.width(), pattern.image.height());
    Ok((width, height, pattern.image.into_bytes(), pattern.seed))
}

/// A Python module implemented in Rust.
#[pymodule]
pub fn entrainment_stimuli(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(find_target_frame_rate, m)?)?;
    m.add_function(wrap_pyfunction!(generate_glass, m)?)?;
    Ok(())
}
