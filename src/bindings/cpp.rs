use crate::error::StimulusError;
use crate::glass::{generate, GlassImageConfig, Handedness};
use crate::timing::FlickerConfig;

pub const STIMULI_OK: i32 = 0;
pub const STIMULI_FREQUENCY_TOO_LOW: i32 = 1;
pub const STIMULI_FREQUENCY_TOO_HIGH: i32 = 2;
pub const STIMULI_INVALID_ARGUMENT: i32 = 3;
pub const STIMULI_BUFFER_TOO_SMALL: i32 = 4;

fn status(error: &StimulusError) -> i32 {
    match error {
        StimulusError::FrequencyTooLow { .. } => STIMULI_FREQUENCY_TOO_LOW,
        StimulusError::FrequencyTooHigh { .. } => STIMULI_FREQUENCY_TOO_HIGH,
        _ => STIMULI_INVALID_ARGUMENT,
    }
}

/// Writes the target frame rate and blank frames per flash. Null output
/// pointers are skipped.
///
/// # Safety
/// Non-null output pointers must be valid for a single write.
#[no_mangle]
pub unsafe extern "C" fn stimuli_find_target_frame_rate(
    flicker_hz: f64,
    min_refresh_hz: f64,
    max_refresh_hz: f64,
    out_frame_rate: *mut f64,
    out_off_frames: *mut u32,
) -> i32 {
    match FlickerConfig::new(flicker_hz, min_refresh_hz, max_refresh_hz).cadence() {
        Ok(cadence) => {
            if !out_frame_rate.is_null() {
                *out_frame_rate = cadence.frame_rate_hz;
            }
            if !out_off_frames.is_null() {
                *out_off_frames = cadence.off_frames_per_on;
            }
            STIMULI_OK
        }
        Err(e) => status(&e),
    }
}

/// Renders a Glass pattern as packed RGB into `out` (`size_px * size_px * 3`
/// bytes).
///
/// # Safety
/// `out` must point to `out_len` writable bytes.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn stimuli_render_glass(
    size_px: u32,
    angle_deg: f64,
    snr: f64,
    density: f64,
    shift_px: f64,
    dot_radius_px: u32,
    clockwise: bool,
    seed: u64,
    out: *mut u8,
    out_len: usize,
) -> i32 {
    if out.is_null() {
        return STIMULI_INVALID_ARGUMENT;
    }
    let needed = size_px as usize * size_px as usize * 3;
    if out_len < needed {
        return STIMULI_BUFFER_TOO_SMALL;
    }

    let config = GlassImageConfig {
        angle_deg,
        snr,
        density,
        shift_px,
        dot_radius_px,
        handedness: if clockwise {
            Handedness::Clockwise
        } else {
            Handedness::CounterClockwise
        },
        size_px,
        seed: Some(seed),
        ..GlassImageConfig::default()
    };

    match generate(&config) {
        Ok(pattern) => {
            let bytes = pattern.image.as_bytes();
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), out, bytes.len());
            STIMULI_OK
        }
        Err(e) => status(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rate_through_c_abi() {
        let mut rate = 0.0;
        let mut off = 0;
        let code = unsafe { stimuli_find_target_frame_rate(10.0, 48.0, 60.0, &mut rate, &mut off) };
        assert_eq!(code, STIMULI_OK);
        assert_eq!((rate, off), (60.0, 5));

        let code = unsafe {
            stimuli_find_target_frame_rate(200.0, 48.0, 165.0, std::ptr::null_mut(), std::ptr::null_mut())
        };
        assert_eq!(code, STIMULI_FREQUENCY_TOO_HIGH);
    }

    #[test]
    fn glass_rejects_short_buffer() {
        let mut buf = vec![0u8; 10];
        let code = unsafe {
            stimuli_render_glass(8, 0.0, 1.0, 0.03, 2.0, 1, true, 1, buf.as_mut_ptr(), buf.len())
        };
        assert_eq!(code, STIMULI_BUFFER_TOO_SMALL);
    }
}
