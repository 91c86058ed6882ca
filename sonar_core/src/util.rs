//! Common time/unit helpers for sonar_core.

use std::time::Duration;

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: f64 = 1_000_000.0;
/// Centimeters per meter.
pub const CM_PER_M: f64 = 100.0;

/// Largest pulse timeout accepted, in microseconds.
///
/// A wrapping 32-bit tick difference is unambiguous only below half the
/// counter range.
pub const MAX_TIMEOUT_US: u32 = u32::MAX / 2;

/// Convert a round-trip echo width to a one-way distance in centimeters.
///
/// distance = sound_speed * elapsed / 2
#[inline]
pub fn echo_us_to_cm(elapsed_us: u32, sound_speed_m_s: f32) -> f32 {
    let elapsed_s = f64::from(elapsed_us) / MICROS_PER_SEC;
    (f64::from(sound_speed_m_s) * elapsed_s / 2.0 * CM_PER_M) as f32
}

/// Clamp a timeout to the tick range usable with a wrapping difference.
#[inline]
pub fn timeout_us(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_micros())
        .unwrap_or(MAX_TIMEOUT_US)
        .min(MAX_TIMEOUT_US)
}
