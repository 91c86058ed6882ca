//! `From` implementations bridging `sonar_config` types to `sonar_core` types.

use std::time::Duration;

use crate::config::{LoopCfg, PulseCfg, SamplingCfg, StartupCfg};
use crate::error::BuildError;
use crate::hysteresis::Thresholds;

// ── PulseCfg ─────────────────────────────────────────────────────────────────

impl From<&sonar_config::Sensor> for PulseCfg {
    fn from(c: &sonar_config::Sensor) -> Self {
        Self {
            sound_speed_m_s: c.sound_speed_m_s,
            trigger_pulse_us: c.trigger_pulse_us,
            settle_us: c.settle_us,
            poll_us: c.poll_us,
        }
    }
}

// ── SamplingCfg ──────────────────────────────────────────────────────────────

/// Sampling needs the pulse timeout from `[sensor]` as well as `[sampling]`.
impl From<&sonar_config::Config> for SamplingCfg {
    fn from(c: &sonar_config::Config) -> Self {
        Self {
            count: c.sampling.count,
            inter_sample: Duration::from_millis(c.sampling.inter_sample_ms),
            pulse_timeout: Duration::from_micros(c.sensor.pulse_timeout_us),
        }
    }
}

// ── Thresholds ───────────────────────────────────────────────────────────────

impl TryFrom<&sonar_config::Thresholds> for Thresholds {
    type Error = BuildError;

    fn try_from(c: &sonar_config::Thresholds) -> Result<Self, Self::Error> {
        Thresholds::new(c.threshold_cm, c.hysteresis_cm)
    }
}

// ── LoopCfg ──────────────────────────────────────────────────────────────────

impl From<&sonar_config::Control> for LoopCfg {
    fn from(c: &sonar_config::Control) -> Self {
        Self {
            cadence: Duration::from_millis(c.cadence_ms),
            notify_initial: c.notify_initial,
        }
    }
}

// ── StartupCfg ───────────────────────────────────────────────────────────────

impl From<&sonar_config::NetworkCfg> for StartupCfg {
    fn from(c: &sonar_config::NetworkCfg) -> Self {
        Self {
            connect_window: Duration::from_millis(c.connect_window_ms),
            poll: Duration::from_millis(c.poll_ms),
        }
    }
}
