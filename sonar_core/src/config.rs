//! Runtime configuration types for the monitor.
//!
//! These are the structs used by `MonitorCore`. They are separate from the
//! TOML-deserialized config in `sonar_config`; see `conversions`.

use std::time::Duration;

/// Trigger and echo timing for a single pulse.
#[derive(Debug, Clone, Copy)]
pub struct PulseCfg {
    /// Speed of sound in m/s. No temperature correction is applied.
    pub sound_speed_m_s: f32,
    /// High time of the trigger pulse; HC-SR04 needs at least 10 us.
    pub trigger_pulse_us: u32,
    /// Low time before the trigger pulse.
    pub settle_us: u32,
    /// Poll step while waiting on the echo line.
    pub poll_us: u32,
}

impl Default for PulseCfg {
    fn default() -> Self {
        Self {
            sound_speed_m_s: 343.0,
            trigger_pulse_us: 10,
            settle_us: 3,
            poll_us: 1,
        }
    }
}

/// How each aggregated reading is sampled.
#[derive(Debug, Clone, Copy)]
pub struct SamplingCfg {
    /// Pulses per reading.
    pub count: usize,
    /// Sleep between consecutive pulses.
    pub inter_sample: Duration,
    /// Bound on each echo wait.
    pub pulse_timeout: Duration,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            count: 5,
            inter_sample: Duration::from_millis(30),
            pulse_timeout: Duration::from_micros(30_000),
        }
    }
}

/// Control loop pacing and notification policy.
#[derive(Debug, Clone, Copy)]
pub struct LoopCfg {
    /// Sleep after each iteration. Sampling time is not included.
    pub cadence: Duration,
    /// Notify the peer when the first determination leaves `Unset`.
    pub notify_initial: bool,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            cadence: Duration::from_millis(100),
            notify_initial: true,
        }
    }
}

/// Startup connectivity window.
#[derive(Debug, Clone, Copy)]
pub struct StartupCfg {
    pub connect_window: Duration,
    pub poll: Duration,
}

impl Default for StartupCfg {
    fn default() -> Self {
        Self {
            connect_window: Duration::from_millis(15_000),
            poll: Duration::from_millis(200),
        }
    }
}
