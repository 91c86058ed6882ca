#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the proximity monitor.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Everything is fixed at process start; there is no reload path.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pins {
    /// BCM pin driving the sensor trigger
    pub trigger: u8,
    /// BCM pin reading the sensor echo (level-shifted to 3.3 V)
    pub echo: u8,
    /// BCM pin for the local indicator LED
    pub indicator: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            trigger: 3,
            echo: 2,
            indicator: 16,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sensor {
    /// Speed of sound in m/s; 343.0 is dry air at about 20 °C
    pub sound_speed_m_s: f32,
    /// Bound on each echo wait (rise, then fall), in microseconds
    pub pulse_timeout_us: u64,
    /// Width of the trigger pulse
    pub trigger_pulse_us: u32,
    /// Low time before the trigger pulse
    pub settle_us: u32,
    /// Poll step while waiting on the echo line
    pub poll_us: u32,
}

impl Default for Sensor {
    fn default() -> Self {
        Self {
            sound_speed_m_s: 343.0,
            pulse_timeout_us: 30_000,
            trigger_pulse_us: 10,
            settle_us: 3,
            poll_us: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sampling {
    /// Pulses fired per aggregated reading
    pub count: usize,
    /// Gap between consecutive pulses so echoes from the previous firing die out
    pub inter_sample_ms: u64,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            count: 5,
            inter_sample_ms: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub threshold_cm: f32,
    /// Full band width; the switching points sit at threshold ± hysteresis/2
    pub hysteresis_cm: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            threshold_cm: 10.0,
            hysteresis_cm: 0.8,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Control {
    /// Sleep between iterations, not counting the sampling time itself
    pub cadence_ms: u64,
    /// Notify the peer on the first determination after startup
    pub notify_initial: bool,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            cadence_ms: 100,
            notify_initial: true,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Peer {
    pub host: String,
    #[serde(default = "default_peer_port")]
    pub port: u16,
    #[serde(default = "default_on_path")]
    pub on_path: String,
    #[serde(default = "default_off_path")]
    pub off_path: String,
    #[serde(default = "default_peer_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_peer_timeout_ms")]
    pub io_timeout_ms: u64,
}

fn default_peer_port() -> u16 {
    80
}
fn default_on_path() -> String {
    "/on".to_string()
}
fn default_off_path() -> String {
    "/off".to_string()
}
fn default_peer_timeout_ms() -> u64 {
    1500
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NetworkCfg {
    /// Give up on startup if the link is not ready within this window
    pub connect_window_ms: u64,
    pub poll_ms: u64,
}

impl Default for NetworkCfg {
    fn default() -> Self {
        Self {
            connect_window_ms: 15_000,
            poll_ms: 200,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pins: Pins,
    #[serde(default)]
    pub sensor: Sensor,
    #[serde(default)]
    pub sampling: Sampling,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub control: Control,
    pub peer: Peer,
    #[serde(default)]
    pub network: NetworkCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Upper bound on pulses per reading; beyond this a single iteration takes seconds.
pub const MAX_SAMPLE_COUNT: usize = 64;

impl Config {
    /// Validate semantic constraints beyond what serde enforces.
    pub fn validate(&self) -> eyre::Result<()> {
        // Thresholds
        let t = self.thresholds.threshold_cm;
        let h = self.thresholds.hysteresis_cm;
        if !t.is_finite() || t <= 0.0 {
            eyre::bail!("thresholds.threshold_cm must be > 0");
        }
        if !h.is_finite() || h < 0.0 {
            eyre::bail!("thresholds.hysteresis_cm must be >= 0");
        }
        if h >= 2.0 * t {
            eyre::bail!("thresholds.hysteresis_cm must be < 2 * threshold_cm");
        }

        // Sensor
        let v = self.sensor.sound_speed_m_s;
        if !v.is_finite() || v <= 0.0 {
            eyre::bail!("sensor.sound_speed_m_s must be > 0");
        }
        if self.sensor.pulse_timeout_us == 0 {
            eyre::bail!("sensor.pulse_timeout_us must be >= 1");
        }
        if self.sensor.pulse_timeout_us > u64::from(u32::MAX / 2) {
            eyre::bail!("sensor.pulse_timeout_us is unreasonably large");
        }
        if self.sensor.trigger_pulse_us == 0 {
            eyre::bail!("sensor.trigger_pulse_us must be >= 1");
        }

        // Sampling
        if self.sampling.count == 0 {
            eyre::bail!("sampling.count must be >= 1");
        }
        if self.sampling.count > MAX_SAMPLE_COUNT {
            eyre::bail!("sampling.count must be <= {MAX_SAMPLE_COUNT}");
        }

        // Control
        if self.control.cadence_ms > 60 * 60 * 1000 {
            eyre::bail!("control.cadence_ms is unreasonably large (>1h)");
        }

        // Peer
        if self.peer.host.trim().is_empty() {
            eyre::bail!("peer.host must not be empty");
        }
        if self.peer.port == 0 {
            eyre::bail!("peer.port must be > 0");
        }
        for (name, path) in [
            ("peer.on_path", &self.peer.on_path),
            ("peer.off_path", &self.peer.off_path),
        ] {
            if !path.starts_with('/') {
                eyre::bail!("{name} must start with '/'");
            }
            if path.chars().any(char::is_whitespace) {
                eyre::bail!("{name} must not contain whitespace");
            }
        }
        if self.peer.connect_timeout_ms == 0 || self.peer.io_timeout_ms == 0 {
            eyre::bail!("peer timeouts must be >= 1 ms");
        }

        // Network
        if self.network.poll_ms == 0 {
            eyre::bail!("network.poll_ms must be >= 1");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
