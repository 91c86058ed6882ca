//! Simulated sensor, indicator, and network link.
//!
//! The simulated sensor answers a trigger pulse the way an HC-SR04 does: after
//! the trigger's falling edge the echo line goes high for a time proportional
//! to the round-trip distance to the target.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use sonar_traits::{EchoLine, Indicator, Network, TickSource, TriggerLine, ticks_diff};

pub const ENV_DISTANCE_CM: &str = "SONAR_TEST_SIM_DISTANCE_CM";
pub const ENV_NO_ECHO: &str = "SONAR_TEST_SIM_NO_ECHO";
pub const ENV_OFFLINE: &str = "SONAR_TEST_SIM_OFFLINE";

/// Delay between the trigger falling edge and the echo rising edge.
pub const ECHO_LATENCY_US: u32 = 200;

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// What the simulated sensor "sees".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimTarget {
    /// Nothing in range; the echo never rises.
    Absent,
    Fixed(f32),
    /// Triangle wave between `min_cm` and `max_cm`.
    Sweep {
        min_cm: f32,
        max_cm: f32,
        period: Duration,
    },
}

impl Default for SimTarget {
    fn default() -> Self {
        Self::Sweep {
            min_cm: 4.0,
            max_cm: 20.0,
            period: Duration::from_secs(8),
        }
    }
}

impl SimTarget {
    /// `SONAR_TEST_SIM_NO_ECHO` wins over `SONAR_TEST_SIM_DISTANCE_CM`;
    /// otherwise the default sweep.
    pub fn from_env() -> Self {
        if env_flag(ENV_NO_ECHO) {
            return Self::Absent;
        }
        match std::env::var(ENV_DISTANCE_CM)
            .ok()
            .and_then(|v| v.trim().parse::<f32>().ok())
        {
            Some(cm) if cm.is_finite() && cm >= 0.0 => Self::Fixed(cm),
            Some(_) => {
                tracing::warn!(var = ENV_DISTANCE_CM, "ignoring invalid simulated distance");
                Self::default()
            }
            None => Self::default(),
        }
    }

    pub fn distance_at(&self, elapsed: Duration) -> Option<f32> {
        match *self {
            Self::Absent => None,
            Self::Fixed(cm) => Some(cm),
            Self::Sweep {
                min_cm,
                max_cm,
                period,
            } => {
                if period.is_zero() {
                    return Some(min_cm);
                }
                let phase = (elapsed.as_secs_f64() / period.as_secs_f64()).fract();
                let tri = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };
                Some(min_cm + (max_cm - min_cm) * tri as f32)
            }
        }
    }
}

#[derive(Debug)]
struct Shared<C> {
    clock: C,
    target: SimTarget,
    sound_speed_m_s: f32,
    start: u32,
    level: Cell<bool>,
    /// (rise tick, echo width in µs) of the pending echo.
    echo: Cell<Option<(u32, u32)>>,
}

/// Build a connected trigger/echo pair on `clock`.
pub fn sensor<C: TickSource>(
    clock: C,
    target: SimTarget,
    sound_speed_m_s: f32,
) -> (SimTrigger<C>, SimEcho<C>) {
    let start = clock.ticks_us();
    let shared = Rc::new(Shared {
        clock,
        target,
        sound_speed_m_s,
        start,
        level: Cell::new(false),
        echo: Cell::new(None),
    });
    (
        SimTrigger {
            shared: Rc::clone(&shared),
        },
        SimEcho { shared },
    )
}

#[derive(Debug)]
pub struct SimTrigger<C> {
    shared: Rc<Shared<C>>,
}

impl<C: TickSource> TriggerLine for SimTrigger<C> {
    fn set_high(&mut self) {
        self.shared.level.set(true);
    }

    fn set_low(&mut self) {
        let s = &*self.shared;
        if !s.level.replace(false) {
            return;
        }
        let now = s.clock.ticks_us();
        let elapsed = Duration::from_micros(u64::from(ticks_diff(now, s.start)));
        let echo = s.target.distance_at(elapsed).map(|cm| {
            // round trip in µs: 2 * cm / (m/s * 100 cm/m / 1e6 µs/s)
            let width = 2.0 * f64::from(cm) * 10_000.0 / f64::from(s.sound_speed_m_s);
            (now.wrapping_add(ECHO_LATENCY_US), width.round() as u32)
        });
        s.echo.set(echo);
    }
}

#[derive(Debug)]
pub struct SimEcho<C> {
    shared: Rc<Shared<C>>,
}

impl<C: TickSource> EchoLine for SimEcho<C> {
    fn is_high(&mut self) -> bool {
        let s = &*self.shared;
        let Some((rise, width)) = s.echo.get() else {
            return false;
        };
        // Before `rise` the wrapped difference is huge and fails the check.
        ticks_diff(s.clock.ticks_us(), rise) < width
    }
}

/// Indicator that only logs level changes.
#[derive(Debug, Default)]
pub struct SimulatedIndicator {
    level: Option<bool>,
}

impl SimulatedIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> Option<bool> {
        self.level
    }
}

impl Indicator for SimulatedIndicator {
    fn set(&mut self, active: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.level != Some(active) {
            tracing::info!(active, "indicator (simulated)");
            self.level = Some(active);
        }
        Ok(())
    }
}

/// Link that is always up unless `SONAR_TEST_SIM_OFFLINE=1`.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedNetwork {
    online: bool,
}

impl SimulatedNetwork {
    pub fn new(online: bool) -> Self {
        Self { online }
    }

    pub fn from_env() -> Self {
        Self::new(!env_flag(ENV_OFFLINE))
    }
}

impl Network for SimulatedNetwork {
    fn is_ready(&mut self) -> bool {
        self.online
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_is_a_triangle() {
        let t = SimTarget::Sweep {
            min_cm: 0.0,
            max_cm: 10.0,
            period: Duration::from_secs(4),
        };
        let at = |ms| t.distance_at(Duration::from_millis(ms)).unwrap();
        assert!((at(0) - 0.0).abs() < 1e-4);
        assert!((at(1000) - 5.0).abs() < 1e-4);
        assert!((at(2000) - 10.0).abs() < 1e-4);
        assert!((at(3000) - 5.0).abs() < 1e-4);
        assert!((at(4000) - 0.0).abs() < 1e-4);
    }

    #[test]
    fn absent_target_has_no_distance() {
        assert_eq!(SimTarget::Absent.distance_at(Duration::ZERO), None);
    }

    #[test]
    fn indicator_tracks_level() {
        let mut ind = SimulatedIndicator::new();
        assert_eq!(ind.level(), None);
        ind.set(true).unwrap();
        ind.set(true).unwrap();
        assert_eq!(ind.level(), Some(true));
        ind.set(false).unwrap();
        assert_eq!(ind.level(), Some(false));
    }
}
