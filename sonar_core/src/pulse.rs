//! Echo pulse timing for HC-SR04 style sensors.
//!
//! One measurement fires a short trigger pulse, waits for the echo line to
//! rise, then waits for it to fall. The pulse width is the round-trip time of
//! flight. Both waits are bounded; running out of time is reported as
//! `DistanceSample::NoEcho` and never retried here.

use std::time::Duration;

use sonar_traits::{DistanceSample, EchoLine, Ranger, TickSource, TriggerLine, ticks_diff};
use tracing::trace;

use crate::config::PulseCfg;
use crate::util::{echo_us_to_cm, timeout_us};

pub struct PulseTimer<T: TriggerLine, E: EchoLine, C: TickSource> {
    trigger: T,
    echo: E,
    clock: C,
    cfg: PulseCfg,
}

impl<T: TriggerLine, E: EchoLine, C: TickSource> core::fmt::Debug for PulseTimer<T, E, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PulseTimer").field("cfg", &self.cfg).finish()
    }
}

impl<T: TriggerLine, E: EchoLine, C: TickSource> PulseTimer<T, E, C> {
    pub fn new(mut trigger: T, echo: E, clock: C, cfg: PulseCfg) -> Self {
        trigger.set_low(); // trigger idles low
        Self {
            trigger,
            echo,
            clock,
            cfg,
        }
    }

    fn fire_trigger(&mut self) {
        self.trigger.set_low();
        self.clock.delay_us(self.cfg.settle_us);
        self.trigger.set_high();
        self.clock.delay_us(self.cfg.trigger_pulse_us);
        self.trigger.set_low();
    }

    /// Poll the echo line until it reads `high`, returning the tick at which
    /// the level was seen, or `None` once `timeout_us` has elapsed since `since`.
    fn wait_for_level(&mut self, high: bool, since: u32, timeout_us: u32) -> Option<u32> {
        loop {
            if self.echo.is_high() == high {
                return Some(self.clock.ticks_us());
            }
            if ticks_diff(self.clock.ticks_us(), since) > timeout_us {
                return None;
            }
            self.clock.delay_us(self.cfg.poll_us);
        }
    }
}

impl<T: TriggerLine, E: EchoLine, C: TickSource> Ranger for PulseTimer<T, E, C> {
    fn measure(&mut self, timeout: Duration) -> DistanceSample {
        let limit_us = timeout_us(timeout);

        self.fire_trigger();
        let fired = self.clock.ticks_us();

        let Some(rise) = self.wait_for_level(true, fired, limit_us) else {
            trace!(timeout_us = limit_us, "echo never rose");
            return DistanceSample::NoEcho;
        };
        let Some(fall) = self.wait_for_level(false, rise, limit_us) else {
            trace!(timeout_us = limit_us, "echo never fell");
            return DistanceSample::NoEcho;
        };

        let width_us = ticks_diff(fall, rise);
        let cm = echo_us_to_cm(width_us, self.cfg.sound_speed_m_s);
        trace!(width_us, cm, "echo pulse");
        DistanceSample::Echo(cm)
    }
}
