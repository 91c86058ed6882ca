//! The unified control loop body (`MonitorCore`).
//!
//! One `step` samples the distance, runs the hysteresis decision, drives the
//! indicator and, on a transition, notifies the peer. The proximity state is
//! passed in and returned; the core itself keeps none.

use std::sync::Arc;

use sonar_traits::{Clock, Indicator, Notifier, Ranger};

use crate::aggregate::Aggregator;
use crate::config::{LoopCfg, SamplingCfg};
use crate::hysteresis::{ProximityState, Thresholds, decide};
use crate::status::Iteration;

/// Unified core for both dynamic (boxed) and generic (static dispatch) variants.
pub struct MonitorCore<R: Ranger, I: Indicator, N: Notifier> {
    pub(crate) aggregator: Aggregator<R>,
    pub(crate) indicator: I,
    pub(crate) notifier: N,
    pub(crate) thresholds: Thresholds,
    pub(crate) sampling: SamplingCfg,
    pub(crate) control: LoopCfg,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
}

impl<R: Ranger, I: Indicator, N: Notifier> core::fmt::Debug for MonitorCore<R, I, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MonitorCore")
            .field("thresholds", &self.thresholds)
            .field("sampling", &self.sampling)
            .field("control", &self.control)
            .finish()
    }
}

impl<R: Ranger, I: Indicator, N: Notifier> MonitorCore<R, I, N> {
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    /// One iteration of the control loop.
    pub fn step(&mut self, previous: ProximityState) -> Iteration {
        let distance = self
            .aggregator
            .aggregate(self.sampling.count, self.sampling.inter_sample);
        let decision = decide(&self.thresholds, previous, distance);

        self.drive_indicator(decision.state.is_near());

        let notified = if decision.transitioned && self.should_notify(previous) {
            let ok = self.notifier.notify(decision.state.is_near());
            if !ok {
                tracing::warn!(state = %decision.state, "peer notification failed");
            }
            Some(ok)
        } else {
            None
        };

        tracing::debug!(
            distance_cm = distance.cm(),
            state = %decision.state,
            transitioned = decision.transitioned,
            "iteration"
        );

        Iteration {
            distance,
            state: decision.state,
            transitioned: decision.transitioned,
            notified,
        }
    }

    /// Sleep for the configured cadence.
    pub fn pause(&self) {
        self.clock.sleep(self.control.cadence);
    }

    /// Switch the indicator off (best-effort).
    pub fn indicator_off(&mut self) {
        self.drive_indicator(false);
    }

    // ── Private ──────────────────────────────────────────────────────────────

    fn should_notify(&self, previous: ProximityState) -> bool {
        previous != ProximityState::Unset || self.control.notify_initial
    }

    fn drive_indicator(&mut self, active: bool) {
        if let Err(e) = self.indicator.set(active) {
            tracing::warn!(error = %e, active, "indicator update failed");
        }
    }
}
