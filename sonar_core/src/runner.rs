use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sonar_traits::{Clock, Indicator, Network, Notifier, Ranger};

use crate::core::MonitorCore;
use crate::error::{Result as CoreResult, SonarError};
use crate::hysteresis::ProximityState;
use crate::status::Iteration;
use crate::{LoopCfg, SamplingCfg, StartupCfg, Thresholds};

/// Counters collected over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub iterations: u64,
    pub transitions: u64,
    pub notify_failures: u64,
    pub undetermined: u64,
    pub final_state: ProximityState,
}

impl RunStats {
    fn record(&mut self, it: &Iteration) {
        self.iterations = self.iterations.saturating_add(1);
        if it.transitioned {
            self.transitions = self.transitions.saturating_add(1);
        }
        if it.notified == Some(false) {
            self.notify_failures = self.notify_failures.saturating_add(1);
        }
        if it.distance.cm().is_none() {
            self.undetermined = self.undetermined.saturating_add(1);
        }
        self.final_state = it.state;
    }
}

/// Block until `network` reports ready, polling every `startup.poll`.
///
/// Fails with `SonarError::NetworkUnavailable` once `startup.connect_window`
/// has passed, or `SonarError::Interrupted` if `shutdown` is raised first.
pub fn wait_until_ready<W: Network + ?Sized>(
    network: &mut W,
    clock: &dyn Clock,
    startup: &StartupCfg,
    shutdown: &AtomicBool,
) -> CoreResult<()> {
    let epoch = clock.now();
    let window_ms = startup.connect_window.as_millis() as u64;
    loop {
        if network.is_ready() {
            tracing::info!(waited_ms = clock.ms_since(epoch), "network ready");
            return Ok(());
        }
        if shutdown.load(Ordering::Relaxed) {
            return Err(SonarError::Interrupted.into());
        }
        let waited_ms = clock.ms_since(epoch);
        if waited_ms >= window_ms {
            tracing::error!(waited_ms, "network not ready, giving up");
            return Err(SonarError::NetworkUnavailable { waited_ms }.into());
        }
        clock.sleep(startup.poll);
    }
}

/// Drive `monitor` until `shutdown` is raised or `max_iterations` is reached.
///
/// The proximity state starts at `Unset` and lives only in this function.
/// The indicator is switched off on exit.
pub fn run_loop<R, I, N>(
    monitor: &mut MonitorCore<R, I, N>,
    max_iterations: Option<u64>,
    shutdown: &AtomicBool,
) -> RunStats
where
    R: Ranger,
    I: Indicator,
    N: Notifier,
{
    let mut stats = RunStats::default();
    let mut state = ProximityState::Unset;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break;
        }
        let it = monitor.step(state);
        stats.record(&it);
        if it.transitioned {
            tracing::info!(
                from = %state,
                to = %it.state,
                distance_cm = it.distance.cm(),
                notified = it.notified,
                "proximity changed"
            );
        }
        state = it.state;

        if max_iterations.is_some_and(|max| stats.iterations >= max) {
            break;
        }
        monitor.pause();
    }
    monitor.indicator_off();
    stats
}

/// Everything `run` needs besides the hardware.
#[derive(Debug, Clone, Default)]
pub struct RunParams {
    pub thresholds: Thresholds,
    pub sampling: SamplingCfg,
    pub control: LoopCfg,
    pub startup: StartupCfg,
    pub max_iterations: Option<u64>,
}

/// Wait for the network, then run the control loop.
///
/// Returns only on shutdown, iteration limit, or a startup failure; in the
/// latter case the loop is never entered.
pub fn run<R, I, N, W>(
    ranger: R,
    indicator: I,
    notifier: N,
    mut network: W,
    params: RunParams,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<RunStats>
where
    R: Ranger + 'static,
    I: Indicator + 'static,
    N: Notifier + 'static,
    W: Network,
{
    let mut monitor = crate::build_monitor(
        ranger,
        indicator,
        notifier,
        params.thresholds,
        params.sampling,
        params.control,
        clock,
    )?;

    wait_until_ready(
        &mut network,
        monitor.clock().as_ref(),
        &params.startup,
        &shutdown,
    )?;

    tracing::info!(
        threshold_cm = params.thresholds.threshold_cm(),
        hysteresis_cm = params.thresholds.hysteresis_cm(),
        samples = params.sampling.count,
        "monitor start"
    );
    Ok(run_loop(&mut monitor, params.max_iterations, &shutdown))
}
