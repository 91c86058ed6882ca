//! Backend assembly and the `run` / `measure` / `self-check` commands.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::WrapErr;
use sonar_core::error::Result as CoreResult;
use sonar_core::runner::{RunParams, RunStats};
use sonar_core::{AggregatedDistance, Aggregator, PulseCfg, PulseTimer, SamplingCfg, Thresholds};
use sonar_hardware::{HttpNotifier, PeerAddr};
use sonar_traits::{Indicator, MonotonicClock, Network, Ranger};

fn notifier(cfg: &sonar_config::Config) -> HttpNotifier {
    HttpNotifier::new(
        PeerAddr::new(cfg.peer.host.clone(), cfg.peer.port),
        cfg.peer.on_path.clone(),
        cfg.peer.off_path.clone(),
    )
    .with_timeouts(
        Duration::from_millis(cfg.peer.connect_timeout_ms),
        Duration::from_millis(cfg.peer.io_timeout_ms),
    )
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn ranger(cfg: &sonar_config::Config) -> CoreResult<Box<dyn Ranger>> {
    let (trigger, echo) = sonar_hardware::gpio::open_sensor(cfg.pins.trigger, cfg.pins.echo)
        .wrap_err("open sensor pins")?;
    let pulse: PulseCfg = (&cfg.sensor).into();
    Ok(Box::new(PulseTimer::new(
        trigger,
        echo,
        MonotonicClock::new(),
        pulse,
    )))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn ranger(cfg: &sonar_config::Config) -> CoreResult<Box<dyn Ranger>> {
    let clock = MonotonicClock::new();
    let target = sonar_hardware::SimTarget::from_env();
    tracing::info!(?target, "using simulated sensor");
    let (trigger, echo) = sonar_hardware::sim::sensor(clock, target, cfg.sensor.sound_speed_m_s);
    let pulse: PulseCfg = (&cfg.sensor).into();
    Ok(Box::new(PulseTimer::new(trigger, echo, clock, pulse)))
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn indicator(cfg: &sonar_config::Config) -> CoreResult<Box<dyn Indicator>> {
    let ind = sonar_hardware::gpio::open_indicator(cfg.pins.indicator)
        .wrap_err("open indicator pin")?;
    Ok(Box::new(ind))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn indicator(_cfg: &sonar_config::Config) -> CoreResult<Box<dyn Indicator>> {
    Ok(Box::new(sonar_hardware::SimulatedIndicator::new()))
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn network(cfg: &sonar_config::Config) -> Box<dyn Network> {
    Box::new(sonar_hardware::TcpProbe::new(
        PeerAddr::new(cfg.peer.host.clone(), cfg.peer.port),
        Duration::from_millis(cfg.peer.connect_timeout_ms),
    ))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn network(_cfg: &sonar_config::Config) -> Box<dyn Network> {
    Box::new(sonar_hardware::SimulatedNetwork::from_env())
}

/// Wait for the network, then monitor until shutdown or the iteration limit.
pub fn run_monitor(
    cfg: &sonar_config::Config,
    iterations: Option<u64>,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<RunStats> {
    let thresholds = Thresholds::try_from(&cfg.thresholds)?;
    let params = RunParams {
        thresholds,
        sampling: cfg.into(),
        control: (&cfg.control).into(),
        startup: (&cfg.network).into(),
        max_iterations: iterations,
    };
    let notifier = notifier(cfg);
    tracing::info!(peer = %notifier.peer(), "peer configured");

    let stats = sonar_core::runner::run(
        ranger(cfg)?,
        indicator(cfg)?,
        notifier,
        network(cfg),
        params,
        None,
        shutdown,
    )?;
    tracing::info!(
        iterations = stats.iterations,
        transitions = stats.transitions,
        final_state = %stats.final_state,
        "monitor stopped"
    );
    Ok(stats)
}

/// One aggregated reading; no network, no indicator.
pub fn measure(cfg: &sonar_config::Config, count: Option<usize>) -> CoreResult<AggregatedDistance> {
    let mut sampling: SamplingCfg = cfg.into();
    if let Some(n) = count {
        sampling.count = n;
    }
    if sampling.count == 0 || sampling.count > sonar_config::MAX_SAMPLE_COUNT {
        return Err(crate::ConfigError(format!(
            "count must be in 1..={}",
            sonar_config::MAX_SAMPLE_COUNT
        ))
        .into());
    }
    let mut agg = Aggregator::new(
        ranger(cfg)?,
        Arc::new(MonotonicClock::new()),
        sampling.pulse_timeout,
    );
    Ok(agg.aggregate(sampling.count, sampling.inter_sample))
}

/// Build every backend once without running anything.
pub fn self_check(cfg: &sonar_config::Config) -> CoreResult<()> {
    Thresholds::try_from(&cfg.thresholds)?;
    let _ranger = ranger(cfg)?;
    let mut ind = indicator(cfg)?;
    if let Err(e) = ind.set(false) {
        return Err(eyre::eyre!("indicator: {e}"));
    }
    let _ = notifier(cfg).peer().resolve().wrap_err("resolve peer")?;
    Ok(())
}

pub fn print_stats(stats: &RunStats) {
    eprintln!("\n--- Sonar Stats ---");
    eprintln!("Iterations: {}", stats.iterations);
    eprintln!("Transitions: {}", stats.transitions);
    eprintln!("Notify failures: {}", stats.notify_failures);
    eprintln!("Undetermined readings: {}", stats.undetermined);
    eprintln!("Final state: {}", stats.final_state);
    eprintln!("-------------------\n");
}
