//! Type-state builder for `Monitor` and generic `build_monitor` constructor.
//!
//! The builder enforces at compile time that Ranger, Indicator, and Notifier are
//! provided before `build()` is available. `try_build()` is always available for
//! dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use sonar_traits::clock::{Clock, MonotonicClock};
use sonar_traits::{Indicator, Notifier, Ranger};

use crate::aggregate::Aggregator;
use crate::config::{LoopCfg, SamplingCfg};
use crate::core::MonitorCore;
use crate::error::{BuildError, Result};
use crate::hysteresis::{ProximityState, Thresholds};
use crate::status::Iteration;
use crate::util::MAX_TIMEOUT_US;

/// Mirrors `sonar_config::MAX_SAMPLE_COUNT`.
const MAX_SAMPLE_COUNT: usize = sonar_config::MAX_SAMPLE_COUNT;

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

type BoxedCore = MonitorCore<Box<dyn Ranger>, Box<dyn Indicator>, Box<dyn Notifier>>;

/// Public dynamic (boxed) monitor.
pub struct Monitor {
    pub(crate) inner: BoxedCore,
}

impl core::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Monitor")
            .field("threshold_cm", &self.inner.thresholds.threshold_cm())
            .field("hysteresis_cm", &self.inner.thresholds.hysteresis_cm())
            .finish()
    }
}

impl Monitor {
    /// Start building a Monitor.
    pub fn builder() -> MonitorBuilder<Missing, Missing, Missing> {
        MonitorBuilder::default()
    }

    /// One iteration of the control loop.
    pub fn step(&mut self, previous: ProximityState) -> Iteration {
        self.inner.step(previous)
    }

    pub fn thresholds(&self) -> &Thresholds {
        self.inner.thresholds()
    }

    /// Access the underlying core, e.g. to hand it to `runner::run_loop`.
    pub fn core_mut(&mut self) -> &mut BoxedCore {
        &mut self.inner
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Monitor`. All fields are validated on `build()`.
pub struct MonitorBuilder<R, I, N> {
    ranger: Option<Box<dyn Ranger>>,
    indicator: Option<Box<dyn Indicator>>,
    notifier: Option<Box<dyn Notifier>>,
    thresholds: Option<Thresholds>,
    sampling: Option<SamplingCfg>,
    control: Option<LoopCfg>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    _r: PhantomData<R>,
    _i: PhantomData<I>,
    _n: PhantomData<N>,
}

impl Default for MonitorBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            ranger: None,
            indicator: None,
            notifier: None,
            thresholds: None,
            sampling: None,
            control: None,
            clock: None,
            _r: PhantomData,
            _i: PhantomData,
            _n: PhantomData,
        }
    }
}

/// Validate configuration and construct a `MonitorCore`.
///
/// This is the single source of truth for validation and construction,
/// used by both `MonitorBuilder::try_build()` and `build_monitor()`.
fn validate_and_build<R: Ranger, I: Indicator, N: Notifier>(
    ranger: R,
    indicator: I,
    notifier: N,
    thresholds: Thresholds,
    sampling: SamplingCfg,
    control: LoopCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<MonitorCore<R, I, N>> {
    if sampling.count == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sample count must be >= 1",
        )));
    }
    if sampling.count > MAX_SAMPLE_COUNT {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sample count too large",
        )));
    }
    if sampling.pulse_timeout.is_zero() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "pulse timeout must be > 0",
        )));
    }
    if sampling.pulse_timeout.as_micros() > u128::from(MAX_TIMEOUT_US) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "pulse timeout exceeds tick range",
        )));
    }

    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };

    Ok(MonitorCore {
        aggregator: Aggregator::new(ranger, clock.clone(), sampling.pulse_timeout),
        indicator,
        notifier,
        thresholds,
        sampling,
        control,
        clock,
    })
}

impl<R, I, N> MonitorBuilder<R, I, N> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Monitor> {
        let ranger = self
            .ranger
            .ok_or_else(|| eyre::Report::new(BuildError::MissingRanger))?;
        let indicator = self
            .indicator
            .ok_or_else(|| eyre::Report::new(BuildError::MissingIndicator))?;
        let notifier = self
            .notifier
            .ok_or_else(|| eyre::Report::new(BuildError::MissingNotifier))?;

        let inner = validate_and_build(
            ranger,
            indicator,
            notifier,
            self.thresholds.unwrap_or_default(),
            self.sampling.unwrap_or_default(),
            self.control.unwrap_or_default(),
            self.clock,
        )?;

        Ok(Monitor { inner })
    }
}

/// Chainable setters that do not affect type-state.
impl<R, I, N> MonitorBuilder<R, I, N> {
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }
    pub fn with_sampling(mut self, sampling: SamplingCfg) -> Self {
        self.sampling = Some(sampling);
        self
    }
    pub fn with_loop(mut self, control: LoopCfg) -> Self {
        self.control = Some(control);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setters that advance type-state
impl<I, N> MonitorBuilder<Missing, I, N> {
    pub fn with_ranger(self, ranger: impl Ranger + 'static) -> MonitorBuilder<Set, I, N> {
        MonitorBuilder {
            ranger: Some(Box::new(ranger)),
            indicator: self.indicator,
            notifier: self.notifier,
            thresholds: self.thresholds,
            sampling: self.sampling,
            control: self.control,
            clock: self.clock,
            _r: PhantomData,
            _i: PhantomData,
            _n: PhantomData,
        }
    }
}

impl<R, N> MonitorBuilder<R, Missing, N> {
    pub fn with_indicator(self, indicator: impl Indicator + 'static) -> MonitorBuilder<R, Set, N> {
        MonitorBuilder {
            ranger: self.ranger,
            indicator: Some(Box::new(indicator)),
            notifier: self.notifier,
            thresholds: self.thresholds,
            sampling: self.sampling,
            control: self.control,
            clock: self.clock,
            _r: PhantomData,
            _i: PhantomData,
            _n: PhantomData,
        }
    }
}

impl<R, I> MonitorBuilder<R, I, Missing> {
    pub fn with_notifier(self, notifier: impl Notifier + 'static) -> MonitorBuilder<R, I, Set> {
        MonitorBuilder {
            ranger: self.ranger,
            indicator: self.indicator,
            notifier: Some(Box::new(notifier)),
            thresholds: self.thresholds,
            sampling: self.sampling,
            control: self.control,
            clock: self.clock,
            _r: PhantomData,
            _i: PhantomData,
            _n: PhantomData,
        }
    }
}

impl MonitorBuilder<Set, Set, Set> {
    /// Validate and build the Monitor. Only available when Ranger, Indicator, and Notifier are set.
    pub fn build(self) -> Result<Monitor> {
        self.try_build()
    }
}

/// Generic, statically-dispatched alias using the unified core.
pub type MonitorG<R, I, N> = MonitorCore<R, I, N>;

/// Build a generic, statically-dispatched `MonitorG` from concrete parts.
///
/// Delegates to the shared `validate_and_build`.
pub fn build_monitor<R, I, N>(
    ranger: R,
    indicator: I,
    notifier: N,
    thresholds: Thresholds,
    sampling: SamplingCfg,
    control: LoopCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<MonitorG<R, I, N>>
where
    R: Ranger + 'static,
    I: Indicator + 'static,
    N: Notifier + 'static,
{
    validate_and_build(ranger, indicator, notifier, thresholds, sampling, control, clock)
}
