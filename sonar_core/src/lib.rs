#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Proximity monitoring core (hardware-agnostic).
//!
//! All hardware and network interactions go through the `sonar_traits`
//! capabilities (`TriggerLine`, `EchoLine`, `Indicator`, `Notifier`, `Network`)
//! and the `Clock`/`TickSource` time model, so every stage runs against
//! virtual time in tests.
//!
//! ## Architecture
//!
//! - **Pulse timing**: trigger + bounded echo waits → `DistanceSample` (`pulse`)
//! - **Aggregation**: median of several pulses → `AggregatedDistance` (`aggregate`)
//! - **Decision**: two-threshold hysteresis → `ProximityState` (`hysteresis`)
//! - **Control loop**: indicator + notify-on-transition (`MonitorCore`, `runner`)
//!
//! Expected failures (no echo, no usable samples, a peer that does not answer)
//! are values, never errors. The only fatal condition is a network that does
//! not come up during startup.

pub mod aggregate;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod core;
pub mod error;
pub mod hysteresis;
pub mod pulse;
pub mod runner;
pub mod status;
pub mod util;

pub use aggregate::{AggregatedDistance, Aggregator, median};
pub use builder::{Missing, Monitor, MonitorBuilder, MonitorG, Set, build_monitor};
pub use config::{LoopCfg, PulseCfg, SamplingCfg, StartupCfg};
pub use crate::core::MonitorCore;
pub use hysteresis::{Decision, ProximityState, Thresholds, decide};
pub use pulse::PulseTimer;
pub use sonar_traits::DistanceSample;
pub use status::Iteration;
