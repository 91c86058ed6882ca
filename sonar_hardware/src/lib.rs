//! Concrete backends for the `sonar_traits` capabilities.
//!
//! - `sim`: simulated sensor lines, indicator, and link (always available)
//! - `gpio`: Raspberry Pi pins through `rppal` (`hardware` feature, Linux only)
//! - `net`: HTTP peer notifier and TCP readiness check

pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
pub mod net;
pub mod sim;

pub use error::HwError;
pub use net::{HttpNotifier, PeerAddr, TcpProbe};
pub use sim::{SimTarget, SimulatedIndicator, SimulatedNetwork};
