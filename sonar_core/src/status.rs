//! Outcome of a single control loop iteration.

use crate::aggregate::AggregatedDistance;
use crate::hysteresis::ProximityState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Iteration {
    pub distance: AggregatedDistance,
    /// State to carry into the next iteration.
    pub state: ProximityState,
    pub transitioned: bool,
    /// `Some(ok)` when the notifier was called this iteration.
    pub notified: Option<bool>,
}
