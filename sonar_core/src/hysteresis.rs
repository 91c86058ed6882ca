//! Two-threshold near/far decision.
//!
//! A reading must drop below `T - H/2` to become `Near`, and rise to at least
//! `T + H/2` to fall back to `Far`. Readings inside the band keep the current
//! state, so a target hovering at `T` does not chatter.

use crate::aggregate::AggregatedDistance;
use crate::error::BuildError;

/// Binary proximity state plus the startup placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProximityState {
    /// No determination yet. Only ever the initial value.
    #[default]
    Unset,
    Far,
    Near,
}

impl ProximityState {
    #[inline]
    pub fn is_near(self) -> bool {
        matches!(self, Self::Near)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Far => "far",
            Self::Near => "near",
        }
    }
}

impl core::fmt::Display for ProximityState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nominal threshold and hysteresis band, both in centimeters.
///
/// Invariant: `threshold_cm > 0` and `0 <= hysteresis_cm < 2 * threshold_cm`,
/// so the enter-near point stays positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    threshold_cm: f32,
    hysteresis_cm: f32,
}

impl Thresholds {
    pub fn new(threshold_cm: f32, hysteresis_cm: f32) -> Result<Self, BuildError> {
        if !threshold_cm.is_finite() || threshold_cm <= 0.0 {
            return Err(BuildError::InvalidConfig("threshold_cm must be > 0"));
        }
        if !hysteresis_cm.is_finite() || hysteresis_cm < 0.0 {
            return Err(BuildError::InvalidConfig("hysteresis_cm must be >= 0"));
        }
        if hysteresis_cm >= 2.0 * threshold_cm {
            return Err(BuildError::InvalidConfig(
                "hysteresis_cm must be < 2 * threshold_cm",
            ));
        }
        Ok(Self {
            threshold_cm,
            hysteresis_cm,
        })
    }

    pub fn threshold_cm(&self) -> f32 {
        self.threshold_cm
    }

    pub fn hysteresis_cm(&self) -> f32 {
        self.hysteresis_cm
    }

    /// Readings below this switch `Far`/`Unset` to `Near`.
    #[inline]
    pub fn enter_near_below(&self) -> f32 {
        self.threshold_cm - self.hysteresis_cm / 2.0
    }

    /// Readings below this keep `Near`.
    #[inline]
    pub fn stay_near_below(&self) -> f32 {
        self.threshold_cm + self.hysteresis_cm / 2.0
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            threshold_cm: 10.0,
            hysteresis_cm: 0.8,
        }
    }
}

/// Outcome of one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub state: ProximityState,
    /// `state != previous`.
    pub transitioned: bool,
}

/// Compute the next state from the previous one and the latest reading.
///
/// An undetermined reading holds `previous` (loss of signal never flips the
/// state). Leaving `Unset` counts as a transition.
pub fn decide(
    thresholds: &Thresholds,
    previous: ProximityState,
    distance: AggregatedDistance,
) -> Decision {
    let Some(cm) = distance.cm() else {
        return Decision {
            state: previous,
            transitioned: false,
        };
    };

    let boundary = match previous {
        ProximityState::Near => thresholds.stay_near_below(),
        ProximityState::Far | ProximityState::Unset => thresholds.enter_near_below(),
    };
    let state = if cm < boundary {
        ProximityState::Near
    } else {
        ProximityState::Far
    };

    Decision {
        state,
        transitioned: state != previous,
    }
}
