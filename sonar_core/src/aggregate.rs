//! Multi-pulse aggregation.
//!
//! Fires the ranger several times and reduces the successful samples to their
//! median, which discards a single misfire without an explicit outlier step.

use std::sync::Arc;
use std::time::Duration;

use sonar_traits::{Clock, Ranger};

/// Result of one aggregation round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregatedDistance {
    /// Median distance in centimeters.
    Cm(f32),
    /// No pulse in the round produced an echo.
    Undetermined,
}

impl AggregatedDistance {
    #[inline]
    pub fn cm(self) -> Option<f32> {
        match self {
            Self::Cm(cm) => Some(cm),
            Self::Undetermined => None,
        }
    }
}

/// Median of `samples`, sorting in place.
///
/// For an even count the upper of the two middle elements is returned, so the
/// result is always one of the observed samples. Empty input yields `None`.
pub fn median(samples: &mut [f32]) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }
    samples.sort_unstable_by(f32::total_cmp);
    Some(samples[samples.len() / 2])
}

pub struct Aggregator<R: Ranger> {
    ranger: R,
    clock: Arc<dyn Clock + Send + Sync>,
    pulse_timeout: Duration,
    buf: Vec<f32>,
}

impl<R: Ranger> Aggregator<R> {
    pub fn new(ranger: R, clock: Arc<dyn Clock + Send + Sync>, pulse_timeout: Duration) -> Self {
        Self {
            ranger,
            clock,
            pulse_timeout,
            buf: Vec::new(),
        }
    }

    /// Fire `count` pulses spaced by `inter_sample_delay` and return the median
    /// of those that produced an echo.
    pub fn aggregate(&mut self, count: usize, inter_sample_delay: Duration) -> AggregatedDistance {
        self.buf.clear();
        for i in 0..count {
            if i > 0 {
                self.clock.sleep(inter_sample_delay);
            }
            if let Some(cm) = self.ranger.measure(self.pulse_timeout).cm()
                && cm.is_finite()
            {
                self.buf.push(cm);
            }
        }
        let ok = self.buf.len();
        match median(&mut self.buf) {
            Some(cm) => {
                tracing::trace!(ok, count, cm, "aggregated");
                AggregatedDistance::Cm(cm)
            }
            None => {
                tracing::debug!(count, "no echo in any sample");
                AggregatedDistance::Undetermined
            }
        }
    }
}
