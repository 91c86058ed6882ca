pub mod clock;

pub use clock::{Clock, MonotonicClock, TickSource, ticks_diff};

/// One echo-timed reading from the ranging sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceSample {
    /// Distance in centimeters.
    Echo(f32),
    /// The echo never rose or never fell within the timeout.
    NoEcho,
}

impl DistanceSample {
    #[inline]
    pub fn cm(self) -> Option<f32> {
        match self {
            Self::Echo(cm) => Some(cm),
            Self::NoEcho => None,
        }
    }
}

/// Anything that can produce a single distance sample within a bounded time.
pub trait Ranger {
    fn measure(&mut self, timeout: std::time::Duration) -> DistanceSample;
}

/// Sensor trigger output.
pub trait TriggerLine {
    fn set_high(&mut self);
    fn set_low(&mut self);
}

/// Sensor echo input.
pub trait EchoLine {
    fn is_high(&mut self) -> bool;
}

/// Local binary indicator (LED, relay, ...).
pub trait Indicator {
    fn set(&mut self, active: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Best-effort remote command; returns whether delivery succeeded.
pub trait Notifier {
    fn notify(&mut self, is_near: bool) -> bool;
}

/// Network link readiness.
pub trait Network {
    fn is_ready(&mut self) -> bool;
}

impl<T: Ranger + ?Sized> Ranger for Box<T> {
    fn measure(&mut self, timeout: std::time::Duration) -> DistanceSample {
        (**self).measure(timeout)
    }
}

impl<T: Indicator + ?Sized> Indicator for Box<T> {
    fn set(&mut self, active: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set(active)
    }
}

impl<T: Notifier + ?Sized> Notifier for Box<T> {
    fn notify(&mut self, is_near: bool) -> bool {
        (**self).notify(is_near)
    }
}

impl<T: Network + ?Sized> Network for Box<T> {
    fn is_ready(&mut self) -> bool {
        (**self).is_ready()
    }
}
