use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

/// Monotonic clock abstraction for control and timing across the stack.
///
/// - now(): returns a monotonic Instant
/// - sleep(): sleeps for the provided duration (implementations may simulate)
/// - ms_since(): helper to compute elapsed milliseconds from an epoch Instant
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Milliseconds elapsed since `epoch`, saturating at 0 on underflow.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        dur.as_millis() as u64
    }
}

/// Free-running microsecond tick counter used for pulse timing.
///
/// The counter is 32 bits wide and wraps roughly every 71.6 minutes; always
/// compare readings with [`ticks_diff`], never with plain subtraction.
pub trait TickSource {
    fn ticks_us(&self) -> u32;
    /// Short busy delay in microseconds.
    fn delay_us(&self, us: u32);
}

/// Microseconds from `start` to `end`, correct across one counter wrap.
#[inline]
pub fn ticks_diff(end: u32, start: u32) -> u32 {
    end.wrapping_sub(start)
}

/// Below this, `delay_us` spins instead of asking the scheduler to sleep.
const SPIN_LIMIT: Duration = Duration::from_micros(200);

fn process_epoch() -> Instant {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    *EPOCH.get_or_init(Instant::now)
}

/// Default, real-time monotonic clock backed by std::time::Instant.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        // Pin the tick epoch as early as possible.
        let _ = process_epoch();
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

impl TickSource for MonotonicClock {
    #[inline]
    fn ticks_us(&self) -> u32 {
        // Truncation is the wrap.
        process_epoch().elapsed().as_micros() as u32
    }

    fn delay_us(&self, us: u32) {
        if us == 0 {
            return;
        }
        let d = Duration::from_micros(u64::from(us));
        if d >= SPIN_LIMIT {
            thread::sleep(d);
            return;
        }
        let start = Instant::now();
        while start.elapsed() < d {
            std::hint::spin_loop();
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_clock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Deterministic test clock whose time can be advanced manually.
    ///
    /// now() = origin + offset
    /// ticks_us() = tick_origin + offset (wrapping)
    /// sleep(d) and delay_us(us) advance internal time without actually sleeping.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        tick_origin: u32,
        offset: Arc<Mutex<Duration>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self::with_tick_origin(0)
        }

        /// Start the tick counter at `tick_origin`, e.g. just below `u32::MAX`
        /// to exercise wraparound.
        pub fn with_tick_origin(tick_origin: u32) -> Self {
            Self {
                origin: Instant::now(),
                tick_origin,
                offset: Arc::new(Mutex::new(Duration::ZERO)),
            }
        }

        /// Advance the clock by the given duration.
        pub fn advance(&self, d: Duration) {
            if let Ok(mut off) = self.offset.lock() {
                *off = off.saturating_add(d);
            }
        }

        /// Set the absolute offset relative to origin (useful for tests).
        pub fn set_offset(&self, d: Duration) {
            if let Ok(mut off) = self.offset.lock() {
                *off = d;
            }
        }

        /// Time elapsed since the clock was created.
        pub fn elapsed(&self) -> Duration {
            self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO)
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.origin + self.elapsed()
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
        }
    }

    impl TickSource for TestClock {
        fn ticks_us(&self) -> u32 {
            self.tick_origin
                .wrapping_add(self.elapsed().as_micros() as u32)
        }

        fn delay_us(&self, us: u32) {
            self.advance(Duration::from_micros(u64::from(us)));
        }
    }
}
