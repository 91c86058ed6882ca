use std::cell::{Cell, RefCell};
use std::error::Error;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sonar_core::error::SonarError;
use sonar_core::runner::{RunParams, run, run_loop, wait_until_ready};
use sonar_core::{LoopCfg, ProximityState, SamplingCfg, StartupCfg, Thresholds, build_monitor};
use sonar_traits::clock::test_clock::TestClock;
use sonar_traits::{DistanceSample, Indicator, Network, Notifier, Ranger};

struct CountingRanger {
    cm: f32,
    calls: Rc<Cell<u32>>,
}
impl Ranger for CountingRanger {
    fn measure(&mut self, _timeout: Duration) -> DistanceSample {
        self.calls.set(self.calls.get() + 1);
        DistanceSample::Echo(self.cm)
    }
}

#[derive(Clone, Default)]
struct SpyIndicator(Rc<RefCell<Vec<bool>>>);
impl Indicator for SpyIndicator {
    fn set(&mut self, active: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.0.borrow_mut().push(active);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct CountingNotifier(Rc<Cell<u32>>);
impl Notifier for CountingNotifier {
    fn notify(&mut self, _is_near: bool) -> bool {
        self.0.set(self.0.get() + 1);
        true
    }
}

/// Ready after `after` unsuccessful polls; never if `None`.
struct FlakyNetwork {
    after: Option<u32>,
    polls: u32,
}
impl Network for FlakyNetwork {
    fn is_ready(&mut self) -> bool {
        self.polls += 1;
        self.after.is_some_and(|n| self.polls > n)
    }
}

fn startup() -> StartupCfg {
    StartupCfg {
        connect_window: Duration::from_millis(1_000),
        poll: Duration::from_millis(200),
    }
}

#[test]
fn ready_after_a_few_polls() {
    let clock = TestClock::new();
    let mut net = FlakyNetwork {
        after: Some(2),
        polls: 0,
    };
    let stop = AtomicBool::new(false);
    wait_until_ready(&mut net, &clock, &startup(), &stop).expect("ready");
    assert_eq!(net.polls, 3);
    assert_eq!(clock.elapsed(), Duration::from_millis(400));
}

#[test]
fn readiness_window_is_bounded() {
    let clock = TestClock::new();
    let mut net = FlakyNetwork {
        after: None,
        polls: 0,
    };
    let stop = AtomicBool::new(false);
    let err = wait_until_ready(&mut net, &clock, &startup(), &stop).expect_err("timeout");
    match err.downcast_ref::<SonarError>() {
        Some(SonarError::NetworkUnavailable { waited_ms }) => assert_eq!(*waited_ms, 1_000),
        other => panic!("expected NetworkUnavailable, got {other:?}"),
    }
    assert_eq!(clock.elapsed(), Duration::from_millis(1_000));
}

#[test]
fn shutdown_interrupts_readiness_wait() {
    let clock = TestClock::new();
    let mut net = FlakyNetwork {
        after: None,
        polls: 0,
    };
    let stop = AtomicBool::new(true);
    let err = wait_until_ready(&mut net, &clock, &startup(), &stop).expect_err("interrupted");
    assert!(matches!(
        err.downcast_ref::<SonarError>(),
        Some(SonarError::Interrupted)
    ));
}

#[test]
fn startup_failure_never_enters_the_loop() {
    let calls = Rc::new(Cell::new(0));
    let indicator = SpyIndicator::default();
    let notifier = CountingNotifier::default();
    let res = run(
        CountingRanger {
            cm: 5.0,
            calls: calls.clone(),
        },
        indicator.clone(),
        notifier.clone(),
        FlakyNetwork {
            after: None,
            polls: 0,
        },
        RunParams {
            startup: startup(),
            ..RunParams::default()
        },
        Some(Box::new(TestClock::new())),
        Arc::new(AtomicBool::new(false)),
    );
    assert!(res.is_err());
    assert_eq!(calls.get(), 0);
    assert!(indicator.0.borrow().is_empty());
    assert_eq!(notifier.0.get(), 0);
}

#[test]
fn run_honours_iteration_limit_and_cadence() {
    let clock = TestClock::new();
    let calls = Rc::new(Cell::new(0));
    let indicator = SpyIndicator::default();
    let notifier = CountingNotifier::default();
    let params = RunParams {
        thresholds: Thresholds::new(10.0, 0.8).expect("thresholds"),
        sampling: SamplingCfg {
            count: 5,
            inter_sample: Duration::from_millis(30),
            pulse_timeout: Duration::from_micros(30_000),
        },
        control: LoopCfg {
            cadence: Duration::from_millis(100),
            notify_initial: true,
        },
        startup: startup(),
        max_iterations: Some(3),
    };
    let stats = run(
        CountingRanger {
            cm: 5.0,
            calls: calls.clone(),
        },
        indicator.clone(),
        notifier.clone(),
        FlakyNetwork {
            after: Some(0),
            polls: 0,
        },
        params,
        Some(Box::new(clock.clone())),
        Arc::new(AtomicBool::new(false)),
    )
    .expect("run");

    assert_eq!(stats.iterations, 3);
    assert_eq!(stats.transitions, 1);
    assert_eq!(stats.notify_failures, 0);
    assert_eq!(stats.final_state, ProximityState::Near);
    assert_eq!(calls.get(), 15);
    assert_eq!(notifier.0.get(), 1);
    // Three iterations on, then switched off on exit.
    assert_eq!(*indicator.0.borrow(), vec![true, true, true, false]);
    // 3 x (4 x 30 ms spacing) + 2 x 100 ms cadence; no sleep after the last iteration.
    assert_eq!(clock.elapsed(), Duration::from_millis(3 * 120 + 2 * 100));
}

#[test]
fn run_loop_stops_on_shutdown_flag() {
    let stop = AtomicBool::new(true);
    let mut m = build_monitor(
        CountingRanger {
            cm: 5.0,
            calls: Rc::new(Cell::new(0)),
        },
        SpyIndicator::default(),
        CountingNotifier::default(),
        Thresholds::default(),
        SamplingCfg::default(),
        LoopCfg::default(),
        Some(Box::new(TestClock::new())),
    )
    .expect("build");
    let stats = run_loop(&mut m, None, &stop);
    assert_eq!(stats.iterations, 0);
    assert_eq!(stats.final_state, ProximityState::Unset);

    stop.store(false, Ordering::Relaxed);
    let stats = run_loop(&mut m, Some(2), &stop);
    assert_eq!(stats.iterations, 2);
}

#[test]
fn boxed_monitor_runs_through_run_loop() {
    let clock = TestClock::new();
    let calls = Rc::new(Cell::new(0));
    let indicator = SpyIndicator::default();
    let notes = CountingNotifier::default();
    let mut monitor = sonar_core::Monitor::builder()
        .with_ranger(CountingRanger {
            cm: 30.0,
            calls: calls.clone(),
        })
        .with_indicator(indicator.clone())
        .with_notifier(notes.clone())
        .with_sampling(SamplingCfg {
            count: 1,
            ..SamplingCfg::default()
        })
        .with_clock(Box::new(clock.clone()))
        .build()
        .expect("build");

    let stop = AtomicBool::new(false);
    let stats = run_loop(monitor.core_mut(), Some(2), &stop);

    assert_eq!(stats.iterations, 2);
    assert_eq!(stats.final_state, ProximityState::Far);
    assert_eq!(calls.get(), 2);
    assert_eq!(notes.0.get(), 1);
    assert_eq!(*indicator.0.borrow(), vec![false, false, false]);
    assert_eq!(clock.elapsed(), Duration::from_millis(100));
}
