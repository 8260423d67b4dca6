//! Observer fan-out: a tick produces one immutable `Snapshot` broadcast to every
//! registered observer. A panicking observer is isolated so it never halts the
//! simulation for the others.

mod animation;
mod channel;
mod dashboard;
mod plot;

pub use animation::AnimationObserver;
pub use channel::ChannelObserver;
pub use dashboard::DashboardObserver;
pub use plot::PlotObserver;

use std::panic::{self, AssertUnwindSafe};

/// Immutable view of one tick, handed to every observer.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tick: u64,
    pub positions: Vec<[f64; 3]>,
    pub speeds: Vec<f64>,
    pub attack_angles: Vec<f64>,
    pub flight_path_angles: Vec<f64>,
    pub roll_angles: Vec<f64>,
    pub azimuth_angles: Vec<f64>,
}

/// Terminal state of a run, handed to observers once after the final tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Captured(usize),
    TickLimitReached,
    Interrupted,
}

/// Anything that wants to watch the simulation run. `on_tick` is called once per
/// tick in registration order; `on_finish` once at the end of `run`.
pub trait Observer {
    fn on_tick(&mut self, snapshot: &Snapshot);

    fn on_finish(&mut self, _outcome: RunOutcome) {}
}

/// Holds the registered observers and fans a snapshot out to each of them,
/// catching panics so that one broken observer (a full channel, a bad file path)
/// never stops the simulation loop for its siblings. An observer that panics is
/// dropped from the registry and receives no further calls.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Vec<Box<dyn Observer>>,
    poisoned: Vec<bool>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
            poisoned: Vec::new(),
        }
    }

    pub fn register(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
        self.poisoned.push(false);
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn dispatch_tick(&mut self, snapshot: &Snapshot) {
        for (observer, poisoned) in self.observers.iter_mut().zip(self.poisoned.iter_mut()) {
            if *poisoned {
                continue;
            }
            let observer = AssertUnwindSafe(observer.as_mut());
            if let Err(panic) = panic::catch_unwind(move || observer.0.on_tick(snapshot)) {
                log_observer_panic("on_tick", snapshot.tick, panic);
                *poisoned = true;
            }
        }
    }

    pub fn dispatch_finish(&mut self, outcome: RunOutcome) {
        for (observer, poisoned) in self.observers.iter_mut().zip(self.poisoned.iter_mut()) {
            if *poisoned {
                continue;
            }
            let observer = AssertUnwindSafe(observer.as_mut());
            if let Err(panic) = panic::catch_unwind(move || observer.0.on_finish(outcome)) {
                log_observer_panic("on_finish", 0, panic);
                *poisoned = true;
            }
        }
    }
}

fn log_observer_panic(hook: &str, tick: u64, panic: Box<dyn std::any::Any + Send>) {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<non-string panic payload>".to_string());
    tracing::error!(hook, tick, message, "observer panicked, continuing without it this tick");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct AlwaysPanics;
    impl Observer for AlwaysPanics {
        fn on_tick(&mut self, _snapshot: &Snapshot) {
            panic!("boom");
        }
    }

    struct CountsCalls {
        calls: Rc<RefCell<u32>>,
    }
    impl Observer for CountsCalls {
        fn on_tick(&mut self, _snapshot: &Snapshot) {
            *self.calls.borrow_mut() += 1;
            panic!("boom");
        }
    }

    struct CountsTicks {
        ticks: Rc<RefCell<Vec<u64>>>,
    }
    impl Observer for CountsTicks {
        fn on_tick(&mut self, snapshot: &Snapshot) {
            self.ticks.borrow_mut().push(snapshot.tick);
        }
    }

    fn snapshot(tick: u64) -> Snapshot {
        Snapshot {
            tick,
            positions: vec![[0.0, 0.0, 0.0]],
            speeds: vec![0.0],
            attack_angles: vec![0.0],
            flight_path_angles: vec![0.0],
            roll_angles: vec![0.0],
            azimuth_angles: vec![0.0],
        }
    }

    /// A panicking observer must not prevent a later-registered observer from
    /// receiving every snapshot.
    #[test]
    fn a_panicking_observer_does_not_block_its_siblings() {
        let ticks = Rc::new(RefCell::new(Vec::new()));

        let mut registry = ObserverRegistry::new();
        registry.register(Box::new(AlwaysPanics));
        registry.register(Box::new(CountsTicks { ticks: ticks.clone() }));

        for tick in 0..5 {
            registry.dispatch_tick(&snapshot(tick));
        }

        assert_eq!(*ticks.borrow(), vec![0, 1, 2, 3, 4]);
    }

    /// Once an observer panics it is dropped from the registry: it is invoked
    /// exactly once, never again on later ticks.
    #[test]
    fn a_panicking_observer_is_not_invoked_again_after_its_first_panic() {
        let calls = Rc::new(RefCell::new(0));

        let mut registry = ObserverRegistry::new();
        registry.register(Box::new(CountsCalls { calls: calls.clone() }));

        for tick in 0..5 {
            registry.dispatch_tick(&snapshot(tick));
        }

        assert_eq!(*calls.borrow(), 1);
    }
}
