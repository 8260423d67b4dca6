//! The simulation loop: each tick computes a shared baseline projection, lets
//! every agent plan against it, commits all chosen controls atomically, advances
//! the real state, and checks for capture.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::capture::{CaptureDetector, History, NO_CAPTURE};
use crate::config::Config;
use crate::error::ConfigError;
use crate::kinematics::{self, ControlsArray, KinematicState, KinematicsConstants};
use crate::observer::{ObserverRegistry, RunOutcome, Snapshot};
use crate::planner::{self, Planner};

pub struct Simulation {
    config: Config,
    state: KinematicState,
    constants: KinematicsConstants,
    dt: f64,
    action_grid: Vec<planner::Action>,
    history: History,
    detector: CaptureDetector,
    tick: u64,
}

impl Simulation {
    /// Validates the config and builds the initial state.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let action_grid = planner::build_action_grid(&config.planner);
        if action_grid.is_empty() {
            return Err(ConfigError::EmptyActionGrid);
        }

        let ic = config.initial_conditions();
        let n = ic.len();
        let state = KinematicState {
            positions: ic.positions.clone(),
            speeds: ic.speeds.clone(),
            attack_angles: ic.attack_angles.clone(),
            flight_path_angles: ic.flight_path_angles.clone(),
            roll_angles: ic.roll_angles.clone(),
            azimuth_angles: ic.azimuth_angles.clone(),
        };

        let constants = KinematicsConstants {
            g: config.simulation.g,
            l: config.simulation.l,
        };
        let dt = config.simulation.dt();

        let mut history = History::new(n, config.capture.capture_point_steps);
        for i in 0..n {
            history.push(i, state.positions[i]);
        }
        let detector = CaptureDetector::new(n, config.capture.clone());

        Ok(Self {
            config,
            state,
            constants,
            dt,
            action_grid,
            history,
            detector,
            tick: 0,
        })
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn agents(&self) -> usize {
        self.state.len()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            positions: self.state.positions.clone(),
            speeds: self.state.speeds.clone(),
            attack_angles: self.state.attack_angles.clone(),
            flight_path_angles: self.state.flight_path_angles.clone(),
            roll_angles: self.state.roll_angles.clone(),
            azimuth_angles: self.state.azimuth_angles.clone(),
        }
    }

    /// Advances the simulation by one tick: baseline projection, per-agent
    /// planning, atomic commit, capture check. Returns the captured evader's
    /// index, if any.
    fn advance(&mut self) -> Option<usize> {
        let n = self.state.len();
        let horizon = self.config.planner.forward_projection_steps;

        let baseline_controls = ControlsArray::zeros(n);
        let (projected, projected_velocities) =
            kinematics::forward_project(&self.state, &baseline_controls, self.constants, self.dt, horizon);

        let plan_one = |i: usize| {
            Planner::for_agent(
                i,
                &self.state,
                &projected.positions,
                &projected_velocities,
                self.constants,
                self.dt,
                horizon,
                &self.action_grid,
                &self.config.reward,
            )
            .plan()
        };

        #[cfg(feature = "parallel")]
        let actions: Vec<_> = {
            use rayon::prelude::*;
            (0..n).into_par_iter().map(plan_one).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let actions: Vec<_> = (0..n).map(plan_one).collect();

        // Single-writer barrier: every agent planned against the same baseline
        // snapshot above, so committing the chosen actions here is race-free
        // regardless of whether the loop above ran in parallel.
        let mut chosen = ControlsArray::zeros(n);
        for (i, action) in actions.into_iter().enumerate() {
            chosen.thrusts[i] = action.thrust;
            chosen.attack_angle_rates[i] = action.attack_angle_rate;
            chosen.roll_angle_rates[i] = action.roll_angle_rate;
        }

        let (next_state, _) = kinematics::step(&self.state, &chosen, self.constants, self.dt);
        self.state = next_state;
        self.tick += 1;

        for i in 0..n {
            self.history.push(i, self.state.positions[i]);
        }

        let captured = self.detector.check(
            &self.state.positions,
            &self.state.flight_path_angles,
            &self.state.azimuth_angles,
            &self.history,
        );
        if captured == NO_CAPTURE {
            None
        } else {
            Some(captured as usize)
        }
    }

    /// Drives ticks until capture, `max_ticks` is reached, or `interrupted` is
    /// observed set, fanning each tick's snapshot out to `observers`.
    pub fn run(
        &mut self,
        observers: &mut ObserverRegistry,
        max_ticks: Option<u64>,
        interrupted: &AtomicBool,
    ) -> RunOutcome {
        observers.dispatch_tick(&self.snapshot());

        loop {
            if interrupted.load(Ordering::Relaxed) {
                let outcome = RunOutcome::Interrupted;
                observers.dispatch_finish(outcome);
                return outcome;
            }

            let captured = self.advance();
            observers.dispatch_tick(&self.snapshot());
            tracing::trace!(tick = self.tick, "tick complete");

            if let Some(evader) = captured {
                let outcome = RunOutcome::Captured(evader);
                tracing::info!(tick = self.tick, evader, "capture");
                observers.dispatch_finish(outcome);
                return outcome;
            }

            if let Some(max) = max_ticks {
                if self.tick >= max {
                    let outcome = RunOutcome::TickLimitReached;
                    observers.dispatch_finish(outcome);
                    return outcome;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::Observer;

    struct RecordingObserver {
        snapshots: Vec<Snapshot>,
        finished: Option<RunOutcome>,
    }

    impl Observer for RecordingObserver {
        fn on_tick(&mut self, snapshot: &Snapshot) {
            self.snapshots.push(snapshot.clone());
        }

        fn on_finish(&mut self, outcome: RunOutcome) {
            self.finished = Some(outcome);
        }
    }

    /// The default head-on two-agent scenario ends in capture within a modest
    /// tick budget.
    #[test]
    fn default_scenario_ends_in_capture() {
        let mut simulation = Simulation::new(Config::default()).expect("valid default config");
        let mut registry = ObserverRegistry::new();
        let interrupted = AtomicBool::new(false);

        let outcome = simulation.run(&mut registry, Some(5_000), &interrupted);
        assert!(matches!(outcome, RunOutcome::Captured(_)));
    }

    /// Two simulations built from identical configs produce bitwise-identical
    /// trajectories (no RNG, no wall-clock dependence in the hot loop).
    #[test]
    fn identical_configs_are_deterministic() {
        let config = Config::default();
        let mut a = Simulation::new(config.clone()).unwrap();
        let mut b = Simulation::new(config).unwrap();
        let interrupted = AtomicBool::new(false);

        let mut registry_a = ObserverRegistry::new();
        let mut registry_b = ObserverRegistry::new();

        a.run(&mut registry_a, Some(200), &interrupted);
        b.run(&mut registry_b, Some(200), &interrupted);

        assert_eq!(a.state, b.state);
    }

    /// Observer panics never stop the simulation from reaching its outcome and
    /// every well-behaved observer still gets the final `on_finish` call.
    #[test]
    fn run_finishes_and_notifies_observers_despite_a_panicking_one() {
        struct AlwaysPanics;
        impl Observer for AlwaysPanics {
            fn on_tick(&mut self, _snapshot: &Snapshot) {
                panic!("boom");
            }
        }

        let mut simulation = Simulation::new(Config::default()).unwrap();
        let mut registry = ObserverRegistry::new();
        registry.register(Box::new(AlwaysPanics));
        registry.register(Box::new(RecordingObserver {
            snapshots: Vec::new(),
            finished: None,
        }));
        let interrupted = AtomicBool::new(false);

        let outcome = simulation.run(&mut registry, Some(5_000), &interrupted);
        assert!(matches!(outcome, RunOutcome::Captured(_)));
    }

    #[test]
    fn interrupt_flag_stops_the_loop_immediately() {
        let mut simulation = Simulation::new(Config::default()).unwrap();
        let mut registry = ObserverRegistry::new();
        let interrupted = AtomicBool::new(true);

        let outcome = simulation.run(&mut registry, Some(5_000), &interrupted);
        assert_eq!(outcome, RunOutcome::Interrupted);
        assert_eq!(simulation.tick(), 0);
    }

    #[test]
    fn rejects_zero_agent_config() {
        let mut config = Config::default();
        config.simulation.agents = 0;
        config.initial_conditions = Some(crate::config::InitialConditions {
            positions: vec![],
            speeds: vec![],
            attack_angles: vec![],
            flight_path_angles: vec![],
            roll_angles: vec![],
            azimuth_angles: vec![],
        });
        let result = Simulation::new(config);
        assert!(matches!(result, Err(ConfigError::NonPositiveAgentCount(0))));
    }
}
