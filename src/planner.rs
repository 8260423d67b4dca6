//! Per-agent one-step-lookahead planner: enumerate the action grid, forward-project
//! the candidate, score it with `reward`, return the maximiser.

use crate::config::{PlannerConfig, RewardConfig};
use crate::kinematics::{self, Controls, ControlsArray, KinematicState, KinematicsConstants};
use crate::reward;

/// A single point in the discretised action grid.
pub type Action = Controls;

/// Half-open range `[start, stop)` stepped by `step`, materialised into a `Vec`.
fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    debug_assert!(step > 0.0, "arange step must be positive");
    let mut out = Vec::new();
    let mut value = start;
    // guard against float accumulation drift with a small epsilon, matching
    // numpy's half-open [start, stop) semantics closely enough for a fixed grid.
    while value < stop - 1e-9 {
        out.push(value);
        value += step;
    }
    out
}

/// Pre-materialises the Cartesian-product action grid once. Iteration order is
/// thrust-major, then attack-angle-rate, then roll-angle-rate — this fixed order
/// is what makes the planner's tie-break deterministic.
pub fn build_action_grid(config: &PlannerConfig) -> Vec<Action> {
    let (t0, t1, ts) = config.thrust_range;
    let (a0, a1, as_) = config.alpha_rate_range;
    let (p0, p1, ps) = config.phi_rate_range;

    let thrusts = arange(t0, t1, ts);
    let alpha_rates = arange(a0, a1, as_);
    let phi_rates = arange(p0, p1, ps);

    let mut grid = Vec::with_capacity(thrusts.len() * alpha_rates.len() * phi_rates.len());
    for &thrust in &thrusts {
        for &attack_angle_rate in &alpha_rates {
            for &roll_angle_rate in &phi_rates {
                grid.push(Action {
                    thrust,
                    attack_angle_rate,
                    roll_angle_rate,
                });
            }
        }
    }
    grid
}

/// Everything the planner needs to evaluate one agent's action grid: the agent's
/// current row (to forward-project), the other agents' already-projected baseline
/// (shared across all agents this tick), the kinematics constants, and the
/// scoring config.
pub struct Planner<'a> {
    pub agent_state: KinematicState,
    pub others_positions: Vec<[f64; 3]>,
    pub others_velocities: Vec<[f64; 3]>,
    pub constants: KinematicsConstants,
    pub dt: f64,
    pub horizon: usize,
    pub action_grid: &'a [Action],
    pub reward_config: &'a RewardConfig,
}

impl<'a> Planner<'a> {
    /// Builds a planner for agent `i` out of the live simulation state and the
    /// shared zero-control baseline projection.
    #[allow(clippy::too_many_arguments)]
    pub fn for_agent(
        i: usize,
        live_state: &KinematicState,
        projected_positions: &[[f64; 3]],
        projected_velocities: &[[f64; 3]],
        constants: KinematicsConstants,
        dt: f64,
        horizon: usize,
        action_grid: &'a [Action],
        reward_config: &'a RewardConfig,
    ) -> Self {
        let mut others_positions = projected_positions.to_vec();
        let mut others_velocities = projected_velocities.to_vec();
        others_positions.remove(i);
        others_velocities.remove(i);

        Planner {
            agent_state: live_state.row(i),
            others_positions,
            others_velocities,
            constants,
            dt,
            horizon,
            action_grid,
            reward_config,
        }
    }

    /// Enumerates the action grid in its fixed order, forward-projects this agent
    /// alone under each candidate, scores the result, and returns the first action
    /// to achieve the maximum reward.
    pub fn plan(&self) -> Action {
        let mut best_action = self.action_grid[0];
        let mut best_reward = f64::NEG_INFINITY;

        for &action in self.action_grid {
            let controls = ControlsArray::splat(1, action);
            let (projected, velocities) = kinematics::forward_project(
                &self.agent_state,
                &controls,
                self.constants,
                self.dt,
                self.horizon,
            );

            let self_position = projected.positions[0];
            let self_velocity = velocities[0];

            let score = reward::reward(
                self_position,
                self_velocity,
                &self.others_positions,
                &self.others_velocities,
                self.reward_config,
            );

            if score > best_reward {
                best_reward = score;
                best_action = action;
            }
        }

        best_action
    }
}
