//! Pure, vectorised point-mass flight kinematics.
//!
//! Both functions here operate on struct-of-arrays state and never mutate their
//! inputs — callers that need a hypothetical projection clone the rows they care
//! about and call `forward_project` on the clone.

/// Numerical guard used for the flight-path-angle clamp and the cos(γ) floor.
pub const EPSILON: f64 = 1e-3;

/// Gravity coefficient `G` and lift baseline `L` shared by every agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicsConstants {
    pub g: f64,
    pub l: f64,
}

/// Agent kinematic state, struct-of-arrays over N agents.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicState {
    pub positions: Vec<[f64; 3]>,
    pub speeds: Vec<f64>,
    pub attack_angles: Vec<f64>,
    pub flight_path_angles: Vec<f64>,
    pub roll_angles: Vec<f64>,
    pub azimuth_angles: Vec<f64>,
}

impl KinematicState {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Builds a single-agent state by cloning row `i` out of `self`, used by the
    /// planner to forward-project one agent in isolation.
    pub fn row(&self, i: usize) -> KinematicState {
        KinematicState {
            positions: vec![self.positions[i]],
            speeds: vec![self.speeds[i]],
            attack_angles: vec![self.attack_angles[i]],
            flight_path_angles: vec![self.flight_path_angles[i]],
            roll_angles: vec![self.roll_angles[i]],
            azimuth_angles: vec![self.azimuth_angles[i]],
        }
    }

    /// Returns a copy of `self` with row `index` removed, used to build the "other
    /// agents" projected baseline the planner scores against.
    pub fn without_row(&self, index: usize) -> KinematicState {
        let mut out = self.clone();
        out.positions.remove(index);
        out.speeds.remove(index);
        out.attack_angles.remove(index);
        out.flight_path_angles.remove(index);
        out.roll_angles.remove(index);
        out.azimuth_angles.remove(index);
        out
    }
}

/// Control inputs chosen by the planner and committed each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Controls {
    pub thrust: f64,
    pub attack_angle_rate: f64,
    pub roll_angle_rate: f64,
}

impl Controls {
    pub const ZERO: Controls = Controls {
        thrust: 0.0,
        attack_angle_rate: 0.0,
        roll_angle_rate: 0.0,
    };
}

/// Per-agent controls, one per row of a `KinematicState`.
#[derive(Debug, Clone)]
pub struct ControlsArray {
    pub thrusts: Vec<f64>,
    pub attack_angle_rates: Vec<f64>,
    pub roll_angle_rates: Vec<f64>,
}

impl ControlsArray {
    pub fn zeros(n: usize) -> Self {
        Self {
            thrusts: vec![0.0; n],
            attack_angle_rates: vec![0.0; n],
            roll_angle_rates: vec![0.0; n],
        }
    }

    pub fn splat(n: usize, controls: Controls) -> Self {
        Self {
            thrusts: vec![controls.thrust; n],
            attack_angle_rates: vec![controls.attack_angle_rate; n],
            roll_angle_rates: vec![controls.roll_angle_rate; n],
        }
    }

    pub fn len(&self) -> usize {
        self.thrusts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thrusts.is_empty()
    }
}

fn velocity_vector(speed: f64, flight_path_angle: f64, azimuth_angle: f64) -> [f64; 3] {
    let (sin_gamma, cos_gamma) = flight_path_angle.sin_cos();
    let (sin_psi, cos_psi) = azimuth_angle.sin_cos();
    [
        speed * cos_gamma * cos_psi,
        speed * cos_gamma * sin_psi,
        speed * sin_gamma,
    ]
}

const FLIGHT_PATH_ANGLE_LIMIT: f64 = std::f64::consts::FRAC_PI_2 - EPSILON;

/// One forward-Euler step for N agents. Returns the advanced state and the
/// resolved velocity vectors for downstream use (e.g. the reward term, which
/// needs the other agents' velocity).
pub fn step(
    state: &KinematicState,
    controls: &ControlsArray,
    constants: KinematicsConstants,
    dt: f64,
) -> (KinematicState, Vec<[f64; 3]>) {
    let n = state.len();
    debug_assert_eq!(controls.len(), n);

    let mut positions = Vec::with_capacity(n);
    let mut speeds = Vec::with_capacity(n);
    let mut attack_angles = Vec::with_capacity(n);
    let mut flight_path_angles = Vec::with_capacity(n);
    let mut roll_angles = Vec::with_capacity(n);
    let mut azimuth_angles = Vec::with_capacity(n);
    let mut velocity_vectors = Vec::with_capacity(n);

    for i in 0..n {
        let thrust = controls.thrusts[i];
        let alpha_dot = controls.attack_angle_rates[i];
        let phi_dot = controls.roll_angle_rates[i];

        let alpha = state.attack_angles[i] + alpha_dot * dt;
        let phi = state.roll_angles[i] + phi_dot * dt;

        let load_factor = thrust * alpha.sin() + constants.l;

        let v_dot = constants.g * (thrust * alpha.cos() - state.flight_path_angles[i].sin());
        let v = state.speeds[i] + v_dot * dt;

        let gamma_dot =
            (constants.g / v) * (load_factor * phi.cos() - state.flight_path_angles[i].cos());
        let gamma =
            (state.flight_path_angles[i] + gamma_dot * dt).clamp(-FLIGHT_PATH_ANGLE_LIMIT, FLIGHT_PATH_ANGLE_LIMIT);

        let psi_dot =
            constants.g * (load_factor * phi.sin()) / (v * gamma.cos().max(EPSILON));
        let psi = state.azimuth_angles[i] + psi_dot * dt;

        let velocity = velocity_vector(v, gamma, psi);
        let position = [
            state.positions[i][0] + velocity[0] * dt,
            state.positions[i][1] + velocity[1] * dt,
            state.positions[i][2] + velocity[2] * dt,
        ];

        positions.push(position);
        speeds.push(v);
        attack_angles.push(alpha);
        flight_path_angles.push(gamma);
        roll_angles.push(phi);
        azimuth_angles.push(psi);
        velocity_vectors.push(velocity);
    }

    (
        KinematicState {
            positions,
            speeds,
            attack_angles,
            flight_path_angles,
            roll_angles,
            azimuth_angles,
        },
        velocity_vectors,
    )
}

/// Applies `step` `steps` times holding `controls` constant. Does not alias the
/// caller's arrays: every intermediate state is a freshly allocated
/// `KinematicState`.
pub fn forward_project(
    state: &KinematicState,
    controls: &ControlsArray,
    constants: KinematicsConstants,
    dt: f64,
    steps: usize,
) -> (KinematicState, Vec<[f64; 3]>) {
    let mut current = state.clone();
    let mut velocities = vec![[0.0; 3]; state.len()];
    for _ in 0..steps {
        let (next, v) = step(&current, controls, constants, dt);
        current = next;
        velocities = v;
    }
    (current, velocities)
}
