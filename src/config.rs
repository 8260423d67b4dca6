//! Typed, serde-backed configuration threaded through construction as a single
//! immutable value.
//!
//! Loaded once at startup from `Config::default()`, optionally merged with a JSON
//! file, then overridden by CLI flags in `main.rs`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub agents: usize,
    pub steps_per_second: f64,
    pub width: f64,
    pub length: f64,
    pub height: f64,
    pub hard_deck: f64,
    pub g: f64,
    pub l: f64,
    pub penalty: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agents: 2,
            steps_per_second: 30.0,
            width: 10_000.0,
            length: 10_000.0,
            height: 13_000.0,
            hard_deck: 500.0,
            g: 9.81,
            l: 1.0,
            penalty: 1.0e6,
        }
    }
}

impl SimulationConfig {
    pub fn dt(&self) -> f64 {
        1.0 / self.steps_per_second
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents == 0 {
            return Err(ConfigError::NonPositiveAgentCount(0));
        }
        if self.steps_per_second <= 0.0 {
            return Err(ConfigError::NonPositiveStepsPerSecond(self.steps_per_second));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Magnitude of the threat-disk penalty.
    pub magnitude: f64,
    /// Per-tick discount applied to the threat penalty.
    pub discount: f64,
    /// Ticks-ahead at which the threat disk is evaluated.
    pub threat_timesteps: Vec<u32>,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            magnitude: 300.0,
            discount: 0.99999,
            threat_timesteps: vec![0, 1, 5, 10],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Half-open thrust grid: (start, stop, step).
    pub thrust_range: (f64, f64, f64),
    /// Half-open attack-angle-rate grid: (start, stop, step).
    pub alpha_rate_range: (f64, f64, f64),
    /// Half-open roll-angle-rate grid: (start, stop, step).
    pub phi_rate_range: (f64, f64, f64),
    /// Planning horizon in ticks.
    pub forward_projection_steps: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            thrust_range: (0.0, 7.0, 1.0),
            alpha_rate_range: (-0.5, 0.5, 0.1),
            phi_rate_range: (-1.0, 1.0, 0.2),
            forward_projection_steps: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub capture_radius: f64,
    /// Lag window for the capture point.
    pub capture_point_steps: usize,
    /// Consecutive ticks the predicate must hold (default 30).
    pub capture_hold_ticks: u32,
    /// Angle threshold in degrees between velocity headings (default 60).
    pub capture_angle_deg: f64,
}

impl CaptureConfig {
    pub fn capture_radius_squared(&self) -> f64 {
        self.capture_radius * self.capture_radius
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capture_radius: 100.0,
            capture_point_steps: 10,
            capture_hold_ticks: 30,
            capture_angle_deg: 60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_directory: String,
    pub plot_filename: String,
    pub animation_filename: String,
    pub dashboard_enabled: bool,
    pub output_enabled: bool,
    pub visualiser_enabled: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_directory: "runs".to_string(),
            plot_filename: "trajectories.png".to_string(),
            animation_filename: "animation.gif".to_string(),
            dashboard_enabled: true,
            output_enabled: true,
            visualiser_enabled: true,
        }
    }
}

/// Per-agent starting state. Defaults to a two-agent head-on scenario, used
/// when no `InitialConditions` are supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialConditions {
    pub positions: Vec<[f64; 3]>,
    pub speeds: Vec<f64>,
    pub attack_angles: Vec<f64>,
    pub flight_path_angles: Vec<f64>,
    pub roll_angles: Vec<f64>,
    pub azimuth_angles: Vec<f64>,
}

impl InitialConditions {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn validate(&self, agents: usize) -> Result<(), ConfigError> {
        if self.len() != agents {
            return Err(ConfigError::InitialConditionsMismatch {
                expected: agents,
                got: self.len(),
            });
        }
        for field_len in [
            self.speeds.len(),
            self.attack_angles.len(),
            self.flight_path_angles.len(),
            self.roll_angles.len(),
            self.azimuth_angles.len(),
        ] {
            if field_len != agents {
                return Err(ConfigError::InitialConditionsMismatch {
                    expected: agents,
                    got: field_len,
                });
            }
        }
        Ok(())
    }
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            positions: vec![[5000.0, 4000.0, 6500.0], [5000.0, 6000.0, 6500.0]],
            speeds: vec![250.0, 250.0],
            attack_angles: vec![0.0, 0.0],
            flight_path_angles: vec![0.0, 0.0],
            roll_angles: vec![0.0, 0.0],
            azimuth_angles: vec![std::f64::consts::FRAC_PI_2, -std::f64::consts::FRAC_PI_2],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub reward: RewardConfig,
    pub planner: PlannerConfig,
    pub capture: CaptureConfig,
    pub output: OutputConfig,
    pub initial_conditions: Option<InitialConditions>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        if let Some(ic) = &self.initial_conditions {
            ic.validate(self.simulation.agents)?;
        }
        Ok(())
    }

    pub fn initial_conditions(&self) -> InitialConditions {
        self.initial_conditions.clone().unwrap_or_default()
    }
}
