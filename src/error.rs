//! Error taxonomy: configuration errors are recoverable at the CLI boundary;
//! everything else that would violate a data-model invariant is fatal and panics
//! with tick/agent context instead of being represented here (see simulation.rs).

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("agent count must be positive, got {0}")]
    NonPositiveAgentCount(i64),

    #[error("steps_per_second must be positive, got {0}")]
    NonPositiveStepsPerSecond(f64),

    #[error("action grid is empty: check thrust/alpha_rate/phi_rate ranges")]
    EmptyActionGrid,

    #[error("initial conditions length mismatch: expected {expected} agents, got {got}")]
    InitialConditionsMismatch { expected: usize, got: usize },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
