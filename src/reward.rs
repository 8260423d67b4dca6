//! Reward shaping scored against a projected world.
//!
//! `reward = positive_maximum - negative_maximum`. Both halves treat the singleton
//! case (no other agents) as zero.

use crate::config::RewardConfig;

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale(v: [f64; 3], s: f64) -> [f64; 3] {
    [v[0] * s, v[1] * s, v[2] * s]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// "Pointing at someone": the maximum cosine-similarity between the vector from
/// self to each other agent and self's own velocity direction.
pub fn positive_maximum(self_position: [f64; 3], self_velocity: [f64; 3], others_positions: &[[f64; 3]]) -> f64 {
    if others_positions.is_empty() {
        return 0.0;
    }

    let self_speed = norm(self_velocity);
    if self_speed <= 0.0 {
        return 0.0;
    }
    let v_hat = scale(self_velocity, 1.0 / self_speed);

    others_positions
        .iter()
        .map(|&p_o| {
            let r = sub(p_o, self_position);
            let d = norm(r);
            if d <= 0.0 {
                return 1.0;
            }
            let r_hat = scale(r, 1.0 / d);
            dot(r_hat, v_hat)
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Penalty for sitting inside a predicted "threat disk" around another agent at any
/// of `config.threat_timesteps` ticks ahead.
pub fn negative_maximum(
    self_position: [f64; 3],
    others_positions: &[[f64; 3]],
    others_velocities: &[[f64; 3]],
    config: &RewardConfig,
) -> f64 {
    if others_positions.is_empty() {
        return 0.0;
    }
    debug_assert_eq!(others_positions.len(), others_velocities.len());

    let mut best = 0.0_f64;
    for (&p_o, &v_o) in others_positions.iter().zip(others_velocities.iter()) {
        let speed_o = norm(v_o);
        for &t in &config.threat_timesteps {
            let t = f64::from(t);
            let predicted_position = [
                p_o[0] + v_o[0] * t,
                p_o[1] + v_o[1] * t,
                p_o[2] + v_o[2] * t,
            ];
            let radius = speed_o * t;
            let distance = norm(sub(self_position, predicted_position));

            if distance < radius {
                let contribution = config.magnitude * config.discount.powf(distance);
                best = best.max(contribution);
            }
        }
    }
    best
}

/// Inert hard-deck penalty hook: callable, always returns 0.0 in this
/// implementation. Activating a real altitude-floor penalty is a documented
/// future extension, not wired into `reward()`.
pub fn hard_deck_penalty(_altitude: f64, _hard_deck: f64, _penalty: f64) -> f64 {
    0.0
}

/// Scores a hypothetical self state against the projected other-agent states.
pub fn reward(
    self_position: [f64; 3],
    self_velocity: [f64; 3],
    others_positions: &[[f64; 3]],
    others_velocities: &[[f64; 3]],
    config: &RewardConfig,
) -> f64 {
    positive_maximum(self_position, self_velocity, others_positions)
        - negative_maximum(self_position, others_positions, others_velocities, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_reward_is_zero() {
        let config = RewardConfig::default();
        let r = reward([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], &[], &[], &config);
        assert_eq!(r, 0.0);
    }

    #[test]
    fn pointing_directly_at_target_scores_one() {
        let self_position = [0.0, 0.0, 0.0];
        let self_velocity = [1.0, 0.0, 0.0];
        let others = [[10.0, 0.0, 0.0]];

        let score = positive_maximum(self_position, self_velocity, &others);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn pointing_away_scores_negative_one() {
        let self_position = [0.0, 0.0, 0.0];
        let self_velocity = [-1.0, 0.0, 0.0];
        let others = [[10.0, 0.0, 0.0]];

        let score = positive_maximum(self_position, self_velocity, &others);
        assert!((score + 1.0).abs() < 1e-9);
    }

    #[test]
    fn threat_disk_penalises_proximity() {
        let config = RewardConfig {
            magnitude: 300.0,
            discount: 0.99999,
            threat_timesteps: vec![0],
        };
        // Other agent stationary at origin; self sitting right on top of it at t=0
        // is within any positive radius... but radius at t=0 is zero, so only
        // genuinely coincident points trigger it. Use a moving other agent instead.
        let others_positions = [[0.0, 0.0, 0.0]];
        let others_velocities = [[10.0, 0.0, 0.0]];
        let config_t1 = RewardConfig {
            threat_timesteps: vec![1],
            ..config
        };

        // After 1 tick the other agent is predicted at (10,0,0) with radius 10.
        let penalty_inside = negative_maximum([8.0, 0.0, 0.0], &others_positions, &others_velocities, &config_t1);
        assert!(penalty_inside > 0.0);

        let penalty_outside = negative_maximum([100.0, 0.0, 0.0], &others_positions, &others_velocities, &config_t1);
        assert_eq!(penalty_outside, 0.0);
    }

    #[test]
    fn hard_deck_penalty_is_always_zero() {
        assert_eq!(hard_deck_penalty(-1000.0, 500.0, 1.0e6), 0.0);
        assert_eq!(hard_deck_penalty(50_000.0, 500.0, 1.0e6), 0.0);
    }
}
