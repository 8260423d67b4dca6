//! Capture detector: pairwise geometric + angular predicate with a debounce
//! counter, surfaced as "agent X captured" events.

use std::collections::VecDeque;

use crate::config::CaptureConfig;

/// No capture this tick.
pub const NO_CAPTURE: i64 = -1;

/// Bounded FIFO of recent positions, one per agent.
#[derive(Debug, Clone)]
pub struct History {
    buffers: Vec<VecDeque<[f64; 3]>>,
    capacity: usize,
}

impl History {
    pub fn new(n: usize, capture_point_steps: usize) -> Self {
        Self {
            buffers: (0..n).map(|_| VecDeque::new()).collect(),
            capacity: capture_point_steps + 1,
        }
    }

    /// Pushes `position` into agent `i`'s history, dropping the oldest entry on
    /// overflow.
    pub fn push(&mut self, i: usize, position: [f64; 3]) {
        let buffer = &mut self.buffers[i];
        buffer.push_back(position);
        if buffer.len() > self.capacity {
            buffer.pop_front();
        }
    }

    /// The capture point for agent `i`: the oldest position once the window is
    /// full, else the current position.
    pub fn capture_point(&self, i: usize) -> [f64; 3] {
        let buffer = &self.buffers[i];
        if buffer.len() == self.capacity {
            buffer[0]
        } else {
            *buffer.back().expect("history must have at least one entry after push")
        }
    }
}

/// Debounce counters for the capture predicate, indexed `[evader][pursuer]`.
#[derive(Debug, Clone)]
pub struct CaptureDetector {
    buffer: Vec<Vec<u32>>,
    config: CaptureConfig,
}

impl CaptureDetector {
    pub fn new(n: usize, config: CaptureConfig) -> Self {
        Self {
            buffer: vec![vec![0; n]; n],
            config,
        }
    }

    /// Evaluates the pairwise predicate for every ordered (pursuer, evader) pair
    /// with pursuer != evader, updates the debounce buffer, and returns the first
    /// evader whose buffer reaches `capture_hold_ticks` consecutive ticks, or
    /// `NO_CAPTURE`.
    pub fn check(
        &mut self,
        positions: &[[f64; 3]],
        flight_path_angles: &[f64],
        azimuth_angles: &[f64],
        history: &History,
    ) -> i64 {
        let n = positions.len();
        let angle_threshold = self.config.capture_angle_deg.to_radians().cos();
        let radius_sq = self.config.capture_radius_squared();

        for pursuer in 0..n {
            for evader in 0..n {
                if pursuer == evader {
                    continue;
                }

                let capture_point = history.capture_point(evader);
                let diff = [
                    positions[pursuer][0] - capture_point[0],
                    positions[pursuer][1] - capture_point[1],
                    positions[pursuer][2] - capture_point[2],
                ];
                let distance_sq = diff[0] * diff[0] + diff[1] * diff[1] + diff[2] * diff[2];
                let distance_check = distance_sq < radius_sq;

                let cos_angle = (flight_path_angles[pursuer].sin() * flight_path_angles[evader].sin()
                    + flight_path_angles[pursuer].cos()
                        * flight_path_angles[evader].cos()
                        * (azimuth_angles[pursuer] - azimuth_angles[evader]).cos())
                .clamp(-1.0, 1.0);
                // angle <= threshold_deg  <=>  cos(angle) >= cos(threshold_deg)
                let angle_check = cos_angle >= angle_threshold;

                if distance_check && angle_check {
                    self.buffer[evader][pursuer] += 1;
                } else {
                    self.buffer[evader][pursuer] = 0;
                }

                if self.buffer[evader][pursuer] >= self.config.capture_hold_ticks {
                    return evader as i64;
                }
            }
        }

        NO_CAPTURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector_with_hold(hold: u32) -> CaptureDetector {
        CaptureDetector::new(
            2,
            CaptureConfig {
                capture_radius: 10.0,
                capture_point_steps: 0,
                capture_hold_ticks: hold,
                capture_angle_deg: 60.0,
            },
        )
    }

    /// The predicate must hold for exactly `capture_hold_ticks` consecutive
    /// ticks before capture is emitted; a single broken tick resets the buffer.
    #[test]
    fn capture_requires_consecutive_holding_ticks() {
        let mut detector = detector_with_hold(30);
        let mut history = History::new(2, 0);

        let close_positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let far_positions = [[0.0, 0.0, 0.0], [1000.0, 0.0, 0.0]];
        let flight_path_angles = [0.0, 0.0];
        let azimuth_angles = [0.0, 0.0];

        for _ in 0..29 {
            history.push(0, close_positions[0]);
            history.push(1, close_positions[1]);
            let verdict = detector.check(&close_positions, &flight_path_angles, &azimuth_angles, &history);
            assert_eq!(verdict, NO_CAPTURE);
        }
        assert_eq!(detector.buffer[1][0], 29);

        // Break the predicate once.
        history.push(0, far_positions[0]);
        history.push(1, far_positions[1]);
        let verdict = detector.check(&far_positions, &flight_path_angles, &azimuth_angles, &history);
        assert_eq!(verdict, NO_CAPTURE);
        assert_eq!(detector.buffer[1][0], 0);
    }

    #[test]
    fn capture_emits_on_the_thirtieth_consecutive_tick() {
        let mut detector = detector_with_hold(30);
        let mut history = History::new(2, 0);

        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let flight_path_angles = [0.0, 0.0];
        let azimuth_angles = [0.0, 0.0];

        let mut verdict = NO_CAPTURE;
        for _ in 0..30 {
            history.push(0, positions[0]);
            history.push(1, positions[1]);
            verdict = detector.check(&positions, &flight_path_angles, &azimuth_angles, &history);
        }
        assert_eq!(verdict, 1);
    }

    #[test]
    fn buffer_resets_whenever_predicate_is_false() {
        let mut detector = detector_with_hold(5);
        let mut history = History::new(2, 0);
        let close = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let flight_path_angles = [0.0, 0.0];
        let azimuth_angles = [0.0, 0.0];

        history.push(0, close[0]);
        history.push(1, close[1]);
        detector.check(&close, &flight_path_angles, &azimuth_angles, &history);
        assert_eq!(detector.buffer[1][0], 1);

        // Opposing headings break the angle predicate.
        let opposed_azimuth = [0.0, std::f64::consts::PI];
        history.push(0, close[0]);
        history.push(1, close[1]);
        detector.check(&close, &flight_path_angles, &opposed_azimuth, &history);
        assert_eq!(detector.buffer[1][0], 0);
    }

    #[test]
    fn history_lags_by_configured_steps() {
        let mut history = History::new(1, 2);
        history.push(0, [0.0, 0.0, 0.0]);
        assert_eq!(history.capture_point(0), [0.0, 0.0, 0.0]);
        history.push(0, [1.0, 0.0, 0.0]);
        assert_eq!(history.capture_point(0), [1.0, 0.0, 0.0]);
        history.push(0, [2.0, 0.0, 0.0]);
        // window now full (capacity 3): head is the oldest entry
        assert_eq!(history.capture_point(0), [0.0, 0.0, 0.0]);
        history.push(0, [3.0, 0.0, 0.0]);
        assert_eq!(history.capture_point(0), [1.0, 0.0, 0.0]);
    }
}
