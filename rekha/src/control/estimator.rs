//! Weighted-average line position estimator
//!
//! Each sensor `i` carries the weight `i * heuristic_offset`. Readings above the
//! noise threshold contribute to a weighted mean:
//!
//! ```text
//! position = (v0 * 0 + v1 * 1000 + v2 * 2000 + ...) / (v0 + v1 + v2 + ...)
//! ```
//!
//! When no reading clears the on-track threshold the line is lost. The
//! estimator then snaps to whichever extreme the line was last seen nearer to,
//! so the controller steers hard back towards it. It never interpolates.

use crate::config::SensorConfig;
use crate::core::types::{LineEstimate, Position, SensorFrame};

/// Line position estimator with last-seen memory for lost-track recovery
#[derive(Debug, Clone)]
pub struct PositionEstimator {
    heuristic_offset: u64,
    noise_threshold: u16,
    on_track_value: u16,
    /// Highest reportable position, `(N-1) * heuristic_offset`
    extreme_right: Position,
    /// Signed on purpose: the lost-track test is a signed comparison
    last_position: i64,
}

impl PositionEstimator {
    /// Create an estimator for a validated sensor configuration
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            heuristic_offset: config.heuristic_offset as u64,
            noise_threshold: config.noise_threshold,
            on_track_value: config.on_track_value,
            extreme_right: config.max_position(),
            last_position: 0,
        }
    }

    /// Estimate the line position from one frame
    pub fn estimate(&mut self, frame: &SensorFrame) -> Position {
        self.observe(frame).position
    }

    /// Estimate the line position and report whether the line was seen
    pub fn observe(&mut self, frame: &SensorFrame) -> LineEstimate {
        let mut on_track = false;
        let mut sum_weighted: u64 = 0;
        let mut sum_values: u64 = 0;

        for (i, &value) in frame.values().iter().enumerate() {
            if value > self.on_track_value {
                on_track = true;
            }
            if value > self.noise_threshold {
                sum_weighted += value as u64 * (i as u64 * self.heuristic_offset);
                sum_values += value as u64;
            }
        }

        let average = if on_track {
            sum_weighted.checked_div(sum_values)
        } else {
            None
        };

        match average {
            Some(average) => {
                let position = average as Position;
                self.last_position = position as i64;
                LineEstimate {
                    position,
                    on_track: true,
                }
            }
            None => LineEstimate {
                position: self.lost_track_position(),
                on_track: false,
            },
        }
    }

    /// Extreme to report while the line is out of sight
    fn lost_track_position(&self) -> Position {
        if self.last_position < self.midpoint() as i64 {
            0
        } else {
            self.extreme_right
        }
    }

    /// Last on-track position (0 until the line has been seen)
    pub fn last_position(&self) -> i64 {
        self.last_position
    }

    /// Position of a centered line
    pub fn midpoint(&self) -> Position {
        self.extreme_right / 2
    }

    /// Position of a line under the last sensor
    pub fn extreme_right(&self) -> Position {
        self.extreme_right
    }
}
