//! Differential drive kinematics relative to a line
//!
//! The pose is tracked in the line's own frame, so a curved track only shows
//! up as a steady rotation of the line under the robot:
//!
//! ```text
//! v     = (v_left + v_right) / 2
//! ω     = (v_left - v_right) / wheel_base        (positive = turning right)
//! θ'    = θ + (ω - v·κ)·dt                       (κ = track curvature)
//! d'    = d - v·sin(θ')·dt                       (d = line offset at the axle)
//! ```

use super::config::SimulationConfig;
use crate::core::types::MotorCommand;

/// Robot pose relative to the line
pub struct TrackPhysics {
    /// Line offset from the wheel axle center (m, positive = line to the right)
    lateral: f32,
    /// Heading relative to the line (rad, positive = pointing right)
    heading: f32,
    /// Distance travelled along the track (m)
    distance: f32,
    curvature: f32,
    speed_per_unit: f32,
    wheel_base: f32,
}

impl TrackPhysics {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            lateral: config.start_offset,
            heading: config.start_heading,
            distance: 0.0,
            curvature: config.curvature,
            speed_per_unit: config.speed_per_unit,
            wheel_base: config.wheel_base,
        }
    }

    #[inline]
    pub fn lateral(&self) -> f32 {
        self.lateral
    }

    #[inline]
    pub fn heading(&self) -> f32 {
        self.heading
    }

    #[inline]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Line offset seen at a point `lookahead` meters ahead of the axle
    #[inline]
    pub fn line_offset_at(&self, lookahead: f32) -> f32 {
        self.lateral - lookahead * self.heading.sin()
    }

    /// Calculate individual wheel velocities (m/s) from a motor command
    pub fn wheel_velocities(&self, command: MotorCommand) -> (f32, f32) {
        (
            command.left as f32 * self.speed_per_unit,
            command.right as f32 * self.speed_per_unit,
        )
    }

    /// Advance the pose by `dt` seconds under a motor command
    pub fn update(&mut self, command: MotorCommand, dt: f32) {
        let (left_vel, right_vel) = self.wheel_velocities(command);
        let linear_vel = (left_vel + right_vel) / 2.0;
        let angular_vel = (left_vel - right_vel) / self.wheel_base;

        self.heading += (angular_vel - linear_vel * self.curvature) * dt;
        self.lateral -= linear_vel * self.heading.sin() * dt;
        self.distance += linear_vel * dt;
    }
}
