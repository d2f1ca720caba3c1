//! PID steering law for differential drive
//!
//! # Algorithm (per tick)
//!
//! 1. If `ticks_since_reset == integral_reset_iter`, zero the integral and the counter
//! 2. `error = position - setpoint`
//! 3. `integral += error`
//! 4. `pid = kp*error + ki*integral + kd*(error - last_error)`, truncated toward zero
//! 5. `left = clamp(base + pid, 0, max)`, `right = clamp(base - pid, 0, max)`
//! 6. Remember `error`, count the tick
//!
//! The integral is bounded by the periodic hard reset in step 1 rather than by
//! clamping. The reset fires on equality with the counter, never on a modulo.
//!
//! A positive `pid` means the line drifted right: the left wheel speeds up, the
//! right wheel slows down, and the robot turns right.

use crate::core::types::{MotorCommand, Position};

/// Gains, speed envelope and setpoint for the steering law
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Strength of both wheels with zero correction
    pub base_speed: u16,
    /// Upper clamp for either wheel
    pub max_speed: u16,
    /// Position of a centered line
    pub setpoint: Position,
    /// Ticks between hard integral resets (must be > 0)
    pub integral_reset_iter: u32,
}

/// Persistent controller state, zeroed on startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerState {
    pub last_error: i32,
    /// Wider than the error to delay saturation between resets
    pub integral: i64,
    pub ticks_since_reset: u32,
}

/// Everything computed in one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PidOutput {
    pub error: i32,
    /// Integral after this tick's accumulation
    pub integral: i64,
    pub pid: i32,
    pub command: MotorCommand,
}

/// Run one tick of the steering law, returning only the motor command
pub fn step(position: Position, state: &mut ControllerState, config: &PidConfig) -> MotorCommand {
    evaluate(position, state, config).command
}

/// Run one tick of the steering law
pub fn evaluate(position: Position, state: &mut ControllerState, config: &PidConfig) -> PidOutput {
    if state.ticks_since_reset == config.integral_reset_iter {
        state.integral = 0;
        state.ticks_since_reset = 0;
    }

    let error = (position as i64 - config.setpoint as i64) as i32;
    state.integral += error as i64;

    let correction = config.kp * error as f64
        + config.ki * state.integral as f64
        + config.kd * (error as i64 - state.last_error as i64) as f64;
    // Truncates toward zero and saturates at the i32 bounds
    let pid = correction as i32;

    let base = config.base_speed as i64;
    let max = config.max_speed as i64;
    let command = MotorCommand {
        left: (base + pid as i64).clamp(0, max) as u16,
        right: (base - pid as i64).clamp(0, max) as u16,
    };

    state.last_error = error;
    state.ticks_since_reset += 1;

    PidOutput {
        error,
        integral: state.integral,
        pid,
        command,
    }
}

/// PID controller owning its state
#[derive(Debug, Clone)]
pub struct PidController {
    config: PidConfig,
    state: ControllerState,
}

impl PidController {
    /// Create a controller with zeroed state
    pub fn new(config: PidConfig) -> Self {
        log::debug!(
            "PidController: kp={} ki={} kd={} base={} max={} setpoint={} reset_every={}",
            config.kp,
            config.ki,
            config.kd,
            config.base_speed,
            config.max_speed,
            config.setpoint,
            config.integral_reset_iter
        );
        Self {
            config,
            state: ControllerState::default(),
        }
    }

    /// Advance one tick with a new position
    pub fn update(&mut self, position: Position) -> PidOutput {
        evaluate(position, &mut self.state, &self.config)
    }

    /// Gains and speed envelope in use
    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    /// State carried into the next tick
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Back to the startup state
    pub fn reset(&mut self) {
        self.state = ControllerState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PidConfig {
        PidConfig {
            kp: 0.0515,
            ki: 0.00000267,
            kd: 0.00035,
            base_speed: 175,
            max_speed: 240,
            setpoint: 2500,
            integral_reset_iter: 125,
        }
    }

    #[test]
    fn test_centered_line_drives_straight() {
        let mut state = ControllerState::default();
        let out = evaluate(2500, &mut state, &config());
        assert_eq!(out.error, 0);
        assert_eq!(out.pid, 0);
        assert_eq!(out.command, MotorCommand::new(175, 175));
    }

    #[test]
    fn test_line_right_turns_right() {
        let mut state = ControllerState::default();
        let out = evaluate(3000, &mut state, &config());
        // 0.0515*500 + 0.00000267*500 + 0.00035*500 = 25.926..
        assert_eq!(out.error, 500);
        assert_eq!(out.pid, 25);
        assert_eq!(out.command, MotorCommand::new(200, 150));
        assert_eq!(state.last_error, 500);
        assert_eq!(state.integral, 500);
        assert_eq!(state.ticks_since_reset, 1);
    }

    #[test]
    fn test_negative_correction_truncates_toward_zero() {
        let mut state = ControllerState::default();
        let out = evaluate(2000, &mut state, &config());
        assert_eq!(out.error, -500);
        assert_eq!(out.pid, -25);
        assert_eq!(out.command, MotorCommand::new(150, 200));
    }

    #[test]
    fn test_derivative_uses_previous_error() {
        let cfg = PidConfig {
            kp: 0.0,
            ki: 0.0,
            kd: 0.1,
            ..config()
        };
        let mut state = ControllerState::default();
        assert_eq!(evaluate(2600, &mut state, &cfg).pid, 10);
        // Same error again: no change, no derivative
        assert_eq!(evaluate(2600, &mut state, &cfg).pid, 0);
        assert_eq!(evaluate(2400, &mut state, &cfg).pid, -20);
    }

    #[test]
    fn test_clamps_at_max_speed() {
        let mut state = ControllerState::default();
        let out = evaluate(5000, &mut state, &config());
        assert!(175 + out.pid > 240);
        assert_eq!(out.command.left, 240);
        assert_eq!(out.command.right, 175 - out.pid as u16);
    }

    #[test]
    fn test_clamps_at_zero() {
        let cfg = PidConfig {
            kp: 1.0,
            ..config()
        };
        let mut state = ControllerState::default();
        let out = evaluate(0, &mut state, &cfg);
        assert_eq!(out.command, MotorCommand::new(0, 240));

        let out = evaluate(5000, &mut state, &cfg);
        assert_eq!(out.command, MotorCommand::new(240, 0));
    }

    #[test]
    fn test_integral_resets_on_exact_tick_count() {
        let cfg = config();
        let mut state = ControllerState::default();
        let errors = [700u32, 5000, 0, 2400, 3100];
        for i in 0..cfg.integral_reset_iter as usize {
            step(errors[i % errors.len()], &mut state, &cfg);
        }
        assert_eq!(state.ticks_since_reset, cfg.integral_reset_iter);
        assert_ne!(state.integral, 0);

        // The next tick starts from a zeroed integral
        let out = evaluate(3000, &mut state, &cfg);
        assert_eq!(out.integral, 500);
        assert_eq!(state.ticks_since_reset, 1);
    }

    #[test]
    fn test_integral_accumulates_between_resets() {
        let cfg = PidConfig {
            integral_reset_iter: 3,
            ..config()
        };
        let mut state = ControllerState::default();
        assert_eq!(evaluate(2600, &mut state, &cfg).integral, 100);
        assert_eq!(evaluate(2600, &mut state, &cfg).integral, 200);
        assert_eq!(evaluate(2600, &mut state, &cfg).integral, 300);
        assert_eq!(evaluate(2600, &mut state, &cfg).integral, 100);
    }

    #[test]
    fn test_reset_check_uses_equality() {
        let cfg = PidConfig {
            integral_reset_iter: 2,
            ..config()
        };
        // A counter already past the limit never resets
        let mut state = ControllerState {
            last_error: 0,
            integral: 1_000,
            ticks_since_reset: 5,
        };
        assert_eq!(evaluate(2500, &mut state, &cfg).integral, 1_000);
        assert_eq!(state.ticks_since_reset, 6);
    }

    #[test]
    fn test_pid_monotonic_in_error() {
        let cfg = config();
        let frozen = ControllerState {
            last_error: 120,
            integral: -40_000,
            ticks_since_reset: 10,
        };
        let mut previous = i32::MIN;
        for position in (0..=5000).step_by(50) {
            let mut state = frozen;
            let pid = evaluate(position, &mut state, &cfg).pid;
            assert!(pid >= previous, "pid fell at position {}", position);
            previous = pid;
        }
    }

    #[test]
    fn test_controller_reset() {
        let mut pid = PidController::new(config());
        pid.update(4000);
        assert_ne!(*pid.state(), ControllerState::default());
        pid.reset();
        assert_eq!(*pid.state(), ControllerState::default());
        assert_eq!(pid.config().setpoint, 2500);
    }
}
