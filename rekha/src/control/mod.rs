//! Line-following control: position estimate, PID steering and the tick loop.
//!
//! - [`estimator::PositionEstimator`]: Raw frame to line position, with lost-track recovery
//! - [`pid`]: Stateful PID steering law with periodic integral reset
//! - [`runner::ControlLoop`]: Sample, estimate, steer and actuate once per tick

pub mod estimator;
pub mod pid;
pub mod runner;

pub use estimator::PositionEstimator;
pub use pid::{ControllerState, PidConfig, PidController, PidOutput};
pub use runner::ControlLoop;
