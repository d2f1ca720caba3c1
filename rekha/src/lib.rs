//! Rekha - Closed-loop PID line follower
//!
//! Reads a bar of reflectance sensors, estimates where the line sits under
//! the bar and steers a differential drive with a PID controller, once per
//! fixed-interval tick.
//!
//! ## Features
//!
//! - `mock`: Enable the simulated track for hardware-free runs and tests

pub mod config;
pub mod control;
pub mod core;
pub mod devices;
pub mod error;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use control::ControlLoop;
pub use error::{Error, Result};
