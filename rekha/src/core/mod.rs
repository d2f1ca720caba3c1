//! Core abstractions shared by the controller and the device drivers.
//!
//! - [`driver::SensorSource`] / [`driver::MotorSink`]: Traits to implement for new hardware
//! - [`types`]: Sensor frames, positions and motor commands

pub mod driver;
pub mod types;
