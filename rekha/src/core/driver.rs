//! Capability traits for line-follower hardware

use crate::core::types::{MotorCommand, SensorFrame};
use crate::error::Result;

/// Source of reflectance readings
pub trait SensorSource: Send {
    /// Number of channels returned by every [`sample`](Self::sample)
    fn sensor_count(&self) -> usize;

    /// Blocking read of all channels, leftmost first
    fn sample(&mut self) -> Result<SensorFrame>;
}

/// Sink for differential drive commands
pub trait MotorSink: Send {
    /// Apply drive strengths (fire and forget)
    fn drive(&mut self, cmd: MotorCommand) -> Result<()>;

    /// Bring both motors to rest
    fn stop(&mut self) -> Result<()> {
        self.drive(MotorCommand::STOP)
    }
}

/// A concrete robot: one sensor bar plus one pair of motors
pub struct Device {
    /// Human readable device name (from config)
    pub name: String,
    pub sensors: Box<dyn SensorSource>,
    pub motors: Box<dyn MotorSink>,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("sensor_count", &self.sensors.sensor_count())
            .finish_non_exhaustive()
    }
}
