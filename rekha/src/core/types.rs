//! Core data types flowing through a control tick.
//!
//! Key types:
//! - [`SensorFrame`]: Raw reflectance intensities, sampled fresh every tick
//! - [`Position`]: Weighted-average line position produced by the estimator
//! - [`MotorCommand`]: Left/right drive strengths handed to the motor sink

/// Estimated lateral line position.
///
/// Ranges over `0..=(N-1)*heuristic_offset`: `0` means the line sits under
/// sensor 0 (leftmost), the upper bound means it sits under the last sensor.
pub type Position = u32;

/// One sample of every reflectance sensor, ordered left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorFrame {
    values: Vec<u16>,
}

impl SensorFrame {
    /// Wrap raw ADC counts
    pub fn new(values: Vec<u16>) -> Self {
        Self { values }
    }

    /// Raw intensities, index 0 is the leftmost sensor
    #[inline]
    pub fn values(&self) -> &[u16] {
        &self.values
    }

    /// Number of sensors in the frame
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the frame holds no readings
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume the frame, returning the readings
    pub fn into_values(self) -> Vec<u16> {
        self.values
    }
}

impl From<Vec<u16>> for SensorFrame {
    fn from(values: Vec<u16>) -> Self {
        Self::new(values)
    }
}

impl<const N: usize> From<[u16; N]> for SensorFrame {
    fn from(values: [u16; N]) -> Self {
        Self::new(values.to_vec())
    }
}

/// Result of one position estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEstimate {
    /// Estimated (or snapped, when lost) line position
    pub position: Position,
    /// At least one sensor read above the on-track threshold
    pub on_track: bool,
}

/// Drive strengths for the two wheels, each in `0..=max_speed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotorCommand {
    pub left: u16,
    pub right: u16,
}

impl MotorCommand {
    /// Both motors off
    pub const STOP: MotorCommand = MotorCommand { left: 0, right: 0 };

    /// Create a new command
    pub fn new(left: u16, right: u16) -> Self {
        Self { left, right }
    }
}
