//! Mock device driver for hardware-free line following
//!
//! Simulates a differential drive robot with a reflectance sensor bar over a
//! track of constant curvature, so the full control loop can run on a
//! desktop or in tests.
//!
//! | Component | Simulation Method |
//! |-----------|-------------------|
//! | Sensor bar | Gaussian line profile per sensor + seeded noise |
//! | Motors | Differential drive kinematics in the line frame |
//!
//! # Configuration
//!
//! Enable the `mock` feature (on by default) and select the driver:
//!
//! ```toml
//! [device]
//! type = "mock"
//! name = "Bench"
//!
//! [device.simulation]
//! start_offset = 0.015  # line 15 mm right of the axle
//! curvature = 2.0       # 0.5 m radius right-hand bend
//! random_seed = 42      # 0 = random each run
//! ```
//!
//! # Time Model
//!
//! There is no simulation thread. Every accepted motor command advances the
//! world by one `dt`, so a tick of the control loop is one step of physics
//! regardless of wall-clock time. Both halves share one world state behind a
//! mutex; a [`MockProbe`] reads the same state from outside the loop.
//!
//! # Module Structure
//!
//! - [`config`]: Simulation parameters
//! - [`physics`]: Kinematics relative to the line
//! - [`sensor_sim`]: Reflectance readings from the line offset
//! - [`noise`]: Seeded ADC reading noise

pub mod config;
mod noise;
mod physics;
mod sensor_sim;

use crate::config::SensorConfig;
use crate::core::driver::{Device, MotorSink, SensorSource};
use crate::core::types::{MotorCommand, SensorFrame};
use crate::error::Result;
use config::SimulationConfig;
use physics::TrackPhysics;
use sensor_sim::ReflectanceSimulator;
use std::sync::{Arc, Mutex, MutexGuard};

/// World state shared by the mock sensors, motors and probes
struct SimState {
    physics: TrackPhysics,
    reflectance: ReflectanceSimulator,
    lookahead: f32,
    dt: f32,
    last_command: MotorCommand,
    steps: u64,
}

type SharedState = Arc<Mutex<SimState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Simulated robot before it is handed to the control loop
pub struct MockDevice {
    state: SharedState,
    sensor_count: usize,
}

impl MockDevice {
    pub fn new(config: &SimulationConfig, sensors: &SensorConfig) -> Self {
        log::info!(
            "Mock track: offset {:.3}m heading {:.3}rad curvature {:.2}/m, seed {}",
            config.start_offset,
            config.start_heading,
            config.curvature,
            config.random_seed
        );

        let state = SimState {
            physics: TrackPhysics::new(config),
            reflectance: ReflectanceSimulator::new(config, sensors.count, sensors.adc_max),
            lookahead: config.sensor_lookahead,
            dt: config.dt,
            last_command: MotorCommand::STOP,
            steps: 0,
        };

        Self {
            state: Arc::new(Mutex::new(state)),
            sensor_count: sensors.count,
        }
    }

    /// Read-only view of the simulated world, valid after `into_device`
    pub fn probe(&self) -> MockProbe {
        MockProbe {
            state: Arc::clone(&self.state),
        }
    }

    /// Split into the sensor and motor halves of a [`Device`]
    pub fn into_device(self, name: impl Into<String>) -> Device {
        Device {
            name: name.into(),
            sensors: Box::new(MockSensors {
                state: Arc::clone(&self.state),
                count: self.sensor_count,
            }),
            motors: Box::new(MockMotors { state: self.state }),
        }
    }
}

/// Sensor half: frames from the current pose
pub struct MockSensors {
    state: SharedState,
    count: usize,
}

impl SensorSource for MockSensors {
    fn sensor_count(&self) -> usize {
        self.count
    }

    fn sample(&mut self) -> Result<SensorFrame> {
        let mut state = lock(&self.state);
        let offset = state.physics.line_offset_at(state.lookahead);
        Ok(state.reflectance.read(offset))
    }
}

/// Motor half: each command advances the world by one step
pub struct MockMotors {
    state: SharedState,
}

impl MotorSink for MockMotors {
    fn drive(&mut self, cmd: MotorCommand) -> Result<()> {
        let mut state = lock(&self.state);
        let dt = state.dt;
        state.physics.update(cmd, dt);
        state.last_command = cmd;
        state.steps += 1;
        Ok(())
    }
}

/// Observer handle for tests and diagnostics
#[derive(Clone)]
pub struct MockProbe {
    state: SharedState,
}

impl MockProbe {
    /// Line offset from the axle center (m, positive = line to the right)
    pub fn line_offset(&self) -> f32 {
        lock(&self.state).physics.lateral()
    }

    /// Line offset under the sensor bar, what the sensors currently see (m)
    pub fn sensor_offset(&self) -> f32 {
        let state = lock(&self.state);
        state.physics.line_offset_at(state.lookahead)
    }

    /// Heading relative to the line (rad)
    pub fn heading(&self) -> f32 {
        lock(&self.state).physics.heading()
    }

    /// Distance travelled along the track (m)
    pub fn distance(&self) -> f32 {
        lock(&self.state).physics.distance()
    }

    pub fn last_command(&self) -> MotorCommand {
        lock(&self.state).last_command
    }

    /// Physics steps taken (one per motor command)
    pub fn steps(&self) -> u64 {
        lock(&self.state).steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.noise.stddev = 0.0;
        config
    }

    #[test]
    fn test_device_reports_configured_sensor_count() {
        let device = MockDevice::new(&quiet(), &SensorConfig::default()).into_device("bench");
        assert_eq!(device.name, "bench");
        assert_eq!(device.sensors.sensor_count(), 6);
    }

    #[test]
    fn test_sampling_does_not_advance_world() {
        let mock = MockDevice::new(&quiet(), &SensorConfig::default());
        let probe = mock.probe();
        let mut device = mock.into_device("bench");

        let first = device.sensors.sample().unwrap();
        let second = device.sensors.sample().unwrap();
        assert_eq!(first, second);
        assert_eq!(probe.steps(), 0);
    }

    #[test]
    fn test_drive_steps_physics() {
        let mock = MockDevice::new(&quiet(), &SensorConfig::default());
        let probe = mock.probe();
        let mut device = mock.into_device("bench");

        device.motors.drive(MotorCommand::new(175, 175)).unwrap();
        device.motors.drive(MotorCommand::new(175, 175)).unwrap();
        assert_eq!(probe.steps(), 2);
        assert_eq!(probe.last_command(), MotorCommand::new(175, 175));
        assert!(probe.distance() > 0.0);
        assert_eq!(probe.line_offset(), 0.0);
    }

    #[test]
    fn test_stop_records_zero_command() {
        let mock = MockDevice::new(&quiet(), &SensorConfig::default());
        let probe = mock.probe();
        let mut device = mock.into_device("bench");

        device.motors.drive(MotorCommand::new(200, 150)).unwrap();
        device.motors.stop().unwrap();
        assert_eq!(probe.last_command(), MotorCommand::STOP);
    }

    #[test]
    fn test_offset_line_lights_right_sensors() {
        let mut config = quiet();
        config.start_offset = 0.02;
        let mut device = MockDevice::new(&config, &SensorConfig::default()).into_device("bench");
        let frame = device.sensors.sample().unwrap();
        let v = frame.values();
        assert!(v[4] + v[5] > v[0] + v[1]);
    }

    #[test]
    fn test_probe_projects_offset_to_sensor_bar() {
        let mut config = quiet();
        config.start_offset = 0.01;
        config.start_heading = 0.1;
        let probe = MockDevice::new(&config, &SensorConfig::default()).probe();
        assert_eq!(probe.line_offset(), 0.01);
        assert!(probe.sensor_offset() < 0.01);
    }
}
