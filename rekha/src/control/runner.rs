//! Outer control loop
//!
//! ```text
//! every tick:
//!   SensorSource::sample  ->  PositionEstimator  ->  PidController  ->  MotorSink::drive
//!                                                                   \->  telemetry (try_send)
//! then sleep tick_delay (fixed, for power consumption)
//! ```
//!
//! One tick runs to completion before the next one starts, and the loop is the
//! only owner of the estimator and controller state.

use super::estimator::PositionEstimator;
use super::pid::PidController;
use crate::config::Config;
use crate::core::driver::Device;
use crate::error::{Error, Result};
use crate::telemetry::{TelemetrySender, TickReport};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Line-following control loop bound to one device
pub struct ControlLoop {
    device: Device,
    estimator: PositionEstimator,
    controller: PidController,
    telemetry: Option<TelemetrySender>,
    tick_delay: Duration,
    summary_interval: u64,
    running: Arc<AtomicBool>,
    ticks: u64,
    failed_samples: u64,
    lost_ticks: u64,
}

impl ControlLoop {
    /// Build the loop from a validated configuration
    ///
    /// Fails if the device does not report exactly `sensors.count` channels,
    /// since extra channels would push positions past the last sensor weight.
    pub fn new(config: &Config, device: Device, running: Arc<AtomicBool>) -> Result<Self> {
        let reported = device.sensors.sensor_count();
        if reported != config.sensors.count {
            return Err(Error::Config(format!(
                "device '{}' reports {} sensors, sensors.count is {}",
                device.name, reported, config.sensors.count
            )));
        }

        Ok(Self {
            device,
            estimator: PositionEstimator::new(&config.sensors),
            controller: PidController::new(config.pid()),
            telemetry: None,
            tick_delay: config.control_loop.tick_delay(),
            summary_interval: config.control_loop.summary_interval,
            running,
            ticks: 0,
            failed_samples: 0,
            lost_ticks: 0,
        })
    }

    /// Attach a telemetry queue
    pub fn with_telemetry(mut self, telemetry: TelemetrySender) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Run one tick: sample, estimate, steer, actuate
    pub fn tick(&mut self) -> Result<TickReport> {
        let frame = self.device.sensors.sample()?;

        let estimate = self.estimator.observe(&frame);
        let output = self.controller.update(estimate.position);

        if let Err(e) = self.device.motors.drive(output.command) {
            log::warn!("Motor command {:?} failed: {}", output.command, e);
        }

        self.ticks += 1;
        if !estimate.on_track {
            self.lost_ticks += 1;
        }

        let report = TickReport::new(self.ticks, frame.into_values(), estimate, &output);
        log::trace!("{}", report);

        if let Some(telemetry) = &self.telemetry {
            telemetry.emit(report.clone());
        }

        if self.ticks % self.summary_interval == 0 {
            self.log_summary(&report);
        }

        Ok(report)
    }

    /// Tick until the running flag clears, then stop the motors
    pub fn run(&mut self) {
        log::info!(
            "Control loop started on '{}' ({}ms between ticks)",
            self.device.name,
            self.tick_delay.as_millis()
        );

        while self.running.load(Ordering::Relaxed) {
            if let Err(e) = self.tick() {
                self.failed_samples += 1;
                log::warn!("Sensor sample failed, tick skipped: {}", e);
            }
            thread::sleep(self.tick_delay);
        }

        self.shutdown();
    }

    /// Stop actuating: command both motors to zero
    pub fn shutdown(&mut self) {
        if let Err(e) = self.device.motors.stop() {
            log::error!("Failed to stop motors: {}", e);
        }
        log::info!(
            "Control loop stopped after {} ticks ({} lost-track, {} failed samples{})",
            self.ticks,
            self.lost_ticks,
            self.failed_samples,
            self.telemetry
                .as_ref()
                .map(|t| format!(", {} telemetry drops", t.dropped()))
                .unwrap_or_default()
        );
    }

    fn log_summary(&self, report: &TickReport) {
        let state = self.controller.state();
        log::debug!(
            "tick {}: position={} error={} integral={} cmd=({}, {}) lost={}",
            self.ticks,
            report.position,
            report.error,
            state.integral,
            report.left,
            report.right,
            self.lost_ticks
        );
    }

    /// Ticks completed so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks on which the line was out of sight
    pub fn lost_ticks(&self) -> u64 {
        self.lost_ticks
    }

    pub fn estimator(&self) -> &PositionEstimator {
        &self.estimator
    }

    pub fn controller(&self) -> &PidController {
        &self.controller
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::core::driver::{MotorSink, SensorSource};
    use crate::core::types::{MotorCommand, SensorFrame};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted frames
    struct ScriptedSensors {
        count: usize,
        frames: VecDeque<Result<SensorFrame>>,
    }

    impl SensorSource for ScriptedSensors {
        fn sensor_count(&self) -> usize {
            self.count
        }

        fn sample(&mut self) -> Result<SensorFrame> {
            self.frames
                .pop_front()
                .unwrap_or_else(|| Ok(SensorFrame::from([0; 6])))
        }
    }

    /// Records every command
    #[derive(Clone, Default)]
    struct RecordingMotors {
        commands: Arc<Mutex<Vec<MotorCommand>>>,
    }

    impl MotorSink for RecordingMotors {
        fn drive(&mut self, cmd: MotorCommand) -> Result<()> {
            self.commands.lock().unwrap().push(cmd);
            Ok(())
        }
    }

    fn scripted_device(count: usize, frames: Vec<Result<SensorFrame>>) -> (Device, RecordingMotors) {
        let motors = RecordingMotors::default();
        let device = Device {
            name: "scripted".to_string(),
            sensors: Box::new(ScriptedSensors {
                count,
                frames: frames.into(),
            }),
            motors: Box::new(motors.clone()),
        };
        (device, motors)
    }

    fn control_loop(frames: Vec<Result<SensorFrame>>) -> (ControlLoop, RecordingMotors) {
        let (device, motors) = scripted_device(6, frames);
        let running = Arc::new(AtomicBool::new(true));
        (ControlLoop::new(&Config::mock(), device, running).unwrap(), motors)
    }

    #[test]
    fn test_rejects_sensor_count_mismatch() {
        let (device, motors) =
            scripted_device(8, vec![Ok(SensorFrame::from([0, 0, 0, 0, 0, 0, 0, 900]))]);
        let running = Arc::new(AtomicBool::new(true));
        let result = ControlLoop::new(&Config::mock(), device, running);
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("8 sensors")));
        assert!(motors.commands.lock().unwrap().is_empty());
    }

    #[test]
    fn test_positions_stay_within_sensor_span() {
        let (mut control, _) = control_loop(vec![
            Ok(SensorFrame::from([0, 0, 0, 0, 0, 900])),
            Ok(SensorFrame::from([0; 6])),
        ]);
        let extreme = control.estimator().extreme_right();
        for _ in 0..2 {
            assert!(control.tick().unwrap().position <= extreme);
        }
    }

    #[test]
    fn test_centered_frame_drives_base_speed() {
        let (mut control, motors) =
            control_loop(vec![Ok(SensorFrame::from([0, 0, 300, 300, 0, 0]))]);
        let report = control.tick().unwrap();
        assert_eq!(report.position, 2500);
        assert_eq!(report.error, 0);
        assert_eq!(report.pid, 0);
        assert_eq!((report.left, report.right), (175, 175));
        assert_eq!(
            *motors.commands.lock().unwrap(),
            vec![MotorCommand::new(175, 175)]
        );
    }

    #[test]
    fn test_lost_line_steers_to_last_side() {
        let (mut control, _) = control_loop(vec![
            Ok(SensorFrame::from([0, 0, 0, 0, 300, 900])),
            Ok(SensorFrame::from([0; 6])),
        ]);
        control.tick().unwrap();
        let report = control.tick().unwrap();
        assert!(!report.on_track);
        assert_eq!(report.position, 5000);
        assert_eq!((report.left, report.right), (240, 47));
        assert_eq!(control.lost_ticks(), 1);
    }

    #[test]
    fn test_sample_failure_leaves_state_untouched() {
        let (mut control, motors) = control_loop(vec![Err(Error::Device("adc timeout".into()))]);
        assert!(control.tick().is_err());
        assert_eq!(control.ticks(), 0);
        assert_eq!(*control.controller().state(), Default::default());
        assert!(motors.commands.lock().unwrap().is_empty());
    }

    #[test]
    fn test_telemetry_receives_reports() {
        let (tx, rx) = crate::telemetry::channel(4);
        let (control, _) = control_loop(vec![Ok(SensorFrame::from([0, 0, 300, 300, 0, 0]))]);
        let mut control = control.with_telemetry(tx);
        control.tick().unwrap();
        let report = rx.try_recv().unwrap();
        assert_eq!(report.tick, 1);
        assert_eq!(report.frame, vec![0, 0, 300, 300, 0, 0]);
    }

    #[test]
    fn test_run_stops_motors_on_shutdown() {
        let (mut control, motors) = control_loop(vec![]);
        control.running.store(false, Ordering::Relaxed);
        control.run();
        assert_eq!(*motors.commands.lock().unwrap(), vec![MotorCommand::STOP]);
    }
}
