//! Configuration for Rekha
//!
//! Loads the TOML configuration and rejects inconsistent values up front, so
//! the estimator and PID law can stay total at runtime.
//!
//! ```toml
//! [device]
//! type = "mock"
//! name = "Bench line follower"
//!
//! [sensors]
//! count = 6
//! noise_threshold = 50
//! on_track_value = 200
//!
//! [controller]
//! preset = "faster"
//!
//! [control_loop]
//! tick_delay_ms = 15
//! ```

use crate::control::pid::PidConfig;
use crate::core::types::Position;
#[cfg(feature = "mock")]
use crate::devices::mock::config::SimulationConfig;
use crate::devices::sysfs::SysfsConfig;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub device: DeviceConfig,
    #[serde(default)]
    pub sensors: SensorConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub control_loop: LoopConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Device selection
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Driver to use: "mock" or "sysfs"
    #[serde(rename = "type")]
    pub device_type: String,

    /// Human readable name for logs
    #[serde(default = "default_device_name")]
    pub name: String,

    /// Simulation parameters (mock only)
    #[cfg(feature = "mock")]
    #[serde(default)]
    pub simulation: Option<SimulationConfig>,

    /// IIO/PWM paths and motor calibration (sysfs only)
    #[serde(default)]
    pub sysfs: Option<SysfsConfig>,
}

/// Reflectance sensor bar and position heuristic
#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    /// Number of sensors on the bar
    #[serde(default = "default_sensor_count")]
    pub count: usize,

    /// Full-scale ADC count
    #[serde(default = "default_adc_max")]
    pub adc_max: u16,

    /// Positional weight step between neighbouring sensors
    #[serde(default = "default_heuristic_offset")]
    pub heuristic_offset: u32,

    /// Readings at or below this are noise and carry no weight
    #[serde(default = "default_noise_threshold")]
    pub noise_threshold: u16,

    /// Any reading above this means the line is under the bar
    #[serde(default = "default_on_track_value")]
    pub on_track_value: u16,
}

impl SensorConfig {
    /// Position reported when the line is under the last sensor
    pub fn max_position(&self) -> Position {
        (self.count.saturating_sub(1) as u32).saturating_mul(self.heuristic_offset)
    }

    /// Position of a centered line (the PID setpoint)
    pub fn midpoint(&self) -> Position {
        self.max_position() / 2
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            count: default_sensor_count(),
            adc_max: default_adc_max(),
            heuristic_offset: default_heuristic_offset(),
            noise_threshold: default_noise_threshold(),
            on_track_value: default_on_track_value(),
        }
    }
}

/// Gain/speed presets from bench tuning
///
/// | Preset | kp | base | max | Notes |
/// |--------|----|------|-----|-------|
/// | slow | 0.025 | 75 | 200 | Handles every corner case |
/// | fast | 0.00382 | 125 | 240 | Low battery consumption |
/// | faster | 0.0515 | 175 | 240 | High battery consumption |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PidPreset {
    Slow,
    Fast,
    #[default]
    Faster,
}

impl PidPreset {
    /// (kp, base_speed, max_speed)
    fn values(self) -> (f64, u16, u16) {
        match self {
            PidPreset::Slow => (0.025, 75, 200),
            PidPreset::Fast => (0.00382, 125, 240),
            PidPreset::Faster => (0.0515, 175, 240),
        }
    }
}

/// PID controller section. Explicit values override the preset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub preset: PidPreset,
    pub kp: Option<f64>,
    pub ki: Option<f64>,
    pub kd: Option<f64>,
    pub base_speed: Option<u16>,
    pub max_speed: Option<u16>,

    /// Ticks between hard integral resets
    pub integral_reset_iter: Option<u32>,
}

/// Outer loop timing
#[derive(Debug, Clone, Deserialize)]
pub struct LoopConfig {
    /// Fixed sleep between ticks (power saving, never shortened)
    #[serde(default = "default_tick_delay_ms")]
    pub tick_delay_ms: u64,

    /// Ticks between debug summaries
    #[serde(default = "default_summary_interval")]
    pub summary_interval: u64,
}

impl LoopConfig {
    pub fn tick_delay(&self) -> Duration {
        Duration::from_millis(self.tick_delay_ms)
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_delay_ms: default_tick_delay_ms(),
            summary_interval: default_summary_interval(),
        }
    }
}

/// Where diagnostic lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryOutput {
    #[default]
    Log,
    Udp,
}

/// Optional per-tick diagnostic dump
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub output: TelemetryOutput,

    /// Destination for `output = "udp"`, e.g. `192.168.1.20:5557`
    #[serde(default)]
    pub udp_target: Option<String>,

    /// Reports buffered before new ones are dropped
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl TelemetryConfig {
    /// Parsed UDP destination
    pub fn udp_addr(&self) -> Result<SocketAddr> {
        let target = self
            .udp_target
            .as_deref()
            .ok_or_else(|| Error::Config("telemetry.udp_target is required for udp output".into()))?;
        target
            .parse()
            .map_err(|e| Error::Config(format!("telemetry.udp_target {:?}: {}", target, e)))
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output: TelemetryOutput::Log,
            udp_target: None,
            queue_depth: default_queue_depth(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_device_name() -> String {
    "line follower".to_string()
}
fn default_sensor_count() -> usize {
    6
}
fn default_adc_max() -> u16 {
    1023
}
fn default_heuristic_offset() -> u32 {
    1000
}
fn default_noise_threshold() -> u16 {
    50
}
fn default_on_track_value() -> u16 {
    200
}
fn default_tick_delay_ms() -> u64 {
    15
}
fn default_summary_interval() -> u64 {
    500
}
fn default_queue_depth() -> usize {
    64
}
fn default_log_level() -> String {
    "info".to_string()
}

const DEFAULT_KI: f64 = 0.00000267;
const DEFAULT_KD: f64 = 0.00035;
const DEFAULT_INTEGRAL_RESET_ITER: u32 = 125;

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration for the simulated robot with every default applied
    #[cfg(feature = "mock")]
    pub fn mock() -> Self {
        Self {
            device: DeviceConfig {
                device_type: "mock".to_string(),
                name: "Mock line follower".to_string(),
                simulation: Some(SimulationConfig::default()),
                sysfs: None,
            },
            sensors: SensorConfig::default(),
            controller: ControllerConfig::default(),
            control_loop: LoopConfig::default(),
            telemetry: TelemetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Resolve the controller section against its preset
    pub fn pid(&self) -> PidConfig {
        let c = &self.controller;
        let (kp, base_speed, max_speed) = c.preset.values();
        PidConfig {
            kp: c.kp.unwrap_or(kp),
            ki: c.ki.unwrap_or(DEFAULT_KI),
            kd: c.kd.unwrap_or(DEFAULT_KD),
            base_speed: c.base_speed.unwrap_or(base_speed),
            max_speed: c.max_speed.unwrap_or(max_speed),
            setpoint: self.sensors.midpoint(),
            integral_reset_iter: c.integral_reset_iter.unwrap_or(DEFAULT_INTEGRAL_RESET_ITER),
        }
    }

    /// Reject configurations that would break the controller's invariants
    pub fn validate(&self) -> Result<()> {
        let s = &self.sensors;
        if s.count < 2 {
            return Err(invalid(format!("sensors.count must be at least 2, got {}", s.count)));
        }
        if s.heuristic_offset == 0 {
            return Err(invalid("sensors.heuristic_offset must be positive"));
        }
        let span = (s.count as u64 - 1) * s.heuristic_offset as u64;
        if span > i32::MAX as u64 {
            return Err(invalid(format!(
                "sensors.count * heuristic_offset spans {} positions, above {}",
                span,
                i32::MAX
            )));
        }
        if s.on_track_value <= s.noise_threshold {
            return Err(invalid(format!(
                "sensors.on_track_value ({}) must be above noise_threshold ({})",
                s.on_track_value, s.noise_threshold
            )));
        }
        if s.on_track_value >= s.adc_max {
            return Err(invalid(format!(
                "sensors.on_track_value ({}) must be below adc_max ({})",
                s.on_track_value, s.adc_max
            )));
        }

        let pid = self.pid();
        for (name, gain) in [("kp", pid.kp), ("ki", pid.ki), ("kd", pid.kd)] {
            if !gain.is_finite() || gain < 0.0 {
                return Err(invalid(format!("controller.{} must be finite and >= 0, got {}", name, gain)));
            }
        }
        if pid.max_speed == 0 {
            return Err(invalid("controller.max_speed must be positive"));
        }
        if pid.base_speed > pid.max_speed {
            return Err(invalid(format!(
                "controller.base_speed ({}) exceeds max_speed ({})",
                pid.base_speed, pid.max_speed
            )));
        }
        if pid.integral_reset_iter == 0 {
            return Err(invalid("controller.integral_reset_iter must be positive"));
        }

        if self.control_loop.tick_delay_ms == 0 {
            return Err(invalid("control_loop.tick_delay_ms must be positive"));
        }
        if self.control_loop.summary_interval == 0 {
            return Err(invalid("control_loop.summary_interval must be positive"));
        }

        if self.telemetry.queue_depth == 0 {
            return Err(invalid("telemetry.queue_depth must be positive"));
        }
        if self.telemetry.enabled && self.telemetry.output == TelemetryOutput::Udp {
            self.telemetry.udp_addr()?;
        }

        self.validate_device()
    }

    fn validate_device(&self) -> Result<()> {
        match self.device.device_type.as_str() {
            #[cfg(feature = "mock")]
            "mock" => {
                if let Some(sim) = &self.device.simulation {
                    sim.validate()?;
                }
                Ok(())
            }
            "sysfs" => {
                let sysfs = self
                    .device
                    .sysfs
                    .as_ref()
                    .ok_or_else(|| invalid("sysfs device requires a [device.sysfs] section"))?;
                sysfs.validate(&self.sensors)
            }
            other => Err(Error::UnknownDevice(other.to_string())),
        }
    }
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::Config(msg.into())
}
