//! Linux hardware driver: IIO ADC sensors and sysfs PWM motors
//!
//! ```toml
//! [device]
//! type = "sysfs"
//!
//! [device.sysfs]
//! iio_device = "/sys/bus/iio/devices/iio:device0"
//! channels = [0, 1, 2, 3, 4, 5]   # leftmost sensor first
//! pwm_chip = "/sys/class/pwm/pwmchip0"
//! left_pwm = 0
//! right_pwm = 1
//! period_ns = 1000000
//! left_max = 220                  # per-side calibration, PWM units
//! right_max = 210
//! ```

mod iio;
mod pwm;

pub use iio::IioSensors;
pub use pwm::{DutyScale, PwmChannel, PwmMotors};

use crate::config::SensorConfig;
use crate::core::driver::Device;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// IIO/PWM paths and motor calibration
#[derive(Debug, Clone, Deserialize)]
pub struct SysfsConfig {
    /// IIO device directory holding `in_voltage<ch>_raw`
    #[serde(default = "default_iio_device")]
    pub iio_device: PathBuf,

    /// ADC channel per sensor, leftmost first
    #[serde(default = "default_channels")]
    pub channels: Vec<u32>,

    /// PWM chip directory holding `export` and `pwm<n>`
    #[serde(default = "default_pwm_chip")]
    pub pwm_chip: PathBuf,

    #[serde(default)]
    pub left_pwm: u32,

    #[serde(default = "default_right_pwm")]
    pub right_pwm: u32,

    /// PWM period in nanoseconds
    #[serde(default = "default_period_ns")]
    pub period_ns: u64,

    /// PWM units for a 100% duty cycle
    #[serde(default = "default_pwm_full_scale")]
    pub pwm_full_scale: u16,

    /// PWM units at the controller's max_speed, left motor
    #[serde(default = "default_left_max")]
    pub left_max: u16,

    /// PWM units at the controller's max_speed, right motor
    #[serde(default = "default_right_max")]
    pub right_max: u16,
}

/// Longest accepted PWM period (1 s)
const MAX_PERIOD_NS: u64 = 1_000_000_000;

fn default_iio_device() -> PathBuf {
    PathBuf::from("/sys/bus/iio/devices/iio:device0")
}
fn default_channels() -> Vec<u32> {
    (0..6).collect()
}
fn default_pwm_chip() -> PathBuf {
    PathBuf::from("/sys/class/pwm/pwmchip0")
}
fn default_right_pwm() -> u32 {
    1
}
fn default_period_ns() -> u64 {
    1_000_000
}
fn default_pwm_full_scale() -> u16 {
    255
}
fn default_left_max() -> u16 {
    220
}
fn default_right_max() -> u16 {
    210
}

impl SysfsConfig {
    pub fn validate(&self, sensors: &SensorConfig) -> Result<()> {
        if self.channels.len() != sensors.count {
            return Err(Error::Config(format!(
                "device.sysfs.channels lists {} channels, sensors.count is {}",
                self.channels.len(),
                sensors.count
            )));
        }
        if self.left_pwm == self.right_pwm {
            return Err(Error::Config(format!(
                "device.sysfs left_pwm and right_pwm are both {}",
                self.left_pwm
            )));
        }
        if self.period_ns == 0 || self.period_ns > MAX_PERIOD_NS {
            return Err(Error::Config(format!(
                "device.sysfs.period_ns must be in 1..={}, got {}",
                MAX_PERIOD_NS, self.period_ns
            )));
        }
        if self.pwm_full_scale == 0 {
            return Err(Error::Config("device.sysfs.pwm_full_scale must be positive".into()));
        }
        for (side, max) in [("left_max", self.left_max), ("right_max", self.right_max)] {
            if max > self.pwm_full_scale {
                return Err(Error::Config(format!(
                    "device.sysfs.{} ({}) exceeds pwm_full_scale ({})",
                    side, max, self.pwm_full_scale
                )));
            }
        }
        Ok(())
    }
}

/// Open the ADC channels and PWM outputs
pub fn create(
    name: &str,
    config: &SysfsConfig,
    sensors: &SensorConfig,
    max_speed: u16,
) -> Result<Device> {
    log::info!(
        "Opening sysfs device '{}': {} ADC channels on {}, PWM {}/{} on {}",
        name,
        config.channels.len(),
        config.iio_device.display(),
        config.left_pwm,
        config.right_pwm,
        config.pwm_chip.display()
    );

    let sensor_source = IioSensors::new(&config.iio_device, &config.channels, sensors.adc_max);
    let left = PwmChannel::open(&config.pwm_chip, config.left_pwm, config.period_ns)?;
    let right = PwmChannel::open(&config.pwm_chip, config.right_pwm, config.period_ns)?;
    let scale = DutyScale {
        max_speed,
        left_max: config.left_max,
        right_max: config.right_max,
        full_scale: config.pwm_full_scale,
        period_ns: config.period_ns,
    };

    Ok(Device {
        name: name.to_string(),
        sensors: Box::new(sensor_source),
        motors: Box::new(PwmMotors::new(left, right, scale)),
    })
}
