//! Mock device simulation configuration
//!
//! Every parameter has a default matching a small hobby line follower, so an
//! empty `[device.simulation]` section (or none at all) gives a working track.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! SimulationConfig
//! ├── dt, random_seed                      # Simulation control
//! ├── start_offset, start_heading          # Initial pose relative to the line
//! ├── curvature                            # Track shape
//! ├── speed_per_unit, wheel_base           # Drive train
//! ├── sensor_spacing, sensor_lookahead     # Sensor bar geometry
//! └── line_sigma, reflectance_*, noise     # Reflectance model
//! ```
//!
//! # Default Values
//!
//! | Parameter | Default | Notes |
//! |-----------|---------|-------|
//! | dt | 0.015 s | One step per tick, matches the default tick delay |
//! | speed_per_unit | 0.002 m/s | Strength 255 is 0.5 m/s |
//! | wheel_base | 0.12 m | |
//! | sensor_spacing | 0.01 m | 6 sensors span 5 cm |
//! | sensor_lookahead | 0.06 m | Bar ahead of the wheel axle |
//! | line_sigma | 0.008 m | ~19 mm tape |

use crate::error::{Error, Result};
use serde::Deserialize;

/// Gaussian reading noise
#[derive(Debug, Clone, Deserialize)]
pub struct ReflectanceNoiseConfig {
    /// Standard deviation in ADC counts
    #[serde(default = "default_noise_stddev")]
    pub stddev: f32,

    /// Constant offset in ADC counts
    #[serde(default)]
    pub bias: f32,
}

fn default_noise_stddev() -> f32 {
    5.0
}

impl Default for ReflectanceNoiseConfig {
    fn default() -> Self {
        Self {
            stddev: default_noise_stddev(),
            bias: 0.0,
        }
    }
}

/// Simulated robot and track
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Simulated seconds advanced per motor command
    #[serde(default = "default_dt")]
    pub dt: f32,

    /// Seed for reading noise (0 = random each run)
    #[serde(default)]
    pub random_seed: u64,

    /// Initial line offset from the wheel axle (m, positive = line to the right)
    #[serde(default)]
    pub start_offset: f32,

    /// Initial heading relative to the line (rad, positive = pointing right)
    #[serde(default)]
    pub start_heading: f32,

    /// Track curvature (1/m, positive = curving right)
    #[serde(default)]
    pub curvature: f32,

    /// Wheel speed per unit of drive strength (m/s)
    #[serde(default = "default_speed_per_unit")]
    pub speed_per_unit: f32,

    /// Distance between the wheels (m)
    #[serde(default = "default_wheel_base")]
    pub wheel_base: f32,

    /// Pitch between neighbouring sensors (m)
    #[serde(default = "default_sensor_spacing")]
    pub sensor_spacing: f32,

    /// Distance of the sensor bar ahead of the wheel axle (m)
    #[serde(default = "default_sensor_lookahead")]
    pub sensor_lookahead: f32,

    /// Standard deviation of the line's reflectance profile (m)
    #[serde(default = "default_line_sigma")]
    pub line_sigma: f32,

    /// Reading with the line centered under a sensor
    #[serde(default = "default_reflectance_peak")]
    pub reflectance_peak: f32,

    /// Reading over bare floor
    #[serde(default = "default_reflectance_background")]
    pub reflectance_background: f32,

    #[serde(default)]
    pub noise: ReflectanceNoiseConfig,
}

fn default_dt() -> f32 {
    0.015
}
fn default_speed_per_unit() -> f32 {
    0.002
}
fn default_wheel_base() -> f32 {
    0.12
}
fn default_sensor_spacing() -> f32 {
    0.01
}
fn default_sensor_lookahead() -> f32 {
    0.06
}
fn default_line_sigma() -> f32 {
    0.008
}
fn default_reflectance_peak() -> f32 {
    900.0
}
fn default_reflectance_background() -> f32 {
    20.0
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            random_seed: 0,
            start_offset: 0.0,
            start_heading: 0.0,
            curvature: 0.0,
            speed_per_unit: default_speed_per_unit(),
            wheel_base: default_wheel_base(),
            sensor_spacing: default_sensor_spacing(),
            sensor_lookahead: default_sensor_lookahead(),
            line_sigma: default_line_sigma(),
            reflectance_peak: default_reflectance_peak(),
            reflectance_background: default_reflectance_background(),
            noise: ReflectanceNoiseConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("dt", self.dt),
            ("wheel_base", self.wheel_base),
            ("sensor_spacing", self.sensor_spacing),
            ("line_sigma", self.line_sigma),
        ];
        for (name, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(Error::Config(format!(
                    "device.simulation.{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.speed_per_unit < 0.0 || self.noise.stddev < 0.0 {
            return Err(Error::Config(
                "device.simulation speed_per_unit and noise.stddev must be >= 0".to_string(),
            ));
        }
        if self.reflectance_peak < self.reflectance_background {
            return Err(Error::Config(format!(
                "device.simulation.reflectance_peak ({}) below background ({})",
                self.reflectance_peak, self.reflectance_background
            )));
        }
        Ok(())
    }
}
