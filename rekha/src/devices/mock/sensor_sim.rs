//! Reflectance sensor bar simulation
//!
//! Sensor `i` sits at `x_i = (i - (N-1)/2) · spacing` across the bar, index 0
//! on the left. Each reading follows a Gaussian profile around the line:
//!
//! ```text
//! raw_i = background + (peak - background) · exp(-(x_i - d)² / 2σ²) + noise
//! ```
//!
//! then clamped to `[0, adc_max]`.

use super::config::SimulationConfig;
use super::noise::ReadingNoise;
use crate::core::types::SensorFrame;

/// Generates sensor frames from the line offset under the bar
pub struct ReflectanceSimulator {
    positions: Vec<f32>,
    two_sigma_sq: f32,
    peak: f32,
    background: f32,
    adc_max: f32,
    noise: ReadingNoise,
}

impl ReflectanceSimulator {
    pub fn new(config: &SimulationConfig, count: usize, adc_max: u16) -> Self {
        let center = count.saturating_sub(1) as f32 / 2.0;
        let positions = (0..count)
            .map(|i| (i as f32 - center) * config.sensor_spacing)
            .collect();

        Self {
            positions,
            two_sigma_sq: 2.0 * config.line_sigma * config.line_sigma,
            peak: config.reflectance_peak,
            background: config.reflectance_background,
            adc_max: adc_max as f32,
            noise: ReadingNoise::new(&config.noise, config.random_seed),
        }
    }

    /// Read every sensor with the line `line_offset` meters right of the bar center
    pub fn read(&mut self, line_offset: f32) -> SensorFrame {
        let values = self
            .positions
            .iter()
            .map(|&x| {
                let d = x - line_offset;
                let ideal =
                    self.background + (self.peak - self.background) * (-d * d / self.two_sigma_sq).exp();
                let raw = ideal + self.noise.sample();
                raw.clamp(0.0, self.adc_max) as u16
            })
            .collect::<Vec<u16>>();

        SensorFrame::new(values)
    }
}
