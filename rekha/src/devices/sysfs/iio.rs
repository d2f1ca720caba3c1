//! Reflectance sensors on Linux IIO ADC channels

use crate::core::driver::SensorSource;
use crate::core::types::SensorFrame;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// One `in_voltage<ch>_raw` attribute per sensor, leftmost first
pub struct IioSensors {
    channels: Vec<PathBuf>,
    adc_max: u16,
}

impl IioSensors {
    pub fn new(iio_device: &Path, channels: &[u32], adc_max: u16) -> Self {
        let channels = channels
            .iter()
            .map(|ch| iio_device.join(format!("in_voltage{}_raw", ch)))
            .collect();
        Self { channels, adc_max }
    }

    fn read_channel(&self, path: &Path) -> Result<u16> {
        let content = fs::read_to_string(path)?;
        let raw: u32 = content.trim().parse().map_err(|_| Error::InvalidReading {
            path: path.to_path_buf(),
            value: content.trim().to_string(),
        })?;
        Ok(raw.min(self.adc_max as u32) as u16)
    }
}

impl SensorSource for IioSensors {
    fn sensor_count(&self) -> usize {
        self.channels.len()
    }

    fn sample(&mut self) -> Result<SensorFrame> {
        let values = self
            .channels
            .iter()
            .map(|path| self.read_channel(path))
            .collect::<Result<Vec<u16>>>()?;
        Ok(SensorFrame::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_adc(values: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (ch, value) in values.iter().enumerate() {
            fs::write(dir.path().join(format!("in_voltage{}_raw", ch)), value).unwrap();
        }
        dir
    }

    #[test]
    fn test_reads_channels_in_order() {
        let dir = fake_adc(&["0\n", "12\n", "800\n", "790\n", "40\n", "3\n"]);
        let mut sensors = IioSensors::new(dir.path(), &[0, 1, 2, 3, 4, 5], 1023);
        assert_eq!(sensors.sensor_count(), 6);
        let frame = sensors.sample().unwrap();
        assert_eq!(frame.values(), &[0, 12, 800, 790, 40, 3]);
    }

    #[test]
    fn test_channel_mapping() {
        let dir = fake_adc(&["10", "20", "30"]);
        let mut sensors = IioSensors::new(dir.path(), &[2, 0], 1023);
        assert_eq!(sensors.sample().unwrap().values(), &[30, 10]);
    }

    #[test]
    fn test_clamps_to_adc_max() {
        let dir = fake_adc(&["4095", "100"]);
        let mut sensors = IioSensors::new(dir.path(), &[0, 1], 1023);
        assert_eq!(sensors.sample().unwrap().values(), &[1023, 100]);
    }

    #[test]
    fn test_garbage_reading_is_an_error() {
        let dir = fake_adc(&["12", "busy"]);
        let mut sensors = IioSensors::new(dir.path(), &[0, 1], 1023);
        match sensors.sample() {
            Err(Error::InvalidReading { path, value }) => {
                assert!(path.ends_with("in_voltage1_raw"));
                assert_eq!(value, "busy");
            }
            other => panic!("expected invalid reading, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_channel_is_io_error() {
        let dir = fake_adc(&["12"]);
        let mut sensors = IioSensors::new(dir.path(), &[0, 7], 1023);
        assert!(matches!(sensors.sample(), Err(Error::Io(_))));
    }
}
