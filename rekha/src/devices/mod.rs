//! Device implementations

#[cfg(feature = "mock")]
pub mod mock;
pub mod sysfs;

use crate::config::Config;
use crate::core::driver::Device;
use crate::error::{Error, Result};

/// Create a device based on configuration
pub fn create_device(config: &Config) -> Result<Device> {
    let name = config.device.name.as_str();
    match config.device.device_type.as_str() {
        #[cfg(feature = "mock")]
        "mock" => {
            let simulation = config.device.simulation.clone().unwrap_or_default();
            Ok(mock::MockDevice::new(&simulation, &config.sensors).into_device(name))
        }
        "sysfs" => {
            let sysfs = config.device.sysfs.as_ref().ok_or_else(|| {
                Error::Config("sysfs device requires a [device.sysfs] section".to_string())
            })?;
            sysfs::create(name, sysfs, &config.sensors, config.pid().max_speed)
        }
        _ => Err(Error::UnknownDevice(config.device.device_type.clone())),
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;

    #[test]
    fn test_creates_mock_device() {
        let config = Config::mock();
        let device = create_device(&config).unwrap();
        assert_eq!(device.name, "Mock line follower");
        assert_eq!(device.sensors.sensor_count(), config.sensors.count);
    }

    #[test]
    fn test_unknown_device_type() {
        let mut config = Config::mock();
        config.device.device_type = "roomba".to_string();
        assert!(matches!(
            create_device(&config),
            Err(Error::UnknownDevice(t)) if t == "roomba"
        ));
    }

    #[test]
    fn test_sysfs_without_section() {
        let mut config = Config::mock();
        config.device.device_type = "sysfs".to_string();
        assert!(matches!(create_device(&config), Err(Error::Config(_))));
    }
}
