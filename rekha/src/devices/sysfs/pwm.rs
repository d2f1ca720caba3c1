//! Drive motors through Linux sysfs PWM channels
//!
//! Each motor is one `<pwm_chip>/pwm<n>` directory:
//!
//! | Attribute | Written |
//! |-----------|---------|
//! | `<chip>/export` | Once, only if `pwm<n>` is missing |
//! | `period` | Once at open |
//! | `duty_cycle` | Every command (nanoseconds) |
//! | `enable` | `1` at open, `0` on drop |

use crate::core::driver::MotorSink;
use crate::core::types::MotorCommand;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

fn write_attr(path: &Path, value: impl std::fmt::Display) -> Result<()> {
    fs::write(path, value.to_string()).map_err(|e| {
        Error::Device(format!("Failed to write {}: {}", path.display(), e))
    })
}

/// One exported PWM channel
pub struct PwmChannel {
    dir: PathBuf,
}

impl PwmChannel {
    /// Export (if needed), configure and enable a channel with zero duty
    pub fn open(chip: &Path, channel: u32, period_ns: u64) -> Result<Self> {
        let dir = chip.join(format!("pwm{}", channel));
        if !dir.exists() {
            log::debug!("Exporting PWM channel {} on {}", channel, chip.display());
            write_attr(&chip.join("export"), channel)?;
            if !dir.exists() {
                return Err(Error::Device(format!(
                    "{} did not appear after export",
                    dir.display()
                )));
            }
        }

        // Duty must never exceed the period, so clear it before changing the period
        write_attr(&dir.join("duty_cycle"), 0)?;
        write_attr(&dir.join("period"), period_ns)?;
        write_attr(&dir.join("enable"), 1)?;

        Ok(Self { dir })
    }

    pub fn set_duty_ns(&mut self, duty_ns: u64) -> Result<()> {
        write_attr(&self.dir.join("duty_cycle"), duty_ns)
    }

    fn disable(&mut self) -> Result<()> {
        write_attr(&self.dir.join("duty_cycle"), 0)?;
        write_attr(&self.dir.join("enable"), 0)
    }
}

impl Drop for PwmChannel {
    fn drop(&mut self) {
        if let Err(e) = self.disable() {
            log::warn!("Failed to disable {}: {}", self.dir.display(), e);
        }
    }
}

/// Per-side calibration from drive strength to duty cycle
#[derive(Debug, Clone, Copy)]
pub struct DutyScale {
    /// Controller's `max_speed`: strength that maps to the side maximum
    pub max_speed: u16,
    pub left_max: u16,
    pub right_max: u16,
    pub full_scale: u16,
    pub period_ns: u64,
}

impl DutyScale {
    /// Strength `s` becomes `s * side_max / max_speed` PWM units,
    /// then `units * period_ns / full_scale` nanoseconds.
    pub fn duty_ns(&self, strength: u16, side_max: u16) -> u64 {
        let units = (strength.min(self.max_speed) as u64 * side_max as u64)
            / self.max_speed.max(1) as u64;
        let units = units.min(self.full_scale as u64);
        // units <= full_scale, so the quotient never exceeds period_ns
        let duty = units as u128 * self.period_ns as u128 / self.full_scale.max(1) as u128;
        u64::try_from(duty).unwrap_or(self.period_ns)
    }
}

/// Left/right motor pair
pub struct PwmMotors {
    left: PwmChannel,
    right: PwmChannel,
    scale: DutyScale,
}

impl PwmMotors {
    pub fn new(left: PwmChannel, right: PwmChannel, scale: DutyScale) -> Self {
        Self { left, right, scale }
    }
}

impl MotorSink for PwmMotors {
    fn drive(&mut self, cmd: MotorCommand) -> Result<()> {
        let left = self.scale.duty_ns(cmd.left, self.scale.left_max);
        let right = self.scale.duty_ns(cmd.right, self.scale.right_max);
        self.left.set_duty_ns(left)?;
        self.right.set_duty_ns(right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_chip(channels: &[u32]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for ch in channels {
            fs::create_dir(dir.path().join(format!("pwm{}", ch))).unwrap();
        }
        dir
    }

    fn read(path: PathBuf) -> String {
        fs::read_to_string(path).unwrap()
    }

    fn scale() -> DutyScale {
        DutyScale {
            max_speed: 240,
            left_max: 220,
            right_max: 210,
            full_scale: 255,
            period_ns: 1_000_000,
        }
    }

    #[test]
    fn test_duty_scaling() {
        let s = scale();
        assert_eq!(s.duty_ns(0, 220), 0);
        // 240 -> 220 units -> 220/255 of the period
        assert_eq!(s.duty_ns(240, 220), 862_745);
        assert_eq!(s.duty_ns(240, 210), 823_529);
        // 175 -> 160 units
        assert_eq!(s.duty_ns(175, 220), 627_450);
    }

    #[test]
    fn test_duty_never_exceeds_period() {
        let s = DutyScale {
            left_max: 255,
            ..scale()
        };
        assert_eq!(s.duty_ns(u16::MAX, 255), 1_000_000);
    }

    #[test]
    fn test_long_period_does_not_overflow() {
        let s = DutyScale {
            period_ns: u64::MAX / 100,
            ..scale()
        };
        assert_eq!(s.duty_ns(240, 255), u64::MAX / 100);
        assert!(s.duty_ns(240, 220) < s.period_ns);
    }

    #[test]
    fn test_open_configures_channel() {
        let chip = fake_chip(&[0]);
        let channel = PwmChannel::open(chip.path(), 0, 1_000_000).unwrap();
        let dir = chip.path().join("pwm0");
        assert_eq!(read(dir.join("period")), "1000000");
        assert_eq!(read(dir.join("duty_cycle")), "0");
        assert_eq!(read(dir.join("enable")), "1");

        drop(channel);
        assert_eq!(read(dir.join("enable")), "0");
    }

    #[test]
    fn test_missing_channel_is_exported() {
        let chip = fake_chip(&[]);
        // Nothing creates the directory here, so open reports it
        let err = PwmChannel::open(chip.path(), 3, 1_000_000).err().unwrap();
        assert!(matches!(err, Error::Device(msg) if msg.contains("pwm3")));
        assert_eq!(read(chip.path().join("export")), "3");
    }

    #[test]
    fn test_motors_write_scaled_duty() {
        let chip = fake_chip(&[0, 1]);
        let left = PwmChannel::open(chip.path(), 0, 1_000_000).unwrap();
        let right = PwmChannel::open(chip.path(), 1, 1_000_000).unwrap();
        let mut motors = PwmMotors::new(left, right, scale());

        motors.drive(MotorCommand::new(240, 240)).unwrap();
        assert_eq!(read(chip.path().join("pwm0/duty_cycle")), "862745");
        assert_eq!(read(chip.path().join("pwm1/duty_cycle")), "823529");

        motors.stop().unwrap();
        assert_eq!(read(chip.path().join("pwm0/duty_cycle")), "0");
        assert_eq!(read(chip.path().join("pwm1/duty_cycle")), "0");
    }
}
