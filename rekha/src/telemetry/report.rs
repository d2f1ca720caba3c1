//! Per-tick diagnostic record

use crate::control::pid::PidOutput;
use crate::core::types::{LineEstimate, Position};
use std::fmt;

/// Snapshot of one control tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Tick counter since startup
    pub tick: u64,
    /// Raw readings that fed the estimate
    pub frame: Vec<u16>,
    pub position: Position,
    pub on_track: bool,
    pub error: i32,
    pub pid: i32,
    pub left: u16,
    pub right: u16,
}

impl TickReport {
    /// Assemble a report from the stages of one tick
    pub fn new(tick: u64, frame: Vec<u16>, estimate: LineEstimate, output: &PidOutput) -> Self {
        Self {
            tick,
            frame,
            position: estimate.position,
            on_track: estimate.on_track,
            error: output.error,
            pid: output.pid,
            left: output.command.left,
            right: output.command.right,
        }
    }
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick={} frame=[", self.tick)?;
        for (i, value) in self.frame.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(
            f,
            "] position={} on_track={} error={} pid={} left={} right={}",
            self.position, self.on_track, self.error, self.pid, self.left, self.right
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MotorCommand;

    #[test]
    fn test_display_line() {
        let output = PidOutput {
            error: -500,
            integral: -500,
            pid: -25,
            command: MotorCommand::new(150, 200),
        };
        let estimate = LineEstimate {
            position: 2000,
            on_track: true,
        };
        let report = TickReport::new(7, vec![0, 120, 800, 90, 0, 0], estimate, &output);
        assert_eq!(
            report.to_string(),
            "tick=7 frame=[0 120 800 90 0 0] position=2000 on_track=true error=-500 pid=-25 left=150 right=200"
        );
    }
}
