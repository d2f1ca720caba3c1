//! Optional per-tick diagnostic dump
//!
//! One line per tick with the raw frame, the estimate, the PID terms and both
//! wheel strengths. Delivery is best effort and never slows the control loop.

mod publisher;
mod report;

pub use publisher::{TelemetryPublisher, TelemetrySender, TelemetryWriter, channel};
pub use report::TickReport;
