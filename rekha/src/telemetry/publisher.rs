//! Best-effort diagnostic publisher
//!
//! The control loop hands each [`TickReport`] to a bounded crossbeam channel
//! with `try_send`. When the queue is full the report is dropped and counted;
//! the tick never waits on telemetry. A dedicated thread drains the queue and
//! writes one text line per report:
//!
//! | Output | Mechanism |
//! |--------|-----------|
//! | `log` | `info` on target `rekha::telemetry` |
//! | `udp` | One datagram per line, unicast, fire-and-forget |

use super::report::TickReport;
use crate::error::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// How long the publisher waits for a report before re-checking the running flag
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Create the telemetry queue
pub fn channel(depth: usize) -> (TelemetrySender, Receiver<TickReport>) {
    let (tx, rx) = bounded(depth);
    (
        TelemetrySender {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        },
        rx,
    )
}

/// Non-blocking producer side of the telemetry queue
#[derive(Clone)]
pub struct TelemetrySender {
    tx: Sender<TickReport>,
    dropped: Arc<AtomicU64>,
}

impl TelemetrySender {
    /// Queue a report, dropping it if the publisher is behind or gone
    pub fn emit(&self, report: TickReport) {
        match self.tx.try_send(report) {
            Ok(()) => {}
            Err(TrySendError::Full(report)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::trace!("Telemetry queue full, dropped tick {}", report.tick);
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Reports dropped so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Destination for telemetry lines
pub enum TelemetryWriter {
    Log,
    Udp { socket: UdpSocket, target: SocketAddr },
}

impl TelemetryWriter {
    /// Unicast UDP writer bound to an ephemeral local port
    pub fn udp(target: SocketAddr) -> Result<Self> {
        let bind_addr = if target.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(bind_addr)?;
        Ok(TelemetryWriter::Udp { socket, target })
    }

    fn write(&self, line: &str) {
        match self {
            TelemetryWriter::Log => log::info!(target: "rekha::telemetry", "{}", line),
            TelemetryWriter::Udp { socket, target } => {
                // Send errors are not fatal - just log and continue
                if let Err(e) = socket.send_to(line.as_bytes(), target) {
                    log::warn!("Telemetry send to {} failed: {}", target, e);
                }
            }
        }
    }
}

/// Drains the telemetry queue on its own thread
pub struct TelemetryPublisher {
    rx: Receiver<TickReport>,
    writer: TelemetryWriter,
    running: Arc<AtomicBool>,
}

impl TelemetryPublisher {
    pub fn new(rx: Receiver<TickReport>, writer: TelemetryWriter, running: Arc<AtomicBool>) -> Self {
        Self {
            rx,
            writer,
            running,
        }
    }

    /// Publish until shutdown or until every sender is dropped.
    ///
    /// Returns the number of lines written.
    pub fn run(&mut self) -> u64 {
        log::info!("Telemetry publisher started");
        let mut published = 0u64;

        while self.running.load(Ordering::Relaxed) {
            match self.rx.recv_timeout(POLL_INTERVAL) {
                Ok(report) => {
                    self.writer.write(&report.to_string());
                    published += 1;
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        // Flush whatever is already queued
        for report in self.rx.try_iter() {
            self.writer.write(&report.to_string());
            published += 1;
        }

        log::info!("Telemetry publisher exiting ({} lines)", published);
        published
    }
}
