//! Rekha - Line follower daemon
//!
//! Loads the configuration, opens the device, then ticks the control loop
//! until Ctrl-C. On shutdown the motors are stopped before the process exits.

use clap::Parser;
use rekha::config::{Config, TelemetryOutput};
use rekha::devices::create_device;
use rekha::error::{Error, Result};
use rekha::telemetry::{self, TelemetryPublisher, TelemetryWriter};
use rekha::ControlLoop;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

const DEFAULT_CONFIG: &str = "/etc/rekha.toml";

/// Closed-loop PID line follower
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(value_name = "CONFIG", conflicts_with = "config")]
    path: Option<PathBuf>,

    /// Configuration file path (alternative to the positional argument)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args
        .config
        .or(args.path)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    let config = Config::load(&config_path)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    if args.check {
        println!("{}: OK", config_path.display());
        return Ok(());
    }

    log::info!("Rekha v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!("Using config: {}", config_path.display());
    log::info!(
        "Device: {} ({})",
        config.device.name,
        config.device.device_type
    );

    let pid = config.pid();
    log::info!(
        "Controller: {:?} kp={} ki={} kd={} base={} max={}",
        config.controller.preset,
        pid.kp,
        pid.ki,
        pid.kd,
        pid.base_speed,
        pid.max_speed
    );

    let device = create_device(&config)?;

    // Set up shutdown signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let mut control = ControlLoop::new(&config, device, Arc::clone(&running))?;

    let publisher_handle = if config.telemetry.enabled {
        let writer = match config.telemetry.output {
            TelemetryOutput::Log => TelemetryWriter::Log,
            TelemetryOutput::Udp => {
                let target = config.telemetry.udp_addr()?;
                log::info!("Telemetry streaming to udp://{}", target);
                TelemetryWriter::udp(target)?
            }
        };
        let (tx, rx) = telemetry::channel(config.telemetry.queue_depth);
        control = control.with_telemetry(tx);

        let publisher_running = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("telemetry".to_string())
            .spawn(move || {
                let mut publisher = TelemetryPublisher::new(rx, writer, publisher_running);
                publisher.run();
            })
            .map_err(|e| Error::Other(format!("Failed to spawn telemetry publisher: {}", e)))?;
        Some(handle)
    } else {
        None
    };

    log::info!("Rekha running. Press Ctrl-C to stop.");
    control.run();

    // Dropping the loop drops the last telemetry sender
    drop(control);
    if let Some(handle) = publisher_handle
        && handle.join().is_err()
    {
        log::error!("Telemetry publisher panicked");
    }

    log::info!("Rekha stopped");
    Ok(())
}
