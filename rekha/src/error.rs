//! Error types for Rekha

use std::path::PathBuf;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Rekha error types
///
/// The control core (estimator and PID law) is total and never produces these;
/// they come from configuration loading and the hardware collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration rejected at load time
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Unknown device type in configuration
    #[error("Unknown device type: {0}")]
    UnknownDevice(String),

    /// Device access failed
    #[error("Device error: {0}")]
    Device(String),

    /// A sensor file held something other than an ADC count
    #[error("Invalid reading {value:?} from {}", path.display())]
    InvalidReading {
        /// File the reading came from
        path: PathBuf,
        /// Raw contents
        value: String,
    },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
