//! Error types shared by the sensor, formatter and dispatch layers

/// Errors raised while answering a skill request
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A board sensor or the CPU temperature query could not be read
    #[error("hardware unavailable: {0}")]
    HardwareUnavailable(String),

    /// Templates or internal wiring are inconsistent
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The platform sent an intent with no handler
    #[error("unrecognized intent: {0}")]
    UnrecognizedIntent(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Create a hardware error
pub fn hardware(msg: impl Into<String>) -> Error {
    Error::HardwareUnavailable(msg.into())
}
