//! Error types shared by the codec, the device layer and the orchestrators.

use std::time::Duration;

use crate::config::ConfigError;

/// Result type for top-level pyramid operations
pub type PyramidResult<T> = Result<T, PyramidError>;

/// Result type for device channel operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors raised while talking to the reader hardware (or its agent).
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Timeout after {}ms waiting for response to request #{seq}", timeout.as_millis())]
    Timeout { seq: u32, timeout: Duration },

    #[error("Unexpected response to request #{seq}: {response}")]
    UnexpectedResponse { seq: u32, response: String },

    #[error("Device rejected request #{seq}: {message}")]
    Rejected { seq: u32, message: String },

    #[error("Device disconnected")]
    Disconnected,
}

/// Errors surfaced to the caller of `clone`, `sim` and `read`.
#[derive(Debug, thiserror::Error)]
pub enum PyramidError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Device did not respond during write of block {block} (timeout {timeout_ms}ms)")]
    DeviceTimeout { block: u8, timeout_ms: u64 },

    /// Reserved for stricter input validation. Inputs are currently normalized
    /// by truncation, so nothing in the codec produces this variant.
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("'{command}' is not implemented for Farpointe/Pyramid tags")]
    NotImplemented { command: &'static str },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PyramidError {
    /// Process exit code for this error.
    ///
    /// A write that is never acknowledged maps to `-1`, distinct from usage
    /// failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            PyramidError::Usage(_) | PyramidError::Config(_) | PyramidError::Encoding(_) => 1,
            PyramidError::DeviceTimeout { .. } => -1,
            PyramidError::Device(_) => -2,
            PyramidError::NotImplemented { .. } => 3,
        }
    }
}
