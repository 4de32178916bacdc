//! Error types for the Linux GPIO backend

use hoodctl_core::LineId;
use thiserror::Error;

/// Linux GPIO backend errors
#[derive(Debug, Error)]
pub enum LinuxGpioError {
    /// Failed to request GPIO lines
    #[error("Failed to request GPIO lines: {0}")]
    LineRequestFailed(#[source] gpiocdev::Error),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Missing required parameter
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// GPIO chip or device not specified
    #[error("No GPIO chip specified. Use dev=/dev/gpiochipN or gpiochip=N")]
    NoDevice,

    /// Invalid GPIO line number
    #[error("Invalid GPIO line number for {name}: {value}")]
    InvalidLineNumber { name: &'static str, value: String },

    /// The board has a control line that no GPIO offset was given for
    #[error("Board has a {} line but no GPIO offset was given for it", .0.name())]
    UnwiredLine(LineId),

    /// The board has an auto reset gate that no GPIO offset was given for
    #[error("Board has an auto reset gate but no GPIO offset was given for it")]
    UnwiredGate,

    /// Two board pins were wired to the same GPIO offset
    #[error("GPIO line {0} is assigned more than once")]
    DuplicateOffset(u32),
}

/// Result type for Linux GPIO operations
pub type Result<T> = std::result::Result<T, LinuxGpioError>;
