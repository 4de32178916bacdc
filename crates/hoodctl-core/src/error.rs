//! Error types for hoodctl-core
//!
//! Every error here is a configuration error. Resolving a board
//! configuration can fail; driving the lines of a resolved configuration
//! cannot.

use core::fmt;

use crate::board::BoardId;
use crate::pin::Pin;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Board has no usable control line mapping
    UnsupportedBoard(BoardId),
    /// Board name not in the catalogue
    UnknownBoard,
    /// Pin bit number outside the 8-bit port
    InvalidPin {
        /// The offending bit number
        bit: u8,
    },
    /// Pin name could not be parsed
    InvalidPinName,
    /// Two lines are wired to the same pin
    PinConflict(Pin),
    /// Software reset pulse width outside the range that reliably resets
    PulseOutOfRange {
        /// Requested width in microseconds
        us: u32,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedBoard(board) => write!(
                f,
                "{} is not supported: its reset mechanism is incompatible",
                board.name()
            ),
            Self::UnknownBoard => write!(f, "unknown board name"),
            Self::InvalidPin { bit } => write!(f, "pin bit {} out of range (0-7)", bit),
            Self::InvalidPinName => write!(f, "invalid pin name, expected e.g. PD7"),
            Self::PinConflict(pin) => write!(f, "pin {} is assigned to more than one line", pin),
            Self::PulseOutOfRange { us } => write!(
                f,
                "reset pulse of {} us out of range ({}-{} us)",
                us,
                crate::board::MIN_RESET_PULSE_US,
                crate::board::MAX_RESET_PULSE_US
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
