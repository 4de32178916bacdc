//! Pin addressing
//!
//! Pins are named the AVR way: an I/O port letter plus a bit number within
//! that port's `DDRx`/`PORTx`/`PINx` registers. `PD7` is bit 7 of port D.

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};

/// I/O port of the programmer MCU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Port {
    /// Port B
    B,
    /// Port C
    C,
    /// Port D
    D,
}

impl Port {
    /// All ports, in register order
    pub const ALL: [Port; 3] = [Port::B, Port::C, Port::D];

    /// Port letter as used in register names
    pub const fn letter(self) -> char {
        match self {
            Port::B => 'B',
            Port::C => 'C',
            Port::D => 'D',
        }
    }

    /// Index into per-port register arrays
    pub const fn index(self) -> usize {
        match self {
            Port::B => 0,
            Port::C => 1,
            Port::D => 2,
        }
    }
}

/// A single pin: port plus bit position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pin {
    /// Port the pin belongs to
    pub port: Port,
    /// Bit within the port registers (0..=7)
    pub bit: u8,
}

impl Pin {
    /// Create a pin, rejecting bit numbers outside the 8-bit port
    pub const fn new(port: Port, bit: u8) -> Result<Self> {
        if bit > 7 {
            return Err(Error::InvalidPin { bit });
        }
        Ok(Self { port, bit })
    }

    /// Create a pin from trusted constants
    ///
    /// Fails const evaluation for a bit number above 7.
    pub const fn at(port: Port, bit: u8) -> Self {
        match Self::new(port, bit) {
            Ok(pin) => pin,
            Err(_) => panic!("pin bit out of range"),
        }
    }

    /// Register mask, `1 << bit`
    pub const fn mask(self) -> u8 {
        1 << self.bit
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{}", self.port.letter(), self.bit)
    }
}

impl FromStr for Pin {
    type Err = Error;

    /// Parse `PD7`, `pd7` or `D7`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let s = s
            .strip_prefix('P')
            .or_else(|| s.strip_prefix('p'))
            .unwrap_or(s);

        let mut chars = s.chars();
        let port = match chars.next() {
            Some('B' | 'b') => Port::B,
            Some('C' | 'c') => Port::C,
            Some('D' | 'd') => Port::D,
            _ => return Err(Error::InvalidPinName),
        };
        // Exactly one digit; `Pin::new` rejects 8 and 9
        let bit = match chars.as_str().as_bytes() {
            [digit @ b'0'..=b'9'] => digit - b'0',
            _ => return Err(Error::InvalidPinName),
        };
        Pin::new(port, bit)
    }
}

#[cfg(feature = "std")]
impl serde::Serialize for Pin {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "std")]
impl<'de> serde::Deserialize<'de> for Pin {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        use serde::de::Error as _;
        let s = <std::string::String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Electrical level of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
pub enum Level {
    /// 0 V
    Low,
    /// VCC
    High,
}

impl Level {
    /// The opposite level
    pub const fn inverted(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }

    /// `true` for [`Level::High`]
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    /// Level for a register bit value
    pub const fn from_bit(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => write!(f, "low"),
            Level::High => write!(f, "high"),
        }
    }
}

/// Data direction of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// High impedance input (`DDRx` bit cleared)
    Input,
    /// Push-pull output (`DDRx` bit set)
    Output,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(Pin::at(Port::D, 7).mask(), 0x80);
        assert_eq!(Pin::at(Port::B, 0).mask(), 0x01);
    }

    #[test]
    fn test_parse_pin() {
        assert_eq!("PD7".parse::<Pin>().unwrap(), Pin::at(Port::D, 7));
        assert_eq!("pb5".parse::<Pin>().unwrap(), Pin::at(Port::B, 5));
        assert_eq!("C6".parse::<Pin>().unwrap(), Pin::at(Port::C, 6));
        assert_eq!("PD8".parse::<Pin>(), Err(Error::InvalidPin { bit: 8 }));
        assert_eq!("PA1".parse::<Pin>(), Err(Error::InvalidPinName));
        assert_eq!("PD".parse::<Pin>(), Err(Error::InvalidPinName));
    }

    #[test]
    fn test_parse_pin_single_digit() {
        for name in ["PD+5", "PD07", "PD 7", "PD10", "PD-1", "PD7x"] {
            assert_eq!(name.parse::<Pin>(), Err(Error::InvalidPinName), "{}", name);
        }
        assert_eq!("PD9".parse::<Pin>(), Err(Error::InvalidPin { bit: 9 }));
        assert_eq!(" PB0 ".parse::<Pin>().unwrap(), Pin::at(Port::B, 0));
    }

    #[test]
    fn test_invalid_bit() {
        assert_eq!(Pin::new(Port::B, 8), Err(Error::InvalidPin { bit: 8 }));
    }
}
