//! Board catalogue and line mapping
//!
//! Each supported board belongs to a [`BoardFamily`], and the family fixes
//! which pins carry which control line. [`BuildOptions`] adds the optional
//! board modifications (software reset resistor, power switch MOSFET,
//! auto reset jumper) and [`BoardConfig::resolve`] turns the pair into the
//! concrete line table the controller works from.
//!
//! Resolution is a `const fn` so the firmware's configuration is checked
//! while compiling, see [`crate::build_config`].
//!
//! ## Families
//!
//! | Family | Boards | RESET | ERASE | VCCEN | Gate |
//! |--------|--------|-------|-------|-------|------|
//! | Classic (8/16/32u2) | Uno, Mega, ADK, LUFA | PD7 | - | PB5 | PB6 |
//! | ATmega32u4 | Leonardo, Micro | PD4 | - | - | PB4 |
//! | Due (16u2) | Due | - | - | - | - |
//!
//! The Due wires `/RESET` to PC7 and `/ERASE` to PC6 of its 16u2, but the
//! SAM3X expects a reset sequence this controller does not implement, so
//! the board is rejected outright.

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};
use crate::line::{AutoResetGate, ControlLine, IdleBehavior, LineId, Lines, Polarity};
use crate::pin::{Pin, Port};

/// Default width of the software reset pulse
///
/// 1, 2, 3, 5, 12, 20, 40, 200 and 500 us all reset an Uno R3 at 16 MHz
/// through the resistor; 800 us and longer did not.
pub const SOFTWARE_RESET_PULSE_US: u32 = 12;

/// Shortest pulse accepted for the software reset
pub const MIN_RESET_PULSE_US: u32 = 1;

/// Longest pulse accepted for the software reset
pub const MAX_RESET_PULSE_US: u32 = 500;

/// Arduino USB vendor ID
pub const ARDUINO_VID: u16 = 0x2341;

/// LUFA/Atmel USB vendor ID
pub const LUFA_VID: u16 = 0x03EB;

/// Electrical family of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardFamily {
    /// 8u2/16u2/32u2 next to a separate main MCU: reset through a
    /// capacitor or the software reset resistor, optional power switch
    Classic,
    /// ATmega32u4 boards: a plain reset line, no erase or power line
    AtMega32u4,
    /// Arduino Due: not supported
    Due,
}

impl fmt::Display for BoardFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardFamily::Classic => write!(f, "classic (8/16/32u2)"),
            BoardFamily::AtMega32u4 => write!(f, "ATmega32u4"),
            BoardFamily::Due => write!(f, "Due"),
        }
    }
}

/// Board identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "kebab-case"))]
pub enum BoardId {
    /// Arduino Uno R3
    Uno,
    /// Arduino Mega 2560 R3
    Mega,
    /// Arduino Mega ADK R3
    MegaAdk,
    /// Arduino Leonardo
    Leonardo,
    /// Arduino Micro
    Micro,
    /// Arduino Due
    Due,
    /// Generic LUFA board with a classic layout
    Lufa,
}

impl BoardId {
    /// All boards in the catalogue
    pub const ALL: [BoardId; 7] = [
        BoardId::Uno,
        BoardId::Mega,
        BoardId::MegaAdk,
        BoardId::Leonardo,
        BoardId::Micro,
        BoardId::Due,
        BoardId::Lufa,
    ];

    /// Short name, as accepted by [`FromStr`]
    pub const fn name(self) -> &'static str {
        match self {
            BoardId::Uno => "uno",
            BoardId::Mega => "mega",
            BoardId::MegaAdk => "mega-adk",
            BoardId::Leonardo => "leonardo",
            BoardId::Micro => "micro",
            BoardId::Due => "due",
            BoardId::Lufa => "lufa",
        }
    }

    /// Electrical family
    pub const fn family(self) -> BoardFamily {
        match self {
            BoardId::Uno | BoardId::Mega | BoardId::MegaAdk | BoardId::Lufa => {
                BoardFamily::Classic
            }
            BoardId::Leonardo | BoardId::Micro => BoardFamily::AtMega32u4,
            BoardId::Due => BoardFamily::Due,
        }
    }

    /// USB vendor ID
    pub const fn vid(self) -> u16 {
        match self {
            BoardId::Lufa => LUFA_VID,
            _ => ARDUINO_VID,
        }
    }

    /// USB product ID
    ///
    /// Leonardo and Micro use their bootloader PIDs, not the sketch ones.
    pub const fn pid(self) -> u16 {
        match self {
            BoardId::Uno => 0x0043,
            BoardId::Mega => 0x0042,
            BoardId::MegaAdk => 0x0044,
            BoardId::Leonardo => 0x0036,
            BoardId::Micro => 0x0037,
            BoardId::Due => 0x003D,
            BoardId::Lufa => 0x204A,
        }
    }

    /// USB product string
    pub const fn product(self) -> &'static str {
        match self {
            BoardId::Uno => "HoodLoader2 Uno",
            BoardId::Mega => "HoodLoader2 Mega",
            BoardId::MegaAdk => "HoodLoader2 ADK",
            BoardId::Leonardo => "HoodLoader2 Leo",
            BoardId::Micro => "HoodLoader2 Micro",
            BoardId::Due => "HoodLoader2 Due",
            BoardId::Lufa => "HoodLoader2 Lufa",
        }
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BoardId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let found = BoardId::ALL
            .iter()
            .copied()
            .find(|b| b.name().eq_ignore_ascii_case(s));
        match found {
            Some(board) => Ok(board),
            None if s.eq_ignore_ascii_case("adk") => Ok(BoardId::MegaAdk),
            None if s.eq_ignore_ascii_case("leo") => Ok(BoardId::Leonardo),
            None => Err(Error::UnknownBoard),
        }
    }
}

/// Build-time board selection and modifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Board the firmware runs on
    pub board: BoardId,
    /// A power switch MOSFET is fitted (classic boards only)
    pub vcc_enable: bool,
    /// The power switch is an n-channel MOSFET, enabled by a high level
    pub vcc_enable_active_high: bool,
    /// The reset capacitor is replaced by a resistor, pulse reset
    /// (classic boards only)
    pub software_reset: bool,
    /// Gate auto reset and erase on the jumper input
    pub auto_reset_gate: bool,
}

impl BuildOptions {
    /// Stock modifications: software reset resistor and p-channel power
    /// switch fitted, no auto reset jumper
    pub const fn new(board: BoardId) -> Self {
        Self {
            board,
            vcc_enable: true,
            vcc_enable_active_high: false,
            software_reset: true,
            auto_reset_gate: false,
        }
    }

    /// Move the modifications over to another board
    pub const fn with_board(mut self, board: BoardId) -> Self {
        self.board = board;
        self
    }

    /// Set whether a power switch is fitted
    pub const fn with_vcc_enable(mut self, fitted: bool) -> Self {
        self.vcc_enable = fitted;
        self
    }

    /// Set the power switch polarity
    pub const fn with_vcc_enable_active_high(mut self, active_high: bool) -> Self {
        self.vcc_enable_active_high = active_high;
        self
    }

    /// Set whether the software reset resistor is fitted
    pub const fn with_software_reset(mut self, enabled: bool) -> Self {
        self.software_reset = enabled;
        self
    }

    /// Set whether the auto reset jumper gates reset and erase
    pub const fn with_auto_reset_gate(mut self, enabled: bool) -> Self {
        self.auto_reset_gate = enabled;
        self
    }
}

/// Resolved control line table for one board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    /// Board identity
    pub board: BoardId,
    /// Target `/RESET`
    pub reset: ControlLine,
    /// Target erase input, if wired
    pub erase: Option<ControlLine>,
    /// Target power switch, if fitted
    pub vcc_enable: Option<ControlLine>,
    /// Auto reset enable input, if used
    pub gate: Option<AutoResetGate>,
    /// Software reset pulse width; `None` holds reset until released
    pub reset_pulse_us: Option<u32>,
}

impl BoardConfig {
    /// Resolve build options into a line table
    ///
    /// Fails with [`Error::UnsupportedBoard`] for the Due.
    pub const fn resolve(options: BuildOptions) -> Result<Self> {
        let config = match options.board.family() {
            BoardFamily::Classic => Self::classic(options),
            BoardFamily::AtMega32u4 => Self::atmega32u4(options),
            BoardFamily::Due => return Err(Error::UnsupportedBoard(options.board)),
        };
        match config.validate() {
            Ok(()) => Ok(config),
            Err(e) => Err(e),
        }
    }

    const fn classic(options: BuildOptions) -> Self {
        // With the resistor the programmer lets go of /RESET between pulses
        // so the reset button keeps working. With the capacitor it must
        // drive high to recharge it for the next falling edge.
        let reset_idle = if options.software_reset {
            IdleBehavior::HighImpedance
        } else {
            IdleBehavior::DrivenInactive
        };

        Self {
            board: options.board,
            reset: ControlLine::new(
                LineId::Reset,
                Pin::at(Port::D, 7),
                Polarity::ActiveLow,
                reset_idle,
            ),
            erase: None,
            vcc_enable: if options.vcc_enable {
                Some(ControlLine::new(
                    LineId::VccEnable,
                    Pin::at(Port::B, 5),
                    Polarity::from_active_high(options.vcc_enable_active_high),
                    IdleBehavior::DrivenInactive,
                ))
            } else {
                None
            },
            gate: if options.auto_reset_gate {
                Some(AutoResetGate::new(Pin::at(Port::B, 6)))
            } else {
                None
            },
            reset_pulse_us: if options.software_reset {
                Some(SOFTWARE_RESET_PULSE_US)
            } else {
                None
            },
        }
    }

    const fn atmega32u4(options: BuildOptions) -> Self {
        Self {
            board: options.board,
            reset: ControlLine::new(
                LineId::Reset,
                Pin::at(Port::D, 4),
                Polarity::ActiveLow,
                IdleBehavior::DrivenInactive,
            ),
            erase: None,
            vcc_enable: None,
            gate: if options.auto_reset_gate {
                Some(AutoResetGate::new(Pin::at(Port::B, 4)))
            } else {
                None
            },
            reset_pulse_us: None,
        }
    }

    /// Check a line table for pin conflicts and pulse range
    pub const fn validate(&self) -> Result<()> {
        if let Some(us) = self.reset_pulse_us {
            if us < MIN_RESET_PULSE_US || us > MAX_RESET_PULSE_US {
                return Err(Error::PulseOutOfRange { us });
            }
        }

        let pins = [
            Some(self.reset.pin),
            match self.erase {
                Some(line) => Some(line.pin),
                None => None,
            },
            match self.vcc_enable {
                Some(line) => Some(line.pin),
                None => None,
            },
            match self.gate {
                Some(gate) => Some(gate.pin),
                None => None,
            },
        ];

        let mut i = 0;
        while i < pins.len() {
            let mut j = i + 1;
            while j < pins.len() {
                if let (Some(a), Some(b)) = (pins[i], pins[j]) {
                    if a.port as u8 == b.port as u8 && a.bit == b.bit {
                        return Err(Error::PinConflict(a));
                    }
                }
                j += 1;
            }
            i += 1;
        }

        Ok(())
    }

    /// Lines this board has wired
    pub fn lines(&self) -> Lines {
        let mut lines = Lines::RESET;
        if self.erase.is_some() {
            lines |= Lines::ERASE;
        }
        if self.vcc_enable.is_some() {
            lines |= Lines::VCC_ENABLE;
        }
        if self.gate.is_some() {
            lines |= Lines::AUTORESET_GATE;
        }
        lines
    }

    /// Whether `set_reset(true)` pulses instead of holding
    pub const fn software_reset(&self) -> bool {
        self.reset_pulse_us.is_some()
    }
}
