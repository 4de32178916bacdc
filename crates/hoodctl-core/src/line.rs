//! Control line model
//!
//! A [`ControlLine`] binds one logical signal to a pin together with its
//! polarity and idle behaviour. Asserting and releasing a line is all the
//! controller asks of it; which level that means, and whether releasing
//! drives the pin or lets go of it, is decided here.
//!
//! ## Idle behaviour
//!
//! | Idle | Released | Asserted |
//! |------|----------|----------|
//! | [`IdleBehavior::DrivenInactive`] | output, inactive level | output, active level |
//! | [`IdleBehavior::HighImpedance`] | input, pull-up off | output, active level |
//!
//! A high impedance `/RESET` leaves the target's own pull-up and reset
//! button in charge while the programmer is idle.

use core::fmt;

use bitflags::bitflags;

use crate::driver::PinDriver;
use crate::pin::{Direction, Level, Pin};

/// Logical identity of a control line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineId {
    /// Target `/RESET`
    Reset,
    /// Target erase input
    Erase,
    /// Target power switch
    VccEnable,
}

impl LineId {
    /// Short name used in logs and listings
    pub const fn name(self) -> &'static str {
        match self {
            LineId::Reset => "RESET",
            LineId::Erase => "ERASE",
            LineId::VccEnable => "VCCEN",
        }
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which level means "asserted"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "kebab-case"))]
pub enum Polarity {
    /// Asserted at 0 V
    ActiveLow,
    /// Asserted at VCC
    ActiveHigh,
}

impl Polarity {
    /// Polarity from an "active high" flag
    pub const fn from_active_high(active_high: bool) -> Self {
        if active_high {
            Polarity::ActiveHigh
        } else {
            Polarity::ActiveLow
        }
    }

    /// Level that asserts the line
    pub const fn active_level(self) -> Level {
        match self {
            Polarity::ActiveLow => Level::Low,
            Polarity::ActiveHigh => Level::High,
        }
    }

    /// Level that de-asserts the line
    pub const fn inactive_level(self) -> Level {
        self.active_level().inverted()
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::ActiveLow => write!(f, "active-low"),
            Polarity::ActiveHigh => write!(f, "active-high"),
        }
    }
}

/// What a released line looks like electrically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "kebab-case"))]
pub enum IdleBehavior {
    /// Output driving the inactive level
    DrivenInactive,
    /// Input without internal pull-up, an external pull-up holds the line
    HighImpedance,
}

impl fmt::Display for IdleBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdleBehavior::DrivenInactive => write!(f, "driven"),
            IdleBehavior::HighImpedance => write!(f, "hi-z"),
        }
    }
}

/// One control line to the target MCU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlLine {
    /// Logical identity
    pub id: LineId,
    /// Pin on the programmer MCU
    pub pin: Pin,
    /// Active polarity
    pub polarity: Polarity,
    /// Released state
    pub idle: IdleBehavior,
}

impl ControlLine {
    /// Create a line description
    pub const fn new(id: LineId, pin: Pin, polarity: Polarity, idle: IdleBehavior) -> Self {
        Self {
            id,
            pin,
            polarity,
            idle,
        }
    }

    /// Assert or release the line
    pub fn set<D: PinDriver + ?Sized>(&self, pins: &mut D, asserted: bool) {
        if asserted {
            self.assert(pins);
        } else {
            self.release(pins);
        }
    }

    /// Drive the active level
    pub fn assert<D: PinDriver + ?Sized>(&self, pins: &mut D) {
        log::trace!("{} ({}): assert", self.id, self.pin);
        // Latch first so the pin never drives the wrong level when it
        // switches to output.
        pins.write(self.pin, self.polarity.active_level());
        pins.set_direction(self.pin, Direction::Output);
    }

    /// Return to the idle behaviour
    pub fn release<D: PinDriver + ?Sized>(&self, pins: &mut D) {
        log::trace!("{} ({}): release ({})", self.id, self.pin, self.idle);
        match self.idle {
            IdleBehavior::DrivenInactive => {
                pins.write(self.pin, self.polarity.inactive_level());
                pins.set_direction(self.pin, Direction::Output);
            }
            IdleBehavior::HighImpedance => {
                pins.set_direction(self.pin, Direction::Input);
                pins.write(self.pin, Level::Low);
            }
        }
    }

    /// Whether the pin currently reads as asserted
    pub fn is_asserted<D: PinDriver + ?Sized>(&self, pins: &D) -> bool {
        pins.read(self.pin) == self.polarity.active_level()
    }
}

/// Auto reset enable input
///
/// A jumper (or an RTS derived signal) that must read [`permit_level`]
/// for software reset and erase requests to have any effect. Manual reset
/// with the board's button is not affected.
///
/// [`permit_level`]: AutoResetGate::permit_level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoResetGate {
    /// Sense pin on the programmer MCU
    pub pin: Pin,
    /// Level that permits auto reset
    pub permit_level: Level,
    /// Enable the internal pull-up on the sense pin
    pub pull_up: bool,
}

impl AutoResetGate {
    /// Gate that permits while the pin reads high, externally pulled
    pub const fn new(pin: Pin) -> Self {
        Self {
            pin,
            permit_level: Level::High,
            pull_up: false,
        }
    }

    /// Configure the sense pin as an input
    pub fn init<D: PinDriver + ?Sized>(&self, pins: &mut D) {
        pins.set_direction(self.pin, Direction::Input);
        pins.write(self.pin, Level::from_bit(self.pull_up));
    }

    /// Sample the gate; never cached
    pub fn permits<D: PinDriver + ?Sized>(&self, pins: &D) -> bool {
        pins.read(self.pin) == self.permit_level
    }
}

bitflags! {
    /// Set of control lines a board has wired
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Lines: u8 {
        /// Target `/RESET`
        const RESET          = 1 << 0;
        /// Target erase input
        const ERASE          = 1 << 1;
        /// Target power switch
        const VCC_ENABLE     = 1 << 2;
        /// Auto reset enable input
        const AUTORESET_GATE = 1 << 3;
    }
}

impl Default for Lines {
    fn default() -> Self {
        Lines::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::Port;

    /// Register image of a single port
    #[derive(Default)]
    struct Regs {
        ddr: u8,
        port: u8,
        pin: u8,
    }

    impl PinDriver for Regs {
        fn set_direction(&mut self, pin: Pin, direction: Direction) {
            match direction {
                Direction::Output => self.ddr |= pin.mask(),
                Direction::Input => self.ddr &= !pin.mask(),
            }
        }

        fn write(&mut self, pin: Pin, level: Level) {
            match level {
                Level::High => self.port |= pin.mask(),
                Level::Low => self.port &= !pin.mask(),
            }
        }

        fn read(&self, pin: Pin) -> Level {
            Level::from_bit(self.pin & pin.mask() != 0)
        }
    }

    const PD7: Pin = Pin::at(Port::D, 7);

    #[test]
    fn test_polarity_levels() {
        assert_eq!(Polarity::ActiveLow.active_level(), Level::Low);
        assert_eq!(Polarity::ActiveLow.inactive_level(), Level::High);
        assert_eq!(Polarity::ActiveHigh.active_level(), Level::High);
        assert_eq!(Polarity::ActiveHigh.inactive_level(), Level::Low);
        assert_eq!(Polarity::from_active_high(false), Polarity::ActiveLow);
    }

    #[test]
    fn test_driven_line() {
        let line = ControlLine::new(
            LineId::Reset,
            PD7,
            Polarity::ActiveLow,
            IdleBehavior::DrivenInactive,
        );
        let mut regs = Regs::default();

        line.release(&mut regs);
        assert_eq!(regs.ddr, 0x80);
        assert_eq!(regs.port, 0x80);

        line.assert(&mut regs);
        assert_eq!(regs.ddr, 0x80);
        assert_eq!(regs.port, 0x00);
    }

    #[test]
    fn test_high_impedance_line() {
        let line = ControlLine::new(
            LineId::Reset,
            PD7,
            Polarity::ActiveLow,
            IdleBehavior::HighImpedance,
        );
        let mut regs = Regs {
            ddr: 0x01,
            port: 0x01,
            pin: 0,
        };

        line.assert(&mut regs);
        assert_eq!(regs.ddr, 0x81);
        assert_eq!(regs.port, 0x01);

        line.release(&mut regs);
        // Input without pull-up, other bits untouched
        assert_eq!(regs.ddr, 0x01);
        assert_eq!(regs.port, 0x01);
    }

    #[test]
    fn test_active_high_line() {
        let pb5 = Pin::at(Port::B, 5);
        let line = ControlLine::new(
            LineId::VccEnable,
            pb5,
            Polarity::ActiveHigh,
            IdleBehavior::DrivenInactive,
        );
        let mut regs = Regs::default();

        line.set(&mut regs, true);
        assert_eq!(regs.port, 0x20);
        line.set(&mut regs, false);
        assert_eq!(regs.port, 0x00);
        assert_eq!(regs.ddr, 0x20);
    }

    #[test]
    fn test_gate() {
        let gate = AutoResetGate::new(Pin::at(Port::B, 6));
        let mut regs = Regs {
            ddr: 0x40,
            port: 0x40,
            pin: 0,
        };

        gate.init(&mut regs);
        assert_eq!(regs.ddr, 0x00);
        assert_eq!(regs.port, 0x00);
        assert!(!gate.permits(&regs));

        regs.pin = 0x40;
        assert!(gate.permits(&regs));
    }
}
