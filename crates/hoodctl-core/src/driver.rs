//! Hardware access traits
//!
//! The controller never touches registers itself. It talks to a
//! [`PinDriver`] for pin direction and level, and to a [`DelayUs`] for the
//! software reset pulse.
//!
//! ## Contract
//!
//! Both traits are infallible. A write takes effect before the method
//! returns, there is no buffering. Backends that can fail (a Linux GPIO
//! chip, for instance) log the failure and carry on, the same way the
//! register writes on the programmer MCU cannot report anything either.
//!
//! ## Example: register backed driver
//!
//! ```ignore
//! impl PinDriver for AvrPorts {
//!     fn set_direction(&mut self, pin: Pin, direction: Direction) {
//!         let ddr = self.ddr(pin.port);
//!         match direction {
//!             Direction::Output => ddr.modify(|v| v | pin.mask()),
//!             Direction::Input => ddr.modify(|v| v & !pin.mask()),
//!         }
//!     }
//!     // ...
//! }
//! ```

use crate::pin::{Direction, Level, Pin};

/// Raw pin access on the programmer MCU
///
/// On AVR this maps one-to-one onto the `DDRx`, `PORTx` and `PINx`
/// registers. Writing a level to an input pin selects the pull-up
/// (`High`) or plain high impedance (`Low`), as the hardware does.
pub trait PinDriver {
    /// Select input or output for a pin (`DDRx`)
    fn set_direction(&mut self, pin: Pin, direction: Direction);

    /// Set the output latch of a pin (`PORTx`)
    fn write(&mut self, pin: Pin, level: Level);

    /// Sample the current level on a pin (`PINx`)
    fn read(&self, pin: Pin) -> Level;
}

/// Blocking microsecond delay
///
/// Implementations busy-wait. Sleeping is acceptable only where the
/// scheduler granularity keeps the total well under the 500 us upper bound
/// of the software reset pulse.
pub trait DelayUs {
    /// Block for at least `us` microseconds
    fn delay_us(&mut self, us: u32);
}

impl<T: PinDriver + ?Sized> PinDriver for &mut T {
    fn set_direction(&mut self, pin: Pin, direction: Direction) {
        (**self).set_direction(pin, direction)
    }

    fn write(&mut self, pin: Pin, level: Level) {
        (**self).write(pin, level)
    }

    fn read(&self, pin: Pin) -> Level {
        (**self).read(pin)
    }
}

impl<T: DelayUs + ?Sized> DelayUs for &mut T {
    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
