//! Board controller
//!
//! [`BoardController`] is what the serial control channel talks to. It
//! owns the pin driver and delay, and turns host requests into line
//! transitions for the configured board:
//!
//! - [`initialize`](BoardController::initialize) once at startup
//! - [`set_reset`](BoardController::set_reset) when the host toggles DTR
//! - [`set_erase`](BoardController::set_erase) when the host toggles RTS
//!
//! None of these can fail. Requests for lines the board does not have are
//! ignored, and so are all reset and erase requests while the auto reset
//! gate is closed.
//!
//! ## Software reset pulse
//!
//! On classic boards with the reset capacitor replaced by a resistor, a
//! DTR edge no longer couples a short pulse into `/RESET`. The controller
//! generates the pulse itself: assert, busy-wait, release, all inside one
//! `set_reset(true)` call. Nothing else runs on the control path during the
//! wait. With the `critical-section` feature the whole pulse also runs with
//! interrupts masked, so USB interrupts cannot stretch it.

use crate::board::BoardConfig;
use crate::driver::{DelayUs, PinDriver};
use crate::line::{ControlLine, Lines};

/// Where the reset line stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetState {
    /// Released, target running
    Inactive,
    /// Held active until `set_reset(false)`
    Asserted,
    /// A software reset pulse was issued and the line is released again
    Pulsed,
}

/// Reset/erase/power controller for one board
pub struct BoardController<P, D> {
    config: BoardConfig,
    pins: P,
    delay: D,
    reset_state: ResetState,
    erase_asserted: bool,
    powered: bool,
}

impl<P: PinDriver, D: DelayUs> BoardController<P, D> {
    /// Create a controller; no pin is touched until [`initialize`]
    ///
    /// [`initialize`]: BoardController::initialize
    pub fn new(config: BoardConfig, pins: P, delay: D) -> Self {
        Self {
            config,
            pins,
            delay,
            reset_state: ResetState::Inactive,
            erase_asserted: false,
            powered: false,
        }
    }

    /// Create a controller for the board selected at build time
    pub fn from_build(pins: P, delay: D) -> Self {
        Self::new(crate::build_config::BUILD_CONFIG, pins, delay)
    }

    /// Put every line into its idle state and switch target power on
    pub fn initialize(&mut self) {
        log::debug!(
            "{}: initializing ({} reset)",
            self.config.board,
            if self.config.software_reset() {
                "software"
            } else {
                "held"
            }
        );

        if let Some(vcc) = self.config.vcc_enable {
            vcc.assert(&mut self.pins);
            self.powered = true;
        }

        self.config.reset.release(&mut self.pins);
        self.reset_state = ResetState::Inactive;

        if let Some(erase) = self.config.erase {
            erase.release(&mut self.pins);
        }
        self.erase_asserted = false;

        if let Some(gate) = self.config.gate {
            gate.init(&mut self.pins);
        }
    }

    /// Assert or release the target reset
    ///
    /// With software reset, `true` emits one pulse of the configured width
    /// and returns with the line released. Otherwise `true` holds the line
    /// until `set_reset(false)`.
    pub fn set_reset(&mut self, reset: bool) {
        if !self.auto_reset_permitted() {
            log::debug!("auto reset disabled, ignoring reset={}", reset);
            return;
        }

        let line = self.config.reset;
        if !reset {
            line.release(&mut self.pins);
            self.reset_state = ResetState::Inactive;
            return;
        }

        match self.config.reset_pulse_us {
            Some(us) => {
                pulse(&line, &mut self.pins, &mut self.delay, us);
                self.reset_state = ResetState::Pulsed;
            }
            None => {
                line.assert(&mut self.pins);
                self.reset_state = ResetState::Asserted;
            }
        }
    }

    /// Assert or release the target erase input, if the board has one
    pub fn set_erase(&mut self, erase: bool) {
        let Some(line) = self.config.erase else {
            log::trace!("{}: no erase line, ignoring erase={}", self.config.board, erase);
            return;
        };

        if !self.auto_reset_permitted() {
            log::debug!("auto reset disabled, ignoring erase={}", erase);
            return;
        }

        line.set(&mut self.pins, erase);
        self.erase_asserted = erase;
    }

    /// Sample the auto reset gate; always permitted without one
    pub fn auto_reset_permitted(&self) -> bool {
        match self.config.gate {
            Some(gate) => gate.permits(&self.pins),
            None => true,
        }
    }
}

impl<P, D> BoardController<P, D> {
    /// Board configuration in use
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Lines the board has wired
    pub fn lines(&self) -> Lines {
        self.config.lines()
    }

    /// Last reset transition
    pub fn reset_state(&self) -> ResetState {
        self.reset_state
    }

    /// Whether the erase line was last asserted
    pub fn erase_asserted(&self) -> bool {
        self.erase_asserted
    }

    /// Whether target power was switched on
    ///
    /// Always `false` for boards without a power switch, where the target is
    /// powered directly.
    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Pin driver
    pub fn pins(&self) -> &P {
        &self.pins
    }

    /// Pin driver, mutably
    pub fn pins_mut(&mut self) -> &mut P {
        &mut self.pins
    }

    /// Tear down and return the pin driver and delay
    pub fn into_parts(self) -> (P, D) {
        (self.pins, self.delay)
    }
}

fn pulse<P: PinDriver, D: DelayUs>(line: &ControlLine, pins: &mut P, delay: &mut D, us: u32) {
    log::trace!("{}: {} us pulse", line.id, us);

    #[cfg(feature = "critical-section")]
    critical_section::with(|_| {
        line.assert(pins);
        delay.delay_us(us);
        line.release(pins);
    });

    #[cfg(not(feature = "critical-section"))]
    {
        line.assert(pins);
        delay.delay_us(us);
        line.release(pins);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardId, BuildOptions, SOFTWARE_RESET_PULSE_US};
    use crate::line::{IdleBehavior, LineId, Polarity};
    use crate::pin::{Direction, Level, Pin, Port};
    use std::vec::Vec;

    /// Register image of ports B, C and D plus externally driven levels
    #[derive(Default, Clone, PartialEq, Debug)]
    struct Ports {
        ddr: [u8; 3],
        port: [u8; 3],
        input: [u8; 3],
    }

    impl PinDriver for Ports {
        fn set_direction(&mut self, pin: Pin, direction: Direction) {
            let ddr = &mut self.ddr[pin.port.index()];
            match direction {
                Direction::Output => *ddr |= pin.mask(),
                Direction::Input => *ddr &= !pin.mask(),
            }
        }

        fn write(&mut self, pin: Pin, level: Level) {
            let port = &mut self.port[pin.port.index()];
            match level {
                Level::High => *port |= pin.mask(),
                Level::Low => *port &= !pin.mask(),
            }
        }

        fn read(&self, pin: Pin) -> Level {
            let i = pin.port.index();
            let driven = self.ddr[i] & pin.mask() != 0;
            let bits = if driven { self.port[i] } else { self.input[i] };
            Level::from_bit(bits & pin.mask() != 0)
        }
    }

    /// Delay that records requests
    #[derive(Default)]
    struct Delays(Vec<u32>);

    impl DelayUs for Delays {
        fn delay_us(&mut self, us: u32) {
            self.0.push(us);
        }
    }

    const PD7: Pin = Pin::at(Port::D, 7);
    const PB5: Pin = Pin::at(Port::B, 5);
    const PB6: Pin = Pin::at(Port::B, 6);

    fn controller(options: BuildOptions) -> BoardController<Ports, Delays> {
        let config = BoardConfig::resolve(options).unwrap();
        BoardController::new(config, Ports::default(), Delays::default())
    }

    fn is_output(ports: &Ports, pin: Pin) -> bool {
        ports.ddr[pin.port.index()] & pin.mask() != 0
    }

    fn latch(ports: &Ports, pin: Pin) -> bool {
        ports.port[pin.port.index()] & pin.mask() != 0
    }

    #[test]
    fn test_classic_initialize() {
        let mut board = controller(BuildOptions::new(BoardId::Uno));
        board.initialize();

        let ports = board.pins();
        // VCCEN driven low (p-channel on)
        assert!(is_output(ports, PB5));
        assert!(!latch(ports, PB5));
        // RESET released to input without pull-up
        assert!(!is_output(ports, PD7));
        assert!(!latch(ports, PD7));
        assert!(board.is_powered());
        assert_eq!(board.reset_state(), ResetState::Inactive);
    }

    #[test]
    fn test_vcc_enable_active_high() {
        let mut board =
            controller(BuildOptions::new(BoardId::Uno).with_vcc_enable_active_high(true));
        board.initialize();
        assert!(is_output(board.pins(), PB5));
        assert!(latch(board.pins(), PB5));
    }

    #[test]
    fn test_software_reset_pulse() {
        let mut board = controller(BuildOptions::new(BoardId::Uno));
        board.initialize();
        let idle = board.pins().clone();

        board.set_reset(true);

        assert_eq!(board.reset_state(), ResetState::Pulsed);
        let (ports, delays) = board.into_parts();
        assert_eq!(delays.0, [SOFTWARE_RESET_PULSE_US]);
        // Released again before returning
        assert_eq!(ports, idle);
    }

    #[test]
    fn test_held_reset() {
        let mut board = controller(BuildOptions::new(BoardId::Uno).with_software_reset(false));
        board.initialize();
        let idle = board.pins().clone();
        assert!(is_output(&idle, PD7));
        assert!(latch(&idle, PD7));

        board.set_reset(true);
        assert_eq!(board.reset_state(), ResetState::Asserted);
        assert!(is_output(board.pins(), PD7));
        assert!(!latch(board.pins(), PD7));

        // Still held after a second request
        board.set_reset(true);
        assert!(!latch(board.pins(), PD7));

        board.set_reset(false);
        assert_eq!(board.pins(), &idle);
        assert_eq!(board.reset_state(), ResetState::Inactive);

        let (_, delays) = board.into_parts();
        assert!(delays.0.is_empty());
    }

    #[test]
    fn test_gate_closed_ignores_requests() {
        let mut board = controller(
            BuildOptions::new(BoardId::Uno)
                .with_software_reset(false)
                .with_auto_reset_gate(true),
        );
        board.initialize();
        assert!(!is_output(board.pins(), PB6));
        let before = board.pins().clone();

        board.set_reset(true);
        board.set_erase(true);

        assert_eq!(board.pins(), &before);
        assert_eq!(board.reset_state(), ResetState::Inactive);
        assert!(!board.auto_reset_permitted());
    }

    #[test]
    fn test_gate_read_on_every_request() {
        let mut board = controller(
            BuildOptions::new(BoardId::Uno)
                .with_software_reset(false)
                .with_auto_reset_gate(true),
        );
        board.initialize();

        board.pins_mut().input[PB6.port.index()] |= PB6.mask();
        board.set_reset(true);
        assert_eq!(board.reset_state(), ResetState::Asserted);

        // Jumper pulled while reset is held: the release is ignored too
        board.pins_mut().input[PB6.port.index()] &= !PB6.mask();
        board.set_reset(false);
        assert_eq!(board.reset_state(), ResetState::Asserted);
        assert!(!latch(board.pins(), PD7));

        board.pins_mut().input[PB6.port.index()] |= PB6.mask();
        board.set_reset(false);
        assert_eq!(board.reset_state(), ResetState::Inactive);
    }

    #[test]
    fn test_erase_line() {
        let pc6 = Pin::at(Port::C, 6);
        let mut config = BoardConfig::resolve(BuildOptions::new(BoardId::Uno)).unwrap();
        config.erase = Some(ControlLine::new(
            LineId::Erase,
            pc6,
            Polarity::ActiveLow,
            IdleBehavior::DrivenInactive,
        ));
        let mut board = BoardController::new(config, Ports::default(), Delays::default());
        board.initialize();
        assert!(is_output(board.pins(), pc6));
        assert!(latch(board.pins(), pc6));

        board.set_erase(true);
        assert!(!latch(board.pins(), pc6));
        assert!(board.erase_asserted());

        board.set_erase(false);
        assert!(latch(board.pins(), pc6));
        assert!(!board.erase_asserted());
    }

    #[test]
    fn test_erase_without_line() {
        let mut board = controller(BuildOptions::new(BoardId::Leonardo));
        board.initialize();
        let before = board.pins().clone();

        board.set_erase(true);

        assert_eq!(board.pins(), &before);
        assert!(!board.erase_asserted());
        assert!(!board.is_powered());
    }
}
