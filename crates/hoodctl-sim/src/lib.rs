//! hoodctl-sim - Simulated programmer MCU
//!
//! This crate emulates the I/O ports of a programmer MCU so that board
//! controllers can be exercised without hardware. It keeps the `DDRx` and
//! `PORTx` registers, models what is connected outside the chip (the
//! target's pull-up on `/RESET`, the auto reset jumper), and time-stamps
//! every register write against a virtual microsecond clock.
//!
//! From the trace it can answer what the target would have seen: the
//! level on a pin at any time, and the active pulses on a line with their
//! widths.
//!
//! ```
//! use hoodctl_core::{BoardConfig, BoardController, BoardId, BuildOptions, Level};
//! use hoodctl_sim::{SimClock, SimPorts};
//!
//! let config = BoardConfig::resolve(BuildOptions::new(BoardId::Uno)).unwrap();
//! let clock = SimClock::new();
//! let ports = SimPorts::for_board(&config, clock.clone());
//!
//! let mut board = BoardController::new(config, ports, clock);
//! board.initialize();
//! board.set_reset(true);
//!
//! let pulses = board.pins().pulses(config.reset.pin, Level::Low);
//! assert_eq!(pulses[0].width_us, Some(12));
//! ```

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use hoodctl_core::{BoardConfig, DelayUs, Direction, IdleBehavior, Level, Pin, PinDriver, Port};

/// Virtual microsecond clock
///
/// Cloning shares the clock. Delays advance it; nothing else does.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now_us: Rc<Cell<u64>>,
}

impl SimClock {
    /// Clock starting at 0 us
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time
    pub fn now_us(&self) -> u64 {
        self.now_us.get()
    }

    /// Move time forward
    pub fn advance(&self, us: u64) {
        self.now_us.set(self.now_us.get() + us);
    }
}

impl DelayUs for SimClock {
    fn delay_us(&mut self, us: u32) {
        self.advance(us as u64);
    }
}

/// One register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// `DDRx` bit changed
    Direction(Direction),
    /// `PORTx` bit changed
    Latch(Level),
}

/// Time-stamped register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Virtual time of the write
    pub at_us: u64,
    /// Pin written
    pub pin: Pin,
    /// What was written
    pub kind: EventKind,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EventKind::Direction(Direction::Output) => {
                write!(f, "{:>8} us  {}  DDR  output", self.at_us, self.pin)
            }
            EventKind::Direction(Direction::Input) => {
                write!(f, "{:>8} us  {}  DDR  input", self.at_us, self.pin)
            }
            EventKind::Latch(level) => {
                write!(f, "{:>8} us  {}  PORT {}", self.at_us, self.pin, level)
            }
        }
    }
}

/// What a pin looks like from outside the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    /// Output driving low
    DrivenLow,
    /// Output driving high
    DrivenHigh,
    /// Input with the internal pull-up enabled
    PulledUp,
    /// Input, high impedance
    HighImpedance,
}

impl fmt::Display for PinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinState::DrivenLow => write!(f, "driven low"),
            PinState::DrivenHigh => write!(f, "driven high"),
            PinState::PulledUp => write!(f, "input, pull-up"),
            PinState::HighImpedance => write!(f, "input, hi-z"),
        }
    }
}

/// An active phase on a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    /// Time the pin reached the active level
    pub start_us: u64,
    /// Time spent at the active level; `None` while still active
    pub width_us: Option<u64>,
}

/// Register image of ports B, C and D
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    /// `DDRB`, `DDRC`, `DDRD`
    pub ddr: [u8; 3],
    /// `PORTB`, `PORTC`, `PORTD`
    pub port: [u8; 3],
}

impl Registers {
    fn apply(&mut self, pin: Pin, kind: EventKind) {
        let i = pin.port.index();
        let (reg, set) = match kind {
            EventKind::Direction(d) => (&mut self.ddr[i], d == Direction::Output),
            EventKind::Latch(l) => (&mut self.port[i], l.is_high()),
        };
        if set {
            *reg |= pin.mask();
        } else {
            *reg &= !pin.mask();
        }
    }

    fn state(&self, pin: Pin) -> PinState {
        let i = pin.port.index();
        let output = self.ddr[i] & pin.mask() != 0;
        let latch = self.port[i] & pin.mask() != 0;
        match (output, latch) {
            (true, false) => PinState::DrivenLow,
            (true, true) => PinState::DrivenHigh,
            (false, true) => PinState::PulledUp,
            (false, false) => PinState::HighImpedance,
        }
    }
}

/// Simulated programmer MCU ports
#[derive(Debug, Clone)]
pub struct SimPorts {
    clock: SimClock,
    regs: Registers,
    /// Register image and time the trace starts from
    base: (u64, Registers),
    /// Level imposed from outside when the pin is not driven
    external: HashMap<Pin, Level>,
    trace: Vec<Event>,
}

impl SimPorts {
    /// All pins inputs without pull-ups, nothing connected outside
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            regs: Registers::default(),
            base: (0, Registers::default()),
            external: HashMap::new(),
            trace: Vec::new(),
        }
    }

    /// Ports wired to a target as the board describes it
    ///
    /// High impedance lines get the target's pull-up to their inactive
    /// level. The auto reset jumper starts fitted.
    pub fn for_board(config: &BoardConfig, clock: SimClock) -> Self {
        let mut ports = Self::new(clock);
        let lines = [Some(config.reset), config.erase, config.vcc_enable];
        for line in lines.into_iter().flatten() {
            if line.idle == IdleBehavior::HighImpedance {
                ports.set_external(line.pin, Some(line.polarity.inactive_level()));
            }
        }
        if let Some(gate) = config.gate {
            ports.set_external(gate.pin, Some(gate.permit_level));
        }
        ports
    }

    /// Connect or disconnect an external level on a pin
    pub fn set_external(&mut self, pin: Pin, level: Option<Level>) {
        match level {
            Some(level) => {
                self.external.insert(pin, level);
            }
            None => {
                self.external.remove(&pin);
            }
        }
    }

    /// Current register image
    pub fn registers(&self) -> Registers {
        self.regs
    }

    /// Electrical state of a pin
    pub fn state(&self, pin: Pin) -> PinState {
        self.regs.state(pin)
    }

    /// Every register write so far
    pub fn trace(&self) -> &[Event] {
        &self.trace
    }

    /// Forget the trace, keeping register contents
    pub fn clear_trace(&mut self) {
        self.trace.clear();
        self.base = (self.clock.now_us(), self.regs);
    }

    fn resolve(&self, regs: &Registers, pin: Pin) -> Level {
        match regs.state(pin) {
            PinState::DrivenLow => Level::Low,
            PinState::DrivenHigh => Level::High,
            PinState::PulledUp => self.external.get(&pin).copied().unwrap_or(Level::High),
            // A floating input reads low
            PinState::HighImpedance => self.external.get(&pin).copied().unwrap_or(Level::Low),
        }
    }

    /// Level on a pin after each change, replayed from the trace
    ///
    /// The first entry is the level where the trace starts, before any
    /// write.
    pub fn level_history(&self, pin: Pin) -> Vec<(u64, Level)> {
        let (start_us, mut regs) = self.base;
        let mut history = vec![(start_us, self.resolve(&regs, pin))];

        for event in self.trace.iter().filter(|e| e.pin == pin) {
            regs.apply(event.pin, event.kind);
            let level = self.resolve(&regs, pin);
            if history.last().map(|&(_, l)| l) != Some(level) {
                history.push((event.at_us, level));
            }
        }

        history
    }

    /// Phases where a pin sat at `active`
    pub fn pulses(&self, pin: Pin, active: Level) -> Vec<Pulse> {
        let mut pulses = Vec::new();
        let mut start = None;

        for (at_us, level) in self.level_history(pin) {
            match (level == active, start) {
                (true, None) => start = Some(at_us),
                (false, Some(s)) => {
                    pulses.push(Pulse {
                        start_us: s,
                        width_us: Some(at_us - s),
                    });
                    start = None;
                }
                _ => {}
            }
        }

        if let Some(s) = start {
            pulses.push(Pulse {
                start_us: s,
                width_us: None,
            });
        }

        pulses
    }

    fn record(&mut self, pin: Pin, kind: EventKind) {
        let event = Event {
            at_us: self.clock.now_us(),
            pin,
            kind,
        };
        log::trace!("sim: {}", event);
        self.regs.apply(pin, kind);
        self.trace.push(event);
    }
}

impl PinDriver for SimPorts {
    fn set_direction(&mut self, pin: Pin, direction: Direction) {
        self.record(pin, EventKind::Direction(direction));
    }

    fn write(&mut self, pin: Pin, level: Level) {
        self.record(pin, EventKind::Latch(level));
    }

    fn read(&self, pin: Pin) -> Level {
        self.resolve(&self.regs, pin)
    }
}

/// All pins of the simulated MCU, for listings
pub fn all_pins() -> impl Iterator<Item = Pin> {
    Port::ALL
        .into_iter()
        .flat_map(|port| (0..8).map(move |bit| Pin::at(port, bit)))
}
