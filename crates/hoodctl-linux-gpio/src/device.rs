//! Linux GPIO control line implementation
//!
//! This module provides [`LinuxGpioPins`], a [`PinDriver`] that maps the
//! board's AVR pins onto lines of a Linux GPIO chip. The AVR register model
//! is emulated on top of the character device:
//!
//! - an output line drives its latched level
//! - an input line with a high latch gets the pull-up bias
//! - an input line with a low latch floats
//!
//! Pins that are not wired to a GPIO offset are ignored with a warning.

use std::time::{Duration, Instant};

use crate::error::{LinuxGpioError, Result};

use gpiocdev::line::{Bias, Offset, Value};
use gpiocdev::request::{Config, Request};

use hoodctl_core::{BoardConfig, DelayUs, Direction, Level, LineId, Pin, PinDriver};

/// Consumer label shown by `gpioinfo` for requested lines
const CONSUMER: &str = "hoodctl";

/// Configuration for opening a Linux GPIO chip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinuxGpioConfig {
    /// Device path (e.g., "/dev/gpiochip0")
    pub device: String,
    /// `/RESET` GPIO line offset
    pub reset: Offset,
    /// Erase GPIO line offset
    pub erase: Option<Offset>,
    /// Power switch GPIO line offset
    pub vcc_enable: Option<Offset>,
    /// Auto reset gate GPIO line offset
    pub gate: Option<Offset>,
}

impl LinuxGpioConfig {
    /// Create a new configuration with the given device path and reset line
    pub fn new(device: impl Into<String>, reset: Offset) -> Self {
        Self {
            device: device.into(),
            reset,
            ..Default::default()
        }
    }

    /// Wire the erase line
    pub fn with_erase(mut self, offset: Offset) -> Self {
        self.erase = Some(offset);
        self
    }

    /// Wire the power switch
    pub fn with_vcc_enable(mut self, offset: Offset) -> Self {
        self.vcc_enable = Some(offset);
        self
    }

    /// Wire the auto reset gate
    pub fn with_gate(mut self, offset: Offset) -> Self {
        self.gate = Some(offset);
        self
    }

    /// Pair each board pin with its GPIO offset
    ///
    /// Every line the board uses must be wired. Offsets for lines the board
    /// does not have are ignored.
    pub fn wiring(&self, board: &BoardConfig) -> Result<Vec<(Pin, Offset)>> {
        let mut wires = vec![(board.reset.pin, self.reset)];

        for (id, line, offset) in [
            (LineId::Erase, board.erase, self.erase),
            (LineId::VccEnable, board.vcc_enable, self.vcc_enable),
        ] {
            match (line, offset) {
                (Some(line), Some(offset)) => wires.push((line.pin, offset)),
                (Some(_), None) => return Err(LinuxGpioError::UnwiredLine(id)),
                (None, Some(offset)) => {
                    log::warn!(
                        "linux_gpio: Board has no {} line, ignoring GPIO {}",
                        id.name(),
                        offset
                    );
                }
                (None, None) => {}
            }
        }

        match (board.gate, self.gate) {
            (Some(gate), Some(offset)) => wires.push((gate.pin, offset)),
            (Some(_), None) => return Err(LinuxGpioError::UnwiredGate),
            (None, Some(offset)) => {
                log::warn!(
                    "linux_gpio: Board has no auto reset gate, ignoring GPIO {}",
                    offset
                );
            }
            (None, None) => {}
        }

        for (i, (_, offset)) in wires.iter().enumerate() {
            if wires[i + 1..].iter().any(|(_, other)| other == offset) {
                return Err(LinuxGpioError::DuplicateOffset(*offset));
            }
        }

        Ok(wires)
    }
}

/// State of one requested line
#[derive(Debug, Clone, Copy)]
struct Wire {
    pin: Pin,
    offset: Offset,
    direction: Direction,
    latch: Level,
}

fn to_value(level: Level) -> Value {
    match level {
        Level::High => Value::Active,
        Level::Low => Value::Inactive,
    }
}

fn input_bias(latch: Level) -> Bias {
    match latch {
        Level::High => Bias::PullUp,
        Level::Low => Bias::Disabled,
    }
}

/// Control lines on a Linux GPIO chip
///
/// All lines start as floating inputs, matching an AVR coming out of reset.
pub struct LinuxGpioPins {
    /// GPIO line request handle
    request: Request,
    /// Full line configuration, kept in sync with `wires`
    config: Config,
    wires: Vec<Wire>,
}

impl LinuxGpioPins {
    /// Request the lines `board` uses from the chip named in `config`
    pub fn open(config: &LinuxGpioConfig, board: &BoardConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxGpioError::NoDevice);
        }

        let wires: Vec<Wire> = config
            .wiring(board)?
            .into_iter()
            .map(|(pin, offset)| Wire {
                pin,
                offset,
                direction: Direction::Input,
                latch: Level::Low,
            })
            .collect();

        log::debug!("linux_gpio: Opening device {}", config.device);

        let mut req_config = Config::default();
        for wire in &wires {
            req_config
                .with_line(wire.offset)
                .as_input()
                .with_bias(Bias::Disabled);
        }

        let request = Request::from_config(req_config.clone())
            .on_chip(&config.device)
            .with_consumer(CONSUMER)
            .request()
            .map_err(LinuxGpioError::LineRequestFailed)?;

        log::info!(
            "linux_gpio: Opened {} ({})",
            config.device,
            wires
                .iter()
                .map(|w| format!("{}={}", w.pin, w.offset))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            request,
            config: req_config,
            wires,
        })
    }

    /// GPIO offset a board pin is wired to
    pub fn offset(&self, pin: Pin) -> Option<Offset> {
        self.wires.iter().find(|w| w.pin == pin).map(|w| w.offset)
    }

    fn wire_index(&self, pin: Pin) -> Option<usize> {
        let index = self.wires.iter().position(|w| w.pin == pin);
        if index.is_none() {
            log::warn!("linux_gpio: {} is not wired to a GPIO line", pin);
        }
        index
    }

    /// Push one line's direction and latch to the kernel
    fn reconfigure(&mut self, index: usize) {
        let wire = self.wires[index];
        let line = self.config.with_line(wire.offset);
        match wire.direction {
            Direction::Output => {
                line.as_output(to_value(wire.latch)).with_bias(Bias::Disabled);
            }
            Direction::Input => {
                line.as_input().with_bias(input_bias(wire.latch));
            }
        }

        if let Err(e) = self.request.reconfigure(&self.config) {
            log::error!(
                "Failed to reconfigure GPIO {} ({}): {}",
                wire.offset,
                wire.pin,
                e
            );
        }
    }
}

impl PinDriver for LinuxGpioPins {
    fn set_direction(&mut self, pin: Pin, direction: Direction) {
        let Some(index) = self.wire_index(pin) else {
            return;
        };
        if self.wires[index].direction == direction {
            return;
        }
        self.wires[index].direction = direction;
        self.reconfigure(index);
    }

    fn write(&mut self, pin: Pin, level: Level) {
        let Some(index) = self.wire_index(pin) else {
            return;
        };
        if self.wires[index].latch == level {
            return;
        }
        self.wires[index].latch = level;

        let wire = self.wires[index];
        match wire.direction {
            Direction::Output => {
                if let Err(e) = self.request.set_value(wire.offset, to_value(level)) {
                    log::error!("Failed to set GPIO {} ({}): {}", wire.offset, pin, e);
                }
                // Keep the cached config current for later reconfigures
                self.config.with_line(wire.offset).as_output(to_value(level));
            }
            Direction::Input => self.reconfigure(index),
        }
    }

    fn read(&self, pin: Pin) -> Level {
        let Some(wire) = self.wires.iter().find(|w| w.pin == pin) else {
            log::warn!("linux_gpio: {} is not wired to a GPIO line", pin);
            return Level::Low;
        };
        match self.request.value(wire.offset) {
            Ok(Value::Active) => Level::High,
            Ok(Value::Inactive) => Level::Low,
            Err(e) => {
                log::error!("Failed to read GPIO {} ({}): {}", wire.offset, pin, e);
                Level::Low
            }
        }
    }
}

/// Busy-wait microsecond delay
///
/// `thread::sleep` overshoots short delays by tens of microseconds, which
/// would stretch the software reset pulse well past its nominal width.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinDelay;

impl DelayUs for SpinDelay {
    fn delay_us(&mut self, us: u32) {
        let deadline = Instant::now() + Duration::from_micros(u64::from(us));
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
    }
}

fn parse_offset(name: &'static str, value: &str) -> Result<Offset> {
    value
        .parse()
        .map_err(|_| LinuxGpioError::InvalidLineNumber {
            name,
            value: value.to_string(),
        })
}

/// Parse programmer options from a list of key-value pairs
///
/// # Supported Options
///
/// - `dev=/dev/gpiochipN` - GPIO chip device path (required, or use gpiochip)
/// - `gpiochip=N` - GPIO chip number (alternative to dev)
/// - `reset=N` - `/RESET` GPIO line offset (required)
/// - `erase=N` - Erase GPIO line offset (optional)
/// - `vccen=N` - Power switch GPIO line offset (optional)
/// - `gate=N` - Auto reset gate GPIO line offset (optional)
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxGpioConfig> {
    let mut config = LinuxGpioConfig::default();
    let mut reset = None;
    let mut gpiochip: Option<u32> = None;

    for (key, value) in options {
        match *key {
            "dev" => {
                config.device = value.to_string();
            }
            "gpiochip" => {
                gpiochip = Some(value.parse().map_err(|_| {
                    LinuxGpioError::InvalidParameter(format!("Invalid gpiochip value: {}", value))
                })?);
            }
            "reset" => reset = Some(parse_offset("reset", value)?),
            "erase" => config.erase = Some(parse_offset("erase", value)?),
            "vccen" | "vcc_enable" => config.vcc_enable = Some(parse_offset("vccen", value)?),
            "gate" => config.gate = Some(parse_offset("gate", value)?),
            _ => {
                log::warn!("linux_gpio: Unknown option: {}={}", key, value);
            }
        }
    }

    // Handle dev vs gpiochip
    if config.device.is_empty() {
        match gpiochip {
            Some(n) => config.device = format!("/dev/gpiochip{}", n),
            None => return Err(LinuxGpioError::NoDevice),
        }
    } else if gpiochip.is_some() {
        return Err(LinuxGpioError::InvalidParameter(
            "Only one of 'dev' or 'gpiochip' can be specified".to_string(),
        ));
    }

    config.reset = reset.ok_or(LinuxGpioError::MissingParameter("reset"))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoodctl_core::{BoardId, BuildOptions};

    fn board(options: BuildOptions) -> BoardConfig {
        BoardConfig::resolve(options).unwrap()
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[
            ("dev", "/dev/gpiochip1"),
            ("reset", "17"),
            ("vccen", "27"),
            ("gate", "22"),
        ])
        .unwrap();
        assert_eq!(
            config,
            LinuxGpioConfig::new("/dev/gpiochip1", 17)
                .with_vcc_enable(27)
                .with_gate(22)
        );

        let config = parse_options(&[("gpiochip", "0"), ("reset", "4")]).unwrap();
        assert_eq!(config.device, "/dev/gpiochip0");
        assert_eq!(config.reset, 4);
        assert_eq!(config.erase, None);
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(matches!(
            parse_options(&[("reset", "4")]),
            Err(LinuxGpioError::NoDevice)
        ));
        assert!(matches!(
            parse_options(&[("gpiochip", "0")]),
            Err(LinuxGpioError::MissingParameter("reset"))
        ));
        assert!(matches!(
            parse_options(&[("gpiochip", "0"), ("reset", "x")]),
            Err(LinuxGpioError::InvalidLineNumber { name: "reset", .. })
        ));
        assert!(matches!(
            parse_options(&[("dev", "/dev/gpiochip0"), ("gpiochip", "0"), ("reset", "4")]),
            Err(LinuxGpioError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_wiring_classic() {
        let uno = board(BuildOptions::new(BoardId::Uno));
        let wires = LinuxGpioConfig::new("/dev/gpiochip0", 17)
            .with_vcc_enable(27)
            .wiring(&uno)
            .unwrap();
        assert_eq!(
            wires,
            vec![
                (uno.reset.pin, 17),
                (uno.vcc_enable.unwrap().pin, 27),
            ]
        );

        // The Uno has a power switch, so it must be wired
        assert!(matches!(
            LinuxGpioConfig::new("/dev/gpiochip0", 17).wiring(&uno),
            Err(LinuxGpioError::UnwiredLine(LineId::VccEnable))
        ));
    }

    #[test]
    fn test_wiring_gate_and_extras() {
        let leo = board(BuildOptions::new(BoardId::Leonardo).with_auto_reset_gate(true));

        assert!(matches!(
            LinuxGpioConfig::new("/dev/gpiochip0", 17).wiring(&leo),
            Err(LinuxGpioError::UnwiredGate)
        ));

        // No power switch on the Leonardo; the offset is ignored
        let wires = LinuxGpioConfig::new("/dev/gpiochip0", 17)
            .with_vcc_enable(27)
            .with_gate(22)
            .wiring(&leo)
            .unwrap();
        assert_eq!(wires.len(), 2);
        assert_eq!(wires[1], (leo.gate.unwrap().pin, 22));
    }

    #[test]
    fn test_wiring_duplicate_offset() {
        let uno = board(BuildOptions::new(BoardId::Uno));
        assert!(matches!(
            LinuxGpioConfig::new("/dev/gpiochip0", 17)
                .with_vcc_enable(17)
                .wiring(&uno),
            Err(LinuxGpioError::DuplicateOffset(17))
        ));
    }

    #[test]
    fn test_spin_delay() {
        let start = Instant::now();
        SpinDelay.delay_us(200);
        assert!(start.elapsed() >= Duration::from_micros(200));
    }
}
