//! hoodctl-linux-gpio - Drive a board's control lines from a Linux host
//!
//! This crate provides a [`PinDriver`](hoodctl_core::PinDriver) for the Linux
//! character device GPIO interface (gpiocdev), so the board controller can
//! run on a single board computer wired to the target's `/RESET`, erase and
//! power switch lines.
//!
//! # Example
//!
//! ```no_run
//! use hoodctl_core::{BoardConfig, BoardController, BoardId, BuildOptions};
//! use hoodctl_linux_gpio::{LinuxGpioConfig, LinuxGpioPins, SpinDelay};
//!
//! let board = BoardConfig::resolve(BuildOptions::new(BoardId::Leonardo))?;
//! let config = LinuxGpioConfig::new("/dev/gpiochip0", 17);
//!
//! let pins = LinuxGpioPins::open(&config, &board)?;
//! let mut controller = BoardController::new(board, pins, SpinDelay);
//! controller.initialize();
//! controller.set_reset(true);
//! controller.set_reset(false);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with hoodctl CLI
//!
//! ```bash
//! # Pulse reset on an Uno with software reset and a power switch
//! hoodctl reset -p linux_gpio:dev=/dev/gpiochip0,reset=17,vccen=27
//!
//! # Leonardo with an auto reset jumper, using the gpiochip number
//! hoodctl reset --board leonardo --autoreset-gate -p linux_gpio:gpiochip=0,reset=17,gate=22
//! ```
//!
//! # Electrical Notes
//!
//! A released high-impedance line is requested as an input with bias
//! disabled. Lines the board would hold with the AVR pull-up are requested
//! with the pull-up bias, which needs kernel 5.5+ and the v2 uAPI.
//!
//! # System Requirements
//!
//! - Linux kernel 4.8+ with GPIO character device support (kernel 5.5+ for v2 API)
//! - Access to `/dev/gpiochipN` devices (may require root or udev rules)

pub mod device;
pub mod error;

// Re-exports
pub use device::{parse_options, LinuxGpioConfig, LinuxGpioPins, SpinDelay};
pub use error::{LinuxGpioError, Result};

/// Open a Linux GPIO chip for `board` from programmer options
///
/// This is a convenience function for use in the CLI programmer dispatch.
///
/// # Example Options
///
/// - `dev=/dev/gpiochip0` - GPIO chip device path (or use gpiochip=N)
/// - `gpiochip=0` - GPIO chip number (alternative to dev)
/// - `reset=17` - `/RESET` GPIO offset (required)
/// - `erase=N` - Erase GPIO offset (required if the board has an erase line)
/// - `vccen=N` - Power switch GPIO offset (required if the board has one)
/// - `gate=N` - Auto reset gate GPIO offset (required if the gate is enabled)
pub fn open_linux_gpio(
    options: &[(&str, &str)],
    board: &hoodctl_core::BoardConfig,
) -> Result<LinuxGpioPins> {
    let config = parse_options(options)?;
    LinuxGpioPins::open(&config, board)
}
