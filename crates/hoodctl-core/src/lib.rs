//! hoodctl-core - Reset, erase and power control for programmer MCUs
//!
//! On boards such as the Arduino Uno, Mega and Leonardo a small USB MCU sits
//! between the host and the main MCU. Besides bridging the serial port, it
//! owns a few control lines to the main MCU: `/RESET`, an optional erase
//! input and an optional power switch. This crate maps the logical
//! operations (assert reset, release reset, assert erase, enable power) to
//! the electrically correct pin states for each supported board.
//!
//! The crate is `no_std`. Hardware access goes through the [`PinDriver`]
//! and [`DelayUs`] traits, so the same controller runs on the programmer MCU
//! itself, on a Linux GPIO chip, or against a simulator in tests.
//!
//! # Features
//!
//! - `std` - Enable standard library support (TOML board files)
//! - `critical-section` - Mask interrupts while the software reset pulse runs
//! - `board-*`, `vccen-active-high`, `no-software-reset`, `no-vcc-enable`,
//!   `autoreset-gate` - Build-time board selection, see [`build_config`]
//!
//! # Example
//!
//! ```ignore
//! use hoodctl_core::{BoardController, BUILD_CONFIG};
//!
//! let mut board = BoardController::new(BUILD_CONFIG, pins, delay);
//! board.initialize();
//!
//! // Host toggled DTR
//! board.set_reset(true);
//! board.set_reset(false);
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod board;
pub mod build_config;
#[cfg(feature = "std")]
pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod line;
pub mod pin;

pub use board::{BoardConfig, BoardFamily, BoardId, BuildOptions};
pub use build_config::{BUILD_CONFIG, BUILD_OPTIONS};
pub use controller::{BoardController, ResetState};
pub use driver::{DelayUs, PinDriver};
pub use error::{Error, Result};
pub use line::{AutoResetGate, ControlLine, IdleBehavior, LineId, Lines, Polarity};
pub use pin::{Direction, Level, Pin, Port};
