//! TOML board files
//!
//! Describe a modified or home-made board without rebuilding:
//!
//! ```toml
//! [board]
//! name = "Uno with erase mod"
//! base = "uno"
//! reset_pulse_us = 12
//!
//! [reset]
//! pin = "PD7"
//! polarity = "active-low"
//! idle = "high-impedance"
//!
//! [erase]
//! pin = "PC6"
//!
//! [vcc_enable]
//! pin = "PB5"
//! polarity = "active-low"
//!
//! [gate]
//! pin = "PB6"
//! permit = "high"
//! ```
//!
//! `base` supplies the USB identity. Omitting `reset_pulse_us` holds reset
//! instead of pulsing it. Lines default to active-low and driven idle.

use std::fs;
use std::path::Path;
use std::string::String;

use serde::{Deserialize, Serialize};

use crate::board::{BoardConfig, BoardFamily, BoardId};
use crate::error::Error;
use crate::line::{AutoResetGate, ControlLine, IdleBehavior, LineId, Polarity};
use crate::pin::{Level, Pin};

/// Errors loading a board file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("board file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid TOML or has unknown keys
    #[error("board file parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Board could not be written as TOML
    #[error("board file serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Line table is inconsistent
    #[error("invalid board: {0}")]
    Invalid(#[from] Error),
}

/// Parsed board file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardFile {
    /// Board metadata
    pub board: BoardSection,
    /// Target `/RESET`
    pub reset: LineSection,
    /// Target erase input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub erase: Option<LineSection>,
    /// Target power switch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcc_enable: Option<LineSection>,
    /// Auto reset enable input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateSection>,
}

/// `[board]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardSection {
    /// Free-form display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Catalogue board providing the USB identity
    pub base: BoardId,
    /// Software reset pulse width in microseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_pulse_us: Option<u32>,
}

/// `[reset]`, `[erase]` and `[vcc_enable]` tables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineSection {
    /// Pin name, e.g. `PD7`
    pub pin: Pin,
    /// Active polarity
    #[serde(default = "default_polarity")]
    pub polarity: Polarity,
    /// Released state
    #[serde(default = "default_idle")]
    pub idle: IdleBehavior,
}

/// `[gate]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateSection {
    /// Sense pin name
    pub pin: Pin,
    /// Level that permits auto reset
    #[serde(default = "default_permit")]
    pub permit: Level,
    /// Enable the internal pull-up
    #[serde(default)]
    pub pull_up: bool,
}

fn default_polarity() -> Polarity {
    Polarity::ActiveLow
}

fn default_idle() -> IdleBehavior {
    IdleBehavior::DrivenInactive
}

fn default_permit() -> Level {
    Level::High
}

impl LineSection {
    fn to_line(&self, id: LineId) -> ControlLine {
        ControlLine::new(id, self.pin, self.polarity, self.idle)
    }

    fn from_line(line: &ControlLine) -> Self {
        Self {
            pin: line.pin,
            polarity: line.polarity,
            idle: line.idle,
        }
    }
}

impl BoardFile {
    /// Load a board file from disk
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a board file
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Describe a resolved configuration as a board file
    pub fn from_config(config: &BoardConfig) -> Self {
        Self {
            board: BoardSection {
                name: None,
                base: config.board,
                reset_pulse_us: config.reset_pulse_us,
            },
            reset: LineSection::from_line(&config.reset),
            erase: config.erase.as_ref().map(LineSection::from_line),
            vcc_enable: config.vcc_enable.as_ref().map(LineSection::from_line),
            gate: config.gate.map(|gate| GateSection {
                pin: gate.pin,
                permit: gate.permit_level,
                pull_up: gate.pull_up,
            }),
        }
    }

    /// Build and validate the line table
    pub fn to_config(&self) -> Result<BoardConfig, ConfigError> {
        let base = self.board.base;
        if base.family() == BoardFamily::Due {
            return Err(Error::UnsupportedBoard(base).into());
        }

        let config = BoardConfig {
            board: base,
            reset: self.reset.to_line(LineId::Reset),
            erase: self.erase.as_ref().map(|l| l.to_line(LineId::Erase)),
            vcc_enable: self.vcc_enable.as_ref().map(|l| l.to_line(LineId::VccEnable)),
            gate: self.gate.as_ref().map(|g| AutoResetGate {
                pin: g.pin,
                permit_level: g.permit,
                pull_up: g.pull_up,
            }),
            reset_pulse_us: self.board.reset_pulse_us,
        };
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Write to disk as TOML
    pub fn to_toml_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}
