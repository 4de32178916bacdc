//! CLI argument parsing

use clap::{Parser, Subcommand};
use hoodctl_core::BoardId;
use std::path::PathBuf;

/// Help text for the programmer argument
const PROGRAMMER_HELP: &str = "Programmer to use (see 'hoodctl list-programmers'), \
     e.g. sim or linux_gpio:dev=/dev/gpiochip0,reset=17";

/// Parse a duration in milliseconds
fn parse_millis(s: &str) -> Result<u64, String> {
    let ms: u64 = s
        .trim_end_matches("ms")
        .parse()
        .map_err(|e| format!("Invalid number: {}", e))?;
    if ms > 60_000 {
        return Err("Hold time is limited to 60000 ms".to_string());
    }
    Ok(ms)
}

#[derive(Parser)]
#[command(name = "hoodctl")]
#[command(author, version, about = "Reset, erase and power control for programmer MCUs", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Board selection shared across commands
///
/// Without `--board` or `--board-file` the board the binary was built for
/// is used. Each modification comes as a `--x`/`--no-x` pair; a setting
/// that is not given keeps its build-time value. The power switch and
/// software reset settings only apply to classic boards.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BoardArgs {
    /// Board (uno, mega, mega-adk, leonardo, micro, lufa)
    #[arg(short, long, conflicts_with = "board_file")]
    pub board: Option<BoardId>,

    /// Board file describing a custom line table (TOML format)
    #[arg(long)]
    pub board_file: Option<PathBuf>,

    /// The reset capacitor is replaced by a resistor; pulse reset
    #[arg(long, conflicts_with_all = ["board_file", "no_software_reset"])]
    pub software_reset: bool,

    /// The reset capacitor is still fitted; hold reset instead of pulsing it
    #[arg(long, conflicts_with = "board_file")]
    pub no_software_reset: bool,

    /// A power switch is fitted
    #[arg(long, conflicts_with_all = ["board_file", "no_vcc_enable"])]
    pub vcc_enable: bool,

    /// No power switch is fitted
    #[arg(long, conflicts_with = "board_file")]
    pub no_vcc_enable: bool,

    /// The power switch is an n-channel MOSFET (enabled by a high level)
    #[arg(long, conflicts_with_all = ["board_file", "vccen_active_low"])]
    pub vccen_active_high: bool,

    /// The power switch is a p-channel MOSFET (enabled by a low level)
    #[arg(long, conflicts_with = "board_file")]
    pub vccen_active_low: bool,

    /// Only allow auto reset while the gate input permits it
    #[arg(long, conflicts_with_all = ["board_file", "no_autoreset_gate"])]
    pub autoreset_gate: bool,

    /// Always allow auto reset
    #[arg(long, conflicts_with = "board_file")]
    pub no_autoreset_gate: bool,
}

fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl BoardArgs {
    /// Requested software reset setting, if any
    pub fn software_reset(&self) -> Option<bool> {
        flag_pair(self.software_reset, self.no_software_reset)
    }

    /// Requested power switch setting, if any
    pub fn vcc_enable(&self) -> Option<bool> {
        flag_pair(self.vcc_enable, self.no_vcc_enable)
    }

    /// Requested power switch polarity, if any
    pub fn vcc_enable_active_high(&self) -> Option<bool> {
        flag_pair(self.vccen_active_high, self.vccen_active_low)
    }

    /// Requested auto reset gate setting, if any
    pub fn auto_reset_gate(&self) -> Option<bool> {
        flag_pair(self.autoreset_gate, self.no_autoreset_gate)
    }

    /// Whether any classic-only setting was given
    pub fn has_classic_modifications(&self) -> bool {
        self.software_reset().is_some()
            || self.vcc_enable().is_some()
            || self.vcc_enable_active_high().is_some()
    }

    /// Whether any modification flag was given
    pub fn has_modifications(&self) -> bool {
        self.has_classic_modifications() || self.auto_reset_gate().is_some()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List supported boards
    ListBoards,

    /// List supported programmers
    ListProgrammers,

    /// Show the resolved line table of a board
    Info {
        #[command(flatten)]
        board: BoardArgs,

        /// Print the line table as a board file instead
        #[arg(long)]
        toml: bool,

        /// Write the board file here instead of stdout (implies --toml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Put every control line into its idle state and enable power
    Init {
        /// Programmer to use
        #[arg(short, long, help = PROGRAMMER_HELP)]
        programmer: String,

        #[command(flatten)]
        board: BoardArgs,
    },

    /// Reset the target MCU
    Reset {
        /// Programmer to use
        #[arg(short, long, help = PROGRAMMER_HELP)]
        programmer: String,

        #[command(flatten)]
        board: BoardArgs,

        /// How long to hold a non-pulsed reset before releasing it
        #[arg(long, default_value = "100", value_parser = parse_millis)]
        hold_ms: u64,
    },

    /// Hold the target erase line, then release it
    Erase {
        /// Programmer to use
        #[arg(short, long, help = PROGRAMMER_HELP)]
        programmer: String,

        #[command(flatten)]
        board: BoardArgs,

        /// How long to hold the erase line
        #[arg(long, default_value = "100", value_parser = parse_millis)]
        hold_ms: u64,
    },
}
