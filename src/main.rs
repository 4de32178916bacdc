//! hoodctl - Reset, erase and power control for programmer MCUs
//!
//! Drives the control lines a USB programmer MCU (the 16u2 on an Uno, the
//! 32u4 on a Leonardo) owns towards its main MCU, the way the bootloader
//! firmware would.
//!
//! # Architecture
//!
//! The line logic lives in `hoodctl-core` and talks to hardware through the
//! `PinDriver` trait. This binary picks a board (built-in, `--board` or a
//! board file) and a programmer backend:
//! - **sim** - Simulated ports with a virtual clock, prints a pin trace
//! - **linux_gpio** - Real lines on a Linux GPIO chip
//!
//! Every control command runs the same controller code on either backend.

mod cli;
mod commands;
mod programmers;

use std::time::Duration;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let result = match cli.command {
        Commands::ListBoards => {
            commands::list_boards();
            Ok(())
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
        Commands::Info {
            board,
            toml,
            output,
        } => {
            let config = commands::resolve_board(&board)?;
            if toml || output.is_some() {
                commands::write_board_file(&config, output.as_deref())
            } else {
                commands::print_board_info(&config);
                Ok(())
            }
        }
        Commands::Init { programmer, board } => {
            let config = commands::resolve_board(&board)?;
            programmers::with_controller(&programmer, config, commands::control::run_init)
        }
        Commands::Reset {
            programmer,
            board,
            hold_ms,
        } => {
            let config = commands::resolve_board(&board)?;
            programmers::with_controller(&programmer, config, |session| {
                commands::control::run_reset(session, Duration::from_millis(hold_ms))
            })
        }
        Commands::Erase {
            programmer,
            board,
            hold_ms,
        } => {
            let config = commands::resolve_board(&board)?;
            programmers::with_controller(&programmer, config, |session| {
                commands::control::run_erase(session, Duration::from_millis(hold_ms))
            })
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
