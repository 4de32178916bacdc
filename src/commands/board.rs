//! Board resolution and `info` command

use std::path::Path;

use hoodctl_core::config::BoardFile;
use hoodctl_core::{BoardConfig, BoardFamily, BuildOptions, ControlLine, BUILD_CONFIG, BUILD_OPTIONS};

use crate::cli::BoardArgs;

/// Apply the modification flags on top of `base`
///
/// Settings without a flag keep their value from `base`.
pub fn apply_board_args(base: BuildOptions, args: &BoardArgs) -> BuildOptions {
    let mut options = base.with_board(args.board.unwrap_or(base.board));
    if let Some(fitted) = args.vcc_enable() {
        options = options.with_vcc_enable(fitted);
    }
    if let Some(active_high) = args.vcc_enable_active_high() {
        options = options.with_vcc_enable_active_high(active_high);
    }
    if let Some(enabled) = args.software_reset() {
        options = options.with_software_reset(enabled);
    }
    if let Some(enabled) = args.auto_reset_gate() {
        options = options.with_auto_reset_gate(enabled);
    }
    options
}

/// Turn the board arguments into a line table
///
/// Precedence: `--board-file`, then `--board` with the modification flags
/// over the build-time options, then the board the binary was built for.
pub fn resolve_board(args: &BoardArgs) -> Result<BoardConfig, Box<dyn std::error::Error>> {
    if let Some(path) = &args.board_file {
        let config = BoardFile::from_toml_file(path)
            .and_then(|file| file.to_config())
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        log::info!("Loaded board file {} ({})", path.display(), config.board);
        return Ok(config);
    }

    if args.board.is_none() && !args.has_modifications() {
        log::debug!("Using built-in board {}", BUILD_CONFIG.board);
        return Ok(BUILD_CONFIG);
    }

    let options = apply_board_args(BUILD_OPTIONS, args);
    if options.board.family() == BoardFamily::AtMega32u4 && args.has_classic_modifications() {
        log::warn!(
            "{} has no power switch or reset capacitor, ignoring the modification flags",
            options.board
        );
    }

    Ok(BoardConfig::resolve(options)?)
}

fn describe_line(line: &ControlLine) -> String {
    format!("{}, {}, idle {}", line.pin, line.polarity, line.idle)
}

/// Print a human-readable line table
pub fn print_board_info(config: &BoardConfig) {
    let board = config.board;

    println!("Board:        {} ({})", board, board.family());
    println!(
        "USB:          {:04x}:{:04x} \"{}\"",
        board.vid(),
        board.pid(),
        board.product()
    );
    println!();
    println!("RESET:        {}", describe_line(&config.reset));
    match config.reset_pulse_us {
        Some(us) => println!("              software reset, {} us pulse", us),
        None => println!("              held while asserted"),
    }

    match &config.erase {
        Some(line) => println!("ERASE:        {}", describe_line(line)),
        None => println!("ERASE:        not wired"),
    }
    match &config.vcc_enable {
        Some(line) => println!("VCCEN:        {}", describe_line(line)),
        None => println!("VCCEN:        not fitted"),
    }
    match &config.gate {
        Some(gate) => println!(
            "GATE:         {}, permits when {}{}",
            gate.pin,
            gate.permit_level,
            if gate.pull_up { ", pull-up" } else { "" }
        ),
        None => println!("GATE:         none (auto reset always permitted)"),
    }
}

/// Export a line table as a board file, to `output` or stdout
pub fn write_board_file(
    config: &BoardConfig,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = BoardFile::from_config(config);
    match output {
        Some(path) => {
            file.to_toml_file(path)?;
            println!("Board file written to {}", path.display());
        }
        None => print!("{}", file.to_toml_string()?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoodctl_core::{BoardId, Polarity};

    #[test]
    fn test_resolve_builtin() {
        let config = resolve_board(&BoardArgs::default()).unwrap();
        assert_eq!(config, BUILD_CONFIG);
    }

    #[test]
    fn test_resolve_with_flags() {
        let args = BoardArgs {
            board: Some(BoardId::Mega),
            vcc_enable: true,
            vccen_active_high: true,
            no_software_reset: true,
            ..Default::default()
        };
        let config = resolve_board(&args).unwrap();
        assert_eq!(config.board, BoardId::Mega);
        assert_eq!(config.reset_pulse_us, None);
        assert_eq!(
            config.vcc_enable.map(|line| line.polarity),
            Some(Polarity::ActiveHigh)
        );
    }

    #[test]
    fn test_flags_keep_build_options() {
        let base = BuildOptions::new(BoardId::Uno)
            .with_software_reset(false)
            .with_vcc_enable_active_high(true);

        let args = BoardArgs {
            autoreset_gate: true,
            ..Default::default()
        };
        let options = apply_board_args(base, &args);
        assert_eq!(options, base.with_auto_reset_gate(true));
        let config = BoardConfig::resolve(options).unwrap();
        assert_eq!(config.reset_pulse_us, None);
        assert!(config.gate.is_some());

        let args = BoardArgs {
            board: Some(BoardId::Mega),
            ..Default::default()
        };
        assert_eq!(apply_board_args(base, &args), base.with_board(BoardId::Mega));

        let args = BoardArgs {
            software_reset: true,
            vccen_active_low: true,
            no_vcc_enable: true,
            ..Default::default()
        };
        let options = apply_board_args(base, &args);
        assert!(options.software_reset);
        assert!(!options.vcc_enable_active_high);
        assert!(!options.vcc_enable);
    }

    #[test]
    fn test_flag_pairs_parse() {
        use crate::cli::{Cli, Commands};
        use clap::Parser;

        let cli = Cli::try_parse_from(["hoodctl", "info", "--no-software-reset", "--autoreset-gate"])
            .unwrap();
        let Commands::Info { board, .. } = cli.command else {
            panic!("expected info");
        };
        assert_eq!(board.software_reset(), Some(false));
        assert_eq!(board.auto_reset_gate(), Some(true));
        assert_eq!(board.vcc_enable(), None);
        assert_eq!(board.vcc_enable_active_high(), None);

        assert!(Cli::try_parse_from(["hoodctl", "info", "--software-reset", "--no-software-reset"])
            .is_err());
        assert!(Cli::try_parse_from(["hoodctl", "info", "--board-file", "x.toml", "--vcc-enable"])
            .is_err());
    }

    #[test]
    fn test_resolve_rejects_due() {
        let args = BoardArgs {
            board: Some(BoardId::Due),
            ..Default::default()
        };
        assert!(resolve_board(&args).is_err());
    }

    #[test]
    fn test_resolve_board_file() {
        let path = std::env::temp_dir().join(format!("hoodctl-test-{}.toml", std::process::id()));
        let micro = BoardConfig::resolve(
            BuildOptions::new(BoardId::Micro).with_auto_reset_gate(true),
        )
        .unwrap();
        write_board_file(&micro, Some(&path)).unwrap();

        let args = BoardArgs {
            board_file: Some(path.clone()),
            ..Default::default()
        };
        let config = resolve_board(&args);
        let _ = std::fs::remove_file(&path);
        assert_eq!(config.unwrap(), micro);
    }
}
