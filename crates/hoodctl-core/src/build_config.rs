//! Board selected at build time
//!
//! Firmware picks its board with cargo features instead of probing at
//! runtime:
//!
//! ```toml
//! hoodctl-core = { version = "0.1", features = ["board-leonardo", "autoreset-gate"] }
//! ```
//!
//! No `board-*` feature means an Uno. Selecting more than one board, or the
//! Due, stops the build. The resolved table is a `const`, so a
//! configuration that [`BoardConfig::resolve`] rejects also stops the build.

use crate::board::{BoardConfig, BoardId, BuildOptions};

#[cfg(feature = "board-due")]
compile_error!(
    "The Arduino Due is not supported: its 16u2 cannot reset the SAM3X the way other boards do"
);

#[cfg(any(
    all(
        feature = "board-mega",
        any(
            feature = "board-mega-adk",
            feature = "board-leonardo",
            feature = "board-micro",
            feature = "board-lufa"
        )
    ),
    all(
        feature = "board-mega-adk",
        any(
            feature = "board-leonardo",
            feature = "board-micro",
            feature = "board-lufa"
        )
    ),
    all(
        feature = "board-leonardo",
        any(feature = "board-micro", feature = "board-lufa")
    ),
    all(feature = "board-micro", feature = "board-lufa"),
))]
compile_error!("More than one board-* feature selected");

const BOARD: BoardId = if cfg!(feature = "board-mega") {
    BoardId::Mega
} else if cfg!(feature = "board-mega-adk") {
    BoardId::MegaAdk
} else if cfg!(feature = "board-leonardo") {
    BoardId::Leonardo
} else if cfg!(feature = "board-micro") {
    BoardId::Micro
} else if cfg!(feature = "board-lufa") {
    BoardId::Lufa
} else if cfg!(feature = "board-due") {
    BoardId::Due
} else {
    BoardId::Uno
};

/// Build options from the enabled cargo features
pub const BUILD_OPTIONS: BuildOptions = BuildOptions::new(BOARD)
    .with_vcc_enable(!cfg!(feature = "no-vcc-enable"))
    .with_vcc_enable_active_high(cfg!(feature = "vccen-active-high"))
    .with_software_reset(!cfg!(feature = "no-software-reset"))
    .with_auto_reset_gate(cfg!(feature = "autoreset-gate"));

/// Line table for the board selected at build time
pub const BUILD_CONFIG: BoardConfig = match BoardConfig::resolve(BUILD_OPTIONS) {
    Ok(config) => config,
    Err(_) => panic!("board configuration selected by cargo features is not supported"),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_matches_options() {
        assert_eq!(BUILD_CONFIG.board, BUILD_OPTIONS.board);
        assert_eq!(BoardConfig::resolve(BUILD_OPTIONS), Ok(BUILD_CONFIG));
    }

    #[test]
    #[cfg(not(any(
        feature = "board-mega",
        feature = "board-mega-adk",
        feature = "board-leonardo",
        feature = "board-micro",
        feature = "board-lufa"
    )))]
    fn test_default_board() {
        assert_eq!(BUILD_OPTIONS.board, BoardId::Uno);
    }
}
