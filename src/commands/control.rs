//! Line control commands: init, reset, erase

use std::time::Duration;

use hoodctl_core::{Lines, ResetState};

use crate::programmers::Session;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn report_power(session: &Session<'_>) {
    if session.board.lines().contains(Lines::VCC_ENABLE) {
        log::info!(
            "Target power {}",
            if session.board.is_powered() { "enabled" } else { "disabled" }
        );
    } else {
        log::debug!("No power switch, target powered directly");
    }
}

fn check_gate(session: &Session<'_>) -> CmdResult {
    if !session.board.auto_reset_permitted() {
        return Err("Auto reset is disabled by the gate input".into());
    }
    Ok(())
}

/// Bring every line to its idle state
pub fn run_init(session: &mut Session<'_>) -> CmdResult {
    session.board.initialize();
    report_power(session);
    println!("Board {} initialized", session.board.config().board);
    Ok(())
}

/// Reset the target, pulsing or holding per the board
pub fn run_reset(session: &mut Session<'_>, hold: Duration) -> CmdResult {
    session.board.initialize();
    report_power(session);
    check_gate(session)?;

    session.board.set_reset(true);
    match session.board.reset_state() {
        ResetState::Pulsed => {
            let us = session.board.config().reset_pulse_us.unwrap_or_default();
            println!("Reset pulse issued ({} us)", us);
        }
        ResetState::Asserted => {
            log::info!("Holding reset for {} ms", hold.as_millis());
            session.wait(hold);
            session.board.set_reset(false);
            println!("Reset held for {} ms and released", hold.as_millis());
        }
        ResetState::Inactive => {
            return Err("Reset was not applied".into());
        }
    }
    Ok(())
}

/// Hold the erase line for `hold`, then release it
pub fn run_erase(session: &mut Session<'_>, hold: Duration) -> CmdResult {
    session.board.initialize();
    if !session.board.lines().contains(Lines::ERASE) {
        return Err(format!(
            "Board {} has no erase line (describe one with --board-file)",
            session.board.config().board
        )
        .into());
    }
    check_gate(session)?;

    session.board.set_erase(true);
    log::info!("Holding erase for {} ms", hold.as_millis());
    session.wait(hold);
    session.board.set_erase(false);

    if session.board.erase_asserted() {
        return Err("Erase line did not release".into());
    }
    println!("Erase held for {} ms and released", hold.as_millis());
    Ok(())
}

#[cfg(all(test, feature = "sim"))]
mod tests {
    use super::*;
    use crate::programmers::with_controller;
    use hoodctl_core::{BoardConfig, BoardId, BuildOptions};

    fn config(options: BuildOptions) -> BoardConfig {
        BoardConfig::resolve(options).unwrap()
    }

    #[test]
    fn test_reset_held_board() {
        let leo = config(BuildOptions::new(BoardId::Leonardo));
        with_controller("sim", leo, |session| {
            run_reset(session, Duration::from_millis(5))?;
            assert_eq!(session.board.reset_state(), ResetState::Inactive);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_reset_blocked_by_gate() {
        let uno = config(BuildOptions::new(BoardId::Uno).with_auto_reset_gate(true));
        let result = with_controller("sim:gate=block", uno, |session| {
            run_reset(session, Duration::from_millis(5))
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_erase_needs_line() {
        let uno = config(BuildOptions::new(BoardId::Uno));
        let result = with_controller("sim", uno, |session| {
            run_erase(session, Duration::from_millis(5))
        });
        assert!(result.is_err());
    }
}
