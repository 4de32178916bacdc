//! Programmer registration and dispatch
//!
//! This module provides a centralized registry for the pin backends a
//! [`BoardController`] can run on, with support for feature-gated inclusion
//! and dynamic help text generation.

use std::time::Duration;

use hoodctl_core::{BoardConfig, BoardController, DelayUs, PinDriver};

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "sim")]
    programmers.push(ProgrammerInfo {
        name: "sim",
        aliases: &["dummy"],
        description: "Simulated programmer MCU, prints a pin trace (gate=permit|block)",
    });

    #[cfg(feature = "linux-gpio")]
    programmers.push(ProgrammerInfo {
        name: "linux_gpio",
        aliases: &["linux-gpio", "gpiochip"],
        description: "Linux GPIO chip (dev=/dev/gpiochipN,reset=N[,erase=N][,vccen=N][,gate=N])",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");

    for p in &programmers {
        help.push_str(&format!("  {:12} - {}\n", p.name, p.description));
        if !p.aliases.is_empty() {
            help.push_str(&format!("  {:12}   aliases: {}\n", "", p.aliases.join(", ")));
        }
    }

    help
}

/// Check if a programmer name matches any available programmer
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.contains(&name))
        .map(|p| p.name)
}

/// Controller over a type-erased backend
pub type Controller<'a> = BoardController<&'a mut dyn PinDriver, &'a mut dyn DelayUs>;

/// An open programmer with its board controller
pub struct Session<'a> {
    /// Controller driving the programmer's pins
    pub board: Controller<'a>,
    /// Virtual time of the simulator; host time when unset
    #[cfg(feature = "sim")]
    sim_clock: Option<hoodctl_sim::SimClock>,
}

impl Session<'_> {
    /// Let time pass with the lines as they are
    pub fn wait(&self, duration: Duration) {
        #[cfg(feature = "sim")]
        if let Some(clock) = &self.sim_clock {
            clock.advance(duration.as_micros() as u64);
            return;
        }
        std::thread::sleep(duration);
    }
}

/// Execute a function with a controller on the specified programmer
///
/// The programmer string can be just the name (e.g., "sim") or include
/// parameters (e.g., "linux_gpio:gpiochip=0,reset=17").
#[allow(unused_variables, unused_mut)]
pub fn with_controller<F>(
    programmer: &str,
    config: BoardConfig,
    f: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&mut Session<'_>) -> Result<(), Box<dyn std::error::Error>>,
{
    // Parse programmer name and options
    let (name, options) = parse_programmer_string(programmer);

    // First check if the programmer is available at all
    let canonical_name = match find_programmer(name) {
        Some(n) => n,
        None => {
            return Err(unknown_programmer_error(name));
        }
    };

    // Dispatch to the appropriate programmer
    match canonical_name {
        #[cfg(feature = "sim")]
        "sim" => {
            use hoodctl_sim::{SimClock, SimPorts};

            let clock = SimClock::new();
            let mut ports = SimPorts::for_board(&config, clock.clone());
            apply_sim_options(&mut ports, &config, &options)?;

            let mut delay = clock.clone();
            let result = {
                let mut session = Session {
                    board: BoardController::new(
                        config,
                        &mut ports as &mut dyn PinDriver,
                        &mut delay as &mut dyn DelayUs,
                    ),
                    sim_clock: Some(clock),
                };
                f(&mut session)
            };

            print_sim_trace(&config, &ports);
            result
        }

        #[cfg(feature = "linux-gpio")]
        "linux_gpio" => {
            use hoodctl_linux_gpio::{open_linux_gpio, SpinDelay};

            log::info!("Opening Linux GPIO programmer...");

            let mut pins = open_linux_gpio(&options, &config).map_err(|e| {
                format!(
                    "Failed to open Linux GPIO chip: {}\n\
                     Make sure the device exists and you have read/write permissions.",
                    e
                )
            })?;
            let mut delay = SpinDelay;

            let mut session = Session {
                board: BoardController::new(
                    config,
                    &mut pins as &mut dyn PinDriver,
                    &mut delay as &mut dyn DelayUs,
                ),
                #[cfg(feature = "sim")]
                sim_clock: None,
            };
            f(&mut session)
        }

        _ => Err(unknown_programmer_error(name)),
    }
}

#[cfg(feature = "sim")]
fn apply_sim_options(
    ports: &mut hoodctl_sim::SimPorts,
    config: &BoardConfig,
    options: &[(&str, &str)],
) -> Result<(), Box<dyn std::error::Error>> {
    for (key, value) in options {
        match *key {
            "gate" => {
                let Some(gate) = config.gate else {
                    log::warn!("sim: Board has no auto reset gate, ignoring gate={}", value);
                    continue;
                };
                let level = match *value {
                    "permit" => gate.permit_level,
                    "block" => gate.permit_level.inverted(),
                    _ => return Err(format!("Invalid gate value: {} (permit or block)", value).into()),
                };
                ports.set_external(gate.pin, Some(level));
            }
            _ => {
                log::warn!("sim: Unknown option: {}={}", key, value);
            }
        }
    }
    Ok(())
}

#[cfg(feature = "sim")]
fn print_sim_trace(config: &BoardConfig, ports: &hoodctl_sim::SimPorts) {
    println!("Pin trace:");
    for event in ports.trace() {
        println!("  {}", event);
    }

    println!();
    println!("Final line states:");
    let lines = [Some(config.reset), config.erase, config.vcc_enable];
    for line in lines.into_iter().flatten() {
        println!(
            "  {:<6} {}  {}",
            line.id.name(),
            line.pin,
            ports.state(line.pin)
        );
        for pulse in ports.pulses(line.pin, line.polarity.active_level()) {
            match pulse.width_us {
                Some(width) => println!("           active at {} us for {} us", pulse.start_us, width),
                None => println!("           active since {} us", pulse.start_us),
            }
        }
    }
    if let Some(gate) = config.gate {
        let permits = ports.read(gate.pin) == gate.permit_level;
        println!(
            "  {:<6} {}  {} (reads {}, {})",
            "GATE",
            gate.pin,
            ports.state(gate.pin),
            ports.read(gate.pin),
            if permits { "permits" } else { "blocks" }
        );
    }

    let known: Vec<_> = lines
        .into_iter()
        .flatten()
        .map(|line| line.pin)
        .chain(config.gate.map(|gate| gate.pin))
        .collect();
    let stray: Vec<String> = hoodctl_sim::all_pins()
        .filter(|pin| !known.contains(pin) && ports.trace().iter().any(|e| e.pin == *pin))
        .map(|pin| pin.to_string())
        .collect();
    if !stray.is_empty() {
        log::warn!("sim: Pins outside the line table were written: {}", stray.join(", "));
    }
}

/// Parse a programmer string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_programmer_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

fn unknown_programmer_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown programmer: {}\n\n", name);
    msg.push_str(&programmer_help());
    msg.push_str("\nUse 'hoodctl list-programmers' for more details");
    msg.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_programmer_string() {
        assert_eq!(parse_programmer_string("sim"), ("sim", vec![]));
        assert_eq!(
            parse_programmer_string("linux_gpio:gpiochip=0,reset=17,bogus"),
            ("linux_gpio", vec![("gpiochip", "0"), ("reset", "17")])
        );
    }

    #[test]
    #[cfg(feature = "sim")]
    fn test_find_programmer_alias() {
        assert_eq!(find_programmer("dummy"), Some("sim"));
        assert_eq!(find_programmer("nope"), None);
    }

    #[test]
    #[cfg(feature = "sim")]
    fn test_sim_session_pulses_reset() {
        use hoodctl_core::{BoardId, BuildOptions, ResetState};

        let config = BoardConfig::resolve(BuildOptions::new(BoardId::Uno)).unwrap();
        with_controller("sim", config, |session| {
            session.board.initialize();
            session.board.set_reset(true);
            assert_eq!(session.board.reset_state(), ResetState::Pulsed);
            session.wait(Duration::from_millis(1));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    #[cfg(feature = "sim")]
    fn test_sim_wait_uses_virtual_time() {
        use hoodctl_core::{BoardId, BuildOptions};

        let config = BoardConfig::resolve(BuildOptions::new(BoardId::Leonardo)).unwrap();
        let started = std::time::Instant::now();
        with_controller("sim", config, |session| {
            let clock = session.sim_clock.clone().unwrap();
            let before = clock.now_us();
            session.wait(Duration::from_secs(30));
            assert_eq!(clock.now_us() - before, 30_000_000);
            Ok(())
        })
        .unwrap();
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[test]
    #[cfg(feature = "sim")]
    fn test_sim_gate_block() {
        use hoodctl_core::{BoardId, BuildOptions, ResetState};

        let config = BoardConfig::resolve(
            BuildOptions::new(BoardId::Leonardo).with_auto_reset_gate(true),
        )
        .unwrap();
        with_controller("sim:gate=block", config, |session| {
            session.board.initialize();
            assert!(!session.board.auto_reset_permitted());
            session.board.set_reset(true);
            assert_eq!(session.board.reset_state(), ResetState::Inactive);
            Ok(())
        })
        .unwrap();

        assert!(with_controller("sim:gate=maybe", config, |_| Ok(())).is_err());
    }
}
