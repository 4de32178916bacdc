//! Man page generator for hoodctl
//!
//! Writes `hoodctl.1` plus one `hoodctl-<command>.1` page per subcommand.
//!
//! Usage: cargo run --bin gen-manpage -- [--output-dir DIR]

use clap::{Command, CommandFactory, Parser};
use std::fs;
use std::path::{Path, PathBuf};

#[allow(dead_code)]
#[path = "../cli.rs"]
mod cli;

#[derive(Parser)]
#[command(name = "gen-manpage", about = "Generate hoodctl man pages")]
struct Args {
    /// Directory the pages are written to
    #[arg(short, long, default_value = "man")]
    output_dir: PathBuf,
}

fn render(man: clap_mangen::Man, path: &Path) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;
    fs::write(path, buffer)?;
    println!("  {}", path.display());
    Ok(())
}

/// Page title and file name of each subcommand page
fn subcommand_pages(cmd: &Command) -> Vec<(String, Command)> {
    cmd.get_subcommands()
        .filter(|sub| sub.get_name() != "help")
        .map(|sub| (format!("hoodctl-{}", sub.get_name()), sub.clone()))
        .collect()
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();
    fs::create_dir_all(&args.output_dir)?;

    let mut cmd = cli::Cli::command();
    cmd.build();

    println!("Man pages generated:");
    render(
        clap_mangen::Man::new(cmd.clone()),
        &args.output_dir.join("hoodctl.1"),
    )?;
    for (title, sub) in subcommand_pages(&cmd) {
        let path = args.output_dir.join(format!("{}.1", title));
        render(clap_mangen::Man::new(sub).title(title), &path)?;
    }

    println!("\nView with: man -l {}", args.output_dir.join("hoodctl.1").display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_page_per_command() {
        let mut cmd = cli::Cli::command();
        cmd.build();
        let titles: Vec<String> = subcommand_pages(&cmd).into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            titles,
            [
                "hoodctl-list-boards",
                "hoodctl-list-programmers",
                "hoodctl-info",
                "hoodctl-init",
                "hoodctl-reset",
                "hoodctl-erase",
            ]
        );
    }

    #[test]
    fn test_render_pages() {
        let dir = std::env::temp_dir().join(format!("hoodctl-man-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let mut cmd = cli::Cli::command();
        cmd.build();
        let (title, sub) = subcommand_pages(&cmd).remove(4);
        let path = dir.join(format!("{}.1", title));
        render(clap_mangen::Man::new(sub).title(title), &path).unwrap();

        let page = fs::read_to_string(&path).unwrap();
        let _ = fs::remove_dir_all(&dir);
        assert!(page.contains(".TH"));
        assert!(page.contains("reset"));
        assert!(page.contains("hold"));
    }
}
