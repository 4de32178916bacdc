//! List commands implementation

use hoodctl_core::{BoardFamily, BoardId, BUILD_OPTIONS};

use crate::programmers;

/// List all supported programmers
pub fn list_programmers() {
    println!("Supported programmers:");
    println!();
    print!("{}", programmers::programmer_help());
}

/// List all known boards
pub fn list_boards() {
    println!("Supported boards:");
    println!();
    println!(
        "{:<10} {:<20} {:>9}  {:<18} Notes",
        "Name", "Family", "USB ID", "Product"
    );
    println!("{}", "-".repeat(78));

    for board in BoardId::ALL {
        let mut notes = Vec::new();
        if board == BUILD_OPTIONS.board {
            notes.push("built-in default");
        }
        if board.family() == BoardFamily::Due {
            notes.push("not supported");
        }

        println!(
            "{:<10} {:<20} {:04x}:{:04x}  {:<18} {}",
            board.name(),
            board.family().to_string(),
            board.vid(),
            board.pid(),
            board.product(),
            notes.join(", ")
        );
    }
}
