//! CLI command implementations
//!
//! ## Board commands
//!
//! `list-boards` and `info` work on the line table alone and never open a
//! programmer.
//!
//! ## Control commands
//!
//! `init`, `reset` and `erase` run on a [`Session`](crate::programmers::Session),
//! so the same code drives the simulator and real GPIO lines.

mod board;
pub mod control;
mod list;

pub use board::{print_board_info, resolve_board, write_board_file};
pub use list::{list_boards, list_programmers};
